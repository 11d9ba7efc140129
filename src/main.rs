mod style;

use eframe::egui::{self, pos2, vec2, Align2, Color32, FontId, Rect, RichText, Sense, Stroke, Vec2};
use snippet_canvas::config::EditorConfig;
use snippet_canvas::nav::{NavBridge, NavRequest, PageVisibility};
use snippet_canvas::paths::AppPaths;
use snippet_canvas::{
    CommitFailure, Editor, EditorObserver, HitRegion, JsonFilePageStore, Page, PageStore, Point,
    StoreError, Widget, WidgetContent,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;
use style::colors;
use style::{
    CONTROL_BUTTON_SIZE, CONTROL_BUTTON_SPACING, HTML_PREVIEW_FONT_SIZE, INITIAL_WINDOW_HEIGHT,
    INITIAL_WINDOW_WIDTH, LABEL_FONT_SIZE, RESIZE_HANDLE_SIZE, STATUS_MESSAGE_TTL,
    WIDGET_CORNER_RADIUS,
};
use uuid::Uuid;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let (editor, status) = match bootstrap() {
        Ok(parts) => parts,
        Err(err) => {
            log::error!("could not open page store: {}", err);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([INITIAL_WINDOW_WIDTH, INITIAL_WINDOW_HEIGHT]),
        ..Default::default()
    };

    eframe::run_native(
        "Snippet Canvas",
        options,
        Box::new(|cc| Ok(Box::new(SnippetCanvasApp::new(cc, editor, status)))),
    )
}

type SharedStatus = Rc<RefCell<StatusLog>>;

/// Loads config, opens the page store and picks the page to edit, creating a
/// default page on first run.
fn bootstrap() -> Result<(Editor<JsonFilePageStore>, SharedStatus), StoreError> {
    let paths = AppPaths::from_project_dirs();
    let config = match &paths {
        Some(paths) => {
            if let Err(err) = paths.ensure_dirs_exist() {
                log::warn!("could not create config dir: {}", err);
            }
            let first_run = !paths.config_file.exists();
            let config = EditorConfig::load(&paths.config_file).unwrap_or_else(|err| {
                log::warn!("{}; using defaults", err);
                EditorConfig::default()
            });
            // Leave an editable config.json behind on first run.
            if first_run {
                if let Err(err) = config.save(&paths.config_file) {
                    log::warn!("could not write default config: {}", err);
                }
            }
            config
        }
        None => EditorConfig::default(),
    };
    let pages_dir = match &paths {
        Some(paths) => paths.pages_dir(&config),
        None => std::env::temp_dir().join("snippet-canvas"),
    };
    log::info!("pages stored in {}", pages_dir.display());

    let mut backend = JsonFilePageStore::open(pages_dir)?;
    let page = match backend.default_page()? {
        Some(page) => page,
        None => {
            let mut page = Page::new("Home");
            page.is_default = true;
            page.is_public = true;
            backend.save_page(&page)?;
            page
        }
    };

    let status = Rc::new(RefCell::new(StatusLog::default()));
    // The observer gets the egui context once the app is created.
    let observer = UiObserver {
        ctx: None,
        status: status.clone(),
    };
    let editor = Editor::new(page, backend, config, Box::new(observer));
    Ok((editor, status))
}

// ─────────────────────────────────────────────────────────────────────────────
// Observer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct StatusLog {
    messages: VecDeque<(String, Instant)>,
    ctx: Option<egui::Context>,
}

impl StatusLog {
    fn push(&mut self, message: String) {
        self.messages.push_back((message, Instant::now()));
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint_after(STATUS_MESSAGE_TTL);
        }
    }

    fn prune(&mut self, now: Instant) {
        self.messages
            .retain(|(_, at)| now.duration_since(*at) < STATUS_MESSAGE_TTL);
    }
}

struct UiObserver {
    ctx: Option<egui::Context>,
    status: SharedStatus,
}

impl EditorObserver for UiObserver {
    fn render(&mut self, _page: &Page) {
        if self.ctx.is_none() {
            self.ctx = self.status.borrow().ctx.clone();
        }
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }

    fn commit_failed(&mut self, failure: &CommitFailure) {
        log::error!("{} for {}: {}", failure, failure.widget_id, failure.source);
        self.status.borrow_mut().push(failure.message().to_string());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// App
// ─────────────────────────────────────────────────────────────────────────────

struct RenameState {
    widget_id: Uuid,
    text: String,
}

struct SnippetCanvasApp {
    editor: Editor<JsonFilePageStore>,
    status: SharedStatus,
    nav: NavBridge,
    nav_target: Option<Uuid>,
    preview: bool,
    rename: Option<RenameState>,
}

#[derive(Default, Clone, Copy)]
struct WidgetControlHover {
    delete_hovered: bool,
    rename_hovered: bool,
}

fn widget_control_rects(rect: Rect) -> (Rect, Rect) {
    let delete_rect = Rect::from_min_size(
        pos2(
            rect.right() - CONTROL_BUTTON_SIZE - CONTROL_BUTTON_SPACING,
            rect.top() + CONTROL_BUTTON_SPACING,
        ),
        Vec2::splat(CONTROL_BUTTON_SIZE),
    );
    let rename_rect =
        delete_rect.translate(vec2(-(CONTROL_BUTTON_SIZE + CONTROL_BUTTON_SPACING), 0.0));
    (delete_rect, rename_rect)
}

fn resize_handle_rect(rect: Rect) -> Rect {
    Rect::from_min_size(
        rect.right_bottom() - Vec2::splat(RESIZE_HANDLE_SIZE),
        Vec2::splat(RESIZE_HANDLE_SIZE),
    )
}

fn to_point(pos: egui::Pos2) -> Point {
    Point::new(pos.x, pos.y)
}

impl SnippetCanvasApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        editor: Editor<JsonFilePageStore>,
        status: SharedStatus,
    ) -> Self {
        status.borrow_mut().ctx = Some(cc.egui_ctx.clone());
        let nav = editor
            .nav_bridge(PageVisibility::All)
            .unwrap_or_else(|err| {
                log::warn!("could not list pages: {}", err);
                NavBridge::new(&[], PageVisibility::All)
            });
        Self {
            editor,
            status,
            nav,
            nav_target: None,
            preview: false,
            rename: None,
        }
    }

    fn refresh_pages(&mut self) {
        match self.editor.backend().list_pages() {
            Ok(pages) => self.nav.refresh(&pages),
            Err(err) => log::warn!("could not list pages: {}", err),
        }
    }

    fn open_page(&mut self, page_id: Uuid) {
        if let Err(err) = self.editor.open_page(page_id, Instant::now()) {
            log::error!("could not open page {}: {}", page_id, err);
            self.status
                .borrow_mut()
                .push(format!("Failed to open page: {err}"));
        }
    }

    fn create_page(&mut self) {
        let count = self.nav.pages().len();
        let page = Page::new(format!("Page {}", count + 1));
        let page_id = page.id;
        match self.editor.backend_mut().save_page(&page) {
            Ok(()) => {
                self.refresh_pages();
                self.open_page(page_id);
            }
            Err(err) => {
                log::error!("could not create page: {}", err);
                self.status
                    .borrow_mut()
                    .push(format!("Failed to create page: {err}"));
            }
        }
    }

    /// Follows a nav button through the same message contract embedded content uses.
    fn follow_nav_button(&mut self, target_page_id: Uuid) {
        let outcome = self.nav.handle(NavRequest::Navigate {
            page_id: target_page_id,
        });
        match outcome.navigate_to {
            Some(page_id) => self.open_page(page_id),
            None => log::info!("navigation refused: {:?}", outcome.reply),
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(8.0);

            let current = self.editor.page().id;
            let current_name = self.editor.page().name.clone();
            let mut selected = current;
            egui::ComboBox::from_id_salt("page_picker")
                .selected_text(current_name)
                .show_ui(ui, |ui| {
                    for page in self.nav.pages() {
                        ui.selectable_value(&mut selected, page.id, &page.name);
                    }
                });
            if selected != current {
                self.open_page(selected);
            }

            if ui.button("New page").clicked() {
                self.create_page();
            }

            if ui.button("Reload").clicked() {
                if let Err(err) = self.editor.reload(Instant::now()) {
                    log::error!("could not reload page: {}", err);
                    self.status
                        .borrow_mut()
                        .push(format!("Failed to reload page: {err}"));
                }
                self.refresh_pages();
            }

            ui.separator();

            if ui.button("Add snippet").clicked() {
                if let Err(err) = self.editor.add_snippet("Untitled", "<p>New snippet</p>") {
                    log::warn!("{}", err);
                }
            }

            let target_name = self
                .nav_target
                .and_then(|id| self.nav.pages().iter().find(|p| p.id == id))
                .map_or_else(|| "Target page".to_string(), |p| p.name.clone());
            egui::ComboBox::from_id_salt("nav_target")
                .selected_text(target_name)
                .show_ui(ui, |ui| {
                    for page in self.nav.pages() {
                        ui.selectable_value(&mut self.nav_target, Some(page.id), &page.name);
                    }
                });
            let can_add_nav = self.nav_target.is_some();
            if ui
                .add_enabled(can_add_nav, egui::Button::new("Add nav button"))
                .clicked()
            {
                if let Some(target) = self.nav_target {
                    let label = self
                        .nav
                        .pages()
                        .iter()
                        .find(|p| p.id == target)
                        .map_or_else(|| "Go".to_string(), |p| p.name.clone());
                    if let Err(err) = self.editor.add_nav_button(target, &label) {
                        log::warn!("{}", err);
                    }
                }
            }

            ui.separator();
            ui.checkbox(&mut self.preview, "Preview");
        });
    }

    fn status_bar(&mut self, ui: &mut egui::Ui) {
        let mut status = self.status.borrow_mut();
        status.prune(Instant::now());
        ui.horizontal(|ui| {
            match status.messages.back() {
                Some((message, _)) => {
                    ui.label(RichText::new(message).color(colors::STATUS_ERROR));
                }
                None => {
                    let page = self.editor.page();
                    ui.label(format!("{} · {} widgets", page.name, page.widgets.len()));
                }
            }
        });
    }

    fn rename_window(&mut self, ctx: &egui::Context) {
        let Some(rename) = &mut self.rename else {
            return;
        };
        let mut submit = false;
        let mut close = false;
        egui::Window::new("Rename")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                let response = ui.text_edit_singleline(&mut rename.text);
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        submit = true;
                    }
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                });
            });

        if submit {
            if let Some(rename) = self.rename.take() {
                if let Err(err) = self.editor.rename_widget(rename.widget_id, rename.text) {
                    log::warn!("{}", err);
                }
            }
        } else if close {
            self.rename = None;
        }
    }

    /// Global pointer handling: ends or cancels the active gesture no matter
    /// where the pointer is, so a release outside a widget never leaves it stuck.
    fn track_active_gesture(&mut self, ctx: &egui::Context, now: Instant) {
        if self.editor.active_widget().is_none() {
            return;
        }
        let (latest, released, still_down, gone) = ctx.input(|i| {
            (
                i.pointer.latest_pos(),
                i.pointer.primary_released(),
                i.pointer.primary_down(),
                i.raw
                    .events
                    .iter()
                    .any(|e| matches!(e, egui::Event::PointerGone)),
            )
        });

        if let Some(pos) = latest {
            self.editor.pointer_move(to_point(pos), now);
        }
        if gone {
            self.editor.pointer_cancel(now);
        } else if released || !still_down {
            self.editor.pointer_up(now);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui, now: Instant) {
        let container = self.editor.config().container_size();
        let grid = self.editor.config().grid_size;

        egui::ScrollArea::both()
            .id_salt("page_canvas")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let canvas_size = vec2(container.width as f32, container.height as f32);
                let (canvas_rect, _) = ui.allocate_exact_size(canvas_size, Sense::hover());
                self.editor.set_container_origin(to_point(canvas_rect.min));

                let painter = ui.painter_at(canvas_rect);
                painter.rect_filled(canvas_rect, 0.0, colors::CONTAINER_BG);
                if grid >= 8 && !self.preview {
                    let mut y = 0;
                    while y <= container.height {
                        let mut x = 0;
                        while x <= container.width {
                            painter.circle_filled(
                                canvas_rect.min + vec2(x as f32, y as f32),
                                1.0,
                                colors::GRID_DOT,
                            );
                            x += grid;
                        }
                        y += grid;
                    }
                }

                let press_origin = ui.input(|i| i.pointer.press_origin());
                let hover = ui.input(|i| i.pointer.hover_pos());
                let widgets: Vec<Widget> = self.editor.page().widgets.clone();
                let mut to_delete = None;

                for widget in &widgets {
                    let size = widget.effective_size();
                    let rect = Rect::from_min_size(
                        canvas_rect.min + vec2(widget.position.x as f32, widget.position.y as f32),
                        vec2(size.width as f32, size.height as f32),
                    );
                    let (delete_rect, rename_rect) = widget_control_rects(rect);
                    let handle_rect = resize_handle_rect(rect);
                    let hover_state = WidgetControlHover {
                        delete_hovered: hover.is_some_and(|p| delete_rect.contains(p)),
                        rename_hovered: hover.is_some_and(|p| rename_rect.contains(p)),
                    };

                    let response = ui.interact(
                        rect,
                        ui.id().with(widget.id),
                        Sense::click_and_drag(),
                    );

                    if self.preview {
                        if response.clicked() {
                            if let WidgetContent::NavButton { target_page_id, .. } = &widget.content {
                                self.follow_nav_button(*target_page_id);
                            }
                        }
                    } else {
                        if response.drag_started_by(egui::PointerButton::Primary) {
                            let origin = press_origin
                                .or_else(|| response.interact_pointer_pos())
                                .unwrap_or(rect.min);
                            let region = if delete_rect.contains(origin)
                                || rename_rect.contains(origin)
                            {
                                HitRegion::Controls
                            } else if widget.is_resizable() && handle_rect.contains(origin) {
                                HitRegion::ResizeHandle
                            } else {
                                HitRegion::Body
                            };
                            if self.editor.pointer_down(widget.id, to_point(origin), region) {
                                if let Some(pos) = response.interact_pointer_pos() {
                                    self.editor.pointer_move(to_point(pos), now);
                                }
                            }
                        }

                        if response.clicked() {
                            if hover_state.delete_hovered {
                                to_delete = Some(widget.id);
                            } else if hover_state.rename_hovered {
                                self.rename = Some(RenameState {
                                    widget_id: widget.id,
                                    text: widget.label().to_string(),
                                });
                            }
                        }
                    }

                    let active = self.editor.active_widget() == Some(widget.id);
                    let show_controls = !self.preview && (response.hovered() || active);
                    paint_widget(ui, widget, rect, active, show_controls, hover_state);
                }

                if let Some(id) = to_delete {
                    if let Err(err) = self.editor.remove_widget(id) {
                        log::warn!("{}", err);
                    }
                }
            });
    }
}

fn paint_widget(
    ui: &egui::Ui,
    widget: &Widget,
    rect: Rect,
    active: bool,
    show_controls: bool,
    hover: WidgetControlHover,
) {
    let painter = ui.painter_at(rect.expand(2.0));
    let rounding = egui::Rounding::same(WIDGET_CORNER_RADIUS);

    match &widget.content {
        WidgetContent::Snippet { title, html } => {
            painter.rect_filled(rect, rounding, colors::SNIPPET_BG);
            painter.rect_filled(
                Rect::from_min_size(rect.min, vec2(rect.width(), 3.0)),
                rounding,
                style::accent_for(widget.id),
            );
            painter.text(
                rect.min + vec2(6.0, 8.0),
                Align2::LEFT_TOP,
                title,
                FontId::proportional(LABEL_FONT_SIZE),
                Color32::WHITE,
            );
            let galley = painter.layout(
                html.clone(),
                FontId::monospace(HTML_PREVIEW_FONT_SIZE),
                Color32::LIGHT_GRAY,
                (rect.width() - 12.0).max(1.0),
            );
            painter.galley(rect.min + vec2(6.0, 28.0), galley, Color32::LIGHT_GRAY);
            if show_controls {
                painter.rect_filled(
                    resize_handle_rect(rect),
                    egui::Rounding::same(2.0),
                    colors::RESIZE_HANDLE,
                );
            }
        }
        WidgetContent::NavButton { label, .. } => {
            painter.rect_filled(rect, rounding, colors::NAV_BUTTON_BG);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                label,
                FontId::proportional(LABEL_FONT_SIZE),
                Color32::WHITE,
            );
        }
    }

    if active {
        painter.rect_stroke(rect, rounding, Stroke::new(2.0, colors::ACTIVE_OUTLINE));
    }

    if show_controls {
        let (delete_rect, rename_rect) = widget_control_rects(rect);
        let delete_color = if hover.delete_hovered {
            colors::DELETE_BUTTON_HOVER
        } else {
            colors::DELETE_BUTTON
        };
        let rename_color = if hover.rename_hovered {
            colors::RENAME_BUTTON_HOVER
        } else {
            colors::RENAME_BUTTON
        };
        for (button, color, icon) in [(delete_rect, delete_color, "x"), (rename_rect, rename_color, "✎")] {
            painter.rect_filled(button, egui::Rounding::same(3.0), color);
            painter.text(
                button.center(),
                Align2::CENTER_CENTER,
                icon,
                FontId::proportional(LABEL_FONT_SIZE),
                Color32::WHITE,
            );
        }
    }
}

impl eframe::App for SnippetCanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.track_active_gesture(ctx, now);
        self.editor.tick(now);

        egui::TopBottomPanel::top("toolbar")
            .frame(
                egui::Frame::default()
                    .fill(colors::TOOLBAR_BG)
                    .inner_margin(6.0),
            )
            .show(ctx, |ui| self.toolbar(ui));

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(colors::CANVAS_BG))
            .show(ctx, |ui| self.canvas(ui, now));

        self.rename_window(ctx);

        if let Some(wait) = self.editor.time_until_next_tick(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}

impl Drop for SnippetCanvasApp {
    fn drop(&mut self) {
        self.editor.teardown(Instant::now());
    }
}
