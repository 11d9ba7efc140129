//! The editing surface an adapter drives.
//!
//! An [`Editor`] ties the gesture controllers, the optimistic page, the
//! debounced sync and a page store together. Adapters forward pointer events
//! in screen space and call [`Editor::tick`] whenever
//! [`Editor::time_until_next_tick`] says a persistence timer is due.

use crate::config::EditorConfig;
use crate::controller::{ContainerFrame, ControllerState, DragResizeController, HitRegion, Point};
use crate::error::{CommitFailure, StoreError};
use crate::geometry::clamp_drag;
use crate::nav::{NavBridge, PageVisibility};
use crate::optimistic::{EditorObserver, OptimisticStore};
use crate::store::PageStore;
use crate::sync::{DebouncedSync, Dispatch};
use crate::widget::{GeometryUpdate, Page, Position, Widget};
use log::{debug, info};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct Editor<S: PageStore> {
    config: EditorConfig,
    page: OptimisticStore,
    sync: DebouncedSync,
    backend: S,
    controllers: HashMap<Uuid, DragResizeController>,
    active: Option<Uuid>,
    origin: Point,
}

impl<S: PageStore> Editor<S> {
    pub fn new(
        page: Page,
        backend: S,
        config: EditorConfig,
        observer: Box<dyn EditorObserver>,
    ) -> Self {
        let sync = DebouncedSync::new(config.debounce());
        Self {
            config,
            page: OptimisticStore::new(page, observer),
            sync,
            backend,
            controllers: HashMap::new(),
            active: None,
            origin: Point::default(),
        }
    }

    pub fn page(&self) -> &Page {
        self.page.page()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Screen position of the container's top-left corner. Adapters update it
    /// whenever layout or scrolling moves the container.
    pub fn set_container_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn frame(&self) -> ContainerFrame {
        ContainerFrame {
            origin: self.origin,
            size: self.config.container_size(),
            grid: self.config.grid_size,
            min_size: self.config.min_size(),
        }
    }

    pub fn active_widget(&self) -> Option<Uuid> {
        self.active
    }

    pub fn state_of(&self, widget_id: Uuid) -> ControllerState {
        self.controllers
            .get(&widget_id)
            .map_or(ControllerState::Idle, DragResizeController::state)
    }

    /// Switches to another page after persisting anything still pending.
    pub fn open_page(&mut self, page_id: Uuid, now: Instant) -> Result<(), StoreError> {
        self.teardown(now);
        let page = self.backend.get_page(page_id)?;
        info!("opened page {} ({})", page.name, page.id);
        self.controllers.clear();
        self.page.replace_page(page);
        Ok(())
    }

    /// Re-reads the current page from the store, discarding local state.
    /// Pending updates are persisted first.
    pub fn reload(&mut self, now: Instant) -> Result<(), StoreError> {
        self.teardown(now);
        self.controllers.clear();
        self.page.reload(&self.backend)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Pointer input
    // ─────────────────────────────────────────────────────────────────────────────

    /// Starts a gesture on `widget_id`. Only one gesture runs at a time.
    pub fn pointer_down(&mut self, widget_id: Uuid, pointer: Point, region: HitRegion) -> bool {
        if self.active.is_some() {
            return false;
        }
        let frame = self.frame();
        let Some(widget) = self.page.widget(widget_id) else {
            return false;
        };
        let controller = self
            .controllers
            .entry(widget_id)
            .or_insert_with(|| DragResizeController::new(widget_id));
        if !controller.pointer_down(pointer, region, widget, &frame) {
            return false;
        }
        self.page.begin_gesture(widget_id);
        self.active = Some(widget_id);
        true
    }

    /// Moves the active gesture. The new geometry is visible immediately;
    /// persisting it is debounced. Without an active gesture this does nothing.
    pub fn pointer_move(&mut self, pointer: Point, now: Instant) -> Option<GeometryUpdate> {
        let id = self.active?;
        let frame = self.frame();
        let update = self.controllers.get_mut(&id)?.pointer_move(pointer, &frame)?;
        self.page.apply_local(id, update);
        self.sync.schedule(id, update, now);
        Some(update)
    }

    /// Ends the active gesture and commits its last geometry right away.
    pub fn pointer_up(&mut self, now: Instant) -> Option<Result<Page, CommitFailure>> {
        self.finish_gesture(now, DragResizeController::pointer_up)
    }

    /// Ends the active gesture without a pointer-up (pointer left the window,
    /// view torn down). The last visible geometry is still committed.
    pub fn pointer_cancel(&mut self, now: Instant) -> Option<Result<Page, CommitFailure>> {
        self.finish_gesture(now, DragResizeController::pointer_cancel)
    }

    fn finish_gesture(
        &mut self,
        now: Instant,
        end: fn(&mut DragResizeController) -> Option<GeometryUpdate>,
    ) -> Option<Result<Page, CommitFailure>> {
        let id = self.active.take()?;
        let last = self.controllers.get_mut(&id).and_then(end);
        let result = self
            .sync
            .flush(id, last, now)
            .map(|dispatch| self.persist(dispatch));
        self.page.end_gesture(id);
        result
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Timers
    // ─────────────────────────────────────────────────────────────────────────────

    /// Persists every debounced update whose quiet period has elapsed.
    pub fn tick(&mut self, now: Instant) -> Vec<Result<Page, CommitFailure>> {
        self.sync
            .poll(now)
            .into_iter()
            .map(|dispatch| self.persist(dispatch))
            .collect()
    }

    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.sync.time_until_next(now)
    }

    /// Cancels any active gesture and persists everything still pending.
    pub fn teardown(&mut self, now: Instant) -> Vec<Result<Page, CommitFailure>> {
        let mut results: Vec<_> = self.pointer_cancel(now).into_iter().collect();
        let pending = self.sync.flush_all();
        results.extend(pending.into_iter().map(|dispatch| self.persist(dispatch)));
        results
    }

    fn persist(&mut self, dispatch: Dispatch) -> Result<Page, CommitFailure> {
        debug!(
            "persisting {:?} for {} produced at {:?}",
            dispatch.update, dispatch.widget_id, dispatch.produced_at
        );
        let id = dispatch.widget_id;
        let result = self.page.commit(id, dispatch.update, &mut self.backend);
        if result.is_err() && self.active == Some(id) {
            // The rollback moved the widget under a live gesture.
            if let (Some(controller), Some(widget)) =
                (self.controllers.get_mut(&id), self.page.widget(id))
            {
                controller.resync(widget.geometry_like(dispatch.update));
            }
        }
        result
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Widget CRUD
    // ─────────────────────────────────────────────────────────────────────────────

    /// Adds a snippet, cascading new widgets down the grid so they do not stack.
    pub fn add_snippet(&mut self, title: &str, html: &str) -> Result<Uuid, CommitFailure> {
        let widget = Widget::snippet(title, html, Position::default());
        self.place_and_add(widget)
    }

    pub fn add_nav_button(&mut self, target_page_id: Uuid, label: &str) -> Result<Uuid, CommitFailure> {
        let widget = Widget::nav_button(target_page_id, label, Position::default());
        self.place_and_add(widget)
    }

    fn place_and_add(&mut self, mut widget: Widget) -> Result<Uuid, CommitFailure> {
        let step = self.config.grid_size.max(1).saturating_mul(2) as f32;
        let offset = self.page.widgets().len() as f32 * step;
        widget.position = clamp_drag(
            offset,
            offset,
            widget.effective_size(),
            self.config.container_size(),
            self.config.grid_size,
        );
        let id = widget.id;
        self.page.add_widget(widget, &mut self.backend)?;
        Ok(id)
    }

    pub fn remove_widget(&mut self, widget_id: Uuid) -> Result<Option<Widget>, CommitFailure> {
        if self.active == Some(widget_id) {
            self.active = None;
        }
        self.controllers.remove(&widget_id);
        self.sync.forget(widget_id);
        self.page.remove_widget(widget_id, &mut self.backend)
    }

    pub fn rename_widget(&mut self, widget_id: Uuid, label: String) -> Result<(), CommitFailure> {
        self.page
            .rename_widget(widget_id, label, &mut self.backend)
            .map(|_| ())
    }

    /// Navigation contract for content embedded in this editor.
    pub fn nav_bridge(&self, visibility: PageVisibility) -> Result<NavBridge, StoreError> {
        Ok(NavBridge::new(&self.backend.list_pages()?, visibility))
    }
}
