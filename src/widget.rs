use crate::constants::{
    DEFAULT_SNIPPET_HEIGHT, DEFAULT_SNIPPET_WIDTH, NAV_BUTTON_HEIGHT, NAV_BUTTON_WIDTH,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-left anchored position in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(DEFAULT_SNIPPET_WIDTH, DEFAULT_SNIPPET_HEIGHT)
    }
}

/// A change to one widget's geometry. Position and size are never changed by the same gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeometryUpdate {
    Position(Position),
    Size(Size),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
    Snippet,
    NavButton,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavButtonStyle {
    pub background: String,
    pub color: String,
}

impl Default for NavButtonStyle {
    fn default() -> Self {
        Self {
            background: "#2e6e50".to_string(),
            color: "#ffffff".to_string(),
        }
    }
}

/// Opaque payload carried by a widget. The engine never looks inside the HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WidgetContent {
    Snippet {
        #[serde(default)]
        title: String,
        html: String,
    },
    NavButton {
        target_page_id: Uuid,
        label: String,
        #[serde(default)]
        style: NavButtonStyle,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: Uuid,
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    pub content: WidgetContent,
}

impl Widget {
    pub fn snippet(title: impl Into<String>, html: impl Into<String>, position: Position) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            size: Size::default(),
            content: WidgetContent::Snippet {
                title: title.into(),
                html: html.into(),
            },
        }
    }

    pub fn nav_button(target_page_id: Uuid, label: impl Into<String>, position: Position) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            size: Size::new(NAV_BUTTON_WIDTH, NAV_BUTTON_HEIGHT),
            content: WidgetContent::NavButton {
                target_page_id,
                label: label.into(),
                style: NavButtonStyle::default(),
            },
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        if self.is_resizable() {
            self.size = size;
        }
        self
    }

    pub fn kind(&self) -> WidgetKind {
        match self.content {
            WidgetContent::Snippet { .. } => WidgetKind::Snippet,
            WidgetContent::NavButton { .. } => WidgetKind::NavButton,
        }
    }

    pub fn is_resizable(&self) -> bool {
        self.kind() == WidgetKind::Snippet
    }

    /// Size used for layout. Nav buttons always report their intrinsic size,
    /// whatever a stored document says.
    pub fn effective_size(&self) -> Size {
        match self.kind() {
            WidgetKind::Snippet => self.size,
            WidgetKind::NavButton => Size::new(NAV_BUTTON_WIDTH, NAV_BUTTON_HEIGHT),
        }
    }

    /// Title of a snippet or label of a nav button.
    pub fn label(&self) -> &str {
        match &self.content {
            WidgetContent::Snippet { title, .. } => title,
            WidgetContent::NavButton { label, .. } => label,
        }
    }

    pub fn set_label(&mut self, text: String) {
        match &mut self.content {
            WidgetContent::Snippet { title, .. } => *title = text,
            WidgetContent::NavButton { label, .. } => *label = text,
        }
    }

    pub fn apply(&mut self, update: GeometryUpdate) {
        match update {
            GeometryUpdate::Position(position) => self.position = position,
            GeometryUpdate::Size(size) => {
                if self.is_resizable() {
                    self.size = size;
                }
            }
        }
    }

    /// Returns the current value of whichever field `update` touches.
    pub fn geometry_like(&self, update: GeometryUpdate) -> GeometryUpdate {
        match update {
            GeometryUpdate::Position(_) => GeometryUpdate::Position(self.position),
            GeometryUpdate::Size(_) => GeometryUpdate::Size(self.size),
        }
    }
}

/// A page is an unordered collection of widgets plus identity and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

impl Page {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_default: false,
            is_public: false,
            widgets: Vec::new(),
        }
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.widgets.iter().position(|w| w.id == id)
    }

    pub fn widget(&self, id: Uuid) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_mut(&mut self, id: Uuid) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: Uuid,
    pub name: String,
}
