//! Drag/resize interaction engine for grid-snapped page widgets.
//!
//! Pointer gestures flow through [`controller::DragResizeController`], are
//! clamped by [`geometry`], applied optimistically by
//! [`optimistic::OptimisticStore`], and persisted through a
//! [`store::PageStore`] after [`sync::DebouncedSync`] has coalesced them.
//! [`editor::Editor`] wires those together for a UI adapter.

pub mod config;
pub mod constants;
pub mod controller;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod nav;
pub mod optimistic;
pub mod paths;
pub mod store;
pub mod sync;
pub mod widget;

pub use config::EditorConfig;
pub use controller::{ContainerFrame, ControllerState, HitRegion, Point};
pub use editor::Editor;
pub use error::{CommitFailure, ConfigError, Operation, StoreError};
pub use optimistic::EditorObserver;
pub use store::{JsonFilePageStore, MemoryPageStore, PageStore};
pub use widget::{GeometryUpdate, Page, Position, Size, Widget, WidgetContent, WidgetKind};
