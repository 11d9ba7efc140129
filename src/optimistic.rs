//! Optimistic ownership of the page being edited.
//!
//! Every mutation lands in memory first and is re-rendered immediately, then
//! persisted through a [`PageStore`]. When persistence fails, only the entity
//! that mutation touched is restored from its snapshot; other widgets keep
//! whatever state they have reached in the meantime.

use crate::error::{CommitFailure, Operation, StoreError};
use crate::store::PageStore;
use crate::widget::{GeometryUpdate, Page, Widget};
use log::{debug, warn};
use std::collections::HashMap;
use uuid::Uuid;

/// Callbacks into the embedding UI.
pub trait EditorObserver {
    /// Called synchronously after every local mutation and rollback.
    fn render(&mut self, _page: &Page) {}

    /// Called once for every rolled-back mutation.
    fn commit_failed(&mut self, _failure: &CommitFailure) {}
}

/// Observer that ignores everything; for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EditorObserver for NoopObserver {}

pub struct OptimisticStore {
    page: Page,
    /// Pre-gesture copies of widgets with a gesture in progress.
    snapshots: HashMap<Uuid, Widget>,
    observer: Box<dyn EditorObserver>,
}

impl OptimisticStore {
    pub fn new(page: Page, observer: Box<dyn EditorObserver>) -> Self {
        Self {
            page,
            snapshots: HashMap::new(),
            observer,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Access
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_id(&self) -> Uuid {
        self.page.id
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.page.widgets
    }

    pub fn widget(&self, id: Uuid) -> Option<&Widget> {
        self.page.widget(id)
    }

    /// Swaps in a different page, dropping all gesture snapshots.
    pub fn replace_page(&mut self, page: Page) {
        self.page = page;
        self.snapshots.clear();
        self.observer.render(&self.page);
    }

    /// Re-reads the current page from the store.
    pub fn reload(&mut self, store: &dyn PageStore) -> Result<(), StoreError> {
        let page = store.get_page(self.page.id)?;
        self.replace_page(page);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Gesture snapshots
    // ─────────────────────────────────────────────────────────────────────────────

    /// Captures the widget as it is before a gesture. A snapshot that already
    /// exists is kept so repeated calls cannot move the rollback point.
    pub fn begin_gesture(&mut self, id: Uuid) -> bool {
        if self.snapshots.contains_key(&id) {
            return true;
        }
        match self.page.widget(id) {
            Some(widget) => {
                self.snapshots.insert(id, widget.clone());
                true
            }
            None => false,
        }
    }

    pub fn end_gesture(&mut self, id: Uuid) {
        self.snapshots.remove(&id);
    }

    pub fn has_snapshot(&self, id: Uuid) -> bool {
        self.snapshots.contains_key(&id)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Geometry
    // ─────────────────────────────────────────────────────────────────────────────

    /// Applies a geometry change in memory and re-renders. Unknown ids are ignored.
    pub fn apply_local(&mut self, id: Uuid, update: GeometryUpdate) -> &Page {
        if let Some(widget) = self.page.widget_mut(id) {
            widget.apply(update);
            self.observer.render(&self.page);
        }
        &self.page
    }

    /// Persists the current widget list after a geometry change to `id`.
    ///
    /// On failure the fields `update` touches are restored from the gesture
    /// snapshot and the observer is told.
    pub fn commit(
        &mut self,
        id: Uuid,
        update: GeometryUpdate,
        store: &mut dyn PageStore,
    ) -> Result<Page, CommitFailure> {
        let operation = match update {
            GeometryUpdate::Position(_) => Operation::Position,
            GeometryUpdate::Size(_) => Operation::Size,
        };
        match store.update_page_widgets(self.page.id, &self.page.widgets) {
            Ok(stored) => {
                debug!("committed {:?} for {}", update, id);
                Ok(stored)
            }
            Err(source) => {
                let snapshot = self.snapshots.get(&id).map(|w| w.geometry_like(update));
                match (snapshot, self.page.widget_mut(id)) {
                    (Some(previous), Some(widget)) => {
                        warn!("rolling back {} of {}: {}", operation, id, source);
                        widget.apply(previous);
                        self.observer.render(&self.page);
                    }
                    _ => warn!("no snapshot to roll back {} of {}: {}", operation, id, source),
                }
                Err(self.fail(id, operation, source))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Widget CRUD
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn add_widget(
        &mut self,
        widget: Widget,
        store: &mut dyn PageStore,
    ) -> Result<Page, CommitFailure> {
        let id = widget.id;
        self.page.widgets.push(widget);
        self.observer.render(&self.page);

        match store.update_page_widgets(self.page.id, &self.page.widgets) {
            Ok(stored) => Ok(stored),
            Err(source) => {
                warn!("rolling back add of {}: {}", id, source);
                self.page.widgets.retain(|w| w.id != id);
                self.observer.render(&self.page);
                Err(self.fail(id, Operation::Add, source))
            }
        }
    }

    /// Removes a widget. Returns `Ok(None)` if it was not on the page.
    pub fn remove_widget(
        &mut self,
        id: Uuid,
        store: &mut dyn PageStore,
    ) -> Result<Option<Widget>, CommitFailure> {
        let Some(index) = self.page.index_of(id) else {
            return Ok(None);
        };
        let removed = self.page.widgets.remove(index);
        self.snapshots.remove(&id);
        self.observer.render(&self.page);

        match store.update_page_widgets(self.page.id, &self.page.widgets) {
            Ok(_) => Ok(Some(removed)),
            Err(source) => {
                warn!("rolling back removal of {}: {}", id, source);
                let index = index.min(self.page.widgets.len());
                self.page.widgets.insert(index, removed);
                self.observer.render(&self.page);
                Err(self.fail(id, Operation::Remove, source))
            }
        }
    }

    /// Changes a snippet's title or a nav button's label.
    pub fn rename_widget(
        &mut self,
        id: Uuid,
        label: String,
        store: &mut dyn PageStore,
    ) -> Result<Option<Page>, CommitFailure> {
        let Some(widget) = self.page.widget_mut(id) else {
            return Ok(None);
        };
        let previous = widget.label().to_string();
        widget.set_label(label);
        self.observer.render(&self.page);

        match store.update_page_widgets(self.page.id, &self.page.widgets) {
            Ok(stored) => Ok(Some(stored)),
            Err(source) => {
                warn!("rolling back rename of {}: {}", id, source);
                if let Some(widget) = self.page.widget_mut(id) {
                    widget.set_label(previous);
                }
                self.observer.render(&self.page);
                Err(self.fail(id, Operation::Rename, source))
            }
        }
    }

    fn fail(&mut self, widget_id: Uuid, operation: Operation, source: StoreError) -> CommitFailure {
        let failure = CommitFailure {
            widget_id,
            operation,
            source,
        };
        self.observer.commit_failed(&failure);
        failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPageStore;
    use crate::widget::{Position, Size};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        renders: usize,
        failures: Vec<(Uuid, &'static str)>,
    }

    struct Recorder(Rc<RefCell<Recorded>>);

    impl EditorObserver for Recorder {
        fn render(&mut self, _page: &Page) {
            self.0.borrow_mut().renders += 1;
        }

        fn commit_failed(&mut self, failure: &CommitFailure) {
            self.0
                .borrow_mut()
                .failures
                .push((failure.widget_id, failure.message()));
        }
    }

    fn fixture() -> (OptimisticStore, MemoryPageStore, Rc<RefCell<Recorded>>, Uuid, Uuid) {
        let mut page = Page::new("home");
        let a = Widget::snippet("a", "<p>a</p>", Position::new(0, 0)).with_size(Size::new(200, 200));
        let b = Widget::snippet("b", "<p>b</p>", Position::new(400, 0)).with_size(Size::new(200, 200));
        let (a_id, b_id) = (a.id, b.id);
        page.widgets = vec![a, b];
        let backend = MemoryPageStore::new().with_page(page.clone());
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let store = OptimisticStore::new(page, Box::new(Recorder(recorded.clone())));
        (store, backend, recorded, a_id, b_id)
    }

    #[test]
    fn apply_local_renders_immediately() {
        let (mut store, _, recorded, a, _) = fixture();
        let moved = GeometryUpdate::Position(Position::new(40, 60));
        let page = store.apply_local(a, moved);
        assert_eq!(page.widget(a).unwrap().position, Position::new(40, 60));
        assert_eq!(recorded.borrow().renders, 1);
    }

    #[test]
    fn apply_local_ignores_unknown_widget() {
        let (mut store, _, recorded, _, _) = fixture();
        store.apply_local(Uuid::new_v4(), GeometryUpdate::Position(Position::new(1, 1)));
        assert_eq!(recorded.borrow().renders, 0);
    }

    #[test]
    fn successful_commit_keeps_local_state() {
        let (mut store, mut backend, recorded, a, _) = fixture();
        store.begin_gesture(a);
        let moved = GeometryUpdate::Position(Position::new(40, 60));
        store.apply_local(a, moved);

        let stored = store.commit(a, moved, &mut backend).unwrap();
        assert_eq!(stored.widget(a).unwrap().position, Position::new(40, 60));
        assert_eq!(store.widget(a).unwrap().position, Position::new(40, 60));
        assert!(recorded.borrow().failures.is_empty());
    }

    #[test]
    fn failed_commit_rolls_back_only_the_affected_widget() {
        let (mut store, mut backend, recorded, a, b) = fixture();
        store.begin_gesture(a);
        store.apply_local(a, GeometryUpdate::Position(Position::new(100, 100)));
        store.apply_local(a, GeometryUpdate::Position(Position::new(120, 100)));
        store.apply_local(b, GeometryUpdate::Size(Size::new(300, 240)));

        backend.fail_next_writes(1);
        let result = store.commit(
            a,
            GeometryUpdate::Position(Position::new(120, 100)),
            &mut backend,
        );

        let failure = result.unwrap_err();
        assert_eq!(failure.widget_id, a);
        assert_eq!(failure.message(), "Failed to save position");
        assert_eq!(store.widget(a).unwrap().position, Position::new(0, 0));
        assert_eq!(store.widget(b).unwrap().size, Size::new(300, 240));
        assert_eq!(recorded.borrow().failures, vec![(a, "Failed to save position")]);
    }

    #[test]
    fn failed_size_commit_restores_size_not_position() {
        let (mut store, mut backend, _, a, _) = fixture();
        store.begin_gesture(a);
        store.apply_local(a, GeometryUpdate::Size(Size::new(400, 400)));

        backend.fail_next_writes(1);
        let failure = store
            .commit(a, GeometryUpdate::Size(Size::new(400, 400)), &mut backend)
            .unwrap_err();
        assert_eq!(failure.message(), "Failed to save size");
        assert_eq!(store.widget(a).unwrap().size, Size::new(200, 200));
    }

    #[test]
    fn snapshot_is_taken_once_per_gesture() {
        let (mut store, _, _, a, _) = fixture();
        assert!(store.begin_gesture(a));
        store.apply_local(a, GeometryUpdate::Position(Position::new(60, 0)));
        assert!(store.begin_gesture(a));
        assert!(store.has_snapshot(a));
        store.end_gesture(a);
        assert!(!store.has_snapshot(a));
        assert!(!store.begin_gesture(Uuid::new_v4()));
    }

    #[test]
    fn failed_add_removes_the_new_widget() {
        let (mut store, mut backend, _, _, _) = fixture();
        backend.fail_next_writes(1);
        let widget = Widget::snippet("c", "<p/>", Position::new(0, 400));
        let id = widget.id;

        let failure = store.add_widget(widget, &mut backend).unwrap_err();
        assert_eq!(failure.operation, Operation::Add);
        assert!(store.widget(id).is_none());
        assert_eq!(store.widgets().len(), 2);
    }

    #[test]
    fn failed_remove_reinserts_at_original_index() {
        let (mut store, mut backend, _, a, b) = fixture();
        backend.fail_next_writes(1);

        assert!(store.remove_widget(a, &mut backend).is_err());
        let ids: Vec<Uuid> = store.widgets().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![a, b]);

        let removed = store.remove_widget(a, &mut backend).unwrap();
        assert_eq!(removed.map(|w| w.id), Some(a));
        assert_eq!(backend.page(store.page_id()).unwrap().widgets.len(), 1);
    }

    #[test]
    fn remove_unknown_widget_is_not_an_error() {
        let (mut store, mut backend, _, _, _) = fixture();
        assert!(store.remove_widget(Uuid::new_v4(), &mut backend).unwrap().is_none());
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn failed_rename_restores_previous_label() {
        let (mut store, mut backend, recorded, a, _) = fixture();
        backend.fail_next_writes(1);

        assert!(store
            .rename_widget(a, "Hero".to_string(), &mut backend)
            .is_err());
        assert_eq!(store.widget(a).unwrap().label(), "a");
        assert_eq!(recorded.borrow().failures, vec![(a, "Failed to rename widget")]);

        store
            .rename_widget(a, "Hero".to_string(), &mut backend)
            .unwrap();
        assert_eq!(store.widget(a).unwrap().label(), "Hero");
    }

    #[test]
    fn reload_replaces_page_from_store() {
        let (mut store, mut backend, _, a, _) = fixture();
        store.begin_gesture(a);
        backend.update_page_widgets(store.page_id(), &[]).unwrap();

        store.reload(&backend).unwrap();
        assert!(store.widgets().is_empty());
        assert!(!store.has_snapshot(a));
    }
}
