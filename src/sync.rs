//! Per-widget trailing-edge debounce for geometry persistence.
//!
//! The scheduler owns no clock and no timers: callers pass `now` in and drive
//! it from their frame loop with [`DebouncedSync::poll`], using
//! [`DebouncedSync::next_deadline`] to decide when to wake up next.

use crate::widget::GeometryUpdate;
use log::{debug, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// One persistence call the caller must perform now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub widget_id: Uuid,
    pub update: GeometryUpdate,
    /// When the carried value was produced. Dispatches for one widget are
    /// never emitted with a timestamp older than one already emitted.
    pub produced_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    update: GeometryUpdate,
    produced_at: Instant,
    deadline: Instant,
}

#[derive(Debug)]
pub struct DebouncedSync {
    delay: Duration,
    pending: HashMap<Uuid, Pending>,
    last_dispatched: HashMap<Uuid, Instant>,
}

impl DebouncedSync {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
            last_dispatched: HashMap::new(),
        }
    }

    pub fn is_pending(&self, widget_id: Uuid) -> bool {
        self.pending.contains_key(&widget_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Replaces any pending update for `widget_id` and restarts its timer.
    ///
    /// Returns `false` if the update is older than a value already dispatched
    /// for the widget; such an update is dropped.
    pub fn schedule(&mut self, widget_id: Uuid, update: GeometryUpdate, now: Instant) -> bool {
        if self.is_stale(widget_id, now) {
            warn!("dropping stale geometry update for {}", widget_id);
            return false;
        }
        self.pending.insert(
            widget_id,
            Pending {
                update,
                produced_at: now,
                deadline: now + self.delay,
            },
        );
        true
    }

    /// Cancels the pending timer for `widget_id` and dispatches immediately.
    ///
    /// `latest` is the freshest value the caller knows of; when absent the
    /// pending value is used. Returns `None` when there is nothing to send.
    pub fn flush(
        &mut self,
        widget_id: Uuid,
        latest: Option<GeometryUpdate>,
        now: Instant,
    ) -> Option<Dispatch> {
        let pending = self.pending.remove(&widget_id);
        let (update, produced_at) = match (latest, pending) {
            (Some(update), _) => (update, now),
            (None, Some(pending)) => (pending.update, pending.produced_at),
            (None, None) => return None,
        };
        self.admit(widget_id, update, produced_at)
    }

    /// Returns every update whose quiet period has elapsed, oldest deadline first.
    pub fn poll(&mut self, now: Instant) -> Vec<Dispatch> {
        let mut due: Vec<(Uuid, Pending)> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(id, pending)| (*id, *pending))
            .collect();
        due.sort_by_key(|(_, pending)| pending.deadline);

        due.into_iter()
            .filter_map(|(id, pending)| {
                self.pending.remove(&id);
                self.admit(id, pending.update, pending.produced_at)
            })
            .collect()
    }

    /// Dispatches everything still pending, regardless of deadlines.
    pub fn flush_all(&mut self) -> Vec<Dispatch> {
        let mut pending: Vec<(Uuid, Pending)> = self.pending.drain().collect();
        pending.sort_by_key(|(_, pending)| pending.deadline);
        pending
            .into_iter()
            .filter_map(|(id, pending)| self.admit(id, pending.update, pending.produced_at))
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.deadline).min()
    }

    /// Time until the next deadline, zero if one is already due.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Forgets dispatch history for a widget that no longer exists.
    pub fn forget(&mut self, widget_id: Uuid) {
        self.pending.remove(&widget_id);
        self.last_dispatched.remove(&widget_id);
    }

    fn is_stale(&self, widget_id: Uuid, produced_at: Instant) -> bool {
        self.last_dispatched
            .get(&widget_id)
            .is_some_and(|last| produced_at < *last)
    }

    fn admit(
        &mut self,
        widget_id: Uuid,
        update: GeometryUpdate,
        produced_at: Instant,
    ) -> Option<Dispatch> {
        if self.is_stale(widget_id, produced_at) {
            warn!("skipping stale dispatch for {}", widget_id);
            return None;
        }
        self.last_dispatched.insert(widget_id, produced_at);
        debug!("dispatching {:?} for {}", update, widget_id);
        Some(Dispatch {
            widget_id,
            update,
            produced_at,
        })
    }
}

impl Default for DebouncedSync {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Position, Size};

    const DELAY: Duration = Duration::from_millis(500);

    fn at(x: i32) -> GeometryUpdate {
        GeometryUpdate::Position(Position::new(x, 0))
    }

    #[test]
    fn rapid_updates_coalesce_into_the_last_value() {
        let mut sync = DebouncedSync::new(DELAY);
        let id = Uuid::new_v4();
        let start = Instant::now();

        for step in 0..10 {
            let now = start + Duration::from_millis(step * 40);
            assert!(sync.schedule(id, at(step as i32 * 20), now));
        }

        let last_scheduled = start + Duration::from_millis(9 * 40);
        assert!(sync.poll(last_scheduled + DELAY - Duration::from_millis(1)).is_empty());

        let fired = sync.poll(last_scheduled + DELAY);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].update, at(180));
        assert!(sync.poll(last_scheduled + DELAY * 4).is_empty());
    }

    #[test]
    fn flush_cancels_pending_timer() {
        let mut sync = DebouncedSync::new(DELAY);
        let id = Uuid::new_v4();
        let start = Instant::now();

        sync.schedule(id, at(20), start);
        let flushed = sync.flush(id, None, start + Duration::from_millis(10));
        assert_eq!(flushed.map(|d| d.update), Some(at(20)));
        assert!(!sync.is_pending(id));
        assert!(sync.poll(start + DELAY * 2).is_empty());
    }

    #[test]
    fn flush_prefers_explicit_latest_value() {
        let mut sync = DebouncedSync::new(DELAY);
        let id = Uuid::new_v4();
        let start = Instant::now();

        sync.schedule(id, at(20), start);
        let size = GeometryUpdate::Size(Size::new(200, 200));
        let flushed = sync.flush(id, Some(size), start + Duration::from_millis(5));
        assert_eq!(flushed.map(|d| d.update), Some(size));
    }

    #[test]
    fn flush_with_nothing_pending_is_empty() {
        let mut sync = DebouncedSync::new(DELAY);
        assert!(sync.flush(Uuid::new_v4(), None, Instant::now()).is_none());
    }

    #[test]
    fn older_update_cannot_overwrite_flushed_value() {
        let mut sync = DebouncedSync::new(DELAY);
        let id = Uuid::new_v4();
        let start = Instant::now();
        let later = start + Duration::from_millis(100);

        assert!(sync.flush(id, Some(at(100)), later).is_some());
        assert!(!sync.schedule(id, at(40), start));
        assert!(sync.poll(later + DELAY * 2).is_empty());

        assert!(sync.schedule(id, at(60), later + Duration::from_millis(1)));
    }

    #[test]
    fn widgets_debounce_independently() {
        let mut sync = DebouncedSync::new(DELAY);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let start = Instant::now();

        sync.schedule(a, at(20), start);
        sync.schedule(b, at(40), start + Duration::from_millis(300));

        let fired = sync.poll(start + DELAY);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].widget_id, a);
        assert!(sync.is_pending(b));
        assert_eq!(
            sync.next_deadline(),
            Some(start + Duration::from_millis(300) + DELAY)
        );
    }

    #[test]
    fn flush_all_drains_every_widget() {
        let mut sync = DebouncedSync::new(DELAY);
        let start = Instant::now();
        sync.schedule(Uuid::new_v4(), at(20), start);
        sync.schedule(Uuid::new_v4(), at(40), start);

        assert_eq!(sync.flush_all().len(), 2);
        assert_eq!(sync.pending_count(), 0);
        assert_eq!(sync.next_deadline(), None);
    }
}
