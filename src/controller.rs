//! Per-widget drag/resize gesture state machine.
//!
//! The controller consumes pointer events expressed in the adapter's screen
//! space, converts them to container space, and returns the geometry the widget
//! should take. It never touches the page itself: the editor applies the
//! returned updates to the optimistic store and schedules persistence.

use crate::geometry::{clamp_drag, clamp_resize};
use crate::widget::{GeometryUpdate, Position, Size, Widget};
use log::debug;
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

/// A pointer location in the adapter's screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where on a widget a pointer-down landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRegion {
    /// The widget body; starts a drag.
    Body,
    /// The resize handle; starts a resize and wins over the body.
    ResizeHandle,
    /// An embedded control (edit/delete button); never starts a gesture.
    Controls,
}

/// The page container as placed on screen, plus the rules gestures obey inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerFrame {
    /// Screen position of the container's top-left corner.
    pub origin: Point,
    pub size: Size,
    pub grid: i32,
    pub min_size: Size,
}

impl ContainerFrame {
    /// Screen position of a container-space point.
    pub fn to_screen(&self, position: Position) -> Point {
        Point::new(
            self.origin.x + position.x as f32,
            self.origin.y + position.y as f32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Dragging,
    Resizing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Anchor {
    /// Pointer offset inside the widget at gesture start.
    Offset { dx: f32, dy: f32 },
    /// Widget size at gesture start.
    Size(Size),
}

/// State held while exactly one gesture is active on the widget.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSession {
    pub widget_id: Uuid,
    pub anchor_pointer: Point,
    anchor: Anchor,
    start_position: Position,
    widget_size: Size,
    initial: GeometryUpdate,
    last: GeometryUpdate,
}

impl InteractionSession {
    pub fn state(&self) -> ControllerState {
        match self.anchor {
            Anchor::Offset { .. } => ControllerState::Dragging,
            Anchor::Size(_) => ControllerState::Resizing,
        }
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Debug, Clone)]
pub struct DragResizeController {
    widget_id: Uuid,
    session: Option<InteractionSession>,
}

impl DragResizeController {
    pub fn new(widget_id: Uuid) -> Self {
        Self {
            widget_id,
            session: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.session
            .as_ref()
            .map_or(ControllerState::Idle, InteractionSession::state)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        self.session.as_ref()
    }

    /// Starts a gesture. Returns `true` if the controller left `Idle`.
    ///
    /// Control buttons never start a gesture, a resize handle on a widget that
    /// cannot be resized is ignored, and a second pointer-down during an active
    /// gesture is dropped.
    pub fn pointer_down(
        &mut self,
        pointer: Point,
        region: HitRegion,
        widget: &Widget,
        frame: &ContainerFrame,
    ) -> bool {
        if self.session.is_some() || widget.id != self.widget_id {
            return false;
        }

        let size = widget.effective_size();
        let (anchor, initial) = match region {
            HitRegion::Controls => return false,
            HitRegion::ResizeHandle if !widget.is_resizable() => return false,
            HitRegion::ResizeHandle => (Anchor::Size(size), GeometryUpdate::Size(size)),
            HitRegion::Body => {
                let top_left = frame.to_screen(widget.position);
                (
                    Anchor::Offset {
                        dx: pointer.x - top_left.x,
                        dy: pointer.y - top_left.y,
                    },
                    GeometryUpdate::Position(widget.position),
                )
            }
        };

        let session = InteractionSession {
            widget_id: widget.id,
            anchor_pointer: pointer,
            anchor,
            start_position: widget.position,
            widget_size: size,
            initial,
            last: initial,
        };
        debug!("{} gesture started on {}", mode_name(&session), widget.id);
        self.session = Some(session);
        true
    }

    /// Computes the new geometry for a pointer move.
    ///
    /// Returns `None` when no gesture is active or the snapped geometry did not
    /// change since the previous move.
    pub fn pointer_move(&mut self, pointer: Point, frame: &ContainerFrame) -> Option<GeometryUpdate> {
        let session = self.session.as_mut()?;

        let next = match session.anchor {
            Anchor::Offset { dx, dy } => {
                let raw_x = pointer.x - frame.origin.x - dx;
                let raw_y = pointer.y - frame.origin.y - dy;
                GeometryUpdate::Position(clamp_drag(
                    raw_x,
                    raw_y,
                    session.widget_size,
                    frame.size,
                    frame.grid,
                ))
            }
            Anchor::Size(anchor_size) => {
                let raw_width = anchor_size.width as f32 + (pointer.x - session.anchor_pointer.x);
                let raw_height =
                    anchor_size.height as f32 + (pointer.y - session.anchor_pointer.y);
                // Bounded by the position captured at gesture start; drag and
                // resize never overlap, so it cannot go stale mid-gesture.
                let max = Size::new(
                    frame.size.width.saturating_sub(session.start_position.x),
                    frame.size.height.saturating_sub(session.start_position.y),
                );
                GeometryUpdate::Size(clamp_resize(
                    raw_width,
                    raw_height,
                    frame.min_size,
                    max,
                    frame.grid,
                ))
            }
        };

        if next == session.last {
            return None;
        }
        session.last = next;
        Some(next)
    }

    /// Replaces the geometry the active gesture believes is on screen, after
    /// a failed save rolled the widget back. The next move is then applied
    /// even if it snaps to the value that was rolled back.
    pub fn resync(&mut self, current: GeometryUpdate) {
        if let Some(session) = self.session.as_mut() {
            if std::mem::discriminant(&session.last) == std::mem::discriminant(&current) {
                session.last = current;
            }
        }
    }

    /// Ends the gesture and returns the geometry to commit immediately, if the
    /// gesture changed anything.
    pub fn pointer_up(&mut self) -> Option<GeometryUpdate> {
        let session = self.session.take()?;
        debug!(
            "{} gesture ended on {} at {:?}",
            mode_name(&session),
            session.widget_id,
            session.last
        );
        (session.last != session.initial).then_some(session.last)
    }

    /// Abnormal termination (pointer left the window, listener removed). The
    /// last visible geometry is still committed.
    pub fn pointer_cancel(&mut self) -> Option<GeometryUpdate> {
        if let Some(session) = &self.session {
            debug!("gesture on {} cancelled", session.widget_id);
        }
        self.pointer_up()
    }
}

fn mode_name(session: &InteractionSession) -> &'static str {
    match session.state() {
        ControllerState::Resizing => "resize",
        _ => "drag",
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MIN_WIDGET_HEIGHT, MIN_WIDGET_WIDTH};

    fn frame() -> ContainerFrame {
        ContainerFrame {
            origin: Point::new(50.0, 30.0),
            size: Size::new(1000, 800),
            grid: 20,
            min_size: Size::new(MIN_WIDGET_WIDTH, MIN_WIDGET_HEIGHT),
        }
    }

    fn snippet() -> Widget {
        Widget::snippet("hero", "<h1>Hi</h1>", Position::new(0, 0)).with_size(Size::new(400, 300))
    }

    #[test]
    fn body_press_starts_drag_and_follows_pointer() {
        let widget = snippet();
        let mut controller = DragResizeController::new(widget.id);
        let frame = frame();

        assert!(controller.pointer_down(Point::new(50.0, 30.0), HitRegion::Body, &widget, &frame));
        assert_eq!(controller.state(), ControllerState::Dragging);

        let update = controller.pointer_move(Point::new(103.0, 57.0), &frame);
        assert_eq!(update, Some(GeometryUpdate::Position(Position::new(60, 20))));
    }

    #[test]
    fn drag_keeps_pointer_offset_inside_widget() {
        let widget = Widget::snippet("w", "", Position::new(100, 100)).with_size(Size::new(200, 200));
        let mut controller = DragResizeController::new(widget.id);
        let frame = frame();

        // Grab 10px right / 10px down of the widget's corner.
        controller.pointer_down(Point::new(160.0, 140.0), HitRegion::Body, &widget, &frame);
        let update = controller.pointer_move(Point::new(260.0, 140.0), &frame);
        assert_eq!(update, Some(GeometryUpdate::Position(Position::new(200, 100))));
    }

    #[test]
    fn resize_handle_takes_priority_and_grows_by_delta() {
        let widget = snippet();
        let mut controller = DragResizeController::new(widget.id);
        let frame = frame();

        assert!(controller.pointer_down(
            Point::new(450.0, 330.0),
            HitRegion::ResizeHandle,
            &widget,
            &frame
        ));
        assert_eq!(controller.state(), ControllerState::Resizing);

        let update = controller.pointer_move(Point::new(495.0, 325.0), &frame);
        assert_eq!(update, Some(GeometryUpdate::Size(Size::new(440, 300))));
    }

    #[test]
    fn resize_is_bounded_by_start_position() {
        let widget = Widget::snippet("w", "", Position::new(800, 600)).with_size(Size::new(100, 100));
        let mut controller = DragResizeController::new(widget.id);
        let frame = frame();

        controller.pointer_down(Point::new(0.0, 0.0), HitRegion::ResizeHandle, &widget, &frame);
        let update = controller.pointer_move(Point::new(5000.0, 5000.0), &frame);
        assert_eq!(update, Some(GeometryUpdate::Size(Size::new(200, 200))));
    }

    #[test]
    fn controls_never_start_a_gesture() {
        let widget = snippet();
        let mut controller = DragResizeController::new(widget.id);

        assert!(!controller.pointer_down(Point::default(), HitRegion::Controls, &widget, &frame()));
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn nav_buttons_cannot_be_resized() {
        let button = Widget::nav_button(Uuid::new_v4(), "Next", Position::new(0, 0));
        let mut controller = DragResizeController::new(button.id);

        assert!(!controller.pointer_down(
            Point::default(),
            HitRegion::ResizeHandle,
            &button,
            &frame()
        ));
        assert!(controller.pointer_down(Point::default(), HitRegion::Body, &button, &frame()));
    }

    #[test]
    fn stray_move_while_idle_is_ignored() {
        let mut controller = DragResizeController::new(Uuid::new_v4());
        assert_eq!(controller.pointer_move(Point::new(10.0, 10.0), &frame()), None);
        assert_eq!(controller.pointer_up(), None);
    }

    #[test]
    fn unchanged_snap_does_not_emit() {
        let widget = snippet();
        let mut controller = DragResizeController::new(widget.id);
        let frame = frame();
        controller.pointer_down(Point::new(50.0, 30.0), HitRegion::Body, &widget, &frame);

        assert!(controller.pointer_move(Point::new(85.0, 30.0), &frame).is_some());
        assert!(controller.pointer_move(Point::new(88.0, 31.0), &frame).is_none());
    }

    #[test]
    fn resync_lets_the_same_cell_apply_again() {
        let widget = snippet();
        let mut controller = DragResizeController::new(widget.id);
        let frame = frame();
        controller.pointer_down(Point::new(50.0, 30.0), HitRegion::Body, &widget, &frame);
        controller.pointer_move(Point::new(250.0, 130.0), &frame);

        controller.resync(GeometryUpdate::Position(Position::new(0, 0)));
        assert_eq!(
            controller.pointer_move(Point::new(255.0, 132.0), &frame),
            Some(GeometryUpdate::Position(Position::new(200, 100)))
        );

        // A size value never replaces a drag's position.
        controller.resync(GeometryUpdate::Size(Size::new(100, 100)));
        assert_eq!(
            controller.pointer_up(),
            Some(GeometryUpdate::Position(Position::new(200, 100)))
        );
    }

    #[test]
    fn pointer_up_returns_last_geometry_and_resets() {
        let widget = snippet();
        let mut controller = DragResizeController::new(widget.id);
        let frame = frame();
        controller.pointer_down(Point::new(50.0, 30.0), HitRegion::Body, &widget, &frame);
        controller.pointer_move(Point::new(150.0, 30.0), &frame);

        assert_eq!(
            controller.pointer_up(),
            Some(GeometryUpdate::Position(Position::new(100, 0)))
        );
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(controller.session().is_none());
    }

    #[test]
    fn click_without_movement_commits_nothing() {
        let widget = snippet();
        let mut controller = DragResizeController::new(widget.id);
        controller.pointer_down(Point::new(60.0, 40.0), HitRegion::Body, &widget, &frame());
        assert_eq!(controller.pointer_up(), None);
    }

    #[test]
    fn cancel_still_returns_last_visible_geometry() {
        let widget = snippet();
        let mut controller = DragResizeController::new(widget.id);
        let frame = frame();
        controller.pointer_down(Point::new(450.0, 330.0), HitRegion::ResizeHandle, &widget, &frame);
        controller.pointer_move(Point::new(550.0, 330.0), &frame);

        assert_eq!(
            controller.pointer_cancel(),
            Some(GeometryUpdate::Size(Size::new(500, 300)))
        );
        assert_eq!(controller.state(), ControllerState::Idle);
    }
}
