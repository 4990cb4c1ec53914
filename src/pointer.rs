//! Pointer gesture controller for zoom and magnifier interactions.
//!
//! One gesture at a time, keyed by the captured pointer id:
//! - secondary pointers of a multi-touch gesture are ignored,
//! - the image geometry is snapshotted on pointer-down and frozen until the end,
//! - capture acquire/release are returned as commands for the host to apply.

use serde::{Deserialize, Serialize};

use crate::zoom::{transform_for, Point, Rect, Size, VisualTransform, ZoomStrategy};

/// Kind of device behind a pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    /// Parse a DOM `pointerType` string. Unknown types count as touch.
    pub fn from_dom(pointer_type: &str) -> Self {
        match pointer_type {
            "mouse" => PointerKind::Mouse,
            "pen" => PointerKind::Pen,
            _ => PointerKind::Touch,
        }
    }
}

/// Which pointer kinds may start a gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerTypes {
    /// Mouse, touch and pen
    All,
    /// Touch and pen only; mouse pointers are ignored
    #[default]
    TouchAndPen,
    /// Mouse only
    MouseOnly,
}

impl PointerTypes {
    pub fn accepts(self, kind: PointerKind) -> bool {
        match self {
            PointerTypes::All => true,
            PointerTypes::TouchAndPen => kind != PointerKind::Mouse,
            PointerTypes::MouseOnly => kind == PointerKind::Mouse,
        }
    }
}

/// How the visual transform is reverted when a gesture ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Remove inline overrides and fall back to the resting stylesheet
    #[default]
    ClearInline,
    /// Explicitly set a neutral scale
    NeutralScale,
}

/// Controller configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerConfig {
    pub strategy: ZoomStrategy,
    pub pointer_types: PointerTypes,
    /// End the gesture on pointer-leave instead of relying on capture
    pub end_on_leave: bool,
    pub reset: ResetMode,
}

/// One raw pointer event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    pub pointer_id: i32,
    pub kind: PointerKind,
    pub is_primary: bool,
    /// Viewport coordinates
    pub position: Point,
}

impl PointerInput {
    /// A primary pointer event.
    pub fn primary(pointer_id: i32, kind: PointerKind, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            kind,
            is_primary: true,
            position: Point::new(x, y),
        }
    }
}

/// Geometry captured once per gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureGeometry {
    /// Displayed image bounding box in viewport coordinates
    pub image: Rect,
    /// Bounding box of the element the lens is positioned in
    pub container: Rect,
}

/// Host command for browser pointer-capture control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureCommand {
    Acquire { pointer_id: i32 },
    Release { pointer_id: i32 },
}

/// Lifecycle phase of one dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

/// Why a pointer event was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoredReason {
    NotPrimary,
    PointerTypeExcluded,
    GestureInProgress,
    NoActiveGesture,
    PointerMismatch,
    LeaveWhileCaptured,
}

/// What happened to the gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Started,
    Updated,
    Ended,
    Ignored(IgnoredReason),
}

/// Result of one pointer dispatch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerDispatch {
    pub phase: PointerPhase,
    pub outcome: DispatchOutcome,
    /// Transform to apply, `None` when nothing changed
    pub transform: Option<VisualTransform>,
    pub capture: Option<CaptureCommand>,
}

impl PointerDispatch {
    fn ignored(phase: PointerPhase, reason: IgnoredReason) -> Self {
        Self {
            phase,
            outcome: DispatchOutcome::Ignored(reason),
            transform: None,
            capture: None,
        }
    }

    #[inline]
    pub fn is_ignored(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Ignored(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveGesture {
    pointer_id: i32,
    geometry: GestureGeometry,
}

/// Gesture state machine, `Idle` when `active` is `None`.
#[derive(Clone, Debug, Default)]
pub struct PointerController {
    config: PointerConfig,
    active: Option<ActiveGesture>,
}

impl PointerController {
    pub fn new(config: PointerConfig) -> Self {
        Self { config, active: None }
    }

    #[inline]
    pub fn config(&self) -> &PointerConfig {
        &self.config
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Captured pointer id, if a gesture is running.
    pub fn active_pointer_id(&self) -> Option<i32> {
        self.active.map(|active| active.pointer_id)
    }

    /// Frozen geometry of the running gesture.
    pub fn geometry(&self) -> Option<GestureGeometry> {
        self.active.map(|active| active.geometry)
    }

    /// A magnifier gesture is running, so the lens must follow frame changes.
    pub fn lens_active(&self) -> bool {
        self.is_active() && matches!(self.config.strategy, ZoomStrategy::Magnifier(_))
    }

    /// Start a gesture. `natural` is the current frame's intrinsic size.
    pub fn pointer_down(&mut self, input: PointerInput, geometry: GestureGeometry, natural: Size) -> PointerDispatch {
        if !input.is_primary {
            return PointerDispatch::ignored(PointerPhase::Down, IgnoredReason::NotPrimary);
        }
        if !self.config.pointer_types.accepts(input.kind) {
            return PointerDispatch::ignored(PointerPhase::Down, IgnoredReason::PointerTypeExcluded);
        }
        if self.active.is_some() {
            return PointerDispatch::ignored(PointerPhase::Down, IgnoredReason::GestureInProgress);
        }

        self.active = Some(ActiveGesture {
            pointer_id: input.pointer_id,
            geometry,
        });
        log::debug!("gesture started by pointer {}", input.pointer_id);

        PointerDispatch {
            phase: PointerPhase::Down,
            outcome: DispatchOutcome::Started,
            transform: Some(self.transform_at(input.position, geometry, natural)),
            capture: Some(CaptureCommand::Acquire {
                pointer_id: input.pointer_id,
            }),
        }
    }

    /// Follow the captured pointer using the frozen geometry.
    pub fn pointer_move(&mut self, input: PointerInput, natural: Size) -> PointerDispatch {
        let active = match self.matching(PointerPhase::Move, input.pointer_id) {
            Ok(active) => active,
            Err(ignored) => return ignored,
        };
        PointerDispatch {
            phase: PointerPhase::Move,
            outcome: DispatchOutcome::Updated,
            transform: Some(self.transform_at(input.position, active.geometry, natural)),
            capture: None,
        }
    }

    pub fn pointer_up(&mut self, input: PointerInput) -> PointerDispatch {
        self.end(PointerPhase::Up, input.pointer_id)
    }

    pub fn pointer_cancel(&mut self, input: PointerInput) -> PointerDispatch {
        self.end(PointerPhase::Cancel, input.pointer_id)
    }

    /// Ends the gesture only when configured with `end_on_leave`.
    pub fn pointer_leave(&mut self, input: PointerInput) -> PointerDispatch {
        if !self.config.end_on_leave {
            return match self.matching(PointerPhase::Leave, input.pointer_id) {
                Ok(_) => PointerDispatch::ignored(PointerPhase::Leave, IgnoredReason::LeaveWhileCaptured),
                Err(ignored) => ignored,
            };
        }
        self.end(PointerPhase::Leave, input.pointer_id)
    }

    fn end(&mut self, phase: PointerPhase, pointer_id: i32) -> PointerDispatch {
        if let Err(ignored) = self.matching(phase, pointer_id) {
            return ignored;
        }
        self.active = None;
        log::debug!("gesture by pointer {pointer_id} ended ({phase:?})");

        PointerDispatch {
            phase,
            outcome: DispatchOutcome::Ended,
            transform: Some(VisualTransform::Identity),
            capture: Some(CaptureCommand::Release { pointer_id }),
        }
    }

    fn matching(&self, phase: PointerPhase, pointer_id: i32) -> Result<ActiveGesture, PointerDispatch> {
        match self.active {
            None => Err(PointerDispatch::ignored(phase, IgnoredReason::NoActiveGesture)),
            Some(active) if active.pointer_id != pointer_id => {
                Err(PointerDispatch::ignored(phase, IgnoredReason::PointerMismatch))
            }
            Some(active) => Ok(active),
        }
    }

    fn transform_at(&self, position: Point, geometry: GestureGeometry, natural: Size) -> VisualTransform {
        transform_for(&self.config.strategy, position, geometry.image, geometry.container, natural)
    }
}
