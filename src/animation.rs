//! Timed playback engine for looping frame sequences.

/// Default playback rate in frames per second.
pub const DEFAULT_FPS: u32 = 5;

/// Default dwell on the final frame before the loop restarts, in milliseconds.
pub const DEFAULT_HOLD_MS: f64 = 1000.0;

/// Slack on dwell comparisons; `(t + d) - t` can round just below `d`.
const DWELL_EPSILON_MS: f64 = 1e-6;

/// Current state of the animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationState {
    /// Animation is stopped
    #[default]
    Stopped,
    /// Animation is playing
    Playing,
}

/// Handle to one pending display-refresh callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRequest(pub i32);

/// Host mechanism that invokes a callback once per display refresh.
///
/// On the web this is `requestAnimationFrame`; the animation frame callback
/// must end up in [`PlaybackEngine::tick`] with the current monotonic time.
pub trait FrameScheduler {
    /// Ask for one callback on the next refresh.
    ///
    /// Returns `None` when the host refused the request.
    fn request_frame(&mut self) -> Option<FrameRequest>;

    /// Cancel a callback that has not fired yet.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// What a single tick decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The engine is stopped; nothing was rescheduled
    Stopped,
    /// The current frame has not dwelt long enough yet
    Waiting,
    /// Time to show the frame at this index
    Advance(usize),
}

/// Snapshot of playback state for a host or a test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub is_playing: bool,
    pub last_tick_ms: f64,
}

/// Platform-agnostic playback engine.
///
/// The engine owns `isPlaying`, the last tick time and the pending refresh
/// callback. It never changes the displayed frame itself: [`tick`] returns
/// the index to show and the caller passes it to the view sync.
///
/// Every frame is shown for `1000 / fps` ms except the last one, which stays
/// for `hold_ms` so the loop boundary reads as a pause.
///
/// ## Example
///
/// ```rust
/// use satloop_core_view::{FrameRequest, FrameScheduler, PlaybackEngine, TickOutcome};
///
/// struct Manual(i32);
/// impl FrameScheduler for Manual {
///     fn request_frame(&mut self) -> Option<FrameRequest> {
///         self.0 += 1;
///         Some(FrameRequest(self.0))
///     }
///     fn cancel_frame(&mut self, _request: FrameRequest) {}
/// }
///
/// let mut scheduler = Manual(0);
/// let mut engine = PlaybackEngine::new(5); // 200 ms per frame
/// engine.play(0.0, 3, &mut scheduler);
///
/// assert_eq!(engine.tick(100.0, 0, 3, &mut scheduler), TickOutcome::Waiting);
/// assert_eq!(engine.tick(200.0, 0, 3, &mut scheduler), TickOutcome::Advance(1));
/// ```
///
/// [`tick`]: PlaybackEngine::tick
#[derive(Clone, Debug)]
pub struct PlaybackEngine {
    /// Frames per second
    fps: u32,
    /// Dwell on the final frame
    hold_ms: f64,
    state: AnimationState,
    /// Monotonic time of the last advance (or of `play`)
    last_tick_ms: f64,
    /// Scheduled refresh callback, if any
    pending: Option<FrameRequest>,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl PlaybackEngine {
    /// Create a stopped engine with the given FPS and the default hold.
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            hold_ms: DEFAULT_HOLD_MS,
            state: AnimationState::Stopped,
            last_tick_ms: 0.0,
            pending: None,
        }
    }

    /// Set the final-frame hold.
    pub fn with_hold_ms(mut self, hold_ms: f64) -> Self {
        self.hold_ms = hold_ms.max(0.0);
        self
    }

    /// Set the playback FPS.
    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.max(1);
    }

    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    #[inline]
    pub fn hold_ms(&self) -> f64 {
        self.hold_ms
    }

    /// Interval in milliseconds between regular frames.
    #[inline]
    pub fn interval_ms(&self) -> f64 {
        1000.0 / self.fps as f64
    }

    /// How long the frame at `index` stays on screen.
    pub fn dwell_ms(&self, index: usize, frame_count: usize) -> f64 {
        if frame_count > 0 && index + 1 == frame_count {
            self.hold_ms
        } else {
            self.interval_ms()
        }
    }

    #[inline]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == AnimationState::Playing
    }

    #[inline]
    pub fn last_tick_ms(&self) -> f64 {
        self.last_tick_ms
    }

    /// The refresh callback currently scheduled, if any.
    #[inline]
    pub fn pending_request(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Start playback.
    ///
    /// No-op when already playing or when there are no frames. Returns
    /// `true` when the engine transitioned to `Playing`.
    pub fn play<S: FrameScheduler>(&mut self, now_ms: f64, frame_count: usize, scheduler: &mut S) -> bool {
        if self.is_playing() || frame_count == 0 {
            return false;
        }
        self.state = AnimationState::Playing;
        self.last_tick_ms = now_ms;
        self.pending = scheduler.request_frame();
        if self.pending.is_none() {
            log::warn!("host refused an animation frame; playback will not advance");
        }
        true
    }

    /// Stop playback and cancel the scheduled callback.
    ///
    /// Idempotent. Returns `true` when the engine transitioned to `Stopped`.
    pub fn pause<S: FrameScheduler>(&mut self, scheduler: &mut S) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.state = AnimationState::Stopped;
        if let Some(request) = self.pending.take() {
            scheduler.cancel_frame(request);
        }
        true
    }

    /// Pause if playing, play if stopped and there are frames.
    pub fn toggle<S: FrameScheduler>(&mut self, now_ms: f64, frame_count: usize, scheduler: &mut S) {
        match self.state {
            AnimationState::Playing => {
                self.pause(scheduler);
            }
            AnimationState::Stopped => {
                self.play(now_ms, frame_count, scheduler);
            }
        }
    }

    /// Handle one display-refresh callback.
    ///
    /// Advances when the current frame has dwelt for its threshold, and
    /// always schedules the next refresh while playing. A callback that
    /// fires after a pause returns `Stopped` and schedules nothing.
    pub fn tick<S: FrameScheduler>(&mut self, now_ms: f64, current_index: usize, frame_count: usize, scheduler: &mut S) -> TickOutcome {
        // The callback that brought us here has fired.
        self.pending = None;

        if !self.is_playing() {
            return TickOutcome::Stopped;
        }

        let elapsed = now_ms - self.last_tick_ms;
        let outcome = if frame_count > 0 && elapsed + DWELL_EPSILON_MS >= self.dwell_ms(current_index, frame_count) {
            self.last_tick_ms = now_ms;
            TickOutcome::Advance((current_index + 1) % frame_count)
        } else {
            TickOutcome::Waiting
        };

        self.pending = scheduler.request_frame();
        outcome
    }
}
