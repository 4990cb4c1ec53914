//! Owned player state and event dispatch.
//!
//! A [`Player`] bundles the loaded frames with the playback engine, the view
//! sync and the pointer controller. Each of those owns its own fields:
//! - [`ViewSync`] changes `current_index` and the displayed source,
//! - [`PlaybackEngine`] changes the playing flag and the tick clock,
//! - [`PointerController`] changes the gesture and its frozen geometry.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::animation::{AnimationState, FrameScheduler, PlaybackEngine, PlaybackState, TickOutcome};
use crate::config::ViewerConfig;
use crate::loader::{load_frames, FrameLoaderState, FrameSource, LoadError, LoadOutcome, LoadedFrames};
use crate::pointer::{DispatchOutcome, GestureGeometry, PointerController, PointerDispatch, PointerInput, ResetMode};
use crate::style::style_for;
use crate::sync::{FrameView, ViewSync};
use crate::zoom::Size;
use crate::{FrameCache, FrameImage, FrameSequence};

/// One host event. Events run to completion in the order they were queued.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerEvent {
    TogglePlay { now_ms: f64 },
    StepPrev,
    StepNext,
    /// Scrubber input; the control bounds the value to `[0, N - 1]`
    Seek(usize),
    /// Display-refresh callback with the current monotonic time
    AnimationFrame { now_ms: f64 },
    PointerDown { input: PointerInput, geometry: GestureGeometry },
    PointerMove(PointerInput),
    PointerUp(PointerInput),
    PointerCancel(PointerInput),
    PointerLeave(PointerInput),
}

/// The viewer once every frame is loaded.
pub struct Player<H, V, S> {
    sequence: FrameSequence,
    cache: FrameCache<H>,
    engine: PlaybackEngine,
    sync: ViewSync,
    pointer: PointerController,
    reset: ResetMode,
    view: V,
    scheduler: S,
    queue: VecDeque<PlayerEvent>,
}

impl<H, V, S> Player<H, V, S>
where
    V: FrameView<H>,
    S: FrameScheduler,
{
    /// Create a stopped player. Nothing is shown until [`Player::start`].
    pub fn new(config: &ViewerConfig, frames: LoadedFrames<H>, view: V, scheduler: S) -> Self {
        Self {
            sequence: frames.sequence,
            cache: frames.cache,
            engine: PlaybackEngine::new(config.fps).with_hold_ms(config.hold_ms),
            sync: ViewSync::new(),
            pointer: PointerController::new(config.pointer_config()),
            reset: config.reset,
            view,
            scheduler,
            queue: VecDeque::new(),
        }
    }

    /// Reveal the controls, show frame 0 and begin playing.
    pub fn start(&mut self, now_ms: f64) {
        self.view.reveal(self.sequence.len());
        self.sync_to(0);
        self.engine.play(now_ms, self.sequence.len(), &mut self.scheduler);
    }

    pub fn toggle_play_pause(&mut self, now_ms: f64) {
        self.engine.toggle(now_ms, self.sequence.len(), &mut self.scheduler);
    }

    pub fn play(&mut self, now_ms: f64) {
        self.engine.play(now_ms, self.sequence.len(), &mut self.scheduler);
    }

    pub fn pause(&mut self) {
        self.engine.pause(&mut self.scheduler);
    }

    /// Stop and show the previous frame, wrapping to the last.
    pub fn step_prev(&mut self) {
        self.engine.pause(&mut self.scheduler);
        if let Some(index) = self.sequence.prev_index(self.current_index()) {
            self.sync_to(index);
        }
    }

    /// Stop and show the next frame, wrapping to the first.
    pub fn step_next(&mut self) {
        self.engine.pause(&mut self.scheduler);
        if let Some(index) = self.sequence.next_index(self.current_index()) {
            self.sync_to(index);
        }
    }

    /// Stop and show `index`. Out-of-range values are ignored.
    pub fn seek(&mut self, index: usize) {
        self.engine.pause(&mut self.scheduler);
        self.sync_to(index);
    }

    /// Handle a display-refresh callback.
    pub fn on_animation_frame(&mut self, now_ms: f64) -> TickOutcome {
        let outcome = self.engine.tick(now_ms, self.current_index(), self.sequence.len(), &mut self.scheduler);
        if let TickOutcome::Advance(index) = outcome {
            log::debug!("advance to frame {index}");
            self.sync_to(index);
        }
        outcome
    }

    pub fn pointer_down(&mut self, input: PointerInput, geometry: GestureGeometry) -> PointerDispatch {
        let dispatch = self.pointer.pointer_down(input, geometry, self.current_natural_size());
        self.apply_dispatch(&dispatch);
        dispatch
    }

    pub fn pointer_move(&mut self, input: PointerInput) -> PointerDispatch {
        let dispatch = self.pointer.pointer_move(input, self.current_natural_size());
        self.apply_dispatch(&dispatch);
        dispatch
    }

    pub fn pointer_up(&mut self, input: PointerInput) -> PointerDispatch {
        let dispatch = self.pointer.pointer_up(input);
        self.apply_dispatch(&dispatch);
        dispatch
    }

    pub fn pointer_cancel(&mut self, input: PointerInput) -> PointerDispatch {
        let dispatch = self.pointer.pointer_cancel(input);
        self.apply_dispatch(&dispatch);
        dispatch
    }

    pub fn pointer_leave(&mut self, input: PointerInput) -> PointerDispatch {
        let dispatch = self.pointer.pointer_leave(input);
        self.apply_dispatch(&dispatch);
        dispatch
    }

    /// Queue an event for [`Player::drain`].
    pub fn enqueue(&mut self, event: PlayerEvent) {
        self.queue.push_back(event);
    }

    /// Process queued events in FIFO order. Returns how many ran.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.queue.pop_front() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Run one event to completion.
    pub fn dispatch(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::TogglePlay { now_ms } => self.toggle_play_pause(now_ms),
            PlayerEvent::StepPrev => self.step_prev(),
            PlayerEvent::StepNext => self.step_next(),
            PlayerEvent::Seek(index) => self.seek(index),
            PlayerEvent::AnimationFrame { now_ms } => {
                self.on_animation_frame(now_ms);
            }
            PlayerEvent::PointerDown { input, geometry } => {
                self.pointer_down(input, geometry);
            }
            PlayerEvent::PointerMove(input) => {
                self.pointer_move(input);
            }
            PlayerEvent::PointerUp(input) => {
                self.pointer_up(input);
            }
            PlayerEvent::PointerCancel(input) => {
                self.pointer_cancel(input);
            }
            PlayerEvent::PointerLeave(input) => {
                self.pointer_leave(input);
            }
        }
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.sync.current_index()
    }

    #[inline]
    pub fn state(&self) -> AnimationState {
        self.engine.state()
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.engine.is_playing()
    }

    pub fn playback_state(&self) -> PlaybackState {
        PlaybackState {
            current_index: self.current_index(),
            is_playing: self.engine.is_playing(),
            last_tick_ms: self.engine.last_tick_ms(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.sequence.len()
    }

    pub fn sequence(&self) -> &FrameSequence {
        &self.sequence
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn pointer(&self) -> &PointerController {
        &self.pointer
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn current_image(&self) -> Option<&FrameImage<H>> {
        self.sequence
            .get(self.current_index())
            .and_then(|id| self.cache.get(id))
    }

    fn current_natural_size(&self) -> Size {
        self.current_image()
            .map(|image| Size::new(image.width() as f64, image.height() as f64))
            .unwrap_or_default()
    }

    fn sync_to(&mut self, index: usize) -> bool {
        self.sync.sync(
            index,
            &self.sequence,
            &self.cache,
            self.pointer.lens_active(),
            &mut self.view,
        )
    }

    fn apply_dispatch(&mut self, dispatch: &PointerDispatch) {
        if dispatch.is_ignored() {
            log::debug!("pointer {:?} ignored: {:?}", dispatch.phase, dispatch.outcome);
            return;
        }
        if let Some(command) = dispatch.capture {
            self.view.apply_capture(command);
        }
        if dispatch.outcome == DispatchOutcome::Started && self.pointer.lens_active() {
            let image = self
                .sequence
                .get(self.sync.current_index())
                .and_then(|id| self.cache.get(id));
            if let Some(image) = image {
                self.view.set_lens_source(image);
            }
        }
        if let Some(transform) = dispatch.transform {
            self.view.apply_style(&style_for(&transform, self.reset));
        }
    }
}

/// Shared inbox for hosts whose callbacks can fire while the player is
/// mutably borrowed.
///
/// Callbacks always [`push`](EventBacklog::push). Whoever holds the player
/// calls [`deliver_to`](EventBacklog::deliver_to), which keeps moving events
/// into the player's queue and draining it until the backlog stays empty, so
/// events raised during a drain run afterwards, in arrival order.
#[derive(Debug, Default)]
pub struct EventBacklog {
    events: RefCell<VecDeque<PlayerEvent>>,
}

impl EventBacklog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: PlayerEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Discard everything, e.g. when no player exists yet.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Run every pending event on `player`. Returns how many ran.
    pub fn deliver_to<H, V, S>(&self, player: &mut Player<H, V, S>) -> usize
    where
        V: FrameView<H>,
        S: FrameScheduler,
    {
        let mut handled = 0;
        loop {
            // The borrow ends before draining so callbacks can push meanwhile.
            let batch: Vec<PlayerEvent> = self.events.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                return handled;
            }
            for event in batch {
                player.enqueue(event);
            }
            handled += player.drain();
        }
    }
}

/// Load every frame and start playback.
///
/// Status text is pushed to `view` throughout. Returns `Ok(None)` for an
/// empty manifest, which leaves the loading text in place. On failure the
/// view shows the error message and the player is never revealed.
pub async fn boot<Src, V, S, C>(source: &Src, config: &ViewerConfig, mut view: V, scheduler: S, now_ms: C) -> Result<Option<Player<Src::Handle, V, S>>, LoadError>
where
    Src: FrameSource,
    V: FrameView<Src::Handle>,
    S: FrameScheduler,
    C: FnOnce() -> f64,
{
    let mut state = FrameLoaderState::new();
    state.start_manifest();
    view.set_status(&state.status_message());

    let result = load_frames(source, &config.manifest_path, |progress| {
        state.observe(progress);
        view.set_status(&state.status_message());
    })
    .await;

    match result {
        Ok(LoadOutcome::Ready(frames)) => {
            state.finish();
            if !state.can_play() {
                log::warn!("loader finished with {} of {} images", state.progress.loaded, state.progress.total);
                return Ok(None);
            }
            view.set_status(&state.status_message());
            let mut player = Player::new(config, frames, view, scheduler);
            player.start(now_ms());
            Ok(Some(player))
        }
        Ok(LoadOutcome::Empty) => Ok(None),
        Err(error) => {
            log::error!("loading failed: {error}");
            state.fail(error.clone());
            view.set_status(&state.status_message());
            Err(error)
        }
    }
}
