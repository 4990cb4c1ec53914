//! # satloop-core-view
//!
//! Core playback and zoom interaction library for looping satellite image viewers.
//!
//! This crate provides platform-agnostic data structures and logic for:
//! - Loading a JSON manifest and every frame it lists, all-or-nothing
//! - Playing the frames as a loop with a hold on the final frame
//! - Keeping the displayed image, scrubber and magnifier on the same frame
//! - Interpreting pointer gestures as zoom or magnifier transforms
//!
//! ## Features
//!
//! - `toml` - Load [`ViewerConfig`] from TOML
//! - `web` - Browser bindings (DOM view, `requestAnimationFrame`, fetch) and [`web::mount`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use satloop_core_view::{boot, ViewerConfig};
//!
//! let config = ViewerConfig::default();
//! // `source`, `view` and `scheduler` are host implementations of
//! // FrameSource, FrameView and FrameScheduler.
//! let player = boot(&source, &config, view, scheduler, || clock.now_ms()).await?;
//!
//! if let Some(mut player) = player {
//!     player.on_animation_frame(clock.now_ms());
//!     player.step_next();
//! }
//! ```

mod animation;
pub mod config;
mod data;
mod loader;
mod manifest;
pub mod player;
pub mod pointer;
pub mod style;
mod sync;
#[cfg(feature = "web")]
pub mod web;
pub mod zoom;

pub use animation::{
    AnimationState, FrameRequest, FrameScheduler, PlaybackEngine, PlaybackState, TickOutcome, DEFAULT_FPS,
    DEFAULT_HOLD_MS,
};
pub use config::{ConfigError, ViewerConfig};
pub use data::{CaptureTime, FrameCache, FrameId, FrameImage, FrameSequence};
pub use loader::{
    load_frames, FrameLoaderState, FrameSource, LoadError, LoadOutcome, LoadedFrames, LoadingPhase, LoadingProgress,
};
pub use manifest::{parse_manifest, resolve_frame_url, ManifestError};
pub use player::{boot, EventBacklog, Player, PlayerEvent};
pub use pointer::{PointerConfig, PointerController, PointerInput, PointerKind};
pub use sync::{FrameView, ViewSync};
pub use zoom::{VisualTransform, ZoomStrategy};

#[cfg(feature = "web")]
pub use web::mount;
