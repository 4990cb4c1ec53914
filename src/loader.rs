//! Frame loading utilities and state management.
//!
//! Loading happens in two steps:
//! 1. Fetch and decode the manifest
//! 2. Load every listed image concurrently, all-or-nothing

use std::collections::HashSet;
use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::{parse_manifest, FrameCache, FrameId, FrameImage, FrameSequence, ManifestError};

/// Loading phase indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadingPhase {
    /// Not loading anything
    Idle,
    /// Waiting for the manifest
    FetchingManifest,
    /// Images are loading concurrently
    LoadingImages,
    /// Every image is decoded and cached
    Complete,
    /// Loading stopped on a terminal error
    Failed,
}

/// Progress information for image loading.
///
/// `loaded` only ever increases during one loading session and counts
/// images in completion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadingProgress {
    /// Number of images decoded so far
    pub loaded: usize,
    /// Number of distinct images listed in the manifest
    pub total: usize,
}

impl LoadingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset progress for a new loading session
    pub fn reset(&mut self, total: usize) {
        self.loaded = 0;
        self.total = total;
    }

    /// Count one more completed image
    pub fn record_loaded(&mut self) {
        self.loaded = (self.loaded + 1).min(self.total);
    }

    /// Get loading percentage (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.loaded as f32 / self.total as f32) * 100.0) as u8
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.loaded >= self.total
    }

    /// Format the loading message shown while images arrive
    pub fn message(&self) -> String {
        if self.total > 0 {
            format!(
                "Loading images... {} / {} ({}%)",
                self.loaded,
                self.total,
                self.percent()
            )
        } else {
            "Loading images...".to_string()
        }
    }
}

/// Terminal loading failure. There is no retry; the user refreshes the page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("Failed to load image {id}: {reason}")]
    Image { id: FrameId, reason: String },
}

impl LoadError {
    /// Message shown to the user in place of the player.
    pub fn user_message(&self) -> &'static str {
        match self {
            LoadError::Manifest(_) => "Could not load the image list. Please refresh the page.",
            LoadError::Image { .. } => "Could not load the satellite images. Please refresh the page.",
        }
    }
}

/// Presentation state of the loader, mirrored into the status text.
#[derive(Clone, Debug)]
pub struct FrameLoaderState {
    pub phase: LoadingPhase,
    pub progress: LoadingProgress,
    pub error: Option<LoadError>,
}

impl Default for FrameLoaderState {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoaderState {
    pub fn new() -> Self {
        Self {
            phase: LoadingPhase::Idle,
            progress: LoadingProgress::new(),
            error: None,
        }
    }

    /// Begin a loading session
    pub fn start_manifest(&mut self) {
        self.phase = LoadingPhase::FetchingManifest;
        self.progress = LoadingProgress::new();
        self.error = None;
    }

    /// Mirror a progress report from [`load_frames`]
    pub fn observe(&mut self, progress: &LoadingProgress) {
        self.phase = LoadingPhase::LoadingImages;
        self.progress = progress.clone();
    }

    pub fn finish(&mut self) {
        self.phase = LoadingPhase::Complete;
    }

    /// Set an error and stop loading
    pub fn fail(&mut self, error: LoadError) {
        self.error = Some(error);
        self.phase = LoadingPhase::Failed;
    }

    /// Check if playback can start: loading finished and every image arrived
    pub fn can_play(&self) -> bool {
        self.phase == LoadingPhase::Complete && self.progress.is_complete()
    }

    /// Text for the status element.
    ///
    /// An empty manifest never leaves `FetchingManifest`, so it keeps the
    /// plain loading text.
    pub fn status_message(&self) -> String {
        match self.phase {
            LoadingPhase::Idle | LoadingPhase::FetchingManifest => "Loading images...".to_string(),
            LoadingPhase::LoadingImages => self.progress.message(),
            LoadingPhase::Complete => String::new(),
            LoadingPhase::Failed => self
                .error
                .as_ref()
                .map(|e| e.user_message().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Fully loaded frames, ready for playback.
#[derive(Clone, Debug)]
pub struct LoadedFrames<H> {
    pub sequence: FrameSequence,
    pub cache: FrameCache<H>,
}

/// Result of a successful loading session.
#[derive(Clone, Debug)]
pub enum LoadOutcome<H> {
    /// Every frame is decoded and cached
    Ready(LoadedFrames<H>),
    /// The manifest listed no frames; nothing to play
    Empty,
}

/// Trait for async frame providers.
///
/// Implement this trait on top of your I/O mechanism (fetch API, filesystem,
/// in-memory fakes). No `Send` bounds, so it works in single-threaded WASM.
pub trait FrameSource {
    /// Host handle for a decoded image
    type Handle;

    /// Fetch the raw manifest body
    fn fetch_manifest(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, ManifestError>>;

    /// Fetch and decode one frame image.
    ///
    /// The error string is surfaced in [`LoadError::Image`].
    fn load_image(&self, id: &FrameId) -> impl Future<Output = Result<FrameImage<Self::Handle>, String>>;
}

/// Load the manifest and then every frame it lists.
///
/// All image loads are started together, one per distinct frame id; an id
/// repeated in the manifest is fetched once and shown at every position it
/// is listed. `on_progress` is called once when the loads start and again
/// after each completion, in completion order. The first
/// image failure ends the session with [`LoadError::Image`]; images still in
/// flight are abandoned and no partial cache is returned.
pub async fn load_frames<S, F>(source: &S, manifest_path: &str, mut on_progress: F) -> Result<LoadOutcome<S::Handle>, LoadError>
where
    S: FrameSource,
    F: FnMut(&LoadingProgress),
{
    log::info!("fetching manifest from {manifest_path}");
    let body = source.fetch_manifest(manifest_path).await?;
    let sequence = parse_manifest(&body)?;

    if sequence.is_empty() {
        log::warn!("manifest {manifest_path} lists no frames");
        return Ok(LoadOutcome::Empty);
    }

    let unique: Vec<FrameId> = {
        let mut seen = HashSet::with_capacity(sequence.len());
        sequence.iter().filter(|id| seen.insert(*id)).cloned().collect()
    };
    if unique.len() < sequence.len() {
        log::debug!("manifest lists {} frames, {} distinct", sequence.len(), unique.len());
    }

    let total = unique.len();
    let mut progress = LoadingProgress::new();
    progress.reset(total);
    on_progress(&progress);

    let mut pending: FuturesUnordered<_> = unique
        .into_iter()
        .map(|id| async move {
            let result = source.load_image(&id).await;
            (id, result)
        })
        .collect();

    let mut cache = FrameCache::with_capacity(total);
    while let Some((id, result)) = pending.next().await {
        match result {
            Ok(image) => {
                cache.insert(id, image);
                progress.record_loaded();
                on_progress(&progress);
            }
            Err(reason) => {
                log::error!("image {id} failed to load: {reason}");
                return Err(LoadError::Image { id, reason });
            }
        }
    }

    log::info!("loaded {total} images for {} frames", sequence.len());
    Ok(LoadOutcome::Ready(LoadedFrames { sequence, cache }))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::future::join;

    use super::*;

    /// Serves a fixed manifest; images resolve immediately unless listed as broken.
    struct StaticSource {
        manifest: Result<Vec<u8>, ManifestError>,
        broken: Vec<&'static str>,
    }

    impl StaticSource {
        fn new(manifest: &str) -> Self {
            Self {
                manifest: Ok(manifest.as_bytes().to_vec()),
                broken: Vec::new(),
            }
        }
    }

    impl FrameSource for StaticSource {
        type Handle = String;

        async fn fetch_manifest(&self, _path: &str) -> Result<Vec<u8>, ManifestError> {
            self.manifest.clone()
        }

        async fn load_image(&self, id: &FrameId) -> Result<FrameImage<String>, String> {
            if self.broken.contains(&id.as_str()) {
                Err("decode error".to_string())
            } else {
                Ok(FrameImage::new(id.to_string(), 850, 850))
            }
        }
    }

    /// Resolves every image and records the order `load_image` was called in.
    #[derive(Default)]
    struct CountingSource {
        manifest: &'static str,
        calls: RefCell<Vec<String>>,
    }

    impl FrameSource for CountingSource {
        type Handle = String;

        async fn fetch_manifest(&self, _path: &str) -> Result<Vec<u8>, ManifestError> {
            Ok(self.manifest.as_bytes().to_vec())
        }

        async fn load_image(&self, id: &FrameId) -> Result<FrameImage<String>, String> {
            self.calls.borrow_mut().push(id.to_string());
            Ok(FrameImage::new(id.to_string(), 4, 4))
        }
    }

    /// Images resolve only when the test completes their channel.
    struct ManualSource {
        senders: RefCell<HashMap<String, oneshot::Sender<()>>>,
    }

    impl FrameSource for ManualSource {
        type Handle = String;

        async fn fetch_manifest(&self, _path: &str) -> Result<Vec<u8>, ManifestError> {
            Ok(br#"["a.png", "b.png", "c.png"]"#.to_vec())
        }

        async fn load_image(&self, id: &FrameId) -> Result<FrameImage<String>, String> {
            let (tx, rx) = oneshot::channel();
            self.senders.borrow_mut().insert(id.to_string(), tx);
            rx.await.map_err(|_| "cancelled".to_string())?;
            Ok(FrameImage::new(id.to_string(), 1, 1))
        }
    }

    #[test]
    fn test_loading_progress() {
        let mut progress = LoadingProgress::new();
        progress.reset(4);
        assert_eq!(progress.percent(), 0);
        assert!(!progress.is_complete());

        progress.record_loaded();
        progress.record_loaded();
        assert_eq!(progress.percent(), 50);
        assert_eq!(progress.message(), "Loading images... 2 / 4 (50%)");

        progress.record_loaded();
        progress.record_loaded();
        progress.record_loaded();
        assert_eq!(progress.loaded, 4);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_loader_state_messages() {
        let mut state = FrameLoaderState::new();
        state.start_manifest();
        assert_eq!(state.status_message(), "Loading images...");

        let mut progress = LoadingProgress::new();
        progress.reset(3);
        progress.record_loaded();
        state.observe(&progress);
        assert_eq!(state.phase, LoadingPhase::LoadingImages);
        assert_eq!(state.status_message(), "Loading images... 1 / 3 (33%)");
        assert!(!state.can_play());

        state.fail(LoadError::Image {
            id: FrameId::from("b.png"),
            reason: "404".into(),
        });
        assert_eq!(state.phase, LoadingPhase::Failed);
        assert_eq!(
            state.status_message(),
            "Could not load the satellite images. Please refresh the page."
        );
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let manifest = LoadError::from(ManifestError::NotAnArray);
        let image = LoadError::Image {
            id: FrameId::from("a.png"),
            reason: "404".into(),
        };
        assert_ne!(manifest.user_message(), image.user_message());
    }

    #[test]
    fn test_load_all_frames() {
        let source = StaticSource::new(r#"["a.png", "b.png", "c.png"]"#);
        let mut reports = Vec::new();

        let outcome = block_on(load_frames(&source, "images.json", |p| reports.push(p.loaded))).unwrap();

        let LoadOutcome::Ready(frames) = outcome else {
            panic!("expected frames");
        };
        assert_eq!(frames.sequence.len(), 3);
        assert_eq!(frames.cache.len(), 3);
        assert!(frames.sequence.iter().all(|id| frames.cache.contains(id)));
        assert_eq!(reports, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_repeated_frame_is_fetched_once() {
        let source = CountingSource {
            manifest: r#"["a.png", "b.png", "a.png"]"#,
            ..Default::default()
        };
        let mut reports = Vec::new();

        let outcome = block_on(load_frames(&source, "images.json", |p| reports.push((p.loaded, p.total)))).unwrap();

        assert_eq!(*source.calls.borrow(), vec!["a.png", "b.png"]);
        assert_eq!(reports, vec![(0, 2), (1, 2), (2, 2)]);
        let LoadOutcome::Ready(frames) = outcome else {
            panic!("expected frames");
        };
        assert_eq!(frames.sequence.len(), 3);
        assert_eq!(frames.cache.len(), 2);
        assert!(frames.sequence.iter().all(|id| frames.cache.contains(id)));
    }

    #[test]
    fn test_can_play_needs_every_image() {
        let mut state = FrameLoaderState::new();
        state.start_manifest();
        let mut progress = LoadingProgress::new();
        progress.reset(2);
        progress.record_loaded();
        state.observe(&progress);

        state.finish();
        assert!(!state.can_play());

        progress.record_loaded();
        state.observe(&progress);
        state.finish();
        assert!(state.can_play());
    }

    #[test]
    fn test_load_empty_manifest() {
        let source = StaticSource::new("[]");
        let mut called = false;
        let outcome = block_on(load_frames(&source, "images.json", |_| called = true)).unwrap();
        assert!(matches!(outcome, LoadOutcome::Empty));
        assert!(!called);
    }

    #[test]
    fn test_manifest_failure() {
        let source = StaticSource {
            manifest: Err(ManifestError::Fetch("HTTP 404".into())),
            broken: Vec::new(),
        };
        let result = block_on(load_frames(&source, "images.json", |_| {}));
        assert_eq!(
            result.unwrap_err(),
            LoadError::Manifest(ManifestError::Fetch("HTTP 404".into()))
        );
    }

    #[test]
    fn test_single_image_failure_aborts() {
        let mut source = StaticSource::new(r#"["a.png", "b.png", "c.png"]"#);
        source.broken.push("b.png");

        let result = block_on(load_frames(&source, "images.json", |_| {}));
        match result {
            Err(LoadError::Image { id, .. }) => assert_eq!(id.as_str(), "b.png"),
            other => panic!("expected image error, got {other:?}"),
        }
    }

    /// Yield once, waking immediately so the executor polls again.
    async fn yield_now() {
        let mut yielded = false;
        futures::future::poll_fn(|cx| {
            if yielded {
                std::task::Poll::Ready(())
            } else {
                yielded = true;
                cx.waker().wake_by_ref();
                std::task::Poll::Pending
            }
        })
        .await
    }

    #[test]
    fn test_progress_follows_completion_order() {
        let source = ManualSource {
            senders: RefCell::new(HashMap::new()),
        };
        let order = RefCell::new(Vec::new());

        let load = load_frames(&source, "images.json", |p| order.borrow_mut().push(p.loaded));
        let driver = async {
            while source.senders.borrow().len() < 3 {
                yield_now().await;
            }
            // Complete out of manifest order; each completion is reported at once.
            for (step, name) in ["c.png", "a.png", "b.png"].into_iter().enumerate() {
                let tx = source.senders.borrow_mut().remove(name).unwrap();
                tx.send(()).unwrap();
                while order.borrow().last() != Some(&(step + 1)) {
                    yield_now().await;
                }
            }
        };

        let (result, ()) = block_on(join(load, driver));
        assert!(matches!(result, Ok(LoadOutcome::Ready(_))));
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }
}
