//! The single point where the displayed frame changes.

use crate::pointer::CaptureCommand;
use crate::style::StyleCommands;
use crate::{FrameCache, FrameImage, FrameSequence};

/// Host surface the player writes to.
///
/// `H` is the image handle type stored in the [`FrameCache`].
pub trait FrameView<H> {
    /// Loading or error text while the player is hidden.
    fn set_status(&mut self, message: &str);

    /// Show the player and bound the scrubber to `[0, frame_count - 1]`.
    fn reveal(&mut self, frame_count: usize);

    fn set_scrubber_value(&mut self, index: usize);

    /// Swap the displayed image source.
    fn show_frame(&mut self, image: &FrameImage<H>);

    /// Point the magnifier lens background at this frame.
    fn set_lens_source(&mut self, image: &FrameImage<H>);

    /// Apply inline style edits for the image and lens.
    fn apply_style(&mut self, commands: &StyleCommands);

    /// Acquire or release pointer capture on the gesture element.
    fn apply_capture(&mut self, _command: CaptureCommand) {}

    /// Capture time caption, `None` when the frame name carries none.
    fn set_frame_label(&mut self, _label: Option<&str>) {}
}

impl<H, V: FrameView<H> + ?Sized> FrameView<H> for &mut V {
    fn set_status(&mut self, message: &str) {
        (**self).set_status(message);
    }

    fn reveal(&mut self, frame_count: usize) {
        (**self).reveal(frame_count);
    }

    fn set_scrubber_value(&mut self, index: usize) {
        (**self).set_scrubber_value(index);
    }

    fn show_frame(&mut self, image: &FrameImage<H>) {
        (**self).show_frame(image);
    }

    fn set_lens_source(&mut self, image: &FrameImage<H>) {
        (**self).set_lens_source(image);
    }

    fn apply_style(&mut self, commands: &StyleCommands) {
        (**self).apply_style(commands);
    }

    fn apply_capture(&mut self, command: CaptureCommand) {
        (**self).apply_capture(command);
    }

    fn set_frame_label(&mut self, label: Option<&str>) {
        (**self).set_frame_label(label);
    }
}

/// Owner of `current_index`.
///
/// [`ViewSync::sync`] is the only way to change the index, and it pushes the
/// new value to the scrubber, the displayed image and the lens together so
/// they never disagree.
#[derive(Clone, Debug, Default)]
pub struct ViewSync {
    current_index: usize,
}

impl ViewSync {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Make `index` the displayed frame.
    ///
    /// Out-of-range indices are ignored and leave everything unchanged. A
    /// frame missing from the cache updates the index and scrubber but keeps
    /// the previous image on screen. Returns `true` when `index` was applied.
    pub fn sync<H, V: FrameView<H>>(&mut self, index: usize, sequence: &FrameSequence, cache: &FrameCache<H>, lens_active: bool, view: &mut V) -> bool {
        let Some(id) = sequence.get(index) else {
            log::warn!("ignoring sync to frame {index} of {}", sequence.len());
            return false;
        };

        self.current_index = index;
        view.set_scrubber_value(index);

        match cache.get(id) {
            Some(image) => {
                view.show_frame(image);
                if lens_active {
                    view.set_lens_source(image);
                }
            }
            None => log::warn!("frame {id} is not cached; display unchanged"),
        }

        let label = id.capture_time().map(|time| time.label());
        view.set_frame_label(label.as_deref());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameId;

    #[derive(Default)]
    struct RecordingView {
        scrubber: Option<usize>,
        shown: Vec<&'static str>,
        lens: Vec<&'static str>,
        labels: Vec<Option<String>>,
    }

    impl FrameView<&'static str> for RecordingView {
        fn set_status(&mut self, _message: &str) {}
        fn reveal(&mut self, _frame_count: usize) {}
        fn set_scrubber_value(&mut self, index: usize) {
            self.scrubber = Some(index);
        }
        fn show_frame(&mut self, image: &FrameImage<&'static str>) {
            self.shown.push(*image.handle());
        }
        fn set_lens_source(&mut self, image: &FrameImage<&'static str>) {
            self.lens.push(*image.handle());
        }
        fn apply_style(&mut self, _commands: &StyleCommands) {}
        fn set_frame_label(&mut self, label: Option<&str>) {
            self.labels.push(label.map(str::to_string));
        }
    }

    fn frames() -> (FrameSequence, FrameCache<&'static str>) {
        let names = ["a.png", "b.png", "20252861200_c.png"];
        let sequence = FrameSequence::new(names.iter().map(|n| FrameId::from(*n)).collect());
        let mut cache = FrameCache::new();
        for name in names {
            cache.insert(FrameId::from(name), FrameImage::new(name, 4, 4));
        }
        (sequence, cache)
    }

    #[test]
    fn test_sync_updates_everything() {
        let (sequence, cache) = frames();
        let mut sync = ViewSync::new();
        let mut view = RecordingView::default();

        assert!(sync.sync(2, &sequence, &cache, false, &mut view));
        assert_eq!(sync.current_index(), 2);
        assert_eq!(view.scrubber, Some(2));
        assert_eq!(view.shown, vec!["20252861200_c.png"]);
        assert!(view.lens.is_empty());
        assert_eq!(view.labels, vec![Some("2025-286 12:00 UTC".to_string())]);
    }

    #[test]
    fn test_sync_refreshes_active_lens() {
        let (sequence, cache) = frames();
        let mut sync = ViewSync::new();
        let mut view = RecordingView::default();

        sync.sync(1, &sequence, &cache, true, &mut view);
        assert_eq!(view.lens, vec!["b.png"]);
    }

    #[test]
    fn test_sync_out_of_range_is_ignored() {
        let (sequence, cache) = frames();
        let mut sync = ViewSync::new();
        let mut view = RecordingView::default();
        sync.sync(1, &sequence, &cache, false, &mut view);

        assert!(!sync.sync(3, &sequence, &cache, false, &mut view));
        assert_eq!(sync.current_index(), 1);
        assert_eq!(view.scrubber, Some(1));
        assert_eq!(view.shown, vec!["b.png"]);
    }

    #[test]
    fn test_sync_missing_image_keeps_display() {
        let (sequence, _) = frames();
        let cache: FrameCache<&'static str> = FrameCache::new();
        let mut sync = ViewSync::new();
        let mut view = RecordingView::default();

        assert!(sync.sync(1, &sequence, &cache, true, &mut view));
        assert_eq!(sync.current_index(), 1);
        assert_eq!(view.scrubber, Some(1));
        assert!(view.shown.is_empty());
        assert!(view.lens.is_empty());
    }
}
