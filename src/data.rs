//! Core data structures for frame sequences and decoded images.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for one frame, usually the image URL listed in the manifest.
///
/// Ordering between frames is defined by manifest position, never by the
/// identifier text, so `FrameId` deliberately does not implement `Ord`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(String);

impl FrameId {
    /// Create a new frame identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as listed in the manifest.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment of the identifier.
    ///
    /// - "images/umv/a.webp" -> "a.webp"
    /// - "a.webp" -> "a.webp"
    pub fn file_name(&self) -> &str {
        let path = self.0.split(['?', '#']).next().unwrap_or(&self.0);
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Extract the capture time from a GOES-style file name.
    ///
    /// Handles names starting with `YYYYDDDHHMM`, for example
    /// "20252861200_GOES19-ABI-UMV-GEOCOLOR-2400x2400.webp". Returns `None`
    /// for any other naming scheme.
    pub fn capture_time(&self) -> Option<CaptureTime> {
        let name = self.file_name();
        let stamp = name.get(..11)?;
        if !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // A longer run of digits is some other numbering scheme.
        if name.as_bytes().get(11).is_some_and(u8::is_ascii_digit) {
            return None;
        }

        let year = stamp[0..4].parse().ok()?;
        let day_of_year = stamp[4..7].parse().ok()?;
        let hour = stamp[7..9].parse().ok()?;
        let minute = stamp[9..11].parse().ok()?;

        if !(1..=366).contains(&day_of_year) || hour > 23 || minute > 59 {
            return None;
        }

        Some(CaptureTime {
            year,
            day_of_year,
            hour,
            minute,
        })
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FrameId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// UTC capture time encoded in a satellite image file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CaptureTime {
    pub year: u16,
    /// Day of the year, 1-based
    pub day_of_year: u16,
    pub hour: u8,
    pub minute: u8,
}

impl CaptureTime {
    /// Human readable label, e.g. "2025-286 12:00 UTC".
    pub fn label(&self) -> String {
        format!(
            "{:04}-{:03} {:02}:{:02} UTC",
            self.year, self.day_of_year, self.hour, self.minute
        )
    }
}

/// Ordered, zero-indexed list of frames in display order.
///
/// All next/previous arithmetic is modulo the sequence length and yields
/// `None` for an empty sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameSequence {
    ids: Vec<FrameId>,
}

impl FrameSequence {
    /// Create a sequence from identifiers in manifest order.
    pub fn new(ids: Vec<FrameId>) -> Self {
        Self { ids }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Get the identifier at the given index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&FrameId> {
        self.ids.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameId> {
        self.ids.iter()
    }

    /// Index of the final frame, the one that gets the hold duration.
    #[inline]
    pub fn last_index(&self) -> Option<usize> {
        self.ids.len().checked_sub(1)
    }

    /// Index following `index`, wrapping to 0 after the last frame.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        let len = self.ids.len();
        (len > 0).then(|| (index % len + 1) % len)
    }

    /// Index preceding `index`, wrapping to the last frame before 0.
    pub fn prev_index(&self, index: usize) -> Option<usize> {
        let len = self.ids.len();
        (len > 0).then(|| (index % len + len - 1) % len)
    }
}

/// A decoded image handle with its natural pixel dimensions.
///
/// `H` is whatever the host uses to display an image (an
/// `HtmlImageElement` on the web, a plain URL in tests).
#[derive(Clone, Debug, PartialEq)]
pub struct FrameImage<H> {
    handle: H,
    width: u32,
    height: u32,
}

impl<H> FrameImage<H> {
    pub fn new(handle: H, width: u32, height: u32) -> Self {
        Self {
            handle,
            width,
            height,
        }
    }

    #[inline]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Intrinsic width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Intrinsic height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Write-once mapping from frame identifier to decoded image.
#[derive(Clone, Debug)]
pub struct FrameCache<H> {
    entries: HashMap<FrameId, FrameImage<H>>,
}

impl<H> Default for FrameCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> FrameCache<H> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Store a decoded image.
    ///
    /// Returns `false` and keeps the existing entry if `id` was already cached.
    pub fn insert(&mut self, id: FrameId, image: FrameImage<H>) -> bool {
        if self.entries.contains_key(&id) {
            log::debug!("frame {id} already cached, keeping first image");
            return false;
        }
        self.entries.insert(id, image);
        true
    }

    #[inline]
    pub fn get(&self, id: &FrameId) -> Option<&FrameImage<H>> {
        self.entries.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &FrameId) -> bool {
        self.entries.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
