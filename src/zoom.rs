//! Zoom and magnifier geometry.
//!
//! Every strategy is a pure function of the pointer position, the image
//! rectangle frozen at gesture start, and configuration.

use serde::{Deserialize, Serialize};

/// A point in viewport pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Intrinsic image size in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in viewport pixels, as from `getBoundingClientRect`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Convert a viewport point into rectangle-local pixels.
    #[inline]
    pub fn to_local(&self, point: Point) -> Point {
        Point::new(point.x - self.left, point.y - self.top)
    }

    /// Both dimensions are positive.
    #[inline]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Magnifier lens parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    /// Lens diameter in pixels
    pub diameter: f64,
    /// Magnification relative to the image's natural size
    pub zoom: f64,
    /// Offset of the lens center from the pointer (x right, y down)
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            diameter: 160.0,
            zoom: 2.5,
            offset_x: 90.0,
            offset_y: -90.0,
        }
    }
}

impl LensConfig {
    #[inline]
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }
}

/// Which interpretation the pointer controller applies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoomStrategy {
    /// Scale around an origin clamped into an inset control box
    ClampedOrigin { scale: f64, inset: f64 },
    /// Scale around the exact pointer position
    FixedPoint { scale: f64 },
    /// Separate lens overlay showing a magnified crop
    Magnifier(LensConfig),
}

impl Default for ZoomStrategy {
    fn default() -> Self {
        ZoomStrategy::ClampedOrigin {
            scale: 2.0,
            inset: 80.0,
        }
    }
}

/// Transform origin of a zoomed image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomOrigin {
    /// Fractions of the image size, each in [0, 1]
    Fraction { x: f64, y: f64 },
    /// Element-local pixels
    Pixels { x: f64, y: f64 },
}

/// Placement and background of the magnifier lens, in container pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LensPlacement {
    /// Lens position, clamped into the container
    pub left: f64,
    pub top: f64,
    pub diameter: f64,
    /// Size of the magnified background image
    pub background_width: f64,
    pub background_height: f64,
    /// Background offset that centers the sampled point in the lens
    pub background_x: f64,
    pub background_y: f64,
}

/// Visual state produced by the pointer controller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum VisualTransform {
    /// Resting state, no zoom and no lens
    #[default]
    Identity,
    Zoom { origin: ZoomOrigin, scale: f64 },
    Lens(LensPlacement),
}

/// Map `value` from `[start + inset, end - inset]` onto [0, 1], clamping first.
///
/// A control box with no extent (inset too large for the span) maps to 0.5.
fn clamped_fraction(value: f64, start: f64, extent: f64, inset: f64) -> f64 {
    let span = extent - 2.0 * inset;
    if span <= 0.0 {
        return 0.5;
    }
    let low = start + inset;
    (value.clamp(low, low + span) - low) / span
}

/// Clamped-origin zoom: origin fractions from the pointer inside the control box.
///
/// ## Example
///
/// ```rust
/// use satloop_core_view::zoom::{clamped_origin, Point, Rect};
///
/// let rect = Rect::new(0.0, 0.0, 400.0, 300.0);
/// // The top-left corner clamps to (80, 80), the control box corner.
/// assert_eq!(clamped_origin(Point::new(0.0, 0.0), rect, 80.0), (0.0, 0.0));
/// assert_eq!(clamped_origin(rect.center(), rect, 80.0), (0.5, 0.5));
/// ```
pub fn clamped_origin(point: Point, rect: Rect, inset: f64) -> (f64, f64) {
    let inset = inset.max(0.0);
    (
        clamped_fraction(point.x, rect.left, rect.width, inset),
        clamped_fraction(point.y, rect.top, rect.height, inset),
    )
}

/// Fixed-point zoom: origin at the pointer in element-local pixels, unclamped.
pub fn fixed_point_origin(point: Point, rect: Rect) -> Point {
    rect.to_local(point)
}

/// Magnifier lens placement.
///
/// `image` is the displayed image rectangle, `container` the element the
/// lens is positioned in, and `natural` the frame's intrinsic size. Returns
/// `None` when either the displayed or the natural size is empty.
pub fn magnifier_lens(point: Point, image: Rect, container: Rect, natural: Size, lens: &LensConfig) -> Option<LensPlacement> {
    if !image.has_area() || natural.width <= 0.0 || natural.height <= 0.0 {
        return None;
    }

    let local = image.to_local(point);
    let natural_x = local.x * natural.width / image.width;
    let natural_y = local.y * natural.height / image.height;

    let radius = lens.radius();
    let background_x = -(natural_x * lens.zoom - radius);
    let background_y = -(natural_y * lens.zoom - radius);

    // Lens center sits at pointer + offset so it stays clear of the finger.
    let anchor = container.to_local(point);
    let max_left = (container.width - lens.diameter).max(0.0);
    let max_top = (container.height - lens.diameter).max(0.0);
    let left = (anchor.x + lens.offset_x - radius).clamp(0.0, max_left);
    let top = (anchor.y + lens.offset_y - radius).clamp(0.0, max_top);

    Some(LensPlacement {
        left,
        top,
        diameter: lens.diameter,
        background_width: natural.width * lens.zoom,
        background_height: natural.height * lens.zoom,
        background_x,
        background_y,
    })
}

/// Compute the transform a strategy applies for one pointer position.
pub fn transform_for(strategy: &ZoomStrategy, point: Point, image: Rect, container: Rect, natural: Size) -> VisualTransform {
    match strategy {
        ZoomStrategy::ClampedOrigin { scale, inset } => {
            let (x, y) = clamped_origin(point, image, *inset);
            VisualTransform::Zoom {
                origin: ZoomOrigin::Fraction { x, y },
                scale: *scale,
            }
        }
        ZoomStrategy::FixedPoint { scale } => {
            let local = fixed_point_origin(point, image);
            VisualTransform::Zoom {
                origin: ZoomOrigin::Pixels {
                    x: local.x,
                    y: local.y,
                },
                scale: *scale,
            }
        }
        ZoomStrategy::Magnifier(lens) => magnifier_lens(point, image, container, natural, lens)
            .map(VisualTransform::Lens)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);

    #[test]
    fn test_clamped_origin_corner() {
        assert_eq!(clamped_origin(Point::new(0.0, 0.0), RECT, 80.0), (0.0, 0.0));
        assert_eq!(clamped_origin(Point::new(400.0, 300.0), RECT, 80.0), (1.0, 1.0));
    }

    #[test]
    fn test_clamped_origin_center() {
        assert_eq!(clamped_origin(RECT.center(), RECT, 80.0), (0.5, 0.5));

        let offset = Rect::new(120.0, 40.0, 400.0, 300.0);
        assert_eq!(clamped_origin(offset.center(), offset, 80.0), (0.5, 0.5));
    }

    #[test]
    fn test_clamped_origin_linear_inside_box() {
        // Box spans x in [80, 320]; 140 is a quarter of the way.
        let (x, _) = clamped_origin(Point::new(140.0, 150.0), RECT, 80.0);
        assert!((x - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_origin_stays_in_unit_range() {
        for &(px, py) in &[(-500.0, -500.0), (900.0, 20.0), (10.0, 9000.0), (200.0, -1.0)] {
            let (x, y) = clamped_origin(Point::new(px, py), RECT, 80.0);
            assert!((0.0..=1.0).contains(&x), "x = {x}");
            assert!((0.0..=1.0).contains(&y), "y = {y}");
        }
    }

    #[test]
    fn test_clamped_origin_oversized_inset() {
        let small = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(clamped_origin(Point::new(0.0, 100.0), small, 80.0), (0.5, 0.5));
    }

    #[test]
    fn test_fixed_point_origin() {
        let rect = Rect::new(50.0, 20.0, 400.0, 300.0);
        assert_eq!(fixed_point_origin(Point::new(60.0, 25.0), rect), Point::new(10.0, 5.0));
        // Not clamped
        assert_eq!(fixed_point_origin(Point::new(0.0, 0.0), rect), Point::new(-50.0, -20.0));
    }

    #[test]
    fn test_lens_background_centers_natural_point() {
        let lens = LensConfig {
            diameter: 100.0,
            zoom: 2.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        // Displayed at half the natural size.
        let image = Rect::new(0.0, 0.0, 400.0, 300.0);
        let natural = Size::new(800.0, 600.0);

        for &(px, py) in &[(0.0, 0.0), (100.0, 50.0), (399.0, 299.0), (200.0, 150.0)] {
            let placement = magnifier_lens(Point::new(px, py), image, image, natural, &lens).unwrap();
            let (nx, ny) = (px * 2.0, py * 2.0);
            assert_eq!(placement.background_x, -(nx * lens.zoom - lens.radius()));
            assert_eq!(placement.background_y, -(ny * lens.zoom - lens.radius()));
        }
    }

    #[test]
    fn test_lens_background_size() {
        let lens = LensConfig::default();
        let placement = magnifier_lens(Point::new(10.0, 10.0), RECT, RECT, Size::new(850.0, 850.0), &lens).unwrap();
        assert_eq!(placement.background_width, 850.0 * 2.5);
        assert_eq!(placement.background_height, 850.0 * 2.5);
        assert_eq!(placement.diameter, 160.0);
    }

    #[test]
    fn test_lens_clamped_into_container() {
        let lens = LensConfig::default();
        let container = Rect::new(10.0, 10.0, 400.0, 300.0);
        let natural = Size::new(800.0, 600.0);

        for &(px, py) in &[(10.0, 10.0), (410.0, 10.0), (410.0, 310.0), (10.0, 310.0), (-200.0, 900.0)] {
            let placement = magnifier_lens(Point::new(px, py), container, container, natural, &lens).unwrap();
            assert!((0.0..=400.0 - 160.0).contains(&placement.left), "left = {}", placement.left);
            assert!((0.0..=300.0 - 160.0).contains(&placement.top), "top = {}", placement.top);
        }
    }

    #[test]
    fn test_lens_offset_up_and_right() {
        let lens = LensConfig::default();
        let container = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let placement = magnifier_lens(Point::new(500.0, 500.0), container, container, Size::new(1000.0, 1000.0), &lens).unwrap();
        // Center at (590, 410)
        assert_eq!(placement.left, 510.0);
        assert_eq!(placement.top, 330.0);
    }

    #[test]
    fn test_lens_requires_geometry() {
        let lens = LensConfig::default();
        let empty = Rect::new(0.0, 0.0, 0.0, 0.0);
        assert!(magnifier_lens(Point::default(), empty, RECT, Size::new(10.0, 10.0), &lens).is_none());
        assert!(magnifier_lens(Point::default(), RECT, RECT, Size::default(), &lens).is_none());
    }

    #[test]
    fn test_transform_for_strategies() {
        let natural = Size::new(400.0, 300.0);
        let clamped = transform_for(&ZoomStrategy::default(), RECT.center(), RECT, RECT, natural);
        assert_eq!(
            clamped,
            VisualTransform::Zoom {
                origin: ZoomOrigin::Fraction { x: 0.5, y: 0.5 },
                scale: 2.0
            }
        );

        let fixed = transform_for(&ZoomStrategy::FixedPoint { scale: 2.5 }, Point::new(30.0, 40.0), RECT, RECT, natural);
        assert_eq!(
            fixed,
            VisualTransform::Zoom {
                origin: ZoomOrigin::Pixels { x: 30.0, y: 40.0 },
                scale: 2.5
            }
        );

        let lens = transform_for(&ZoomStrategy::Magnifier(LensConfig::default()), RECT.center(), RECT, RECT, Size::default());
        assert_eq!(lens, VisualTransform::Identity);
    }
}
