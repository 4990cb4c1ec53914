//! Translation of visual transforms into style commands.
//!
//! This is a platform-agnostic representation of the inline style edits a
//! transform needs. Each host interprets the commands for its backend; the
//! `web` feature writes them to `CssStyleDeclaration`s.

use crate::pointer::ResetMode;
use crate::zoom::{LensPlacement, VisualTransform, ZoomOrigin};

/// One inline style edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleProperty {
    Set { name: &'static str, value: String },
    Remove(&'static str),
}

impl StyleProperty {
    fn set(name: &'static str, value: impl Into<String>) -> Self {
        StyleProperty::Set {
            name,
            value: value.into(),
        }
    }
}

/// Style edits for the main image and the lens overlay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleCommands {
    pub image: Vec<StyleProperty>,
    pub lens: Vec<StyleProperty>,
}

fn px(value: f64) -> String {
    format!("{value:.2}px")
}

fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Generate style commands for a transform.
///
/// ## Example
///
/// ```rust
/// use satloop_core_view::pointer::ResetMode;
/// use satloop_core_view::style::{style_for, StyleProperty};
/// use satloop_core_view::zoom::{VisualTransform, ZoomOrigin};
///
/// let zoom = VisualTransform::Zoom {
///     origin: ZoomOrigin::Fraction { x: 0.25, y: 1.0 },
///     scale: 2.0,
/// };
/// let commands = style_for(&zoom, ResetMode::ClearInline);
/// assert_eq!(
///     commands.image[0],
///     StyleProperty::Set { name: "transform-origin", value: "25.00% 100.00%".into() }
/// );
/// ```
pub fn style_for(transform: &VisualTransform, reset: ResetMode) -> StyleCommands {
    match transform {
        VisualTransform::Identity => identity_style(reset),
        VisualTransform::Zoom { origin, scale } => {
            let origin = match *origin {
                ZoomOrigin::Fraction { x, y } => format!("{} {}", percent(x), percent(y)),
                ZoomOrigin::Pixels { x, y } => format!("{} {}", px(x), px(y)),
            };
            StyleCommands {
                image: vec![
                    StyleProperty::set("transform-origin", origin),
                    StyleProperty::set("transform", format!("scale({scale})")),
                ],
                lens: Vec::new(),
            }
        }
        VisualTransform::Lens(placement) => StyleCommands {
            image: Vec::new(),
            lens: lens_style(placement),
        },
    }
}

fn identity_style(reset: ResetMode) -> StyleCommands {
    let image = match reset {
        ResetMode::ClearInline => vec![
            StyleProperty::Remove("transform-origin"),
            StyleProperty::Remove("transform"),
        ],
        ResetMode::NeutralScale => vec![
            StyleProperty::set("transform-origin", "50% 50%"),
            StyleProperty::set("transform", "scale(1)"),
        ],
    };
    StyleCommands {
        image,
        lens: vec![StyleProperty::set("display", "none")],
    }
}

fn lens_style(placement: &LensPlacement) -> Vec<StyleProperty> {
    vec![
        StyleProperty::set("display", "block"),
        StyleProperty::set("left", px(placement.left)),
        StyleProperty::set("top", px(placement.top)),
        StyleProperty::set("width", px(placement.diameter)),
        StyleProperty::set("height", px(placement.diameter)),
        StyleProperty::set(
            "background-size",
            format!("{} {}", px(placement.background_width), px(placement.background_height)),
        ),
        StyleProperty::set(
            "background-position",
            format!("{} {}", px(placement.background_x), px(placement.background_y)),
        ),
    ]
}

/// Lens background pointing at the current frame's source.
pub fn lens_background(src: &str) -> StyleProperty {
    StyleProperty::set("background-image", format!("url(\"{}\")", src.replace('"', "%22")))
}
