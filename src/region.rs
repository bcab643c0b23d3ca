//! Coarse positional description of a selection.
//!
//! The container is split into a 3x3 grid and the selection origin is
//! classified into one cell. Only the coarse cell and the rounded origin
//! reach the model; the selection's extent is not described.

use std::fmt;

use crate::geometry::{Rect, Size};

/// Horizontal third of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    /// Left third.
    Left,
    /// Middle third.
    Center,
    /// Right third.
    Right,
}

/// Vertical third of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    /// Upper third.
    Top,
    /// Middle third.
    Middle,
    /// Lower third.
    Bottom,
}

impl Horizontal {
    fn classify(x: f64, width: f64) -> Self {
        if x < width / 3.0 {
            Horizontal::Left
        } else if x > width * 2.0 / 3.0 {
            Horizontal::Right
        } else {
            Horizontal::Center
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Horizontal::Left => "left",
            Horizontal::Center => "center",
            Horizontal::Right => "right",
        }
    }
}

impl Vertical {
    fn classify(y: f64, height: f64) -> Self {
        if y < height / 3.0 {
            Vertical::Top
        } else if y > height * 2.0 / 3.0 {
            Vertical::Bottom
        } else {
            Vertical::Middle
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Vertical::Top => "top",
            Vertical::Middle => "middle",
            Vertical::Bottom => "bottom",
        }
    }
}

/// One of the nine grid cells, displayed as e.g. `top right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Row.
    pub vertical: Vertical,
    /// Column.
    pub horizontal: Horizontal,
}

impl Region {
    /// Classify the origin of `rect` against the thirds of `container`.
    #[must_use]
    pub fn classify(rect: &Rect, container: Size) -> Self {
        Self {
            vertical: Vertical::classify(rect.y, container.height),
            horizontal: Horizontal::classify(rect.x, container.width),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.vertical.as_str(), self.horizontal.as_str())
    }
}

/// Round half toward positive infinity, as browsers do for `Math.round`.
#[allow(clippy::cast_possible_truncation)]
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Build the natural-language inpainting instruction for a selection.
#[must_use]
pub fn instruction(rect: &Rect, container: Size) -> String {
    let region = Region::classify(rect, container);
    let x = round_half_up(rect.x);
    let y = round_half_up(rect.y);
    format!(
        "This image has an AI watermark or logo located in the {region} area \
         (around {x}, {y}). Please remove only this identifier and fill the area \
         perfectly to match the background texture and content. Keep every other \
         pixel of the image exactly the same. Do not regenerate the whole image, \
         only heal the specified area."
    )
}
