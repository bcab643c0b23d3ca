//! Selection geometry over the displayed image.
//!
//! All coordinates are on-screen pixels relative to the top-left corner of
//! the image container. Nothing here is clamped to the image bounds: a drag
//! that runs past the image edge keeps whatever the pointer reported.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Side length of a corner preset box.
pub const PRESET_SIZE: f64 = 100.0;
/// Inset of a corner preset box from the container edges.
pub const PRESET_MARGIN: f64 = 20.0;
/// Selections narrower than this cannot be submitted.
pub const MIN_SELECTION_WIDTH: f64 = 5.0;

/// A pointer position inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal offset in pixels.
    pub x: f64,
    /// Vertical offset in pixels.
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Displayed dimensions of the image container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = Error;

    /// Parse `WIDTHxHEIGHT`, e.g. `800x600`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| Error::InvalidSelection(format!("expected WxH, got {s:?}")))?;
        let width = parse_coord(w)?;
        let height = parse_coord(h)?;
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidSelection(format!(
                "container size must be positive, got {s:?}"
            )));
        }
        Ok(Self::new(width, height))
    }
}

/// Axis-aligned rectangle whose origin is always its visual top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width, never negative.
    pub width: f64,
    /// Height, never negative.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle, normalizing negative extents.
    #[must_use]
    pub fn new(mut x: f64, mut y: f64, mut width: f64, mut height: f64) -> Self {
        if width < 0.0 {
            x += width;
            width = -width;
        }
        if height < 0.0 {
            y += height;
            height = -height;
        }
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box of two opposite corners, in either order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Whether the selection is wide enough to be submitted.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.width >= MIN_SELECTION_WIDTH
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl FromStr for Rect {
    type Err = Error;

    /// Parse `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, w, h] = parts.as_slice() else {
            return Err(Error::InvalidSelection(format!(
                "expected x,y,width,height, got {s:?}"
            )));
        };
        Ok(Self::new(
            parse_coord(x)?,
            parse_coord(y)?,
            parse_coord(w)?,
            parse_coord(h)?,
        ))
    }
}

fn parse_coord(s: &str) -> Result<f64, Error> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| Error::InvalidSelection(format!("not a number: {s:?}")))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::InvalidSelection(format!("not a finite number: {s:?}")))
    }
}

/// One of the four quick-selection corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

impl Corner {
    /// All corners in display order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// The fixed preset box for this corner of `container`.
    #[must_use]
    pub fn preset(self, container: Size) -> Rect {
        let far_x = container.width - PRESET_SIZE - PRESET_MARGIN;
        let far_y = container.height - PRESET_SIZE - PRESET_MARGIN;
        let (x, y) = match self {
            Corner::TopLeft => (PRESET_MARGIN, PRESET_MARGIN),
            Corner::TopRight => (far_x, PRESET_MARGIN),
            Corner::BottomLeft => (PRESET_MARGIN, far_y),
            Corner::BottomRight => (far_x, far_y),
        };
        Rect {
            x,
            y,
            width: PRESET_SIZE,
            height: PRESET_SIZE,
        }
    }

    /// Human-readable label, e.g. `Top-Left`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Corner::TopLeft => "Top-Left",
            Corner::TopRight => "Top-Right",
            Corner::BottomLeft => "Bottom-Left",
            Corner::BottomRight => "Bottom-Right",
        }
    }
}

impl FromStr for Corner {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tl" | "top-left" | "topleft" => Ok(Corner::TopLeft),
            "tr" | "top-right" | "topright" => Ok(Corner::TopRight),
            "bl" | "bottom-left" | "bottomleft" => Ok(Corner::BottomLeft),
            "br" | "bottom-right" | "bottomright" => Ok(Corner::BottomRight),
            _ => Err(Error::InvalidSelection(format!(
                "unknown corner {s:?} (use tl, tr, bl or br)"
            ))),
        }
    }
}

/// Drag-to-select gesture state.
///
/// A pointer-down opens a zero-size rectangle at the press point; moves
/// while dragging stretch it; pointer-up or leaving the container commits
/// whatever was last computed.
#[derive(Debug, Clone, Default)]
pub struct SelectionTool {
    start: Option<Point>,
    selection: Option<Rect>,
    dragging: bool,
}

impl SelectionTool {
    /// Create a tool with no selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a drag at `p`.
    pub fn pointer_down(&mut self, p: Point) {
        self.start = Some(p);
        self.selection = Some(Rect::from_corners(p, p));
        self.dragging = true;
    }

    /// Stretch the rectangle to `p` if a drag is active.
    pub fn pointer_move(&mut self, p: Point) {
        if !self.dragging {
            return;
        }
        if let Some(start) = self.start {
            self.selection = Some(Rect::from_corners(start, p));
        }
    }

    /// End the drag, keeping the last rectangle.
    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Leaving the container ends the drag exactly like releasing the pointer.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Replace the selection with a corner preset.
    pub fn apply_preset(&mut self, corner: Corner, container: Size) {
        self.set(corner.preset(container));
    }

    /// Commit `rect` as the selection, ending any drag.
    pub fn set(&mut self, rect: Rect) {
        self.start = None;
        self.selection = Some(rect);
        self.dragging = false;
    }

    /// Drop any selection and drag state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The current (or committed) selection.
    #[must_use]
    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Whether the selection can be submitted for processing.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.selection.is_some_and(|r| r.is_usable())
    }
}
