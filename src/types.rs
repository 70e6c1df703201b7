//! Common types used throughout the annotator.

use serde::Deserialize;
use std::cmp::Ordering;

/// A caret position relative to the viewport.
///
/// - `y_line`: row within the visible window (0 = first visible display line)
/// - `x_line`: **char column** within that display line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewportPos {
    pub x_line: usize,
    pub y_line: usize,
}

/// A position measured from the start of the document.
///
/// - `y_line`: absolute display line index, independent of scrolling
/// - `x_line`: char column within that display line
///
/// Ordering follows document order: rows first, then columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DocumentPos {
    pub x_line: usize,
    pub y_line: usize,
}

impl DocumentPos {
    pub fn new(x_line: usize, y_line: usize) -> Self {
        Self { x_line, y_line }
    }
}

impl Ord for DocumentPos {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y_line, self.x_line).cmp(&(other.y_line, other.x_line))
    }
}

impl PartialOrd for DocumentPos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The two ends of a selection, in the order the user made them.
///
/// `start` is the anchor that stays put while Shift is held; `end` follows the caret.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub start: DocumentPos,
    pub end: DocumentPos,
}

impl Selection {
    /// Endpoints in document order.
    pub fn ordered(&self) -> (DocumentPos, DocumentPos) {
        if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }
}

/// Whether the selection end lies after or before its start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// What the user is allowed to do with the text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Read-only; selections are made for annotation.
    #[default]
    Highlight,
    /// Text editing that must leave anchor markup intact.
    Semi,
    /// Unrestricted editing of the raw markup.
    Raw,
}

impl EditMode {
    /// Parse a mode name (case-insensitive).
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "highlight" | "hl" => Some(Self::Highlight),
            "semi" | "text" => Some(Self::Semi),
            "raw" | "xml" => Some(Self::Raw),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Highlight => "HIGHLIGHT",
            Self::Semi => "SEMI",
            Self::Raw => "RAW",
        }
    }

    /// `false` only for the read-only mode.
    pub fn allows_edits(self) -> bool {
        self != Self::Highlight
    }
}

/// Rendering-area measurements supplied by the host.
///
/// All values are in host units (canvas pixels, or terminal cells with every factor at 1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Width of the text area.
    pub width: f32,
    /// Advance of one glyph.
    pub char_width: f32,
    /// Height of one display line.
    pub line_height: f32,
    /// Device scale between pointer coordinates and drawing coordinates.
    pub ratio: f32,
}

impl Geometry {
    /// A geometry where one unit is one terminal cell.
    pub fn cells(columns: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let width = columns as f32;
        Self {
            width,
            char_width: 1.0,
            line_height: 1.0,
            ratio: 1.0,
        }
    }

    /// Number of chars per display line: `floor(width / char_width)`, never below 1.
    pub fn wrap_column(&self) -> usize {
        if self.char_width <= 0.0 || self.width <= 0.0 {
            return 1;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cols = (self.width / self.char_width).floor() as usize;
        cols.max(1)
    }

    /// Map a pointer position to the viewport cell under it.
    pub fn cell_at(&self, x: f32, y: f32) -> ViewportPos {
        let scale = |v: f32, unit: f32| -> usize {
            if unit <= 0.0 || v <= 0.0 {
                return 0;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let cell = (v * self.ratio / unit).floor() as usize;
            cell
        };
        ViewportPos {
            x_line: scale(x, self.char_width),
            y_line: scale(y, self.line_height),
        }
    }

    /// Pointer coordinates of the middle of a viewport cell (inverse of [`Self::cell_at`]).
    pub fn point_at(&self, cell: ViewportPos) -> (f32, f32) {
        let ratio = if self.ratio > 0.0 { self.ratio } else { 1.0 };
        #[allow(clippy::cast_precision_loss)]
        let (x, y) = (cell.x_line as f32 + 0.5, cell.y_line as f32 + 0.5);
        (x * self.char_width / ratio, y * self.line_height / ratio)
    }
}

/// How an anchored span should be painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    /// Subtle tint marking the anchor currently in focus.
    Focus,
    Underline,
    #[default]
    Background,
}

/// Paint parameters for a highlight.
#[derive(Clone, Debug, PartialEq)]
pub struct HighlightStyle {
    /// Color name understood by the host.
    pub color: String,
    pub opacity: f32,
}

/// The host's answer to "how should this entity be highlighted?".
#[derive(Clone, Debug, PartialEq)]
pub struct HighlightSchema {
    pub mode: HighlightMode,
    pub style: HighlightStyle,
}

/// A highlighted piece of one visible display line.
#[derive(Clone, Debug, PartialEq)]
pub struct HighlightSpan {
    /// Viewport row.
    pub row: usize,
    /// Start char column (inclusive).
    pub start: usize,
    /// End char column (exclusive).
    pub end: usize,
    /// Entity the span belongs to.
    pub entity_id: String,
    pub schema: HighlightSchema,
}
