//! The window of display lines currently visible.

use crate::types::{DocumentPos, ViewportPos};
use std::cmp::{max, min};

/// Which display lines are on screen.
///
/// `line_start` is clamped to `[0, max(0, total_lines - 1)]` by every scroll operation. The
/// cursor is not adjusted here; keeping `Cursor::y_line` consistent after a scroll is the
/// caller's job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    /// Index of the topmost visible display line.
    pub line_start: usize,
    /// Number of display lines visible at once (at least 1).
    pub no_lines: usize,
}

impl Viewport {
    pub fn new(no_lines: usize) -> Self {
        Self {
            line_start: 0,
            no_lines: max(1, no_lines),
        }
    }

    /// Index of the last visible display line.
    pub fn line_end(&self) -> usize {
        self.line_start + self.no_lines - 1
    }

    /// Change the number of visible lines (after a resize).
    pub fn set_no_lines(&mut self, no_lines: usize) {
        self.no_lines = max(1, no_lines);
    }

    /// Jump so that `target` becomes the first visible line.
    pub fn scroll_to(&mut self, target: usize, total_lines: usize) {
        self.line_start = min(target, total_lines.saturating_sub(1));
    }

    /// Scroll towards the start of the document by `n` lines.
    pub fn scroll_up(&mut self, n: usize) {
        self.line_start = self.line_start.saturating_sub(n);
    }

    /// Scroll towards the end of the document by `n` lines.
    pub fn scroll_down(&mut self, n: usize, total_lines: usize) {
        self.scroll_to(self.line_start.saturating_add(n), total_lines);
    }

    /// Re-apply the upper bound after the document shrank.
    pub fn clamp(&mut self, total_lines: usize) {
        self.scroll_to(self.line_start, total_lines);
    }

    /// `true` if the absolute line is on screen.
    pub fn contains(&self, line: usize) -> bool {
        line >= self.line_start && line <= self.line_end()
    }

    /// Convert a viewport-relative position into an absolute one.
    pub fn to_document(&self, pos: ViewportPos) -> DocumentPos {
        DocumentPos {
            x_line: pos.x_line,
            y_line: self.line_start + pos.y_line,
        }
    }

    /// Convert an absolute position into a viewport-relative one, if it is visible.
    pub fn to_viewport(&self, pos: DocumentPos) -> Option<ViewportPos> {
        if !self.contains(pos.y_line) {
            return None;
        }
        Some(ViewportPos {
            x_line: pos.x_line,
            y_line: pos.y_line - self.line_start,
        })
    }
}
