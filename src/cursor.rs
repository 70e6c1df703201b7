//! The caret and the selection attached to it.

use crate::types::{Direction, DocumentPos, Selection, ViewportPos};
use crate::viewport::Viewport;

/// The 2D caret plus an optional selection.
///
/// The caret is stored **viewport-relative** (`y_line` counts from the first visible line), while
/// the selection endpoints are **absolute** [`DocumentPos`] values. Moving between the two always
/// goes through a [`Viewport`].
///
/// No bounds are enforced here: valid columns and rows depend on the text and the viewport,
/// which the key interpreter checks before placing the caret.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub x_line: usize,
    pub y_line: usize,
    selection: Option<Selection>,
    select_direction: Option<Direction>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> ViewportPos {
        ViewportPos {
            x_line: self.x_line,
            y_line: self.y_line,
        }
    }

    pub fn set_position(&mut self, x_line: usize, y_line: usize) {
        self.x_line = x_line;
        self.y_line = y_line;
    }

    /// Relative move. Columns and rows saturate at zero.
    pub fn move_by(&mut self, dx: isize, dy: isize) {
        self.x_line = self.x_line.saturating_add_signed(dx);
        self.y_line = self.y_line.saturating_add_signed(dy);
    }

    pub fn get_absolute_position(&self, viewport: &Viewport) -> DocumentPos {
        viewport.to_document(self.position())
    }

    pub fn select_start(&self) -> Option<DocumentPos> {
        self.selection.map(|s| s.start)
    }

    pub fn select_end(&self) -> Option<DocumentPos> {
        self.selection.map(|s| s.end)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Set both selection endpoints.
    pub fn select(&mut self, start: DocumentPos, end: DocumentPos) {
        self.selection = Some(Selection { start, end });
    }

    /// Move only the selection end; the start stays where it was.
    ///
    /// Without a selection this starts a degenerate one at `end`.
    pub fn extend_selection(&mut self, end: DocumentPos) {
        match &mut self.selection {
            Some(sel) => sel.end = end,
            None => self.select(end, end),
        }
    }

    /// Drop both endpoints. The direction is left for [`Self::set_true_selection_direction`].
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn select_direction(&self) -> Option<Direction> {
        self.select_direction
    }

    /// Recompute the direction from the actual endpoint order.
    ///
    /// Must run after every change to the selection endpoints.
    pub fn set_true_selection_direction(&mut self) {
        self.select_direction = match self.selection {
            Some(Selection { start, end }) if end > start => Some(Direction::Forward),
            Some(Selection { start, end }) if end < start => Some(Direction::Backward),
            _ => None,
        };
    }

    /// The selection in document order, or `None` when nothing (or nothing but a point) is selected.
    pub fn get_selected_area(&self) -> Option<(DocumentPos, DocumentPos)> {
        let sel = self.selection?;
        if sel.start == sel.end {
            return None;
        }
        Some(sel.ordered())
    }

    pub fn is_selected(&self) -> bool {
        self.get_selected_area().is_some()
    }

    /// Clear the selection and its direction; the caret stays put.
    pub fn reset(&mut self) {
        self.selection = None;
        self.select_direction = None;
    }
}
