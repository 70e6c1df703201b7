//! Caret movement: arrows, word jumps, Home/End and paging.

use super::Transition;
use crate::types::DocumentPos;
use std::cmp::min;
use tracing::trace;

impl Transition<'_> {
    pub(super) fn arrow_left(&mut self, ctrl: bool, shift: bool) {
        let original = self.caret();
        // Escaping a selection snaps to its left edge instead of stepping.
        if let (false, Some((start, _))) = (shift, self.cursor.get_selected_area()) {
            self.place(start);
            self.update_selection(false, original);
            return;
        }
        self.advance(ctrl, false);
        self.update_selection(shift, original);
    }

    pub(super) fn arrow_right(&mut self, ctrl: bool, shift: bool) {
        let original = self.caret();
        if let (false, Some((_, end))) = (shift, self.cursor.get_selected_area()) {
            self.place(end);
            self.update_selection(false, original);
            return;
        }
        self.advance(ctrl, true);
        self.update_selection(shift, original);
    }

    pub(super) fn arrow_up(&mut self, shift: bool) {
        let original = self.caret();
        if original.y_line == 0 {
            self.cursor.x_line = 0;
        } else {
            let y = original.y_line - 1;
            self.place(DocumentPos::new(min(original.x_line, self.text.line_len(y)), y));
        }
        self.update_selection(shift, original);
    }

    pub(super) fn arrow_down(&mut self, shift: bool) {
        let original = self.caret();
        if original.y_line + 1 >= self.text.no_lines() {
            self.cursor.x_line = self.text.line_len(original.y_line);
        } else {
            let y = original.y_line + 1;
            self.place(DocumentPos::new(min(original.x_line, self.text.line_len(y)), y));
        }
        self.update_selection(shift, original);
    }

    pub(super) fn home(&mut self, ctrl: bool, shift: bool) {
        let original = self.caret();
        if ctrl {
            self.viewport.scroll_to(0, self.text.no_lines());
            self.place(DocumentPos::new(0, 0));
        } else {
            self.cursor.x_line = 0;
        }
        self.update_selection(shift, original);
    }

    pub(super) fn end(&mut self, ctrl: bool, shift: bool) {
        let original = self.caret();
        if ctrl {
            // Fill the viewport with the tail of the document, caret on its last line.
            let total = self.text.no_lines();
            self.viewport
                .scroll_to(total.saturating_sub(self.viewport.no_lines), total);
            let last = self.text.last_position();
            self.place(last);
        } else {
            self.cursor.x_line = self.text.line_len(original.y_line);
        }
        self.update_selection(shift, original);
    }

    pub(super) fn page_up(&mut self, shift: bool) {
        let original = self.caret();
        let before = self.viewport.line_start;
        self.viewport.scroll_up(self.viewport.no_lines);
        if self.viewport.line_start == before {
            self.cursor.set_position(0, 0);
        }
        self.clamp_column();
        self.update_selection(shift, original);
    }

    pub(super) fn page_down(&mut self, shift: bool) {
        let original = self.caret();
        let total = self.text.no_lines();
        let before = self.viewport.line_start;
        self.viewport.scroll_down(self.viewport.no_lines, total);
        if self.viewport.line_start == before {
            self.cursor.y_line = self.viewport.no_lines - 1;
        }
        // Rows below the document end are not caret positions.
        let last = total - 1;
        if self.viewport.line_start + self.cursor.y_line > last {
            self.cursor.y_line = last - self.viewport.line_start;
        }
        self.clamp_column();
        self.update_selection(shift, original);
    }

    /// One char or one word in either direction, without touching the selection.
    pub(super) fn advance(&mut self, ctrl: bool, forward: bool) {
        match (ctrl, forward) {
            (false, false) => {
                self.step_left();
            }
            (false, true) => {
                self.step_right();
            }
            (true, false) => self.word_left(),
            (true, true) => self.word_right(),
        }
    }

    /// Move one char left, onto the end of the previous line from column 0.
    fn step_left(&mut self) -> bool {
        let caret = self.caret();
        if caret.x_line > 0 {
            self.cursor.x_line -= 1;
        } else if caret.y_line > 0 {
            let y = caret.y_line - 1;
            self.place(DocumentPos::new(self.text.line_len(y), y));
        } else {
            return false;
        }
        true
    }

    /// Move one char right, onto the start of the next line from the line end.
    ///
    /// Reverts when the new position has no buffer index.
    fn step_right(&mut self) -> bool {
        let saved = self.save();
        let caret = self.caret();
        if caret.x_line < self.text.line_len(caret.y_line) {
            self.cursor.x_line += 1;
        } else {
            self.place(DocumentPos::new(0, caret.y_line + 1));
        }
        if self.index().is_none() {
            trace!(?caret, "end of document, reverting");
            self.restore(saved);
            return false;
        }
        true
    }

    /// Jump to the start of the word left of the caret, crossing line breaks as needed.
    fn word_left(&mut self) {
        loop {
            match self.text.get_cursor_word_offsets(&self.viewport, &self.cursor).left {
                Some(n) => {
                    self.cursor.x_line -= n;
                    return;
                }
                None => {
                    if !self.step_left() {
                        return;
                    }
                }
            }
        }
    }

    /// Jump to the end of the word right of the caret, crossing line breaks as needed.
    fn word_right(&mut self) {
        loop {
            match self.text.get_cursor_word_offsets(&self.viewport, &self.cursor).right {
                Some(n) => {
                    self.cursor.x_line += n;
                    return;
                }
                None => {
                    if !self.step_right() {
                        return;
                    }
                }
            }
        }
    }
}
