//! Buffer edits: Backspace/Delete, Enter and character insertion.

use super::Transition;
use crate::cursor::Cursor;
use crate::text::Text;
use crate::viewport::Viewport;
use std::cmp::{max, min};
use tracing::trace;

impl Transition<'_> {
    /// Backspace (`forward == false`) or Delete.
    ///
    /// Removes the selection if there is one, otherwise whatever the matching arrow move
    /// would cross (a word with Ctrl).
    pub(super) fn delete(&mut self, ctrl: bool, forward: bool) {
        if !self.text.mode.allows_edits() {
            return;
        }
        if self.delete_selection() {
            return;
        }

        let saved = self.save();
        let Some(before) = self.index() else { return };
        let origin = self.caret();
        self.advance(ctrl, forward);
        let mut after = self.index();
        // A soft-wrap boundary is two caret stops for one buffer index.
        let crossed = min(origin.y_line, self.caret().y_line);
        if after == Some(before) && self.text.is_soft_wrapped(crossed) {
            self.advance(ctrl, forward);
            after = self.index();
        }
        self.restore(saved);

        let Some(after) = after.filter(|&a| a != before) else { return };
        let range = min(before, after)..max(before, after);
        if !self.text.allows_edit(range.clone()) {
            trace!(?range, mode = self.text.mode.name(), "delete refused");
            return;
        }
        let start = self.text.delete_offsets(range);
        self.settle(start);
    }

    /// Delete the selected area. Returns `false` when nothing is selected.
    pub(super) fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.cursor.get_selected_area() else {
            return false;
        };
        let range = self.text.index_range(start, end);
        if !self.text.allows_edit(range.clone()) {
            trace!(?range, mode = self.text.mode.name(), "delete refused");
            return true;
        }
        let index = self.text.delete_offsets(range);
        self.settle(index);
        true
    }

    pub(super) fn enter(&mut self) {
        if !self.text.mode.allows_edits() {
            return;
        }
        self.replace_selection("\n", |text, viewport, cursor| {
            text.insert_newline(viewport, cursor)
        });
    }

    pub(super) fn insert_char(&mut self, ch: char) {
        if !self.text.mode.allows_edits() || ch.is_control() {
            return;
        }
        let mut buf = [0u8; 4];
        self.replace_selection(ch.encode_utf8(&mut buf), |text, viewport, cursor| {
            text.insert_text(viewport, cursor, ch)
        });
    }

    /// Replace the selection (or the caret point) with `inserted`.
    ///
    /// `insert` performs the insertion at the caret and returns the index just past it.
    pub(super) fn replace_selection<F>(&mut self, inserted: &str, insert: F)
    where
        F: FnOnce(&mut Text, &Viewport, &Cursor) -> Option<usize>,
    {
        let range = match self.cursor.get_selected_area() {
            Some((start, end)) => self.text.index_range(start, end),
            None => match self.index() {
                Some(i) => i..i,
                None => return,
            },
        };
        if !self.text.allows_edit(range.clone()) || !self.text.allows_insert(range.start, inserted) {
            trace!(?range, mode = self.text.mode.name(), "insert refused");
            return;
        }
        if !range.is_empty() {
            let start = self.text.delete_offsets(range);
            self.settle(start);
        }
        if let Some(end) = insert(&mut *self.text, &self.viewport, &self.cursor) {
            self.settle(end);
        }
    }
}
