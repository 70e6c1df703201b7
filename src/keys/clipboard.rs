//! Clipboard gestures: copy, cut, paste and select-all.
//!
//! The interpreter never touches a clipboard itself; it emits [`Effect::Copy`] and
//! [`Effect::Paste`] for the host.

use super::{Effect, Transition};
use crate::types::{DocumentPos, EditMode};

impl Transition<'_> {
    /// Copy the selection. Nothing happens without one.
    pub(super) fn copy(&mut self) {
        if let Some((start, end)) = self.cursor.get_selected_area() {
            let selected = self.text.text_between(start, end);
            self.effects.push(Effect::Copy(selected));
        }
    }

    /// Cut the selection: RAW deletes it outright, SEMI goes through the Delete handler so the
    /// tag guard applies.
    pub(super) fn cut(&mut self) {
        if !self.cursor.is_selected() {
            return;
        }
        match self.text.mode {
            EditMode::Highlight => {}
            EditMode::Raw => {
                self.copy();
                self.delete_selection();
            }
            EditMode::Semi => {
                self.copy();
                self.delete(false, true);
            }
        }
    }

    /// Ask the host for the clipboard content.
    pub(super) fn request_paste(&mut self) {
        if self.text.mode.allows_edits() {
            self.effects.push(Effect::Paste);
        }
    }

    /// Insert clipboard content at the caret, replacing the selection.
    pub(super) fn paste(&mut self, content: &str) {
        if !self.text.mode.allows_edits() || content.is_empty() {
            return;
        }
        self.replace_selection(content, |text, viewport, cursor| {
            let index = text.cursor_to_index(viewport, cursor)?;
            Some(text.insert_at(index, content))
        });
    }

    /// Select from the document start to the end of the last line. The caret stays put.
    pub(super) fn select_all(&mut self) {
        self.cursor
            .select(DocumentPos::new(0, 0), self.text.last_position());
        self.cursor.set_true_selection_direction();
    }
}
