//! The key interpreter.
//!
//! [`apply`] takes one gesture and a [`Snapshot`] of the caret and viewport, mutates the text
//! when the gesture edits, and returns the new snapshot together with an ordered list of
//! [`Effect`]s for the host to carry out. Handlers live in submodules as `impl Transition`
//! blocks, grouped by concern.

mod clipboard;
mod editing;
mod gesture;
mod movement;

pub use gesture::{Gesture, KeyInput, Modifiers};

use crate::cursor::Cursor;
use crate::text::Text;
use crate::types::DocumentPos;
use crate::viewport::Viewport;
use tracing::debug;

/// The caret and the visible window, before or after a gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub cursor: Cursor,
    pub viewport: Viewport,
}

impl Snapshot {
    pub fn new(cursor: Cursor, viewport: Viewport) -> Self {
        Self { cursor, viewport }
    }
}

/// Something the host must do after a gesture, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Put this text on the clipboard.
    Copy(String),
    /// Read the clipboard and hand the content to [`paste`].
    Paste,
    /// The buffer changed; carries the new value.
    TextChanged(String),
    /// Repaint. Always the last effect.
    Redraw,
}

/// Result of one gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub snapshot: Snapshot,
    pub effects: Vec<Effect>,
}

/// Interpret one key press.
pub fn apply(input: &KeyInput, snapshot: Snapshot, text: &mut Text) -> Outcome {
    let revision = text.revision();
    let Modifiers { ctrl, shift, .. } = input.modifiers;
    debug!(gesture = ?input.gesture, ctrl, shift, "key");

    let mut t = Transition::new(snapshot, text);
    match input.gesture {
        Gesture::ArrowLeft => t.arrow_left(ctrl, shift),
        Gesture::ArrowRight => t.arrow_right(ctrl, shift),
        Gesture::ArrowUp => t.arrow_up(shift),
        Gesture::ArrowDown => t.arrow_down(shift),
        Gesture::Home => t.home(ctrl, shift),
        Gesture::End => t.end(ctrl, shift),
        Gesture::PageUp => t.page_up(shift),
        Gesture::PageDown => t.page_down(shift),
        Gesture::Backspace => t.delete(ctrl, false),
        Gesture::Delete => t.delete(ctrl, true),
        Gesture::Enter => t.enter(),
        Gesture::Insert(ch) => t.insert_char(ch),
        Gesture::Copy => t.copy(),
        Gesture::Paste => t.request_paste(),
        Gesture::Cut => t.cut(),
        Gesture::SelectAll => t.select_all(),
        Gesture::Ignored => {}
    }
    t.finish(revision)
}

/// Insert clipboard content returned by the host for an [`Effect::Paste`] request.
pub fn paste(content: &str, snapshot: Snapshot, text: &mut Text) -> Outcome {
    let revision = text.revision();
    let mut t = Transition::new(snapshot, text);
    t.paste(content);
    t.finish(revision)
}

/// Working state of one gesture. Handlers mutate the copies; the text is mutated in place.
pub(crate) struct Transition<'a> {
    cursor: Cursor,
    viewport: Viewport,
    text: &'a mut Text,
    effects: Vec<Effect>,
}

impl<'a> Transition<'a> {
    fn new(snapshot: Snapshot, text: &'a mut Text) -> Self {
        Self {
            cursor: snapshot.cursor,
            viewport: snapshot.viewport,
            text,
            effects: Vec::new(),
        }
    }

    fn finish(mut self, revision: u64) -> Outcome {
        if self.text.revision() != revision && self.text.mode.allows_edits() {
            self.effects.push(Effect::TextChanged(self.text.value()));
        }
        self.effects.push(Effect::Redraw);
        Outcome {
            snapshot: Snapshot::new(self.cursor, self.viewport),
            effects: self.effects,
        }
    }

    /// Absolute caret position.
    fn caret(&self) -> DocumentPos {
        self.cursor.get_absolute_position(&self.viewport)
    }

    /// Buffer index under the caret.
    fn index(&self) -> Option<usize> {
        self.text.cursor_to_index(&self.viewport, &self.cursor)
    }

    fn save(&self) -> (Cursor, Viewport) {
        (self.cursor, self.viewport)
    }

    fn restore(&mut self, (cursor, viewport): (Cursor, Viewport)) {
        self.cursor = cursor;
        self.viewport = viewport;
    }

    /// Put the caret at an absolute position, scrolling just enough to keep it visible.
    fn place(&mut self, pos: DocumentPos) {
        let total = self.text.no_lines();
        if pos.y_line < self.viewport.line_start {
            self.viewport.scroll_to(pos.y_line, total);
        } else if pos.y_line > self.viewport.line_end() {
            self.viewport.scroll_to(pos.y_line + 1 - self.viewport.no_lines, total);
        }
        self.cursor
            .set_position(pos.x_line, pos.y_line.saturating_sub(self.viewport.line_start));
    }

    /// Keep the caret column on its line.
    fn clamp_column(&mut self) {
        let len = self.text.line_len(self.caret().y_line);
        self.cursor.x_line = self.cursor.x_line.min(len);
    }

    /// Shift-gated selection bookkeeping shared by every navigation gesture.
    ///
    /// `original` is the caret before the gesture moved it.
    fn update_selection(&mut self, shift: bool, original: DocumentPos) {
        let end = self.caret();
        if !shift {
            self.cursor.clear_selection();
        } else if self.cursor.select_direction().is_some() {
            self.cursor.extend_selection(end);
        } else {
            self.cursor.select(original, end);
        }
        self.cursor.set_true_selection_direction();
    }

    /// Land on buffer index `index` after an edit; the selection is gone.
    fn settle(&mut self, index: usize) {
        self.viewport.clamp(self.text.no_lines());
        let pos = self.text.index_to_position(index);
        self.place(pos);
        self.cursor.reset();
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::types::Direction;

    // ==================== scenarios ====================

    #[test]
    fn arrow_right_wraps_to_next_line() {
        let mut text = Text::new("ab\ncd", 80);
        let s = run(&mut text, snap(0, 0, 10), &[key(Gesture::ArrowRight); 2]);
        assert_eq!(caret(&s), pos(2, 0));
        let s = run(&mut text, s, &[key(Gesture::ArrowRight)]);
        assert_eq!(caret(&s), pos(0, 1));
    }

    #[test]
    fn shift_ctrl_right_selects_word_by_word() {
        let mut text = Text::new("hello world", 80);
        let k = with(Gesture::ArrowRight, Modifiers::CTRL_SHIFT);
        let s = run(&mut text, snap(0, 0, 10), &[k]);
        assert_eq!(s.cursor.get_selected_area(), Some((pos(0, 0), pos(5, 0))));
        let s = run(&mut text, s, &[k]);
        assert_eq!(s.cursor.get_selected_area(), Some((pos(0, 0), pos(11, 0))));
        assert_eq!(s.cursor.select_direction(), Some(Direction::Forward));
    }

    #[test]
    fn backspace_deletes_backward_selection() {
        let mut text = raw("hello world");
        let s = run(
            &mut text,
            snap(11, 0, 10),
            &[with(Gesture::ArrowLeft, Modifiers::CTRL_SHIFT)],
        );
        assert_eq!(s.cursor.selection().map(|sel| (sel.start, sel.end)), Some((pos(11, 0), pos(6, 0))));
        assert_eq!(s.cursor.select_direction(), Some(Direction::Backward));

        let out = apply(&key(Gesture::Backspace), s, &mut text);
        assert_eq!(text.value(), "hello ");
        assert_eq!(caret(&out.snapshot), pos(6, 0));
        assert!(!out.snapshot.cursor.is_selected());
        assert_eq!(
            out.effects,
            vec![Effect::TextChanged("hello ".into()), Effect::Redraw]
        );
    }

    #[test]
    fn arrow_right_at_document_end_reverts() {
        let mut text = Text::new("x", 80);
        let s = run(&mut text, snap(1, 0, 10), &[key(Gesture::ArrowRight)]);
        assert_eq!(s, snap(1, 0, 10));
        assert_eq!(text.cursor_to_index(&s.viewport, &s.cursor), Some(1));
    }

    #[test]
    fn ctrl_end_on_single_line() {
        let mut text = Text::new("hello", 80);
        let mut start = snap(0, 0, 1);
        start.cursor.select(pos(0, 0), pos(2, 0));
        start.cursor.set_true_selection_direction();
        let s = run(&mut text, start, &[with(Gesture::End, Modifiers::CTRL)]);
        assert_eq!(s.cursor.x_line, 5);
        assert_eq!(s.cursor.y_line, s.viewport.no_lines - 1);
        assert_eq!(s.cursor.selection(), None);
    }

    #[test]
    fn ctrl_end_in_tall_viewport() {
        // A short document stays at the top; the caret sits on its last row.
        let mut text = Text::new("hello", 80);
        let s = run(&mut text, snap(0, 0, 5), &[with(Gesture::End, Modifiers::CTRL)]);
        assert_eq!(s.viewport.line_start, 0);
        assert_eq!((s.cursor.x_line, s.cursor.y_line), (5, 0));

        let mut text = Text::new("a\nb\nc\nd\ne\nf\ng", 80);
        let s = run(&mut text, snap(0, 0, 3), &[with(Gesture::End, Modifiers::CTRL)]);
        assert_eq!(s.viewport.line_start, 4);
        assert_eq!(s.cursor.y_line, 2);
        assert_eq!(caret(&s), pos(1, 6));
    }

    #[test]
    fn home_at_line_start_is_idempotent() {
        let mut text = Text::new("ab\ncd\nef", 80);
        let s = run(&mut text, snap(0, 1, 10), &[key(Gesture::Home)]);
        assert_eq!(s, snap(0, 1, 10));
    }

    // ==================== invariants ====================

    #[test]
    fn shift_navigation_keeps_selection_ordered_and_caret_on_line() {
        let mut text = Text::new("first line\nsecond, longer line\n\nlast", 8);
        let sequence = [
            with(Gesture::ArrowRight, Modifiers::SHIFT),
            with(Gesture::ArrowDown, Modifiers::SHIFT),
            with(Gesture::ArrowRight, Modifiers::CTRL_SHIFT),
            with(Gesture::ArrowUp, Modifiers::SHIFT),
            with(Gesture::ArrowUp, Modifiers::SHIFT),
            with(Gesture::ArrowLeft, Modifiers::CTRL_SHIFT),
            with(Gesture::End, Modifiers::SHIFT),
            with(Gesture::PageDown, Modifiers::SHIFT),
            with(Gesture::Home, Modifiers::SHIFT),
            with(Gesture::ArrowLeft, Modifiers::SHIFT),
            with(Gesture::PageUp, Modifiers::SHIFT),
            with(Gesture::End, Modifiers::CTRL_SHIFT),
            with(Gesture::Home, Modifiers::CTRL_SHIFT),
        ];
        let mut s = snap(1, 1, 3);
        for k in sequence {
            s = apply(&k, s, &mut text).snapshot;
            if let Some((a, b)) = s.cursor.get_selected_area() {
                assert!(a <= b, "{:?}", k);
            }
            let line = text.get_current_line(&s.viewport, &s.cursor).unwrap_or("");
            assert!(s.cursor.x_line <= line.chars().count(), "{:?}", k);
            assert!(s.cursor.y_line < s.viewport.no_lines, "{:?}", k);
            assert!(s.viewport.line_start < text.no_lines(), "{:?}", k);
        }
    }

    #[test]
    fn every_gesture_ends_with_redraw() {
        let mut text = raw("abc");
        for g in [Gesture::ArrowLeft, Gesture::Insert('z'), Gesture::Copy, Gesture::Ignored] {
            let out = apply(&key(g), snap(1, 0, 3), &mut text);
            assert_eq!(out.effects.last(), Some(&Effect::Redraw));
        }
    }

    #[test]
    fn navigation_does_not_report_text_change() {
        let mut text = raw("abc");
        let out = apply(&key(Gesture::ArrowRight), snap(0, 0, 3), &mut text);
        assert_eq!(out.effects, vec![Effect::Redraw]);
    }
}
