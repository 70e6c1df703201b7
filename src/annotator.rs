//! The annotator: owns the engine state and talks to the host through [`AnnotatorCallbacks`].

use crate::anchors;
use crate::cursor::Cursor;
use crate::keys::{self, Effect, KeyInput, Outcome, Snapshot};
use crate::text::Text;
use crate::types::{DocumentPos, EditMode, Geometry, HighlightSchema, HighlightSpan};
use crate::viewport::Viewport;
use std::cmp::{max, min, Reverse};
use std::ops::Range;
use tracing::{debug, info};

/// What the host provides to the engine.
pub trait AnnotatorCallbacks {
    /// Repaint. Called after every handled event.
    fn draw(&mut self);

    /// Put text on the clipboard.
    fn on_copy_text(&mut self, text: &str);

    /// Read the clipboard, if there is anything to paste.
    fn on_paste_text(&mut self) -> Option<String>;

    /// The buffer changed.
    fn on_text_change(&mut self, _value: &str) {}

    /// The selection changed while highlighting. `anchors` are the ids it touches.
    fn on_select_text(&mut self, _text: &str, _anchors: &[String]) {}

    /// The first visible line changed.
    fn on_scroll(&mut self, _line_start: usize) {}

    /// How to paint the anchor of `entity_id`; `None` leaves it plain.
    fn highlight(&self, _entity_id: &str) -> Option<HighlightSchema> {
        None
    }
}

pub struct Annotator<C: AnnotatorCallbacks> {
    text: Text,
    cursor: Cursor,
    viewport: Viewport,
    geometry: Geometry,
    callbacks: C,
    dragging: bool,
}

impl<C: AnnotatorCallbacks> Annotator<C> {
    /// Create an annotator over `value`, showing `no_lines` display lines.
    pub fn new(value: &str, geometry: Geometry, no_lines: usize, callbacks: C) -> Self {
        Self {
            text: Text::new(value, geometry.wrap_column()),
            cursor: Cursor::new(),
            viewport: Viewport::new(no_lines),
            geometry,
            callbacks,
            dragging: false,
        }
    }

    pub fn text(&self) -> &Text {
        &self.text
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    pub fn mode(&self) -> EditMode {
        self.text.mode
    }

    pub fn value(&self) -> String {
        self.text.value()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.cursor, self.viewport)
    }

    fn caret(&self) -> DocumentPos {
        self.cursor.get_absolute_position(&self.viewport)
    }

    // ==================== keyboard ====================

    /// Interpret one key press and carry out its effects.
    pub fn handle_key(&mut self, input: KeyInput) {
        let before = self.snapshot();
        let outcome = keys::apply(&input, before, &mut self.text);
        self.commit(before, outcome);
    }

    fn commit(&mut self, before: Snapshot, outcome: Outcome) {
        self.cursor = outcome.snapshot.cursor;
        self.viewport = outcome.snapshot.viewport;
        for effect in outcome.effects {
            match effect {
                Effect::Copy(selected) => self.callbacks.on_copy_text(&selected),
                Effect::Paste => self.paste_from_host(),
                Effect::TextChanged(value) => self.callbacks.on_text_change(&value),
                Effect::Redraw => {
                    self.report_view_changes(before);
                    self.callbacks.draw();
                }
            }
        }
    }

    fn paste_from_host(&mut self) {
        let Some(content) = self.callbacks.on_paste_text() else {
            return;
        };
        let pasted = keys::paste(&content, self.snapshot(), &mut self.text);
        self.cursor = pasted.snapshot.cursor;
        self.viewport = pasted.snapshot.viewport;
        for effect in pasted.effects {
            if let Effect::TextChanged(value) = effect {
                self.callbacks.on_text_change(&value);
            }
        }
    }

    /// Tell the host about scrolling and, while highlighting, selection changes.
    fn report_view_changes(&mut self, before: Snapshot) {
        if self.viewport.line_start != before.viewport.line_start {
            self.callbacks.on_scroll(self.viewport.line_start);
        }
        if self.text.mode == EditMode::Highlight
            && self.cursor.selection() != before.cursor.selection()
        {
            self.report_selection();
        }
    }

    fn report_selection(&mut self) {
        let selected = self.selected_text();
        let ids = self.selection_anchors();
        self.callbacks.on_select_text(&selected, &ids);
    }

    // ==================== pointer ====================

    /// Absolute position under a pointer, clamped onto the text.
    fn pointer_position(&self, x: f32, y: f32) -> DocumentPos {
        let mut cell = self.geometry.cell_at(x, y);
        cell.y_line = min(cell.y_line, self.viewport.no_lines - 1);
        self.text.clamp_position(self.viewport.to_document(cell))
    }

    fn put_caret(&mut self, pos: DocumentPos) {
        if let Some(p) = self.viewport.to_viewport(pos) {
            self.cursor.set_position(p.x_line, p.y_line);
        }
    }

    /// Press: move the caret there and start a selection (or extend it with Shift).
    pub fn mouse_down(&mut self, x: f32, y: f32, shift: bool) {
        let original = self.caret();
        let pos = self.pointer_position(x, y);
        self.put_caret(pos);
        match (shift, self.cursor.selection()) {
            (true, Some(_)) => self.cursor.extend_selection(pos),
            (true, None) => self.cursor.select(original, pos),
            (false, _) => self.cursor.select(pos, pos),
        }
        self.cursor.set_true_selection_direction();
        self.dragging = true;
        self.callbacks.draw();
    }

    pub fn mouse_drag(&mut self, x: f32, y: f32) {
        if !self.dragging {
            return;
        }
        let pos = self.pointer_position(x, y);
        self.put_caret(pos);
        self.cursor.extend_selection(pos);
        self.cursor.set_true_selection_direction();
        self.callbacks.draw();
    }

    /// Release: a finished selection is reported while highlighting.
    pub fn mouse_up(&mut self) {
        if !self.dragging {
            return;
        }
        self.dragging = false;
        if !self.cursor.is_selected() {
            self.cursor.clear_selection();
            self.cursor.set_true_selection_direction();
        }
        if self.text.mode == EditMode::Highlight {
            self.report_selection();
        }
        self.callbacks.draw();
    }

    // ==================== scrolling ====================

    /// Scroll by `delta` display lines (negative is up). The caret keeps its viewport row.
    pub fn scroll_by(&mut self, delta: isize) {
        let before = self.viewport.line_start;
        let total = self.text.no_lines();
        if delta < 0 {
            self.viewport.scroll_up(delta.unsigned_abs());
        } else {
            self.viewport.scroll_down(delta.unsigned_abs(), total);
        }
        self.after_scroll(before);
    }

    /// Make `line` the first visible display line.
    pub fn scroll_to_line(&mut self, line: usize) {
        let before = self.viewport.line_start;
        self.viewport.scroll_to(line, self.text.no_lines());
        self.after_scroll(before);
    }

    /// Scroll the anchor with id `id` into view. Returns `false` when there is no such anchor.
    pub fn scroll_to_anchor(&mut self, id: &str) -> bool {
        let Some(anchor) = anchors::find(&self.text.value(), id) else {
            debug!(id, "anchor not found");
            return false;
        };
        let pos = self.text.index_to_position(anchor.open.start);
        self.scroll_to_line(pos.y_line);
        true
    }

    fn after_scroll(&mut self, before: usize) {
        // The caret keeps its row on screen; pull it back onto the text.
        let pos = self.text.clamp_position(self.caret());
        self.put_caret(pos);
        if self.viewport.line_start != before {
            self.callbacks.on_scroll(self.viewport.line_start);
        }
        self.callbacks.draw();
    }

    // ==================== configuration ====================

    pub fn set_mode(&mut self, mode: EditMode) {
        if self.text.mode != mode {
            info!(mode = mode.name(), "mode changed");
        }
        self.text.mode = mode;
        self.cursor.reset();
        self.callbacks.draw();
    }

    /// Adopt new measurements: re-wrap and keep the caret and selection on the same text.
    pub fn set_geometry(&mut self, geometry: Geometry, no_lines: usize) {
        let caret = self.text.position_to_index(self.caret());
        let selection = self
            .cursor
            .selection()
            .map(|s| (self.text.clamped_index(s.start), self.text.clamped_index(s.end)));

        self.geometry = geometry;
        self.text.set_wrap_column(geometry.wrap_column());
        self.viewport.set_no_lines(no_lines);
        self.viewport.clamp(self.text.no_lines());

        if let Some((start, end)) = selection {
            let start = self.text.index_to_position(start);
            let end = self.text.index_to_position(end);
            self.cursor.select(start, end);
            self.cursor.set_true_selection_direction();
        }
        let pos = caret.map_or_else(|| self.text.last_position(), |i| self.text.index_to_position(i));
        self.reveal(pos);
        self.callbacks.draw();
    }

    /// Put the caret at `pos`, scrolling the least needed to show it.
    fn reveal(&mut self, pos: DocumentPos) {
        let total = self.text.no_lines();
        if pos.y_line < self.viewport.line_start {
            self.viewport.scroll_to(pos.y_line, total);
        } else if pos.y_line > self.viewport.line_end() {
            self.viewport.scroll_to(pos.y_line + 1 - self.viewport.no_lines, total);
        }
        self.put_caret(pos);
    }

    // ==================== selection & anchors ====================

    fn selection_range(&self) -> Option<Range<usize>> {
        let (start, end) = self.cursor.get_selected_area()?;
        Some(self.text.index_range(start, end))
    }

    /// The selected text, or an empty string.
    pub fn selected_text(&self) -> String {
        self.cursor
            .get_selected_area()
            .map(|(start, end)| self.text.text_between(start, end))
            .unwrap_or_default()
    }

    /// Ids of anchors the selection (or the caret) touches.
    pub fn selection_anchors(&self) -> Vec<String> {
        self.touch_range()
            .map_or_else(Vec::new, |r| anchors::anchors_in(&self.text.value(), r))
    }

    /// Wrap the selection in an anchor for `id`. The selection then covers the anchored text.
    ///
    /// Returns `false` without a selection, for an invalid id, or when the selection cuts
    /// through existing tag markup.
    pub fn add_anchor(&mut self, id: &str) -> bool {
        if !anchors::is_valid_id(id) {
            return false;
        }
        let Some(range) = self.selection_range() else {
            return false;
        };
        if anchors::overlaps_tag(&self.text.value(), range.clone()) {
            debug!(id, ?range, "selection crosses tag markup");
            return false;
        }

        let open = anchors::open_tag(id);
        self.text.insert_at(range.end, &anchors::close_tag(id));
        self.text.insert_at(range.start, &open);
        info!(id, ?range, "anchor added");

        let shift = open.chars().count();
        let start = self.text.index_to_position(range.start + shift);
        let end = self.text.index_to_position(range.end + shift);
        self.cursor.select(start, end);
        self.cursor.set_true_selection_direction();
        self.reveal(end);
        self.edited();
        true
    }

    /// The selection range, or the caret as an empty range.
    fn touch_range(&self) -> Option<Range<usize>> {
        self.selection_range()
            .or_else(|| self.text.position_to_index(self.caret()).map(|i| i..i))
    }

    /// Remove the tags of the anchor `id` touched by the selection (or the caret).
    pub fn remove_anchor_from_selection(&mut self, id: &str) -> bool {
        let Some(range) = self.touch_range() else { return false };
        let hit = anchors::parse(&self.text.value())
            .into_iter()
            .find(|a| a.id == id && a.touches(&range));
        let Some(anchor) = hit else {
            return false;
        };
        let content = anchor.content();
        self.strip_anchors(&[anchor], content);
        true
    }

    /// Remove the tags of every anchor touched by the selection (or the caret).
    ///
    /// Returns the removed ids in document order. The selection keeps covering the same
    /// text; with only a caret, the outermost anchor's content is selected.
    pub fn remove_anchors_in_selection(&mut self) -> Vec<String> {
        let Some(range) = self.touch_range() else { return Vec::new() };
        let hits: Vec<_> = anchors::parse(&self.text.value())
            .into_iter()
            .filter(|a| a.touches(&range))
            .collect();
        let Some(first) = hits.first() else {
            return Vec::new();
        };

        let keep = if range.is_empty() { first.content() } else { range };
        let mut ids: Vec<String> = Vec::new();
        for anchor in &hits {
            if !ids.contains(&anchor.id) {
                ids.push(anchor.id.clone());
            }
        }
        self.strip_anchors(&hits, keep);
        ids
    }

    /// Delete the tags of `hits` and select what was `keep` before the deletion.
    fn strip_anchors(&mut self, hits: &[anchors::Anchor], keep: Range<usize>) {
        let mut tags: Vec<Range<usize>> = hits
            .iter()
            .flat_map(|a| [a.open.clone(), a.close.clone()])
            .collect();
        // Back to front, so earlier offsets stay valid.
        tags.sort_by_key(|t| Reverse(t.start));
        for tag in &tags {
            self.text.delete_offsets(tag.clone());
        }
        for anchor in hits {
            info!(id = %anchor.id, "anchor removed");
        }

        let shifted = |i: usize| {
            let gone: usize = tags.iter().map(|t| min(t.end, i).saturating_sub(t.start)).sum();
            i - gone
        };
        let start = shifted(keep.start);
        let end = max(start, shifted(keep.end));
        self.viewport.clamp(self.text.no_lines());
        let (start, end) = (self.text.index_to_position(start), self.text.index_to_position(end));
        self.cursor.select(start, end);
        self.cursor.set_true_selection_direction();
        self.reveal(end);
        self.edited();
    }

    fn edited(&mut self) {
        let value = self.text.value();
        self.callbacks.on_text_change(&value);
        self.callbacks.draw();
    }

    /// Highlighted pieces of the visible rows, for every anchor the host wants painted.
    pub fn visible_highlights(&self) -> Vec<HighlightSpan> {
        let value = self.text.value();
        let last = min(self.viewport.line_end(), self.text.no_lines() - 1);
        let rows: Vec<(usize, Range<usize>)> = (self.viewport.line_start..=last)
            .filter_map(|row| {
                let start = self.text.position_to_index(DocumentPos::new(0, row))?;
                Some((row, start..start + self.text.line_len(row)))
            })
            .collect();

        let mut spans = Vec::new();
        for anchor in anchors::parse(&value) {
            let Some(schema) = self.callbacks.highlight(&anchor.id) else {
                continue;
            };
            let content = anchor.content();
            for (row, line) in &rows {
                let start = max(content.start, line.start);
                let end = min(content.end, line.end);
                if start < end {
                    spans.push(HighlightSpan {
                        row: row - self.viewport.line_start,
                        start: start - line.start,
                        end: end - line.start,
                        entity_id: anchor.id.clone(),
                        schema: schema.clone(),
                    });
                }
            }
        }
        spans
    }
}
