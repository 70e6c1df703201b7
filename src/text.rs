//! The text buffer: stores the document and its wrapped display lines.

use crate::anchors;
use crate::cursor::Cursor;
use crate::types::{DocumentPos, EditMode};
use crate::utils::{char_class, CharClass};
use crate::viewport::Viewport;
use ropey::Rope;
use std::cmp::{max, min};
use std::ops::Range;

/// One newline-delimited run of the document and its display lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Char offset of the first char of the run.
    pub offset: usize,
    /// Length of the run in chars (without the newline).
    pub len: usize,
    /// The run split every `wrap_column` chars; an empty run has one empty line.
    pub lines: Vec<String>,
    /// First absolute display line of this segment.
    pub line_start: usize,
    /// Last absolute display line of this segment (inclusive).
    pub line_end: usize,
}

impl Segment {
    /// Char offset of the start of absolute display line `line`, if it belongs here.
    fn line_offset(&self, line: usize) -> Option<usize> {
        if line < self.line_start || line > self.line_end {
            return None;
        }
        let before: usize = self.lines[..line - self.line_start]
            .iter()
            .map(|l| l.chars().count())
            .sum();
        Some(self.offset + before)
    }
}

/// Signed distances (as magnitudes) from the caret to the nearest word boundary on its line.
///
/// `None` means the caret already sits on a boundary on that side: the caller steps one char
/// and asks again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WordOffsets {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

/// The document buffer.
///
/// `value` is the source of truth; `segments` are re-derived from it after every mutation so the
/// display lines always reconstruct the value exactly.
pub struct Text {
    value: Rope,
    pub segments: Vec<Segment>,
    pub mode: EditMode,
    wrap_column: usize,
    revision: u64,
}

impl Text {
    /// Build a buffer from a string, wrapping display lines at `wrap_column` chars.
    pub fn new(value: &str, wrap_column: usize) -> Self {
        let normalized = value.replace("\r\n", "\n");
        let mut text = Self {
            value: Rope::from_str(&normalized),
            segments: Vec::new(),
            mode: EditMode::default(),
            wrap_column: max(1, wrap_column),
            revision: 0,
        };
        text.segment();
        text
    }

    /// The full document.
    pub fn value(&self) -> String {
        self.value.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.value.len_chars()
    }

    pub fn wrap_column(&self) -> usize {
        self.wrap_column
    }

    /// Re-wrap for a new display width.
    pub fn set_wrap_column(&mut self, wrap_column: usize) {
        let wrap_column = max(1, wrap_column);
        if wrap_column != self.wrap_column {
            self.wrap_column = wrap_column;
            self.segment();
        }
    }

    /// Bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of display lines across all segments (never 0).
    pub fn no_lines(&self) -> usize {
        self.segments.last().map_or(1, |s| s.line_end + 1)
    }

    /// Rebuild `segments` from `value`.
    fn segment(&mut self) {
        let width = self.wrap_column;
        let mut segments = Vec::new();
        let mut offset = 0;
        let mut line_start = 0;
        let mut run = String::new();
        let mut push = |run: &str, offset: &mut usize, line_start: &mut usize| {
            let len = run.chars().count();
            let lines = wrap(run, width);
            let count = lines.len();
            segments.push(Segment {
                offset: *offset,
                len,
                lines,
                line_start: *line_start,
                line_end: *line_start + count - 1,
            });
            *offset += len + 1;
            *line_start += count;
        };

        for ch in self.value.chars() {
            if ch == '\n' {
                push(&run, &mut offset, &mut line_start);
                run.clear();
            } else {
                run.push(ch);
            }
        }
        push(&run, &mut offset, &mut line_start);

        self.segments = segments;
    }

    fn mutated(&mut self) {
        self.revision += 1;
        self.segment();
    }

    fn segment_for_line(&self, line: usize) -> Option<&Segment> {
        let i = self.segments.partition_point(|s| s.line_end < line);
        self.segments.get(i)
    }

    /// Display line `line` (absolute).
    pub fn line(&self, line: usize) -> Option<&str> {
        let seg = self.segment_for_line(line)?;
        seg.lines.get(line - seg.line_start).map(String::as_str)
    }

    /// Length in chars of display line `line`, 0 when it does not exist.
    pub fn line_len(&self, line: usize) -> usize {
        self.line(line).map_or(0, |l| l.chars().count())
    }

    /// `true` if `line` is followed by a wrapped continuation of the same segment.
    pub fn is_soft_wrapped(&self, line: usize) -> bool {
        self.segment_for_line(line).is_some_and(|s| line < s.line_end)
    }

    /// The display line under the cursor.
    pub fn get_current_line(&self, viewport: &Viewport, cursor: &Cursor) -> Option<&str> {
        self.line(viewport.line_start + cursor.y_line)
    }

    /// Buffer index of an absolute position, or `None` past the end of its line or the document.
    pub fn position_to_index(&self, pos: DocumentPos) -> Option<usize> {
        let seg = self.segment_for_line(pos.y_line)?;
        if pos.x_line > self.line_len(pos.y_line) {
            return None;
        }
        Some(seg.line_offset(pos.y_line)? + pos.x_line)
    }

    /// Buffer index under the cursor; `None` signals "cannot move further".
    pub fn cursor_to_index(&self, viewport: &Viewport, cursor: &Cursor) -> Option<usize> {
        self.position_to_index(cursor.get_absolute_position(viewport))
    }

    /// Absolute position of a buffer index (clamped to the document).
    ///
    /// An index on a soft-wrap boundary resolves to the start of the following display line.
    pub fn index_to_position(&self, index: usize) -> DocumentPos {
        let index = min(index, self.len_chars());
        let i = self.segments.partition_point(|s| s.offset + s.len < index);
        let Some(seg) = self.segments.get(i) else {
            return self.last_position();
        };

        let mut local = index - seg.offset;
        for (row, line) in seg.lines.iter().enumerate() {
            let len = line.chars().count();
            let last = row + 1 == seg.lines.len();
            if local < len || last {
                return DocumentPos::new(min(local, len), seg.line_start + row);
            }
            local -= len;
        }
        DocumentPos::new(0, seg.line_start)
    }

    /// The end of the last segment's last line.
    pub fn last_position(&self) -> DocumentPos {
        let last = self.no_lines() - 1;
        DocumentPos::new(self.line_len(last), last)
    }

    /// Pull a position back onto an existing row and column.
    pub fn clamp_position(&self, pos: DocumentPos) -> DocumentPos {
        let y_line = min(pos.y_line, self.no_lines() - 1);
        DocumentPos::new(min(pos.x_line, self.line_len(y_line)), y_line)
    }

    /// Buffer index of a position after pulling it onto the text.
    pub fn clamped_index(&self, pos: DocumentPos) -> usize {
        let pos = self.clamp_position(pos);
        self.position_to_index(pos).unwrap_or(0)
    }

    /// Distances to the nearest word boundaries on the cursor's display line.
    pub fn get_cursor_word_offsets(&self, viewport: &Viewport, cursor: &Cursor) -> WordOffsets {
        let Some(line) = self.get_current_line(viewport, cursor) else {
            return WordOffsets::default();
        };
        let chars: Vec<char> = line.chars().collect();
        let x = min(cursor.x_line, chars.len());

        let right = chars.get(x).map(|&c| char_class(c)).and_then(|class| {
            if class == CharClass::Whitespace {
                return None;
            }
            Some(chars[x..].iter().take_while(|&&c| char_class(c) == class).count())
        });

        let left = x
            .checked_sub(1)
            .map(|i| char_class(chars[i]))
            .and_then(|class| {
                if class == CharClass::Whitespace {
                    return None;
                }
                Some(chars[..x].iter().rev().take_while(|&&c| char_class(c) == class).count())
            });

        WordOffsets { left, right }
    }

    /// Whether the current mode permits changing `range` (an empty range is an insertion point).
    pub fn allows_edit(&self, range: Range<usize>) -> bool {
        match self.mode {
            EditMode::Highlight => false,
            EditMode::Raw => true,
            EditMode::Semi => !anchors::overlaps_tag(&self.value(), range),
        }
    }

    /// Whether `s` may be inserted at `index`. SEMI mode also rejects raw tag delimiters.
    pub fn allows_insert(&self, index: usize, s: &str) -> bool {
        if self.mode == EditMode::Semi && s.contains(['<', '>']) {
            return false;
        }
        self.allows_edit(index..index)
    }

    /// Insert `s` at buffer index `index` (clamped). Returns the index just past the insertion.
    pub fn insert_at(&mut self, index: usize, s: &str) -> usize {
        let index = min(index, self.len_chars());
        let normalized = s.replace("\r\n", "\n");
        if normalized.is_empty() {
            return index;
        }
        self.value.insert(index, &normalized);
        self.mutated();
        index + normalized.chars().count()
    }

    /// Insert one char at the cursor. Returns the index after it, or `None` for an invalid cursor.
    pub fn insert_text(&mut self, viewport: &Viewport, cursor: &Cursor, ch: char) -> Option<usize> {
        let index = self.cursor_to_index(viewport, cursor)?;
        let mut buf = [0u8; 4];
        Some(self.insert_at(index, ch.encode_utf8(&mut buf)))
    }

    /// Split the line at the cursor. Returns the index of the new line's start.
    pub fn insert_newline(&mut self, viewport: &Viewport, cursor: &Cursor) -> Option<usize> {
        let index = self.cursor_to_index(viewport, cursor)?;
        Some(self.insert_at(index, "\n"))
    }

    /// Remove the chars in `range` (clamped). Returns the start index.
    pub fn delete_offsets(&mut self, range: Range<usize>) -> usize {
        let len = self.len_chars();
        let start = min(range.start, len);
        let end = min(range.end, len);
        if start < end {
            self.value.remove(start..end);
            self.mutated();
        }
        start
    }

    /// Delete between two absolute positions, in either order. Returns the start index.
    pub fn delete_range_text(&mut self, from: DocumentPos, to: DocumentPos) -> usize {
        let (a, b) = if from <= to { (from, to) } else { (to, from) };
        let range = self.clamped_index(a)..self.clamped_index(b);
        self.delete_offsets(range)
    }

    /// Buffer index range between two absolute positions, in document order.
    pub fn index_range(&self, from: DocumentPos, to: DocumentPos) -> Range<usize> {
        let (a, b) = if from <= to { (from, to) } else { (to, from) };
        self.clamped_index(a)..self.clamped_index(b)
    }

    /// The text between two absolute positions, in document order.
    pub fn text_between(&self, from: DocumentPos, to: DocumentPos) -> String {
        let range = self.index_range(from, to);
        self.value.slice(range).to_string()
    }
}

/// Split a run into display lines of at most `width` chars.
fn wrap(run: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = run.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: usize, y: usize) -> Cursor {
        let mut c = Cursor::new();
        c.set_position(x, y);
        c
    }

    fn pos(x: usize, y: usize) -> DocumentPos {
        DocumentPos::new(x, y)
    }

    /// Concatenating display lines (newlines between segments) must give back the value.
    fn reconstruct(text: &Text) -> String {
        text.segments
            .iter()
            .map(|s| s.lines.concat())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn assert_contiguous(text: &Text) {
        let mut expected = 0;
        for s in &text.segments {
            assert_eq!(s.line_start, expected);
            assert_eq!(s.line_end + 1 - s.line_start, s.lines.len());
            expected = s.line_end + 1;
        }
        assert_eq!(reconstruct(text), text.value());
    }

    // ==================== segmentation ====================

    #[test]
    fn empty_document_has_one_empty_line() {
        let text = Text::new("", 10);
        assert_eq!(text.no_lines(), 1);
        assert_eq!(text.line(0), Some(""));
        assert_eq!(text.last_position(), pos(0, 0));
        assert_contiguous(&text);
    }

    #[test]
    fn segments_follow_newlines() {
        let text = Text::new("ab\n\ncd", 10);
        assert_eq!(text.segments.len(), 3);
        assert_eq!(text.no_lines(), 3);
        assert_eq!(text.line(1), Some(""));
        assert_eq!(text.segments[2].offset, 4);
        assert_contiguous(&text);
    }

    #[test]
    fn long_runs_wrap_at_column() {
        let text = Text::new("abcdefghij\nxy", 4);
        assert_eq!(text.segments[0].lines, vec!["abcd", "efgh", "ij"]);
        assert_eq!(text.segments[1].line_start, 3);
        assert_eq!(text.no_lines(), 4);
        assert!(text.is_soft_wrapped(0));
        assert!(!text.is_soft_wrapped(2));
        assert_contiguous(&text);
    }

    #[test]
    fn crlf_is_normalized() {
        let text = Text::new("a\r\nb", 10);
        assert_eq!(text.value(), "a\nb");
        assert_eq!(text.no_lines(), 2);
    }

    #[test]
    fn rewrap_keeps_value() {
        let mut text = Text::new("hello world, wrapped", 5);
        assert_eq!(text.no_lines(), 4);
        text.set_wrap_column(50);
        assert_eq!(text.no_lines(), 1);
        assert_contiguous(&text);
    }

    // ==================== lookups ====================

    #[test]
    fn current_line_uses_viewport_offset() {
        let text = Text::new("zero\none\ntwo", 10);
        let mut vp = Viewport::new(2);
        vp.line_start = 1;
        assert_eq!(text.get_current_line(&vp, &at(0, 1)), Some("two"));
        assert_eq!(text.get_current_line(&vp, &at(0, 2)), None);
    }

    #[test]
    fn cursor_to_index_counts_newlines_and_wraps() {
        let text = Text::new("abcdef\nxy", 4);
        let vp = Viewport::new(10);
        assert_eq!(text.cursor_to_index(&vp, &at(0, 0)), Some(0));
        assert_eq!(text.cursor_to_index(&vp, &at(1, 1)), Some(5));
        assert_eq!(text.cursor_to_index(&vp, &at(2, 1)), Some(6));
        assert_eq!(text.cursor_to_index(&vp, &at(2, 2)), Some(9));
    }

    #[test]
    fn cursor_to_index_fails_past_end() {
        let text = Text::new("x", 10);
        let vp = Viewport::new(10);
        assert_eq!(text.cursor_to_index(&vp, &at(1, 0)), Some(1));
        assert_eq!(text.cursor_to_index(&vp, &at(2, 0)), None);
        assert_eq!(text.cursor_to_index(&vp, &at(0, 1)), None);
    }

    #[test]
    fn index_to_position_prefers_next_row_on_soft_boundary() {
        let text = Text::new("abcdef\nxy", 4);
        assert_eq!(text.index_to_position(3), pos(3, 0));
        assert_eq!(text.index_to_position(4), pos(0, 1));
        assert_eq!(text.index_to_position(6), pos(2, 1));
        assert_eq!(text.index_to_position(7), pos(0, 2));
        assert_eq!(text.index_to_position(99), pos(2, 2));
    }

    #[test]
    fn index_and_position_agree() {
        let text = Text::new("one two\n\nthree four five\nsix", 5);
        for i in 0..=text.len_chars() {
            let p = text.index_to_position(i);
            assert_eq!(text.position_to_index(p), Some(i), "index {}", i);
        }
    }

    #[test]
    fn clamp_position_pulls_back() {
        let text = Text::new("short\nlonger line", 20);
        assert_eq!(text.clamp_position(pos(0, 100)), pos(0, 1));
        assert_eq!(text.clamp_position(pos(100, 0)), pos(5, 0));
    }

    // ==================== word offsets ====================

    #[test]
    fn word_offsets_inside_word() {
        let text = Text::new("hello world", 80);
        let vp = Viewport::new(5);
        let w = text.get_cursor_word_offsets(&vp, &at(2, 0));
        assert_eq!(w, WordOffsets { left: Some(2), right: Some(3) });
    }

    #[test]
    fn word_offsets_on_boundaries() {
        let text = Text::new("hello world", 80);
        let vp = Viewport::new(5);
        assert_eq!(
            text.get_cursor_word_offsets(&vp, &at(0, 0)),
            WordOffsets { left: None, right: Some(5) }
        );
        assert_eq!(
            text.get_cursor_word_offsets(&vp, &at(5, 0)),
            WordOffsets { left: Some(5), right: None }
        );
        assert_eq!(
            text.get_cursor_word_offsets(&vp, &at(6, 0)),
            WordOffsets { left: None, right: Some(5) }
        );
        assert_eq!(
            text.get_cursor_word_offsets(&vp, &at(11, 0)),
            WordOffsets { left: Some(5), right: None }
        );
    }

    #[test]
    fn word_offsets_split_on_punctuation() {
        let text = Text::new("foo-bar", 80);
        let vp = Viewport::new(5);
        assert_eq!(
            text.get_cursor_word_offsets(&vp, &at(3, 0)),
            WordOffsets { left: Some(3), right: Some(1) }
        );
    }

    #[test]
    fn word_offsets_off_document() {
        let text = Text::new("x", 80);
        let vp = Viewport::new(5);
        assert_eq!(text.get_cursor_word_offsets(&vp, &at(0, 3)), WordOffsets::default());
    }

    // ==================== mutations ====================

    #[test]
    fn insert_text_at_cursor() {
        let mut text = Text::new("ac", 80);
        let vp = Viewport::new(5);
        assert_eq!(text.insert_text(&vp, &at(1, 0), 'b'), Some(2));
        assert_eq!(text.value(), "abc");
        assert_eq!(text.revision(), 1);
    }

    #[test]
    fn insert_text_out_of_range_is_noop() {
        let mut text = Text::new("ac", 80);
        let vp = Viewport::new(5);
        assert_eq!(text.insert_text(&vp, &at(9, 0), 'b'), None);
        assert_eq!(text.value(), "ac");
        assert_eq!(text.revision(), 0);
    }

    #[test]
    fn insert_newline_splits_segment() {
        let mut text = Text::new("hello world", 80);
        let vp = Viewport::new(5);
        assert_eq!(text.insert_newline(&vp, &at(5, 0)), Some(6));
        assert_eq!(text.value(), "hello\n world");
        assert_eq!(text.segments.len(), 2);
        assert_contiguous(&text);
    }

    #[test]
    fn insert_newline_shifts_following_segments() {
        let mut text = Text::new("abcdefgh\nz", 4);
        assert_eq!(text.segments[1].line_start, 2);
        let vp = Viewport::new(5);
        text.insert_newline(&vp, &at(1, 0));
        assert_eq!(text.value(), "a\nbcdefgh\nz");
        assert_eq!(text.segments[2].line_start, 3);
        assert_contiguous(&text);
    }

    #[test]
    fn delete_range_is_order_independent() {
        let mut a = Text::new("hello world", 80);
        let mut b = Text::new("hello world", 80);
        a.delete_range_text(pos(6, 0), pos(11, 0));
        b.delete_range_text(pos(11, 0), pos(6, 0));
        assert_eq!(a.value(), "hello ");
        assert_eq!(b.value(), "hello ");
    }

    #[test]
    fn delete_range_across_lines_merges() {
        let mut text = Text::new("start\nmiddle\nend", 80);
        let start = text.delete_range_text(pos(3, 0), pos(1, 2));
        assert_eq!(start, 3);
        assert_eq!(text.value(), "stand");
        assert_eq!(text.no_lines(), 1);
        assert_contiguous(&text);
    }

    #[test]
    fn delete_range_clamps_malformed_input() {
        let mut text = Text::new("abc", 80);
        text.delete_range_text(pos(1, 0), pos(50, 7));
        assert_eq!(text.value(), "a");
        let rev = text.revision();
        text.delete_range_text(pos(1, 0), pos(1, 0));
        assert_eq!(text.revision(), rev);
    }

    #[test]
    fn insert_then_delete_restores_value() {
        let original = "line one\nline two wraps around\n\nend";
        for index in [0, 4, 8, 9, 20, 31, 32, original.chars().count()] {
            let mut text = Text::new(original, 7);
            text.insert_at(index, "#");
            assert_ne!(text.value(), original);
            text.delete_offsets(index..index + 1);
            assert_eq!(text.value(), original, "index {}", index);
            assert_contiguous(&text);
        }
    }

    #[test]
    fn text_between_spans_lines() {
        let text = Text::new("line1\nline2\nline3", 80);
        assert_eq!(text.text_between(pos(3, 0), pos(3, 2)), "e1\nline2\nlin");
        assert_eq!(text.text_between(pos(3, 2), pos(3, 0)), "e1\nline2\nlin");
    }

    #[test]
    fn unicode_columns_are_chars() {
        let mut text = Text::new("日本語", 80);
        let vp = Viewport::new(5);
        text.insert_text(&vp, &at(1, 0), '中');
        assert_eq!(text.value(), "日中本語");
        assert_eq!(text.line_len(0), 4);
    }

    // ==================== mode gate ====================

    #[test]
    fn allows_edit_by_mode() {
        let mut text = Text::new("a <e1>b</e1> c", 80);
        assert!(!text.allows_edit(0..1));
        text.mode = EditMode::Raw;
        assert!(text.allows_edit(2..4));
        text.mode = EditMode::Semi;
        assert!(text.allows_edit(0..1));
        assert!(text.allows_edit(6..7));
        assert!(!text.allows_edit(2..4));
        assert!(!text.allows_edit(3..3));
        assert!(text.allows_insert(0, "x"));
        assert!(!text.allows_insert(0, "<"));
        text.mode = EditMode::Raw;
        assert!(text.allows_insert(0, "<e9>"));
    }
}
