//! Painting the annotator into the terminal.

use super::host::Host;
use annotator::anchors;
use annotator::utils::digits;
use annotator::types::HighlightSpan;
use annotator::{Annotator, DocumentPos, HighlightMode, HighlightSchema};
use anyhow::Result;
use crossterm::{
    cursor,
    style::{self, Attribute, Color},
    terminal::{self, ClearType},
    QueueableCommand,
};
use std::cmp::max;
use std::io::{Stdout, Write};
use std::ops::Range;
use unicode_width::UnicodeWidthChar;

/// Screen split: line-number gutter, text area, scroll indicator, status bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub width: usize,
    pub height: usize,
    /// Gutter width including the `│ ` separator.
    pub gutter: usize,
}

impl Layout {
    /// Layout for a `width`×`height` terminal showing a document of `hard_lines` lines.
    pub fn measure(width: u16, height: u16, hard_lines: usize) -> Self {
        Self {
            width: width as usize,
            height: height as usize,
            gutter: max(2, digits(hard_lines)) + 2,
        }
    }

    /// Glyph columns in the text area.
    pub fn columns(&self) -> usize {
        self.width.saturating_sub(self.gutter + 1).max(1)
    }

    /// Display lines in the text area.
    pub fn rows(&self) -> usize {
        self.height.saturating_sub(1).max(1)
    }
}

/// How a single char is painted.
#[derive(Clone, Debug, PartialEq)]
enum CellStyle {
    Plain,
    Markup,
    Selected,
    Highlight(HighlightSchema),
}

impl CellStyle {
    fn queue(&self, stdout: &mut Stdout) -> Result<()> {
        match self {
            CellStyle::Plain => {}
            CellStyle::Markup => {
                stdout.queue(style::SetForegroundColor(Color::DarkGrey))?;
            }
            CellStyle::Selected => {
                stdout.queue(style::SetForegroundColor(Color::Black))?;
                stdout.queue(style::SetBackgroundColor(Color::Grey))?;
                stdout.queue(style::SetAttribute(Attribute::Bold))?;
            }
            CellStyle::Highlight(schema) => {
                let color = parse_color(&schema.style.color);
                match schema.mode {
                    HighlightMode::Background => {
                        stdout.queue(style::SetForegroundColor(Color::Black))?;
                        stdout.queue(style::SetBackgroundColor(color))?;
                    }
                    HighlightMode::Underline => {
                        stdout.queue(style::SetForegroundColor(color))?;
                        stdout.queue(style::SetAttribute(Attribute::Underlined))?;
                    }
                    HighlightMode::Focus => {
                        stdout.queue(style::SetForegroundColor(color))?;
                        stdout.queue(style::SetAttribute(Attribute::Bold))?;
                    }
                }
                if schema.style.opacity < 0.5 {
                    stdout.queue(style::SetAttribute(Attribute::Dim))?;
                }
            }
        }
        Ok(())
    }
}

/// Terminal color for a configured name; unknown names fall back to yellow.
fn parse_color(name: &str) -> Color {
    Color::try_from(name).unwrap_or(Color::Yellow)
}

/// `true` if `pos` lies in the half-open selection `[a, b)`.
fn in_selection(sel: Option<(DocumentPos, DocumentPos)>, pos: DocumentPos) -> bool {
    sel.is_some_and(|(a, b)| a <= pos && pos < b)
}

/// Terminal columns taken by the first `chars` chars of `line`.
pub fn display_width(line: &str, chars: usize) -> usize {
    line.chars()
        .take(chars)
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(1))
        .sum()
}

/// Styles of one visible row, char by char.
fn row_styles(
    annotator: &Annotator<Host>,
    row: usize,
    line: &str,
    tags: &[Range<usize>],
    spans: &[HighlightSpan],
) -> Vec<CellStyle> {
    let text = annotator.text();
    let abs = annotator.viewport().line_start + row;
    let sel = annotator.cursor().get_selected_area();
    let row_index = text.position_to_index(DocumentPos::new(0, abs)).unwrap_or(0);

    (0..line.chars().count())
        .map(|col| {
            let index = row_index + col;
            if in_selection(sel, DocumentPos::new(col, abs)) {
                CellStyle::Selected
            } else if tags.iter().any(|t| t.contains(&index)) {
                CellStyle::Markup
            } else if let Some(span) = spans
                .iter()
                .find(|s| s.row == row && s.start <= col && col < s.end)
            {
                CellStyle::Highlight(span.schema.clone())
            } else {
                CellStyle::Plain
            }
        })
        .collect()
}

/// Repaint the whole screen.
pub fn render(
    stdout: &mut Stdout,
    annotator: &Annotator<Host>,
    layout: &Layout,
    name: &str,
) -> Result<()> {
    let text = annotator.text();
    let viewport = annotator.viewport();
    let lnw = layout.gutter - 2;
    let avail = layout.columns();
    let total = text.no_lines();
    let value = text.value();
    let tags: Vec<Range<usize>> = anchors::tags(&value).into_iter().map(|t| t.range).collect();
    let spans = annotator.visible_highlights();

    stdout.queue(cursor::Hide)?;
    stdout.queue(style::ResetColor)?;

    for row in 0..layout.rows() {
        let abs = viewport.line_start + row;
        stdout.queue(cursor::MoveTo(0, row as u16))?;
        stdout.queue(terminal::Clear(ClearType::CurrentLine))?;

        let Some(line) = text.line(abs) else {
            stdout.queue(style::SetForegroundColor(Color::DarkGrey))?;
            stdout.queue(style::Print("~"))?;
            stdout.queue(style::ResetColor)?;
            continue;
        };

        // Hard line number on the first display line of each segment.
        let seg = text.segments.partition_point(|s| s.line_end < abs);
        stdout.queue(style::SetForegroundColor(Color::DarkGrey))?;
        match text.segments.get(seg) {
            Some(s) if s.line_start == abs => {
                stdout.queue(style::Print(format!("{:>width$}", seg + 1, width = lnw)))?;
            }
            _ => {
                stdout.queue(style::Print(" ".repeat(lnw)))?;
            }
        }
        stdout.queue(style::Print("│ "))?;
        stdout.queue(style::ResetColor)?;

        let styles = row_styles(annotator, row, line, &tags, &spans);
        let mut run = String::new();
        let mut run_style = CellStyle::Plain;
        let mut used = 0;
        for (ch, cell) in line.chars().zip(styles) {
            let w = UnicodeWidthChar::width(ch).unwrap_or(1);
            if used + w > avail {
                break;
            }
            if cell != run_style && !run.is_empty() {
                flush(stdout, &mut run, &run_style)?;
            }
            run_style = cell;
            run.push(ch);
            used += w;
        }
        flush(stdout, &mut run, &run_style)?;

        // Scroll indicator.
        let thumb_size = max(1, layout.rows() * layout.rows() / max(1, total));
        let thumb_start = viewport.line_start * layout.rows() / max(1, total);
        stdout.queue(cursor::MoveTo(layout.width.saturating_sub(1) as u16, row as u16))?;
        if (thumb_start..thumb_start + thumb_size).contains(&row) {
            stdout.queue(style::SetForegroundColor(Color::White))?;
            stdout.queue(style::Print("█"))?;
        } else {
            stdout.queue(style::SetForegroundColor(Color::DarkGrey))?;
            stdout.queue(style::Print("│"))?;
        }
        stdout.queue(style::ResetColor)?;
    }

    render_status(stdout, annotator, layout, name)?;

    // Caret.
    let caret = annotator.cursor().position();
    let line = text.line(viewport.line_start + caret.y_line).unwrap_or("");
    let col = layout.gutter + display_width(line, caret.x_line);
    stdout.queue(cursor::MoveTo(col as u16, caret.y_line as u16))?;
    stdout.queue(cursor::SetCursorStyle::SteadyBar)?;
    stdout.queue(cursor::Show)?;
    stdout.flush()?;
    Ok(())
}

fn flush(stdout: &mut Stdout, run: &mut String, run_style: &CellStyle) -> Result<()> {
    if run.is_empty() {
        return Ok(());
    }
    run_style.queue(stdout)?;
    stdout.queue(style::Print(run.as_str()))?;
    stdout.queue(style::SetAttribute(Attribute::Reset))?;
    stdout.queue(style::ResetColor)?;
    run.clear();
    Ok(())
}

fn render_status(
    stdout: &mut Stdout,
    annotator: &Annotator<Host>,
    layout: &Layout,
    name: &str,
) -> Result<()> {
    let host = annotator.callbacks();
    let caret = annotator.cursor().get_absolute_position(annotator.viewport());
    let mode = annotator.mode().name();
    let dirty = if host.dirty { " [+]" } else { "" };
    let mut left = format!(" {name}{dirty} | {mode} | Ln {}, Col {}", caret.y_line + 1, caret.x_line + 1);
    if !host.selected_anchors.is_empty() {
        left.push_str(&format!(" | {}", host.selected_anchors.join(" ")));
    }
    let right = host.status().unwrap_or("F1 highlight  F2 semi  F3 raw  Ctrl+Q quit");
    let pad = layout.width.saturating_sub(left.chars().count() + right.chars().count() + 1);
    let mut line = format!("{left}{}{right} ", " ".repeat(pad));
    line = line.chars().take(layout.width).collect();

    stdout.queue(cursor::MoveTo(0, layout.rows() as u16))?;
    stdout.queue(terminal::Clear(ClearType::CurrentLine))?;
    stdout.queue(style::SetAttribute(Attribute::Reverse))?;
    stdout.queue(style::Print(line))?;
    stdout.queue(style::SetAttribute(Attribute::Reset))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotator::types::HighlightStyle;
    use annotator::{Config, Geometry};

    fn fixture(value: &str, toml: &str) -> Annotator<Host> {
        let host = Host::new(Config::from_toml(toml).unwrap(), None);
        Annotator::new(value, Geometry::cells(20), 3, host)
    }

    // ==================== layout ====================

    #[test]
    fn layout_splits_screen() {
        let l = Layout::measure(80, 24, 5);
        assert_eq!(l.gutter, 4);
        assert_eq!(l.columns(), 75);
        assert_eq!(l.rows(), 23);
        assert_eq!(Layout::measure(80, 24, 1234).gutter, 6);
    }

    #[test]
    fn tiny_terminal_keeps_one_cell() {
        let l = Layout::measure(2, 1, 1);
        assert_eq!(l.columns(), 1);
        assert_eq!(l.rows(), 1);
    }

    #[test]
    fn wide_chars_take_two_columns() {
        assert_eq!(display_width("a中b", 3), 4);
        assert_eq!(display_width("abc", 2), 2);
        assert_eq!(display_width("ab", 9), 2);
    }

    // ==================== cell styles ====================

    #[test]
    fn colors_by_name() {
        assert_eq!(parse_color("red"), Color::Red);
        assert_eq!(parse_color("not a color"), Color::Yellow);
    }

    #[test]
    fn markup_highlight_and_selection() {
        let mut a = fixture("a <e1>bc</e1>", "[[highlight]]\nentity = \"e1\"\ncolor = \"red\"\n");
        let line = a.text().line(0).unwrap().to_string();
        let value = a.value();
        let tags: Vec<_> = anchors::tags(&value).into_iter().map(|t| t.range).collect();
        let styles = row_styles(&a, 0, &line, &tags, &a.visible_highlights());
        let schema = HighlightSchema {
            mode: HighlightMode::Background,
            style: HighlightStyle {
                color: "red".into(),
                opacity: 1.0,
            },
        };
        assert_eq!(styles[0], CellStyle::Plain);
        assert_eq!(styles[2], CellStyle::Markup);
        assert_eq!(styles[6], CellStyle::Highlight(schema));
        assert_eq!(styles[8], CellStyle::Markup);

        a.mouse_down(0.5, 0.5, false);
        a.mouse_drag(2.5, 0.5);
        let styles = row_styles(&a, 0, &line, &tags, &a.visible_highlights());
        assert_eq!(styles[0], CellStyle::Selected);
        assert_eq!(styles[1], CellStyle::Selected);
        assert_eq!(styles[2], CellStyle::Markup);
    }
}
