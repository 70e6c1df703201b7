//! Terminal host: runs an [`Annotator`] full-screen with crossterm.

mod host;
mod render;
mod terminal;

use annotator::{Annotator, Config, EditMode, KeyInput, ViewportPos};
use anyhow::{Context, Result};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use host::Host;
use render::Layout;
use std::fs;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use terminal::TerminalGuard;
use tracing::info;

/// Lines moved per mouse wheel notch.
const WHEEL_STEP: isize = 3;

/// What to open and where to start.
pub struct Options {
    pub path: Option<PathBuf>,
    pub mode: Option<EditMode>,
    pub line: Option<usize>,
    pub anchor: Option<String>,
}

struct App {
    annotator: Annotator<Host>,
    layout: Layout,
    path: Option<PathBuf>,
}

impl App {
    fn new(opts: Options, config: Config, (w, h): (u16, u16)) -> Result<Self> {
        let value = match &opts.path {
            Some(p) if p.exists() => {
                fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display()))?
            }
            _ => String::new(),
        };
        let mode = opts.mode.unwrap_or(config.mode);
        let layout = Layout::measure(w, h, value.split('\n').count());
        let geometry = config.geometry(layout.columns());
        let host = Host::new(config, arboard::Clipboard::new().ok());

        let mut annotator = Annotator::new(&value, geometry, layout.rows(), host);
        annotator.set_mode(mode);
        if let Some(line) = opts.line {
            annotator.scroll_to_line(line.saturating_sub(1));
        }
        if let Some(id) = &opts.anchor {
            if !annotator.scroll_to_anchor(id) {
                annotator.callbacks_mut().set_status(format!("No anchor '{id}'."));
            }
        }
        Ok(Self {
            annotator,
            layout,
            path: opts.path,
        })
    }

    fn name(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "[scratch]".to_string(), |p| p.display().to_string())
    }

    /// Re-measure the screen and re-wrap when the text area changed size.
    fn relayout(&mut self, (w, h): (u16, u16)) {
        let layout = Layout::measure(w, h, self.annotator.text().segments.len());
        if layout != self.layout {
            self.layout = layout;
            let geometry = self.annotator.callbacks().config().geometry(layout.columns());
            self.annotator.set_geometry(geometry, layout.rows());
            self.annotator.callbacks_mut().mark_redraw();
        }
    }

    /// Returns `true` to quit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => return Ok(true),
            KeyCode::Char('s') if ctrl => self.save()?,
            KeyCode::F(1) => self.switch_mode(EditMode::Highlight),
            KeyCode::F(2) => self.switch_mode(EditMode::Semi),
            KeyCode::F(3) => self.switch_mode(EditMode::Raw),
            KeyCode::F(5) => self.annotate(),
            KeyCode::F(6) => self.unannotate(),
            _ => self.annotator.handle_key(KeyInput::from(key)),
        }
        Ok(false)
    }

    fn switch_mode(&mut self, mode: EditMode) {
        self.annotator.set_mode(mode);
        self.annotator
            .callbacks_mut()
            .set_status(format!("{} mode", mode.name()));
    }

    /// Wrap the selection in a fresh anchor `eN`.
    fn annotate(&mut self) {
        let value = self.annotator.value();
        let next = (1..)
            .map(|n| format!("e{n}"))
            .find(|id| annotator::anchors::find(&value, id).is_none())
            .unwrap_or_default();
        let msg = if self.annotator.add_anchor(&next) {
            format!("Added anchor {next}.")
        } else {
            "Select plain text to annotate.".to_string()
        };
        self.annotator.callbacks_mut().set_status(msg);
    }

    /// Remove the anchors the selection touches.
    fn unannotate(&mut self) {
        let removed = self.annotator.remove_anchors_in_selection();
        let msg = if removed.is_empty() {
            "No anchor under the selection.".to_string()
        } else {
            format!("Removed {}.", removed.join(", "))
        };
        self.annotator.callbacks_mut().set_status(msg);
    }

    fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            self.annotator
                .callbacks_mut()
                .set_status("No file name; start with `annotator FILE`.");
            return Ok(());
        };
        fs::write(&path, self.annotator.value())
            .with_context(|| format!("Failed writing {}", path.display()))?;
        info!(path = %path.display(), "saved");
        let host = self.annotator.callbacks_mut();
        host.dirty = false;
        host.set_status(format!("Saved: {}", path.display()));
        Ok(())
    }

    /// Pointer coordinates for a terminal cell, or `None` outside the text area.
    fn pointer(&self, column: u16, row: u16) -> Option<(f32, f32)> {
        let column = column as usize;
        let row = row as usize;
        if column < self.layout.gutter || row >= self.layout.rows() {
            return None;
        }
        let cell = ViewportPos {
            x_line: column - self.layout.gutter,
            y_line: row,
        };
        Some(self.annotator.geometry().point_at(cell))
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let shift = mouse.modifiers.contains(KeyModifiers::SHIFT);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some((x, y)) = self.pointer(mouse.column, mouse.row) {
                    self.annotator.mouse_down(x, y, shift);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                // Clamp into the text area so dragging over the gutter still selects.
                let column = mouse.column.max(self.layout.gutter as u16);
                let row = mouse.row.min(self.layout.rows().saturating_sub(1) as u16);
                if let Some((x, y)) = self.pointer(column, row) {
                    self.annotator.mouse_drag(x, y);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.annotator.mouse_up(),
            MouseEventKind::ScrollUp => self.annotator.scroll_by(-WHEEL_STEP),
            MouseEventKind::ScrollDown => self.annotator.scroll_by(WHEEL_STEP),
            _ => {}
        }
    }
}

/// Run until the user quits.
pub fn run(opts: Options, config: Config) -> Result<()> {
    let mut stdout = io::stdout();
    let _term = TerminalGuard::new(&mut stdout)?;
    let mut app = App::new(opts, config, crossterm::terminal::size()?)?;
    info!(file = %app.name(), mode = app.annotator.mode().name(), "started");
    event_loop(&mut app, &mut stdout)
}

fn event_loop(app: &mut App, stdout: &mut Stdout) -> Result<()> {
    loop {
        if app.annotator.callbacks_mut().take_redraw() {
            render::render(stdout, &app.annotator, &app.layout, &app.name())?;
        }

        // Poll so the status message can expire.
        if !event::poll(Duration::from_millis(50))? {
            app.annotator.callbacks_mut().tick();
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.handle_key(key)? {
                    break;
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            Event::Resize(w, h) => app.relayout((w, h)),
            _ => {}
        }
        // Line count can grow the gutter.
        app.relayout(crossterm::terminal::size()?);
    }
    Ok(())
}
