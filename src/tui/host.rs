//! The terminal side of [`AnnotatorCallbacks`]: system clipboard, status line and highlight rules.

use annotator::{AnnotatorCallbacks, Config, HighlightSchema};
use std::time::{Duration, Instant};
use tracing::warn;

const STATUS_TTL: Duration = Duration::from_secs(2);

struct StatusMsg {
    text: String,
    until: Instant,
}

pub struct Host {
    config: Config,
    // `arboard` can fail in headless terminals; the clipboard is best effort.
    clipboard: Option<arboard::Clipboard>,
    status: Option<StatusMsg>,
    needs_redraw: bool,
    /// Unsaved changes.
    pub dirty: bool,
    /// Anchors touched by the last reported selection.
    pub selected_anchors: Vec<String>,
}

impl Host {
    pub fn new(config: Config, clipboard: Option<arboard::Clipboard>) -> Self {
        Self {
            config,
            clipboard,
            status: None,
            needs_redraw: true,
            dirty: false,
            selected_anchors: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(StatusMsg {
            text: msg.into(),
            until: Instant::now() + STATUS_TTL,
        });
        self.needs_redraw = true;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    /// Expire the status message.
    pub fn tick(&mut self) {
        if self.status.as_ref().is_some_and(|s| Instant::now() >= s.until) {
            self.status = None;
            self.needs_redraw = true;
        }
    }

    pub fn mark_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Returns whether a repaint is pending and clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }
}

impl AnnotatorCallbacks for Host {
    fn draw(&mut self) {
        self.needs_redraw = true;
    }

    fn on_copy_text(&mut self, text: &str) {
        let copied = match &mut self.clipboard {
            Some(cb) => cb
                .set_text(text.to_string())
                .map_err(|e| warn!(error = %e, "clipboard write failed"))
                .is_ok(),
            None => false,
        };
        if copied {
            let n = text.chars().count();
            self.set_status(format!("Copied {n} chars."));
        } else {
            self.set_status("Clipboard unavailable.");
        }
    }

    fn on_paste_text(&mut self) -> Option<String> {
        let Some(cb) = &mut self.clipboard else {
            self.set_status("Clipboard unavailable.");
            return None;
        };
        match cb.get_text() {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "clipboard read failed");
                self.set_status("Nothing to paste.");
                None
            }
        }
    }

    fn on_text_change(&mut self, _value: &str) {
        self.dirty = true;
    }

    fn on_select_text(&mut self, text: &str, anchors: &[String]) {
        self.selected_anchors = anchors.to_vec();
        if !anchors.is_empty() {
            self.set_status(format!("Anchors: {}", anchors.join(", ")));
        } else if !text.is_empty() {
            self.set_status(format!("Selected {} chars.", text.chars().count()));
        }
    }

    fn on_scroll(&mut self, _line_start: usize) {
        self.needs_redraw = true;
    }

    fn highlight(&self, entity_id: &str) -> Option<HighlightSchema> {
        self.config.highlight_for(entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(toml: &str) -> Host {
        Host::new(Config::from_toml(toml).unwrap(), None)
    }

    #[test]
    fn copy_without_clipboard_reports_it() {
        let mut h = host("");
        h.on_copy_text("abc");
        assert_eq!(h.status(), Some("Clipboard unavailable."));
        assert_eq!(h.on_paste_text(), None);
    }

    #[test]
    fn edits_mark_dirty() {
        let mut h = host("");
        assert!(!h.dirty);
        h.on_text_change("x");
        assert!(h.dirty);
    }

    #[test]
    fn selection_status_names_anchors() {
        let mut h = host("");
        h.on_select_text("abc", &["e1".to_string(), "e2".to_string()]);
        assert_eq!(h.status(), Some("Anchors: e1, e2"));
        assert_eq!(h.selected_anchors, vec!["e1", "e2"]);

        h.on_select_text("abcd", &[]);
        assert_eq!(h.status(), Some("Selected 4 chars."));
        assert!(h.selected_anchors.is_empty());
    }

    #[test]
    fn redraw_flag_is_taken_once() {
        let mut h = host("");
        assert!(h.take_redraw());
        assert!(!h.take_redraw());
        h.draw();
        assert!(h.take_redraw());
        h.mark_redraw();
        assert!(h.take_redraw());
    }

    #[test]
    fn status_expires() {
        let mut h = host("");
        h.status = Some(StatusMsg {
            text: "old".into(),
            until: Instant::now(),
        });
        h.tick();
        assert_eq!(h.status(), None);
    }

    #[test]
    fn highlights_come_from_config() {
        let h = host("[[highlight]]\nentity = \"e1\"\ncolor = \"red\"\n");
        assert_eq!(h.highlight("e1").unwrap().style.color, "red");
        assert!(h.highlight("e2").is_none());
        assert!(h.config().highlights.len() == 1);
    }
}
