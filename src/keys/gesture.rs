//! Recognized key gestures and their parsing from host key events.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Every gesture the key interpreter knows. Anything else maps to [`Gesture::Ignored`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Backspace,
    Delete,
    Enter,
    /// A printable character.
    Insert(char),
    Copy,
    Paste,
    Cut,
    SelectAll,
    Ignored,
}

/// Modifier keys held with a gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { ctrl: false, shift: false, meta: false };
    pub const SHIFT: Self = Self { ctrl: false, shift: true, meta: false };
    pub const CTRL: Self = Self { ctrl: true, shift: false, meta: false };
    pub const CTRL_SHIFT: Self = Self { ctrl: true, shift: true, meta: false };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// One key press as the interpreter sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub gesture: Gesture,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(gesture: Gesture, modifiers: Modifiers) -> Self {
        Self { gesture, modifiers }
    }

    /// Parse a DOM-style key name (`"ArrowLeft"`, `"Enter"`, `"a"`, ...).
    ///
    /// Single characters become insertions, or clipboard shortcuts when Ctrl/Cmd is held.
    /// Modifier-only and other named keys (`"Shift"`, `"Tab"`, `"F5"`) are ignored.
    pub fn from_key_name(key: &str, modifiers: Modifiers) -> Self {
        let gesture = match key {
            "ArrowLeft" => Gesture::ArrowLeft,
            "ArrowRight" => Gesture::ArrowRight,
            "ArrowUp" => Gesture::ArrowUp,
            "ArrowDown" => Gesture::ArrowDown,
            "Home" => Gesture::Home,
            "End" => Gesture::End,
            "PageUp" => Gesture::PageUp,
            "PageDown" => Gesture::PageDown,
            "Backspace" => Gesture::Backspace,
            "Delete" => Gesture::Delete,
            "Enter" => Gesture::Enter,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => char_gesture(ch, modifiers),
                    _ => Gesture::Ignored,
                }
            }
        };
        Self { gesture, modifiers }
    }
}

fn char_gesture(ch: char, modifiers: Modifiers) -> Gesture {
    if modifiers.command() {
        return match ch.to_ascii_lowercase() {
            'c' => Gesture::Copy,
            'v' => Gesture::Paste,
            'x' => Gesture::Cut,
            'a' => Gesture::SelectAll,
            _ => Gesture::Ignored,
        };
    }
    if ch.is_control() {
        Gesture::Ignored
    } else {
        Gesture::Insert(ch)
    }
}

impl From<KeyEvent> for KeyInput {
    fn from(key: KeyEvent) -> Self {
        let modifiers = Modifiers {
            ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
            meta: key.modifiers.contains(KeyModifiers::SUPER),
        };
        let gesture = match key.code {
            KeyCode::Left => Gesture::ArrowLeft,
            KeyCode::Right => Gesture::ArrowRight,
            KeyCode::Up => Gesture::ArrowUp,
            KeyCode::Down => Gesture::ArrowDown,
            KeyCode::Home => Gesture::Home,
            KeyCode::End => Gesture::End,
            KeyCode::PageUp => Gesture::PageUp,
            KeyCode::PageDown => Gesture::PageDown,
            KeyCode::Backspace => Gesture::Backspace,
            KeyCode::Delete => Gesture::Delete,
            KeyCode::Enter => Gesture::Enter,
            KeyCode::Char(ch) => char_gesture(ch, modifiers),
            _ => Gesture::Ignored,
        };
        Self { gesture, modifiers }
    }
}
