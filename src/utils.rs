//! Utility functions.

use std::cmp::min; // comparison helpers
use std::path::PathBuf;

/// Convert a byte offset back into a character index.
///
/// `regex` reports byte offsets, while the buffer counts in chars.
pub fn byte_to_char_index(s: &str, byte_idx: usize) -> usize {
    s[..min(byte_idx, s.len())].chars().count()
}

/// Number of decimal digits in `n` (used to size the line-number gutter).
pub fn digits(n: usize) -> usize {
    n.to_string().len()
}

/// Character classes used to find word boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Whitespace,
    Word,
    Punctuation,
}

/// Categorize a character for word-boundary detection.
///
/// `_` and `-` count as punctuation so `foo-bar` is two words.
pub fn char_class(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Whitespace
    } else if ch.is_alphanumeric() && ch != '_' && ch != '-' {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

/// Get the default config file search locations.
///
/// Returns:
/// - `./annotator.toml` relative to the current working directory
/// - `annotator.toml` next to the executable
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("annotator.toml"));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            paths.push(dir.join("annotator.toml"));
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== byte_to_char_index tests ====================

    #[test]
    fn byte_to_char_unicode() {
        let s = "héllo";
        assert_eq!(byte_to_char_index(s, 0), 0);
        assert_eq!(byte_to_char_index(s, 3), 2);
        assert_eq!(byte_to_char_index(s, 100), 5);
    }

    #[test]
    fn char_and_byte_indices_agree_on_mixed_text() {
        let s = "héllo 日本語 😀";
        for (i, (byte_idx, _)) in s.char_indices().enumerate() {
            assert_eq!(byte_to_char_index(s, byte_idx), i, "mismatch at char index {}", i);
        }
        assert_eq!(byte_to_char_index(s, s.len()), s.chars().count());
    }

    // ==================== other utils tests ====================

    #[test]
    fn test_digits() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(99), 2);
        assert_eq!(digits(1000), 4);
    }

    #[test]
    fn char_classes() {
        assert_eq!(char_class(' '), CharClass::Whitespace);
        assert_eq!(char_class('\t'), CharClass::Whitespace);
        assert_eq!(char_class('a'), CharClass::Word);
        assert_eq!(char_class('7'), CharClass::Word);
        assert_eq!(char_class('é'), CharClass::Word);
        assert_eq!(char_class('-'), CharClass::Punctuation);
        assert_eq!(char_class('_'), CharClass::Punctuation);
        assert_eq!(char_class('<'), CharClass::Punctuation);
    }

    #[test]
    fn config_paths_end_with_file_name() {
        for p in default_config_paths() {
            assert!(p.ends_with("annotator.toml"));
        }
    }
}
