//! Anchor markup: entity references embedded in the text as `<ID>…</ID>` tags.
//!
//! All ranges are **char** offsets into the raw buffer value.

use crate::utils::byte_to_char_index;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

/// One `<ID>` or `</ID>` tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub closing: bool,
    pub range: Range<usize>,
}

/// A matched pair of tags around some content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub id: String,
    /// The `<ID>` tag.
    pub open: Range<usize>,
    /// The `</ID>` tag.
    pub close: Range<usize>,
}

impl Anchor {
    /// The annotated text between the two tags.
    pub fn content(&self) -> Range<usize> {
        self.open.end..self.close.start
    }

    /// `true` if `range` overlaps the content, or lies within it when empty.
    pub fn touches(&self, range: &Range<usize>) -> bool {
        let content = self.content();
        if range.is_empty() {
            content.start <= range.start && range.start <= content.end
        } else {
            range.start < content.end && content.start < range.end
        }
    }
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"<(/?)([A-Za-z0-9][A-Za-z0-9_-]*)>").expect("anchor tag pattern is valid")
    })
}

/// `true` if `id` can be written as an anchor tag.
pub fn is_valid_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

pub fn open_tag(id: &str) -> String {
    format!("<{id}>")
}

pub fn close_tag(id: &str) -> String {
    format!("</{id}>")
}

/// All tags in document order.
pub fn tags(value: &str) -> Vec<Tag> {
    let mut out = Vec::new();
    // Walk matches in order, converting byte offsets to char offsets incrementally.
    let mut last_byte = 0;
    let mut last_char = 0;
    for caps in tag_regex().captures_iter(value) {
        let Some(m) = caps.get(0) else { continue };
        let start = last_char + byte_to_char_index(&value[last_byte..], m.start() - last_byte);
        let end = start + m.as_str().chars().count();
        last_byte = m.end();
        last_char = end;

        let closing = caps.get(1).is_some_and(|c| !c.as_str().is_empty());
        let id = caps.get(2).map(|c| c.as_str().to_string()).unwrap_or_default();
        out.push(Tag { id, closing, range: start..end });
    }
    out
}

/// Pair up tags into anchors. Unbalanced tags are ignored.
///
/// The result is sorted by the position of the opening tag.
pub fn parse(value: &str) -> Vec<Anchor> {
    let mut open: HashMap<String, Vec<Range<usize>>> = HashMap::new();
    let mut anchors = Vec::new();

    for tag in tags(value) {
        if tag.closing {
            if let Some(start) = open.get_mut(&tag.id).and_then(Vec::pop) {
                anchors.push(Anchor { id: tag.id, open: start, close: tag.range });
            }
        } else {
            open.entry(tag.id).or_default().push(tag.range);
        }
    }

    anchors.sort_by_key(|a| a.open.start);
    anchors
}

/// The first anchor with the given id.
pub fn find(value: &str, id: &str) -> Option<Anchor> {
    parse(value).into_iter().find(|a| a.id == id)
}

/// Ids of anchors whose content overlaps `range` (or contains it, for an empty range).
pub fn anchors_in(value: &str, range: Range<usize>) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for anchor in parse(value) {
        if anchor.touches(&range) && !ids.contains(&anchor.id) {
            ids.push(anchor.id);
        }
    }
    ids
}

/// `true` if editing `range` would damage tag markup.
///
/// A non-empty range must not intersect any tag; an insertion point must not fall strictly
/// inside one.
pub fn overlaps_tag(value: &str, range: Range<usize>) -> bool {
    tags(value).iter().any(|tag| {
        if range.is_empty() {
            tag.range.start < range.start && range.start < tag.range.end
        } else {
            range.start < tag.range.end && tag.range.start < range.end
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "The <e1>quick</e1> fox <e2>jumps <e3>over</e3></e2>.";

    #[test]
    fn tags_use_char_offsets() {
        let t = tags("é<a>b</a>");
        assert_eq!(t.len(), 2);
        assert_eq!(t[0], Tag { id: "a".into(), closing: false, range: 1..4 });
        assert_eq!(t[1], Tag { id: "a".into(), closing: true, range: 5..9 });
    }

    #[test]
    fn parse_pairs_nested_tags() {
        let anchors = parse(DOC);
        let ids: Vec<&str> = anchors.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["e1", "e2", "e3"]);

        let chars: Vec<char> = DOC.chars().collect();
        let content = |a: &Anchor| chars[a.content()].iter().collect::<String>();
        assert_eq!(content(&anchors[0]), "quick");
        assert_eq!(content(&anchors[1]), "jumps <e3>over</e3>");
        assert_eq!(content(&anchors[2]), "over");
    }

    #[test]
    fn unbalanced_tags_are_ignored() {
        assert!(parse("<a>open only").is_empty());
        assert!(parse("close only</a>").is_empty());
        assert!(parse("a < b > c").is_empty());
    }

    #[test]
    fn find_by_id() {
        let a = find(DOC, "e3").expect("anchor e3");
        assert_eq!(a.open.end - a.open.start, "<e3>".len());
        assert!(find(DOC, "missing").is_none());
    }

    #[test]
    fn anchors_in_range_and_point() {
        // "quick" spans chars 8..13
        assert_eq!(anchors_in(DOC, 9..10), vec!["e1".to_string()]);
        assert_eq!(anchors_in(DOC, 10..10), vec!["e1".to_string()]);
        assert!(anchors_in(DOC, 0..3).is_empty());
        let inner = find(DOC, "e3").expect("e3").content();
        assert_eq!(anchors_in(DOC, inner), vec!["e2".to_string(), "e3".to_string()]);
    }

    #[test]
    fn overlaps_tag_detects_markup() {
        // "<e1>" occupies 4..8
        assert!(overlaps_tag(DOC, 5..5));
        assert!(!overlaps_tag(DOC, 4..4));
        assert!(!overlaps_tag(DOC, 8..8));
        assert!(overlaps_tag(DOC, 2..5));
        assert!(!overlaps_tag(DOC, 8..13));
    }

    #[test]
    fn id_validation() {
        assert!(is_valid_id("e1"));
        assert!(is_valid_id("0b7c2a9e-5d1f-4c3a-9e2b-1f0a6d4c8b7e"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("-lead"));
        assert!(!is_valid_id("has space"));
        assert!(!is_valid_id("a>b"));
    }
}
