//! Arrow annotations embedded in node comments.
//!
//! Arrows are not a separate field on the tree: the full set for a node
//! is serialized into that node's comment after an `"Arrows: "` marker,
//! one bracketed literal per arrow, so they survive a PGN save/reload
//! cycle as plain comment text.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

pub const ARROW_MARKER: &str = "Arrows: ";

/// RGBA color. The alpha channel is omitted on platforms that draw
/// without it; equality and hashing follow whatever form a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: Option<u8>,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: None }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a: Some(a) }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.a {
            Some(a) => write!(f, "({}, {}, {}, {})", self.r, self.g, self.b, a),
            None => write!(f, "({}, {}, {})", self.r, self.g, self.b),
        }
    }
}

/// A drawn arrow between two board squares, in board coordinates
/// (0..=7, 0..=7). Value semantics: two arrows with equal endpoints and
/// color are the same arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arrow {
    pub begin: (u8, u8),
    pub end: (u8, u8),
    pub color: Color,
}

impl Arrow {
    pub fn new(begin: (u8, u8), end: (u8, u8), color: Color) -> Self {
        Self { begin, end, color }
    }

    /// Parse a single `Arrow((x1, y1), (x2, y2), (r, g, b[, a]))`
    /// literal. Malformed input yields `None`, never an error.
    pub fn one_from_str(s: &str) -> Option<Self> {
        let caps = ARROW_RE.captures(s)?;
        Some(Self::from_captures(&caps))
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Self {
        let num = |i: usize| caps[i].parse::<u8>().unwrap_or(0);
        let a = caps.get(8).and_then(|m| m.as_str().parse().ok());
        Self {
            begin: (num(1), num(2)),
            end: (num(3), num(4)),
            color: Color {
                r: num(5),
                g: num(6),
                b: num(7),
                a,
            },
        }
    }
}

impl fmt::Display for Arrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Arrow(({}, {}), ({}, {}), {})",
            self.begin.0, self.begin.1, self.end.0, self.end.1, self.color
        )
    }
}

static ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Arrow\(\((\d+),\s*(\d+)\),\s*\((\d+),\s*(\d+)\),\s*\((\d+),\s*(\d+),\s*(\d+)(?:,\s*(\d+))?\)\)",
    )
    .expect("arrow literal regex")
});

/// Decode the arrow set from a comment: everything after the last
/// `"Arrows: "` marker. A missing marker or malformed literals degrade
/// to an empty set.
pub fn set_from_comment(comment: &str) -> HashSet<Arrow> {
    let Some(idx) = comment.rfind(ARROW_MARKER) else {
        return HashSet::new();
    };
    let tail = &comment[idx + ARROW_MARKER.len()..];
    ARROW_RE
        .captures_iter(tail)
        .map(|caps| Arrow::from_captures(&caps))
        .collect()
}

/// Encode a full replacement set into a comment: the text before the
/// marker is kept, everything from the marker on is rewritten. An empty
/// set removes the marker region entirely, leaving only the free text.
/// Enumeration order is not stable across writes; the decoded set is.
pub fn write_to_comment(comment: &str, arrows: &HashSet<Arrow>) -> String {
    let prefix = match comment.find(ARROW_MARKER) {
        Some(idx) => &comment[..idx],
        None => comment,
    };
    if arrows.is_empty() {
        return prefix.trim_end().to_string();
    }
    let mut out = if prefix.trim_end().is_empty() {
        String::new()
    } else {
        format!("{} ", prefix.trim_end())
    };
    out.push_str(ARROW_MARKER);
    let literals: Vec<String> = arrows.iter().map(Arrow::to_string).collect();
    out.push_str(&literals.join(" "));
    out
}

/// Idempotent toggle used by the draw gesture: an arrow already in the
/// set is removed, a new one is added. Returns true when added.
pub fn toggle(set: &mut HashSet<Arrow>, arrow: Arrow) -> bool {
    if set.remove(&arrow) {
        false
    } else {
        set.insert(arrow);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_from_str() {
        assert_eq!(
            Arrow::one_from_str("Arrow((10, 10), (20, 20), (20, 20, 20))"),
            Some(Arrow::new((10, 10), (20, 20), Color::rgb(20, 20, 20)))
        );
        assert_eq!(
            Arrow::one_from_str("Arrow((10, 10), (20, 20), (20, 20, 20, 20))"),
            Some(Arrow::new((10, 10), (20, 20), Color::rgba(20, 20, 20, 20)))
        );
        assert_eq!(Arrow::one_from_str("Arrow(nonsense)"), None);
    }

    #[test]
    fn test_set_from_comment_adjacent_literals() {
        let set = set_from_comment(
            "Arrows: Arrow((10, 10), (20, 20), (20, 20, 20))\
             Arrow((10, 10), (20, 20), (20, 20, 20, 20))",
        );
        let expected: HashSet<Arrow> = [
            Arrow::new((10, 10), (20, 20), Color::rgb(20, 20, 20)),
            Arrow::new((10, 10), (20, 20), Color::rgba(20, 20, 20, 20)),
        ]
        .into_iter()
        .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn test_missing_or_malformed_is_empty() {
        assert!(set_from_comment("just a comment").is_empty());
        assert!(set_from_comment("Arrows: garbage here").is_empty());
        assert!(set_from_comment("").is_empty());
    }

    #[test]
    fn test_last_marker_wins() {
        let comment = "Arrows: Arrow((1, 1), (2, 2), (0, 0, 0)) and then \
                       Arrows: Arrow((3, 3), (4, 4), (9, 9, 9))";
        let set = set_from_comment(comment);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&Arrow::new((3, 3), (4, 4), Color::rgb(9, 9, 9))));
    }

    #[test]
    fn test_round_trip_preserves_leading_comment() {
        let arrows: HashSet<Arrow> = [
            Arrow::new((0, 0), (7, 7), Color::rgba(255, 143, 0, 150)),
            Arrow::new((4, 4), (4, 0), Color::rgba(0, 255, 0, 150)),
        ]
        .into_iter()
        .collect();

        let comment = write_to_comment("A fine plan.", &arrows);
        assert!(comment.starts_with("A fine plan. "));
        assert_eq!(set_from_comment(&comment), arrows);

        // Rewriting replaces the marker region, not the text before it.
        let rewritten = write_to_comment(&comment, &arrows);
        assert_eq!(set_from_comment(&rewritten), arrows);
        assert_eq!(rewritten.matches(ARROW_MARKER).count(), 1);
    }

    #[test]
    fn test_empty_set_clears_marker_region() {
        let comment = "A plan. Arrows: Arrow((1, 1), (2, 2), (0, 0, 0))";
        let cleared = write_to_comment(comment, &HashSet::new());
        assert_eq!(cleared, "A plan.");
        assert!(set_from_comment(&cleared).is_empty());

        assert_eq!(write_to_comment("", &HashSet::new()), "");
        assert_eq!(write_to_comment("just text", &HashSet::new()), "just text");
    }

    #[test]
    fn test_toggle_twice_restores_set() {
        let mut set: HashSet<Arrow> =
            [Arrow::new((1, 1), (2, 2), Color::rgb(0, 0, 0))].into_iter().collect();
        let original = set.clone();
        let a = Arrow::new((5, 5), (6, 6), Color::rgba(1, 2, 3, 4));

        assert!(toggle(&mut set, a));
        assert_eq!(set.len(), 2);
        assert!(!toggle(&mut set, a));
        assert_eq!(set, original);
    }
}
