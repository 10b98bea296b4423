//! Regex-backed fragment lookup shared by every transformation
//!
//! A [`Pattern`] is a named regular expression compiled on first use. Lookups
//! return the first leftmost match as a [`Span`]; a missing fragment is
//! `None`, and callers decide whether that is worth reporting.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// A named, lazily compiled pattern
pub struct Pattern {
    name: &'static str,
    regex: LazyLock<Regex>,
}

impl Pattern {
    /// Declare a pattern. Intended for `static` items; the source must be a
    /// valid regex, which the catalog tests exercise.
    pub const fn new(name: &'static str, regex: fn() -> Regex) -> Self {
        Self {
            name,
            regex: LazyLock::new(regex),
        }
    }

    /// Human-readable name used in failure reasons
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

/// A matched fragment: its byte range in the searched text and the text itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'t> {
    pub range: Range<usize>,
    pub text: &'t str,
}

impl<'t> Span<'t> {
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Splice `replacement` into `haystack` in place of this span
    pub fn replace_in(&self, haystack: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(haystack.len() - self.text.len() + replacement.len());
        out.push_str(&haystack[..self.range.start]);
        out.push_str(replacement);
        out.push_str(&haystack[self.range.end..]);
        out
    }
}

/// Find the first match of `pattern` in `text`
pub fn find<'t>(text: &'t str, pattern: &Pattern) -> Option<Span<'t>> {
    pattern.regex().find(text).map(|m| Span {
        range: m.range(),
        text: m.as_str(),
    })
}

/// Every non-overlapping match of `pattern` in `text`, leftmost first
pub fn find_all<'t>(text: &'t str, pattern: &Pattern) -> impl Iterator<Item = Span<'t>> {
    pattern.regex().find_iter(text).map(|m| Span {
        range: m.range(),
        text: m.as_str(),
    })
}

/// Find the first match of `pattern` inside `outer`, reporting the range
/// relative to the full `text` that `outer` was taken from
pub fn find_in<'t>(text: &'t str, outer: &Span<'_>, pattern: &Pattern) -> Option<Span<'t>> {
    let scope = text.get(outer.range.clone())?;
    pattern.regex().find(scope).map(|m| {
        let range = (outer.start() + m.start())..(outer.start() + m.end());
        Span {
            text: &text[range.clone()],
            range,
        }
    })
}
