use std::fmt;
use std::sync::{Arc, OnceLock};

use onig::{Region, SearchOptions};

use crate::error::{Error, SpettroResult};

/// A regex wrapper that keeps the pattern source but compiles lazily at runtime
pub struct Regex {
    pattern: String,
    compiled: OnceLock<Option<Arc<onig::Regex>>>,
}

impl Clone for Regex {
    fn clone(&self) -> Self {
        // Create a new regex with the same pattern but fresh lazy compilation
        Regex::new(self.pattern.clone())
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl Regex {
    pub fn new(pattern: String) -> Self {
        Self {
            pattern,
            compiled: OnceLock::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn compiled(&self) -> Option<&Arc<onig::Regex>> {
        self.compiled
            .get_or_init(|| onig::Regex::new(&self.pattern).ok().map(Arc::new))
            .as_ref()
    }

    /// Validate that this regex pattern compiles successfully
    pub fn validate(&self) -> SpettroResult<()> {
        onig::Regex::new(&self.pattern)
            .map(|_| ())
            .map_err(|e| Error::InvalidPattern {
                pattern: self.pattern.clone(),
                reason: e.to_string(),
            })
    }
}

/// A normalized match: the absolute start of the match within the searched
/// text and the value of every capture group. Group 0 is the full match and
/// groups that did not participate are empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub index: usize,
    pub groups: Vec<String>,
}

impl MatchResult {
    /// The full matched text after any lookbehind adjustment.
    pub fn matched(&self) -> &str {
        &self.groups[0]
    }
}

/// Attempts `regex` against `text` at or after `pos`.
///
/// When `lookbehind` is set and the first capture group matched, the group is
/// a fixed-width context prefix of the match: the reported start moves past it
/// and group 0 is shortened accordingly. The other group values are untouched.
pub(crate) fn match_pattern(
    regex: &onig::Regex,
    pos: usize,
    text: &str,
    lookbehind: bool,
) -> Option<MatchResult> {
    let mut region = Region::new();
    regex.search_with_options(
        text,
        pos,
        text.len(),
        SearchOptions::SEARCH_OPTION_NONE,
        Some(&mut region),
    )?;
    let (start, _) = region.pos(0)?;

    let groups: Vec<String> = (0..region.len())
        .map(|i| match region.pos(i) {
            Some((s, e)) => text[s..e].to_string(),
            None => String::new(),
        })
        .collect();

    let mut found = MatchResult {
        index: start,
        groups,
    };

    if lookbehind && found.groups.len() > 1 && !found.groups[1].is_empty() {
        // By convention the lookbehind group is a prefix of the full match
        let lookbehind_len = found.groups[1].len();
        if found.groups[0].is_char_boundary(lookbehind_len) {
            found.index += lookbehind_len;
            found.groups[0] = slice(&found.groups[0], lookbehind_len, None).to_string();
        }
    }

    Some(found)
}

/// Extracts `text[start..end]` with out-of-range indices clamped: an empty
/// string when `start` is at or past the end, and `end` capped at the length.
pub(crate) fn slice(text: &str, start: usize, end: Option<usize>) -> &str {
    if start >= text.len() {
        return "";
    }
    let end = end.map_or(text.len(), |e| e.min(text.len()));
    &text[start..end]
}
