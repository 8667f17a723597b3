//! Retrieval result types.

use serde::{Deserialize, Serialize};

/// Maximum number of passages requested from the search backend.
pub const TOP_K: usize = 5;

/// Character budget for a single snippet.
///
/// The budget counts characters, not tokens, so it applies identically
/// regardless of content language.
pub const SNIPPET_MAX_CHARS: usize = 1200;

/// A single retrieved passage with its provenance.
///
/// Ordering is significant: the backend's rank order is preserved all the
/// way into the citation list returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    /// Source document name (e.g., "handbook.pdf")
    pub name: String,

    /// Source document path or URL
    pub path: String,

    /// Passage text, truncated to `SNIPPET_MAX_CHARS`
    pub snippet: String,
}

impl RetrievedDoc {
    /// The provenance fields of this passage, as returned to the caller.
    pub fn citation(&self) -> Citation {
        Citation {
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

/// Provenance metadata attached to a retrieved passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub name: String,
    pub path: String,
}

/// Truncate `text` to at most `max_chars` characters.
///
/// Operates on code points: a multi-byte character counts once, the same
/// as ASCII.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
