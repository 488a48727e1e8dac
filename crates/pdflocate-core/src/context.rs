//! Hints recovered from a violation's free-text context.
//!
//! Validators print an object path such as
//! `root/document[0]/pages[2](12 0 obj PDPage)/contentStream[0]/operators[5]`.
//! These helpers pull the object number, page number and quoted fragments out
//! of that text. They are pure functions and never fail.

use std::sync::LazyLock;

use regex::Regex;

use crate::object::ObjectRef;

static OBJECT_ID_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+0\s+obj").ok());

static PAGE_PATH_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"pages\[(\d+)\]").ok());

static QUOTED_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\((.*?)\)").ok());

/// What the context text says about location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextHints {
    /// First `<n> 0 obj` in the text.
    pub object_ref: Option<ObjectRef>,
    /// First `pages[<n>]` in the text; already 0-based.
    pub page: Option<usize>,
}

/// Extract object and page hints from `context`.
///
/// ```
/// use pdflocate_core::{ObjectRef, hints_from_context};
///
/// let hints = hints_from_context("root/document[0]/pages[2](12 0 obj PDPage)");
/// assert_eq!(hints.object_ref, Some(ObjectRef(12)));
/// assert_eq!(hints.page, Some(2));
/// ```
pub fn hints_from_context(context: &str) -> ContextHints {
    let object_ref = OBJECT_ID_RE
        .as_ref()
        .and_then(|re| re.captures(context))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(ObjectRef);
    let page = PAGE_PATH_RE
        .as_ref()
        .and_then(|re| re.captures(context))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok());
    ContextHints { object_ref, page }
}

/// Every parenthesised fragment of `context`, in order.
pub fn quoted_candidates(context: &str) -> Vec<&str> {
    let Some(re) = QUOTED_RE.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(context)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// The fragment worth searching the page for: the longest parenthesised
/// fragment longer than `min_len` characters. Ties go to the earliest.
pub fn best_search_text(context: &str, min_len: usize) -> Option<&str> {
    let mut best: Option<&str> = None;
    for candidate in quoted_candidates(context) {
        let len = candidate.chars().count();
        if len <= min_len {
            continue;
        }
        if best.is_none_or(|b| len > b.chars().count()) {
            best = Some(candidate);
        }
    }
    best
}
