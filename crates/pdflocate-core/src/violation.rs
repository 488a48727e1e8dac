//! Violation descriptors as produced by an external compliance validator.

use crate::context::hints_from_context;
use crate::object::ObjectRef;

/// One rule violation reported against a document.
///
/// `page`, `object_id` and `context` are independently optional. The object
/// id is kept as the validator printed it; [`object_ref`](Self::object_ref)
/// parses it on demand.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ViolationDescriptor {
    pub rule_id: String,
    pub specification: String,
    pub clause: String,
    pub description: String,
    pub failed_checks: u32,
    pub passed_checks: u32,
    /// Validator object id, e.g. `"7 0 obj"`.
    pub object_id: Option<String>,
    /// 0-based page hint.
    pub page: Option<i64>,
    /// Free-text location context (an object path in most validators).
    pub context: Option<String>,
}

impl ViolationDescriptor {
    pub fn new(rule_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The parsed object id; malformed ids are treated as absent.
    pub fn object_ref(&self) -> Option<ObjectRef> {
        self.object_id.as_deref().and_then(ObjectRef::parse)
    }

    /// Fill a missing page or object id from the context text.
    ///
    /// Fields the descriptor already carries are left alone.
    pub fn with_context_hints(mut self) -> Self {
        let Some(context) = self.context.as_deref() else {
            return self;
        };
        let hints = hints_from_context(context);
        if self.page.is_none() {
            self.page = hints.page.map(|p| p as i64);
        }
        if self.object_ref().is_none() {
            if let Some(obj) = hints.object_ref {
                self.object_id = Some(obj.to_string());
            }
        }
        self
    }

    /// `"[rule] description"` with the description cut to `max` characters.
    pub fn short_label(&self, max: usize) -> String {
        format!("[{}] {}", self.rule_id, truncate(&self.description, max))
    }
}

/// Cut `text` to at most `max` characters, appending `...` when shortened.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max).collect();
        out.push_str("...");
        out
    }
}
