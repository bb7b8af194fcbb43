//! Insight span model.
//!
//! An [`Insight`] is a review annotation anchored to a half-open character range of the
//! document. Besides its offsets it carries an anchor fingerprint (`prefix`, `quote`, `suffix`)
//! used to relocate the range after edits, and an opaque [`Annotation`] payload the engine
//! never interprets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(1);

/// Synthesize a locally unique identifier with the given prefix (`"insight"`, `"doc"`).
pub fn synthesize_id(prefix: &str) -> String {
    let counter = NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{counter}", Utc::now().timestamp_millis())
}

/// Opaque annotation payload attached to an insight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Critique text.
    #[serde(default)]
    pub explanation: String,
    /// Suggested rewrite.
    #[serde(default)]
    pub suggestion: String,
    /// Preferred rewrite, when the analyzer produced ranked suggestions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_primary: Option<String>,
    /// Second-ranked rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_secondary: Option<String>,
    /// Further alternative rewrites.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    /// Severity label as produced upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Which analyzer produced the insight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A review insight anchored to a span of document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Unique identifier.
    pub id: String,
    /// Rubric criterion key (opaque to the engine).
    pub criterion_id: String,
    /// The exact text this insight was about when it was last anchored.
    pub quote: String,
    /// Inclusive start, in chars.
    pub range_start: usize,
    /// Exclusive end, in chars.
    pub range_end: usize,
    /// Up to `context_chars` characters before `range_start`.
    #[serde(default)]
    pub prefix: String,
    /// Up to `context_chars` characters after `range_end`.
    #[serde(default)]
    pub suffix: String,
    /// Whether the offsets can no longer be trusted.
    #[serde(default)]
    pub is_stale: bool,
    /// Creation time (defaulted when the insight enters the engine).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Opaque payload.
    #[serde(flatten)]
    pub annotation: Annotation,
}

impl Insight {
    /// Create an insight with an empty fingerprint and payload.
    pub fn new(
        id: impl Into<String>,
        criterion_id: impl Into<String>,
        quote: impl Into<String>,
        range: Range<usize>,
    ) -> Self {
        Self {
            id: id.into(),
            criterion_id: criterion_id.into(),
            quote: quote.into(),
            range_start: range.start,
            range_end: range.end,
            prefix: String::new(),
            suffix: String::new(),
            is_stale: false,
            created_at: None,
            annotation: Annotation::default(),
        }
    }

    /// Create an insight with a locally synthesized id.
    pub fn local(
        criterion_id: impl Into<String>,
        quote: impl Into<String>,
        range: Range<usize>,
    ) -> Self {
        Self::new(synthesize_id("insight"), criterion_id, quote, range)
    }

    /// Attach an annotation payload.
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = annotation;
        self
    }

    /// Attach an anchor context.
    pub fn with_context(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }

    /// The span as a range. Meaningless (best-effort only) when stale.
    pub fn range(&self) -> Range<usize> {
        self.range_start..self.range_end
    }

    /// `true` for non-stale insights.
    pub fn is_active(&self) -> bool {
        !self.is_stale
    }

    /// Span length in chars.
    pub fn len(&self) -> usize {
        self.range_end.saturating_sub(self.range_start)
    }

    /// `true` if the span covers no text.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Active insights ordered by start offset (ties by end, then id).
pub fn active_in_order(insights: &[Insight]) -> Vec<&Insight> {
    let mut active: Vec<&Insight> = insights.iter().filter(|i| i.is_active()).collect();
    active.sort_by(|a, b| {
        a.range_start
            .cmp(&b.range_start)
            .then_with(|| a.range_end.cmp(&b.range_end))
            .then_with(|| a.id.cmp(&b.id))
    });
    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_names() {
        let insight = Insight::new("i1", "clarity", "world", 6..11).with_annotation(Annotation {
            suggestion_primary: Some("planet".to_string()),
            ..Annotation::default()
        });

        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["rangeStart"], 6);
        assert_eq!(json["criterionId"], "clarity");
        assert_eq!(json["isStale"], false);
        assert_eq!(json["suggestion_primary"], "planet");
    }

    #[test]
    fn test_upstream_insight_defaults_missing_fields() {
        let raw = r#"{"id":"a","criterionId":"evidence","quote":"q","rangeStart":1,"rangeEnd":2,"explanation":"why"}"#;
        let insight: Insight = serde_json::from_str(raw).unwrap();

        assert_eq!(insight.prefix, "");
        assert!(!insight.is_stale);
        assert!(insight.created_at.is_none());
        assert_eq!(insight.annotation.explanation, "why");
    }

    #[test]
    fn test_active_in_order_skips_stale() {
        let mut stale = Insight::new("b", "c", "x", 0..1);
        stale.is_stale = true;
        let insights = vec![
            Insight::new("c", "c", "x", 5..6),
            stale,
            Insight::new("a", "c", "x", 2..3),
        ];

        let ids: Vec<&str> = active_in_order(&insights)
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_synthesized_ids_are_unique() {
        assert_ne!(synthesize_id("insight"), synthesize_id("insight"));
    }
}
