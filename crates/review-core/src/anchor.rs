//! Anchor management: keeping insight offsets valid while the text changes.
//!
//! Each insight carries a fingerprint of the text around its span (`prefix`, `quote`,
//! `suffix`). Edits that cannot affect a span shift it arithmetically; edits that touch it
//! trigger a re-anchor, which searches the new text for the fingerprint:
//!
//! 1. `prefix + quote + suffix` as one contiguous match,
//! 2. `quote` alone,
//! 3. otherwise the span is marked stale and its offsets are left as they were.
//!
//! When a step finds several occurrences, the one nearest to the previous start offset wins.
//! Stale insights are never revived.

use crate::delta::TextEdit;
use crate::insight::Insight;
use crate::text::{char_len, char_slice, chars_after, chars_before, match_offsets};
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

/// Default number of context characters captured on each side of a span.
pub const DEFAULT_CONTEXT_CHARS: usize = 50;

/// How a re-anchor attempt resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorOutcome {
    /// The full `prefix + quote + suffix` fingerprint matched.
    Context,
    /// Only the bare quote matched.
    Quote,
    /// Nothing matched; the insight is now stale.
    Lost,
}

/// Computes anchor fingerprints and relocates insights.
#[derive(Debug, Clone, Copy)]
pub struct AnchorManager {
    context_chars: usize,
}

impl Default for AnchorManager {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_CHARS)
    }
}

impl AnchorManager {
    /// Create a manager capturing up to `context_chars` characters of context per side.
    pub fn new(context_chars: usize) -> Self {
        Self { context_chars }
    }

    /// Context window size in characters.
    pub fn context_chars(&self) -> usize {
        self.context_chars
    }

    /// Bring a freshly analyzed insight into the engine.
    ///
    /// Clamps the range into `content`, captures the context fingerprint, clears the stale flag,
    /// and defaults `created_at` to now.
    pub fn enhance(&self, insight: &Insight, content: &str) -> Insight {
        self.enhance_at(insight, content, Utc::now())
    }

    /// [`enhance`](Self::enhance) with an explicit clock.
    pub fn enhance_at(&self, insight: &Insight, content: &str, now: DateTime<Utc>) -> Insight {
        let total = char_len(content);
        let start = insight.range_start.min(total);
        let end = insight.range_end.max(start).min(total);

        let mut enhanced = insight.clone();
        self.anchor_at(&mut enhanced, content, start, end);
        enhanced.created_at.get_or_insert(now);
        enhanced
    }

    /// Enhance a batch of insights against the same content.
    pub fn enhance_all(&self, insights: &[Insight], content: &str) -> Vec<Insight> {
        let now = Utc::now();
        insights
            .iter()
            .map(|insight| self.enhance_at(insight, content, now))
            .collect()
    }

    /// Update insights for one contiguous edit.
    ///
    /// `edit` is expressed against the previous text; `new_content` is the text after it.
    /// Spans entirely before the edit are kept, spans entirely after it are shifted, and spans
    /// the edit touches are re-anchored against `new_content`.
    pub fn apply_edit(
        &self,
        insights: &[Insight],
        edit: &TextEdit,
        new_content: &str,
    ) -> Vec<Insight> {
        let delta = edit.delta();
        let edit_end = edit.end.max(edit.start);
        let new_len = char_len(new_content);

        insights
            .iter()
            .map(|insight| {
                if insight.is_stale {
                    return insight.clone();
                }

                if insight.range_end <= edit.start {
                    let (start, end) = (insight.range_start, insight.range_end);
                    return self.settle(insight, new_content, start, end);
                }

                if insight.range_start >= edit_end {
                    let start = insight.range_start.checked_add_signed(delta);
                    let end = insight.range_end.checked_add_signed(delta);
                    if let (Some(start), Some(end)) = (start, end)
                        && end <= new_len
                    {
                        return self.settle(insight, new_content, start, end);
                    }
                    // The edit does not describe this text; fall back to matching.
                    debug!(insight = %insight.id, "shift out of bounds, re-anchoring");
                }

                self.reanchor(insight, new_content)
            })
            .collect()
    }

    /// Relocate `insight` in `content` by its fingerprint.
    pub fn reanchor(&self, insight: &Insight, content: &str) -> Insight {
        let mut updated = insight.clone();
        self.reanchor_in_place(&mut updated, content);
        updated
    }

    /// Relocate `insight` in place, reporting which step succeeded.
    pub fn reanchor_in_place(&self, insight: &mut Insight, content: &str) -> AnchorOutcome {
        if insight.quote.is_empty() {
            return self.mark_lost(insight);
        }

        let quote_len = char_len(&insight.quote);

        if !insight.prefix.is_empty() || !insight.suffix.is_empty() {
            let needle = format!("{}{}{}", insight.prefix, insight.quote, insight.suffix);
            let prefix_len = char_len(&insight.prefix);
            let candidates: Vec<usize> = match_offsets(content, &needle)
                .into_iter()
                .map(|offset| offset + prefix_len)
                .collect();

            if let Some(start) = nearest(&candidates, insight.range_start) {
                self.anchor_at(insight, content, start, start + quote_len);
                trace!(insight = %insight.id, start, "re-anchored by context");
                return AnchorOutcome::Context;
            }
        }

        let candidates = match_offsets(content, &insight.quote);
        if let Some(start) = nearest(&candidates, insight.range_start) {
            self.anchor_at(insight, content, start, start + quote_len);
            trace!(insight = %insight.id, start, "re-anchored by quote");
            return AnchorOutcome::Quote;
        }

        self.mark_lost(insight)
    }

    /// Re-anchor every live insight against `content`.
    pub fn refresh_all(&self, insights: &[Insight], content: &str) -> Vec<Insight> {
        insights
            .iter()
            .map(|insight| {
                if insight.is_stale {
                    insight.clone()
                } else {
                    self.reanchor(insight, content)
                }
            })
            .collect()
    }

    /// Place `insight` at `start..end`, refreshing its fingerprint when the quote is still there.
    fn settle(&self, insight: &Insight, content: &str, start: usize, end: usize) -> Insight {
        let mut settled = insight.clone();
        settled.range_start = start;
        settled.range_end = end;
        if char_slice(content, start, end) == insight.quote {
            self.anchor_at(&mut settled, content, start, end);
        }
        settled
    }

    fn anchor_at(&self, insight: &mut Insight, content: &str, start: usize, end: usize) {
        insight.range_start = start;
        insight.range_end = end;
        insight.prefix = chars_before(content, start, self.context_chars).to_string();
        insight.suffix = chars_after(content, end, self.context_chars).to_string();
        insight.is_stale = false;
    }

    fn mark_lost(&self, insight: &mut Insight) -> AnchorOutcome {
        if !insight.is_stale {
            debug!(insight = %insight.id, quote = %insight.quote, "insight lost its anchor");
        }
        insight.is_stale = true;
        AnchorOutcome::Lost
    }
}

fn nearest(candidates: &[usize], previous: usize) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .min_by_key(|&offset| offset.abs_diff(previous))
}

/// Percentage (0–100) of stale insights; `0.0` for an empty set.
pub fn stale_percentage(insights: &[Insight]) -> f64 {
    if insights.is_empty() {
        return 0.0;
    }
    let stale = insights.iter().filter(|i| i.is_stale).count();
    100.0 * stale as f64 / insights.len() as f64
}

/// Whether the stale share strictly exceeds `threshold_percent`.
pub fn needs_rescan(insights: &[Insight], threshold_percent: f64) -> bool {
    stale_percentage(insights) > threshold_percent
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn anchored(content: &str, start: usize, end: usize) -> Insight {
        let quote = crate::text::char_slice(content, start, end).to_string();
        let raw = Insight::new("i", "clarity", quote, start..end);
        AnchorManager::default().enhance(&raw, content)
    }

    #[test]
    fn test_enhance_clamps_and_captures_context() {
        let content = "Hello world, this is a test.";
        let raw = Insight::new("i", "c", "world", 6..11);
        let insight = AnchorManager::new(6).enhance(&raw, content);

        assert_eq!(insight.prefix, "Hello ");
        assert_eq!(insight.suffix, ", this");
        assert!(!insight.is_stale);
        assert!(insight.created_at.is_some());

        let wild = AnchorManager::default().enhance(&Insight::new("j", "c", "x", 40..30), content);
        assert_eq!(wild.range(), 28..28);
    }

    #[test]
    fn test_enhance_is_idempotent() {
        let manager = AnchorManager::default();
        let content = "The minister recommends option B.";
        let mut raw = Insight::new("i", "options", "option B", 24..32);
        raw.is_stale = true;

        let once = manager.enhance(&raw, content);
        let twice = manager.enhance(&once, content);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_shift_correctness_at_boundaries() {
        let manager = AnchorManager::default();
        let span = anchored("ABCDE", 1, 3);

        // Insertion at range end does not shift.
        let after = manager.apply_edit(&[span.clone()], &TextEdit::insert(3, "X"), "ABCXDE");
        assert_eq!(after[0].range(), 1..3);

        // Insertion strictly before range start shifts both ends.
        let before = manager.apply_edit(&[span.clone()], &TextEdit::insert(0, "XY"), "XYABCDE");
        assert_eq!(before[0].range(), 3..5);

        // Deletion before the span shifts left.
        let tail = anchored("ABCDE", 3, 5);
        let deleted = manager.apply_edit(&[tail], &TextEdit::delete(0, 2), "CDE");
        assert_eq!(deleted[0].range(), 1..3);
    }

    #[test]
    fn test_inverted_edit_is_treated_as_insertion() {
        let manager = AnchorManager::default();
        let head = anchored("ABCDEFG", 0, 2);
        let tail = anchored("ABCDEFG", 5, 7);
        let inverted = TextEdit {
            start: 3,
            end: 1,
            inserted: "XY".to_string(),
        };

        let updated = manager.apply_edit(&[head, tail], &inverted, "ABCXYDEFG");
        assert_eq!(updated[0].range(), 0..2);
        assert_eq!(updated[1].range(), 7..9);
        assert!(updated.iter().all(|insight| !insight.is_stale));
    }

    #[test]
    fn test_overlapping_edit_reanchors() {
        let manager = AnchorManager::default();
        let span = anchored("one two three", 4, 7);

        // Typing inside the span changes the quote: the bare quote no longer exists.
        let typo = TextEdit::insert(5, "o");
        let edited = manager.apply_edit(&[span.clone()], &typo, "one towo three");
        assert!(edited[0].is_stale);
        assert_eq!(edited[0].range(), 4..7);

        // Replacing the span with identical text re-anchors cleanly.
        let same = manager.apply_edit(&[span], &TextEdit::replace(4, 7, "two"), "one two three");
        assert!(!same[0].is_stale);
        assert_eq!(same[0].range(), 4..7);
    }

    #[test]
    fn test_reanchor_success_after_append() {
        let manager = AnchorManager::new(6);
        let insight = Insight::new("i", "c", "world", 6..11).with_context("Hello ", ", this");

        let mut moved = insight.clone();
        moved.range_start = 0;
        moved.range_end = 5;

        let result = manager.reanchor(&moved, "Hello world, this is a test. Extra.");
        assert_eq!(result.range(), 6..11);
        assert!(!result.is_stale);
    }

    #[test]
    fn test_reanchor_failure_leaves_offsets() {
        let manager = AnchorManager::default();
        let insight = Insight::new("i", "c", "world", 6..11).with_context("Hello ", ", this");

        let result = manager.reanchor(&insight, "Hello there, this is a test.");
        assert!(result.is_stale);
        assert_eq!(result.range(), 6..11);
    }

    #[test]
    fn test_reanchor_empty_quote_fails_closed() {
        let manager = AnchorManager::default();
        let mut insight = Insight::new("i", "c", "", 3..3);

        let outcome = manager.reanchor_in_place(&mut insight, "anything");
        assert_eq!(outcome, AnchorOutcome::Lost);
        assert!(insight.is_stale);
        assert_eq!(insight.range(), 3..3);
    }

    #[test]
    fn test_context_disambiguates_duplicate_quotes() {
        let manager = AnchorManager::new(4);
        let content = "cost: high. risk: high.";
        let second = manager.enhance(&Insight::new("i", "c", "high", 18..22), content);
        assert_eq!(second.prefix, "sk: ");

        let edited = "NOTE cost: high. risk: high.";
        let mut relocated = second.clone();
        let outcome = manager.reanchor_in_place(&mut relocated, edited);
        assert_eq!(outcome, AnchorOutcome::Context);
        assert_eq!(relocated.range(), 23..27);
    }

    #[test]
    fn test_quote_fallback_prefers_nearest() {
        let manager = AnchorManager::default();
        let insight = Insight::new("i", "c", "alpha", 20..25).with_context("gone ", " gone");

        let mut relocated = insight.clone();
        let outcome = manager.reanchor_in_place(&mut relocated, "alpha ............ alpha");
        assert_eq!(outcome, AnchorOutcome::Quote);
        assert_eq!(relocated.range(), 19..24);
    }

    #[test]
    fn test_stale_insights_are_not_revived() {
        let manager = AnchorManager::default();
        let mut insight = anchored("abc def", 4, 7);
        insight.is_stale = true;

        let refreshed = manager.refresh_all(&[insight], "abc def");
        assert!(refreshed[0].is_stale);
    }

    #[test]
    fn test_stale_percentage() {
        let mut insights: Vec<Insight> = (0..4)
            .map(|i| Insight::new(format!("i{i}"), "c", "q", 0..1))
            .collect();
        insights[2].is_stale = true;

        assert_eq!(stale_percentage(&insights), 25.0);
        assert_eq!(stale_percentage(&[]), 0.0);
        assert!(needs_rescan(&insights, 10.0));
        assert!(!needs_rescan(&insights, 25.0));
    }
}
