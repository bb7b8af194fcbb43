//! Review surface controller.
//!
//! [`ReviewSurface`] ties the pieces together for one open document:
//!
//! - every input (outside IME composition) updates the text, repairs insight offsets, and
//!   arms two trailing debounce timers: a history commit and an overlay recompute;
//! - the host drives time by calling [`ReviewSurface::tick`] with the current [`Instant`];
//! - undo/redo, insight navigation, and overlay clicks move both the logical insight selection
//!   and the text selection;
//! - subscribers receive a [`SurfaceChange`] for every state change.
//!
//! # Example
//!
//! ```rust
//! use review_core::{Insight, ReviewConfig, ReviewSurface};
//! use std::time::{Duration, Instant};
//!
//! let mut surface = ReviewSurface::new("The committee approves the plan.", ReviewConfig::default());
//! surface.set_insights(vec![Insight::new("i1", "clarity", "approves", 14..22)]);
//!
//! let now = Instant::now();
//! surface.handle_input("Today the committee approves the plan.", 6, now);
//! assert_eq!(surface.insights()[0].range(), 20..28);
//!
//! surface.tick(now + Duration::from_millis(200));
//! assert!(surface.history_state().can_undo);
//! ```

use crate::anchor::{AnchorManager, needs_rescan, stale_percentage};
use crate::collaborators::{Analyzer, Document, DocumentStore};
use crate::config::{RefreshStrategy, ReviewConfig};
use crate::criteria::CriterionRegistry;
use crate::delta::TextEdit;
use crate::error::{Result, ReviewError};
use crate::history::{EditHistory, HistoryState};
use crate::insight::{Insight, active_in_order};
use crate::keymap::{KeyChord, Keymap, ShortcutAction};
use crate::layout::{TextLayout, VisualPosition};
use crate::overlay::{Overlay, OverlayRenderer, Viewport, hit_test};
use crate::scheduler::Debouncer;
use crate::text::char_len;
use chrono::{DateTime, Utc};
use std::ops::Range;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, trace, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Debounced work owned by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Record the current text in the undo history.
    Commit,
    /// Recompute layout and overlays.
    Overlays,
}

/// Text selection in char offsets. `anchor == head` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Where the selection started.
    pub anchor: usize,
    /// Where the caret is.
    pub head: usize,
}

impl Selection {
    /// A caret at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Select `range`, caret at its end.
    pub fn span(range: Range<usize>) -> Self {
        Self {
            anchor: range.start,
            head: range.end,
        }
    }

    /// Ordered bounds.
    pub fn range(&self) -> Range<usize> {
        self.anchor.min(self.head)..self.anchor.max(self.head)
    }

    /// `true` for a caret.
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// Kind of surface state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceChangeKind {
    /// The text changed (input, undo, redo).
    ContentChanged,
    /// Insight offsets, stale flags or the insight set changed.
    InsightsChanged,
    /// The text selection or the selected insight changed.
    SelectionChanged,
    /// Layout and overlays were recomputed.
    OverlaysChanged,
    /// A snapshot was recorded in the history.
    HistoryCommitted,
    /// The analyzer failed; see [`ReviewSurface::notice`].
    AnalysisFailed,
    /// The stale share crossed the configured threshold.
    RescanRecommended,
}

/// State change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceChange {
    /// Change type
    pub kind: SurfaceChangeKind,
    /// Version before the change
    pub old_version: u64,
    /// Version after the change
    pub new_version: u64,
}

/// State change callback function type
pub type SurfaceCallback = Box<dyn FnMut(&SurfaceChange) + Send>;

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Human-readable text.
    pub message: String,
    /// When it was raised.
    pub raised_at: DateTime<Utc>,
}

/// Controller for one document under review.
pub struct ReviewSurface {
    doc_id: Option<String>,
    title: String,
    content: String,
    insights: Vec<Insight>,
    selection: Selection,
    selected_insight: Option<String>,
    /// Uncommitted IME text while composing.
    composition: Option<String>,
    history: EditHistory,
    anchors: AnchorManager,
    renderer: OverlayRenderer,
    layout: TextLayout,
    overlays: Vec<Overlay>,
    viewport: Viewport,
    timers: Debouncer<TimerKey>,
    keymap: Keymap,
    config: ReviewConfig,
    version: u64,
    callbacks: Vec<SurfaceCallback>,
    notice: Option<Notice>,
    rescan_flagged: bool,
}

impl ReviewSurface {
    /// Create a surface over `content` using the decision rubric.
    pub fn new(content: &str, config: ReviewConfig) -> Self {
        Self::with_criteria(content, config, CriterionRegistry::decision_rubric())
    }

    /// Create a surface configured from a TOML file layered under `REVIEW_*` variables.
    ///
    /// A missing file falls back to defaults; an unreadable or invalid one is an error.
    pub fn from_config_file(content: &str, path: impl AsRef<Path>) -> Result<Self> {
        let config = ReviewConfig::load_from(path)?;
        Ok(Self::new(content, config))
    }

    /// Create a surface with an explicit criterion registry.
    pub fn with_criteria(content: &str, config: ReviewConfig, criteria: CriterionRegistry) -> Self {
        let mut history = EditHistory::new(config.max_history);
        history.save_state(content);
        let layout = TextLayout::new(content, config.layout.options());

        Self {
            doc_id: None,
            title: String::new(),
            content: content.to_string(),
            insights: Vec::new(),
            selection: Selection::default(),
            selected_insight: None,
            composition: None,
            history,
            anchors: AnchorManager::new(config.context_chars),
            renderer: OverlayRenderer::new(criteria, config.layout.metrics()),
            layout,
            overlays: Vec::new(),
            viewport: Viewport::default(),
            timers: Debouncer::new(),
            keymap: Keymap::default(),
            config,
            version: 0,
            callbacks: Vec::new(),
            notice: None,
            rescan_flagged: false,
        }
    }

    /// Open a stored document and re-anchor its stored insights against its text.
    pub fn open(store: &impl DocumentStore, doc_id: &str, config: ReviewConfig) -> Result<Self> {
        let document = store
            .get(doc_id)?
            .ok_or_else(|| ReviewError::DocumentNotFound(doc_id.to_string()))?;
        let stored = store.list_insights(doc_id)?;

        let mut surface = Self::new(&document.content, config);
        surface.doc_id = Some(document.id);
        surface.title = document.title;
        surface.insights = surface.anchors.refresh_all(&stored, &surface.content);
        surface.rescan_flagged = surface.needs_rescan();
        surface.overlays = surface.render_overlays();
        debug!(doc = doc_id, insights = surface.insights.len(), "opened document");
        Ok(surface)
    }

    /// Write the document and its insights, flushing any pending history commit first.
    ///
    /// Returns the document id (synthesized on first save).
    pub fn save(&mut self, store: &mut impl DocumentStore) -> Result<String> {
        self.flush_commit();
        let document = match &self.doc_id {
            Some(id) => Document::with_id(id.clone(), self.title.clone(), self.content.clone()),
            None => Document::new(self.title.clone(), self.content.clone()),
        };

        store.save(&document)?;
        store.save_insights(&document.id, &self.insights)?;
        self.doc_id = Some(document.id.clone());
        Ok(document.id)
    }

    /// Subscribe to state changes.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&SurfaceChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Replace the keymap.
    pub fn set_keymap(&mut self, keymap: Keymap) {
        self.keymap = keymap;
    }

    /// Set the document title used on save.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Document id, once opened or saved.
    pub fn doc_id(&self) -> Option<&str> {
        self.doc_id.as_deref()
    }

    /// Current text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current insights, including stale ones.
    pub fn insights(&self) -> &[Insight] {
        &self.insights
    }

    /// Current text selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Id of the selected insight.
    pub fn selected_insight(&self) -> Option<&str> {
        self.selected_insight.as_deref()
    }

    /// Overlays from the last recompute.
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Layout from the last recompute.
    pub fn layout(&self) -> &TextLayout {
        &self.layout
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Undo/redo availability.
    pub fn history_state(&self) -> HistoryState {
        self.history.state()
    }

    /// State version, incremented on every change notification.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Last user-visible notice (analyzer failures).
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Dismiss the current notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// `true` while an IME composition is in progress.
    pub fn is_composing(&self) -> bool {
        self.composition.is_some()
    }

    /// Active configuration.
    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Whether `key` has a pending timer.
    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.timers.is_pending(&key)
    }

    /// Earliest pending timer deadline, for hosts that sleep until the next tick.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Percentage of stale insights.
    pub fn stale_percentage(&self) -> f64 {
        stale_percentage(&self.insights)
    }

    /// Whether the stale share exceeds the configured threshold.
    pub fn needs_rescan(&self) -> bool {
        needs_rescan(&self.insights, self.config.stale_threshold_percent)
    }

    /// Visual position of the caret in the current layout.
    pub fn caret_position(&self) -> Option<VisualPosition> {
        self.layout.position_of(self.selection.head)
    }

    /// Replace the insight set with freshly analyzed insights, anchoring them to the text.
    pub fn set_insights(&mut self, raw: Vec<Insight>) {
        self.insights = self.anchors.enhance_all(&raw, &self.content);
        self.clear_stale_selection();
        self.notify(SurfaceChangeKind::InsightsChanged);
        self.check_rescan();
        self.refresh_overlays();
    }

    /// Run the analyzer on the current text and adopt its insights.
    ///
    /// On failure the text and existing insights are left untouched and a [`Notice`] is
    /// raised. Returns the number of adopted insights.
    pub async fn analyze<A: Analyzer>(&mut self, analyzer: &A) -> Result<usize> {
        let submitted = self.content.clone();
        let max = self.config.max_insights;

        match analyzer.analyze(&submitted, max).await {
            Ok(mut raw) => {
                raw.truncate(max);
                let count = raw.len();
                self.notice = None;
                self.set_insights(raw);
                debug!(count, "adopted analyzer insights");
                Ok(count)
            }
            Err(error) => {
                warn!(%error, "analysis failed");
                self.notice = Some(Notice {
                    message: format!("Document analysis could not be completed: {error}"),
                    raised_at: Utc::now(),
                });
                self.notify(SurfaceChangeKind::AnalysisFailed);
                Err(error.into())
            }
        }
    }

    /// Handle a raw input event carrying the full new text and caret offset.
    ///
    /// Ignored while composing. Returns whether the text changed.
    pub fn handle_input(&mut self, new_text: &str, caret: usize, now: Instant) -> bool {
        if let Some(pending) = self.composition.as_mut() {
            *pending = new_text.to_string();
            return false;
        }
        self.apply_input(new_text, caret, now)
    }

    /// An IME composition started.
    pub fn composition_start(&mut self) {
        self.composition = Some(self.content.clone());
    }

    /// Intermediate composition text; not propagated.
    pub fn composition_update(&mut self, text: &str) {
        if let Some(pending) = self.composition.as_mut() {
            *pending = text.to_string();
        }
    }

    /// The composition ended; the final text is processed as a normal input.
    pub fn composition_end(&mut self, final_text: &str, caret: usize, now: Instant) -> bool {
        self.composition = None;
        self.apply_input(final_text, caret, now)
    }

    /// Fire due timers. Returns the keys that fired.
    pub fn tick(&mut self, now: Instant) -> Vec<TimerKey> {
        let fired = self.timers.poll(now);
        for key in &fired {
            match key {
                TimerKey::Commit => self.commit(),
                TimerKey::Overlays => self.refresh_overlays(),
            }
        }
        fired
    }

    /// Record a pending debounced commit immediately.
    pub fn flush_commit(&mut self) {
        if self.timers.cancel(&TimerKey::Commit) {
            self.commit();
        }
    }

    /// Step back in history. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, now: Instant) -> bool {
        if self.is_composing() {
            return false;
        }
        self.flush_commit();
        let Some(text) = self.history.undo().map(str::to_string) else {
            return false;
        };
        self.restore_content(text, now);
        true
    }

    /// Step forward in history. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self, now: Instant) -> bool {
        if self.is_composing() {
            return false;
        }
        self.flush_commit();
        let Some(text) = self.history.redo().map(str::to_string) else {
            return false;
        };
        self.restore_content(text, now);
        true
    }

    /// Dispatch a key press. Returns whether a shortcut handled it.
    pub fn handle_key(&mut self, chord: KeyChord, now: Instant) -> bool {
        let Some(action) = self.keymap.resolve(&chord) else {
            return false;
        };
        match action {
            ShortcutAction::Undo => self.undo(now),
            ShortcutAction::Redo => self.redo(now),
            ShortcutAction::NextInsight => self.select_next_insight().is_some(),
            ShortcutAction::PreviousInsight => self.select_previous_insight().is_some(),
            ShortcutAction::ClearSelection => self.clear_insight_selection(),
        }
    }

    /// Select an active insight and put the text selection on its span.
    pub fn select_insight(&mut self, id: &str) -> bool {
        let Some(range) = self
            .insights
            .iter()
            .find(|insight| insight.id == id && insight.is_active())
            .map(Insight::range)
        else {
            return false;
        };

        self.selected_insight = Some(id.to_string());
        self.selection = Selection::span(range);
        self.update_emphasis();
        self.notify(SurfaceChangeKind::SelectionChanged);
        true
    }

    /// Select the next active insight in text order, wrapping to the first.
    pub fn select_next_insight(&mut self) -> Option<String> {
        self.step_insight(true)
    }

    /// Select the previous active insight in text order, wrapping to the last.
    pub fn select_previous_insight(&mut self) -> Option<String> {
        self.step_insight(false)
    }

    /// Drop the insight selection (the text selection is kept).
    pub fn clear_insight_selection(&mut self) -> bool {
        if self.selected_insight.take().is_none() {
            return false;
        }
        self.update_emphasis();
        self.notify(SurfaceChangeKind::SelectionChanged);
        true
    }

    /// Pointer press at container coordinates.
    ///
    /// A press on an overlay selects its insight; elsewhere it places the caret.
    /// Returns the selected insight id, if any.
    pub fn click(&mut self, x: f32, y: f32) -> Option<String> {
        let hit = hit_test(&self.overlays, x, y).map(|overlay| overlay.insight_id.clone());
        if let Some(id) = hit {
            return self.select_insight(&id).then_some(id);
        }

        let metrics = self.renderer.metrics();
        let row = ((y + self.viewport.scroll_y) / metrics.line_height).max(0.0) as usize;
        let cells = ((x + self.viewport.scroll_x) / metrics.cell_width).max(0.0) as usize;
        let offset = self.layout.offset_at(VisualPosition::new(row, cells));
        self.selection = Selection::caret(snap_to_grapheme(&self.content, offset));
        self.notify(SurfaceChangeKind::SelectionChanged);
        None
    }

    /// Scroll the container; overlays follow after the debounce.
    pub fn scroll_to(&mut self, scroll_x: f32, scroll_y: f32, now: Instant) {
        self.viewport.scroll_x = scroll_x;
        self.viewport.scroll_y = scroll_y;
        self.schedule_overlays(now);
    }

    /// Set the visible height used for culling.
    pub fn set_viewport_height(&mut self, height: Option<f32>, now: Instant) {
        self.viewport.height = height;
        self.schedule_overlays(now);
    }

    /// Recompute layout and overlays now, preserving the caret.
    pub fn refresh_overlays(&mut self) {
        self.timers.cancel(&TimerKey::Overlays);
        let caret = self.selection;
        self.overlays = self.render_overlays();
        self.selection = Selection {
            anchor: snap_to_grapheme(&self.content, caret.anchor),
            head: snap_to_grapheme(&self.content, caret.head),
        };
        self.notify(SurfaceChangeKind::OverlaysChanged);
    }

    fn render_overlays(&mut self) -> Vec<Overlay> {
        self.layout = TextLayout::new(&self.content, self.config.layout.options());
        self.renderer.render(
            &self.layout,
            &self.insights,
            &self.viewport,
            self.selected_insight.as_deref(),
        )
    }

    fn apply_input(&mut self, new_text: &str, caret: usize, now: Instant) -> bool {
        let changed = new_text != self.content;
        if changed {
            let old = std::mem::replace(&mut self.content, new_text.to_string());
            self.reconcile_insights(&old);
            self.notify(SurfaceChangeKind::ContentChanged);
            self.timers
                .schedule(TimerKey::Commit, self.config.commit_delay(), now);
        }

        self.selection = Selection::caret(snap_to_grapheme(&self.content, caret));
        self.schedule_overlays(now);
        changed
    }

    /// Swap in a history snapshot without recording it again.
    fn restore_content(&mut self, text: String, now: Instant) {
        let edit = TextEdit::between(&self.content, &text);
        let old = std::mem::replace(&mut self.content, text);
        self.reconcile_insights(&old);

        let map = |offset: usize| match &edit {
            Some(edit) => map_offset(edit, offset),
            None => offset,
        };
        self.selection = Selection {
            anchor: snap_to_grapheme(&self.content, map(self.selection.anchor)),
            head: snap_to_grapheme(&self.content, map(self.selection.head)),
        };

        self.notify(SurfaceChangeKind::ContentChanged);
        self.schedule_overlays(now);
    }

    /// Repair insights after `self.content` changed from `old`.
    fn reconcile_insights(&mut self, old: &str) {
        let updated = match self.config.refresh_strategy {
            RefreshStrategy::Incremental => match TextEdit::between(old, &self.content) {
                Some(edit) => self.anchors.apply_edit(&self.insights, &edit, &self.content),
                None => return,
            },
            RefreshStrategy::Full => self.anchors.refresh_all(&self.insights, &self.content),
        };

        if updated != self.insights {
            self.insights = updated;
            self.clear_stale_selection();
            self.notify(SurfaceChangeKind::InsightsChanged);
            self.check_rescan();
        }
    }

    fn clear_stale_selection(&mut self) {
        let Some(selected) = self.selected_insight.as_deref() else {
            return;
        };
        let alive = self
            .insights
            .iter()
            .any(|insight| insight.id == selected && insight.is_active());
        if !alive {
            self.selected_insight = None;
        }
    }

    fn commit(&mut self) {
        if self.history.current() == Some(self.content.as_str()) {
            trace!("content unchanged since last snapshot");
            return;
        }
        self.history.save_state(&self.content);
        debug!(depth = self.history.len(), "history commit");
        self.notify(SurfaceChangeKind::HistoryCommitted);
    }

    fn schedule_overlays(&mut self, now: Instant) {
        self.timers
            .schedule(TimerKey::Overlays, self.config.overlay_delay(), now);
    }

    fn step_insight(&mut self, forward: bool) -> Option<String> {
        let ids: Vec<String> = active_in_order(&self.insights)
            .into_iter()
            .map(|insight| insight.id.clone())
            .collect();
        if ids.is_empty() {
            return None;
        }

        let current = self
            .selected_insight
            .as_ref()
            .and_then(|selected| ids.iter().position(|id| id == selected));
        let index = match (current, forward) {
            (Some(i), true) => (i + 1) % ids.len(),
            (Some(i), false) => (i + ids.len() - 1) % ids.len(),
            (None, true) => 0,
            (None, false) => ids.len() - 1,
        };

        let id = ids[index].clone();
        self.select_insight(&id);
        Some(id)
    }

    fn update_emphasis(&mut self) {
        let selected = self.selected_insight.as_deref();
        for overlay in &mut self.overlays {
            overlay.emphasized = selected == Some(overlay.insight_id.as_str());
        }
    }

    fn check_rescan(&mut self) {
        let needed = self.needs_rescan();
        if needed && !self.rescan_flagged {
            debug!(stale = self.stale_percentage(), "rescan recommended");
            self.notify(SurfaceChangeKind::RescanRecommended);
        }
        self.rescan_flagged = needed;
    }

    fn notify(&mut self, kind: SurfaceChangeKind) {
        let old_version = self.version;
        self.version += 1;
        let change = SurfaceChange {
            kind,
            old_version,
            new_version: self.version,
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}

/// Carry an offset in the old text across `edit`: offsets after the edit shift, offsets
/// inside the replaced range land at the end of the inserted text.
fn map_offset(edit: &TextEdit, offset: usize) -> usize {
    if offset <= edit.start {
        offset
    } else if offset >= edit.end {
        offset.saturating_add_signed(edit.delta())
    } else {
        edit.start + edit.inserted_len()
    }
}

/// Clamp `offset` into `text` and move it back to the start of the grapheme it falls in.
fn snap_to_grapheme(text: &str, offset: usize) -> usize {
    let offset = offset.min(char_len(text));
    let mut boundary = 0usize;
    for grapheme in text.graphemes(true) {
        let next = boundary + char_len(grapheme);
        if next > offset {
            return boundary;
        }
        boundary = next;
    }
    boundary
}
