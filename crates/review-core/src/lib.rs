#![warn(missing_docs)]
//! Review Core - Anchored Insight Engine for Document Review Editors
//!
//! # Overview
//!
//! `review-core` keeps review insights (criterion-tagged comments on spans of a document) attached
//! to the right text while the user edits it, and computes the highlight rectangles an editor draws
//! over that text. It is headless: the host supplies input events, the clock, and a renderer that
//! paints [`Overlay`] rectangles.
//!
//! # Core Features
//!
//! - **Anchoring**: every insight carries a prefix/quote/suffix fingerprint; edits shift untouched
//!   spans and re-anchor touched ones, falling back to a stale mark when the text is gone
//! - **Linear History**: bounded snapshot undo/redo with debounced commits
//! - **Overlay Geometry**: one rectangle per visual row, soft wrapping, wide characters, stacking
//! - **Deterministic Timing**: debouncers driven by host-supplied instants
//! - **State Tracking**: version number mechanism and change notifications
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ReviewSurface (input, IME, shortcuts)      │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Debouncer          │  EditHistory          │  ← Timing & Undo
//! ├─────────────────────────────────────────────┤
//! │  AnchorManager (fingerprint, re-anchor)     │  ← Insight Offsets
//! ├─────────────────────────────────────────────┤
//! │  OverlayRenderer    │  CriterionRegistry    │  ← Highlight Geometry
//! ├─────────────────────────────────────────────┤
//! │  TextLayout (soft wrapping)                 │  ← Text Layout
//! ├─────────────────────────────────────────────┤
//! │  LineIndex (Rope-based)                     │  ← Line Access
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use review_core::{AnchorManager, Insight, TextEdit};
//!
//! let manager = AnchorManager::default();
//! let text = "The report lacks evidence for its claims.";
//! let insight = manager.enhance(&Insight::new("i1", "evidence", "evidence", 17..25), text);
//!
//! let edit = TextEdit::insert(0, "Overall, ");
//! let edited = edit.apply(text);
//! let updated = manager.apply_edit(&[insight], &edit, &edited);
//!
//! assert_eq!(updated[0].range(), 26..34);
//! assert_eq!(&edited[26..34], "evidence");
//! ```
//!
//! # Module Description
//!
//! - [`insight`] - Insight record and annotation payload
//! - [`delta`] - Single-range text edits
//! - [`anchor`] - Fingerprinting, edit propagation, and re-anchoring
//! - [`history`] - Bounded linear undo/redo
//! - [`line_index`] - Rope based line index
//! - [`layout`] - Soft wrapping layout engine
//! - [`overlay`] - Highlight rectangles and hit testing
//! - [`criteria`] - Criterion registry and colors
//! - [`scheduler`] - Keyed trailing debouncer
//! - [`keymap`] - Keyboard shortcuts
//! - [`collaborators`] - Document store and analyzer contracts
//! - [`config`] - Layered configuration
//! - [`surface`] - Review surface controller
//!
//! # Unicode Support
//!
//! - All offsets count Unicode scalar values (chars), never bytes
//! - East Asian wide characters take two cells (UAX #11)
//! - Carets restored after a recompute snap to grapheme cluster boundaries

pub mod anchor;
pub mod collaborators;
pub mod config;
pub mod criteria;
pub mod delta;
pub mod error;
pub mod history;
pub mod insight;
pub mod keymap;
pub mod layout;
pub mod line_index;
pub mod overlay;
pub mod scheduler;
pub mod surface;
mod text;

pub use anchor::{
    AnchorManager, AnchorOutcome, DEFAULT_CONTEXT_CHARS, needs_rescan, stale_percentage,
};
pub use collaborators::{Analyzer, Document, DocumentStore, MemoryStore};
pub use config::{LayoutConfig, RefreshStrategy, ReviewConfig};
pub use criteria::{Criterion, CriterionRegistry, FALLBACK_COLOR};
pub use delta::TextEdit;
pub use error::{AnalyzerError, ConfigError, Result, ReviewError, StoreError};
pub use history::{DEFAULT_MAX_HISTORY, EditHistory, HistoryState, Snapshot};
pub use insight::{Annotation, Insight, active_in_order, synthesize_id};
pub use keymap::{Key, KeyChord, Keymap, Modifiers, ShortcutAction};
pub use layout::{LayoutOptions, TextLayout, VisualPosition, WrapMode};
pub use line_index::LineIndex;
pub use overlay::{CellMetrics, Overlay, OverlayRenderer, Rect, Viewport, hit_test};
pub use scheduler::{Debouncer, TimerHandle};
pub use surface::{
    Notice, ReviewSurface, Selection, SurfaceCallback, SurfaceChange, SurfaceChangeKind, TimerKey,
};
