//! Layered configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables with the `REVIEW_` prefix (`__` separates sections, e.g.
//!    `REVIEW_LAYOUT__WRAP_WIDTH=100`)
//! 2. A TOML file, when one is given
//! 3. Built-in defaults

use crate::anchor::DEFAULT_CONTEXT_CHARS;
use crate::error::ConfigError;
use crate::history::DEFAULT_MAX_HISTORY;
use crate::layout::{DEFAULT_TAB_WIDTH, LayoutOptions, WrapMode};
use crate::overlay::CellMetrics;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How the surface updates insights after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStrategy {
    /// Derive the edit and shift/re-anchor only what it touches.
    #[default]
    Incremental,
    /// Re-anchor every insight on every edit.
    Full,
}

/// Text layout and cell geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Container width in cells (`0` disables wrapping).
    pub wrap_width: usize,
    /// Tab width in cells.
    pub tab_width: usize,
    /// Soft wrapping mode.
    pub wrap_mode: WrapMode,
    /// Width of a one-cell character.
    pub cell_width: f32,
    /// Height of a visual row.
    pub line_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            wrap_width: 80,
            tab_width: DEFAULT_TAB_WIDTH,
            wrap_mode: WrapMode::Word,
            cell_width: 8.0,
            line_height: 20.0,
        }
    }
}

impl LayoutConfig {
    /// Layout options for [`TextLayout`](crate::layout::TextLayout).
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions {
            wrap_width: self.wrap_width,
            tab_width: self.tab_width.max(1),
            wrap_mode: self.wrap_mode,
        }
    }

    /// Cell metrics for the overlay renderer.
    pub fn metrics(&self) -> CellMetrics {
        CellMetrics {
            cell_width: self.cell_width,
            line_height: self.line_height,
        }
    }
}

/// Review engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Context characters captured on each side of a span.
    pub context_chars: usize,
    /// Maximum number of history snapshots.
    pub max_history: usize,
    /// Stale share (percent) above which a rescan is recommended.
    pub stale_threshold_percent: f64,
    /// Delay before a burst of edits is committed to history.
    pub commit_debounce_ms: u64,
    /// Delay before overlays are recomputed.
    pub overlay_debounce_ms: u64,
    /// Maximum insights requested from the analyzer.
    pub max_insights: usize,
    /// Insight refresh strategy after edits.
    pub refresh_strategy: RefreshStrategy,
    /// Layout settings.
    pub layout: LayoutConfig,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            context_chars: DEFAULT_CONTEXT_CHARS,
            max_history: DEFAULT_MAX_HISTORY,
            stale_threshold_percent: 10.0,
            commit_debounce_ms: 100,
            overlay_debounce_ms: 30,
            max_insights: 20,
            refresh_strategy: RefreshStrategy::Incremental,
            layout: LayoutConfig::default(),
        }
    }
}

impl ReviewConfig {
    /// Load defaults overridden by `REVIEW_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(Self::figment())
    }

    /// Load defaults, then `path` (if it exists), then environment variables.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }
        Self::extract(figment.merge(Env::prefixed("REVIEW_").split("__")))
    }

    /// Parse a TOML document over the defaults (no environment).
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        Self::extract(figment.merge(Toml::string(toml)))
    }

    /// The provider chain used by [`load`](Self::load).
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed("REVIEW_").split("__"))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history == 0 {
            return Err(invalid("max_history", "must keep at least one snapshot"));
        }
        if !(0.0..=100.0).contains(&self.stale_threshold_percent) {
            let reason = "must be between 0 and 100";
            return Err(invalid("stale_threshold_percent", reason));
        }
        if self.layout.cell_width <= 0.0 || self.layout.line_height <= 0.0 {
            let reason = "cell_width and line_height must be positive";
            return Err(invalid("layout", reason));
        }
        Ok(())
    }

    /// Commit debounce as a [`Duration`].
    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_debounce_ms)
    }

    /// Overlay debounce as a [`Duration`].
    pub fn overlay_delay(&self) -> Duration {
        Duration::from_millis(self.overlay_debounce_ms)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
