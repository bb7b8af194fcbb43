//! Highlight overlay geometry.
//!
//! The renderer is a stateless function of `(layout, insights, viewport)`: it never touches
//! the text or the insights, it only produces rectangles for the presentation layer to draw
//! behind the text.
//!
//! - Stale insights are skipped; the rest are taken in start order and clamped to the text.
//! - A span covering several visual rows yields one rectangle per row.
//! - Rectangles are expressed in the scroll container's coordinate space (scroll offset
//!   subtracted), so they stay attached to the text while scrolling.
//! - Overlapping spans are stacked: `layer` counts the earlier spans sharing text with it.

use crate::criteria::CriterionRegistry;
use crate::insight::{Insight, active_in_order};
use crate::layout::TextLayout;
use std::ops::Range;
use tracing::trace;

/// Size of one character cell in surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    /// Width of a one-cell character.
    pub cell_width: f32,
    /// Height of a visual row.
    pub line_height: f32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            cell_width: 8.0,
            line_height: 20.0,
        }
    }
}

/// Scroll state of the container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Horizontal scroll offset.
    pub scroll_x: f32,
    /// Vertical scroll offset.
    pub scroll_y: f32,
    /// Visible height, when known; rectangles outside it are culled.
    pub height: Option<f32>,
}

impl Viewport {
    /// A viewport scrolled to `(scroll_x, scroll_y)` with unknown height.
    pub fn scrolled(scroll_x: f32, scroll_y: f32) -> Self {
        Self {
            scroll_x,
            scroll_y,
            height: None,
        }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// `true` if `(x, y)` lies inside (left/top inclusive, right/bottom exclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// One highlight rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    /// Owning insight.
    pub insight_id: String,
    /// Owning insight's criterion.
    pub criterion_id: String,
    /// Resolved color token.
    pub color: String,
    /// Clamped span this rectangle belongs to (char offsets).
    pub range: Range<usize>,
    /// Visual row of this rectangle.
    pub row: usize,
    /// Geometry in container coordinates.
    pub rect: Rect,
    /// Stacking depth among overlapping spans (0 = bottom).
    pub layer: usize,
    /// Whether this overlay belongs to the selected insight.
    pub emphasized: bool,
}

/// Computes overlay rectangles.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    criteria: CriterionRegistry,
    metrics: CellMetrics,
}

impl OverlayRenderer {
    /// Create a renderer.
    pub fn new(criteria: CriterionRegistry, metrics: CellMetrics) -> Self {
        Self { criteria, metrics }
    }

    /// Cell metrics in use.
    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// The criterion registry used for color lookup.
    pub fn criteria(&self) -> &CriterionRegistry {
        &self.criteria
    }

    /// Compute the overlays for `insights` over `layout`.
    ///
    /// `selected` names the insight to emphasize. Spans whose ends cannot be resolved in
    /// `layout` are skipped for this pass.
    pub fn render(
        &self,
        layout: &TextLayout,
        insights: &[Insight],
        viewport: &Viewport,
        selected: Option<&str>,
    ) -> Vec<Overlay> {
        let total = layout.char_count();
        let spans: Vec<(&Insight, Range<usize>)> = active_in_order(insights)
            .into_iter()
            .filter_map(|insight| {
                let start = insight.range_start.min(total);
                let end = insight.range_end.max(start).min(total);
                (start < end).then_some((insight, start..end))
            })
            .collect();

        let mut overlays = Vec::new();
        for (index, (insight, range)) in spans.iter().enumerate() {
            let layer = spans[..index]
                .iter()
                .filter(|(_, earlier)| earlier.end > range.start)
                .count();
            let emphasized = selected == Some(insight.id.as_str());
            let color = self.criteria.color_for(&insight.criterion_id);

            for (row, rect) in self.span_rects(layout, range, viewport) {
                overlays.push(Overlay {
                    insight_id: insight.id.clone(),
                    criterion_id: insight.criterion_id.clone(),
                    color: color.to_string(),
                    range: range.clone(),
                    row,
                    rect,
                    layer,
                    emphasized,
                });
            }
        }

        overlays
    }

    /// Rectangles (one per visual row) for a clamped span.
    fn span_rects(
        &self,
        layout: &TextLayout,
        range: &Range<usize>,
        viewport: &Viewport,
    ) -> Vec<(usize, Rect)> {
        let start = layout.position_of(range.start);
        let end = layout.position_of(range.end);
        let (Some(start), Some(end)) = (start, end) else {
            trace!(?range, "span not resolvable in layout, skipping");
            return Vec::new();
        };

        let mut rects = Vec::new();
        for row in start.row..=end.row {
            let x0 = if row == start.row { start.x } else { 0 };
            let x1 = if row == end.row {
                end.x
            } else {
                match layout.row_width(row) {
                    Some(width) => width,
                    None => continue,
                }
            };
            if x1 <= x0 {
                continue;
            }

            let rect = Rect {
                x: x0 as f32 * self.metrics.cell_width - viewport.scroll_x,
                y: row as f32 * self.metrics.line_height - viewport.scroll_y,
                width: (x1 - x0) as f32 * self.metrics.cell_width,
                height: self.metrics.line_height,
            };
            if let Some(height) = viewport.height
                && (rect.y + rect.height <= 0.0 || rect.y >= height)
            {
                continue;
            }
            rects.push((row, rect));
        }
        rects
    }
}

/// The top-most overlay under `(x, y)`.
pub fn hit_test(overlays: &[Overlay], x: f32, y: f32) -> Option<&Overlay> {
    overlays
        .iter()
        .filter(|overlay| overlay.rect.contains(x, y))
        .max_by_key(|overlay| overlay.layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutOptions, WrapMode};
    use pretty_assertions::assert_eq;

    fn renderer() -> OverlayRenderer {
        OverlayRenderer::new(
            CriterionRegistry::decision_rubric(),
            CellMetrics {
                cell_width: 10.0,
                line_height: 20.0,
            },
        )
    }

    fn layout(text: &str, width: usize) -> TextLayout {
        TextLayout::new(
            text,
            LayoutOptions {
                wrap_width: width,
                tab_width: 4,
                wrap_mode: WrapMode::Char,
            },
        )
    }

    #[test]
    fn test_single_row_span() {
        let layout = layout("Hello world", 80);
        let insights = vec![Insight::new("a", "risks", "world", 6..11)];

        let overlays = renderer().render(&layout, &insights, &Viewport::default(), None);
        assert_eq!(overlays.len(), 1);
        assert_eq!(
            overlays[0].rect,
            Rect {
                x: 60.0,
                y: 0.0,
                width: 50.0,
                height: 20.0
            }
        );
        assert_eq!(overlays[0].color, "orange");
    }

    #[test]
    fn test_span_across_line_break_yields_rect_per_row() {
        let layout = layout("abc def\nghi jkl", 80);
        let insights = vec![Insight::new("a", "risks", "def\nghi", 4..11)];

        let overlays = renderer().render(&layout, &insights, &Viewport::default(), None);
        let rows: Vec<(usize, f32, f32)> = overlays
            .iter()
            .map(|o| (o.row, o.rect.x, o.rect.width))
            .collect();
        assert_eq!(rows, vec![(0, 40.0, 30.0), (1, 0.0, 30.0)]);
    }

    #[test]
    fn test_span_across_soft_wrap() {
        let layout = layout("0123456789abcdef", 10);
        let insights = vec![Insight::new("a", "c", "89ab", 8..12)];

        let overlays = renderer().render(&layout, &insights, &Viewport::default(), None);
        assert_eq!(overlays.len(), 2);
        assert_eq!((overlays[0].row, overlays[0].rect.x), (0, 80.0));
        assert_eq!((overlays[1].row, overlays[1].rect.width), (1, 20.0));
    }

    #[test]
    fn test_scroll_offset_and_culling() {
        let layout = layout("a\nb\nc\nd", 80);
        let insights = vec![
            Insight::new("first", "c", "a", 0..1),
            Insight::new("last", "c", "d", 6..7),
        ];
        let viewport = Viewport {
            scroll_x: 0.0,
            scroll_y: 40.0,
            height: Some(40.0),
        };

        let overlays = renderer().render(&layout, &insights, &viewport, None);
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].insight_id, "last");
        assert_eq!(overlays[0].rect.y, 20.0);
    }

    #[test]
    fn test_stale_degenerate_and_out_of_range_spans() {
        let layout = layout("short", 80);
        let mut stale = Insight::new("stale", "c", "sh", 0..2);
        stale.is_stale = true;
        let insights = vec![
            stale,
            Insight::new("empty", "c", "", 2..2),
            Insight::new("past", "c", "x", 9..12),
            Insight::new("clamped", "c", "ort", 2..40),
        ];

        let overlays = renderer().render(&layout, &insights, &Viewport::default(), None);
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].insight_id, "clamped");
        assert_eq!(overlays[0].range, 2..5);
    }

    #[test]
    fn test_overlapping_spans_stack() {
        let layout = layout("the quick brown fox", 80);
        let insights = vec![
            Insight::new("outer", "c", "quick brown", 4..15),
            Insight::new("inner", "c", "brown", 10..15),
        ];

        let overlays = renderer().render(&layout, &insights, &Viewport::default(), Some("inner"));
        assert_eq!(overlays[0].layer, 0);
        assert_eq!(overlays[1].layer, 1);
        assert!(!overlays[0].emphasized);
        assert!(overlays[1].emphasized);

        let hit = hit_test(&overlays, 105.0, 5.0).map(|o| o.insight_id.as_str());
        assert_eq!(hit, Some("inner"));
        let hit = hit_test(&overlays, 45.0, 5.0).map(|o| o.insight_id.as_str());
        assert_eq!(hit, Some("outer"));
        assert!(hit_test(&overlays, 1.0, 5.0).is_none());
    }

    #[test]
    fn test_spans_clamp_to_layout_text() {
        // Layout built from text shorter than the insights assume.
        let layout = layout("abc", 80);
        let insights = vec![
            Insight::new("a", "c", "bc", 1..3),
            Insight::new("b", "c", "z", 3..3),
        ];

        let overlays = renderer().render(&layout, &insights, &Viewport::default(), None);
        assert_eq!(overlays.len(), 1);
    }
}
