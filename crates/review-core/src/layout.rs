//! Headless soft-wrap layout.
//!
//! Computes the visual rows of a document for a container width measured in character cells.
//! Character widths follow UAX #11; tabs advance to the next tab stop. The resulting
//! [`TextLayout`] maps character offsets to `(row, x)` cell positions and back, which is all
//! the overlay renderer needs to place highlight rectangles.

use crate::line_index::LineIndex;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

/// Default tab width (in cells).
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Soft wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// Each logical line is a single visual row.
    None,
    /// Wrap at character boundaries.
    Char,
    /// Prefer wrapping after whitespace, falling back to character wrap.
    #[default]
    Word,
}

/// Layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Container width in cells (`0` disables wrapping).
    pub wrap_width: usize,
    /// Tab width in cells.
    pub tab_width: usize,
    /// Wrapping mode.
    pub wrap_mode: WrapMode,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            wrap_width: 80,
            tab_width: DEFAULT_TAB_WIDTH,
            wrap_mode: WrapMode::Word,
        }
    }
}

/// A position in the visual grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VisualPosition {
    /// Global visual row.
    pub row: usize,
    /// Cell offset within the row.
    pub x: usize,
}

impl VisualPosition {
    /// Create a visual position.
    pub fn new(row: usize, x: usize) -> Self {
        Self { row, x }
    }
}

/// Calculate visual width of a character (UAX #11): 0, 1 or 2 cells.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Cell width of `ch` when it starts at `x_in_line`, expanding tabs to the next stop.
pub fn cell_width_at(ch: char, x_in_line: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        tab_width - x_in_line % tab_width
    } else {
        char_width(ch)
    }
}

/// Char indices (within `line`) where each continuation row starts.
pub fn wrap_points(line: &str, options: &LayoutOptions) -> Vec<usize> {
    if options.wrap_width == 0 {
        return Vec::new();
    }
    match options.wrap_mode {
        WrapMode::None => Vec::new(),
        WrapMode::Char => char_wrap_points(line, options.wrap_width, options.tab_width),
        WrapMode::Word => word_wrap_points(line, options.wrap_width, options.tab_width),
    }
}

fn char_wrap_points(line: &str, width: usize, tab_width: usize) -> Vec<usize> {
    let mut points = Vec::new();
    let mut x_in_row = 0usize;
    let mut x_in_line = 0usize;

    for (index, ch) in line.chars().enumerate() {
        let w = cell_width_at(ch, x_in_line, tab_width);
        // Wide characters move to the next row intact.
        if x_in_row > 0 && x_in_row + w > width {
            points.push(index);
            x_in_row = 0;
        }
        x_in_row += w;
        x_in_line += w;
    }

    points
}

fn word_wrap_points(line: &str, width: usize, tab_width: usize) -> Vec<usize> {
    let mut points = Vec::new();
    let mut row_start = 0usize;
    let mut row_start_x = 0usize;
    // (char index after the whitespace, x_in_line at that index)
    let mut last_break: Option<(usize, usize)> = None;
    let mut x_in_line = 0usize;

    for (index, ch) in line.chars().enumerate() {
        let w = cell_width_at(ch, x_in_line, tab_width);

        if index > row_start && x_in_line - row_start_x + w > width {
            match last_break {
                Some((break_index, break_x)) if break_index > row_start => {
                    points.push(break_index);
                    row_start = break_index;
                    row_start_x = break_x;
                }
                _ => {
                    points.push(index);
                    row_start = index;
                    row_start_x = x_in_line;
                }
            }
            last_break = None;

            // The rest of the broken word may still overflow.
            if index > row_start && x_in_line - row_start_x + w > width {
                points.push(index);
                row_start = index;
                row_start_x = x_in_line;
            }
        }

        x_in_line += w;
        if ch.is_whitespace() {
            last_break = Some((index + 1, x_in_line));
        }
    }

    points
}

#[derive(Debug, Clone)]
struct LineLayout {
    /// Char offset of the line in the document.
    start: usize,
    /// Line length in chars, excluding the line break.
    len: usize,
    /// First visual row of this line.
    first_row: usize,
    /// Continuation row starts (char index within the line).
    wraps: Vec<usize>,
    /// `x_at[i]` is the cell offset (from line start) before char `i`; `len + 1` entries.
    x_at: Vec<usize>,
}

impl LineLayout {
    fn row_count(&self) -> usize {
        self.wraps.len() + 1
    }

    /// `(row within line, segment start column)` holding `column`.
    fn segment_of(&self, column: usize) -> (usize, usize) {
        let k = self.wraps.partition_point(|&wrap| wrap <= column);
        (k, if k == 0 { 0 } else { self.wraps[k - 1] })
    }

    fn segment_bounds(&self, row_in_line: usize) -> (usize, usize) {
        let start = if row_in_line == 0 { 0 } else { self.wraps[row_in_line - 1] };
        let end = self.wraps.get(row_in_line).copied().unwrap_or(self.len);
        (start, end)
    }
}

/// Visual layout of a whole document.
#[derive(Debug, Clone)]
pub struct TextLayout {
    options: LayoutOptions,
    lines: Vec<LineLayout>,
    char_count: usize,
    row_count: usize,
}

impl TextLayout {
    /// Lay out `text` with `options`.
    pub fn new(text: &str, options: LayoutOptions) -> Self {
        let index = LineIndex::from_text(text);
        let mut lines = Vec::with_capacity(index.line_count());
        let mut row = 0usize;

        for (line_number, line_text) in index.lines().enumerate() {
            let mut x_at = Vec::with_capacity(line_text.len() + 1);
            let mut x = 0usize;
            x_at.push(0);
            for ch in line_text.chars() {
                x += cell_width_at(ch, x, options.tab_width);
                x_at.push(x);
            }

            let layout = LineLayout {
                start: index.line_start(line_number),
                len: x_at.len() - 1,
                first_row: row,
                wraps: wrap_points(&line_text, &options),
                x_at,
            };
            row += layout.row_count();
            lines.push(layout);
        }

        Self {
            options,
            lines,
            char_count: index.char_count(),
            row_count: row,
        }
    }

    /// Options this layout was built with.
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Character count of the laid-out text.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    /// Number of logical lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total number of visual rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Resolve a char offset to its visual position.
    ///
    /// Offsets inside a line break resolve to the end of that line. Returns `None` for offsets
    /// past the end of the text.
    pub fn position_of(&self, offset: usize) -> Option<VisualPosition> {
        if offset > self.char_count {
            return None;
        }

        let line = self.line_holding(offset)?;
        let column = (offset - line.start).min(line.len);
        let (row_in_line, segment_start) = line.segment_of(column);
        Some(VisualPosition {
            row: line.first_row + row_in_line,
            x: line.x_at[column] - line.x_at[segment_start],
        })
    }

    /// Width of a visual row in cells, or `None` past the last row.
    pub fn row_width(&self, row: usize) -> Option<usize> {
        let (line, row_in_line) = self.row_holding(row)?;
        let (start, end) = line.segment_bounds(row_in_line);
        Some(line.x_at[end] - line.x_at[start])
    }

    /// Char offset nearest to a visual position (clamped into the grid).
    pub fn offset_at(&self, position: VisualPosition) -> usize {
        let row = position.row.min(self.row_count.saturating_sub(1));
        let Some((line, row_in_line)) = self.row_holding(row) else {
            return self.char_count;
        };

        let (start, end) = line.segment_bounds(row_in_line);
        let base = line.x_at[start];
        let mut column = start;
        while column < end {
            let left = line.x_at[column] - base;
            let right = line.x_at[column + 1] - base;
            // Snap to whichever edge of the character is closer.
            if position.x < right && position.x * 2 < left + right {
                break;
            }
            if position.x < right {
                column += 1;
                break;
            }
            column += 1;
        }
        line.start + column
    }

    fn line_holding(&self, offset: usize) -> Option<&LineLayout> {
        let k = self.lines.partition_point(|line| line.start <= offset);
        self.lines.get(k.checked_sub(1)?)
    }

    fn row_holding(&self, row: usize) -> Option<(&LineLayout, usize)> {
        if row >= self.row_count {
            return None;
        }
        let k = self.lines.partition_point(|line| line.first_row <= row);
        let line = self.lines.get(k.checked_sub(1)?)?;
        Some((line, row - line.first_row))
    }
}
