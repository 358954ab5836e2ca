use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::cell_ref::{CellAddr, Span};

/// Default column width in character units when a sheet declares none.
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;
/// Default row height in points when a sheet declares none.
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// A scalar cell value as stored in the sheet XML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// ISO 8601 text from a `t="d"` cell
    Date(String),
    Error(String),
}

impl CellValue {
    /// Text view of the value; numbers drop a trailing `.0`.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) | Self::Date(s) | Self::Error(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whitespace-only text counts as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// Format a number the way a spreadsheet displays a General value.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Arena slot for one stored cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSlot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
    /// Index into the workbook's `cellXfs`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<u32>,
}

/// A merged region: top-left anchor plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRegion {
    pub anchor: CellAddr,
    pub span: Span,
}

impl MergeRegion {
    pub fn contains(&self, addr: CellAddr) -> bool {
        addr.row >= self.anchor.row
            && addr.row < self.anchor.row + self.span.rows
            && addr.col >= self.anchor.col
            && addr.col < self.anchor.col + self.span.cols
    }

    /// Bottom-right cell of the region.
    pub fn end(&self) -> CellAddr {
        self.anchor
            .offset(self.span.rows.saturating_sub(1), self.span.cols.saturating_sub(1))
    }
}

/// Read view of one cell, merge membership resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell<'a> {
    pub addr: CellAddr,
    pub value: Option<&'a CellValue>,
    pub style: Option<u32>,
    pub merge: Option<MergeRegion>,
}

impl Cell<'_> {
    pub fn is_merged(&self) -> bool {
        self.merge.is_some()
    }

    pub fn is_anchor(&self) -> bool {
        self.merge.is_some_and(|m| m.anchor == self.addr)
    }

    /// Trimmed text of the cell, `None` when empty.
    pub fn text(&self) -> Option<String> {
        let text = self.value?.as_text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none_or(CellValue::is_blank)
    }
}

/// One sheet as a sparse grid.
///
/// Cells live in an arena indexed by address. Every cell covered by a merge
/// points back at its region, so content is never duplicated across a merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub name: String,
    slots: Vec<CellSlot>,
    index: BTreeMap<CellAddr, usize>,
    merges: Vec<MergeRegion>,
    #[serde(skip)]
    merge_of: HashMap<CellAddr, usize>,
    col_widths: BTreeMap<u32, f64>,
    row_heights: BTreeMap<u32, f64>,
    default_col_width: Option<f64>,
    default_row_height: Option<f64>,
    max_row: u32,
    max_col: u32,
}

impl Grid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Widen the bounds to at least `rows` x `cols`.
    #[must_use]
    pub fn with_dimension(mut self, rows: u32, cols: u32) -> Self {
        self.extend_bounds(CellAddr::new(rows, cols));
        self
    }

    /// Grow the bounds so that `addr` is inside them.
    pub fn extend_bounds(&mut self, addr: CellAddr) {
        self.max_row = self.max_row.max(addr.row);
        self.max_col = self.max_col.max(addr.col);
    }

    pub fn row_count(&self) -> u32 {
        self.max_row
    }

    pub fn col_count(&self) -> u32 {
        self.max_col
    }

    pub fn in_bounds(&self, addr: CellAddr) -> bool {
        addr.row >= 1 && addr.col >= 1 && addr.row <= self.max_row && addr.col <= self.max_col
    }

    /// Look up a cell without a bounds requirement.
    pub fn get(&self, addr: CellAddr) -> Option<Cell<'_>> {
        if addr.row == 0 || addr.col == 0 {
            return None;
        }
        let slot = self.index.get(&addr).and_then(|&i| self.slots.get(i));
        Some(Cell {
            addr,
            value: slot.and_then(|s| s.value.as_ref()),
            style: slot.and_then(|s| s.style),
            merge: self.merge_region(addr),
        })
    }

    /// Cell at a 1-based position.
    ///
    /// # Panics
    /// Panics if the position is outside `row_count` x `col_count`. Callers
    /// iterate within those bounds; use [`Grid::get`] for unchecked lookups.
    pub fn cell(&self, row: u32, col: u32) -> Cell<'_> {
        let addr = CellAddr::new(row, col);
        assert!(
            self.in_bounds(addr),
            "cell {addr} outside {} x {} grid",
            self.max_row,
            self.max_col
        );
        self.get(addr).unwrap_or(Cell {
            addr,
            value: None,
            style: None,
            merge: None,
        })
    }

    /// Trimmed text at `addr`, `None` if empty or outside the grid.
    pub fn text(&self, addr: CellAddr) -> Option<String> {
        self.get(addr).and_then(|c| c.text())
    }

    pub fn is_empty_at(&self, addr: CellAddr) -> bool {
        self.get(addr).is_none_or(|c| c.is_empty())
    }

    pub fn merge_region(&self, addr: CellAddr) -> Option<MergeRegion> {
        self.merge_of
            .get(&addr)
            .and_then(|&i| self.merges.get(i))
            .copied()
    }

    /// Anchor and span of the merge containing `addr`, or the cell itself as 1x1.
    pub fn merge_span_of(&self, row: u32, col: u32) -> (CellAddr, Span) {
        let addr = CellAddr::new(row, col);
        self.merge_region(addr)
            .map_or((addr, Span::SINGLE), |m| (m.anchor, m.span))
    }

    /// The only writable address for `addr`: its merge anchor, or itself.
    pub fn anchor_of(&self, addr: CellAddr) -> CellAddr {
        self.merge_region(addr).map_or(addr, |m| m.anchor)
    }

    pub fn merges(&self) -> &[MergeRegion] {
        &self.merges
    }

    pub fn column_width_units(&self, col: u32) -> f64 {
        self.col_widths
            .get(&col)
            .copied()
            .or(self.default_col_width)
            .unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    pub fn row_height_points(&self, row: u32) -> f64 {
        self.row_heights
            .get(&row)
            .copied()
            .or(self.default_row_height)
            .unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    /// Columns with an explicit width, ascending.
    pub fn column_widths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.col_widths.iter().map(|(&col, &units)| (col, units))
    }

    /// Rows with an explicit height, ascending.
    pub fn row_heights(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.row_heights.iter().map(|(&row, &points)| (row, points))
    }

    /// Stored cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellAddr, &CellSlot)> {
        self.index
            .iter()
            .filter_map(|(addr, &i)| self.slots.get(i).map(|slot| (*addr, slot)))
    }

    fn slot_mut(&mut self, addr: CellAddr) -> Option<&mut CellSlot> {
        if addr.row == 0 || addr.col == 0 {
            return None;
        }
        self.extend_bounds(addr);
        let next = self.slots.len();
        let i = *self.index.entry(addr).or_insert(next);
        if i == next {
            self.slots.push(CellSlot::default());
        }
        self.slots.get_mut(i)
    }

    /// Store a value at exactly `addr`. Merge redirection is the caller's job.
    pub fn set_value(&mut self, addr: CellAddr, value: CellValue) {
        if let Some(slot) = self.slot_mut(addr) {
            slot.value = Some(value);
        }
    }

    pub fn set_style(&mut self, addr: CellAddr, style: u32) {
        if let Some(slot) = self.slot_mut(addr) {
            slot.style = Some(style);
        }
    }

    /// Register a merged region. Overlapping regions keep the first claim.
    pub fn add_merge(&mut self, anchor: CellAddr, span: Span) {
        let region = MergeRegion {
            anchor,
            span: Span::new(span.rows, span.cols),
        };
        let idx = self.merges.len();
        self.merges.push(region);
        for r in 0..region.span.rows {
            for c in 0..region.span.cols {
                self.merge_of.entry(anchor.offset(r, c)).or_insert(idx);
            }
        }
        self.extend_bounds(region.end());
    }

    pub fn set_column_width(&mut self, col: u32, units: f64) {
        self.col_widths.insert(col, units);
    }

    pub fn set_row_height(&mut self, row: u32, points: f64) {
        self.row_heights.insert(row, points);
    }

    pub fn set_default_column_width(&mut self, units: f64) {
        self.default_col_width = Some(units);
    }

    pub fn set_default_row_height(&mut self, points: f64) {
        self.default_row_height = Some(points);
    }

    /// Rebuild the merge back-references after deserialization.
    pub fn reindex_merges(&mut self) {
        let merges = std::mem::take(&mut self.merges);
        self.merge_of.clear();
        for m in merges {
            self.add_merge(m.anchor, m.span);
        }
    }
}
