//! Utilities for parsing and formatting Excel-style cell references and ranges.
//!
//! Addresses in this crate are 1-based on both axes, matching the A1 notation
//! used by templates and by the XML (`F6` is row 6, column 6).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FillError;

/// A 1-based cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddr {
    // Field order gives row-major ordering, which is the XML order.
    pub row: u32,
    pub col: u32,
}

impl CellAddr {
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Address shifted by whole rows/columns.
    #[must_use]
    pub const fn offset(self, rows: u32, cols: u32) -> Self {
        Self {
            row: self.row.saturating_add(rows),
            col: self.col.saturating_add(cols),
        }
    }

    /// Zero-based `(col, row)` pair as used by drawing anchors.
    #[must_use]
    pub const fn zero_based(self) -> (u32, u32) {
        (self.col.saturating_sub(1), self.row.saturating_sub(1))
    }
}

impl fmt::Display for CellAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letter(self.col), self.row)
    }
}

impl FromStr for CellAddr {
    type Err = FillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_cell_ref(s).ok_or_else(|| FillError::CellRef(s.to_string()))
    }
}

impl Serialize for CellAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Row/column extent of a region, in cell counts. Never smaller than 1x1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub rows: u32,
    pub cols: u32,
}

impl Span {
    pub const SINGLE: Span = Span { rows: 1, cols: 1 };

    #[must_use]
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::SINGLE
    }
}

/// Parse a cell reference like "A1" or "$F$6" into a 1-based address.
///
/// Returns `None` for anything that is not letters followed by digits, or
/// for row/column zero.
pub fn parse_cell_ref(cell_ref: &str) -> Option<CellAddr> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse a cell reference from raw bytes (ASCII), e.g. an `r` attribute value.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<CellAddr> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .checked_mul(26)?
                .checked_add(u32::from(upper - b'A') + 1)?;
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some(CellAddr { row, col })
}

/// Parse a range like "A1:B10" (or a single "A1") into its corners.
pub fn parse_cell_range(range: &str) -> Option<(CellAddr, CellAddr)> {
    if let Some((start, end)) = range.split_once(':') {
        let start = parse_cell_ref(start)?;
        let end = parse_cell_ref(end)?;
        Some((
            CellAddr::new(start.row.min(end.row), start.col.min(end.col)),
            CellAddr::new(start.row.max(end.row), start.col.max(end.col)),
        ))
    } else {
        let single = parse_cell_ref(range)?;
        Some((single, single))
    }
}

/// Convert a 1-based column number to its letters (1 -> "A", 27 -> "AA").
pub fn col_to_letter(col: u32) -> String {
    let mut result = Vec::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26, so the addition stays inside ASCII uppercase
        result.push(b'A' + u8::try_from(rem).unwrap_or(0));
        n = (n - 1) / 26;
    }
    result.reverse();
    String::from_utf8(result).unwrap_or_default()
}
