//! Common test utilities and assertion helpers.
//!
//! Read-back helpers for filled packages: raw part access for checking the
//! minimal-diff export, and a parsed view for checking cell contents.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::io::{Cursor, Read};

use xlfill::cell_ref::CellAddr;
use xlfill::types::{CellValue, Workbook};

// Re-export fixtures for convenience
pub use super::fixtures::*;

// ============================================================================
// Package access
// ============================================================================

fn archive(data: &[u8]) -> zip::ZipArchive<Cursor<&[u8]>> {
    zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive")
}

/// Entry names in archive order.
#[must_use]
pub fn entry_names(data: &[u8]) -> Vec<String> {
    archive(data).file_names().map(str::to_string).collect()
}

/// Raw bytes of one part, or `None` if the package does not have it.
#[must_use]
pub fn entry_bytes(data: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut zip = archive(data);
    let mut file = zip.by_name(name).ok()?;
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    Some(out)
}

/// One part as UTF-8 text. Panics if the part is missing.
#[must_use]
pub fn entry_text(data: &[u8], name: &str) -> String {
    let bytes = entry_bytes(data, name).unwrap_or_else(|| panic!("package has no part '{name}'"));
    String::from_utf8(bytes).unwrap()
}

/// Parts whose content differs between two packages, plus parts only in `after`.
#[must_use]
pub fn changed_parts(before: &[u8], after: &[u8]) -> Vec<String> {
    entry_names(after)
        .into_iter()
        .filter(|name| entry_bytes(before, name) != entry_bytes(after, name))
        .collect()
}

// ============================================================================
// Parsed view
// ============================================================================

#[must_use]
pub fn parse(data: &[u8]) -> Workbook {
    xlfill::parser::parse(data).expect("Failed to parse XLSX")
}

/// Display text of a cell on the first sheet, `None` when empty.
#[must_use]
pub fn cell_text(workbook: &Workbook, cell_ref: &str) -> Option<String> {
    let addr: CellAddr = cell_ref.parse().unwrap();
    workbook.first_sheet().unwrap().text(addr)
}

#[must_use]
pub fn cell_value(workbook: &Workbook, cell_ref: &str) -> Option<CellValue> {
    let addr: CellAddr = cell_ref.parse().unwrap();
    workbook
        .first_sheet()
        .unwrap()
        .get(addr)
        .and_then(|cell| cell.value.cloned())
}

/// Assert that a cell on the first sheet shows `expected`.
pub fn assert_cell_text(workbook: &Workbook, cell_ref: &str, expected: &str) {
    assert_eq!(
        cell_text(workbook, cell_ref).as_deref(),
        Some(expected),
        "cell {cell_ref}"
    );
}

pub fn assert_cell_empty(workbook: &Workbook, cell_ref: &str) {
    assert_eq!(cell_text(workbook, cell_ref), None, "cell {cell_ref} should be empty");
}
