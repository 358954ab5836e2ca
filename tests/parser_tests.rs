//! Tests for reading template packages into grids.
//!
//! The detector and the renderer only see what the parser keeps: resolved
//! cell text, merges (content on the anchor only), column widths and row
//! heights, plus the source package for export.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use common::{assert_cell_text, cell_value, parse};
use fixtures::{SheetBuilder, XlsxBuilder, STYLE_BORDERED};
use xlfill::cell_ref::{CellAddr, Span};
use xlfill::error::FillError;
use xlfill::types::CellValue;

fn addr(s: &str) -> CellAddr {
    s.parse().unwrap()
}

#[test]
fn test_shared_strings_numbers_and_booleans() {
    let data = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Hoja1")
                .cell("A1", "Placa:")
                .cell("B2", 42)
                .cell("C3", 2.5)
                .cell("D4", true),
        )
        .build();
    let workbook = parse(&data);
    assert_cell_text(&workbook, "A1", "Placa:");
    assert_eq!(cell_value(&workbook, "B2"), Some(CellValue::Number(42.0)));
    assert_eq!(cell_value(&workbook, "C3"), Some(CellValue::Number(2.5)));
    assert_eq!(cell_value(&workbook, "D4"), Some(CellValue::Bool(true)));
}

#[test]
fn test_merge_cells_resolve_to_anchor() {
    let data = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Hoja1")
                .cell("A39", "Firma")
                .merge("A39:L40"),
        )
        .build();
    let sheet = parse(&data).sheets.remove(0);

    assert_eq!(sheet.merges().len(), 1);
    assert_eq!(sheet.merge_span_of(40, 12), (addr("A39"), Span::new(2, 12)));
    assert_eq!(sheet.anchor_of(addr("F40")), addr("A39"));
    assert!(sheet.get(addr("A39")).unwrap().is_anchor());
    assert!(!sheet.get(addr("B39")).unwrap().is_anchor());
    // bounds grow to cover the merge
    assert_eq!((sheet.row_count(), sheet.col_count()), (40, 12));
}

#[test]
fn test_column_widths_and_row_heights() {
    let data = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Hoja1")
                .cell("A1", "x")
                .col_width(2, 4, 18.5)
                .row_height(3, 42.0),
        )
        .build();
    let sheet = parse(&data).sheets.remove(0);

    for col in 2..=4 {
        assert_eq!(sheet.column_width_units(col), 18.5);
    }
    assert_eq!(sheet.row_height_points(3), 42.0);
    // rows with only a height still count toward the bounds
    assert_eq!(sheet.row_count(), 3);
}

#[test]
fn test_styles_are_kept_per_cell() {
    let data = XlsxBuilder::new()
        .sheet(SheetBuilder::new("Hoja1").blank("F10", STYLE_BORDERED))
        .build();
    let sheet = parse(&data).sheets.remove(0);
    let cell = sheet.get(addr("F10")).unwrap();
    assert_eq!(cell.style, Some(STYLE_BORDERED));
    assert!(cell.is_empty());
}

#[test]
fn test_sheets_keep_workbook_order() {
    let data = XlsxBuilder::new()
        .sheet(SheetBuilder::new("Inspección").cell("A1", "1"))
        .sheet(SheetBuilder::new("Anexo & notas").cell("A1", "2"))
        .build();
    let workbook = parse(&data);
    assert_eq!(workbook.sheet_names(), ["Inspección", "Anexo & notas"]);
    assert_eq!(workbook.sheet_index("Anexo & notas"), Some(1));

    let source = workbook.source.as_ref().unwrap();
    assert_eq!(source.bytes, data);
    assert_eq!(
        source.sheet_paths,
        ["xl/worksheets/sheet1.xml", "xl/worksheets/sheet2.xml"]
    );
    assert_eq!(source.styles_path.as_deref(), Some("xl/styles.xml"));
}

#[test]
fn test_legacy_xls_is_rejected() {
    let cfb = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0];
    assert!(matches!(
        xlfill::parser::parse(&cfb),
        Err(FillError::UnsupportedFormat(_))
    ));
}
