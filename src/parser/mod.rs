//! XLSX reader
//!
//! Builds the [`Grid`](crate::types::Grid) of every sheet from a zip+XML
//! package and keeps the source bytes for export.

mod relationships;
mod worksheet;

use std::io::Cursor;
use zip::ZipArchive;

use crate::error::{FillError, Result};
use crate::types::{SourcePackage, Workbook};

use relationships::{shared_strings, PackageIndex};
use worksheet::parse_sheet;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Safely round f64 to i64 with clamping (EMU offsets and extents).
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn f64_to_i64_rounded(v: f64) -> i64 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(-1e15, 1e15) as i64
}

/// Reject inputs that are not zip packages before handing them to `zip`.
fn check_format(data: &[u8]) -> Result<()> {
    if data.starts_with(CFB_MAGIC) {
        return Err(FillError::UnsupportedFormat(
            "legacy .xls (binary) workbooks are not supported; save as .xlsx".to_string(),
        ));
    }
    if !data.starts_with(ZIP_MAGIC) {
        return Err(FillError::UnsupportedFormat(
            "input is not a zip-based spreadsheet".to_string(),
        ));
    }
    Ok(())
}

/// Parse an XLSX file from bytes.
pub fn parse(data: &[u8]) -> Result<Workbook> {
    check_format(data)?;

    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)?;

    let index = PackageIndex::read(&mut archive);
    let strings = shared_strings(&mut archive, index.shared_strings.as_deref());
    let sheet_info = index.sheets(&mut archive)?;

    let mut sheets = Vec::with_capacity(sheet_info.len());
    for info in &sheet_info {
        let grid = parse_sheet(&mut archive, info, &strings)?;
        log::debug!(
            "parsed sheet '{}' ({} x {}, {} merges)",
            grid.name,
            grid.row_count(),
            grid.col_count(),
            grid.merges().len()
        );
        sheets.push(grid);
    }

    Ok(Workbook {
        sheets,
        source: Some(SourcePackage {
            bytes: data.to_vec(),
            sheet_paths: sheet_info.into_iter().map(|i| i.path).collect(),
            styles_path: index.styles,
        }),
    })
}
