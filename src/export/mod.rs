//! XLSX export pipeline.
//!
//! A parsed template is patched: untouched zip entries are copied raw, touched
//! worksheets get a streaming `sheetData` patch, and pictures, styles and
//! content types are extended in place. A workbook built in memory has no
//! package to patch, so one is synthesized from its grids.

mod content_types;
mod drawing_writer;
mod sheet_patch;
mod sheet_writer;
mod styles_patch;
mod zip_patcher;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use zip::write::FileOptions;
use zip::CompressionMethod;

use crate::cell_ref::CellAddr;
use crate::error::Result;
use crate::render::Placement;
use crate::types::{SignatureAsset, Workbook};

/// Alignment override applied to a written cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Alignment {
    /// Radio and checkbox markers
    Center,
    /// Textareas
    TopLeftWrap,
}

/// A signature picture ready to be anchored on a sheet.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    /// Media deduplication key; the same key shares one media part.
    pub media_key: String,
    pub name: String,
    pub asset: Arc<SignatureAsset>,
    pub placement: Placement,
}

/// Everything a render changed on one sheet.
#[derive(Debug, Clone, Default)]
pub struct SheetEdits {
    /// Anchor cells whose content or style must be rewritten
    pub cells: BTreeSet<CellAddr>,
    pub alignments: BTreeMap<CellAddr, Alignment>,
    pub images: Vec<PlacedImage>,
}

impl SheetEdits {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.alignments.is_empty() && self.images.is_empty()
    }
}

/// Zip entry options for every entry we write. The fixed timestamp keeps
/// output byte-identical across runs.
fn entry_options() -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
}

/// Serialize `workbook` with `edits` (keyed by sheet index) applied.
///
/// An unedited parsed workbook comes back as its original bytes.
pub(crate) fn write_workbook(
    workbook: &Workbook,
    edits: &BTreeMap<usize, SheetEdits>,
) -> Result<Vec<u8>> {
    let dirty: BTreeMap<usize, &SheetEdits> = edits
        .iter()
        .filter(|(_, e)| !e.is_empty())
        .map(|(&i, e)| (i, e))
        .collect();

    match &workbook.source {
        Some(source) if dirty.is_empty() => {
            log::debug!("no edits; returning source package unchanged");
            Ok(source.bytes.clone())
        }
        Some(source) => zip_patcher::patch_package(source, workbook, &dirty),
        None => sheet_writer::write_package(workbook, &dirty),
    }
}
