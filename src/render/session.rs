//! Mutable fill state for one render call.
//!
//! Wraps a private copy of the workbook and records every touched cell,
//! alignment override and placed picture per sheet, so export only patches
//! what changed.

use std::collections::BTreeMap;

use crate::cell_ref::CellAddr;
use crate::error::Result;
use crate::export::{self, Alignment, PlacedImage, SheetEdits};
use crate::types::{CellValue, Grid, Workbook};

pub struct FillSession {
    workbook: Workbook,
    /// Edits keyed by sheet index
    edits: BTreeMap<usize, SheetEdits>,
}

impl FillSession {
    pub fn new(workbook: Workbook) -> Self {
        Self {
            workbook,
            edits: BTreeMap::new(),
        }
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.workbook.sheet_index(name)
    }

    pub fn grid(&self, sheet: usize) -> Option<&Grid> {
        self.workbook.sheets.get(sheet)
    }

    /// Current text at the anchor covering `addr`, untrimmed.
    pub fn existing_text(&self, sheet: usize, addr: CellAddr) -> Option<String> {
        let grid = self.grid(sheet)?;
        let cell = grid.get(grid.anchor_of(addr))?;
        cell.value.map(CellValue::as_text)
    }

    /// Store `value` at the anchor covering `addr`. Returns the anchor.
    pub fn write(&mut self, sheet: usize, addr: CellAddr, value: CellValue) -> Option<CellAddr> {
        let grid = self.workbook.sheets.get_mut(sheet)?;
        let anchor = grid.anchor_of(addr);
        if anchor != addr {
            log::debug!("write to {addr} redirected to merge anchor {anchor}");
        }
        grid.set_value(anchor, value);
        self.edits.entry(sheet).or_default().cells.insert(anchor);
        Some(anchor)
    }

    pub fn align(&mut self, sheet: usize, addr: CellAddr, alignment: Alignment) {
        let Some(grid) = self.grid(sheet) else {
            return;
        };
        let anchor = grid.anchor_of(addr);
        let edits = self.edits.entry(sheet).or_default();
        edits.cells.insert(anchor);
        edits.alignments.insert(anchor, alignment);
    }

    pub fn place_image(&mut self, sheet: usize, image: PlacedImage) {
        self.edits.entry(sheet).or_default().images.push(image);
    }

    pub fn is_dirty(&self) -> bool {
        self.edits.values().any(|e| !e.is_empty())
    }

    pub fn edits(&self) -> &BTreeMap<usize, SheetEdits> {
        &self.edits
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Serialize the filled workbook.
    pub fn save(&self) -> Result<Vec<u8>> {
        export::write_workbook(&self.workbook, &self.edits)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cell_ref::Span;

    fn addr(s: &str) -> CellAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_write_redirects_to_anchor() {
        let mut grid = Grid::new("S").with_dimension(10, 10);
        grid.add_merge(addr("B2"), Span::new(2, 3));
        let mut session = FillSession::new(Workbook::from_grids(vec![grid]));

        let anchor = session.write(0, addr("C3"), CellValue::Text("x".into()));
        assert_eq!(anchor, Some(addr("B2")));
        assert_eq!(session.existing_text(0, addr("D3")).as_deref(), Some("x"));
        assert!(session.grid(0).unwrap().is_empty_at(addr("C3")));
        assert!(session.edits()[&0].cells.contains(&addr("B2")));
    }

    #[test]
    fn test_clean_until_written() {
        let mut session = FillSession::new(Workbook::from_grids(vec![Grid::new("S")]));
        assert!(!session.is_dirty());
        assert_eq!(session.write(3, addr("A1"), CellValue::Bool(true)), None);
        assert!(!session.is_dirty());
        session.align(0, addr("A1"), Alignment::Center);
        assert!(session.is_dirty());
    }
}
