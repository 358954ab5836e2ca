use serde::{Deserialize, Serialize};

use super::Grid;

/// Where a parsed workbook came from; needed to patch it on export.
#[derive(Debug, Clone, Default)]
pub struct SourcePackage {
    pub bytes: Vec<u8>,
    /// Worksheet part path per sheet, parallel to `Workbook::sheets`.
    pub sheet_paths: Vec<String>,
    pub styles_path: Option<String>,
}

/// All sheets of a workbook as grids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub sheets: Vec<Grid>,
    #[serde(skip)]
    pub source: Option<SourcePackage>,
}

impl Workbook {
    /// An in-memory workbook with no source package. Export synthesizes one.
    pub fn from_grids(sheets: Vec<Grid>) -> Self {
        Self {
            sheets,
            source: None,
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Grid> {
        self.sheets.iter().find(|g| g.name == name)
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|g| g.name == name)
    }

    pub fn first_sheet(&self) -> Option<&Grid> {
        self.sheets.first()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|g| g.name.as_str()).collect()
    }
}
