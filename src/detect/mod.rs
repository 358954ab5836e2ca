//! Structural detector: turns a sheet grid into sections of fillable fields.
//!
//! Known templates resolve to a registered, hand-authored section list
//! (override mode). Anything else runs the heuristic passes, in order:
//! header, basic info, checklists, tables, signatures, observations. Each
//! pass only appends; none removes or reorders what an earlier pass emitted.

mod basic_info;
mod checklist;
pub mod config;
mod header;
mod observations;
mod signatures;
mod tables;

pub use config::{DetectorConfig, KeywordPatterns};

use crate::cell_ref::CellAddr;
use crate::registry::{DetectionStrategy, SchemaRegistry};
use crate::types::{Grid, Section, SheetSchema, TemplateSchema, Workbook};

use config::fold;

/// The region of a sheet the heuristic passes look at.
pub(crate) struct ScanWindow<'a> {
    pub grid: &'a Grid,
    pub rows: u32,
    pub cols: u32,
}

/// A non-empty cell in the scan window.
pub(crate) struct ScannedCell {
    pub addr: CellAddr,
    /// Trimmed original text
    pub text: String,
    /// Folded text for keyword matching
    pub folded: String,
    pub merged: bool,
}

impl<'a> ScanWindow<'a> {
    pub fn new(grid: &'a Grid, config: &DetectorConfig) -> Self {
        Self {
            grid,
            rows: grid.row_count().min(config.max_scan_rows),
            cols: grid.col_count().min(config.max_scan_cols),
        }
    }

    pub fn contains(&self, addr: CellAddr) -> bool {
        addr.row >= 1 && addr.col >= 1 && addr.row <= self.rows && addr.col <= self.cols
    }

    /// Non-empty cells in row-major order. Merged content only lives on anchors.
    pub fn cells(&self) -> Vec<ScannedCell> {
        self.grid
            .cells()
            .filter(|(addr, _)| self.contains(*addr))
            .filter_map(|(addr, _)| {
                let cell = self.grid.get(addr)?;
                let text = cell.text()?;
                Some(ScannedCell {
                    addr,
                    folded: fold(&text),
                    text,
                    merged: cell.is_merged(),
                })
            })
            .collect()
    }

    /// First cell right of `addr`, skipping the rest of its merge.
    pub fn right_of(&self, addr: CellAddr) -> CellAddr {
        let end = self.grid.merge_region(addr).map_or(addr, |m| m.end());
        CellAddr::new(addr.row, end.col + 1)
    }

    /// First cell below `addr`, skipping the rest of its merge.
    pub fn below(&self, addr: CellAddr) -> CellAddr {
        let end = self.grid.merge_region(addr).map_or(addr, |m| m.end());
        CellAddr::new(end.row + 1, addr.col)
    }

    /// In the window and with no content on its anchor. Returns the anchor.
    pub fn empty_target(&self, addr: CellAddr) -> Option<CellAddr> {
        if !self.contains(addr) {
            return None;
        }
        let anchor = self.grid.anchor_of(addr);
        self.grid.is_empty_at(anchor).then_some(anchor)
    }
}

/// Run the heuristic passes over one sheet.
pub fn detect_sheet(grid: &Grid, config: &DetectorConfig) -> Vec<Section> {
    let window = ScanWindow::new(grid, config);
    let cells = window.cells();
    let mut sections = Vec::new();

    if config.detect_headers {
        sections.extend(header::detect(&window, &cells, config));
    }
    if config.detect_basic_info {
        sections.extend(basic_info::detect(&window, &cells, config));
    }
    if config.detect_checklists {
        sections.extend(checklist::detect(&window, &cells, config));
    }
    if config.detect_tables {
        sections.extend(tables::detect(&window, &cells, config));
    }
    if config.detect_signatures {
        sections.extend(signatures::detect(&window, &cells, config));
    }
    if config.detect_observations {
        sections.extend(observations::detect(&window, &cells, config));
    }

    log::debug!(
        "sheet '{}': {} sections from {} scanned cells",
        grid.name,
        sections.len(),
        cells.len()
    );
    sections
}

/// Resolves a template id to its schema, by registry override or heuristics.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    pub config: DetectorConfig,
    pub registry: SchemaRegistry,
}

impl Detector {
    pub fn new(config: DetectorConfig, registry: SchemaRegistry) -> Self {
        Self { config, registry }
    }

    /// Detector with default config and the built-in templates.
    pub fn builtin() -> Self {
        Self::new(DetectorConfig::default(), SchemaRegistry::builtin())
    }

    /// Produce the field schema for a template.
    ///
    /// Override sections apply to the first sheet; heuristic detection runs
    /// on every sheet. An empty result is legal, not an error.
    pub fn detect(&self, template_id: &str, workbook: &Workbook) -> TemplateSchema {
        let sheets = match self.registry.strategy_for(template_id) {
            DetectionStrategy::Override(sections) => {
                log::info!("template '{template_id}': using registered schema");
                workbook
                    .first_sheet()
                    .map(|grid| {
                        vec![SheetSchema {
                            sheet: grid.name.clone(),
                            sections,
                        }]
                    })
                    .unwrap_or_default()
            }
            DetectionStrategy::Heuristic => {
                log::info!("template '{template_id}': no registered schema, detecting heuristically");
                workbook
                    .sheets
                    .iter()
                    .map(|grid| SheetSchema {
                        sheet: grid.name.clone(),
                        sections: detect_sheet(grid, &self.config),
                    })
                    .collect()
            }
        };

        let schema = TemplateSchema {
            template_id: template_id.to_string(),
            sheets,
        };
        if schema.is_empty() {
            log::info!("template '{template_id}': no sections detected, wizard will be empty");
        }
        schema
    }
}
