use crate::cell_ref::CellAddr;
use crate::types::{Bounds, Field, FieldType, Section, SectionKind};

use super::{DetectorConfig, ScanWindow, ScannedCell};

const GENERAL_ROW_SPAN: u32 = 10;
const DEFAULT_ROW_SPAN: u32 = 5;

/// The first observations label of the sheet. A general (or merged) label
/// looks a few rows down for an empty merged block and writes into its
/// anchor; otherwise the field is the cell right under the label.
pub(super) fn detect(
    window: &ScanWindow<'_>,
    cells: &[ScannedCell],
    config: &DetectorConfig,
) -> Option<Section> {
    let keywords = &config.keywords;
    let cell = cells.iter().find(|c| keywords.is_observations(&c.folded))?;
    let grid = window.grid;

    let is_general = keywords.is_general(&cell.folded) || cell.merged;
    let mut row_span = if is_general {
        GENERAL_ROW_SPAN
    } else {
        DEFAULT_ROW_SPAN
    };

    let mut target = CellAddr::new(window.below(cell.addr).row, cell.addr.col);
    if is_general {
        let last_row = cell.addr.row + config.observations_lookahead;
        let block = grid
            .merges()
            .iter()
            .filter(|m| m.anchor.row > cell.addr.row && m.anchor.row <= last_row)
            .filter(|m| window.contains(m.anchor) && grid.is_empty_at(m.anchor))
            .min_by_key(|m| m.anchor);
        if let Some(block) = block {
            target = block.anchor;
            row_span = row_span.max(block.span.rows);
        }
    }

    if !grid.in_bounds(target) {
        log::debug!("observations label at {} has no row below it", cell.addr);
        return None;
    }

    let title = if is_general {
        "Observaciones Generales"
    } else {
        "Observaciones"
    };

    Some(
        Section::new("observations", SectionKind::Observations, title)
            .with_fields(vec![Field::new(
                format!("obs_general_{target}"),
                "Observaciones",
                FieldType::Textarea,
                target,
            )])
            .with_bounds(Bounds {
                start_row: cell.addr.row,
                end_row: cell.addr.row + row_span,
                start_col: cell.addr.col,
                end_col: grid.col_count().max(cell.addr.col),
            }),
    )
}
