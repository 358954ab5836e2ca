use crate::types::{Bounds, Section, SectionKind};

use super::{DetectorConfig, ScanWindow, ScannedCell};

/// Title rows: a keyword from the header list, or any merged text, in the
/// first few rows. Informational only, so the section has no fields.
pub(super) fn detect(
    window: &ScanWindow<'_>,
    cells: &[ScannedCell],
    config: &DetectorConfig,
) -> Option<Section> {
    let rows: Vec<u32> = cells
        .iter()
        .filter(|c| c.addr.row <= config.header_rows)
        .filter(|c| c.merged || config.keywords.is_header(&c.folded))
        .map(|c| c.addr.row)
        .collect();

    let first = rows.iter().min()?;
    let last = rows.iter().max()?;

    Some(
        Section::new("header", SectionKind::Header, "Encabezado").with_bounds(Bounds::rows(
            *first,
            *last,
            window.grid.col_count(),
        )),
    )
}
