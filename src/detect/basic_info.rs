use std::collections::BTreeSet;

use crate::types::{Bounds, Field, Section, SectionKind};

use super::{DetectorConfig, ScanWindow, ScannedCell};

/// Labels like "NOMBRE:" or "FECHA:". The fillable cell is the empty one
/// right of the label, else the empty one below it. A cell claimed by an
/// earlier label is not offered twice.
pub(super) fn detect(
    window: &ScanWindow<'_>,
    cells: &[ScannedCell],
    config: &DetectorConfig,
) -> Option<Section> {
    let keywords = &config.keywords;
    let mut fields = Vec::new();
    let mut claimed = BTreeSet::new();
    let mut min_row = u32::MAX;
    let mut max_row = 0;

    for cell in cells {
        if !cell.folded.contains(':') || !keywords.is_basic_info_label(&cell.folded) {
            continue;
        }
        if keywords.is_decorative(&cell.folded) {
            continue;
        }

        let target = window
            .empty_target(window.right_of(cell.addr))
            .or_else(|| window.empty_target(window.below(cell.addr)));
        let Some(target) = target else {
            log::warn!(
                "label '{}' at {} has no empty neighbour; not offered as a field",
                cell.text,
                cell.addr
            );
            continue;
        };
        if !claimed.insert(target) {
            log::warn!(
                "label '{}' at {} points at {target}, already taken by another label",
                cell.text,
                cell.addr
            );
            continue;
        }

        let label = cell.text.replacen(':', "", 1).trim().to_string();
        fields.push(
            Field::new(
                format!("basic_{target}"),
                label,
                keywords.classify(&cell.folded),
                target,
            )
            .required(),
        );
        min_row = min_row.min(cell.addr.row);
        max_row = max_row.max(cell.addr.row);
    }

    if fields.is_empty() {
        return None;
    }

    Some(
        Section::new("basic_info", SectionKind::BasicInfo, "Información Básica")
            .with_fields(fields)
            .with_bounds(Bounds::rows(min_row, max_row, window.grid.col_count())),
    )
}
