use crate::types::{Bounds, Field, FieldType, Section, SectionKind};

use super::{DetectorConfig, ScanWindow, ScannedCell};

/// "Firma" labels. The signature goes in the empty cell below the label,
/// else the empty cell to its right.
pub(super) fn detect(
    window: &ScanWindow<'_>,
    cells: &[ScannedCell],
    config: &DetectorConfig,
) -> Option<Section> {
    let mut fields = Vec::new();
    let mut min_row = u32::MAX;
    let mut max_row = 0;

    for cell in cells
        .iter()
        .filter(|c| config.keywords.is_signature(&c.folded))
    {
        let target = window
            .empty_target(window.below(cell.addr))
            .or_else(|| window.empty_target(window.right_of(cell.addr)));
        let Some(target) = target else {
            continue;
        };

        fields.push(
            Field::new(
                format!("sig_{target}"),
                cell.text.clone(),
                FieldType::Signature,
                target,
            )
            .required(),
        );
        min_row = min_row.min(target.row);
        max_row = max_row.max(target.row);
    }

    if fields.is_empty() {
        return None;
    }

    Some(
        Section::new("signatures", SectionKind::Signatures, "Firmas")
            .with_fields(fields)
            .with_bounds(Bounds::rows(min_row, max_row, window.grid.col_count())),
    )
}
