use std::collections::{BTreeMap, BTreeSet};

use crate::cell_ref::CellAddr;
use crate::types::{Bounds, Field, FieldBehavior, FieldType, Section, SectionKind};

use super::{DetectorConfig, ScanWindow, ScannedCell};

/// Option header cells ("SI", "NO", "N/A") of one row.
struct HeaderRow<'c> {
    row: u32,
    options: Vec<&'c ScannedCell>,
}

/// Group option header cells by row, keeping rows with at least two.
fn header_rows<'c>(cells: &'c [ScannedCell], config: &DetectorConfig) -> Vec<HeaderRow<'c>> {
    let mut by_row: BTreeMap<u32, Vec<&ScannedCell>> = BTreeMap::new();
    for cell in cells
        .iter()
        .filter(|c| config.keywords.is_checklist_option(&c.folded))
    {
        by_row.entry(cell.addr.row).or_default().push(cell);
    }
    by_row
        .into_iter()
        .filter(|(_, options)| options.len() >= 2)
        .map(|(row, options)| HeaderRow { row, options })
        .collect()
}

/// First column in `row` whose text matches `pred`.
fn find_column(cells: &[ScannedCell], row: u32, pred: impl Fn(&str) -> bool) -> Option<u32> {
    cells
        .iter()
        .filter(|c| c.addr.row == row)
        .find(|c| pred(&c.folded))
        .map(|c| c.addr.col)
}

/// SI/NO/N/A grids. Each non-empty item row below an option header becomes
/// one radio field (plus an observations textarea when the header has that
/// column). The walk ends after `empty_row_limit` consecutive empty item
/// rows, at the next option header row, or at the last row of the sheet.
pub(super) fn detect(
    window: &ScanWindow<'_>,
    cells: &[ScannedCell],
    config: &DetectorConfig,
) -> Vec<Section> {
    let keywords = &config.keywords;
    let grid = window.grid;
    let mut sections = Vec::new();

    let headers = header_rows(cells, config);
    let header_set: BTreeSet<u32> = headers.iter().map(|h| h.row).collect();

    for header in headers {
        let Some(item_col) = find_column(cells, header.row, |t| keywords.is_item_column(t)) else {
            log::debug!("option header at row {} has no item column", header.row);
            continue;
        };
        let obs_col = find_column(cells, header.row, |t| keywords.is_observations(t));

        let option_names: Vec<(String, u32)> = header
            .options
            .iter()
            .map(|c| (c.text.trim().to_uppercase(), c.addr.col))
            .collect();

        let mut fields = Vec::new();
        let first_row = header.row + 1;
        let mut last_row = first_row;
        let mut row = first_row;
        let mut empty_rows = 0;

        while empty_rows < config.empty_row_limit
            && row <= grid.row_count()
            && !header_set.contains(&row)
        {
            let item = grid.text(grid.anchor_of(CellAddr::new(row, item_col)));
            let Some(item) = item else {
                empty_rows += 1;
                row += 1;
                continue;
            };
            empty_rows = 0;

            let targets: BTreeMap<String, CellAddr> = option_names
                .iter()
                .map(|(name, col)| (name.clone(), CellAddr::new(row, *col)))
                .collect();
            let first_option_col = option_names.first().map_or(item_col, |(_, col)| *col);

            fields.push(
                Field::new(
                    format!("item_{row}_{item_col}"),
                    item,
                    FieldType::Radio,
                    CellAddr::new(row, first_option_col),
                )
                .with_options(option_names.iter().map(|(name, _)| name.clone()))
                .with_behavior(FieldBehavior::RadioTargets { targets }),
            );

            if let Some(obs_col) = obs_col {
                let obs = CellAddr::new(row, obs_col);
                fields.push(Field::new(
                    format!("obs_{obs}"),
                    "Observaciones",
                    FieldType::Textarea,
                    obs,
                ));
            }

            last_row = row;
            row += 1;
        }

        if fields.is_empty() {
            continue;
        }

        let cols = option_names.iter().map(|(_, col)| *col);
        let start_col = cols.clone().min().unwrap_or(item_col);
        let end_col = cols.max().unwrap_or(item_col);
        sections.push(
            Section::new(
                format!("checklist_{}", header.row),
                SectionKind::Checklist,
                format!("Checklist (Fila {})", header.row),
            )
            .with_fields(fields)
            .with_bounds(Bounds {
                start_row: first_row,
                end_row: last_row,
                start_col,
                end_col,
            }),
        );
    }

    sections
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{CellValue, Grid};

    fn addr(s: &str) -> CellAddr {
        s.parse().unwrap()
    }

    fn put(grid: &mut Grid, at: &str, value: &str) {
        grid.set_value(addr(at), CellValue::Text(value.into()));
    }

    fn run(grid: &Grid) -> Vec<Section> {
        let config = DetectorConfig::default();
        let window = ScanWindow::new(grid, &config);
        detect(&window, &window.cells(), &config)
    }

    #[test]
    fn test_header_without_item_column_is_ignored() {
        let mut grid = Grid::new("S").with_dimension(10, 6);
        put(&mut grid, "C2", "SI");
        put(&mut grid, "D2", "NO");
        put(&mut grid, "A3", "Martillo");
        assert!(run(&grid).is_empty());
    }

    #[test]
    fn test_single_option_cell_is_not_a_header() {
        let mut grid = Grid::new("S").with_dimension(10, 6);
        put(&mut grid, "A2", "ITEM");
        put(&mut grid, "C2", "SI");
        put(&mut grid, "A3", "Martillo");
        assert!(run(&grid).is_empty());
    }

    #[test]
    fn test_observation_column_pairs_textarea() {
        let mut grid = Grid::new("S").with_dimension(10, 6);
        put(&mut grid, "A2", "DESCRIPCION");
        put(&mut grid, "B2", "Si");
        put(&mut grid, "C2", "No");
        put(&mut grid, "D2", "Observaciones");
        put(&mut grid, "A3", "Martillo");
        put(&mut grid, "A4", "Alicate");

        let sections = run(&grid);
        assert_eq!(sections.len(), 1);
        let fields = &sections[0].fields;
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].id, "item_3_1");
        assert_eq!(fields[0].options, ["SI", "NO"]);
        assert_eq!(fields[0].cell_ref, addr("B3"));
        assert_eq!(fields[1].id, "obs_D3");
        assert_eq!(fields[1].field_type, FieldType::Textarea);
        assert_eq!(fields[2].label, "Alicate");
        let targets = fields[2].radio_targets().unwrap();
        assert_eq!(targets["NO"], addr("C4"));
    }

    #[test]
    fn test_walk_stops_at_next_header_row() {
        let mut grid = Grid::new("S").with_dimension(10, 4);
        for (row, label) in [(2, "ITEM"), (5, "ITEM")] {
            put(&mut grid, &format!("A{row}"), label);
            put(&mut grid, &format!("B{row}"), "SI");
            put(&mut grid, &format!("C{row}"), "NO");
        }
        for at in ["A3", "A4", "A6", "A7"] {
            put(&mut grid, at, "Martillo");
        }

        let sections = run(&grid);
        assert_eq!(sections.len(), 2);
        let ids: Vec<&str> = sections[0].fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["item_3_1", "item_4_1"]);
        assert_eq!(sections[0].bounds.unwrap().end_row, 4);
        assert_eq!(sections[1].fields[0].id, "item_6_1");
    }

    #[test]
    fn test_walk_may_pass_the_scan_window() {
        let mut grid = Grid::new("S").with_dimension(130, 6);
        put(&mut grid, "A98", "ITEM");
        put(&mut grid, "B98", "SI");
        put(&mut grid, "C98", "NO");
        for row in 99..=104 {
            put(&mut grid, &format!("A{row}"), "Item");
        }
        let sections = run(&grid);
        assert_eq!(sections[0].fields.len(), 6);
        assert_eq!(sections[0].bounds.unwrap().end_row, 104);
    }
}
