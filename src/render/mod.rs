//! Fill renderer.
//!
//! `render` takes a parsed workbook, a template schema and the collected
//! values and produces a filled `.xlsx`:
//!
//! 1. Validate the schema against the sheets (out-of-range cells and broken
//!    option mappings abort the call).
//! 2. Resolve signature assets in parallel into a per-call cache.
//! 3. Apply fields in schema order on a private copy of the grid.
//! 4. Export: patch the source package, or synthesize one.
//!
//! Per-field problems never abort; they come back as [`RenderWarning`]s.

pub mod placement;
mod resolve;
mod session;
pub mod text;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::SignatureResolver;
use crate::cell_ref::CellAddr;
use crate::error::{FillError, Result};
use crate::export::{Alignment, PlacedImage};
use crate::types::{
    CellValue, Field, FieldBehavior, FieldType, FieldValues, PlacementTarget, TemplateSchema, Value,
    Workbook,
};

pub use placement::Placement;
pub use resolve::{requested_assets, resolve_all, AssetCache};
pub use session::FillSession;

/// Rendering knobs. Defaults match the shipped templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Written into the chosen option cell of a radio field
    pub radio_marker: String,
    /// Written into a ticked checkbox cell
    pub check_marker: String,
    /// chrono format for non-decomposed dates
    pub date_format: String,
    pub center_markers: bool,
    pub wrap_textareas: bool,
    pub px_per_width_unit: f64,
    pub px_per_point: f64,
    /// Share of the container a signature may cover
    pub fill_ratio: f64,
    pub emu_per_px: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            radio_marker: "X".to_string(),
            check_marker: "X".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            center_markers: true,
            wrap_textareas: true,
            px_per_width_unit: 7.5,
            px_per_point: 1.33,
            fill_ratio: 0.85,
            emu_per_px: 9525.0,
        }
    }
}

impl RenderOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A field that was skipped; the rest of the document is still rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderWarning {
    UnknownFieldId {
        field_id: String,
    },
    MalformedRadioOptionValue {
        field_id: String,
        value: String,
    },
    SignatureResolutionFailed {
        field_id: String,
        asset_id: String,
        reason: String,
    },
    SheetMissing {
        sheet: String,
    },
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFieldId { field_id } => write!(f, "value for unknown field '{field_id}' ignored"),
            Self::MalformedRadioOptionValue { field_id, value } => {
                write!(f, "field '{field_id}': '{value}' is not one of its options")
            }
            Self::SignatureResolutionFailed {
                field_id,
                asset_id,
                reason,
            } => write!(f, "field '{field_id}': signature '{asset_id}' skipped: {reason}"),
            Self::SheetMissing { sheet } => write!(f, "workbook has no sheet named '{sheet}'"),
        }
    }
}

/// A filled document plus what was skipped on the way.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub warnings: Vec<RenderWarning>,
    /// Fields that changed the document
    pub fields_written: usize,
}

/// Check every field against its sheet before anything is written.
///
/// Sheets named by the schema but absent from the workbook are reported as
/// warnings; their fields are not checked.
pub fn validate_schema(workbook: &Workbook, schema: &TemplateSchema) -> Result<Vec<RenderWarning>> {
    let mut warnings = Vec::new();
    for sheet in &schema.sheets {
        let Some(grid) = workbook.sheet(&sheet.sheet) else {
            warnings.push(RenderWarning::SheetMissing {
                sheet: sheet.sheet.clone(),
            });
            continue;
        };
        for field in sheet.sections.iter().flat_map(|s| &s.fields) {
            check_mapping(field)?;
            if let Some(cell) = field.target_cells().into_iter().find(|c| !grid.in_bounds(*c)) {
                return Err(FillError::OutOfRangeCellReference {
                    field_id: field.id.clone(),
                    cell: cell.to_string(),
                    rows: grid.row_count(),
                    cols: grid.col_count(),
                });
            }
        }
    }
    Ok(warnings)
}

fn check_mapping(field: &Field) -> Result<()> {
    let malformed = |reason: String| FillError::MalformedOptionMapping {
        field_id: field.id.clone(),
        reason,
    };
    if field.field_type == FieldType::Radio {
        let targets = field
            .radio_targets()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| malformed("radio field has no option targets".to_string()))?;
        if let Some(option) = field.options.iter().find(|o| !targets.contains_key(o.as_str())) {
            return Err(malformed(format!("option '{option}' has no target cell")));
        }
    }
    if let Some(FieldBehavior::Replicate { plan }) = &field.behavior {
        if plan.targets().is_empty() {
            return Err(malformed("replicate plan has no targets".to_string()));
        }
    }
    Ok(())
}

/// Fill `workbook` with `values` according to `schema`.
///
/// # Errors
/// `OutOfRangeCellReference` and `MalformedOptionMapping` when the schema
/// does not fit the workbook; packaging errors from export.
pub fn render(
    workbook: &Workbook,
    schema: &TemplateSchema,
    values: &FieldValues,
    resolver: &dyn SignatureResolver,
    options: &RenderOptions,
) -> Result<Rendered> {
    let mut warnings = validate_schema(workbook, schema)?;

    let known: HashSet<&str> = schema.fields().map(|f| f.id.as_str()).collect();
    for value in values.iter().filter(|v| !known.contains(v.field_id.as_str())) {
        log::debug!("ignoring value for unknown field '{}'", value.field_id);
        warnings.push(RenderWarning::UnknownFieldId {
            field_id: value.field_id.clone(),
        });
    }

    let assets = resolve_all(schema, values, resolver);

    let mut filler = Filler {
        session: FillSession::new(workbook.clone()),
        options,
        assets: &assets,
        warnings,
        fields_written: 0,
    };
    for sheet in &schema.sheets {
        let Some(sheet_idx) = filler.session.sheet_index(&sheet.sheet) else {
            continue;
        };
        for field in sheet.sections.iter().flat_map(|s| &s.fields) {
            let Some(value) = values.writable(&field.id) else {
                continue;
            };
            if filler.apply(sheet_idx, field, value) {
                filler.fields_written += 1;
            }
        }
    }

    let bytes = filler.session.save()?;
    Ok(Rendered {
        bytes,
        warnings: filler.warnings,
        fields_written: filler.fields_written,
    })
}

/// The single mutation pass.
struct Filler<'a> {
    session: FillSession,
    options: &'a RenderOptions,
    assets: &'a AssetCache,
    warnings: Vec<RenderWarning>,
    fields_written: usize,
}

impl Filler<'_> {
    /// Returns whether anything was written.
    fn apply(&mut self, sheet: usize, field: &Field, value: &Value) -> bool {
        match field.field_type {
            FieldType::Radio => self.apply_radio(sheet, field, value),
            FieldType::Checkbox => {
                if !value.is_truthy() {
                    return false;
                }
                let marker = self.options.check_marker.clone();
                self.write_marker(sheet, field.cell_ref, marker)
            }
            FieldType::Date => self.apply_date(sheet, field, value),
            FieldType::Time => self
                .session
                .write(sheet, field.cell_ref, CellValue::Text(value.as_text().trim().to_string()))
                .is_some(),
            FieldType::Text | FieldType::Number | FieldType::Select => self.apply_text(sheet, field, value),
            FieldType::Textarea => {
                let written = self.apply_text(sheet, field, value);
                if written && self.options.wrap_textareas {
                    self.session.align(sheet, field.cell_ref, Alignment::TopLeftWrap);
                }
                written
            }
            FieldType::Signature => self.apply_signature(sheet, field, value),
        }
    }

    fn write_marker(&mut self, sheet: usize, addr: CellAddr, marker: String) -> bool {
        let Some(anchor) = self.session.write(sheet, addr, CellValue::Text(marker)) else {
            return false;
        };
        if self.options.center_markers {
            self.session.align(sheet, anchor, Alignment::Center);
        }
        true
    }

    fn apply_radio(&mut self, sheet: usize, field: &Field, value: &Value) -> bool {
        let choice = value.as_text();
        let choice = choice.trim();
        let Some(target) = field.radio_target_for(choice) else {
            log::debug!("field '{}': '{choice}' is not a registered option", field.id);
            self.warnings.push(RenderWarning::MalformedRadioOptionValue {
                field_id: field.id.clone(),
                value: choice.to_string(),
            });
            return false;
        };
        let marker = self.options.radio_marker.clone();
        self.write_marker(sheet, target, marker)
    }

    fn apply_date(&mut self, sheet: usize, field: &Field, value: &Value) -> bool {
        let raw = value.as_text();
        let parsed = text::parse_date(&raw);

        if let Some(FieldBehavior::DecomposeDate { day, month, year }) = &field.behavior {
            let Some(date) = parsed else {
                log::debug!("field '{}': '{raw}' is not a date, nothing decomposed", field.id);
                return false;
            };
            let (d, m, y) = text::decompose(date);
            self.session.write(sheet, *day, CellValue::Text(d));
            self.session.write(sheet, *month, CellValue::Text(m));
            return self.session.write(sheet, *year, CellValue::Number(y)).is_some();
        }

        let formatted = parsed.map_or_else(
            || raw.trim().to_string(),
            |date| text::format_date(date, &self.options.date_format),
        );
        let existing = self.session.existing_text(sheet, field.cell_ref);
        let text = text::append_after(existing.as_deref(), &formatted);
        self.session
            .write(sheet, field.cell_ref, CellValue::Text(text))
            .is_some()
    }

    fn apply_text(&mut self, sheet: usize, field: &Field, value: &Value) -> bool {
        let text = value.as_text();
        let text = text.trim();

        let cell_value = match &field.behavior {
            Some(FieldBehavior::AppendToLabel { label_text, suffix }) => {
                CellValue::Text(text::label_with_value(label_text, text, suffix.as_deref()))
            }
            Some(FieldBehavior::ReplaceExisting) => typed_value(field, value, text),
            _ => {
                let existing = self.session.existing_text(sheet, field.cell_ref);
                let has_label = existing
                    .as_deref()
                    .is_some_and(|e| !text::strip_placeholder(e).trim().is_empty());
                if has_label {
                    CellValue::Text(text::append_after(existing.as_deref(), text))
                } else {
                    typed_value(field, value, text)
                }
            }
        };
        self.session.write(sheet, field.cell_ref, cell_value).is_some()
    }

    fn apply_signature(&mut self, sheet: usize, field: &Field, value: &Value) -> bool {
        let asset_id = value.as_text().trim().to_string();
        let resolved = match self.assets.get(&asset_id) {
            Some(Ok(asset)) => Ok(Arc::clone(asset)),
            Some(Err(reason)) => Err(reason.clone()),
            None => Err("asset was not resolved".to_string()),
        };
        let asset = match resolved {
            Ok(asset) => asset,
            Err(reason) => {
                self.signature_failed(field, asset_id, reason);
                return false;
            }
        };

        let Some(grid) = self.session.grid(sheet) else {
            return false;
        };
        let targets = match &field.behavior {
            Some(FieldBehavior::Replicate { plan }) => plan.targets(),
            _ => {
                let (cell, span) = grid.merge_span_of(field.cell_ref.row, field.cell_ref.col);
                vec![PlacementTarget { cell, span }]
            }
        };
        let placements: Vec<Placement> = targets
            .into_iter()
            .map(|t| placement::place(grid, t, asset.aspect_ratio(), self.options))
            .collect();

        for placement in placements {
            self.session.place_image(
                sheet,
                PlacedImage {
                    media_key: asset_id.clone(),
                    name: field.label.clone(),
                    asset: Arc::clone(&asset),
                    placement,
                },
            );
        }
        true
    }

    fn signature_failed(&mut self, field: &Field, asset_id: String, reason: String) {
        log::warn!(
            "signature '{asset_id}' for field '{}' could not be resolved, skipping: {reason}",
            field.id
        );
        self.warnings.push(RenderWarning::SignatureResolutionFailed {
            field_id: field.id.clone(),
            asset_id,
            reason,
        });
    }
}

/// Numbers stay numeric in Number fields; everything else is text.
fn typed_value(field: &Field, value: &Value, text: &str) -> CellValue {
    if field.field_type != FieldType::Number {
        return CellValue::Text(text.to_string());
    }
    match value {
        Value::Number(n) => CellValue::Number(*n),
        _ => text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map_or_else(|| CellValue::Text(text.to_string()), CellValue::Number),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::assets::NoAssets;
    use crate::cell_ref::Span;
    use crate::types::{Grid, ReplicatePlan, Section, SectionKind, SheetSchema};

    fn addr(s: &str) -> CellAddr {
        s.parse().unwrap()
    }

    fn schema(fields: Vec<Field>) -> TemplateSchema {
        TemplateSchema {
            template_id: "t".into(),
            sheets: vec![SheetSchema {
                sheet: "S".into(),
                sections: vec![Section::new("s", SectionKind::BasicInfo, "S").with_fields(fields)],
            }],
        }
    }

    fn workbook() -> Workbook {
        Workbook::from_grids(vec![Grid::new("S").with_dimension(20, 10)])
    }

    #[test]
    fn test_out_of_range_is_fatal() {
        let s = schema(vec![Field::new("f", "F", FieldType::Text, addr("K1"))]);
        let err = validate_schema(&workbook(), &s).unwrap_err();
        assert!(matches!(
            err,
            FillError::OutOfRangeCellReference { ref cell, rows: 20, cols: 10, .. } if cell == "K1"
        ));
    }

    #[test]
    fn test_replicate_span_end_is_checked() {
        let field = Field::new("sig", "Firma", FieldType::Signature, addr("A18")).with_behavior(
            FieldBehavior::Replicate {
                plan: ReplicatePlan::Uniform {
                    column: 1,
                    rows: vec![10, 19],
                    span: Span::new(3, 1),
                },
            },
        );
        let err = validate_schema(&workbook(), &schema(vec![field])).unwrap_err();
        assert!(matches!(err, FillError::OutOfRangeCellReference { ref cell, .. } if cell == "A21"));
    }

    #[test]
    fn test_radio_without_targets_is_malformed() {
        let s = schema(vec![
            Field::new("r", "R", FieldType::Radio, addr("B2")).with_options(["SI", "NO"])
        ]);
        assert!(matches!(
            validate_schema(&workbook(), &s),
            Err(FillError::MalformedOptionMapping { .. })
        ));
    }

    #[test]
    fn test_missing_sheet_is_a_warning() {
        let mut s = schema(vec![]);
        s.sheets[0].sheet = "Otra".into();
        let warnings = validate_schema(&workbook(), &s).unwrap();
        assert_eq!(warnings, [RenderWarning::SheetMissing { sheet: "Otra".into() }]);
    }

    #[test]
    fn test_typed_numbers() {
        let field = Field::new("km", "KM", FieldType::Number, addr("A1"));
        assert_eq!(typed_value(&field, &Value::from("120500"), "120500"), CellValue::Number(120_500.0));
        assert_eq!(typed_value(&field, &Value::from("n/d"), "n/d"), CellValue::Text("n/d".into()));
        let text = Field::new("t", "T", FieldType::Text, addr("A1"));
        assert_eq!(typed_value(&text, &Value::from(7.0), "7"), CellValue::Text("7".into()));
    }

    #[test]
    fn test_unknown_values_warn() {
        let s = schema(vec![Field::new("a", "A", FieldType::Text, addr("A1"))]);
        let mut values = FieldValues::new();
        values.set("a", "hola");
        values.set("zzz", "nada");
        let rendered = render(&workbook(), &s, &values, &NoAssets, &RenderOptions::default()).unwrap();
        assert_eq!(rendered.fields_written, 1);
        assert_eq!(
            rendered.warnings,
            [RenderWarning::UnknownFieldId { field_id: "zzz".into() }]
        );
    }

    #[test]
    fn test_options_from_partial_json() {
        let options = RenderOptions::from_json(r#"{"radioMarker": "✓", "wrapTextareas": false}"#).unwrap();
        assert_eq!(options.radio_marker, "✓");
        assert!(!options.wrap_textareas);
        assert_eq!(options.date_format, "%d/%m/%Y");
    }
}
