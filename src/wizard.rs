//! Engine-side helpers for the value-collection wizard.
//!
//! The wizard itself lives outside this crate. These functions derive its
//! steps from a schema and seed default values; nothing here reads the wall
//! clock, the caller passes one in.

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{FieldType, FieldValues, SectionKind, TemplateSchema, Value};

/// One wizard step: a section of one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardStep {
    /// `sheet_index * 100 + section_index`; stable across reorders of other sheets
    pub step_number: usize,
    pub sheet_index: usize,
    pub section_index: usize,
    pub section_id: String,
    pub title: String,
    pub optional: bool,
    pub field_count: usize,
}

/// Steps in sheet then section order.
pub fn steps(schema: &TemplateSchema) -> Vec<WizardStep> {
    schema
        .sheets
        .iter()
        .enumerate()
        .flat_map(|(sheet_index, sheet)| {
            sheet
                .sections
                .iter()
                .enumerate()
                .map(move |(section_index, section)| WizardStep {
                    step_number: sheet_index * 100 + section_index,
                    sheet_index,
                    section_index,
                    section_id: section.id.clone(),
                    title: format!("{} - {}", sheet.sheet, section.title),
                    optional: matches!(section.kind, SectionKind::Header | SectionKind::Observations),
                    field_count: section.fields.len(),
                })
        })
        .collect()
}

/// Seed every Date field without a value with `clock()`, as `YYYY-MM-DD`.
///
/// Returns how many fields were seeded. The clock is called at most once.
pub fn prefill_dates(
    schema: &TemplateSchema,
    values: &mut FieldValues,
    clock: impl Fn() -> NaiveDate,
) -> usize {
    let mut today: Option<String> = None;
    let mut seeded = 0;
    for field in schema.fields().filter(|f| f.field_type == FieldType::Date) {
        let has_value = values
            .get(&field.id)
            .and_then(|v| v.value.as_ref())
            .is_some_and(|v| !v.is_blank());
        if has_value {
            continue;
        }
        let date = today.get_or_insert_with(|| clock().format("%Y-%m-%d").to_string());
        values.set(field.id.clone(), date.clone());
        seeded += 1;
    }
    seeded
}

/// Answer every radio of a section with `option` (the "mark all" shortcut).
///
/// Radios that do not offer `option` are left alone. Checkboxes are checked
/// when `option` is the first option of the section's radios (the "yes"
/// column) and cleared otherwise. Returns how many fields were set.
pub fn quick_fill(
    schema: &TemplateSchema,
    section_id: &str,
    values: &mut FieldValues,
    option: &str,
) -> usize {
    let Some(section) = schema
        .sheets
        .iter()
        .flat_map(|s| &s.sections)
        .find(|s| s.id == section_id)
    else {
        log::debug!("quick fill: no section '{section_id}'");
        return 0;
    };

    let is_yes = section
        .fields
        .iter()
        .find(|f| f.field_type == FieldType::Radio)
        .and_then(|f| f.options.first())
        .is_some_and(|first| first == option);

    let mut count = 0;
    for field in &section.fields {
        match field.field_type {
            FieldType::Radio if field.options.iter().any(|o| o == option) => {
                values.set(field.id.clone(), option);
                count += 1;
            }
            FieldType::Checkbox => {
                values.set(field.id.clone(), Value::Bool(is_yes));
                count += 1;
            }
            _ => {}
        }
    }
    count
}
