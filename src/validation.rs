//! Step validation for the value-collection wizard.
//!
//! Works from the schema alone: no template id special-cases. Messages are
//! user-facing and stay in the templates' language.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{Field, FieldType, FieldValues, Section, SectionKind, TemplateSchema, Value};

/// Outcome of validating one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Field that blocked the step, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
            field_id: None,
        }
    }

    fn fail(field: Option<&Field>, message: String) -> Self {
        Self {
            valid: false,
            message: Some(message),
            field_id: field.map(|f| f.id.clone()),
        }
    }
}

/// The value the wizard holds for a field, completed or not.
fn raw<'v>(values: &'v FieldValues, field: &Field) -> Option<&'v Value> {
    values
        .get(&field.id)
        .and_then(|v| v.value.as_ref())
        .filter(|v| !v.is_blank())
}

/// A checkbox counts when checked; anything else when non-blank.
fn is_filled(values: &FieldValues, field: &Field) -> bool {
    match raw(values, field) {
        Some(v) if field.field_type == FieldType::Checkbox => v.is_truthy(),
        Some(_) => true,
        None => false,
    }
}

/// Same matching as the renderer: exact, then ASCII case-insensitive.
fn is_valid_option(field: &Field, value: &Value) -> bool {
    let text = value.as_text();
    let text = text.trim();
    field.radio_target_for(text).is_some()
        || field.options.iter().any(|o| o.eq_ignore_ascii_case(text))
}

/// Validate the values of one section.
///
/// - Header and Observations sections never block.
/// - Every required field must be non-blank.
/// - Every radio must be answered with one of its options.
/// - Checkboxes sharing a `group` need at least one checked box (or a
///   filled non-checkbox field of that group, such as an "other" text).
pub fn validate_step(section: &Section, values: &FieldValues) -> ValidationResult {
    if matches!(section.kind, SectionKind::Header | SectionKind::Observations) {
        return ValidationResult::ok();
    }

    for field in &section.fields {
        if field.field_type == FieldType::Radio {
            match raw(values, field) {
                Some(v) if is_valid_option(field, v) => {}
                _ => {
                    return ValidationResult::fail(
                        Some(field),
                        format!("Debe marcar todos los ítems. Falta: \"{}\".", field.label),
                    );
                }
            }
        } else if field.required && raw(values, field).is_none() {
            let message = if field.field_type == FieldType::Signature {
                format!("Seleccione la firma \"{}\".", field.label)
            } else {
                format!("Complete el campo \"{}\".", field.label)
            };
            return ValidationResult::fail(Some(field), message);
        }
    }

    let mut groups: BTreeMap<&str, Vec<&Field>> = BTreeMap::new();
    for field in &section.fields {
        if let Some(group) = field.group.as_deref() {
            groups.entry(group).or_default().push(field);
        }
    }
    for (group, fields) in groups {
        let has_checkbox = fields.iter().any(|f| f.field_type == FieldType::Checkbox);
        if has_checkbox && !fields.iter().any(|f| is_filled(values, f)) {
            return ValidationResult::fail(
                None,
                format!("Debe marcar al menos una opción de \"{group}\"."),
            );
        }
    }

    ValidationResult::ok()
}

/// Every signature field of every Signatures section has a value.
///
/// Signatures elsewhere (worker lists) are not considered.
pub fn all_signatures_selected(schema: &TemplateSchema, values: &FieldValues) -> bool {
    schema
        .sheets
        .iter()
        .flat_map(|s| &s.sections)
        .filter(|s| s.kind == SectionKind::Signatures)
        .flat_map(|s| &s.fields)
        .filter(|f| f.field_type == FieldType::Signature)
        .all(|f| raw(values, f).is_some())
}
