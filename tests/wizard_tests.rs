//! Wizard flow tests: steps, date prefill, quick fill and step validation,
//! ending in a render of the collected values.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use chrono::NaiveDate;
use common::{assert_cell_empty, assert_cell_text, parse};
use fixtures::{herramientas_template, png};
use xlfill::assets::InlineAssets;
use xlfill::detect::Detector;
use xlfill::render::{self, RenderOptions};
use xlfill::types::{FieldValues, Section, TemplateSchema};
use xlfill::validation::{all_signatures_selected, validate_step};
use xlfill::wizard::{prefill_dates, quick_fill, steps};

fn schema() -> TemplateSchema {
    Detector::builtin().detect("inspeccion-herramientas", &parse(&herramientas_template()))
}

fn section<'s>(schema: &'s TemplateSchema, id: &str) -> &'s Section {
    schema.sheets[0].sections.iter().find(|s| s.id == id).unwrap()
}

#[test]
fn test_one_step_per_section() {
    let steps = steps(&schema());
    let ids: Vec<&str> = steps.iter().map(|s| s.section_id.as_str()).collect();
    assert_eq!(ids, ["basic_info", "checklist", "signatures", "observations"]);
    assert_eq!(steps[1].step_number, 1);
    assert_eq!(steps[1].field_count, 58);
    assert_eq!(steps[0].title, "INSPECCION HERRAMIENTAS - Información Básica");
    let optional: Vec<bool> = steps.iter().map(|s| s.optional).collect();
    assert_eq!(optional, [false, false, false, true]);
}

#[test]
fn test_prefill_keeps_entered_dates() {
    let schema = schema();
    let mut values = FieldValues::new();
    let today = || NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

    assert_eq!(prefill_dates(&schema, &mut values, today), 1);
    assert_eq!(
        values.writable("basic_F6").map(xlfill::Value::as_text).as_deref(),
        Some("2025-03-07")
    );

    values.set("basic_F6", "2024-12-31");
    assert_eq!(prefill_dates(&schema, &mut values, today), 0);
    assert_eq!(
        values.writable("basic_F6").map(xlfill::Value::as_text).as_deref(),
        Some("2024-12-31")
    );
}

#[test]
fn test_basic_info_blocks_until_complete() {
    let schema = schema();
    let basic = section(&schema, "basic_info");
    let mut values = FieldValues::new();

    let result = validate_step(basic, &values);
    assert!(!result.valid);
    assert_eq!(result.field_id.as_deref(), Some("basic_A5"));
    assert_eq!(result.message.as_deref(), Some("Complete el campo \"REALIZADO POR\"."));

    values.set("basic_A5", "Ana");
    values.set("basic_A6", "Técnica");
    values.set("basic_F5", "Sede");
    values.set("basic_F6", "2025-03-07");
    assert!(validate_step(basic, &values).valid);
}

#[test]
fn test_checklist_needs_every_item() {
    let schema = schema();
    let checklist = section(&schema, "checklist");
    let mut values = FieldValues::new();

    assert_eq!(quick_fill(&schema, "checklist", &mut values, "SI"), 29);
    assert!(validate_step(checklist, &values).valid);

    values.set("item_20", "QUIZÁS");
    let result = validate_step(checklist, &values);
    assert!(!result.valid);
    assert_eq!(result.field_id.as_deref(), Some("item_20"));
}

#[test]
fn test_quick_fill_unknown_section_does_nothing() {
    let mut values = FieldValues::new();
    assert_eq!(quick_fill(&schema(), "no-existe", &mut values, "SI"), 0);
    assert!(values.is_empty());
}

#[test]
fn test_observations_never_block() {
    let schema = schema();
    assert!(validate_step(section(&schema, "observations"), &FieldValues::new()).valid);
}

#[test]
fn test_signature_step() {
    let schema = schema();
    let signatures = section(&schema, "signatures");
    let mut values = FieldValues::new();

    let result = validate_step(signatures, &values);
    assert_eq!(
        result.message.as_deref(),
        Some("Seleccione la firma \"Firma del Inspector\".")
    );
    assert!(!all_signatures_selected(&schema, &values));

    values.set("sig_A39", "firma-ana");
    assert!(validate_step(signatures, &values).valid);
    assert!(all_signatures_selected(&schema, &values));
}

#[test]
fn test_full_wizard_then_render() {
    let data = herramientas_template();
    let workbook = parse(&data);
    let schema = Detector::builtin().detect("inspeccion-herramientas", &workbook);

    let mut values = FieldValues::new();
    values.set("basic_A5", "Ana");
    values.set("basic_A6", "Técnica");
    values.set("basic_F5", "Sede");
    prefill_dates(&schema, &mut values, || NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
    quick_fill(&schema, "checklist", &mut values, "SI");
    values.set("item_11", "NO");
    values.set("sig_A39", "firma-ana");
    assert!(steps(&schema)
        .iter()
        .all(|s| validate_step(&schema.sheets[0].sections[s.section_index], &values).valid));

    let mut assets = InlineAssets::new();
    assets.insert_bytes("firma-ana", "Ana", png(120, 60)).unwrap();
    let rendered =
        render::render(&workbook, &schema, &values, &assets, &RenderOptions::default()).unwrap();
    assert!(rendered.warnings.is_empty(), "{:?}", rendered.warnings);
    assert_eq!(rendered.fields_written, 4 + 29 + 1);

    let out = parse(&rendered.bytes);
    assert_cell_text(&out, "F6", "FECHA: 07/03/2025");
    for row in 10..=38 {
        if row == 11 {
            assert_cell_empty(&out, "F11");
            assert_cell_text(&out, "G11", "X");
        } else {
            assert_cell_text(&out, &format!("F{row}"), "X");
        }
    }
}
