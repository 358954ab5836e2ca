//! xlfill - fill spreadsheet form templates
//!
//! Turns a structured template (an inspection checklist, a work permit) into
//! a field schema, then writes collected values back into a copy of it:
//! - Heuristic detection of header, basic info, checklist, signature and
//!   observation sections, or a registered hand-authored schema
//! - Merge-aware writes with typed rules per field kind
//! - Signature pictures scaled to fit their cells
//! - Minimal-diff export: only touched parts of the package change
//!
//! # Usage (Rust)
//!
//! ```no_run
//! use xlfill::{assets::NoAssets, detect::Detector, render, types::FieldValues};
//!
//! # fn main() -> xlfill::error::Result<()> {
//! let data = std::fs::read("inspeccion.xlsx")?;
//! let workbook = xlfill::parser::parse(&data)?;
//! let schema = Detector::builtin().detect("inspeccion-herramientas", &workbook);
//!
//! let mut values = FieldValues::new();
//! values.set("basic_B5", "Ana Pérez");
//! let rendered = render::render(&workbook, &schema, &values, &NoAssets, &Default::default())?;
//! std::fs::write("lleno.xlsx", rendered.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod cell_ref;
pub mod detect;
pub mod drawings;
pub mod error;
mod export;
pub mod namespaces;
pub mod parser;
pub mod registry;
pub mod render;
pub mod types;
pub mod validation;
pub mod wizard;
pub mod xml_helpers;

use wasm_bindgen::prelude::*;

pub use export::{Alignment, PlacedImage, SheetEdits};
pub use types::*;

use assets::InlineAssets;
use detect::Detector;
use render::RenderOptions;

/// Parse `data` and produce the schema for `template_id`.
///
/// # Errors
/// Returns an error if the package cannot be parsed.
pub fn detect_bytes(data: &[u8], template_id: &str) -> error::Result<TemplateSchema> {
    let workbook = parser::parse(data)?;
    Ok(Detector::builtin().detect(template_id, &workbook))
}

/// Parse, detect and render in one call, with inline signature assets.
///
/// # Errors
/// Parse, schema-integrity and packaging errors; see [`render::render`].
pub fn fill_bytes(
    data: &[u8],
    template_id: &str,
    values: &FieldValues,
    signatures: &InlineAssets,
) -> error::Result<render::Rendered> {
    let workbook = parser::parse(data)?;
    let schema = Detector::builtin().detect(template_id, &workbook);
    render::render(&workbook, &schema, values, signatures, &RenderOptions::default())
}

/// Detect the fillable fields of a template and return the schema as JSON
///
/// # Arguments
/// * `data` - The raw bytes of the XLSX template
/// * `template_id` - Registered template id, or any other id for heuristic detection
///
/// # Errors
/// Returns an error if the XLSX file is invalid or cannot be parsed.
#[wasm_bindgen]
pub fn detect_template(data: &[u8], template_id: &str) -> Result<String, JsValue> {
    let schema = detect_bytes(data, template_id).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&schema)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Detect the fillable fields of a template and return the schema as a `JsValue`
///
/// This is more efficient than `detect_template` when the result will be
/// used directly in JavaScript.
///
/// # Errors
/// Returns an error if the XLSX file is invalid or cannot be parsed.
#[wasm_bindgen]
pub fn detect_template_to_js(data: &[u8], template_id: &str) -> Result<JsValue, JsValue> {
    let schema = detect_bytes(data, template_id).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&schema)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Fill a template and return the new XLSX bytes
///
/// # Arguments
/// * `values_json` - Form data (`sheets[].sections[].fields[]`) or a flat `{id: value}` map
/// * `signatures_json` - `{asset_id: "data:image/png;base64,..."}`
///
/// Skipped fields are logged, not returned.
///
/// # Errors
/// Returns an error for unreadable input or a schema that does not fit the workbook.
#[wasm_bindgen]
pub fn fill_template(
    data: &[u8],
    template_id: &str,
    values_json: &str,
    signatures_json: &str,
) -> Result<Vec<u8>, JsValue> {
    let values = FieldValues::from_json(values_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let signatures =
        InlineAssets::from_json(signatures_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let rendered = fill_bytes(data, template_id, &values, &signatures)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    for warning in &rendered.warnings {
        log::warn!("{warning}");
    }
    Ok(rendered.bytes)
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
