//! Structured error types for xlfill.
//!
//! Only schema-integrity and I/O problems are errors. Per-field problems that a
//! render can survive are reported as [`crate::render::RenderWarning`] instead.

/// All fatal errors that can occur while detecting or filling a template.
#[derive(Debug, thiserror::Error)]
pub enum FillError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON (schema, values, config) error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// A field names a cell outside the bounds of its sheet.
    #[error("Field '{field_id}' targets {cell}, outside the sheet bounds ({rows} rows x {cols} cols)")]
    OutOfRangeCellReference {
        field_id: String,
        cell: String,
        rows: u32,
        cols: u32,
    },

    /// A field's option mapping (radio targets, replicate list) is unusable.
    #[error("Field '{field_id}' has a malformed option mapping: {reason}")]
    MalformedOptionMapping { field_id: String, reason: String },

    /// Input is not a zip+XML spreadsheet (e.g. legacy `.xls`).
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A named sheet does not exist in the workbook.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Image encoding/decoding error.
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FillError>;

impl From<quick_xml::events::attributes::AttrError> for FillError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(quick_xml::Error::InvalidAttr(e))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<FillError> for wasm_bindgen::JsValue {
    fn from(e: FillError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
