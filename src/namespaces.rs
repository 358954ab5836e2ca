//! XML namespace, relationship type and content type constants.
//!
//! Readers match relationship types loosely (transitional and strict variants
//! both occur in the wild); writers always emit the transitional forms.

// =============================================================================
// Spreadsheet namespaces
// =============================================================================

/// Main spreadsheet namespace (Transitional conformance)
pub const NS_SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Office document relationships namespace (the `r:` prefix)
pub const NS_OFFICE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

// =============================================================================
// Package namespaces
// =============================================================================

/// Relationships namespace
pub const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Content types namespace
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

// =============================================================================
// Drawing namespaces
// =============================================================================

/// DrawingML main namespace
pub const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// DrawingML spreadsheet drawing namespace
pub const NS_DRAWING_SPREADSHEET: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";

// =============================================================================
// Office document relationship types
// =============================================================================

/// Relationship type for worksheets
pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// Relationship type for styles
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Relationship type for workbook (from root .rels)
pub const REL_WORKBOOK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Relationship type for a sheet's drawing part
pub const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";

/// Relationship type for an image referenced from a drawing
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

// =============================================================================
// Content types
// =============================================================================

pub const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
pub const CT_DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";
pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Check if a relationship type is for worksheets.
pub fn is_worksheet_relationship(rel_type: &str) -> bool {
    rel_type == REL_WORKSHEET || rel_type.ends_with("/worksheet")
}

/// Check if a relationship type is for styles.
pub fn is_styles_relationship(rel_type: &str) -> bool {
    rel_type == REL_STYLES || rel_type.ends_with("/styles")
}

/// Check if a relationship type is for shared strings.
pub fn is_shared_strings_relationship(rel_type: &str) -> bool {
    rel_type.ends_with("/sharedStrings")
}

/// Check if a relationship type is for a drawing part.
pub fn is_drawing_relationship(rel_type: &str) -> bool {
    rel_type == REL_DRAWING || rel_type.ends_with("/drawing")
}

/// Check if a relationship type is for an image.
pub fn is_image_relationship(rel_type: &str) -> bool {
    rel_type == REL_IMAGE || rel_type.ends_with("/image")
}
