//! Test fixtures for generating template XLSX files in memory.
//!
//! Builders write a real zip+XML package with shared strings, merges, column
//! widths and row heights, which is all the detector and renderer look at.
//!
//! # Example
//!
//! ```ignore
//! use fixtures::{SheetBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Inspección")
//!             .cell("A5", "NOMBRE:")
//!             .merge("A39:L40"),
//!     )
//!     .build();
//!
//! let workbook = xlfill::parser::parse(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Style indices available in every fixture's styles part.
pub const STYLE_DEFAULT: u32 = 0;
/// Thin border on all sides
pub const STYLE_BORDERED: u32 = 1;
/// Bold font, right aligned
pub const STYLE_LABEL: u32 = 2;

// ============================================================================
// Cell values
// ============================================================================

/// Cell value types for the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: Option<CellValue>,
    pub style: Option<u32>,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub col_widths: Vec<(u32, u32, f64)>,
    pub row_heights: Vec<(u32, f64)>,
    /// Raw XML of a drawing part already attached to the sheet
    pub drawing: Option<String>,
    /// Raw XML inserted after `<pageMargins>` (e.g. `<tableParts .../>`)
    pub trailing_xml: String,
}

impl SheetBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: Vec::new(),
            merges: Vec::new(),
            col_widths: Vec::new(),
            row_heights: Vec::new(),
            drawing: None,
            trailing_xml: String::new(),
        }
    }

    /// Add a cell value.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(mut self, cell_ref: &str, value: V) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: Some(value.into()),
            style: None,
        });
        self
    }

    /// Add a cell value with one of the fixture style indices.
    #[must_use]
    pub fn styled<V: Into<CellValue>>(mut self, cell_ref: &str, value: V, style: u32) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: Some(value.into()),
            style: Some(style),
        });
        self
    }

    /// An empty cell that only carries a style (a bordered answer box).
    #[must_use]
    pub fn blank(mut self, cell_ref: &str, style: u32) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: None,
            style: Some(style),
        });
        self
    }

    /// Add a merge range (e.g. "A39:L40").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    /// Set the width of columns `min..=max` in character units.
    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push((min, max, width));
        self
    }

    /// Set a row height in points.
    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push((row, height));
        self
    }

    /// Attach an existing drawing part.
    #[must_use]
    pub fn drawing(mut self, xml: &str) -> Self {
        self.drawing = Some(xml.to_string());
        self
    }

    #[must_use]
    pub fn trailing(mut self, xml: &str) -> Self {
        self.trailing_xml.push_str(xml);
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for a complete XLSX package.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Build the XLSX file as bytes.
    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Some(CellValue::String(s)) = &cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut write = |name: &str, content: &str| {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        write("[Content_Types].xml", &generate_content_types(&self.sheets));
        write("_rels/.rels", GENERATED_ROOT_RELS);
        write("xl/workbook.xml", &generate_workbook(&self.sheets));
        write("xl/_rels/workbook.xml.rels", &generate_workbook_rels(self.sheets.len()));
        write("xl/styles.xml", GENERATED_STYLES);
        write("xl/sharedStrings.xml", &generate_shared_strings(&shared_strings));

        for (i, sheet) in self.sheets.iter().enumerate() {
            let n = i + 1;
            write(
                &format!("xl/worksheets/sheet{n}.xml"),
                &generate_sheet_xml(sheet, &shared_strings),
            );
            if let Some(drawing) = &sheet.drawing {
                write(
                    &format!("xl/worksheets/_rels/sheet{n}.xml.rels"),
                    &format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing{n}.xml"/></Relationships>"#
                    ),
                );
                write(&format!("xl/drawings/drawing{n}.xml"), drawing);
            }
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

// ============================================================================
// Part generators
// ============================================================================

const GENERATED_ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const GENERATED_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="2"><border><left/><right/><top/><bottom/><diagonal/></border><border><left style="thin"/><right style="thin"/><top style="thin"/><bottom style="thin"/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1" applyAlignment="1"><alignment horizontal="right"/></xf></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_content_types(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
    );
    for (i, sheet) in sheets.iter().enumerate() {
        let n = i + 1;
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        if sheet.drawing.is_some() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/drawings/drawing{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawing+xml"/>"#
            ));
        }
    }
    xml.push_str("</Types>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 2
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in strings {
        xml.push_str(&format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(s)));
    }
    xml.push_str("</sst>");
    xml
}

/// (row, col) from "B12", both 1-based.
fn parse_cell_ref(cell_ref: &str) -> (u32, u32) {
    let letters: String = cell_ref.chars().take_while(char::is_ascii_alphabetic).collect();
    let digits: String = cell_ref.chars().skip(letters.len()).collect();
    let col = letters
        .to_ascii_uppercase()
        .bytes()
        .fold(0u32, |acc, b| acc * 26 + u32::from(b - b'A' + 1));
    (digits.parse().unwrap(), col)
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for (min, max, width) in &sheet.col_widths {
            xml.push_str(&format!(
                r#"<col min="{min}" max="{max}" width="{width}" customWidth="1"/>"#
            ));
        }
        xml.push_str("</cols>");
    }

    let mut cells: Vec<((u32, u32), &CellEntry)> = sheet
        .cells
        .iter()
        .map(|c| (parse_cell_ref(&c.cell_ref), c))
        .collect();
    cells.sort_by_key(|(rc, _)| *rc);

    let mut rows: Vec<u32> = cells.iter().map(|((r, _), _)| *r).collect();
    rows.extend(sheet.row_heights.iter().map(|(r, _)| *r));
    rows.sort_unstable();
    rows.dedup();

    xml.push_str("<sheetData>");
    for row in rows {
        xml.push_str(&format!(r#"<row r="{row}""#));
        if let Some((_, ht)) = sheet.row_heights.iter().find(|(r, _)| *r == row) {
            xml.push_str(&format!(r#" ht="{ht}" customHeight="1""#));
        }
        xml.push('>');
        for (_, cell) in cells.iter().filter(|((r, _), _)| *r == row) {
            xml.push_str(&format!(r#"<c r="{}""#, cell.cell_ref));
            if let Some(s) = cell.style {
                xml.push_str(&format!(r#" s="{s}""#));
            }
            match &cell.value {
                None => xml.push_str("/>"),
                Some(CellValue::String(s)) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap();
                    xml.push_str(&format!(r#" t="s"><v>{idx}</v></c>"#));
                }
                Some(CellValue::Number(n)) => xml.push_str(&format!("><v>{n}</v></c>")),
                Some(CellValue::Boolean(b)) => {
                    xml.push_str(&format!(r#" t="b"><v>{}</v></c>"#, u8::from(*b)));
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for merge in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{merge}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str(
        r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#,
    );
    if sheet.drawing.is_some() {
        xml.push_str(r#"<drawing r:id="rId1"/>"#);
    }
    xml.push_str(&sheet.trailing_xml);
    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Ready-made templates
// ============================================================================

/// Tool names of the tool inspection template, rows 10..=38.
pub const TOOLS: [&str; 29] = [
    "Martillo", "Alicate", "Destornillador de pala", "Destornillador de estrella", "Llave inglesa",
    "Llave de tubo", "Juego de llaves mixtas", "Segueta", "Cincel", "Pinza voltiamperimétrica",
    "Taladro", "Pulidora", "Extensión eléctrica", "Flexómetro", "Nivel",
    "Escalera", "Arnés", "Eslinga", "Casco", "Guantes dieléctricos",
    "Gafas de seguridad", "Botas dieléctricas", "Cortafrío", "Pelacables", "Ponchadora",
    "Tijeras", "Linterna", "Multímetro", "Cinta aislante",
];

/// The tool inspection template with the layout the built-in schema expects.
pub fn herramientas_template() -> Vec<u8> {
    let mut sheet = SheetBuilder::new("INSPECCION HERRAMIENTAS")
        .cell("A1", "INSPECCIÓN DE HERRAMIENTAS MANUALES Y ELÉCTRICAS")
        .merge("A1:L2")
        .cell("H3", "VERSION: 02")
        .styled("A5", "REALIZADO POR:", STYLE_LABEL)
        .styled("A6", "CARGO:", STYLE_LABEL)
        .styled("F5", "LUGAR:", STYLE_LABEL)
        .styled("F6", "FECHA:", STYLE_LABEL)
        .cell("A9", "DESCRIPCION")
        .cell("F9", "SI")
        .cell("G9", "NO")
        .cell("H9", "N/A")
        .cell("I9", "OBSERVACIONES")
        .merge("A39:L40")
        .cell("A41", "OBSERVACIONES GENERALES")
        .merge("A42:L44")
        .col_width(1, 5, 12.0)
        .col_width(6, 8, 6.0)
        .col_width(9, 12, 14.0)
        .row_height(39, 30.0)
        .row_height(40, 30.0);
    for (row, tool) in (10u32..).zip(TOOLS) {
        sheet = sheet
            .cell(&format!("A{row}"), tool)
            .blank(&format!("F{row}"), STYLE_BORDERED)
            .blank(&format!("G{row}"), STYLE_BORDERED)
            .blank(&format!("H{row}"), STYLE_BORDERED);
    }
    XlsxBuilder::new().sheet(sheet).build()
}

/// A template no schema is registered for: heuristic detection only.
pub fn generic_template() -> Vec<u8> {
    let sheet = SheetBuilder::new("Permiso")
        .cell("A1", "PERMISO DE TRABAJO EN ALTURAS")
        .merge("A1:H1")
        .cell("A3", "NOMBRE:")
        .cell("E3", "FECHA:")
        .cell("A4", "CARGO:")
        .cell("A6", "ITEM")
        .cell("E6", "SI")
        .cell("F6", "NO")
        .cell("G6", "N/A")
        .cell("A7", "Área demarcada")
        .cell("A8", "Equipos inspeccionados")
        .cell("A9", "Personal capacitado")
        .cell("A10", "Rescate disponible")
        .cell("A11", "Clima adecuado")
        .cell("A16", "FIRMA RESPONSABLE")
        .merge("A17:D18")
        .cell("A20", "OBSERVACIONES GENERALES")
        .merge("A21:H24");
    XlsxBuilder::new().sheet(sheet).build()
}

/// Blank PNG of `width` x `height` pixels.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::new(width, height);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
