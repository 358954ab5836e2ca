//! Streaming worksheet patch.
//!
//! Rewrites only the `<c>` elements of touched cells inside `<sheetData>`;
//! every other byte of the part is passed through. Missing rows and cells
//! are inserted in row/column order. Written strings are inline strings, so
//! the shared string table never changes.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::cell_ref::{parse_cell_ref, CellAddr};
use crate::error::{FillError, Result};
use crate::namespaces::NS_OFFICE_RELATIONSHIPS;
use crate::types::{format_number, CellValue};
use crate::xml_helpers::{attr_string, attr_u32, needs_space_preserve, with_attr, xml_escape};

/// New content for one cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CellPatch {
    pub addr: CellAddr,
    pub value: Option<CellValue>,
    pub style: Option<u32>,
}

/// Worksheet children that must come after `<drawing>`.
const AFTER_DRAWING: &[&[u8]] = &[
    b"legacyDrawing",
    b"legacyDrawingHF",
    b"drawingHF",
    b"picture",
    b"oleObjects",
    b"controls",
    b"webPublishItems",
    b"tableParts",
    b"extLst",
];

fn prefix_of(name: &[u8]) -> Option<String> {
    let name = std::str::from_utf8(name).ok()?;
    name.split_once(':').map(|(p, _)| p.to_string())
}

fn tag(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

/// Serialize one patched cell.
pub(crate) fn cell_xml(prefix: Option<&str>, patch: &CellPatch) -> String {
    let c = tag(prefix, "c");
    let mut out = format!("<{c} r=\"{}\"", patch.addr);
    if let Some(style) = patch.style {
        out.push_str(&format!(" s=\"{style}\""));
    }
    match &patch.value {
        None => out.push_str("/>"),
        Some(CellValue::Number(n)) => {
            let v = tag(prefix, "v");
            out.push_str(&format!("><{v}>{}</{v}></{c}>", format_number(*n)));
        }
        Some(CellValue::Bool(b)) => {
            let v = tag(prefix, "v");
            out.push_str(&format!(" t=\"b\"><{v}>{}</{v}></{c}>", u8::from(*b)));
        }
        Some(other) => {
            let text = other.as_text();
            let (is, t) = (tag(prefix, "is"), tag(prefix, "t"));
            let space = if needs_space_preserve(&text) {
                " xml:space=\"preserve\""
            } else {
                ""
            };
            out.push_str(&format!(
                " t=\"inlineStr\"><{is}><{t}{space}>{}</{t}></{is}></{c}>",
                xml_escape(&text)
            ));
        }
    }
    out
}

/// Patches left for `row`, consumed from `idx`.
fn take_row<'p>(patches: &'p [CellPatch], idx: &mut usize, row: u32) -> &'p [CellPatch] {
    let start = *idx;
    while patches.get(*idx).is_some_and(|p| p.addr.row == row) {
        *idx += 1;
    }
    patches.get(start..*idx).unwrap_or_default()
}

fn write_raw<W: Write>(writer: &mut Writer<W>, raw: &str) -> Result<()> {
    writer.get_mut().write_all(raw.as_bytes())?;
    Ok(())
}

/// Whole new rows for every patch before `limit` (or all, for `None`).
fn write_rows_before<W: Write>(
    writer: &mut Writer<W>,
    prefix: Option<&str>,
    patches: &[CellPatch],
    idx: &mut usize,
    limit: Option<u32>,
) -> Result<()> {
    while let Some(next) = patches.get(*idx) {
        let row = next.addr.row;
        if limit.is_some_and(|limit| row >= limit) {
            break;
        }
        let row_tag = tag(prefix, "row");
        let mut xml = format!("<{row_tag} r=\"{row}\">");
        for patch in take_row(patches, idx, row) {
            xml.push_str(&cell_xml(prefix, patch));
        }
        xml.push_str(&format!("</{row_tag}>"));
        write_raw(writer, &xml)?;
    }
    Ok(())
}

/// Copy an element whose start tag was just read, through its end tag.
fn copy_element<W: Write>(
    reader: &mut Reader<&[u8]>,
    writer: &mut Writer<W>,
    start: BytesStart<'_>,
) -> Result<()> {
    writer.write_event(Event::Start(start))?;
    let mut depth = 1usize;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(FillError::Parse("worksheet ends inside an element".to_string())),
            _ => {}
        }
        writer.write_event(event)?;
        if depth == 0 {
            return Ok(());
        }
    }
}

/// Patch a worksheet part.
///
/// `patches` must be sorted row-major with one entry per address. With
/// `drawing_rid`, a `<drawing r:id>` element is added at its schema position.
pub(crate) fn patch_sheet_xml(
    original: &[u8],
    patches: &[CellPatch],
    drawing_rid: Option<&str>,
) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(original);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(original.len() + patches.len() * 64));
    let mut buf = Vec::new();
    let mut idx = 0usize;
    let mut depth = 0usize;
    let mut root_prefix: Option<String> = None;
    let mut drawing_pending = drawing_rid;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(e) if depth == 0 => {
                root_prefix = prefix_of(e.name().as_ref());
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::Start(e) if depth == 1 && e.local_name().as_ref() == b"sheetData" => {
                let prefix = prefix_of(e.name().as_ref());
                let end_tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                writer.write_event(Event::Start(e))?;
                patch_sheet_data(&mut reader, &mut writer, prefix.as_deref(), patches, &mut idx)?;
                writer.write_event(Event::End(BytesEnd::new(end_tag)))?;
            }
            Event::Empty(e) if depth == 1 && e.local_name().as_ref() == b"sheetData" => {
                if idx < patches.len() {
                    let prefix = prefix_of(e.name().as_ref());
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    write_raw(&mut writer, &format!("<{name}>"))?;
                    write_rows_before(&mut writer, prefix.as_deref(), patches, &mut idx, None)?;
                    write_raw(&mut writer, &format!("</{name}>"))?;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::Start(e) => {
                if depth == 1 && AFTER_DRAWING.contains(&e.local_name().as_ref()) {
                    write_drawing(&mut writer, root_prefix.as_deref(), &mut drawing_pending)?;
                }
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                if depth == 1 && AFTER_DRAWING.contains(&e.local_name().as_ref()) {
                    write_drawing(&mut writer, root_prefix.as_deref(), &mut drawing_pending)?;
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                if depth == 1 {
                    write_drawing(&mut writer, root_prefix.as_deref(), &mut drawing_pending)?;
                }
                depth = depth.saturating_sub(1);
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    if idx < patches.len() {
        return Err(FillError::Parse("worksheet has no sheetData element".to_string()));
    }
    Ok(writer.into_inner())
}

fn write_drawing<W: Write>(
    writer: &mut Writer<W>,
    prefix: Option<&str>,
    pending: &mut Option<&str>,
) -> Result<()> {
    if let Some(rid) = pending.take() {
        let drawing = tag(prefix, "drawing");
        write_raw(
            writer,
            &format!(
                "<{drawing} xmlns:r=\"{NS_OFFICE_RELATIONSHIPS}\" r:id=\"{}\"/>",
                xml_escape(rid)
            ),
        )?;
    }
    Ok(())
}

/// Body of `<sheetData>`, consumed through its end tag (which the caller writes).
fn patch_sheet_data<W: Write>(
    reader: &mut Reader<&[u8]>,
    writer: &mut Writer<W>,
    prefix: Option<&str>,
    patches: &[CellPatch],
    idx: &mut usize,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut last_row = 0u32;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                let row = attr_u32(&e, b"r").unwrap_or(last_row + 1);
                last_row = row;
                write_rows_before(writer, prefix, patches, idx, Some(row))?;
                let cells = take_row(patches, idx, row);
                if cells.is_empty() {
                    copy_element(reader, writer, e)?;
                } else {
                    writer.write_event(Event::Start(with_attr(&e, "r", Some(&row.to_string()), &[b"spans"])))?;
                    patch_row(reader, writer, prefix, cells, row)?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let row = attr_u32(&e, b"r").unwrap_or(last_row + 1);
                last_row = row;
                write_rows_before(writer, prefix, patches, idx, Some(row))?;
                let cells = take_row(patches, idx, row);
                if cells.is_empty() {
                    writer.write_event(Event::Empty(e))?;
                } else {
                    let start = with_attr(&e, "r", Some(&row.to_string()), &[b"spans"]);
                    let end_tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    writer.write_event(Event::Start(start))?;
                    for cell in cells {
                        write_raw(writer, &cell_xml(prefix, cell))?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(end_tag)))?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => {
                write_rows_before(writer, prefix, patches, idx, None)?;
                return Ok(());
            }
            Event::Eof => return Err(FillError::Parse("unterminated sheetData".to_string())),
            other => writer.write_event(other)?,
        }
    }
}

/// Body of one `<row>`, through its end tag. `cells` all belong to `row`.
fn patch_row<W: Write>(
    reader: &mut Reader<&[u8]>,
    writer: &mut Writer<W>,
    prefix: Option<&str>,
    cells: &[CellPatch],
    row: u32,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut skip = Vec::new();
    let mut next = 0usize;
    let mut last_col = 0u32;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        let (start, is_empty) = match event {
            Event::Start(e) if e.local_name().as_ref() == b"c" => (e, false),
            Event::Empty(e) if e.local_name().as_ref() == b"c" => (e, true),
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                for cell in cells.get(next..).unwrap_or_default() {
                    write_raw(writer, &cell_xml(prefix, cell))?;
                }
                writer.write_event(Event::End(e))?;
                return Ok(());
            }
            Event::Eof => return Err(FillError::Parse(format!("unterminated row {row}"))),
            other => {
                writer.write_event(other)?;
                continue;
            }
        };

        let addr = attr_string(&start, b"r")
            .and_then(|r| parse_cell_ref(&r))
            .unwrap_or(CellAddr::new(row, last_col + 1));
        last_col = addr.col;

        while let Some(cell) = cells.get(next).filter(|c| c.addr.col < addr.col) {
            write_raw(writer, &cell_xml(prefix, cell))?;
            next += 1;
        }

        match cells.get(next).filter(|c| c.addr == addr) {
            Some(cell) => {
                next += 1;
                if !is_empty {
                    let name = start.name().as_ref().to_vec();
                    skip.clear();
                    reader.read_to_end_into(quick_xml::name::QName(&name), &mut skip)?;
                }
                write_raw(writer, &cell_xml(prefix, cell))?;
            }
            None if is_empty => writer.write_event(Event::Empty(start))?,
            None => copy_element(reader, writer, start)?,
        }
    }
}
