//! Worksheet parsing - one sheet XML part into a [`Grid`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufReader, Read};
use zip::ZipArchive;

use crate::cell_ref::{parse_cell_range, parse_cell_ref_bytes, CellAddr, Span};
use crate::error::Result;
use crate::types::{CellValue, Grid};
use crate::xml_helpers::{attr_bool, attr_f64, attr_string, attr_u32};

/// Highest column index a sheet can address (XFD).
const MAX_COL: u32 = 16_384;

/// Sheet metadata from workbook.xml
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Default,
    }
}

/// Turn the raw `<v>`/`<is>` text of a cell into a value.
pub(super) fn resolve_cell_value(
    raw: &str,
    tag: CellTypeTag,
    shared_strings: &[String],
) -> Option<CellValue> {
    match tag {
        CellTypeTag::Shared => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i))
            .map(|s| CellValue::Text(s.clone())),
        CellTypeTag::Inline | CellTypeTag::Str => Some(CellValue::Text(raw.to_string())),
        CellTypeTag::Bool => Some(CellValue::Bool(raw.trim() == "1")),
        CellTypeTag::Error => Some(CellValue::Error(raw.to_string())),
        CellTypeTag::Date => Some(CellValue::Date(raw.trim().to_string())),
        CellTypeTag::Default => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(
                    trimmed
                        .parse::<f64>()
                        .map_or_else(|_| CellValue::Text(raw.to_string()), CellValue::Number),
                )
            }
        }
    }
}

/// The `<c>` currently being read.
struct PendingCell {
    addr: CellAddr,
    tag: CellTypeTag,
    text: String,
    has_value: bool,
}

fn apply_sheet_format(grid: &mut Grid, e: &BytesStart) {
    if let Some(w) = attr_f64(e, b"defaultColWidth") {
        grid.set_default_column_width(w);
    }
    if let Some(h) = attr_f64(e, b"defaultRowHeight") {
        grid.set_default_row_height(h);
    }
}

fn apply_col(grid: &mut Grid, e: &BytesStart) {
    let (Some(min), Some(max)) = (attr_u32(e, b"min"), attr_u32(e, b"max")) else {
        return;
    };
    let hidden = attr_bool(e, b"hidden").unwrap_or(false);
    let width = if hidden {
        Some(0.0)
    } else {
        attr_f64(e, b"width")
    };
    if let Some(width) = width {
        for col in min.max(1)..=max.min(MAX_COL) {
            grid.set_column_width(col, width);
        }
    }
}

fn apply_merge(grid: &mut Grid, e: &BytesStart) {
    let Some((start, end)) = attr_string(e, b"ref").and_then(|r| parse_cell_range(&r)) else {
        return;
    };
    grid.add_merge(
        start,
        Span::new(end.row - start.row + 1, end.col - start.col + 1),
    );
}

/// Parse a single worksheet
pub(super) fn parse_sheet<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<Grid> {
    let file = archive.by_name(&info.path)?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut grid = Grid::new(info.name.clone());
    let mut buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 1;
    let mut cell: Option<PendingCell> = None;
    let mut in_v = false;
    let mut in_is = false;
    let mut in_t = false;
    let mut in_rph = false;

    loop {
        buf.clear();
        let event = xml.read_event_into(&mut buf);
        let is_start = matches!(event, Ok(Event::Start(_)));
        match event {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"dimension" => {
                    if let Some((_, end)) = attr_string(e, b"ref").and_then(|r| parse_cell_range(&r)) {
                        grid.extend_bounds(end);
                    }
                }
                b"sheetFormatPr" => apply_sheet_format(&mut grid, e),
                b"col" => apply_col(&mut grid, e),
                b"row" => {
                    current_row = attr_u32(e, b"r").unwrap_or(current_row + 1);
                    next_col = 1;
                    if let Some(ht) = attr_f64(e, b"ht") {
                        grid.set_row_height(current_row, ht);
                    }
                    if current_row > 0 {
                        grid.extend_bounds(CellAddr::new(current_row, 1));
                    }
                }
                b"c" => {
                    let addr = attr_string(e, b"r")
                        .and_then(|r| parse_cell_ref_bytes(r.as_bytes()))
                        .unwrap_or_else(|| CellAddr::new(current_row.max(1), next_col));
                    next_col = addr.col + 1;
                    let tag = attr_string(e, b"t")
                        .map_or(CellTypeTag::Default, |t| parse_cell_type_tag(t.as_bytes()));
                    if let Some(style) = attr_u32(e, b"s") {
                        grid.set_style(addr, style);
                    } else {
                        grid.extend_bounds(addr);
                    }
                    if is_start {
                        cell = Some(PendingCell {
                            addr,
                            tag,
                            text: String::new(),
                            has_value: false,
                        });
                    }
                }
                b"v" if cell.is_some() && is_start => in_v = true,
                b"is" if cell.is_some() && is_start => in_is = true,
                b"rPh" if in_is && is_start => in_rph = true,
                b"t" if in_is && !in_rph && is_start => in_t = true,
                b"mergeCell" => apply_merge(&mut grid, e),
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_v || in_t => {
                if let (Some(pending), Ok(text)) = (cell.as_mut(), t.unescape()) {
                    pending.text.push_str(&text);
                    pending.has_value = true;
                }
            }
            Ok(Event::CData(ref t)) if in_v || in_t => {
                if let Some(pending) = cell.as_mut() {
                    pending.text.push_str(&String::from_utf8_lossy(t.as_ref()));
                    pending.has_value = true;
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"t" => in_t = false,
                b"rPh" => in_rph = false,
                b"is" => in_is = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        if pending.has_value {
                            if let Some(value) =
                                resolve_cell_value(&pending.text, pending.tag, shared_strings)
                            {
                                grid.set_value(pending.addr, value);
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(grid)
}
