//! Minimal package synthesis for workbooks built in memory.
//!
//! Every cell is written with an inline string or a plain value, so the
//! package needs no shared string table. The styles part carries only the
//! default xf plus one xf per alignment override; grid style indices do not
//! refer to anything here and are dropped.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use zip::ZipWriter;

use crate::cell_ref::CellAddr;
use crate::drawings::{write_relationships, Relationship};
use crate::error::Result;
use crate::namespaces::{
    CT_DRAWING, CT_RELATIONSHIPS, CT_STYLES, CT_WORKBOOK, CT_WORKSHEET, NS_CONTENT_TYPES,
    NS_OFFICE_RELATIONSHIPS, NS_SPREADSHEET, REL_DRAWING, REL_IMAGE, REL_STYLES, REL_WORKBOOK,
    REL_WORKSHEET,
};
use crate::types::{format_number, Grid, Workbook};
use crate::xml_helpers::xml_escape;

use super::content_types::ContentTypes;
use super::drawing_writer::{new_drawing, picture_anchor};
use super::sheet_patch::{cell_xml, CellPatch};
use super::{entry_options, Alignment, SheetEdits};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// xf index of each alignment in the synthesized styles part.
fn alignment_xf(alignment: Alignment) -> u32 {
    match alignment {
        Alignment::Center => 1,
        Alignment::TopLeftWrap => 2,
    }
}

fn styles_xml() -> String {
    format!(
        concat!(
            "{decl}\n<styleSheet xmlns=\"{ns}\">",
            r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
            r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
            r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment {center}/></xf>"#,
            r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment {wrap}/></xf></cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            "</styleSheet>"
        ),
        decl = XML_DECL,
        ns = NS_SPREADSHEET,
        center = Alignment::Center.xml_attrs(),
        wrap = Alignment::TopLeftWrap.xml_attrs(),
    )
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut out = format!(
        r#"{XML_DECL}
<workbook xmlns="{NS_SPREADSHEET}" xmlns:r="{NS_OFFICE_RELATIONSHIPS}"><sheets>"#
    );
    for (i, grid) in (1usize..).zip(&workbook.sheets) {
        out.push_str(&format!(
            r#"<sheet name="{}" sheetId="{i}" r:id="rId{i}"/>"#,
            xml_escape(&grid.name)
        ));
    }
    out.push_str("</sheets></workbook>");
    out
}

/// Whole worksheet XML for a grid.
fn worksheet_xml(grid: &Grid, edits: Option<&SheetEdits>, drawing_rid: Option<&str>) -> String {
    let mut out = format!(
        r#"{XML_DECL}
<worksheet xmlns="{NS_SPREADSHEET}" xmlns:r="{NS_OFFICE_RELATIONSHIPS}">"#
    );

    if grid.row_count() > 0 && grid.col_count() > 0 {
        out.push_str(&format!(
            r#"<dimension ref="A1:{}"/>"#,
            CellAddr::new(grid.row_count(), grid.col_count())
        ));
    }
    out.push_str(&format!(
        r#"<sheetFormatPr defaultColWidth="{}" defaultRowHeight="{}"/>"#,
        format_number(grid.column_width_units(0)),
        format_number(grid.row_height_points(0)),
    ));

    let widths: Vec<(u32, f64)> = grid.column_widths().collect();
    if !widths.is_empty() {
        out.push_str("<cols>");
        for (col, units) in widths {
            out.push_str(&format!(
                r#"<col min="{col}" max="{col}" width="{}" customWidth="1"/>"#,
                format_number(units)
            ));
        }
        out.push_str("</cols>");
    }

    let heights: BTreeMap<u32, f64> = grid.row_heights().collect();
    let mut rows: BTreeMap<u32, String> = BTreeMap::new();
    for (addr, slot) in grid.cells() {
        let alignment = edits.and_then(|e| e.alignments.get(&addr)).copied();
        if slot.value.is_none() && alignment.is_none() {
            continue;
        }
        let patch = CellPatch {
            addr,
            value: slot.value.clone(),
            style: alignment.map(alignment_xf),
        };
        rows.entry(addr.row).or_default().push_str(&cell_xml(None, &patch));
    }
    for &row in heights.keys() {
        rows.entry(row).or_default();
    }

    out.push_str("<sheetData>");
    for (row, cells) in rows {
        out.push_str(&format!(r#"<row r="{row}""#));
        if let Some(points) = heights.get(&row) {
            out.push_str(&format!(r#" ht="{}" customHeight="1""#, format_number(*points)));
        }
        if cells.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            out.push_str(&cells);
            out.push_str("</row>");
        }
    }
    out.push_str("</sheetData>");

    if !grid.merges().is_empty() {
        out.push_str(&format!(r#"<mergeCells count="{}">"#, grid.merges().len()));
        for merge in grid.merges() {
            out.push_str(&format!(r#"<mergeCell ref="{}:{}"/>"#, merge.anchor, merge.end()));
        }
        out.push_str("</mergeCells>");
    }

    out.push_str(
        r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#,
    );
    if let Some(rid) = drawing_rid {
        out.push_str(&format!(r#"<drawing r:id="{rid}"/>"#));
    }
    out.push_str("</worksheet>");
    out
}

fn content_types_xml(types: &ContentTypes) -> String {
    let mut out = format!(r#"{XML_DECL}
<Types xmlns="{NS_CONTENT_TYPES}">"#);
    for (ext, ct) in &types.defaults {
        out.push_str(&format!(r#"<Default Extension="{ext}" ContentType="{ct}"/>"#));
    }
    for (part, ct) in &types.overrides {
        out.push_str(&format!(
            r#"<Override PartName="{}" ContentType="{ct}"/>"#,
            xml_escape(part)
        ));
    }
    out.push_str("</Types>");
    out
}

/// Build a complete package for a workbook with no source bytes.
pub(crate) fn write_package(
    workbook: &Workbook,
    edits: &BTreeMap<usize, &SheetEdits>,
) -> Result<Vec<u8>> {
    let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
    let mut types = ContentTypes::default();
    types.add_default("rels", CT_RELATIONSHIPS);
    types.add_default("xml", "application/xml");
    types.add_override("xl/workbook.xml", CT_WORKBOOK);
    types.add_override("xl/styles.xml", CT_STYLES);

    let mut workbook_rels = Vec::new();
    // media key -> media file name
    let mut media: BTreeMap<String, String> = BTreeMap::new();
    let mut drawing_count = 0u32;

    for (i, grid) in (1usize..).zip(&workbook.sheets) {
        let sheet_path = format!("xl/worksheets/sheet{i}.xml");
        workbook_rels.push(Relationship {
            id: format!("rId{i}"),
            rel_type: REL_WORKSHEET.to_string(),
            target: format!("worksheets/sheet{i}.xml"),
            external: false,
        });
        types.add_override(&sheet_path, CT_WORKSHEET);

        let sheet_edits = edits.get(&(i - 1)).copied();
        let images = sheet_edits.map_or(&[][..], |e| e.images.as_slice());
        let mut drawing_rid = None;

        if !images.is_empty() {
            drawing_count += 1;
            let drawing_path = format!("xl/drawings/drawing{drawing_count}.xml");
            let mut drawing_rels = Vec::new();
            let mut anchors = Vec::with_capacity(images.len());

            for (object_id, image) in (1u32..).zip(images) {
                let kind = image.asset.kind;
                let next = media.len() + 1;
                let file = media
                    .entry(image.media_key.clone())
                    .or_insert_with(|| {
                        parts.push((
                            format!("xl/media/image{next}.{}", kind.extension()),
                            image.asset.bytes.clone(),
                        ));
                        format!("image{next}.{}", kind.extension())
                    })
                    .clone();
                types.add_default(kind.extension(), kind.content_type());

                let target = format!("../media/{file}");
                let rid = match drawing_rels.iter().find(|r: &&Relationship| r.target == target) {
                    Some(rel) => rel.id.clone(),
                    None => {
                        let rid = format!("rId{}", drawing_rels.len() + 1);
                        drawing_rels.push(Relationship {
                            id: rid.clone(),
                            rel_type: REL_IMAGE.to_string(),
                            target,
                            external: false,
                        });
                        rid
                    }
                };
                anchors.push(picture_anchor(image, object_id, &rid));
            }

            parts.push((drawing_path.clone(), new_drawing(&anchors)));
            parts.push((
                format!("xl/drawings/_rels/drawing{drawing_count}.xml.rels"),
                write_relationships(&drawing_rels).into_bytes(),
            ));
            parts.push((
                format!("xl/worksheets/_rels/sheet{i}.xml.rels"),
                write_relationships(&[Relationship {
                    id: "rId1".to_string(),
                    rel_type: REL_DRAWING.to_string(),
                    target: format!("../drawings/drawing{drawing_count}.xml"),
                    external: false,
                }])
                .into_bytes(),
            ));
            types.add_override(&drawing_path, CT_DRAWING);
            drawing_rid = Some("rId1");
        }

        parts.push((
            sheet_path,
            worksheet_xml(grid, sheet_edits, drawing_rid).into_bytes(),
        ));
    }

    let styles_rid = format!("rId{}", workbook.sheets.len() + 1);
    workbook_rels.push(Relationship {
        id: styles_rid,
        rel_type: REL_STYLES.to_string(),
        target: "styles.xml".to_string(),
        external: false,
    });

    let root_rels = [Relationship {
        id: "rId1".to_string(),
        rel_type: REL_WORKBOOK.to_string(),
        target: "xl/workbook.xml".to_string(),
        external: false,
    }];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = entry_options();
    let fixed: [(&str, Vec<u8>); 5] = [
        ("[Content_Types].xml", content_types_xml(&types).into_bytes()),
        ("_rels/.rels", write_relationships(&root_rels).into_bytes()),
        ("xl/workbook.xml", workbook_xml(workbook).into_bytes()),
        ("xl/_rels/workbook.xml.rels", write_relationships(&workbook_rels).into_bytes()),
        ("xl/styles.xml", styles_xml().into_bytes()),
    ];
    for (name, bytes) in fixed {
        writer.start_file(name, options)?;
        writer.write_all(&bytes)?;
    }
    for (name, bytes) in parts {
        writer.start_file(name, options)?;
        writer.write_all(&bytes)?;
    }

    log::debug!("synthesized package for {} sheets", workbook.sheets.len());
    Ok(writer.finish()?.into_inner())
}
