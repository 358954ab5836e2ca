//! DrawingML for placed signature pictures.
//!
//! Pictures are `oneCellAnchor`s: the top-left corner sits in a cell plus an
//! EMU offset and the extent is absolute, so column or row resizing never
//! distorts a signature.

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::error::{FillError, Result};
use crate::namespaces::{NS_DRAWING, NS_DRAWING_SPREADSHEET, NS_OFFICE_RELATIONSHIPS};
use crate::xml_helpers::xml_escape;

use super::PlacedImage;

/// Serialize one picture anchor.
///
/// The namespaces are declared on the anchor itself so it can be spliced into
/// an existing drawing whatever prefixes that part uses.
pub(crate) fn picture_anchor(image: &PlacedImage, object_id: u32, embed_rid: &str) -> String {
    let p = &image.placement;
    let (col, row) = p.anchor.zero_based();
    let name = xml_escape(&image.name);
    format!(
        concat!(
            r#"<xdr:oneCellAnchor xmlns:xdr="{xdr}" xmlns:a="{a}" xmlns:r="{r}">"#,
            "<xdr:from><xdr:col>{col}</xdr:col><xdr:colOff>{col_off}</xdr:colOff>",
            "<xdr:row>{row}</xdr:row><xdr:rowOff>{row_off}</xdr:rowOff></xdr:from>",
            r#"<xdr:ext cx="{cx}" cy="{cy}"/>"#,
            r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{id}" name="{name}" descr="{name}"/>"#,
            r#"<xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr>"#,
            r#"<xdr:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>"#,
            r#"<xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr></xdr:pic>"#,
            "<xdr:clientData/></xdr:oneCellAnchor>"
        ),
        xdr = NS_DRAWING_SPREADSHEET,
        a = NS_DRAWING,
        r = NS_OFFICE_RELATIONSHIPS,
        col = col,
        col_off = p.col_offset_emu,
        row = row,
        row_off = p.row_offset_emu,
        cx = p.width_emu,
        cy = p.height_emu,
        id = object_id,
        name = name,
        rid = xml_escape(embed_rid),
    )
}

/// A new drawing part holding `anchors`.
pub(crate) fn new_drawing(anchors: &[String]) -> Vec<u8> {
    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(
        r#"<xdr:wsDr xmlns:xdr="{NS_DRAWING_SPREADSHEET}" xmlns:a="{NS_DRAWING}">"#
    ));
    for anchor in anchors {
        out.push_str(anchor);
    }
    out.push_str("</xdr:wsDr>");
    out.into_bytes()
}

/// Append `anchors` to an existing drawing part, before its root end tag.
pub(crate) fn extend_drawing(existing: &[u8], anchors: &[String]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(existing);
    reader.trim_text(false);
    let extra: usize = anchors.iter().map(String::len).sum();
    let mut writer = Writer::new(Vec::with_capacity(existing.len() + extra));
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut appended = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 && !appended {
                    for anchor in anchors {
                        writer.get_mut().extend_from_slice(anchor.as_bytes());
                    }
                    appended = true;
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Empty(e) if depth == 0 => {
                // `<xdr:wsDr/>`: reopen it around the new anchors
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                writer.write_event(Event::Start(e.into_owned()))?;
                for anchor in anchors {
                    writer.get_mut().extend_from_slice(anchor.as_bytes());
                }
                writer.write_event(Event::End(quick_xml::events::BytesEnd::new(name)))?;
                appended = true;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    if !appended {
        return Err(FillError::Parse("drawing part has no root element".to_string()));
    }
    Ok(writer.into_inner())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cell_ref::CellAddr;
    use crate::render::Placement;
    use crate::types::{ImageKind, SignatureAsset};
    use std::sync::Arc;

    fn image() -> PlacedImage {
        PlacedImage {
            media_key: "firma-1".into(),
            name: "Firma & sello".into(),
            asset: Arc::new(SignatureAsset {
                id: "firma-1".into(),
                name: "firma".into(),
                kind: ImageKind::Png,
                width: 200,
                height: 100,
                bytes: Vec::new(),
            }),
            placement: Placement {
                anchor: CellAddr::new(39, 6),
                col_offset_emu: 4762,
                row_offset_emu: 9525,
                width_emu: 1905000,
                height_emu: 952500,
                width_px: 200.0,
                height_px: 100.0,
            },
        }
    }

    #[test]
    fn test_anchor_is_zero_based_and_escaped() {
        let xml = picture_anchor(&image(), 3, "rId2");
        assert!(xml.contains("<xdr:col>5</xdr:col><xdr:colOff>4762</xdr:colOff>"));
        assert!(xml.contains("<xdr:row>38</xdr:row><xdr:rowOff>9525</xdr:rowOff>"));
        assert!(xml.contains(r#"<xdr:ext cx="1905000" cy="952500"/>"#));
        assert!(xml.contains(r#"id="3" name="Firma &amp; sello""#));
        assert!(xml.contains(r#"r:embed="rId2""#));
    }

    #[test]
    fn test_extend_appends_before_root_end() {
        let existing = r#"<?xml version="1.0"?><xdr:wsDr xmlns:xdr="x"><xdr:twoCellAnchor/></xdr:wsDr>"#;
        let out = extend_drawing(existing.as_bytes(), &["<new/>".to_string()]).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("<xdr:twoCellAnchor/><new/></xdr:wsDr>"));
    }

    #[test]
    fn test_extend_empty_root() {
        let out = extend_drawing(br#"<wsDr xmlns="x"/>"#, &["<new/>".to_string()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"<wsDr xmlns="x"><new/></wsDr>"#);
    }

    #[test]
    fn test_new_drawing_wraps_anchors() {
        let out = String::from_utf8(new_drawing(&["<a1/>".into(), "<a2/>".into()])).unwrap();
        assert!(out.contains("<xdr:wsDr"));
        assert!(out.ends_with("<a1/><a2/></xdr:wsDr>"));
    }
}
