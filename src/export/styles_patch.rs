//! Alignment overrides for the styles part.
//!
//! Each distinct (base xf, alignment) pair becomes one new `cellXfs` entry:
//! a copy of the base xf with its `<alignment>` replaced. Existing indices
//! never move, so untouched cells keep their look.

use std::collections::{BTreeMap, BTreeSet};

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{FillError, Result};
use crate::xml_helpers::with_attr;

use super::Alignment;

impl Alignment {
    /// Attributes of the `<alignment>` element.
    pub(crate) fn xml_attrs(self) -> &'static str {
        match self {
            Self::Center => r#"horizontal="center" vertical="center""#,
            Self::TopLeftWrap => r#"horizontal="left" vertical="top" wrapText="1""#,
        }
    }
}

/// New xf index per requested (base xf, alignment).
pub(crate) type StyleMap = BTreeMap<(u32, Alignment), u32>;

/// One `<xf>` of `cellXfs` as owned events, start tag first.
type XfEvents = Vec<Event<'static>>;

fn prefixed(name: &[u8], local: &str) -> String {
    let name = String::from_utf8_lossy(name);
    match name.split_once(':') {
        Some((prefix, _)) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

/// Read the children of `<cellXfs>` through its end tag.
fn read_cell_xfs(reader: &mut Reader<&[u8]>) -> Result<(Vec<XfEvents>, Vec<Event<'static>>)> {
    let mut xfs: Vec<XfEvents> = Vec::new();
    let mut stray = Vec::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?.into_owned();
        match &event {
            Event::End(e) if depth == 0 && e.local_name().as_ref() == b"cellXfs" => {
                return Ok((xfs, stray));
            }
            Event::Start(e) if depth == 0 && e.local_name().as_ref() == b"xf" => {
                depth = 1;
                xfs.push(vec![event]);
                continue;
            }
            Event::Empty(e) if depth == 0 && e.local_name().as_ref() == b"xf" => {
                xfs.push(vec![event]);
                continue;
            }
            Event::Eof => return Err(FillError::Parse("unterminated cellXfs".to_string())),
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        match xfs.last_mut() {
            Some(xf) if depth > 0 || matches!(event, Event::End(_)) => xf.push(event),
            _ => stray.push(event),
        }
    }
}

/// Copy of `base` with `alignment`, as raw XML.
fn clone_xf(base: Option<&XfEvents>, alignment: Alignment) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    let Some((Event::Start(start) | Event::Empty(start), rest)) = base.and_then(|b| b.split_first()) else {
        let xml = format!(
            r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment {}/></xf>"#,
            alignment.xml_attrs()
        );
        return Ok(xml.into_bytes());
    };

    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let align_tag = prefixed(start.name().as_ref(), "alignment");
    writer.write_event(Event::Start(with_attr(start, "applyAlignment", Some("1"), &[])))?;
    writer
        .get_mut()
        .extend_from_slice(format!("<{align_tag} {}/>", alignment.xml_attrs()).as_bytes());

    let mut skipping = 0usize;
    for event in rest {
        match event {
            Event::Start(e) if skipping > 0 || e.local_name().as_ref() == b"alignment" => {
                skipping += 1;
            }
            Event::Empty(e) if skipping == 0 && e.local_name().as_ref() == b"alignment" => {}
            Event::End(_) if skipping > 0 => skipping -= 1,
            Event::End(e) if e.name().as_ref() == name.as_bytes() => {}
            _ if skipping > 0 => {}
            other => writer.write_event(other.clone())?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(writer.into_inner())
}

/// Append alignment variants to `cellXfs`.
///
/// Returns the patched part and the index assigned to each request.
pub(crate) fn patch_styles(
    original: &[u8],
    requests: &BTreeSet<(u32, Alignment)>,
) -> Result<(Vec<u8>, StyleMap)> {
    let mut map = StyleMap::new();
    if requests.is_empty() {
        return Ok((original.to_vec(), map));
    }

    let mut reader = Reader::from_reader(original);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(original.len() + requests.len() * 128));
    let mut buf = Vec::new();
    let mut patched = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if !patched && e.local_name().as_ref() == b"cellXfs" => {
                let start = e.into_owned();
                let (xfs, stray) = read_cell_xfs(&mut reader)?;
                write_cell_xfs(&mut writer, &start, &xfs, &stray, requests, &mut map)?;
                patched = true;
            }
            Event::Empty(e) if !patched && e.local_name().as_ref() == b"cellXfs" => {
                let start = e.into_owned();
                write_cell_xfs(&mut writer, &start, &[], &[], requests, &mut map)?;
                patched = true;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    if !patched {
        log::warn!("styles part has no cellXfs; alignment overrides dropped");
        return Ok((original.to_vec(), StyleMap::new()));
    }
    Ok((writer.into_inner(), map))
}

fn write_cell_xfs(
    writer: &mut Writer<Vec<u8>>,
    start: &BytesStart<'static>,
    xfs: &[XfEvents],
    stray: &[Event<'static>],
    requests: &BTreeSet<(u32, Alignment)>,
    map: &mut StyleMap,
) -> Result<()> {
    let existing = u32::try_from(xfs.len()).unwrap_or(u32::MAX);
    let total = existing.saturating_add(u32::try_from(requests.len()).unwrap_or(u32::MAX));
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    writer.write_event(Event::Start(with_attr(start, "count", Some(&total.to_string()), &[])))?;
    for event in stray.iter().chain(xfs.iter().flatten()) {
        writer.write_event(event.clone())?;
    }
    for (offset, &(base, alignment)) in (0u32..).zip(requests) {
        let xml = clone_xf(usize::try_from(base).ok().and_then(|i| xfs.get(i)), alignment)?;
        writer.get_mut().extend_from_slice(&xml);
        map.insert((base, alignment), existing + offset);
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font/></fonts><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="1" fillId="0" borderId="2" xfId="0" applyBorder="1"><alignment horizontal="right"/><protection locked="0"/></xf><xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

    fn requests(items: &[(u32, Alignment)]) -> BTreeSet<(u32, Alignment)> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_no_requests_is_identity() {
        let (out, map) = patch_styles(STYLES.as_bytes(), &BTreeSet::new()).unwrap();
        assert_eq!(out, STYLES.as_bytes());
        assert!(map.is_empty());
    }

    #[test]
    fn test_variants_are_appended() {
        let (out, map) = patch_styles(
            STYLES.as_bytes(),
            &requests(&[(1, Alignment::Center), (0, Alignment::TopLeftWrap)]),
        )
        .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains(r#"<cellXfs count="5">"#));
        assert_eq!(map[&(0, Alignment::TopLeftWrap)], 3);
        assert_eq!(map[&(1, Alignment::Center)], 4);
        // the clone of xf 1 keeps its border and protection, not its alignment
        assert!(out.contains(r#"<xf numFmtId="14" fontId="1" fillId="0" borderId="2" xfId="0" applyBorder="1" applyAlignment="1"><alignment horizontal="center" vertical="center"/><protection locked="0"/></xf></cellXfs>"#));
        assert!(out.contains(r#"applyAlignment="1"><alignment horizontal="left" vertical="top" wrapText="1"/></xf>"#));
        assert!(out.contains(r#"<cellStyles count="1">"#));
        // originals untouched
        assert!(out.contains(r#"<alignment horizontal="right"/>"#));
    }

    #[test]
    fn test_unknown_base_gets_default_xf() {
        let (out, map) = patch_styles(STYLES.as_bytes(), &requests(&[(42, Alignment::Center)])).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(map[&(42, Alignment::Center)], 3);
        assert!(out.contains(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment horizontal="center" vertical="center"/></xf>"#));
    }
}
