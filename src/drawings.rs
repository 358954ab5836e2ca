//! Package relationship helpers and discovery of existing drawing parts.
//!
//! A sheet that already carries pictures or shapes has a drawing part linked
//! from its `.rels`; new signature pictures must go into that same part.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

use crate::namespaces::is_drawing_relationship;
use crate::xml_helpers::attr_string;

/// One `<Relationship>` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// Read a whole zip entry, `None` if it does not exist.
pub fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<Vec<u8>> {
    let mut file = archive.by_name(name).ok()?;
    let mut out = Vec::new();
    file.read_to_end(&mut out).ok()?;
    Some(out)
}

/// Parse the relationships of a `.rels` part.
pub fn parse_relationships(xml_bytes: &[u8]) -> Vec<Relationship> {
    let mut xml = Reader::from_reader(xml_bytes);
    xml.trim_text(true);

    let mut rels = Vec::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let id = attr_string(e, b"Id").unwrap_or_default();
                    let target = attr_string(e, b"Target").unwrap_or_default();
                    if !id.is_empty() && !target.is_empty() {
                        rels.push(Relationship {
                            id,
                            rel_type: attr_string(e, b"Type").unwrap_or_default(),
                            target,
                            external: attr_string(e, b"TargetMode").as_deref() == Some("External"),
                        });
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// "xl/worksheets/sheet1.xml" -> "xl/worksheets/_rels/sheet1.xml.rels"
pub fn rels_path_for(part_path: &str) -> String {
    let part_path = part_path.trim_start_matches('/');
    match part_path.rsplit_once('/') {
        Some((dir, filename)) => format!("{dir}/_rels/{filename}.rels"),
        None => format!("_rels/{part_path}.rels"),
    }
}

/// Directory portion of a part path ("" for root parts).
pub fn part_dir(part_path: &str) -> &str {
    part_path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Resolve a relative target against a base directory.
///
/// Handles paths like "../media/image1.png" relative to "xl/drawings".
pub fn resolve_relative_path(base_dir: &str, relative: &str) -> String {
    if let Some(stripped) = relative.strip_prefix('/') {
        return stripped.to_string();
    }

    let mut components: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();

    for part in relative.split('/') {
        match part {
            ".." => {
                components.pop();
            }
            "." | "" => {}
            _ => components.push(part),
        }
    }

    components.join("/")
}

/// Relative target from the directory of `from_part` to `to_part`.
pub fn relative_target(from_part: &str, to_part: &str) -> String {
    let from: Vec<&str> = part_dir(from_part).split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = to_part.split('/').filter(|s| !s.is_empty()).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let mut parts: Vec<&str> = std::iter::repeat("..").take(from.len() - common).collect();
    parts.extend(to.iter().skip(common));
    parts.join("/")
}

/// Drawing part linked from a sheet's relationships, as `(rel id, part path)`.
pub fn sheet_drawing(sheet_path: &str, sheet_rels: &[Relationship]) -> Option<(String, String)> {
    sheet_rels
        .iter()
        .find(|r| !r.external && is_drawing_relationship(&r.rel_type))
        .map(|r| {
            (
                r.id.clone(),
                resolve_relative_path(part_dir(sheet_path), &r.target),
            )
        })
}

/// Next free `rIdN` in a relationship list.
pub fn next_rel_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

/// Highest `cNvPr id` used by the shapes of a drawing part.
pub fn max_object_id(drawing_xml: &[u8]) -> u32 {
    let mut xml = Reader::from_reader(drawing_xml);
    xml.trim_text(true);

    let mut max = 0;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"cNvPr" {
                    if let Some(id) = attr_string(e, b"id").and_then(|s| s.parse::<u32>().ok()) {
                        max = max.max(id);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    max
}

/// Serialize relationships back into a `.rels` part.
pub fn write_relationships(rels: &[Relationship]) -> String {
    use crate::namespaces::NS_RELATIONSHIPS;
    use crate::xml_helpers::xml_escape;

    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<Relationships xmlns="{NS_RELATIONSHIPS}">"#));
    for r in rels {
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}""#,
            xml_escape(&r.id),
            xml_escape(&r.rel_type),
            xml_escape(&r.target)
        ));
        if r.external {
            out.push_str(r#" TargetMode="External""#);
        }
        out.push_str("/>");
    }
    out.push_str("</Relationships>");
    out
}
