//! Package index: which parts hold the sheets, the shared string table and
//! the styles of a workbook.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

use crate::drawings::{parse_relationships, read_entry, resolve_relative_path, Relationship};
use crate::error::{FillError, Result};
use crate::namespaces::{
    is_shared_strings_relationship, is_styles_relationship, is_worksheet_relationship,
};
use crate::xml_helpers::{attr_string, attr_string_local};

use super::worksheet::SheetInfo;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";

/// Part paths named by `xl/_rels/workbook.xml.rels`, resolved against `xl/`.
#[derive(Debug, Default)]
pub(super) struct PackageIndex {
    rels: Vec<Relationship>,
    pub shared_strings: Option<String>,
    pub styles: Option<String>,
}

impl PackageIndex {
    /// A package without workbook relationships still opens; sheets then
    /// fall back to the conventional `sheetN.xml` paths.
    pub fn read<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Self {
        let rels = read_entry(archive, WORKBOOK_RELS)
            .map(|bytes| parse_relationships(&bytes))
            .unwrap_or_default();
        let find = |pred: fn(&str) -> bool| {
            rels.iter()
                .find(|r| !r.external && pred(&r.rel_type))
                .map(|r| resolve_relative_path("xl", &r.target))
        };
        let shared_strings = find(is_shared_strings_relationship);
        let styles = find(is_styles_relationship);
        Self {
            rels,
            shared_strings,
            styles,
        }
    }

    fn worksheet_path(&self, rel_id: &str) -> Option<String> {
        self.rels
            .iter()
            .find(|r| r.id == rel_id && is_worksheet_relationship(&r.rel_type))
            .map(|r| resolve_relative_path("xl", &r.target))
    }

    /// Sheets in tab order with their worksheet part paths.
    pub fn sheets<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<SheetInfo>> {
        let bytes = read_entry(archive, WORKBOOK_PART)
            .ok_or_else(|| FillError::Parse(format!("package has no {WORKBOOK_PART}")))?;
        let mut xml = Reader::from_reader(bytes.as_slice());
        xml.trim_text(true);

        let mut sheets: Vec<SheetInfo> = Vec::new();
        let mut buf = Vec::new();
        loop {
            match xml.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheet" => {
                    if let Some(name) = attr_string(e, b"name").filter(|n| !n.is_empty()) {
                        let path = attr_string_local(e, b"id")
                            .and_then(|id| self.worksheet_path(&id))
                            .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", sheets.len() + 1));
                        sheets.push(SheetInfo { name, path });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(sheets)
    }
}

/// Where the shared string reader is inside an `<si>`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum SiState {
    Outside,
    Item,
    Text,
    Phonetic,
}

/// The shared string table. Rich runs are joined; phonetic hints (`rPh`)
/// are not part of the cell text.
pub(super) fn shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<String> {
    let Some(bytes) = read_entry(archive, path.unwrap_or("xl/sharedStrings.xml")) else {
        return Vec::new();
    };
    parse_shared_strings(&bytes)
}

fn parse_shared_strings(bytes: &[u8]) -> Vec<String> {
    let mut xml = Reader::from_reader(bytes);
    xml.trim_text(false);

    let mut table = Vec::new();
    let mut current = String::new();
    let mut state = SiState::Outside;
    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf) {
            Err(e) => {
                log::warn!("shared string table unreadable after {} entries: {e}", table.len());
                break;
            }
            Ok(Event::Start(ref e)) => match (e.local_name().as_ref(), state) {
                (b"si", _) => {
                    current.clear();
                    state = SiState::Item;
                }
                (b"rPh", SiState::Item) => state = SiState::Phonetic,
                (b"t", SiState::Item) => state = SiState::Text,
                _ => {}
            },
            // An empty <si/> still takes an index
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => table.push(String::new()),
            Ok(Event::Text(ref t)) if state == SiState::Text => {
                if let Ok(text) = t.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    table.push(std::mem::take(&mut current));
                    state = SiState::Outside;
                }
                b"t" if state == SiState::Text => state = SiState::Item,
                b"rPh" if state == SiState::Phonetic => state = SiState::Item,
                _ => {}
            },
            Ok(Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }
    table
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_rich_runs_join_and_phonetics_drop() {
        let xml = br#"<sst><si><t>FECHA:</t></si><si/><si><r><t>REALIZADO </t></r><r><t>POR:</t></r><rPh><t>x</t></rPh></si></sst>"#;
        let table = parse_shared_strings(xml);
        assert_eq!(table, ["FECHA:", "", "REALIZADO POR:"]);
    }

    #[test]
    fn test_escaped_text() {
        let table = parse_shared_strings(br#"<sst><si><t>SI &amp; NO</t></si></sst>"#);
        assert_eq!(table[0], "SI & NO");
    }
}
