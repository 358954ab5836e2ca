//! `[Content_Types].xml` upkeep for added media and drawing parts.

use std::collections::BTreeSet;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::error::Result;
use crate::xml_helpers::{attr_string, xml_escape};

/// Content type entries a patched package needs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ContentTypes {
    /// `(extension, content type)`
    pub defaults: BTreeSet<(String, String)>,
    /// `(absolute part name, content type)`
    pub overrides: BTreeSet<(String, String)>,
}

impl ContentTypes {
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.overrides.is_empty()
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .insert((extension.to_ascii_lowercase(), content_type.to_string()));
    }

    /// `part` is a package path without the leading slash.
    pub fn add_override(&mut self, part: &str, content_type: &str) {
        self.overrides.insert((
            format!("/{}", part.trim_start_matches('/')),
            content_type.to_string(),
        ));
    }
}

/// Add the missing `Default` and `Override` entries before `</Types>`.
///
/// Extensions and part names already declared are left as they are.
pub(crate) fn patch_content_types(original: &[u8], wanted: &ContentTypes) -> Result<Vec<u8>> {
    if wanted.is_empty() {
        return Ok(original.to_vec());
    }

    let mut reader = Reader::from_reader(original);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(original.len() + 512));
    let mut buf = Vec::new();
    let mut extensions = BTreeSet::new();
    let mut parts = BTreeSet::new();
    let mut depth = 0usize;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) => {
                match e.local_name().as_ref() {
                    b"Default" => {
                        if let Some(ext) = attr_string(&e, b"Extension") {
                            extensions.insert(ext.to_ascii_lowercase());
                        }
                    }
                    b"Override" => {
                        if let Some(part) = attr_string(&e, b"PartName") {
                            parts.insert(part);
                        }
                    }
                    _ => {}
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let mut extra = String::new();
                    for (ext, ct) in &wanted.defaults {
                        if !extensions.contains(ext) {
                            extra.push_str(&format!(
                                r#"<Default Extension="{}" ContentType="{}"/>"#,
                                xml_escape(ext),
                                xml_escape(ct)
                            ));
                        }
                    }
                    for (part, ct) in &wanted.overrides {
                        if !parts.contains(part) {
                            extra.push_str(&format!(
                                r#"<Override PartName="{}" ContentType="{}"/>"#,
                                xml_escape(part),
                                xml_escape(ct)
                            ));
                        }
                    }
                    writer.get_mut().extend_from_slice(extra.as_bytes());
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    Ok(writer.into_inner())
}
