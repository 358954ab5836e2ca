//! Shared XML attribute and escaping utilities.
//!
//! Used by both the package reader and the patchers that rewrite parts of it.
//! All functions handle namespace-prefixed attributes and UTF-8 conversion safely.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by key.
///
/// Entity references (`&amp;`, `&#233;`) are resolved. Returns `None` if the
/// attribute is missing or does not unescape.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Extract a string attribute by local name (ignoring namespace prefix).
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `f64` attribute value by key.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Returns `None` if missing. Recognizes `"1"`, `"true"` as true; anything else as false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

/// Escape text for use in XML character data or attribute values.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Whether text needs `xml:space="preserve"` to survive a round trip.
pub fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) || s.contains('\n')
}

/// Clone a start tag, replacing (or adding) one attribute and dropping others by key.
///
/// Attribute order of the survivors is kept.
pub fn with_attr(e: &BytesStart, key: &str, value: Option<&str>, drop: &[&[u8]]) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    let mut replaced = false;
    for attr in e.attributes().flatten() {
        let k = attr.key.as_ref();
        if k == key.as_bytes() {
            if let Some(v) = value {
                out.push_attribute((key, v));
            }
            replaced = true;
        } else if !drop.contains(&k) {
            out.push_attribute(attr);
        }
    }
    if !replaced {
        if let Some(v) = value {
            out.push_attribute((key, v));
        }
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string() {
        let e = make_start(r#"<c r="F6" s="3" />"#);
        assert_eq!(attr_string(&e, b"r"), Some("F6".to_string()));
        assert_eq!(attr_u32(&e, b"s"), Some(3));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_string_resolves_entities() {
        let e = make_start(r#"<sheet name="Anexo &amp; notas" r:id="rId&#50;" />"#);
        assert_eq!(attr_string(&e, b"name").as_deref(), Some("Anexo & notas"));
        assert_eq!(attr_string_local(&e, b"id").as_deref(), Some("rId2"));
    }

    #[test]
    fn test_attr_string_local_ignores_prefix() {
        let e = make_start(r#"<drawing r:id="rId7" />"#);
        assert_eq!(attr_string_local(&e, b"id"), Some("rId7".to_string()));
        assert_eq!(attr_string(&e, b"id"), None);
    }

    #[test]
    fn test_attr_f64_and_bool() {
        let e = make_start(r#"<row ht="22.5" customHeight="1" hidden="0" />"#);
        assert_eq!(attr_f64(&e, b"ht"), Some(22.5));
        assert_eq!(attr_bool(&e, b"customHeight"), Some(true));
        assert_eq!(attr_bool(&e, b"hidden"), Some(false));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("A & B <c> \"d\""), "A &amp; B &lt;c&gt; &quot;d&quot;");
        assert_eq!(xml_escape("plain"), "plain");
    }

    #[test]
    fn test_needs_space_preserve() {
        assert!(needs_space_preserve(" lead"));
        assert!(needs_space_preserve("trail "));
        assert!(needs_space_preserve("two\nlines"));
        assert!(!needs_space_preserve("ACTIVIDAD: Mantenimiento"));
    }

    #[test]
    fn test_with_attr_replaces_and_drops() {
        let e = make_start(r#"<c r="B2" s="1" t="s" />"#);
        let out = with_attr(&e, "s", Some("9"), &[b"t"]);
        assert_eq!(attr_string(&out, b"r"), Some("B2".to_string()));
        assert_eq!(attr_string(&out, b"s"), Some("9".to_string()));
        assert_eq!(attr_string(&out, b"t"), None);
    }
}
