//! Detector configuration and keyword classification.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::types::FieldType;

/// Keyword lists the heuristic passes match against.
///
/// All entries are matched as substrings of the folded (lowercase, accent
/// stripped) cell text, except `header`, which is matched the same way but
/// kept uppercase here for readability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeywordPatterns {
    pub header: Vec<String>,
    pub name: Vec<String>,
    pub date: Vec<String>,
    pub basic_extra: Vec<String>,
    pub signature: Vec<String>,
    pub observations: Vec<String>,
    pub item_column: Vec<String>,
    pub time: Vec<String>,
    pub number: Vec<String>,
    /// Exact (trimmed, folded) texts of checklist option headers.
    pub checklist_options: Vec<String>,
    /// Boilerplate markers that disqualify a basic-info label.
    pub decorative: Vec<String>,
    pub general: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for KeywordPatterns {
    fn default() -> Self {
        Self {
            header: strings(&["INSPECCION", "ANALISIS", "PERMISO", "FORMATO"]),
            name: strings(&["nombre", "realizado por", "elaboro", "responsable"]),
            date: strings(&["fecha", "dia", "mes", "año"]),
            basic_extra: strings(&[
                "cargo",
                "lugar",
                "zona",
                "marca",
                "modelo",
                "placa",
                "kilometraje",
            ]),
            signature: strings(&["firma", "firmas", "firmante"]),
            observations: strings(&["observ", "comentario", "notas"]),
            item_column: strings(&["item", "requerimiento", "descripcion"]),
            time: strings(&["hora", "time"]),
            number: strings(&["kilometraje", "numero", "cantidad"]),
            checklist_options: strings(&["si", "no", "n/a"]),
            decorative: strings(&["version:", "pagina"]),
            general: "general".to_string(),
        }
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| text.contains(&fold(kw)))
}

impl KeywordPatterns {
    pub fn is_header(&self, folded: &str) -> bool {
        contains_any(folded, &self.header)
    }

    /// Any keyword that marks a basic-info label.
    pub fn is_basic_info_label(&self, folded: &str) -> bool {
        contains_any(folded, &self.name)
            || contains_any(folded, &self.date)
            || contains_any(folded, &self.basic_extra)
    }

    pub fn is_signature(&self, folded: &str) -> bool {
        contains_any(folded, &self.signature)
    }

    pub fn is_observations(&self, folded: &str) -> bool {
        contains_any(folded, &self.observations)
    }

    pub fn is_item_column(&self, folded: &str) -> bool {
        contains_any(folded, &self.item_column)
    }

    pub fn is_general(&self, folded: &str) -> bool {
        folded.contains(&fold(&self.general))
    }

    pub fn is_checklist_option(&self, folded: &str) -> bool {
        let trimmed = folded.trim();
        self.checklist_options.iter().any(|o| fold(o) == trimmed)
    }

    /// Template boilerplate that looks like a label but is not fillable:
    /// version/page markers, or a "fecha:" followed by a literal date.
    pub fn is_decorative(&self, folded: &str) -> bool {
        contains_any(folded, &self.decorative)
            || (folded.contains("fecha:") && contains_date_literal(folded))
    }

    /// Infer a field type from its label. First match wins:
    /// date, time, number, signature, observations (textarea), else text.
    pub fn classify(&self, folded: &str) -> FieldType {
        if contains_any(folded, &self.date) {
            FieldType::Date
        } else if contains_any(folded, &self.time) {
            FieldType::Time
        } else if contains_any(folded, &self.number) {
            FieldType::Number
        } else if contains_any(folded, &self.signature) {
            FieldType::Signature
        } else if contains_any(folded, &self.observations) {
            FieldType::Textarea
        } else {
            FieldType::Text
        }
    }
}

/// Lowercase and strip diacritics for keyword matching. `ñ` is a letter of
/// its own in Spanish and survives.
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc().flat_map(char::to_lowercase) {
        if c == 'ñ' {
            out.push(c);
        } else {
            out.extend(std::iter::once(c).nfd().filter(|m| !is_combining_mark(*m)));
        }
    }
    out
}

#[allow(clippy::expect_used)]
static DATE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}[-/]\d{1,2}[-/]\d{2,4}").expect("invalid date literal regex"));

/// Whether `text` contains a literal date such as `15/01/2023` or `1-3-21`.
pub fn contains_date_literal(text: &str) -> bool {
    DATE_LITERAL.is_match(text)
}

/// Heuristic detector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectorConfig {
    pub detect_headers: bool,
    pub detect_basic_info: bool,
    pub detect_checklists: bool,
    pub detect_tables: bool,
    pub detect_signatures: bool,
    pub detect_observations: bool,
    /// Passes only look at rows `1..=max_scan_rows`...
    pub max_scan_rows: u32,
    /// ...and columns `1..=max_scan_cols`.
    pub max_scan_cols: u32,
    /// Rows scanned by the header pass.
    pub header_rows: u32,
    /// Consecutive empty item rows that end a checklist.
    pub empty_row_limit: u32,
    /// How far below an observations label to look for a merged block.
    pub observations_lookahead: u32,
    pub keywords: KeywordPatterns,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            detect_headers: true,
            detect_basic_info: true,
            detect_checklists: true,
            detect_tables: true,
            detect_signatures: true,
            detect_observations: true,
            max_scan_rows: 100,
            max_scan_cols: 30,
            header_rows: 5,
            empty_row_limit: 3,
            observations_lookahead: 10,
            keywords: KeywordPatterns::default(),
        }
    }
}

impl DetectorConfig {
    /// Load from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
