//! Template id to hand-authored section list.
//!
//! Templates the system ships with carry fixed coordinates and skip the
//! heuristic detector entirely. Lookup is a plain table, resolved once per
//! template id into a [`DetectionStrategy`].

mod builtin;

use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::Section;

/// How a template's schema is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionStrategy {
    /// Registered sections, returned verbatim.
    Override(Vec<Section>),
    /// Run the structural detector.
    Heuristic,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    templates: BTreeMap<String, Vec<Section>>,
}

impl SchemaRegistry {
    /// Empty registry: every template goes through heuristic detection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the shipped inspection templates.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("inspeccion-herramientas", builtin::herramientas());
        registry.register("inspeccion-vehiculo", builtin::vehiculo());
        registry.register("inspeccion-grua", builtin::grua());
        registry
    }

    /// Add or replace a template. An empty list unregisters it, so the
    /// template falls back to heuristics.
    pub fn register(&mut self, template_id: impl Into<String>, sections: Vec<Section>) {
        let template_id = template_id.into();
        if sections.is_empty() {
            self.templates.remove(&template_id);
        } else {
            self.templates.insert(template_id, sections);
        }
    }

    pub fn contains(&self, template_id: &str) -> bool {
        self.templates.contains_key(template_id)
    }

    pub fn template_ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn sections(&self, template_id: &str) -> Option<&[Section]> {
        self.templates.get(template_id).map(Vec::as_slice)
    }

    pub fn strategy_for(&self, template_id: &str) -> DetectionStrategy {
        match self.templates.get(template_id) {
            Some(sections) => DetectionStrategy::Override(sections.clone()),
            None => DetectionStrategy::Heuristic,
        }
    }

    /// Merge a JSON object of `template_id -> [Section]` into the registry.
    /// Returns the number of templates read.
    pub fn merge_json(&mut self, json: &str) -> Result<usize> {
        let extra: BTreeMap<String, Vec<Section>> = serde_json::from_str(json)?;
        let count = extra.len();
        for (template_id, sections) in extra {
            log::debug!("registry: loaded '{template_id}' ({} sections)", sections.len());
            self.register(template_id, sections);
        }
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::{FieldType, SectionKind};

    #[test]
    fn test_unknown_template_is_heuristic() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(registry.strategy_for("permiso-trabajo"), DetectionStrategy::Heuristic);
        assert_eq!(registry.strategy_for("ats"), DetectionStrategy::Heuristic);
        assert!(registry.contains("inspeccion-grua"));
    }

    #[test]
    fn test_merge_json_overrides_and_unregisters() {
        let mut registry = SchemaRegistry::builtin();
        let json = r#"{
            "permiso-trabajo": [{
                "id": "basic_info",
                "kind": "basic_info",
                "title": "Permiso",
                "fields": [
                    {"id": "actividad", "label": "ACTIVIDAD", "type": "text", "cellRef": "B4"}
                ]
            }],
            "inspeccion-vehiculo": []
        }"#;
        assert_eq!(registry.merge_json(json).unwrap(), 2);

        let DetectionStrategy::Override(sections) = registry.strategy_for("permiso-trabajo") else {
            panic!("expected override");
        };
        assert_eq!(sections[0].kind, SectionKind::BasicInfo);
        assert_eq!(sections[0].fields[0].field_type, FieldType::Text);
        assert_eq!(sections[0].fields[0].cell_ref.to_string(), "B4");
        assert!(!registry.contains("inspeccion-vehiculo"));
    }

    #[test]
    fn test_merge_json_rejects_garbage() {
        let mut registry = SchemaRegistry::new();
        assert!(registry.merge_json("[1, 2]").is_err());
        assert_eq!(registry.template_ids().count(), 0);
    }
}
