//! Signature asset prefetch.
//!
//! Every distinct asset id named by a completed signature field is resolved
//! once, in parallel, before the grid is touched. The write pass then only
//! reads this cache.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::SignatureResolver;
use crate::types::{FieldType, FieldValues, SignatureAsset, TemplateSchema};

/// Resolution outcome per asset id. Failures keep their message.
#[derive(Debug, Default)]
pub struct AssetCache {
    entries: HashMap<String, Result<Arc<SignatureAsset>, String>>,
}

impl AssetCache {
    pub fn get(&self, asset_id: &str) -> Option<&Result<Arc<SignatureAsset>, String>> {
        self.entries.get(asset_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Asset ids of signature fields that will be written, deduplicated.
pub fn requested_assets(schema: &TemplateSchema, values: &FieldValues) -> BTreeSet<String> {
    schema
        .fields()
        .filter(|f| f.field_type == FieldType::Signature)
        .filter_map(|f| values.writable(&f.id))
        .map(|v| v.as_text().trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

pub fn resolve_all(
    schema: &TemplateSchema,
    values: &FieldValues,
    resolver: &dyn SignatureResolver,
) -> AssetCache {
    let ids: Vec<String> = requested_assets(schema, values).into_iter().collect();
    let entries = ids
        .into_par_iter()
        .map(|id| {
            let result = resolver
                .resolve(&id)
                .map(Arc::new)
                .map_err(|e| e.to_string());
            (id, result)
        })
        .collect();
    AssetCache { entries }
}
