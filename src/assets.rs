//! Signature asset resolution.
//!
//! The renderer never fetches images itself; it asks a [`SignatureResolver`]
//! for each asset id it finds in the values. Resolution may be slow (disk,
//! network), so resolvers must be shareable across the rayon pool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::types::{AssetError, SignatureAsset};

/// Why an asset id did not produce an image.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode asset: {0}")]
    Decode(String),
    #[error("unsupported image format")]
    UnsupportedImage,
    #[error("asset resolution timed out")]
    Timeout,
}

impl From<AssetError> for ResolveError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::Unsupported => Self::UnsupportedImage,
            AssetError::Decode(msg) => Self::Decode(msg),
            AssetError::Empty => Self::Decode(err.to_string()),
        }
    }
}

/// Maps an asset id (the value of a signature field) to image bytes.
pub trait SignatureResolver: Send + Sync {
    fn resolve(&self, asset_id: &str) -> Result<SignatureAsset, ResolveError>;
}

impl<F> SignatureResolver for F
where
    F: Fn(&str) -> Result<SignatureAsset, ResolveError> + Send + Sync,
{
    fn resolve(&self, asset_id: &str) -> Result<SignatureAsset, ResolveError> {
        self(asset_id)
    }
}

/// Resolver that knows nothing. Every signature is skipped with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl SignatureResolver for NoAssets {
    fn resolve(&self, asset_id: &str) -> Result<SignatureAsset, ResolveError> {
        Err(ResolveError::NotFound(asset_id.to_string()))
    }
}

/// Decode a `data:image/png;base64,...` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ResolveError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ResolveError::Decode("not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ResolveError::Decode("data URL has no payload".to_string()))?;
    if !meta.starts_with("image/") {
        return Err(ResolveError::UnsupportedImage);
    }
    if !meta.ends_with(";base64") {
        return Err(ResolveError::Decode("data URL is not base64".to_string()));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| ResolveError::Decode(e.to_string()))
}

/// Assets held in memory, keyed by id.
///
/// An asset id that is itself a data URL resolves to its decoded content.
#[derive(Debug, Clone, Default)]
pub struct InlineAssets {
    assets: HashMap<String, SignatureAsset>,
}

impl InlineAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: SignatureAsset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    pub fn insert_bytes(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<(), ResolveError> {
        self.insert(SignatureAsset::from_bytes(id, name, bytes)?);
        Ok(())
    }

    pub fn insert_data_url(&mut self, id: impl Into<String>, url: &str) -> Result<(), ResolveError> {
        let id = id.into();
        let bytes = decode_data_url(url)?;
        self.insert_bytes(id.clone(), id, bytes)
    }

    /// Build from a JSON object of `asset_id -> data URL`.
    ///
    /// Entries that fail to decode are left out and logged; rendering then
    /// reports them as unresolved signatures.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let urls: HashMap<String, String> = serde_json::from_str(json)?;
        let mut assets = Self::new();
        for (id, url) in urls {
            if let Err(e) = assets.insert_data_url(id.clone(), &url) {
                log::warn!("signature '{id}' not loaded: {e}");
            }
        }
        Ok(assets)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl SignatureResolver for InlineAssets {
    fn resolve(&self, asset_id: &str) -> Result<SignatureAsset, ResolveError> {
        if let Some(asset) = self.assets.get(asset_id) {
            return Ok(asset.clone());
        }
        if asset_id.starts_with("data:") {
            let bytes = decode_data_url(asset_id)?;
            return Ok(SignatureAsset::from_bytes("inline", "inline", bytes)?);
        }
        Err(ResolveError::NotFound(asset_id.to_string()))
    }
}

/// `<root>/<asset_id>.png` (or `.jpg`, `.jpeg`) on disk.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ids are file stems; anything that could escape the root is refused.
    fn is_safe_id(asset_id: &str) -> bool {
        !asset_id.is_empty()
            && !asset_id.contains(['/', '\\'])
            && asset_id != "."
            && asset_id != ".."
    }
}

impl SignatureResolver for DirectoryAssets {
    fn resolve(&self, asset_id: &str) -> Result<SignatureAsset, ResolveError> {
        if !Self::is_safe_id(asset_id) {
            return Err(ResolveError::NotFound(asset_id.to_string()));
        }
        for ext in EXTENSIONS {
            let path = self.root.join(format!("{asset_id}.{ext}"));
            match std::fs::read(&path) {
                Ok(bytes) => return Ok(SignatureAsset::from_bytes(asset_id, asset_id, bytes)?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ResolveError::NotFound(asset_id.to_string()))
    }
}
