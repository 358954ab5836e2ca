//! Patch a template package with the edits of one render.
//!
//! Unmodified entries are copied via `raw_copy_file` (no recompression).
//! Rewritten entries keep their position in the archive; new parts (media,
//! drawings, their relationships) are appended in path order.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};

use zip::{ZipArchive, ZipWriter};

use crate::cell_ref::CellAddr;
use crate::drawings::{
    max_object_id, next_rel_id, parse_relationships, read_entry, rels_path_for, relative_target,
    sheet_drawing, write_relationships, Relationship,
};
use crate::error::{FillError, Result};
use crate::namespaces::{is_image_relationship, CT_DRAWING, REL_DRAWING, REL_IMAGE};
use crate::types::{Grid, SourcePackage, Workbook};

use super::content_types::{patch_content_types, ContentTypes};
use super::drawing_writer::{extend_drawing, new_drawing, picture_anchor};
use super::sheet_patch::{patch_sheet_xml, CellPatch};
use super::styles_patch::{patch_styles, StyleMap};
use super::{entry_options, Alignment, PlacedImage, SheetEdits};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Rewritten and added parts, keyed by path.
struct PartSet<'n> {
    existing: &'n BTreeSet<String>,
    parts: BTreeMap<String, Vec<u8>>,
    content_types: ContentTypes,
    /// media key -> media part path
    media: BTreeMap<String, String>,
}

impl<'n> PartSet<'n> {
    fn new(existing: &'n BTreeSet<String>) -> Self {
        Self {
            existing,
            parts: BTreeMap::new(),
            content_types: ContentTypes::default(),
            media: BTreeMap::new(),
        }
    }

    fn is_taken(&self, path: &str) -> bool {
        self.existing.contains(path) || self.parts.contains_key(path)
    }

    /// First unused `{stem}{n}.{ext}`.
    fn fresh_path(&self, stem: &str, ext: &str) -> String {
        (1u32..)
            .map(|n| format!("{stem}{n}.{ext}"))
            .find(|p| !self.is_taken(p))
            .unwrap_or_else(|| format!("{stem}0.{ext}"))
    }

    /// Current bytes of a part: our rewrite if any, else the archive entry.
    fn current(&self, archive: &mut Archive<'_>, path: &str) -> Option<Vec<u8>> {
        match self.parts.get(path) {
            Some(bytes) => Some(bytes.clone()),
            None => read_entry(archive, path),
        }
    }

    /// Media part for an image, written once per media key.
    fn media_part(&mut self, image: &PlacedImage) -> String {
        if let Some(path) = self.media.get(&image.media_key) {
            return path.clone();
        }
        let kind = image.asset.kind;
        let path = self.fresh_path("xl/media/image", kind.extension());
        self.parts.insert(path.clone(), image.asset.bytes.clone());
        self.content_types
            .add_default(kind.extension(), kind.content_type());
        self.media.insert(image.media_key.clone(), path.clone());
        path
    }
}

/// Patch `source` with `edits` (non-empty, keyed by sheet index).
pub(crate) fn patch_package(
    source: &SourcePackage,
    workbook: &Workbook,
    edits: &BTreeMap<usize, &SheetEdits>,
) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(source.bytes.as_slice()))?;
    let names: BTreeSet<String> = archive.file_names().map(str::to_string).collect();
    let mut parts = PartSet::new(&names);

    let styles = alignment_styles(&mut archive, source, workbook, edits, &mut parts)?;

    for (&index, sheet_edits) in edits {
        let (Some(grid), Some(sheet_path)) = (workbook.sheets.get(index), source.sheet_paths.get(index))
        else {
            log::warn!("edits for unknown sheet index {index} ignored");
            continue;
        };
        let drawing_rid = if sheet_edits.images.is_empty() {
            None
        } else {
            attach_images(&mut archive, &mut parts, sheet_path, &sheet_edits.images)?
        };
        let original = read_entry(&mut archive, sheet_path)
            .ok_or_else(|| FillError::Parse(format!("worksheet part {sheet_path} is missing")))?;
        let patches = cell_patches(grid, sheet_edits, &styles);
        log::debug!(
            "patching {sheet_path}: {} cells, {} pictures",
            patches.len(),
            sheet_edits.images.len()
        );
        let patched = patch_sheet_xml(&original, &patches, drawing_rid.as_deref())?;
        parts.parts.insert(sheet_path.clone(), patched);
    }

    if !parts.content_types.is_empty() {
        let original = read_entry(&mut archive, CONTENT_TYPES_PART)
            .ok_or_else(|| FillError::Parse("package has no [Content_Types].xml".to_string()))?;
        let patched = patch_content_types(&original, &parts.content_types)?;
        parts.parts.insert(CONTENT_TYPES_PART.to_string(), patched);
    }

    write_archive(&mut archive, parts.parts, source.bytes.len())
}

/// Add alignment variants to the styles part for every aligned cell.
fn alignment_styles(
    archive: &mut Archive<'_>,
    source: &SourcePackage,
    workbook: &Workbook,
    edits: &BTreeMap<usize, &SheetEdits>,
    parts: &mut PartSet<'_>,
) -> Result<StyleMap> {
    let requests: BTreeSet<(u32, Alignment)> = edits
        .iter()
        .filter_map(|(&i, e)| workbook.sheets.get(i).map(|grid| (grid, e)))
        .flat_map(|(grid, e)| {
            e.alignments
                .iter()
                .map(move |(&addr, &a)| (base_style(grid, addr), a))
        })
        .collect();
    if requests.is_empty() {
        return Ok(StyleMap::new());
    }

    let Some(path) = source.styles_path.as_deref() else {
        log::warn!("package has no styles part; {} alignment overrides dropped", requests.len());
        return Ok(StyleMap::new());
    };
    let Some(original) = read_entry(archive, path) else {
        log::warn!("styles part {path} is missing; alignment overrides dropped");
        return Ok(StyleMap::new());
    };
    let (patched, map) = patch_styles(&original, &requests)?;
    parts.parts.insert(path.to_string(), patched);
    Ok(map)
}

fn base_style(grid: &Grid, addr: CellAddr) -> u32 {
    grid.get(addr).and_then(|c| c.style).unwrap_or(0)
}

/// Patches for every touched cell, in row-major order.
fn cell_patches(grid: &Grid, edits: &SheetEdits, styles: &StyleMap) -> Vec<CellPatch> {
    edits
        .cells
        .iter()
        .map(|&addr| {
            let cell = grid.get(addr);
            let base = cell.as_ref().and_then(|c| c.style);
            let style = edits
                .alignments
                .get(&addr)
                .and_then(|&a| styles.get(&(base.unwrap_or(0), a)).copied())
                .or(base);
            CellPatch {
                addr,
                value: cell.and_then(|c| c.value.cloned()),
                style,
            }
        })
        .collect()
}

/// Put `images` into the sheet's drawing part, creating it if needed.
///
/// Returns the relationship id of a newly linked drawing, which the worksheet
/// must reference; `None` when the sheet already had one.
fn attach_images(
    archive: &mut Archive<'_>,
    parts: &mut PartSet<'_>,
    sheet_path: &str,
    images: &[PlacedImage],
) -> Result<Option<String>> {
    let sheet_rels_path = rels_path_for(sheet_path);
    let mut sheet_rels = parts
        .current(archive, &sheet_rels_path)
        .map(|b| parse_relationships(&b))
        .unwrap_or_default();

    let (new_rid, drawing_path) = match sheet_drawing(sheet_path, &sheet_rels) {
        Some((_, path)) => (None, path),
        None => {
            let path = parts.fresh_path("xl/drawings/drawing", "xml");
            let rid = next_rel_id(&sheet_rels);
            sheet_rels.push(Relationship {
                id: rid.clone(),
                rel_type: REL_DRAWING.to_string(),
                target: relative_target(sheet_path, &path),
                external: false,
            });
            parts
                .parts
                .insert(sheet_rels_path, write_relationships(&sheet_rels).into_bytes());
            (Some(rid), path)
        }
    };
    parts.content_types.add_override(&drawing_path, CT_DRAWING);

    let existing = parts.current(archive, &drawing_path);
    let drawing_rels_path = rels_path_for(&drawing_path);
    let mut drawing_rels = parts
        .current(archive, &drawing_rels_path)
        .map(|b| parse_relationships(&b))
        .unwrap_or_default();

    let mut object_id = existing.as_deref().map_or(0, max_object_id);
    let mut anchors = Vec::with_capacity(images.len());
    for image in images {
        let media = parts.media_part(image);
        let target = relative_target(&drawing_path, &media);
        let existing_rel = drawing_rels
            .iter()
            .find(|r| r.target == target && !r.external && is_image_relationship(&r.rel_type));
        let rid = match existing_rel {
            Some(rel) => rel.id.clone(),
            None => {
                let rid = next_rel_id(&drawing_rels);
                drawing_rels.push(Relationship {
                    id: rid.clone(),
                    rel_type: REL_IMAGE.to_string(),
                    target,
                    external: false,
                });
                rid
            }
        };
        object_id += 1;
        anchors.push(picture_anchor(image, object_id, &rid));
    }

    let drawing = match existing {
        Some(xml) => extend_drawing(&xml, &anchors)?,
        None => new_drawing(&anchors),
    };
    parts.parts.insert(drawing_path, drawing);
    parts
        .parts
        .insert(drawing_rels_path, write_relationships(&drawing_rels).into_bytes());
    Ok(new_rid)
}

fn write_archive(
    archive: &mut Archive<'_>,
    mut parts: BTreeMap<String, Vec<u8>>,
    size_hint: usize,
) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(size_hint + 4096)));
    let options = entry_options();

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        let name = entry.name().to_string();
        match parts.remove(&name) {
            Some(bytes) => {
                writer.start_file(name, options)?;
                writer.write_all(&bytes)?;
            }
            None => writer.raw_copy_file(entry)?,
        }
    }
    for (name, bytes) in parts {
        writer.start_file(name, options)?;
        writer.write_all(&bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}
