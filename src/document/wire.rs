//! Persisted album format.
//!
//! Mirrors the runtime model: subtree → top-level folders → nested child folders, with flat
//! image/text arrays keyed by folder id. Sizes travel as `"width,height"` strings, a `null` child
//! is a reserved page and an empty slot is a folder with `id: 0`.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    document::ids::advance_counter,
    document::model::{Album, Child, Folder, FolderKind, Image, Subtree, Text},
    foundation::core::{CropRect, FolderId, LayoutId, Point, Size},
    foundation::error::{FolioError, FolioResult},
    foundation::events::Correction,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub(crate) struct PivotDef {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl<'de> Deserialize<'de> for PivotDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([f64; 2]),
            Obj { x: f64, y: f64 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([x, y]) => Ok(Self { x, y }),
            Repr::Obj { x, y } => Ok(Self { x, y }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FolderDef {
    pub(crate) id: u32,
    #[serde(rename = "type")]
    pub(crate) kind: FolderKind,
    pub(crate) size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) pivot: Option<PivotDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) layout: Option<LayoutId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) frame: Option<String>,
    #[serde(default)]
    pub(crate) locked: bool,
    #[serde(default)]
    pub(crate) angle: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) children: Vec<Option<FolderDef>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct SubtreeDef {
    #[serde(default)]
    pub(crate) folders: Vec<FolderDef>,
    #[serde(default)]
    pub(crate) images: Vec<Image>,
    #[serde(default)]
    pub(crate) texts: Vec<Text>,
    #[serde(default)]
    pub(crate) next_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AlbumDef {
    pub(crate) theme: String,
    #[serde(default)]
    pub(crate) book: SubtreeDef,
    #[serde(default)]
    pub(crate) cover: SubtreeDef,
}

impl Album {
    /// Parse an album from a JSON reader.
    ///
    /// Orphaned image/text records are pruned and a lagging id counter is advanced; both are
    /// reported as corrections.
    pub fn from_reader<R: std::io::Read>(r: R) -> FolioResult<(Self, Vec<Correction>)> {
        let def: AlbumDef = serde_json::from_reader(r)
            .map_err(|e| FolioError::serde(format!("parse album JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse an album from a JSON string.
    pub fn from_json_str(s: &str) -> FolioResult<(Self, Vec<Correction>)> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse an album from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FolioResult<(Self, Vec<Correction>)> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FolioError::validation(format!("open album JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> FolioResult<String> {
        serde_json::to_string_pretty(&self.to_def())
            .map_err(|e| FolioError::serde(format!("encode album JSON: {e}")))
    }

    /// Serialize as pretty JSON into `w`.
    pub fn to_writer<W: std::io::Write>(&self, w: W) -> FolioResult<()> {
        serde_json::to_writer_pretty(w, &self.to_def())
            .map_err(|e| FolioError::serde(format!("encode album JSON: {e}")))
    }

    pub(crate) fn from_def(def: AlbumDef) -> FolioResult<(Self, Vec<Correction>)> {
        if def.theme.trim().is_empty() {
            return Err(FolioError::validation("album theme must be non-empty"));
        }
        let mut corrections = Vec::new();
        let book = subtree_from_def(def.book, "book", &mut corrections)?;
        let cover = subtree_from_def(def.cover, "cover", &mut corrections)?;
        for c in &corrections {
            tracing::warn!(correction = ?c, "album load corrected");
        }
        Ok((
            Self {
                theme: def.theme,
                book,
                cover,
            },
            corrections,
        ))
    }

    pub(crate) fn to_def(&self) -> AlbumDef {
        AlbumDef {
            theme: self.theme.clone(),
            book: subtree_to_def(&self.book),
            cover: subtree_to_def(&self.cover),
        }
    }
}

fn subtree_from_def(
    def: SubtreeDef,
    which: &str,
    corrections: &mut Vec<Correction>,
) -> FolioResult<Subtree> {
    let mut folders = Vec::with_capacity(def.folders.len());
    for f in def.folders {
        folders.push(Arc::new(folder_from_def(f, which)?));
    }
    let mut subtree = Subtree {
        folders,
        images: def.images,
        texts: def.texts,
        next_id: def.next_id,
    };

    if let Some(dup) = crate::document::ids::first_duplicate(&subtree) {
        return Err(FolioError::validation(format!(
            "{which}: folder id {} is used more than once",
            dup.0
        )));
    }
    let mut image_ids = BTreeSet::new();
    for img in &subtree.images {
        if !image_ids.insert(img.id) {
            return Err(FolioError::validation(format!(
                "{which}: image id {} is used more than once",
                img.id.0
            )));
        }
    }

    prune_orphans(&mut subtree, corrections);
    heal_crops(&mut subtree, corrections);
    if let Some(from) = advance_counter(&mut subtree) {
        corrections.push(Correction::CounterAdvanced {
            from,
            to: subtree.next_id,
        });
    }
    Ok(subtree)
}

/// Drop image/text records whose binding does not resolve to a matching slot.
pub(crate) fn prune_orphans(subtree: &mut Subtree, corrections: &mut Vec<Correction>) {
    let mut image_slots = BTreeSet::new();
    let mut text_slots = BTreeSet::new();
    for root in &subtree.folders {
        root.walk(&mut |f| match f.kind {
            FolderKind::ImageSlot if !f.id.is_empty() => {
                image_slots.insert(f.id);
            }
            k if k.binds_text() && !f.id.is_empty() => {
                text_slots.insert(f.id);
            }
            _ => {}
        });
    }

    let mut bound = BTreeSet::new();
    subtree.images.retain(|img| {
        // A second record on the same slot is as unreachable as a dangling one.
        let keep = image_slots.contains(&img.folder_id) && bound.insert(img.folder_id);
        if !keep {
            corrections.push(Correction::OrphanPruned {
                folder: img.folder_id,
            });
        }
        keep
    });
    let mut bound = BTreeSet::new();
    subtree.texts.retain(|t| {
        let keep = text_slots.contains(&t.folder_id) && bound.insert(t.folder_id);
        if !keep {
            corrections.push(Correction::OrphanPruned {
                folder: t.folder_id,
            });
        }
        keep
    });
}

/// Replace stored crops that cannot be displayed with the full frame.
fn heal_crops(subtree: &mut Subtree, corrections: &mut Vec<Correction>) {
    for img in subtree.images.iter_mut().filter(|img| !img.crop.is_valid()) {
        tracing::warn!(image = %img.id, crop = ?img.crop, "invalid stored crop, using full frame");
        img.crop = CropRect::FULL;
        corrections.push(Correction::InvalidCrop {
            image: Some(img.id),
        });
    }
}

fn folder_from_def(def: FolderDef, which: &str) -> FolioResult<Folder> {
    if !(def.size.width.is_finite() && def.size.height.is_finite())
        || def.size.width < 0.0
        || def.size.height < 0.0
    {
        return Err(FolioError::validation(format!(
            "{which}: folder {} has invalid size '{}'",
            def.id,
            def.size.to_wire()
        )));
    }
    let is_empty_kind = def.kind == FolderKind::EmptySlot;
    if is_empty_kind != (def.id == 0) {
        return Err(FolioError::validation(format!(
            "{which}: id 0 is reserved for empty slots (folder id {} is {:?})",
            def.id, def.kind
        )));
    }

    let is_spread = def.kind == FolderKind::Spread;
    if is_spread {
        if def.children.len() != 2 {
            return Err(FolioError::validation(format!(
                "{which}: spread {} must have exactly two entries, found {}",
                def.id,
                def.children.len()
            )));
        }
        if def.children.iter().all(Option::is_none) {
            return Err(FolioError::validation(format!(
                "{which}: spread {} has no pages",
                def.id
            )));
        }
    }

    let mut children = Vec::with_capacity(def.children.len());
    for child in def.children {
        match child {
            Some(c) => children.push(Child::Folder(folder_from_def(c, which)?)),
            None if is_spread => children.push(Child::Reserved),
            None => {
                return Err(FolioError::validation(format!(
                    "{which}: only spreads may hold reserved (null) entries, folder {} does",
                    def.id
                )));
            }
        }
    }

    let pivot = def
        .pivot
        .map(|p| Point::new(p.x, p.y))
        .unwrap_or_else(|| Point::new(def.size.width * 0.5, def.size.height * 0.5));

    Ok(Folder {
        id: FolderId(def.id),
        kind: def.kind,
        size: def.size,
        pivot,
        layout: def.layout,
        background: def.background,
        frame: def.frame,
        locked: def.locked,
        angle: def.angle,
        children,
    })
}

fn subtree_to_def(subtree: &Subtree) -> SubtreeDef {
    SubtreeDef {
        folders: subtree.folders.iter().map(|f| folder_to_def(f)).collect(),
        images: subtree.images.clone(),
        texts: subtree.texts.clone(),
        next_id: subtree.next_id,
    }
}

fn folder_to_def(folder: &Folder) -> FolderDef {
    FolderDef {
        id: folder.id.0,
        kind: folder.kind,
        size: folder.size,
        pivot: Some(PivotDef {
            x: folder.pivot.x,
            y: folder.pivot.y,
        }),
        layout: folder.layout.clone(),
        background: folder.background.clone(),
        frame: folder.frame.clone(),
        locked: folder.locked,
        angle: folder.angle,
        children: folder
            .children
            .iter()
            .map(|c| c.folder().map(folder_to_def))
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/wire.rs"]
mod tests;
