//! Custom model data mapping: `(item, mesh) -> id`.

mod allocator;

pub use allocator::MeshAllocator;

use crate::error::{PackError, Result};
use crate::files::{stage_file, StagedFile};
use crate::types::{Item, ResourcePath};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// One row of the serialized mapping table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshMappingEntry {
    pub item: ResourcePath,
    pub block: bool,
    pub mesh: ResourcePath,
    pub id: u32,
}

/// Frozen mapping from item type and mesh to custom model data.
///
/// Within one item, no two meshes share an id. Serializes as a list of
/// [`MeshMappingEntry`] sorted by item then mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<MeshMappingEntry>", try_from = "Vec<MeshMappingEntry>")]
pub struct MeshMapping {
    items: BTreeMap<Item, BTreeMap<ResourcePath, u32>>,
}

impl MeshMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows, rejecting a repeated pair or an id shared within an item.
    pub fn from_entries(entries: impl IntoIterator<Item = MeshMappingEntry>) -> Result<Self> {
        let mut items: BTreeMap<Item, BTreeMap<ResourcePath, u32>> = BTreeMap::new();
        let mut used: BTreeMap<Item, BTreeSet<u32>> = BTreeMap::new();
        for entry in entries {
            let item = Item::new(entry.item, entry.block);
            if entry.id == 0 {
                return Err(PackError::CorruptArchive(format!(
                    "mesh '{}' for '{}' has id 0",
                    entry.mesh, item.id
                )));
            }
            if !used.entry(item.clone()).or_default().insert(entry.id) {
                return Err(PackError::CorruptArchive(format!(
                    "id {} assigned twice for '{}'",
                    entry.id, item.id
                )));
            }
            let meshes = items.entry(item.clone()).or_default();
            if meshes.insert(entry.mesh.clone(), entry.id).is_some() {
                return Err(PackError::CorruptArchive(format!(
                    "mesh '{}' mapped twice for '{}'",
                    entry.mesh, item.id
                )));
            }
        }
        Ok(Self { items })
    }

    pub(crate) fn from_items(items: BTreeMap<Item, BTreeMap<ResourcePath, u32>>) -> Self {
        Self { items }
    }

    /// Custom model data for `mesh` rendered on `item`.
    pub fn custom_model_data(&self, item: &Item, mesh: &ResourcePath) -> Option<u32> {
        self.items.get(item)?.get(mesh).copied()
    }

    /// Meshes mapped for `item`, ordered by mesh path.
    pub fn meshes(&self, item: &Item) -> Option<&BTreeMap<ResourcePath, u32>> {
        self.items.get(item)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.keys()
    }

    /// All rows, sorted by item then mesh.
    pub fn entries(&self) -> Vec<MeshMappingEntry> {
        self.items
            .iter()
            .flat_map(|(item, meshes)| {
                meshes.iter().map(move |(mesh, id)| MeshMappingEntry {
                    item: item.id.clone(),
                    block: item.is_block,
                    mesh: mesh.clone(),
                    id: *id,
                })
            })
            .collect()
    }

    /// Number of `(item, mesh)` pairs.
    pub fn len(&self) -> usize {
        self.items.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a mapping table written by [`MeshMapping::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mapping: MeshMapping =
            serde_json::from_slice(&data).map_err(|e| PackError::from(e).in_file(path.display().to_string()))?;
        debug!(path = %path.display(), entries = mapping.len(), "Loaded mesh mapping");
        Ok(mapping)
    }

    /// Write the mapping table into a temporary file next to `path`.
    pub fn stage<P: AsRef<Path>>(&self, path: P) -> Result<StagedFile> {
        let (staged, ()) = stage_file(path.as_ref(), |file| {
            serde_json::to_writer_pretty(file, self)?;
            Ok(())
        })?;
        Ok(staged)
    }

    /// Write the mapping table, replacing any previous file only on success.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.stage(path)?.commit()
    }
}

impl From<MeshMapping> for Vec<MeshMappingEntry> {
    fn from(mapping: MeshMapping) -> Self {
        mapping.entries()
    }
}

impl TryFrom<Vec<MeshMappingEntry>> for MeshMapping {
    type Error = PackError;

    fn try_from(entries: Vec<MeshMappingEntry>) -> Result<Self> {
        Self::from_entries(entries)
    }
}
