//! `.propack` archive layout.

use crate::types::ItemDefinitionFile;
use serde::{Deserialize, Serialize};

/// Format version written by this crate and the only one it reads.
pub const FORMAT_VERSION: u32 = 1;

pub const MANIFEST: &str = "propack/manifest.json";
pub const MESH_MAPPING: &str = "propack/mesh_mapping.json";
pub const ITEM_MODELS: &str = "propack/item_models.json";
pub const SOUNDS: &str = "propack/sounds.json";
pub const ARMOR_TEXTURES: &str = "propack/armor_textures.json";
pub const FONTS: &str = "propack/fonts.json";

/// Contents of `propack/manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub name: String,
    pub item_definition: ItemDefinitionFile,
    pub pack_format: u32,
}

/// Only the version field, read before the rest of the manifest.
#[derive(Deserialize)]
pub(crate) struct ManifestVersion {
    pub format_version: u32,
}
