//! Declared assets and the per-build asset registry.

mod item_model;

pub use item_model::{ItemModel, ItemModelKind, MeshState, MeshVariant, VariantPart};

use crate::error::{PackError, Result};
use crate::types::{ResourcePath, Rgb};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sound event registered in a namespace's `sounds.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundAsset {
    pub path: ResourcePath,
    /// Sound event key, `namespace:event`.
    pub sound_path: ResourcePath,
}

/// A font definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font {
    pub path: ResourcePath,
    /// Font identifier used in text components.
    pub font_path: ResourcePath,
}

/// A custom armor texture selected by leather dye color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorTexture {
    pub path: ResourcePath,
    pub color: Rgb,
    pub has_layer_1: bool,
    pub has_layer_2: bool,
}

/// An asset kind stored in the [`AssetRegistry`].
pub trait Asset: Clone + 'static {
    /// Category name; paths are unique within a category.
    const CATEGORY: &'static str;

    fn path(&self) -> &ResourcePath;

    fn assets(registry: &AssetRegistry) -> &AssetMap<Self>;

    fn assets_mut(registry: &mut AssetRegistry) -> &mut AssetMap<Self>;
}

macro_rules! impl_asset {
    ($ty:ty, $category:literal, $field:ident) => {
        impl Asset for $ty {
            const CATEGORY: &'static str = $category;

            fn path(&self) -> &ResourcePath {
                &self.path
            }

            fn assets(registry: &AssetRegistry) -> &AssetMap<Self> {
                &registry.$field
            }

            fn assets_mut(registry: &mut AssetRegistry) -> &mut AssetMap<Self> {
                &mut registry.$field
            }
        }
    };
}

impl_asset!(ItemModel, "item model", item_models);
impl_asset!(SoundAsset, "sound", sounds);
impl_asset!(Font, "font", fonts);
impl_asset!(ArmorTexture, "armor texture", armor_textures);

/// Assets of one category, keyed and ordered by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetMap<A> {
    assets: BTreeMap<ResourcePath, A>,
}

impl<A> Default for AssetMap<A> {
    fn default() -> Self {
        Self {
            assets: BTreeMap::new(),
        }
    }
}

impl<A: Asset> AssetMap<A> {
    pub fn get(&self, path: &ResourcePath) -> Option<&A> {
        self.assets.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Check that every key matches the path stored in its asset.
    pub(crate) fn check_keys(&self) -> Result<()> {
        match self.assets.iter().find(|(key, asset)| *key != asset.path()) {
            Some((key, asset)) => Err(PackError::CorruptArchive(format!(
                "{} stored under '{}' has path '{}'",
                A::CATEGORY,
                key,
                asset.path()
            ))),
            None => Ok(()),
        }
    }
}

/// In-memory catalog of the assets declared in one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRegistry {
    item_models: AssetMap<ItemModel>,
    sounds: AssetMap<SoundAsset>,
    fonts: AssetMap<Font>,
    armor_textures: AssetMap<ArmorTexture>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset. A path already used in the same category is rejected.
    pub fn put<A: Asset>(&mut self, asset: A) -> Result<()> {
        let map = A::assets_mut(self);
        if map.assets.contains_key(asset.path()) {
            return Err(PackError::DuplicateAsset {
                category: A::CATEGORY,
                path: asset.path().to_string(),
            });
        }
        map.assets.insert(asset.path().clone(), asset);
        Ok(())
    }

    pub fn get<A: Asset>(&self, path: &ResourcePath) -> Option<&A> {
        A::assets(self).get(path)
    }

    pub fn remove<A: Asset>(&mut self, path: &ResourcePath) -> Option<A> {
        A::assets_mut(self).assets.remove(path)
    }

    /// Assets of one category in path order.
    pub fn iter<A: Asset>(&self) -> impl Iterator<Item = &A> {
        A::assets(self).iter()
    }

    pub fn assets<A: Asset>(&self) -> &AssetMap<A> {
        A::assets(self)
    }

    pub(crate) fn set_assets<A: Asset>(&mut self, assets: AssetMap<A>) {
        *A::assets_mut(self) = assets;
    }

    pub fn item_models(&self) -> &AssetMap<ItemModel> {
        &self.item_models
    }

    pub fn sounds(&self) -> &AssetMap<SoundAsset> {
        &self.sounds
    }

    pub fn fonts(&self) -> &AssetMap<Font> {
        &self.fonts
    }

    pub fn armor_textures(&self) -> &AssetMap<ArmorTexture> {
        &self.armor_textures
    }

    /// Total number of assets across all categories.
    pub fn len(&self) -> usize {
        self.item_models.len() + self.sounds.len() + self.fonts.len() + self.armor_textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
