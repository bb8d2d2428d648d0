//! Read-only view of a built pack.

use crate::asset::{ArmorTexture, AssetRegistry, Font, ItemModel, MeshState, SoundAsset};
use crate::error::Result;
use crate::mapping::MeshMapping;
use crate::types::{Item, ItemDefinition, ResourcePath, Rgb};

/// Finalized assets of a pack plus its frozen mesh mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    name: String,
    pack_format: u32,
    item_definition: ItemDefinition,
    assets: AssetRegistry,
    mesh_mapping: MeshMapping,
}

impl Resources {
    pub fn new(
        name: impl Into<String>,
        pack_format: u32,
        item_definition: ItemDefinition,
        assets: AssetRegistry,
        mesh_mapping: MeshMapping,
    ) -> Self {
        Self {
            name: name.into(),
            pack_format,
            item_definition,
            assets,
            mesh_mapping,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pack_format(&self) -> u32 {
        self.pack_format
    }

    pub fn item_definition(&self) -> &ItemDefinition {
        &self.item_definition
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn mesh_mapping(&self) -> &MeshMapping {
        &self.mesh_mapping
    }

    pub fn item_model(&self, path: &ResourcePath) -> Option<&ItemModel> {
        self.assets.get(path)
    }

    pub fn sound(&self, path: &ResourcePath) -> Option<&SoundAsset> {
        self.assets.get(path)
    }

    pub fn font(&self, path: &ResourcePath) -> Option<&Font> {
        self.assets.get(path)
    }

    pub fn armor_texture(&self, path: &ResourcePath) -> Option<&ArmorTexture> {
        self.assets.get(path)
    }

    /// Armor texture selected by a leather dye color.
    pub fn armor_texture_by_color(&self, color: Rgb) -> Option<&ArmorTexture> {
        self.assets
            .iter::<ArmorTexture>()
            .find(|armor| armor.color == color)
    }

    /// Custom model data for rendering `model` in `state` on `item`.
    ///
    /// `Ok(None)` when the model is unknown or does not target `item`.
    pub fn custom_model_data(
        &self,
        model: &ResourcePath,
        item: &Item,
        state: &MeshState,
    ) -> Result<Option<u32>> {
        let Some(model) = self.item_model(model) else {
            return Ok(None);
        };
        if !model.target_items.contains(&item.id) {
            return Ok(None);
        }
        let mesh = model.resolve_mesh(state)?;
        Ok(self.mesh_mapping.custom_model_data(item, &mesh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ItemModelKind;
    use crate::mapping::MeshAllocator;

    fn path(s: &str) -> ResourcePath {
        ResourcePath::parse(s).unwrap()
    }

    #[test]
    fn test_runtime_lookup() {
        let stick = Item::item("stick").unwrap();
        let definition = ItemDefinition::new([stick.clone()]);
        let model = ItemModel::new(
            path("demo:custom_stick"),
            [path("stick")],
            ItemModelKind::Combined {
                mesh: path("demo:custom_stick"),
                elements: ["glow".to_string()].into_iter().collect(),
            },
        )
        .unwrap();

        let previous = MeshMapping::new();
        let mut allocator = MeshAllocator::new(&previous);
        allocator.require_model(&model, &definition).unwrap();
        let mut assets = AssetRegistry::new();
        assets.put(model).unwrap();
        let resources = Resources::new("demo", 15, definition, assets, allocator.allocate());

        let glow = MeshState::Elements(["glow".to_string()].into_iter().collect());
        assert_eq!(
            resources
                .custom_model_data(&path("demo:custom_stick"), &stick, &glow)
                .unwrap(),
            Some(2)
        );
        assert_eq!(
            resources
                .custom_model_data(&path("demo:custom_stick"), &Item::item("paper").unwrap(), &glow)
                .unwrap(),
            None
        );
        assert_eq!(
            resources
                .custom_model_data(&path("demo:other"), &stick, &MeshState::Base)
                .unwrap(),
            None
        );
        let bad = MeshState::Elements(["fire".to_string()].into_iter().collect());
        assert!(resources
            .custom_model_data(&path("demo:custom_stick"), &stick, &bad)
            .is_err());
    }
}
