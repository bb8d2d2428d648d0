//! Item types that models can target.

use super::ResourcePath;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A game item or block type, e.g. `minecraft:stick`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: ResourcePath,
    #[serde(rename = "block")]
    pub is_block: bool,
}

impl Item {
    pub fn new(id: ResourcePath, is_block: bool) -> Self {
        Self { id, is_block }
    }

    pub fn item(id: &str) -> Result<Self> {
        Ok(Self::new(ResourcePath::parse(id)?, false))
    }

    pub fn block(id: &str) -> Result<Self> {
        Ok(Self::new(ResourcePath::parse(id)?, true))
    }

    /// Path of the item model file that carries this item's overrides.
    ///
    /// Blocks are rendered in inventories through their item model too.
    pub fn model_file_path(&self) -> String {
        format!(
            "assets/{}/models/item/{}.json",
            self.id.namespace(),
            self.id.value()
        )
    }

    /// Vanilla-like item model used when the project does not supply one.
    pub fn default_model(&self) -> serde_json::Value {
        if self.is_block {
            serde_json::json!({
                "parent": format!("{}:block/{}", self.id.namespace(), self.id.value())
            })
        } else {
            serde_json::json!({
                "parent": "minecraft:item/generated",
                "textures": {
                    "layer0": format!("{}:item/{}", self.id.namespace(), self.id.value())
                }
            })
        }
    }
}

/// The set of item types known to a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDefinition {
    items: BTreeMap<ResourcePath, Item>,
}

/// On-disk layout of an item definition file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinitionFile {
    #[serde(default)]
    pub item: Vec<String>,
    #[serde(default)]
    pub block: Vec<String>,
}

impl ItemDefinition {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id.clone(), item)).collect(),
        }
    }

    /// Build from the `{ "item": [...], "block": [...] }` layout.
    ///
    /// A block entry wins over an item entry with the same identifier.
    pub fn from_file(file: &ItemDefinitionFile) -> Result<Self> {
        let mut items = BTreeMap::new();
        for id in &file.item {
            let item = Item::item(id)?;
            items.insert(item.id.clone(), item);
        }
        for id in &file.block {
            let item = Item::block(id)?;
            items.insert(item.id.clone(), item);
        }
        Ok(Self { items })
    }

    /// Parse the JSON item definition layout.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ItemDefinitionFile = serde_json::from_str(json)?;
        Self::from_file(&file)
    }

    /// Back to the `{ "item": [...], "block": [...] }` layout, sorted.
    pub fn to_file(&self) -> ItemDefinitionFile {
        let (blocks, items): (Vec<&Item>, Vec<&Item>) =
            self.items.values().partition(|item| item.is_block);
        ItemDefinitionFile {
            item: items.into_iter().map(|i| i.id.to_string()).collect(),
            block: blocks.into_iter().map(|i| i.id.to_string()).collect(),
        }
    }

    pub fn get(&self, id: &ResourcePath) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &ResourcePath) -> bool {
        self.items.contains_key(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_equality_uses_block_flag() {
        assert_ne!(Item::item("stone").unwrap(), Item::block("stone").unwrap());
        assert_eq!(Item::item("stick").unwrap(), Item::item("minecraft:stick").unwrap());
    }

    #[test]
    fn test_definition_from_json() {
        let def = ItemDefinition::from_json(
            r#"{ "item": ["minecraft:stick", "paper"], "block": ["minecraft:note_block"] }"#,
        )
        .unwrap();

        assert_eq!(def.len(), 3);
        let stick = def.get(&ResourcePath::parse("stick").unwrap()).unwrap();
        assert!(!stick.is_block);
        let note = def.get(&ResourcePath::parse("note_block").unwrap()).unwrap();
        assert!(note.is_block);
        assert!(!def.contains(&ResourcePath::parse("diamond").unwrap()));
    }

    #[test]
    fn test_definition_file_round_trip() {
        let def = ItemDefinition::from_json(r#"{ "item": ["stick", "apple"], "block": ["stone"] }"#).unwrap();
        let file = def.to_file();
        assert_eq!(file.item, vec!["minecraft:apple", "minecraft:stick"]);
        assert_eq!(file.block, vec!["minecraft:stone"]);
        assert_eq!(ItemDefinition::from_file(&file).unwrap(), def);
    }

    #[test]
    fn test_block_overrides_item_entry() {
        let def = ItemDefinition::from_json(r#"{ "item": ["stone"], "block": ["stone"] }"#).unwrap();
        assert_eq!(def.len(), 1);
        assert!(def.items().next().unwrap().is_block);
    }

    #[test]
    fn test_model_file_path() {
        assert_eq!(
            Item::item("stick").unwrap().model_file_path(),
            "assets/minecraft/models/item/stick.json"
        );
        assert_eq!(
            Item::block("note_block").unwrap().model_file_path(),
            "assets/minecraft/models/item/note_block.json"
        );
    }

    #[test]
    fn test_default_model() {
        let stick = Item::item("stick").unwrap().default_model();
        assert_eq!(stick["textures"]["layer0"], "minecraft:item/stick");
        let block = Item::block("note_block").unwrap().default_model();
        assert_eq!(block["parent"], "minecraft:block/note_block");
    }
}
