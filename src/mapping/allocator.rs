use super::MeshMapping;
use crate::asset::ItemModel;
use crate::error::Result;
use crate::types::{Item, ItemDefinition, ResourcePath};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Collects `(item, mesh)` obligations during a build and assigns ids.
///
/// Pairs present in the previous mapping keep their id. New pairs take the
/// smallest id not used by another mesh of the same item. Pairs no longer
/// required are dropped, so their ids may be handed out again later.
#[derive(Debug, Clone)]
pub struct MeshAllocator<'a> {
    previous: &'a MeshMapping,
    obligations: BTreeMap<Item, BTreeSet<ResourcePath>>,
}

impl<'a> MeshAllocator<'a> {
    pub fn new(previous: &'a MeshMapping) -> Self {
        Self {
            previous,
            obligations: BTreeMap::new(),
        }
    }

    /// Require an id for `mesh` on `item`.
    pub fn require(&mut self, item: Item, mesh: ResourcePath) {
        self.obligations.entry(item).or_default().insert(mesh);
    }

    /// Require every mesh variant of `model` on each of its target items.
    ///
    /// Fails when a target is not part of `definition`, leaving the collected
    /// obligations unchanged.
    pub fn require_model(&mut self, model: &ItemModel, definition: &ItemDefinition) -> Result<()> {
        for (item, mesh) in model.obligations(definition)? {
            self.require(item, mesh);
        }
        Ok(())
    }

    /// Obligations collected so far, in item then mesh order.
    pub fn obligations(&self) -> impl Iterator<Item = (&Item, &ResourcePath)> {
        self.obligations
            .iter()
            .flat_map(|(item, meshes)| meshes.iter().map(move |mesh| (item, mesh)))
    }

    /// Assign ids and produce the new mapping.
    pub fn allocate(&self) -> MeshMapping {
        let mut items = BTreeMap::new();
        for (item, meshes) in &self.obligations {
            let previous = self.previous.meshes(item);
            let mut assigned: BTreeMap<ResourcePath, u32> = BTreeMap::new();
            let mut used: BTreeSet<u32> = BTreeSet::new();
            let mut fresh = Vec::new();

            for mesh in meshes {
                match previous.and_then(|p| p.get(mesh)) {
                    Some(id) => {
                        assigned.insert(mesh.clone(), *id);
                        used.insert(*id);
                    }
                    None => fresh.push(mesh),
                }
            }

            let mut next = 1;
            for mesh in fresh {
                while used.contains(&next) {
                    next += 1;
                }
                debug!(item = %item.id, mesh = %mesh, id = next, "Assigned custom model data");
                assigned.insert(mesh.clone(), next);
                used.insert(next);
            }

            items.insert(item.clone(), assigned);
        }
        MeshMapping::from_items(items)
    }
}
