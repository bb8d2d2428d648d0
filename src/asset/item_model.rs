//! Item models and runtime mesh resolution.
//!
//! An item model maps runtime state to a mesh path. Variant meshes are named
//! from the base mesh so the same state always produces the same path:
//!
//! - combined: `<base>_<element>.<element>` with elements sorted
//! - slot: `<base>_<slot>-<element>.<slot>-<element>` over filled slots in slot order

use crate::error::{PackError, Result};
use crate::types::{Item, ItemDefinition, ResourcePath};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How an item model picks its mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemModelKind {
    /// Always renders `mesh`.
    Default { mesh: ResourcePath },
    /// Renders `mesh` plus any set of active elements.
    Combined {
        mesh: ResourcePath,
        elements: BTreeSet<String>,
    },
    /// Renders `mesh` plus at most one chosen element per slot.
    Slot {
        mesh: ResourcePath,
        slots: BTreeMap<String, BTreeSet<String>>,
    },
}

/// Runtime state passed to [`ItemModel::resolve_mesh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshState {
    /// The base mesh.
    Base,
    /// Active elements of a combined model.
    Elements(BTreeSet<String>),
    /// Chosen element per slot. Slots not present are empty.
    Slots(BTreeMap<String, String>),
}

/// One piece merged into a generated variant mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPart {
    /// Texture prefix group: the element name for combined models, the slot name for slot models.
    pub group: String,
    pub element: String,
}

/// A mesh the model can resolve to, with the parts merged into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshVariant {
    pub mesh: ResourcePath,
    pub parts: Vec<VariantPart>,
}

impl MeshVariant {
    pub fn is_base(&self) -> bool {
        self.parts.is_empty()
    }
}

/// A declared item model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemModel {
    pub path: ResourcePath,
    /// Item identifiers this model applies to.
    pub target_items: BTreeSet<ResourcePath>,
    #[serde(flatten)]
    pub kind: ItemModelKind,
}

impl ItemModel {
    pub fn new(
        path: ResourcePath,
        target_items: impl IntoIterator<Item = ResourcePath>,
        kind: ItemModelKind,
    ) -> Result<Self> {
        let model = Self {
            path,
            target_items: target_items.into_iter().collect(),
            kind,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check targets and element names.
    pub fn validate(&self) -> Result<()> {
        if self.target_items.is_empty() {
            return Err(PackError::Config(format!(
                "item model '{}' has no target items",
                self.path
            )));
        }
        match &self.kind {
            ItemModelKind::Default { .. } => {}
            ItemModelKind::Combined { elements, .. } => {
                for element in elements {
                    validate_name(&self.path, "element", element)?;
                }
            }
            ItemModelKind::Slot { slots, .. } => {
                for (slot, elements) in slots {
                    validate_name(&self.path, "slot", slot)?;
                    if elements.is_empty() {
                        return Err(PackError::Config(format!(
                            "slot '{}' of item model '{}' has no elements",
                            slot, self.path
                        )));
                    }
                    for element in elements {
                        validate_name(&self.path, "element", element)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// The base mesh.
    pub fn mesh(&self) -> &ResourcePath {
        match &self.kind {
            ItemModelKind::Default { mesh }
            | ItemModelKind::Combined { mesh, .. }
            | ItemModelKind::Slot { mesh, .. } => mesh,
        }
    }

    /// Resolve the mesh rendered for `state`.
    pub fn resolve_mesh(&self, state: &MeshState) -> Result<ResourcePath> {
        let parts = match (&self.kind, state) {
            (_, MeshState::Base) => Vec::new(),
            (ItemModelKind::Combined { elements, .. }, MeshState::Elements(active)) => {
                if let Some(unknown) = active.iter().find(|e| !elements.contains(*e)) {
                    return Err(PackError::InvalidMeshState(format!(
                        "unknown element '{}' for item model '{}'",
                        unknown, self.path
                    )));
                }
                active
                    .iter()
                    .map(|e| VariantPart {
                        group: e.clone(),
                        element: e.clone(),
                    })
                    .collect()
            }
            (ItemModelKind::Slot { slots, .. }, MeshState::Slots(chosen)) => {
                let mut parts = Vec::with_capacity(chosen.len());
                for (slot, element) in chosen {
                    let allowed = slots.get(slot).ok_or_else(|| {
                        PackError::InvalidMeshState(format!(
                            "unknown slot '{}' for item model '{}'",
                            slot, self.path
                        ))
                    })?;
                    if !allowed.contains(element) {
                        return Err(PackError::InvalidMeshState(format!(
                            "unknown element '{}' in slot '{}' of item model '{}'",
                            element, slot, self.path
                        )));
                    }
                    parts.push(VariantPart {
                        group: slot.clone(),
                        element: element.clone(),
                    });
                }
                parts
            }
            (kind, state) => {
                return Err(PackError::InvalidMeshState(format!(
                    "state {:?} does not apply to {} item model '{}'",
                    state,
                    kind_name(kind),
                    self.path
                )))
            }
        };
        self.variant_path(&parts)
    }

    /// Every mesh this model can resolve to, sorted by path. The base mesh is included.
    pub fn mesh_variants(&self) -> Result<Vec<MeshVariant>> {
        let part_sets: Vec<Vec<VariantPart>> = match &self.kind {
            ItemModelKind::Default { .. } => vec![Vec::new()],
            ItemModelKind::Combined { elements, .. } => {
                let elements: Vec<&String> = elements.iter().collect();
                subsets(&elements)
                    .into_iter()
                    .map(|subset| {
                        subset
                            .into_iter()
                            .map(|e| VariantPart {
                                group: e.clone(),
                                element: e.clone(),
                            })
                            .collect()
                    })
                    .collect()
            }
            ItemModelKind::Slot { slots, .. } => {
                let mut sets: Vec<Vec<VariantPart>> = vec![Vec::new()];
                for (slot, elements) in slots {
                    let mut next = Vec::with_capacity(sets.len() * (elements.len() + 1));
                    for set in &sets {
                        next.push(set.clone());
                        for element in elements {
                            let mut extended = set.clone();
                            extended.push(VariantPart {
                                group: slot.clone(),
                                element: element.clone(),
                            });
                            next.push(extended);
                        }
                    }
                    sets = next;
                }
                sets
            }
        };

        let mut variants = part_sets
            .into_iter()
            .map(|parts| {
                Ok(MeshVariant {
                    mesh: self.variant_path(&parts)?,
                    parts,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        variants.sort_by(|a, b| a.mesh.cmp(&b.mesh));
        Ok(variants)
    }

    /// The `(item, mesh)` pairs that need custom model data: every mesh
    /// variant on every target item.
    ///
    /// Fails when a target is not part of `definition`.
    pub fn obligations(&self, definition: &ItemDefinition) -> Result<Vec<(Item, ResourcePath)>> {
        let items = self
            .target_items
            .iter()
            .map(|id| {
                definition.get(id).cloned().ok_or_else(|| PackError::UnknownItem {
                    model: self.path.to_string(),
                    item: id.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let variants = self.mesh_variants()?;
        Ok(items
            .iter()
            .flat_map(|item| variants.iter().map(move |v| (item.clone(), v.mesh.clone())))
            .collect())
    }

    fn variant_path(&self, parts: &[VariantPart]) -> Result<ResourcePath> {
        if parts.is_empty() {
            return Ok(self.mesh().clone());
        }
        let suffix = match self.kind {
            ItemModelKind::Slot { .. } => parts
                .iter()
                .map(|p| format!("{}-{}", p.group, p.element))
                .collect::<Vec<_>>()
                .join("."),
            _ => parts
                .iter()
                .map(|p| p.element.as_str())
                .collect::<Vec<_>>()
                .join("."),
        };
        self.mesh().append(&format!("_{}", suffix))
    }
}

fn kind_name(kind: &ItemModelKind) -> &'static str {
    match kind {
        ItemModelKind::Default { .. } => "default",
        ItemModelKind::Combined { .. } => "combined",
        ItemModelKind::Slot { .. } => "slot",
    }
}

fn validate_name(model: &ResourcePath, what: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'));
    if valid {
        Ok(())
    } else {
        Err(PackError::Config(format!(
            "invalid {} name '{}' in item model '{}': expected [a-z0-9_]+",
            what, name, model
        )))
    }
}

/// All subsets of `items`, each in input order. Includes the empty set.
fn subsets<'a>(items: &[&'a String]) -> Vec<Vec<&'a String>> {
    let mut result: Vec<Vec<&String>> = vec![Vec::new()];
    for item in items {
        let extended: Vec<Vec<&String>> = result
            .iter()
            .map(|set| {
                let mut set = set.clone();
                set.push(*item);
                set
            })
            .collect();
        result.extend(extended);
    }
    result
}
