//! Mesh model parsing.
//!
//! Mesh files use the vanilla model JSON layout. Fields the builder does not
//! touch are kept in `extra` and written back unchanged.

use crate::error::Result;
use crate::types::{Direction, ElementRotation, ResourcePath};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A parsed `*.mesh.json` model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshModel {
    /// Parent model to inherit from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Whether to use ambient occlusion.
    #[serde(
        default,
        rename = "ambientocclusion",
        skip_serializing_if = "Option::is_none"
    )]
    pub ambient_occlusion: Option<bool>,

    /// Texture variable definitions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub textures: BTreeMap<String, String>,

    /// Model elements (cuboids).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<MeshElement>,

    /// Display transforms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MeshModel {
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Resolve the parent and texture paths written relative to `reference`.
    ///
    /// Texture variables (`#name`) are left alone.
    pub fn resolve_references(&mut self, reference: &ResourcePath) -> Result<()> {
        if let Some(parent) = self.parent.as_mut().filter(|p| !p.is_empty()) {
            *parent = ResourcePath::resolve(parent, reference)?.to_string();
        }
        for texture in self.textures.values_mut() {
            if !texture.starts_with('#') {
                *texture = ResourcePath::resolve(texture, reference)?.to_string();
            }
        }
        Ok(())
    }

    /// Move every element by `offset`.
    pub fn translate(&mut self, offset: [f32; 3]) {
        if offset == [0.0; 3] {
            return;
        }
        for element in &mut self.elements {
            element.translate(offset);
        }
    }

    /// Merge the textures and elements of `part` under the texture prefix `group`.
    ///
    /// Texture `key` of the part becomes `group.key` and its faces are
    /// rewritten to reference the prefixed variables.
    pub fn merge(&mut self, group: &str, part: &MeshModel) {
        for (key, texture) in &part.textures {
            self.textures
                .insert(format!("{}.{}", group, key), prefix_reference(group, texture));
        }
        for element in &part.elements {
            let mut element = element.clone();
            for face in element.faces.values_mut() {
                face.texture = prefix_reference(group, &face.texture);
            }
            self.elements.push(element);
        }
    }
}

fn prefix_reference(group: &str, texture: &str) -> String {
    match texture.strip_prefix('#') {
        Some(key) => format!("#{}.{}", group, key),
        None => texture.to_string(),
    }
}

/// A cuboid element within a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshElement {
    /// Minimum corner (0-16 range).
    pub from: [f32; 3],
    /// Maximum corner (0-16 range).
    pub to: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<ElementRotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shade: Option<bool>,
    #[serde(default)]
    pub faces: BTreeMap<Direction, MeshFace>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MeshElement {
    pub fn translate(&mut self, offset: [f32; 3]) {
        for axis in 0..3 {
            self.from[axis] += offset[axis];
            self.to[axis] += offset[axis];
        }
        if let Some(rotation) = &mut self.rotation {
            rotation.translate(offset);
        }
    }
}

/// A face of a mesh element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshFace {
    /// UV coordinates [u1, v1, u2, v2] in 0-16 range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<[f32; 4]>,
    /// Texture reference (e.g., "#side").
    pub texture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cullface: Option<Direction>,
    /// UV rotation in degrees (0, 90, 180, 270).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tintindex: Option<i32>,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}
