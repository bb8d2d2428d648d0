use super::{parse_declaration, take_declarations};
use crate::asset::{ItemModel, ItemModelKind};
use crate::builder::{BuildContext, Task};
use crate::error::{PackError, Result};
use crate::files::VirtualFile;
use crate::mesh::MeshModel;
use crate::types::ResourcePath;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Registers item models declared in `content/<ns>/**.model.json`.
///
/// Every mesh a model can resolve to becomes an `(item, mesh)` obligation for
/// the mapping task. Variant meshes are generated by merging element meshes
/// into the base mesh, then all mesh files are emitted as models.
#[derive(Debug, Default)]
pub struct ProcessModels;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Targets {
    One(String),
    Many(Vec<String>),
}

/// An element mesh, optionally moved by `offset` before merging.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ElementMesh {
    Path(String),
    Placed {
        mesh: String,
        #[serde(default)]
        offset: [f32; 3],
    },
}

impl ElementMesh {
    fn mesh(&self) -> &str {
        match self {
            ElementMesh::Path(mesh) | ElementMesh::Placed { mesh, .. } => mesh,
        }
    }

    fn offset(&self) -> [f32; 3] {
        match self {
            ElementMesh::Path(_) => [0.0; 3],
            ElementMesh::Placed { offset, .. } => *offset,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelDeclaration {
    mesh: String,
    target: Targets,
    #[serde(flatten)]
    kind: DeclaredKind,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DeclaredKind {
    Default,
    Combined {
        elements: BTreeMap<String, ElementMesh>,
    },
    Slot {
        slots: BTreeMap<String, BTreeMap<String, ElementMesh>>,
    },
}

/// Element meshes keyed by `(group, element)`.
type PartMeshes = BTreeMap<(String, String), ElementMesh>;

impl ModelDeclaration {
    fn into_model(self, path: ResourcePath) -> Result<(ItemModel, PartMeshes)> {
        let mesh = ResourcePath::resolve(&self.mesh, &path)?;
        let targets = match self.target {
            Targets::One(target) => vec![target],
            Targets::Many(targets) => targets,
        };
        let targets = targets
            .iter()
            .map(|t| ResourcePath::parse(t))
            .collect::<Result<Vec<_>>>()?;

        let mut parts = PartMeshes::new();
        let kind = match self.kind {
            DeclaredKind::Default => ItemModelKind::Default { mesh },
            DeclaredKind::Combined { elements } => {
                let names = elements.keys().cloned().collect();
                for (name, element) in elements {
                    parts.insert((name.clone(), name), element);
                }
                ItemModelKind::Combined {
                    mesh,
                    elements: names,
                }
            }
            DeclaredKind::Slot { slots } => {
                let mut names = BTreeMap::new();
                for (slot, entries) in slots {
                    names.insert(slot.clone(), entries.keys().cloned().collect());
                    for (name, element) in entries {
                        parts.insert((slot.clone(), name), element);
                    }
                }
                ItemModelKind::Slot { mesh, slots: names }
            }
        };
        Ok((ItemModel::new(path, targets, kind)?, parts))
    }
}

impl Task for ProcessModels {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        for (path, file) in take_declarations(&mut ctx.files, ".model.json")? {
            let declaration: ModelDeclaration = parse_declaration(&file)?;
            let (model, parts) = declaration
                .into_model(path)
                .map_err(|e| e.in_file(file.path()))?;
            let obligations = model.obligations(&ctx.project.item_definition)?;
            generate_variants(ctx, &model, &parts)?;
            debug!(model = %model.path, mesh = %model.mesh(), "Registered item model");
            ctx.assets.put(model)?;
            ctx.obligations.extend(obligations);
        }
        emit_meshes(ctx)
    }
}

fn mesh_file(mesh: &ResourcePath) -> String {
    format!("{}.mesh.json", mesh.content_path())
}

fn model_file(mesh: &ResourcePath) -> String {
    format!("{}.json", mesh.assets_path("models"))
}

fn load_mesh(ctx: &BuildContext<'_>, mesh: &ResourcePath) -> Result<Option<MeshModel>> {
    let path = mesh_file(mesh);
    let Some(file) = ctx.files.get_file(&path) else {
        return Ok(None);
    };
    let mut model: MeshModel = parse_declaration(file)?;
    model
        .resolve_references(mesh)
        .map_err(|e| e.in_file(path))?;
    Ok(Some(model))
}

fn generate_variants(ctx: &mut BuildContext<'_>, model: &ItemModel, parts: &PartMeshes) -> Result<()> {
    let variants: Vec<_> = model
        .mesh_variants()?
        .into_iter()
        .filter(|v| !v.is_base())
        .collect();
    if variants.is_empty() {
        return Ok(());
    }
    let Some(base) = load_mesh(ctx, model.mesh())? else {
        warn!(
            model = %model.path,
            mesh = %model.mesh(),
            "Base mesh not found, variant meshes not generated"
        );
        return Ok(());
    };

    for variant in variants {
        let mut mesh = base.clone();
        for part in &variant.parts {
            let element = parts
                .get(&(part.group.clone(), part.element.clone()))
                .ok_or_else(|| {
                    PackError::InvalidMeshState(format!(
                        "no mesh for '{}' in '{}'",
                        part.element, model.path
                    ))
                })?;
            let element_path = ResourcePath::resolve(element.mesh(), &model.path)?;
            let mut piece = load_mesh(ctx, &element_path)?
                .ok_or_else(|| PackError::MissingFile(mesh_file(&element_path)))?;
            piece.translate(element.offset());
            mesh.merge(&part.group, &piece);
        }
        ctx.files
            .add_file(VirtualFile::json(&model_file(&variant.mesh), mesh.to_json()?))?;
    }
    Ok(())
}

/// Emit every `*.mesh.json` as a model under `assets/<ns>/models/`.
fn emit_meshes(ctx: &mut BuildContext<'_>) -> Result<()> {
    for (path, file) in take_declarations(&mut ctx.files, ".mesh.json")? {
        let mut mesh: MeshModel = parse_declaration(&file)?;
        mesh.resolve_references(&path)
            .map_err(|e| e.in_file(file.path()))?;
        ctx.files
            .add_file(VirtualFile::json(&model_file(&path), mesh.to_json()?))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tasks::test_support::{context, demo_project};
    use crate::types::Item;
    use serde_json::json;

    fn stick_mesh() -> serde_json::Value {
        json!({
            "parent": "minecraft:item/handheld",
            "textures": { "0": "./stick" },
            "elements": [{
                "from": [7, 0, 7],
                "to": [9, 16, 9],
                "faces": { "north": { "uv": [0, 0, 2, 16], "texture": "#0" } }
            }]
        })
    }

    fn glow_mesh() -> serde_json::Value {
        json!({
            "textures": { "0": "./glow" },
            "elements": [{
                "from": [7, 0, 7],
                "to": [9, 2, 9],
                "faces": { "up": { "uv": [0, 0, 2, 2], "texture": "#0" } }
            }]
        })
    }

    fn path(s: &str) -> ResourcePath {
        ResourcePath::parse(s).unwrap()
    }

    #[test]
    fn test_default_model() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::json(
                "content/demo/custom_stick.model.json",
                json!({ "type": "default", "mesh": "./custom_stick", "target": "stick" }),
            ))
            .unwrap();
        ctx.files
            .add_file(VirtualFile::json("content/demo/custom_stick.mesh.json", stick_mesh()))
            .unwrap();

        ProcessModels.run(&mut ctx).unwrap();

        let model: &ItemModel = ctx.assets.get(&path("demo:custom_stick")).unwrap();
        assert_eq!(model.mesh(), &path("demo:custom_stick"));
        assert!(ctx
            .obligations
            .contains(&(Item::item("stick").unwrap(), path("demo:custom_stick"))));

        let emitted = ctx.files.get_file("assets/demo/models/custom_stick.json").unwrap();
        assert_eq!(emitted.as_json().unwrap()["textures"]["0"], "demo:stick");
        assert!(!ctx.files.contains("content/demo/custom_stick.model.json"));
        assert!(!ctx.files.contains("content/demo/custom_stick.mesh.json"));
    }

    #[test]
    fn test_combined_model_generates_variants() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::json(
                "content/demo/custom_stick_glow.model.json",
                json!({
                    "type": "combined",
                    "mesh": "./custom_stick",
                    "target": ["stick", "minecraft:note_block"],
                    "elements": { "glow": { "mesh": "./parts/glow", "offset": [0, 16, 0] } }
                }),
            ))
            .unwrap();
        ctx.files
            .add_file(VirtualFile::json("content/demo/custom_stick.mesh.json", stick_mesh()))
            .unwrap();
        ctx.files
            .add_file(VirtualFile::json("content/demo/parts/glow.mesh.json", glow_mesh()))
            .unwrap();

        ProcessModels.run(&mut ctx).unwrap();

        let variant = ctx
            .files
            .get_file("assets/demo/models/custom_stick_glow.json")
            .unwrap()
            .as_json()
            .unwrap()
            .clone();
        let variant = MeshModel::from_json(&variant).unwrap();
        assert_eq!(variant.textures["glow.0"], "demo:parts/glow");
        assert_eq!(variant.elements.len(), 2);
        assert_eq!(variant.elements[1].from, [7.0, 16.0, 7.0]);
        assert_eq!(
            variant.elements[1].faces.values().next().unwrap().texture,
            "#glow.0"
        );

        assert_eq!(ctx.obligations.len(), 4);
        assert!(ctx
            .obligations
            .contains(&(Item::block("note_block").unwrap(), path("demo:custom_stick_glow"))));
    }

    #[test]
    fn test_missing_base_mesh_still_maps() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::json(
                "content/demo/wand.model.json",
                json!({ "type": "combined", "mesh": "./wand", "target": "stick", "elements": { "glow": "./glow" } }),
            ))
            .unwrap();

        ProcessModels.run(&mut ctx).unwrap();
        assert_eq!(ctx.obligations.len(), 2);
        assert!(!ctx.files.contains("assets/demo/models/wand_glow.json"));
    }

    #[test]
    fn test_missing_element_mesh_fails() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::json(
                "content/demo/wand.model.json",
                json!({ "type": "combined", "mesh": "./wand", "target": "stick", "elements": { "glow": "./glow" } }),
            ))
            .unwrap();
        ctx.files
            .add_file(VirtualFile::json("content/demo/wand.mesh.json", stick_mesh()))
            .unwrap();

        assert!(matches!(
            ProcessModels.run(&mut ctx),
            Err(PackError::MissingFile(ref p)) if p == "content/demo/glow.mesh.json"
        ));
    }

    #[test]
    fn test_unknown_target_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::json(
                "content/demo/sword.model.json",
                json!({ "type": "default", "mesh": "./sword", "target": "diamond_sword" }),
            ))
            .unwrap();

        let err = ProcessModels.run(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            PackError::UnknownItem { ref model, ref item }
                if model == "demo:sword" && item == "minecraft:diamond_sword"
        ));
    }

    #[test]
    fn test_slot_model() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::json(
                "content/demo/staff.model.json",
                json!({
                    "type": "slot",
                    "mesh": "./staff",
                    "target": "stick",
                    "slots": { "tip": { "ruby": "./ruby", "opal": "./opal" } }
                }),
            ))
            .unwrap();

        ProcessModels.run(&mut ctx).unwrap();
        let meshes: Vec<&str> = ctx.obligations.iter().map(|(_, m)| m.as_str()).collect();
        assert_eq!(
            meshes,
            vec!["demo:staff", "demo:staff_tip-opal", "demo:staff_tip-ruby"]
        );
    }
}
