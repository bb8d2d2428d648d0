use super::take_included;
use crate::builder::{BuildContext, Task};
use crate::error::{PackError, Result};
use crate::files::VirtualFile;
use crate::mapping::{MeshAllocator, MeshMapping};
use crate::types::Item;
use serde_json::{json, Value};
use tracing::info;

/// Assigns custom model data to every obligation and writes item overrides.
///
/// Each mapped item gets `assets/<ns>/models/item/<id>.json` with one
/// `custom_model_data` override per mesh, sorted by id. A project-supplied
/// copy of that file is kept and extended.
#[derive(Debug, Default)]
pub struct MapMeshes;

impl Task for MapMeshes {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let mut allocator = MeshAllocator::new(&ctx.previous_mapping);
        for (item, mesh) in &ctx.obligations {
            allocator.require(item.clone(), mesh.clone());
        }
        let mapping = allocator.allocate();

        for item in mapping.items() {
            let file = override_file(ctx, item, &mapping)?;
            ctx.files.insert_file(file);
        }
        info!(
            items = mapping.items().count(),
            meshes = mapping.len(),
            "Mapped meshes"
        );
        ctx.mesh_mapping = Some(mapping);
        Ok(())
    }
}

fn override_file(ctx: &mut BuildContext<'_>, item: &Item, mapping: &MeshMapping) -> Result<VirtualFile> {
    let path = item.model_file_path();
    let mut model = match take_included(&mut ctx.files, &path) {
        Some(file) => match file.as_json() {
            Some(value) => value.clone(),
            None => serde_json::from_slice(&file.read_bytes()?)
                .map_err(|e| PackError::from(e).in_file(file.path()))?,
        },
        None => item.default_model(),
    };

    let mut meshes: Vec<_> = mapping
        .meshes(item)
        .into_iter()
        .flatten()
        .map(|(mesh, id)| (*id, mesh))
        .collect();
    meshes.sort();

    let Value::Object(object) = &mut model else {
        return Err(PackError::invalid_path(path, "item model is not a JSON object"));
    };
    let overrides = object
        .entry("overrides")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(overrides) = overrides else {
        return Err(PackError::invalid_path(path, "`overrides` is not an array"));
    };
    for (id, mesh) in meshes {
        overrides.push(json!({
            "predicate": { "custom_model_data": id },
            "model": mesh.to_string(),
        }));
    }
    Ok(VirtualFile::json(&path, model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tasks::test_support::demo_project;
    use crate::types::ResourcePath;

    fn path(s: &str) -> ResourcePath {
        ResourcePath::parse(s).unwrap()
    }

    #[test]
    fn test_writes_sorted_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let stick = Item::item("stick").unwrap();

        let empty = MeshMapping::new();
        let mut earlier = MeshAllocator::new(&empty);
        earlier.require(stick.clone(), path("demo:zeta"));
        let previous = earlier.allocate();

        let mut ctx = BuildContext::new(&project, previous, None);
        ctx.obligations.insert((stick.clone(), path("demo:alpha")));
        ctx.obligations.insert((stick.clone(), path("demo:zeta")));
        MapMeshes.run(&mut ctx).unwrap();

        let mapping = ctx.mesh_mapping.as_ref().unwrap();
        assert_eq!(mapping.custom_model_data(&stick, &path("demo:zeta")), Some(1));
        assert_eq!(mapping.custom_model_data(&stick, &path("demo:alpha")), Some(2));

        let model = ctx
            .files
            .get_file("assets/minecraft/models/item/stick.json")
            .unwrap()
            .as_json()
            .unwrap();
        assert_eq!(model["parent"], "minecraft:item/generated");
        assert_eq!(model["textures"]["layer0"], "minecraft:item/stick");
        let overrides = model["overrides"].as_array().unwrap();
        assert_eq!(overrides[0]["predicate"]["custom_model_data"], 1);
        assert_eq!(overrides[0]["model"], "demo:zeta");
        assert_eq!(overrides[1]["model"], "demo:alpha");
    }

    #[test]
    fn test_extends_included_model() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let note_block = Item::block("note_block").unwrap();

        let mut ctx = BuildContext::new(&project, MeshMapping::new(), None);
        ctx.files
            .add_file(VirtualFile::json(
                "include/assets/minecraft/models/item/note_block.json",
                serde_json::json!({ "parent": "minecraft:block/note_block", "display": {} }),
            ))
            .unwrap();
        ctx.obligations.insert((note_block, path("demo:speaker")));
        MapMeshes.run(&mut ctx).unwrap();

        assert!(!ctx
            .files
            .contains("include/assets/minecraft/models/item/note_block.json"));
        let model = ctx
            .files
            .get_file("assets/minecraft/models/item/note_block.json")
            .unwrap()
            .as_json()
            .unwrap();
        assert!(model.get("display").is_some());
        assert_eq!(model["overrides"][0]["model"], "demo:speaker");
    }
}
