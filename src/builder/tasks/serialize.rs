use crate::builder::{BuildContext, Task};
use crate::error::Result;
use crate::files::VirtualFile;
use crate::format::{self, Manifest, FORMAT_VERSION};
use crate::mapping::MeshMapping;

/// Writes the `propack/` entries the loader reads back.
#[derive(Debug, Default)]
pub struct SerializeAssets;

impl Task for SerializeAssets {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let project = ctx.project;
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            name: project.name.clone(),
            item_definition: project.item_definition.to_file(),
            pack_format: project.pack_format,
        };
        let mapping = ctx.mesh_mapping.clone().unwrap_or_else(MeshMapping::new);
        let assets = &ctx.assets;
        let entries = [
            (format::MANIFEST, serde_json::to_value(&manifest)?),
            (format::MESH_MAPPING, serde_json::to_value(&mapping)?),
            (format::ITEM_MODELS, serde_json::to_value(assets.item_models())?),
            (format::SOUNDS, serde_json::to_value(assets.sounds())?),
            (format::ARMOR_TEXTURES, serde_json::to_value(assets.armor_textures())?),
            (format::FONTS, serde_json::to_value(assets.fonts())?),
        ];
        for (path, value) in entries {
            ctx.files.insert_file(VirtualFile::json(path, value));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tasks::test_support::{context, demo_project};

    #[test]
    fn test_writes_descriptor_entries() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        SerializeAssets.run(&mut ctx).unwrap();

        let manifest = ctx.files.get_file(format::MANIFEST).unwrap().as_json().unwrap();
        assert_eq!(manifest["format_version"], FORMAT_VERSION);
        assert_eq!(manifest["name"], "demo");
        assert_eq!(manifest["item_definition"]["block"][0], "minecraft:note_block");
        for entry in [
            format::MESH_MAPPING,
            format::ITEM_MODELS,
            format::SOUNDS,
            format::ARMOR_TEXTURES,
            format::FONTS,
        ] {
            assert!(ctx.files.contains(entry), "{}", entry);
        }
    }
}
