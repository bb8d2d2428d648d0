//! Built-in build tasks.

mod armor;
mod fonts;
mod gather;
mod languages;
mod meshes;
mod models;
mod package;
mod serialize;
mod sort;
mod sounds;
mod upload;

pub use armor::ProcessArmorTextures;
pub use fonts::ProcessFonts;
pub use gather::GatherSources;
pub use languages::ProcessLanguages;
pub use meshes::MapMeshes;
pub use models::ProcessModels;
pub use package::Package;
pub use serialize::SerializeAssets;
pub use sort::SortAssets;
pub use sounds::ProcessSounds;
pub use upload::Upload;

use super::{Task, TaskFactory};
use crate::error::{PackError, Result};
use crate::files::{FileCollection, VirtualFile};
use crate::types::ResourcePath;
use serde::de::DeserializeOwned;

pub const GATHER_SOURCES: &str = "gatherSources";
pub const PROCESS_MODELS: &str = "processModels";
pub const MAP_MESHES: &str = "mapMeshes";
pub const PROCESS_SOUNDS: &str = "processSounds";
pub const PROCESS_ARMOR_TEXTURES: &str = "processArmorTextures";
pub const PROCESS_LANGUAGES: &str = "processLanguages";
pub const PROCESS_FONTS: &str = "processFonts";
pub const SORT_ASSETS: &str = "sortAssets";
pub const SERIALIZE: &str = "serialize";
pub const PACKAGE: &str = "package";
pub const UPLOAD: &str = "upload";

/// Execution order of the default pipeline.
pub const DEFAULT_ORDER: [&str; 11] = [
    GATHER_SOURCES,
    PROCESS_MODELS,
    MAP_MESHES,
    PROCESS_SOUNDS,
    PROCESS_ARMOR_TEXTURES,
    PROCESS_LANGUAGES,
    PROCESS_FONTS,
    SORT_ASSETS,
    SERIALIZE,
    PACKAGE,
    UPLOAD,
];

pub(crate) fn register_all(factory: &mut TaskFactory) {
    fn boxed<T: Task + Default + 'static>() -> Box<dyn Task> {
        Box::new(T::default())
    }
    factory.register_builtin(GATHER_SOURCES, boxed::<GatherSources>);
    factory.register_builtin(PROCESS_MODELS, boxed::<ProcessModels>);
    factory.register_builtin(MAP_MESHES, boxed::<MapMeshes>);
    factory.register_builtin(PROCESS_SOUNDS, boxed::<ProcessSounds>);
    factory.register_builtin(PROCESS_ARMOR_TEXTURES, boxed::<ProcessArmorTextures>);
    factory.register_builtin(PROCESS_LANGUAGES, boxed::<ProcessLanguages>);
    factory.register_builtin(PROCESS_FONTS, boxed::<ProcessFonts>);
    factory.register_builtin(SORT_ASSETS, boxed::<SortAssets>);
    factory.register_builtin(SERIALIZE, boxed::<SerializeAssets>);
    factory.register_builtin(PACKAGE, boxed::<Package>);
    factory.register_builtin(UPLOAD, boxed::<Upload>);
}

/// Parse a JSON declaration file.
fn parse_declaration<T: DeserializeOwned>(file: &VirtualFile) -> Result<T> {
    let value = match file.as_json() {
        Some(value) => value.clone(),
        None => serde_json::from_slice(&file.read_bytes()?)?,
    };
    serde_json::from_value(value).map_err(|e| PackError::from(e).in_file(file.path()))
}

/// Take every `content/**<suffix>` file with the resource path it declares.
fn take_declarations(
    files: &mut FileCollection,
    suffix: &str,
) -> Result<Vec<(ResourcePath, VirtualFile)>> {
    files
        .take_matching("content/", suffix)
        .into_iter()
        .map(|file| Ok((ResourcePath::from_content_path(file.path(), suffix)?, file)))
        .collect()
}

/// Take the project-supplied copy of an `assets/` file, if any.
///
/// Sources under `include/` move to the archive root later, so a task that
/// writes the same `assets/` path merges into and replaces that copy.
fn take_included(files: &mut FileCollection, assets_path: &str) -> Option<VirtualFile> {
    files
        .remove_file(&format!("include/{}", assets_path))
        .or_else(|| files.remove_file(assets_path))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::builder::BuildContext;
    use crate::project::Project;
    use crate::types::{Item, ItemDefinition};
    use std::path::Path;

    pub fn demo_project(dir: &Path) -> Project {
        Project::new(
            "demo",
            dir,
            ItemDefinition::new([
                Item::item("stick").unwrap(),
                Item::block("note_block").unwrap(),
            ]),
        )
    }

    pub fn context(project: &Project) -> BuildContext<'_> {
        BuildContext::new(project, Default::default(), None)
    }
}
