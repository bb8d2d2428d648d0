//! # propack
//!
//! Builds Minecraft resource packs whose custom model data stays stable from
//! one build to the next.
//!
//! ## Overview
//!
//! A project directory holds `include/` files copied into the pack as-is and
//! `content/` declarations (item models, meshes, sounds, armors, fonts and
//! languages). Building a project runs a named task pipeline that turns them
//! into a deterministic `.propack` archive. The archive also carries a
//! `propack/` descriptor that the runtime side loads back into
//! [`Resources`] to look up custom model data.
//!
//! ## Quick Start
//!
//! ```ignore
//! use propack::{load_resources, Builder, Project};
//!
//! // Build a project
//! let project = Project::load("packs/demo")?;
//! let built = Builder::new(&project).build()?;
//!
//! // Load the archive back at runtime
//! let resources = load_resources(built.archive.unwrap())?;
//! let id = resources.custom_model_data(&model, &item, &MeshState::Base)?;
//! ```
//!
//! ## Custom pipelines
//!
//! Tasks are looked up by name in a [`TaskFactory`]. Project configuration can
//! remove, replace or insert tasks with [`TaskDirective`]s:
//!
//! ```ignore
//! use propack::{task_fn, Builder, TaskFactory};
//!
//! let factory = TaskFactory::standard().with("stamp", || {
//!     task_fn(|ctx: &mut BuildContext<'_>| {
//!         ctx.files.add_file(VirtualFile::text("stamp.txt", "built by ci"))
//!     })
//! })?;
//! let built = Builder::new(&project).with_factory(factory).build()?;
//! ```

pub mod asset;
pub mod builder;
pub mod digest;
pub mod error;
pub mod files;
pub mod format;
pub mod hosting;
pub mod loader;
pub mod mapping;
pub mod mesh;
pub mod package;
pub mod project;
pub mod resources;
pub mod types;

// Re-export main types for convenience
pub use asset::{ArmorTexture, AssetRegistry, Font, ItemModel, ItemModelKind, MeshState, SoundAsset};
pub use builder::{task_fn, BuildContext, Builder, BuiltPack, Task, TaskFactory, TaskGraph};
pub use digest::Sha1Digest;
pub use error::{PackError, Result};
pub use files::{FileCollection, FileContent, VirtualFile};
pub use hosting::{Hosting, LocalHosting, UploadOptions, UploadedPack};
pub use mapping::{MeshMapping, MeshMappingEntry};
pub use mesh::MeshModel;
pub use project::{BuildConfig, PackageOptions, Project, StrictMode, TaskDirective};
pub use resources::Resources;
pub use types::{Item, ItemDefinition, ResourcePath, Rgb};

/// Load the resources of a built `.propack` archive.
pub fn load_resources<P: AsRef<std::path::Path>>(path: P) -> Result<Resources> {
    loader::load_from_path(path)
}

/// Load the resources of a `.propack` archive held in memory.
pub fn load_resources_from_bytes(data: &[u8]) -> Result<Resources> {
    loader::load_from_bytes(data)
}

/// Load a mesh mapping table persisted next to a build.
pub fn load_mesh_mapping<P: AsRef<std::path::Path>>(path: P) -> Result<MeshMapping> {
    MeshMapping::load(path)
}
