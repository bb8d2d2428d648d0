//! Build pipeline: runs the task graph for one project.
//!
//! Every build owns its context. The previous mapping is read once at build
//! start and only read from afterwards.

mod task;
pub mod tasks;

pub use task::{task_fn, Task, TaskFactory, TaskGraph};

use crate::asset::AssetRegistry;
use crate::digest::Sha1Digest;
use crate::error::Result;
use crate::files::FileCollection;
use crate::hosting::{Hosting, UploadedPack};
use crate::loader;
use crate::mapping::MeshMapping;
use crate::project::Project;
use crate::resources::Resources;
use crate::types::{Item, ResourcePath};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// An archive written by the `package` task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArchive {
    pub path: PathBuf,
    pub digest: Sha1Digest,
}

/// State shared by the tasks of one build.
pub struct BuildContext<'a> {
    pub project: &'a Project,
    pub files: FileCollection,
    pub assets: AssetRegistry,
    /// Mapping of the last successful build, or empty.
    pub previous_mapping: MeshMapping,
    /// `(item, mesh)` pairs that need an id in this build.
    pub obligations: BTreeSet<(Item, ResourcePath)>,
    pub mesh_mapping: Option<MeshMapping>,
    pub archive: Option<PackagedArchive>,
    pub uploaded: Option<UploadedPack>,
    pub hosting: Option<&'a dyn Hosting>,
    /// Pixel width of one armor layer cell, set by the armor task.
    pub armor_resolution: Option<u32>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        project: &'a Project,
        previous_mapping: MeshMapping,
        hosting: Option<&'a dyn Hosting>,
    ) -> Self {
        Self {
            project,
            files: FileCollection::new(),
            assets: AssetRegistry::new(),
            previous_mapping,
            obligations: BTreeSet::new(),
            mesh_mapping: None,
            archive: None,
            uploaded: None,
            hosting,
            armor_resolution: None,
        }
    }

    fn finish(self) -> BuiltPack {
        let project = self.project;
        let (archive, digest) = match self.archive {
            Some(archive) => (Some(archive.path), Some(archive.digest)),
            None => (None, None),
        };
        BuiltPack {
            name: project.name.clone(),
            archive,
            digest,
            resources: Resources::new(
                project.name.clone(),
                project.pack_format,
                project.item_definition.clone(),
                self.assets,
                self.mesh_mapping.unwrap_or_default(),
            ),
            uploaded: self.uploaded,
        }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuiltPack {
    pub name: String,
    /// `None` when the pipeline does not package.
    pub archive: Option<PathBuf>,
    pub digest: Option<Sha1Digest>,
    pub resources: Resources,
    pub uploaded: Option<UploadedPack>,
}

impl BuiltPack {
    pub fn is_uploaded(&self) -> bool {
        self.uploaded.is_some()
    }
}

/// Builds a [`Project`].
///
/// # Example
///
/// ```ignore
/// let project = Project::load("packs/demo")?;
/// let built = Builder::new(&project).build()?;
/// println!("{}", built.digest.unwrap());
/// ```
pub struct Builder<'a> {
    project: &'a Project,
    factory: TaskFactory,
    hosting: Option<&'a dyn Hosting>,
}

impl<'a> Builder<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            factory: TaskFactory::standard(),
            hosting: None,
        }
    }

    /// Use `factory` to resolve task names, including the default pipeline.
    pub fn with_factory(mut self, factory: TaskFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Upload packaged archives through `hosting`.
    pub fn with_hosting(mut self, hosting: &'a dyn Hosting) -> Self {
        self.hosting = Some(hosting);
        self
    }

    /// The default pipeline with the project's task directives applied.
    pub fn task_graph(&self) -> Result<TaskGraph> {
        let mut graph = TaskGraph::standard(&self.factory, self.hosting.is_some())?;
        for directive in &self.project.config.tasks {
            graph.apply(directive, &self.factory)?;
        }
        Ok(graph)
    }

    /// Load the mapping the next build must stay consistent with.
    ///
    /// The persisted mapping file wins; otherwise the mapping frozen in the
    /// last archive is used. An archive that exists but cannot be read fails
    /// the build, since its ids cannot be carried forward.
    pub fn previous_mapping(&self) -> Result<MeshMapping> {
        let mapping_path = self.project.mapping_path();
        if mapping_path.is_file() {
            return MeshMapping::load(&mapping_path);
        }
        let archive = self.project.archive_path();
        if !archive.is_file() {
            return Ok(MeshMapping::new());
        }
        loader::load_from_path(&archive)
            .map(|resources| resources.mesh_mapping().clone())
            .map_err(|e| {
                error!(
                    archive = %archive.display(),
                    error = %e,
                    "Previous archive is unreadable; remove it to reset custom model data"
                );
                e
            })
    }

    pub fn build(&self) -> Result<BuiltPack> {
        let started = Instant::now();
        info!(project = %self.project.name, "Building resource pack");
        let result = self.run();
        let seconds = started.elapsed().as_secs_f64();
        match &result {
            Ok(_) => info!(project = %self.project.name, "BUILD SUCCESSFUL in {:.2}s", seconds),
            Err(e) => error!(
                project = %self.project.name,
                error = %e,
                "BUILD FAILED in {:.2}s",
                seconds
            ),
        }
        result
    }

    fn run(&self) -> Result<BuiltPack> {
        let graph = self.task_graph()?;
        let previous = self.previous_mapping()?;
        let mut ctx = BuildContext::new(self.project, previous, self.hosting);
        graph.run(&mut ctx)?;
        Ok(ctx.finish())
    }
}
