//! Project definitions and build configuration.
//!
//! A project lives in a directory holding `project.json`, an `include/` tree
//! copied to the archive root and a `content/<namespace>/` tree of declared
//! assets. Projects can also be assembled in memory with [`Project::new`].

use crate::error::{PackError, Result};
use crate::files::VirtualFile;
use crate::hosting::UploadOptions;
use crate::types::{ItemDefinition, ItemDefinitionFile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the project definition inside a project directory.
pub const PROJECT_FILE: &str = "project.json";

/// Pack format written to `pack.mcmeta` when the project does not set one.
pub const DEFAULT_PACK_FORMAT: u32 = 15;

/// How invalid source file names are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictMode {
    /// Fail the build.
    #[default]
    Enabled,
    /// Log a warning and skip the file.
    Warn,
    /// Skip the file silently.
    Disabled,
}

/// Archive packaging options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageOptions {
    /// Deflate level, 0-9.
    pub compression_level: i64,
    /// Minify JSON entries and drop the archive comment.
    pub protection: bool,
    /// Archive comment.
    pub comment: Option<String>,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            compression_level: 9,
            protection: false,
            comment: None,
        }
    }
}

/// A change to the default task pipeline, applied by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TaskDirective {
    Remove { task: String },
    Replace { task: String, with: String },
    InsertAfter { task: String, factory: String },
    InsertBefore { task: String, factory: String },
}

/// Build configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub strict_mode: StrictMode,
    /// File extensions skipped while gathering sources, e.g. `psd`.
    pub ignored_extensions: BTreeSet<String>,
    /// Translations added to every language in `languages`.
    pub all_lang_translations: BTreeMap<String, String>,
    pub languages: BTreeSet<String>,
    pub package: PackageOptions,
    /// Treat a failed upload as a build failure.
    pub require_upload: bool,
    pub upload: UploadOptions,
    pub tasks: Vec<TaskDirective>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            strict_mode: StrictMode::default(),
            ignored_extensions: BTreeSet::new(),
            all_lang_translations: BTreeMap::new(),
            languages: ["en_us".to_string()].into_iter().collect(),
            package: PackageOptions::default(),
            require_upload: false,
            upload: UploadOptions::default(),
            tasks: Vec::new(),
        }
    }
}

impl BuildConfig {
    pub fn with_strict_mode(mut self, mode: StrictMode) -> Self {
        self.strict_mode = mode;
        self
    }

    pub fn with_ignored_extension(mut self, extension: &str) -> Self {
        self.ignored_extensions
            .insert(extension.trim_start_matches('.').to_lowercase());
        self
    }

    pub fn with_package_options(mut self, options: PackageOptions) -> Self {
        self.package = options;
        self
    }

    pub fn with_translation(mut self, key: &str, value: &str) -> Self {
        self.all_lang_translations
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_task_directive(mut self, directive: TaskDirective) -> Self {
        self.tasks.push(directive);
        self
    }

    pub fn with_required_upload(mut self, required: bool) -> Self {
        self.require_upload = required;
        self
    }

    /// Whether a file with this name is skipped by extension.
    pub fn is_ignored(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| self.ignored_extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Where the item definition comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemDefinitionSource {
    /// Path of a JSON file, relative to the project directory.
    File(String),
    Inline(ItemDefinitionFile),
}

/// Parsed `project.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDefinition {
    /// Defaults to the project directory name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pack_format: Option<u32>,
    /// Relative to the project directory. Defaults to `build`.
    #[serde(default)]
    pub build_dir: Option<String>,
    pub items: ItemDefinitionSource,
    #[serde(default)]
    pub config: BuildConfig,
}

/// A resolved project, ready to build.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub pack_format: u32,
    pub project_dir: PathBuf,
    pub build_dir: PathBuf,
    pub item_definition: ItemDefinition,
    pub config: BuildConfig,
    /// Files added on top of the project directory, e.g. generated declarations.
    pub files: Vec<VirtualFile>,
}

impl Project {
    pub fn new(name: &str, project_dir: impl Into<PathBuf>, item_definition: ItemDefinition) -> Self {
        let project_dir = project_dir.into();
        Self {
            name: name.to_string(),
            description: String::new(),
            pack_format: DEFAULT_PACK_FORMAT,
            build_dir: project_dir.join("build"),
            project_dir,
            item_definition,
            config: BuildConfig::default(),
            files: Vec::new(),
        }
    }

    /// Load `<dir>/project.json`.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let file = dir.join(PROJECT_FILE);
        if !file.is_file() {
            return Err(PackError::MissingFile(file.display().to_string()));
        }
        let text = std::fs::read_to_string(&file)?;
        let definition: ProjectDefinition = serde_json::from_str(&text)
            .map_err(|e| PackError::from(e).in_file(file.display().to_string()))?;
        Self::from_definition(definition, dir)
    }

    /// Resolve a parsed definition against its project directory.
    pub fn from_definition(definition: ProjectDefinition, dir: &Path) -> Result<Self> {
        let name = match definition.name {
            Some(name) => name,
            None => dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| PackError::Config(format!("cannot infer project name from '{}'", dir.display())))?,
        };
        validate_name(&name)?;

        let item_definition = match &definition.items {
            ItemDefinitionSource::Inline(file) => ItemDefinition::from_file(file)?,
            ItemDefinitionSource::File(path) => {
                let full = dir.join(path);
                let text = std::fs::read_to_string(&full)
                    .map_err(|_| PackError::MissingFile(full.display().to_string()))?;
                ItemDefinition::from_json(&text).map_err(|e| e.in_file(full.display().to_string()))?
            }
        };
        debug!(project = %name, items = item_definition.len(), "Loaded item definition");

        Ok(Self {
            description: definition.description,
            pack_format: definition.pack_format.unwrap_or(DEFAULT_PACK_FORMAT),
            build_dir: dir.join(definition.build_dir.as_deref().unwrap_or("build")),
            project_dir: dir.to_path_buf(),
            item_definition,
            config: definition.config,
            files: Vec::new(),
            name,
        })
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.build_dir = build_dir.into();
        self
    }

    pub fn with_file(mut self, file: VirtualFile) -> Self {
        self.files.push(file);
        self
    }

    /// `<build>/<name>.propack`
    pub fn archive_path(&self) -> PathBuf {
        self.build_dir.join(format!("{}.propack", self.name))
    }

    /// `<build>/<name>.sha1`
    pub fn digest_path(&self) -> PathBuf {
        self.build_dir.join(format!("{}.sha1", self.name))
    }

    /// `<build>/<name>.meshes.json`
    pub fn mapping_path(&self) -> PathBuf {
        self.build_dir.join(format!("{}.meshes.json", self.name))
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(PackError::Config(format!("invalid project name '{}'", name)))
    }
}
