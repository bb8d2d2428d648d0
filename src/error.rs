//! Error types for the resource pack builder.

use thiserror::Error;

/// Result type alias using PackError.
pub type Result<T> = std::result::Result<T, PackError>;

/// Main error type for building and loading resource packs.
#[derive(Error, Debug)]
pub enum PackError {
    /// Failed to read or write a ZIP archive.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to parse or serialize JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to decode or encode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A resource path or identifier is malformed.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A file with the same path is already in the file collection.
    #[error("File '{0}' already exists")]
    DuplicateFile(String),

    /// An asset with the same path is already registered in its category.
    #[error("Duplicate {category} '{path}'")]
    DuplicateAsset { category: &'static str, path: String },

    /// A file required by the build is missing.
    #[error("File not found: {0}")]
    MissingFile(String),

    /// An item model targets an item type absent from the item definition.
    #[error("Item model '{model}' targets unknown item '{item}'")]
    UnknownItem { model: String, item: String },

    /// Runtime state does not match what an item model declares.
    #[error("Invalid mesh state: {0}")]
    InvalidMeshState(String),

    /// Project or build configuration is malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Processing a specific file failed.
    #[error("Failed to process '{path}': {source}")]
    FileProcessing {
        path: String,
        #[source]
        source: Box<PackError>,
    },

    /// A task directive refers to a task that does not exist.
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// A task with the same name is already in the pipeline.
    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    /// The archive was written by an incompatible format version.
    #[error("Unsupported format version {found} (supported: {supported})")]
    UnsupportedFormatVersion { found: u32, supported: u32 },

    /// The archive is truncated or missing required entries.
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// The hosting collaborator failed to upload the archive.
    #[error("Upload failed: {0}")]
    Upload(String),
}

impl PackError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PackError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap this error with the path of the file being processed.
    pub(crate) fn in_file(self, path: impl Into<String>) -> Self {
        PackError::FileProcessing {
            path: path.into(),
            source: Box::new(self),
        }
    }
}
