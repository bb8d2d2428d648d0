//! In-memory file collection that feeds the archive packager.
//!
//! Tasks read and rewrite [`VirtualFile`]s by their normalized path. Storage is
//! a sorted map, so iteration order never depends on insertion order.

mod atomic;

pub use atomic::{stage_file, write_atomically, StagedFile};

use crate::error::{PackError, Result};
use crate::types::normalize_file_path;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

/// Content of a virtual file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    /// Raw bytes held in memory.
    Bytes(Vec<u8>),
    /// UTF-8 text that tasks may patch (shaders, metadata).
    Text(String),
    /// Parsed JSON that tasks may rewrite before packaging.
    Json(serde_json::Value),
    /// A file on disk, read only when packaged.
    Disk(PathBuf),
}

/// A single file in the build, addressed by a normalized archive path.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualFile {
    path: String,
    content: FileContent,
}

impl VirtualFile {
    pub fn new(path: &str, content: FileContent) -> Self {
        Self {
            path: normalize_file_path(path),
            content,
        }
    }

    pub fn bytes(path: &str, data: Vec<u8>) -> Self {
        Self::new(path, FileContent::Bytes(data))
    }

    pub fn text(path: &str, text: impl Into<String>) -> Self {
        Self::new(path, FileContent::Text(text.into()))
    }

    pub fn json(path: &str, value: serde_json::Value) -> Self {
        Self::new(path, FileContent::Json(value))
    }

    pub fn disk(path: &str, source: impl Into<PathBuf>) -> Self {
        Self::new(path, FileContent::Disk(source.into()))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &FileContent {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut FileContent {
        &mut self.content
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match &self.content {
            FileContent::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_json_mut(&mut self) -> Option<&mut serde_json::Value> {
        match &mut self.content {
            FileContent::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut String> {
        match &mut self.content {
            FileContent::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The same content under a new path. On-disk files are not re-read.
    pub fn copy_as(&self, path: &str) -> VirtualFile {
        VirtualFile::new(path, self.content.clone())
    }

    /// Open the content as a byte stream.
    pub fn open(&self) -> Result<Box<dyn Read + '_>> {
        Ok(match &self.content {
            FileContent::Bytes(data) => Box::new(data.as_slice()),
            FileContent::Text(text) => Box::new(text.as_bytes()),
            FileContent::Json(value) => Box::new(std::io::Cursor::new(serde_json::to_vec(value)?)),
            FileContent::Disk(source) => Box::new(BufReader::new(File::open(source)?)),
        })
    }

    /// Read the whole content into memory.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.open()?.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Stream the content into `writer`. JSON is pretty-printed unless `minify`.
    pub fn write_to<W: Write>(&self, writer: &mut W, minify: bool) -> Result<()> {
        match &self.content {
            FileContent::Bytes(data) => writer.write_all(data)?,
            FileContent::Text(text) => writer.write_all(text.as_bytes())?,
            FileContent::Json(value) if minify => serde_json::to_writer(&mut *writer, value)?,
            FileContent::Json(value) => serde_json::to_writer_pretty(&mut *writer, value)?,
            FileContent::Disk(source) => {
                let mut file = File::open(source)?;
                std::io::copy(&mut file, writer)?;
            }
        }
        Ok(())
    }
}

/// A path-keyed set of virtual files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCollection {
    files: BTreeMap<String, VirtualFile>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, rejecting a path that is already present.
    pub fn add_file(&mut self, file: VirtualFile) -> Result<()> {
        if self.files.contains_key(file.path()) {
            return Err(PackError::DuplicateFile(file.path().to_string()));
        }
        self.files.insert(file.path().to_string(), file);
        Ok(())
    }

    /// Add a file, replacing and returning any file at the same path.
    pub fn insert_file(&mut self, file: VirtualFile) -> Option<VirtualFile> {
        self.files.insert(file.path().to_string(), file)
    }

    pub fn get_file(&self, path: &str) -> Option<&VirtualFile> {
        self.files.get(&normalize_file_path(path))
    }

    pub fn get_file_mut(&mut self, path: &str) -> Option<&mut VirtualFile> {
        self.files.get_mut(&normalize_file_path(path))
    }

    pub fn remove_file(&mut self, path: &str) -> Option<VirtualFile> {
        self.files.remove(&normalize_file_path(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_file_path(path))
    }

    /// Move a file to a new path without touching its content.
    pub fn rename_file(&mut self, from: &str, to: &str) -> Result<()> {
        let file = self
            .remove_file(from)
            .ok_or_else(|| PackError::MissingFile(from.to_string()))?;
        self.add_file(file.copy_as(to))
    }

    /// Snapshot of paths starting with `prefix` and ending with `suffix`.
    pub fn paths_matching(&self, prefix: &str, suffix: &str) -> Vec<String> {
        self.files
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .filter(|(path, _)| path.ends_with(suffix))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Remove and return every file whose path matches `prefix` and `suffix`.
    pub fn take_matching(&mut self, prefix: &str, suffix: &str) -> Vec<VirtualFile> {
        self.paths_matching(prefix, suffix)
            .into_iter()
            .filter_map(|path| self.files.remove(&path))
            .collect()
    }

    /// Files in path order.
    pub fn iter(&self) -> impl Iterator<Item = &VirtualFile> {
        self.files.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Independent copy; changes to either collection do not affect the other.
    pub fn copy(&self) -> FileCollection {
        self.clone()
    }
}

impl<'a> IntoIterator for &'a FileCollection {
    type Item = &'a VirtualFile;
    type IntoIter = std::collections::btree_map::Values<'a, String, VirtualFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.values()
    }
}
