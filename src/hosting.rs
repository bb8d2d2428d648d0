//! Hosting collaborators that make a packaged archive reachable by URL.

use crate::digest::Sha1Digest;
use crate::error::{PackError, Result};
use crate::files::write_atomically;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Free-form options passed through to the hosting collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadOptions(pub BTreeMap<String, serde_json::Value>);

impl UploadOptions {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }
}

/// A pack that a hosting collaborator has made reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPack {
    pub name: String,
    pub url: String,
    pub digest: Sha1Digest,
}

impl UploadedPack {
    pub fn sha1(&self) -> &[u8; 20] {
        self.digest.as_bytes()
    }

    pub fn sha1_hex(&self) -> &str {
        self.digest.to_hex()
    }
}

/// Uploads packaged archives.
///
/// `Ok(None)` means the pack was built but not uploaded, which is a valid
/// outcome. Errors are upload failures.
pub trait Hosting {
    fn upload(
        &self,
        file: &Path,
        digest: &Sha1Digest,
        name: &str,
        options: &UploadOptions,
    ) -> Result<Option<UploadedPack>>;
}

/// Copies archives into a directory served at `base_url`.
///
/// Files are named `<sha1>.zip`, so every distinct archive gets its own URL.
#[derive(Debug, Clone)]
pub struct LocalHosting {
    directory: PathBuf,
    base_url: String,
}

impl LocalHosting {
    pub fn new(directory: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base_url: base_url.into(),
        }
    }
}

impl Hosting for LocalHosting {
    fn upload(
        &self,
        file: &Path,
        digest: &Sha1Digest,
        name: &str,
        _options: &UploadOptions,
    ) -> Result<Option<UploadedPack>> {
        let file_name = format!("{}.zip", digest);
        let target = self.directory.join(&file_name);
        if !target.exists() {
            write_atomically(&target, |out| {
                let mut source = File::open(file)
                    .map_err(|e| PackError::Upload(format!("{}: {}", file.display(), e)))?;
                std::io::copy(&mut source, out)?;
                Ok(())
            })?;
        }
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), file_name);
        info!(pack = name, url = %url, "Uploaded");
        Ok(Some(UploadedPack {
            name: name.to_string(),
            url,
            digest: digest.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_hosting_copies_by_digest() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("demo.propack");
        std::fs::write(&archive, b"zip bytes").unwrap();
        let digest = Sha1Digest::from_file(&archive).unwrap();

        let hosting = LocalHosting::new(dir.path().join("www"), "https://packs.example.com/");
        let uploaded = hosting
            .upload(&archive, &digest, "demo", &UploadOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(
            uploaded.url,
            format!("https://packs.example.com/{}.zip", digest.to_hex())
        );
        assert_eq!(uploaded.sha1_hex(), digest.to_hex());
        let copied = dir.path().join("www").join(format!("{}.zip", digest));
        assert_eq!(std::fs::read(copied).unwrap(), b"zip bytes");
    }

    #[test]
    fn test_missing_archive_is_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let hosting = LocalHosting::new(dir.path(), "http://localhost");
        let err = hosting
            .upload(
                &dir.path().join("missing.propack"),
                &Sha1Digest::of(b""),
                "demo",
                &UploadOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, PackError::Upload(_)));
    }

    #[test]
    fn test_upload_options() {
        let options: UploadOptions = serde_json::from_str(r#"{ "bucket": "packs" }"#).unwrap();
        assert_eq!(options.get("bucket"), Some(&serde_json::json!("packs")));
        let options = options.with("public", true);
        assert_eq!(options.0.len(), 2);
    }
}
