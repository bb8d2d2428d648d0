//! Deterministic archive packaging.
//!
//! Entries are written in path order with a fixed DOS-epoch timestamp and
//! fixed permissions, so identical file collections produce byte-identical
//! archives and therefore identical digests.

use crate::digest::Sha1Digest;
use crate::error::{PackError, Result};
use crate::files::{stage_file, FileCollection, StagedFile};
use crate::project::PackageOptions;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Write `files` as a ZIP archive into `writer`.
pub fn write_archive<W: Write + Seek>(
    files: &FileCollection,
    writer: W,
    options: &PackageOptions,
) -> Result<W> {
    if !(0..=9).contains(&options.compression_level) {
        return Err(PackError::Config(format!(
            "compression level {} is outside 0-9",
            options.compression_level
        )));
    }

    let entry_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(options.compression_level))
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut zip = ZipWriter::new(writer);
    if !options.protection {
        if let Some(comment) = &options.comment {
            zip.set_comment(comment.clone());
        }
    }
    for file in files {
        zip.start_file(file.path(), entry_options)?;
        file.write_to(&mut zip, options.protection)
            .map_err(|e| e.in_file(file.path()))?;
    }
    Ok(zip.finish()?)
}

/// Package `files` into an in-memory archive.
pub fn package_to_bytes(files: &FileCollection, options: &PackageOptions) -> Result<Vec<u8>> {
    Ok(write_archive(files, Cursor::new(Vec::new()), options)?.into_inner())
}

/// Write the archive for `files` into a temporary file next to `output`
/// and return it with its digest. Nothing lands at `output` until the staged
/// file is committed.
pub fn stage_archive(
    files: &FileCollection,
    output: &Path,
    options: &PackageOptions,
) -> Result<(StagedFile, Sha1Digest)> {
    let (staged, ()) = stage_file(output, |file| {
        write_archive(files, file, options)?;
        Ok(())
    })?;
    let digest = Sha1Digest::from_file(staged.staged_path())?;
    debug!(files = files.len(), sha1 = %digest, "Staged archive");
    Ok((staged, digest))
}

/// Package `files` into `output` and return the archive digest.
///
/// The archive is written to a temporary file next to `output` and renamed
/// into place only once complete.
pub fn package_files(
    files: &FileCollection,
    output: &Path,
    options: &PackageOptions,
) -> Result<Sha1Digest> {
    let (staged, digest) = stage_archive(files, output, options)?;
    staged.commit()?;
    info!(
        files = files.len(),
        archive = %output.display(),
        sha1 = %digest,
        "Packaged"
    );
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::VirtualFile;
    use serde_json::json;
    use std::io::Read;

    fn sample_files(reversed: bool) -> FileCollection {
        let mut entries = vec![
            VirtualFile::text("pack.mcmeta", "{\"pack\":{}}"),
            VirtualFile::json("assets/demo/sounds.json", json!({ "boom": { "sounds": ["demo:boom"] } })),
            VirtualFile::bytes("assets/demo/textures/item/stick.png", vec![1, 2, 3, 4]),
        ];
        if reversed {
            entries.reverse();
        }
        let mut files = FileCollection::new();
        for entry in entries {
            files.add_file(entry).unwrap();
        }
        files
    }

    #[test]
    fn test_packaging_is_deterministic() {
        let options = PackageOptions::default();
        let a = package_to_bytes(&sample_files(false), &options).unwrap();
        let b = package_to_bytes(&sample_files(true), &options).unwrap();
        assert_eq!(a, b);
        assert_eq!(Sha1Digest::of(&a), Sha1Digest::of(&b));
    }

    #[test]
    fn test_entries_sorted_by_path() {
        let bytes = package_to_bytes(&sample_files(false), &PackageOptions::default()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(archive.len(), 3);

        let mut in_order = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i).unwrap();
            in_order.push(entry.name().to_string());
        }
        assert_eq!(in_order, sorted);
    }

    #[test]
    fn test_protection_minifies_and_drops_comment() {
        let options = PackageOptions {
            protection: true,
            comment: Some("made with propack".to_string()),
            ..PackageOptions::default()
        };
        let bytes = package_to_bytes(&sample_files(false), &options).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.comment().is_empty());

        let mut sounds = String::new();
        archive
            .by_name("assets/demo/sounds.json")
            .unwrap()
            .read_to_string(&mut sounds)
            .unwrap();
        assert!(!sounds.contains('\n'));

        let plain = PackageOptions {
            comment: Some("made with propack".to_string()),
            ..PackageOptions::default()
        };
        let bytes = package_to_bytes(&sample_files(false), &plain).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.comment(), b"made with propack");
    }

    #[test]
    fn test_package_files_writes_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("build/demo.propack");
        let files = sample_files(false);

        let first = package_files(&files, &output, &PackageOptions::default()).unwrap();
        let second = package_files(&files, &output, &PackageOptions::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(Sha1Digest::from_file(&output).unwrap(), first);
    }

    #[test]
    fn test_failed_packaging_keeps_previous_archive() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("demo.propack");
        std::fs::write(&output, b"previous").unwrap();

        let mut files = FileCollection::new();
        files
            .add_file(VirtualFile::disk("assets/demo/missing.ogg", dir.path().join("missing.ogg")))
            .unwrap();

        let err = package_files(&files, &output, &PackageOptions::default()).unwrap_err();
        assert!(matches!(err, PackError::FileProcessing { .. }));
        assert_eq!(std::fs::read(&output).unwrap(), b"previous");
    }

    #[test]
    fn test_staged_archive_is_hashed_before_commit() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("demo.propack");
        let files = sample_files(false);

        let (staged, digest) = stage_archive(&files, &output, &PackageOptions::default()).unwrap();
        assert!(!output.exists());
        staged.commit().unwrap();
        assert_eq!(Sha1Digest::from_file(&output).unwrap(), digest);
    }

    #[test]
    fn test_rejects_bad_compression_level() {
        let options = PackageOptions {
            compression_level: 12,
            ..PackageOptions::default()
        };
        assert!(package_to_bytes(&FileCollection::new(), &options).is_err());
    }
}
