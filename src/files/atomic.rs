use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A complete file waiting in a temporary file next to its target.
///
/// [`StagedFile::commit`] renames it into place. Dropping it uncommitted
/// removes the temporary file and leaves the target untouched.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Where the file lands on commit.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The temporary file holding the staged content.
    pub fn staged_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn commit(self) -> Result<()> {
        self.temp.persist(&self.target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Write the content of `path` into a temporary file in the same directory
/// without touching `path` itself.
pub fn stage_file<T, F>(path: &Path, write: F) -> Result<(StagedFile, T)>
where
    F: FnOnce(&mut File) -> Result<T>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    let value = write(temp.as_file_mut())?;
    temp.as_file_mut().flush()?;
    temp.as_file().sync_all()?;
    let staged = StagedFile {
        temp,
        target: path.to_path_buf(),
    };
    Ok((staged, value))
}

/// Write `path` through a temporary file in the same directory, renamed into
/// place only when `write` succeeds. On failure the previous file is untouched
/// and the temporary file is removed.
pub fn write_atomically<T, F>(path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut File) -> Result<T>,
{
    let (staged, value) = stage_file(path, write)?;
    staged.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackError;

    #[test]
    fn test_replaces_file_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/demo.sha1");
        write_atomically(&path, |f| Ok(f.write_all(b"first")?)).unwrap();
        write_atomically(&path, |f| Ok(f.write_all(b"second")?)).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_failure_leaves_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.propack");
        std::fs::write(&path, b"previous").unwrap();

        let result: Result<()> = write_atomically(&path, |f| {
            f.write_all(b"partial")?;
            Err(PackError::Config("boom".into()))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_staged_file_lands_only_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.sha1");
        std::fs::write(&path, b"previous").unwrap();

        let (staged, ()) = stage_file(&path, |f| Ok(f.write_all(b"next")?)).unwrap();
        assert_eq!(std::fs::read(staged.staged_path()).unwrap(), b"next");
        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
        staged.commit().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"next");

        let (dropped, ()) = stage_file(&path, |f| Ok(f.write_all(b"discarded")?)).unwrap();
        drop(dropped);
        assert_eq!(std::fs::read(&path).unwrap(), b"next");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
