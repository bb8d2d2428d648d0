use crate::builder::{BuildContext, PackagedArchive, Task};
use crate::error::Result;
use crate::files::stage_file;
use crate::package::stage_archive;
use std::io::Write;
use tracing::info;

/// Writes `<build>/<name>.propack`, its `.sha1` digest file and the
/// persisted mesh mapping.
///
/// All three are staged before any is renamed into place, and the archive is
/// renamed last.
#[derive(Debug, Default)]
pub struct Package;

impl Task for Package {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let project = ctx.project;
        let path = project.archive_path();

        let (archive, digest) = stage_archive(&ctx.files, &path, &project.config.package)?;
        let (digest_file, ()) = stage_file(&project.digest_path(), |file| {
            file.write_all(digest.to_hex().as_bytes())?;
            Ok(())
        })?;
        let mapping = match &ctx.mesh_mapping {
            Some(mapping) => Some(mapping.stage(project.mapping_path())?),
            None => None,
        };

        if let Some(mapping) = mapping {
            mapping.commit()?;
        }
        digest_file.commit()?;
        archive.commit()?;
        info!(
            files = ctx.files.len(),
            archive = %path.display(),
            sha1 = %digest,
            "Packaged"
        );

        ctx.archive = Some(PackagedArchive { path, digest });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tasks::test_support::{context, demo_project};
    use crate::digest::Sha1Digest;
    use crate::files::VirtualFile;
    use crate::mapping::{MeshMapping, MeshMappingEntry};
    use crate::types::ResourcePath;

    #[test]
    fn test_writes_archive_digest_and_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path()).with_build_dir(dir.path().join("build"));
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::text("pack.mcmeta", "{}"))
            .unwrap();
        ctx.mesh_mapping = Some(
            MeshMapping::from_entries([MeshMappingEntry {
                item: ResourcePath::parse("stick").unwrap(),
                block: false,
                mesh: ResourcePath::parse("demo:custom_stick").unwrap(),
                id: 1,
            }])
            .unwrap(),
        );

        Package.run(&mut ctx).unwrap();

        let archive = ctx.archive.clone().unwrap();
        assert_eq!(archive.path, project.archive_path());
        assert_eq!(Sha1Digest::from_file(&archive.path).unwrap(), archive.digest);
        assert_eq!(
            std::fs::read_to_string(project.digest_path()).unwrap(),
            archive.digest.to_hex()
        );
        let saved = MeshMapping::load(project.mapping_path()).unwrap();
        assert_eq!(Some(saved), ctx.mesh_mapping);
    }

    #[test]
    fn test_unwritable_mapping_leaves_no_archive() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path()).with_build_dir(dir.path().join("build"));
        std::fs::create_dir_all(project.mapping_path()).unwrap();
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::text("pack.mcmeta", "{}"))
            .unwrap();
        ctx.mesh_mapping = Some(MeshMapping::new());

        assert!(Package.run(&mut ctx).is_err());
        assert!(ctx.archive.is_none());
        assert!(!project.archive_path().exists());
        assert!(!project.digest_path().exists());
        assert_eq!(std::fs::read_dir(&project.build_dir).unwrap().count(), 1);
    }

    #[test]
    fn test_no_mapping_file_without_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path()).with_build_dir(dir.path().join("build"));
        let mut ctx = context(&project);
        Package.run(&mut ctx).unwrap();
        assert!(project.archive_path().is_file());
        assert!(!project.mapping_path().exists());
    }
}
