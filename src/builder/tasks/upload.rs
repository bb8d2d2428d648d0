use crate::builder::{BuildContext, Task};
use crate::error::{PackError, Result};
use tracing::{error, info};

/// Hands the packaged archive to the hosting collaborator.
///
/// Upload failures only fail the build when the project requires an upload.
#[derive(Debug, Default)]
pub struct Upload;

impl Task for Upload {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let project = ctx.project;
        let Some(hosting) = ctx.hosting else {
            return Err(PackError::Config("no hosting configured for upload".to_string()));
        };
        let Some(archive) = &ctx.archive else {
            return Err(PackError::Config(
                "upload requires a packaged archive".to_string(),
            ));
        };
        let required = project.config.require_upload;

        match hosting.upload(&archive.path, &archive.digest, &project.name, &project.config.upload) {
            Ok(Some(uploaded)) => ctx.uploaded = Some(uploaded),
            Ok(None) if required => {
                return Err(PackError::Upload(format!(
                    "pack '{}' was not uploaded",
                    project.name
                )))
            }
            Ok(None) => info!(pack = %project.name, "Pack was not uploaded"),
            Err(e) if required => return Err(e),
            Err(e) => error!(pack = %project.name, error = %e, "Upload failed, continuing"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tasks::test_support::demo_project;
    use crate::builder::{BuildContext, PackagedArchive};
    use crate::digest::Sha1Digest;
    use crate::hosting::{Hosting, LocalHosting, UploadOptions, UploadedPack};
    use crate::project::BuildConfig;
    use std::path::Path;

    struct FailingHosting;

    impl Hosting for FailingHosting {
        fn upload(
            &self,
            _file: &Path,
            _digest: &Sha1Digest,
            _name: &str,
            _options: &UploadOptions,
        ) -> Result<Option<UploadedPack>> {
            Err(PackError::Upload("server unavailable".to_string()))
        }
    }

    fn packaged(ctx: &mut BuildContext<'_>, dir: &Path) {
        let path = dir.join("demo.propack");
        std::fs::write(&path, b"archive").unwrap();
        ctx.archive = Some(PackagedArchive {
            digest: Sha1Digest::from_file(&path).unwrap(),
            path,
        });
    }

    #[test]
    fn test_uploads_archive() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let hosting = LocalHosting::new(dir.path().join("www"), "http://localhost:8080");
        let mut ctx = BuildContext::new(&project, Default::default(), Some(&hosting));
        packaged(&mut ctx, dir.path());

        Upload.run(&mut ctx).unwrap();

        let uploaded = ctx.uploaded.unwrap();
        assert_eq!(uploaded.name, "demo");
        assert!(uploaded.url.starts_with("http://localhost:8080/"));
    }

    #[test]
    fn test_failure_is_fatal_only_when_required() {
        let dir = tempfile::tempdir().unwrap();
        let hosting = FailingHosting;

        let project = demo_project(dir.path());
        let mut ctx = BuildContext::new(&project, Default::default(), Some(&hosting));
        packaged(&mut ctx, dir.path());
        Upload.run(&mut ctx).unwrap();
        assert!(ctx.uploaded.is_none());

        let project = demo_project(dir.path())
            .with_config(BuildConfig::default().with_required_upload(true));
        let mut ctx = BuildContext::new(&project, Default::default(), Some(&hosting));
        packaged(&mut ctx, dir.path());
        assert!(matches!(Upload.run(&mut ctx), Err(PackError::Upload(_))));
    }

    #[test]
    fn test_requires_archive_and_hosting() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = BuildContext::new(&project, Default::default(), None);
        packaged(&mut ctx, dir.path());
        assert!(matches!(Upload.run(&mut ctx), Err(PackError::Config(_))));

        let hosting = LocalHosting::new(dir.path(), "http://localhost");
        let mut ctx = BuildContext::new(&project, Default::default(), Some(&hosting));
        assert!(matches!(Upload.run(&mut ctx), Err(PackError::Config(_))));
    }
}
