use crate::builder::{BuildContext, Task};
use crate::error::{PackError, Result};
use crate::files::VirtualFile;
use crate::project::StrictMode;
use crate::types::is_valid_namespace_char;
use serde_json::json;
use std::path::Path;
use tracing::{debug, warn};

/// Reads the project's `include/` and `content/` trees into the file collection.
///
/// Also adds the generated `pack.mcmeta`, the project icon and any files the
/// project holds in memory.
#[derive(Debug, Default)]
pub struct GatherSources;

impl Task for GatherSources {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let project = ctx.project;
        for root in ["include", "content"] {
            let dir = project.project_dir.join(root);
            if dir.is_dir() {
                gather_directory(ctx, &dir, root)?;
            }
        }

        for file in &project.files {
            ctx.files.add_file(file.clone())?;
        }

        if !ctx.files.contains("include/pack.mcmeta") {
            ctx.files.add_file(VirtualFile::json(
                "pack.mcmeta",
                json!({
                    "pack": {
                        "pack_format": project.pack_format,
                        "description": project.description,
                    }
                }),
            ))?;
        }
        let icon = project.project_dir.join("pack.png");
        if icon.is_file() && !ctx.files.contains("include/pack.png") {
            ctx.files.add_file(VirtualFile::disk("pack.png", icon))?;
        }

        debug!(files = ctx.files.len(), "Gathered sources");
        Ok(())
    }
}

fn gather_directory(ctx: &mut BuildContext<'_>, dir: &Path, prefix: &str) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        let path = format!("{}/{}", prefix, name);
        let file_type = entry.file_type()?;

        if file_type.is_file() && ctx.project.config.is_ignored(&name) {
            debug!(path = %path, "Ignoring file by extension");
            continue;
        }
        if let Some(c) = name.chars().find(|c| !is_valid_namespace_char(*c)) {
            let reason = format!("non [a-z0-9_.-] character '{}'", c);
            match ctx.project.config.strict_mode {
                StrictMode::Enabled => return Err(PackError::invalid_path(path, reason)),
                StrictMode::Warn => warn!(path = %path, "Skipping file: {}", reason),
                StrictMode::Disabled => {}
            }
            continue;
        }

        if file_type.is_dir() {
            gather_directory(ctx, &entry.path(), &path)?;
        } else if file_type.is_file() {
            ctx.files.add_file(read_source(&path, &entry.path())?)?;
        }
    }
    Ok(())
}

/// JSON is parsed up front so tasks can rewrite it. Text formats tasks patch
/// are read as text, everything else stays on disk until packaging.
fn read_source(path: &str, source: &Path) -> Result<VirtualFile> {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match extension {
        "json" => {
            let text = std::fs::read_to_string(source)?;
            let value = serde_json::from_str(&text).map_err(|e| PackError::from(e).in_file(path))?;
            Ok(VirtualFile::json(path, value))
        }
        "mcmeta" | "fsh" | "vsh" | "glsl" => Ok(VirtualFile::text(path, std::fs::read_to_string(source)?)),
        _ => Ok(VirtualFile::disk(path, source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tasks::test_support::{context, demo_project};
    use crate::files::FileContent;
    use crate::project::BuildConfig;

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    #[test]
    fn test_gathers_project_tree() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "include/assets/minecraft/lang/en_us.json", "{}");
        write(dir.path(), "content/demo/Stick.mesh.json", r#"{"elements": []}"#);
        write(dir.path(), "content/demo/stick.png", "png");
        write(dir.path(), "content/demo/work.psd", "psd");
        write(dir.path(), "pack.png", "icon");

        let project = demo_project(dir.path())
            .with_description("Demo")
            .with_config(BuildConfig::default().with_ignored_extension("psd"));
        let mut ctx = context(&project);
        GatherSources.run(&mut ctx).unwrap();

        assert!(ctx.files.get_file("content/demo/stick.mesh.json").unwrap().as_json().is_some());
        assert!(matches!(
            ctx.files.get_file("content/demo/stick.png").unwrap().content(),
            FileContent::Disk(_)
        ));
        assert!(!ctx.files.contains("content/demo/work.psd"));
        assert!(ctx.files.contains("include/assets/minecraft/lang/en_us.json"));
        assert!(ctx.files.contains("pack.png"));

        let meta = ctx.files.get_file("pack.mcmeta").unwrap().as_json().unwrap();
        assert_eq!(meta["pack"]["pack_format"], project.pack_format);
        assert_eq!(meta["pack"]["description"], "Demo");
    }

    #[test]
    fn test_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "content/demo/bad name.png", "png");

        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        assert!(matches!(
            GatherSources.run(&mut ctx),
            Err(PackError::InvalidPath { .. })
        ));

        for mode in [StrictMode::Warn, StrictMode::Disabled] {
            let project = demo_project(dir.path())
                .with_config(BuildConfig::default().with_strict_mode(mode));
            let mut ctx = context(&project);
            GatherSources.run(&mut ctx).unwrap();
            assert!(ctx.files.paths().all(|p| !p.contains("bad")));
        }
    }

    #[test]
    fn test_included_pack_meta_wins() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "include/pack.mcmeta", r#"{"pack":{"pack_format":1}}"#);
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        GatherSources.run(&mut ctx).unwrap();
        assert!(!ctx.files.contains("pack.mcmeta"));
        assert!(ctx.files.contains("include/pack.mcmeta"));
    }

    #[test]
    fn test_malformed_json_names_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "content/demo/broken.model.json", "{");
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        let err = GatherSources.run(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("content/demo/broken.model.json"));
    }
}
