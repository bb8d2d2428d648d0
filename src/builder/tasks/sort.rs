use crate::builder::{BuildContext, Task};
use crate::error::{PackError, Result};
use tracing::debug;

/// Moves sources to their place in the pack.
///
/// `include/**` moves to the archive root. Under `content/<ns>/`, textures
/// go to `textures/`, sounds to `sounds/` and font files to `font/`; any
/// other content no task consumed is dropped.
#[derive(Debug, Default)]
pub struct SortAssets;

/// Asset category for a content file, by extension.
fn content_category(path: &str) -> Option<&'static str> {
    if path.ends_with(".png") || path.ends_with(".png.mcmeta") {
        Some("textures")
    } else if path.ends_with(".ogg") {
        Some("sounds")
    } else if path.ends_with(".ttf") || path.ends_with(".otf") || path.ends_with(".bin") {
        Some("font")
    } else {
        None
    }
}

impl Task for SortAssets {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let paths: Vec<String> = ctx.files.paths().map(str::to_string).collect();
        for path in paths {
            if let Some(target) = path.strip_prefix("include/") {
                let target = target.to_string();
                if let Some(file) = ctx.files.remove_file(&path) {
                    ctx.files.add_file(file.copy_as(&target))?;
                }
            } else if let Some(rest) = path.strip_prefix("content/") {
                let Some((namespace, value)) = rest.split_once('/') else {
                    return Err(PackError::invalid_path(path.clone(), "missing namespace directory"));
                };
                let target = content_category(value)
                    .map(|category| format!("assets/{}/{}/{}", namespace, category, value));
                let Some(file) = ctx.files.remove_file(&path) else {
                    continue;
                };
                match target {
                    Some(target) => ctx.files.add_file(file.copy_as(&target))?,
                    None => debug!(path = %path, "Dropping unused content file"),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tasks::test_support::{context, demo_project};
    use crate::files::VirtualFile;

    #[test]
    fn test_sorts_sources() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        for path in [
            "include/assets/minecraft/textures/block/stone.png",
            "include/pack.png",
            "content/demo/item/stick.png",
            "content/demo/item/stick.png.mcmeta",
            "content/demo/sfx/boom.ogg",
            "content/demo/fonts/mono.ttf",
            "content/demo/notes.txt",
            "assets/demo/models/x.json",
            "pack.mcmeta",
        ] {
            ctx.files.add_file(VirtualFile::bytes(path, vec![1])).unwrap();
        }

        SortAssets.run(&mut ctx).unwrap();

        let paths: Vec<&str> = ctx.files.paths().collect();
        assert_eq!(
            paths,
            vec![
                "assets/demo/font/fonts/mono.ttf",
                "assets/demo/models/x.json",
                "assets/demo/sounds/sfx/boom.ogg",
                "assets/demo/textures/item/stick.png",
                "assets/demo/textures/item/stick.png.mcmeta",
                "assets/minecraft/textures/block/stone.png",
                "pack.mcmeta",
                "pack.png",
            ]
        );
    }

    #[test]
    fn test_conflicting_include_fails() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        ctx.files.add_file(VirtualFile::bytes("include/pack.mcmeta", vec![1])).unwrap();
        ctx.files.add_file(VirtualFile::bytes("pack.mcmeta", vec![2])).unwrap();
        assert!(matches!(
            SortAssets.run(&mut ctx),
            Err(PackError::DuplicateFile(_))
        ));
    }
}
