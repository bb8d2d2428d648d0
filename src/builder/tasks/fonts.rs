use super::{parse_declaration, take_declarations};
use crate::asset::Font;
use crate::builder::{BuildContext, Task};
use crate::error::{PackError, Result};
use crate::files::VirtualFile;
use crate::types::ResourcePath;
use serde_json::Value;
use tracing::warn;

/// Emits `content/<ns>/**.font.json` as `assets/<ns>/font/<path>.json`,
/// resolving provider `file` and reference `id` paths.
#[derive(Debug, Default)]
pub struct ProcessFonts;

impl Task for ProcessFonts {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        for (path, file) in take_declarations(&mut ctx.files, ".font.json")? {
            let mut font: Value = parse_declaration(&file)?;
            resolve_providers(&mut font, &path).map_err(|e| e.in_file(file.path()))?;
            ctx.files.add_file(VirtualFile::json(
                &format!("{}.json", path.assets_path("font")),
                font,
            ))?;
            ctx.assets.put(Font {
                font_path: path.clone(),
                path,
            })?;
        }
        Ok(())
    }
}

fn resolve_providers(font: &mut Value, path: &ResourcePath) -> Result<()> {
    let Some(providers) = font.get_mut("providers") else {
        return Ok(());
    };
    let Some(providers) = providers.as_array_mut() else {
        return Err(PackError::Config("`providers` is not an array".to_string()));
    };
    for provider in providers {
        let Some(provider) = provider.as_object_mut() else {
            return Err(PackError::Config("font provider is not an object".to_string()));
        };
        let kind = provider
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_lowercase);
        match kind.as_deref() {
            Some("bitmap") => {
                let ascent = provider.get("ascent").and_then(Value::as_i64).unwrap_or(0);
                let height = provider.get("height").and_then(Value::as_i64).unwrap_or(0);
                if ascent > height {
                    warn!(font = %path, ascent, height, "Bitmap ascent higher than height");
                }
            }
            Some("reference") => resolve_field(provider, "id", path)?,
            _ => {}
        }
        resolve_field(provider, "file", path)?;
    }
    Ok(())
}

fn resolve_field(provider: &mut serde_json::Map<String, Value>, key: &str, path: &ResourcePath) -> Result<()> {
    if let Some(Value::String(value)) = provider.get_mut(key) {
        *value = ResourcePath::resolve(value, path)?.to_string();
    }
    Ok(())
}
