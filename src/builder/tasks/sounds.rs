use super::{parse_declaration, take_declarations, take_included};
use crate::asset::SoundAsset;
use crate::builder::{BuildContext, Task};
use crate::error::{PackError, Result};
use crate::files::VirtualFile;
use crate::types::ResourcePath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Turns `content/<ns>/**.sound.json` declarations into `assets/<ns>/sounds.json`.
#[derive(Debug, Default)]
pub struct ProcessSounds;

#[derive(Debug, Deserialize)]
struct SoundDeclaration {
    sounds: Vec<SoundEntry>,
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    subtitle: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SoundEntry {
    Name(String),
    Detailed(Sound),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SoundKind {
    #[default]
    File,
    Event,
}

#[derive(Debug, Serialize, Deserialize)]
struct Sound {
    name: String,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    volume: f32,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pitch: f32,
    #[serde(default = "one_u32", skip_serializing_if = "is_one_u32")]
    weight: u32,
    #[serde(default, rename = "type", skip_serializing_if = "is_file")]
    kind: SoundKind,
    #[serde(default, skip_serializing_if = "is_false")]
    stream: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    preload: bool,
    #[serde(default = "sixteen", skip_serializing_if = "is_sixteen")]
    attenuation_distance: u32,
}

fn one() -> f32 {
    1.0
}

fn is_one(value: &f32) -> bool {
    *value == 1.0
}

fn one_u32() -> u32 {
    1
}

fn is_one_u32(value: &u32) -> bool {
    *value == 1
}

fn sixteen() -> u32 {
    16
}

fn is_sixteen(value: &u32) -> bool {
    *value == 16
}

fn is_file(kind: &SoundKind) -> bool {
    *kind == SoundKind::File
}

fn is_false(value: &bool) -> bool {
    !value
}

impl SoundEntry {
    fn into_sound(self) -> Sound {
        match self {
            SoundEntry::Name(name) => Sound {
                name,
                volume: 1.0,
                pitch: 1.0,
                weight: 1,
                kind: SoundKind::File,
                stream: false,
                preload: false,
                attenuation_distance: 16,
            },
            SoundEntry::Detailed(sound) => sound,
        }
    }
}

impl Sound {
    fn is_plain(&self) -> bool {
        self.volume == 1.0
            && self.pitch == 1.0
            && self.weight == 1
            && self.kind == SoundKind::File
            && !self.stream
            && !self.preload
            && self.attenuation_distance == 16
    }

    /// A plain file reference is written as its name only.
    fn to_json(&self) -> Result<Value> {
        if self.is_plain() {
            Ok(Value::String(self.name.clone()))
        } else {
            Ok(serde_json::to_value(self)?)
        }
    }
}

impl Task for ProcessSounds {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let mut events: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

        for (path, file) in take_declarations(&mut ctx.files, ".sound.json")? {
            let declaration: SoundDeclaration = parse_declaration(&file)?;
            let event = build_event(ctx, &path, declaration).map_err(|e| e.in_file(file.path()))?;
            events
                .entry(path.namespace().to_string())
                .or_default()
                .insert(path.value().to_string(), event);
            debug!(sound = %path, "Registered sound event");
            ctx.assets.put(SoundAsset {
                sound_path: path.clone(),
                path,
            })?;
        }

        for (namespace, namespace_events) in events {
            let target = format!("assets/{}/sounds.json", namespace);
            let mut merged = match take_included(&mut ctx.files, &target) {
                Some(file) => parse_declaration::<Map<String, Value>>(&file)?,
                None => Map::new(),
            };
            merged.extend(namespace_events);
            ctx.files.insert_file(VirtualFile::json(&target, Value::Object(merged)));
        }
        Ok(())
    }
}

fn build_event(ctx: &BuildContext<'_>, path: &ResourcePath, declaration: SoundDeclaration) -> Result<Value> {
    let mut sounds = Vec::new();
    for entry in declaration.sounds {
        let mut sound = entry.into_sound();
        let name = sound.name.strip_suffix(".ogg").unwrap_or(&sound.name);
        let resolved = ResourcePath::resolve(name, path)?;
        if sound.kind == SoundKind::File {
            check_sound_file(ctx, &resolved)?;
        }
        sound.name = resolved.to_string();
        sounds.push(sound.to_json()?);
    }

    let mut event = Map::new();
    if declaration.replace {
        event.insert("replace".to_string(), Value::Bool(true));
    }
    if let Some(subtitle) = declaration.subtitle {
        event.insert("subtitle".to_string(), Value::String(subtitle));
    }
    event.insert("sounds".to_string(), Value::Array(sounds));
    Ok(Value::Object(event))
}

fn check_sound_file(ctx: &BuildContext<'_>, sound: &ResourcePath) -> Result<()> {
    let assets = format!("{}.ogg", sound.assets_path("sounds"));
    let candidates = [
        format!("{}.ogg", sound.content_path()),
        format!("include/{}", assets),
        assets,
    ];
    if candidates.iter().any(|c| ctx.files.contains(c)) {
        Ok(())
    } else {
        Err(PackError::MissingFile(candidates[0].clone()))
    }
}
