//! Loading built `.propack` archives back into [`Resources`].
//!
//! A load either returns a complete [`Resources`] or fails. Damage of any kind
//! is reported as [`PackError::CorruptArchive`], except a format version
//! mismatch which is [`PackError::UnsupportedFormatVersion`].

use crate::asset::{ArmorTexture, Asset, AssetMap, AssetRegistry, Font, ItemModel, SoundAsset};
use crate::error::{PackError, Result};
use crate::format::{self, Manifest, ManifestVersion, FORMAT_VERSION};
use crate::mapping::MeshMapping;
use crate::resources::Resources;
use crate::types::ItemDefinition;
use serde::de::DeserializeOwned;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// Load resources from an archive on disk.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Resources> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let resources = load_from_reader(std::io::BufReader::new(file))?;
    debug!(
        archive = %path.display(),
        assets = resources.assets().len(),
        meshes = resources.mesh_mapping().len(),
        "Loaded resources"
    );
    Ok(resources)
}

/// Load resources from archive bytes.
pub fn load_from_bytes(data: &[u8]) -> Result<Resources> {
    load_from_reader(std::io::Cursor::new(data))
}

fn load_from_reader<R: Read + Seek>(reader: R) -> Result<Resources> {
    let mut archive = ZipArchive::new(reader).map_err(corrupt)?;

    let manifest_bytes = read_entry(&mut archive, format::MANIFEST)?;
    let version: ManifestVersion = parse(format::MANIFEST, &manifest_bytes)?;
    if version.format_version != FORMAT_VERSION {
        return Err(PackError::UnsupportedFormatVersion {
            found: version.format_version,
            supported: FORMAT_VERSION,
        });
    }
    let manifest: Manifest = parse(format::MANIFEST, &manifest_bytes)?;
    let item_definition = ItemDefinition::from_file(&manifest.item_definition)
        .map_err(|e| PackError::CorruptArchive(format!("{}: {}", format::MANIFEST, e)))?;

    let mesh_mapping: MeshMapping = read_json(&mut archive, format::MESH_MAPPING)?;

    let mut assets = AssetRegistry::new();
    read_assets::<_, ItemModel>(&mut archive, format::ITEM_MODELS, &mut assets)?;
    read_assets::<_, SoundAsset>(&mut archive, format::SOUNDS, &mut assets)?;
    read_assets::<_, ArmorTexture>(&mut archive, format::ARMOR_TEXTURES, &mut assets)?;
    read_assets::<_, Font>(&mut archive, format::FONTS, &mut assets)?;

    for model in assets.iter::<ItemModel>() {
        model
            .validate()
            .map_err(|e| PackError::CorruptArchive(format!("{}: {}", format::ITEM_MODELS, e)))?;
    }

    Ok(Resources::new(
        manifest.name,
        manifest.pack_format,
        item_definition,
        assets,
        mesh_mapping,
    ))
}

fn read_assets<R: Read + Seek, A>(
    archive: &mut ZipArchive<R>,
    name: &str,
    assets: &mut AssetRegistry,
) -> Result<()>
where
    A: Asset,
    AssetMap<A>: DeserializeOwned,
{
    let map: AssetMap<A> = read_json(archive, name)?;
    map.check_keys()?;
    assets.set_assets(map);
    Ok(())
}

fn read_json<R: Read + Seek, T: DeserializeOwned>(archive: &mut ZipArchive<R>, name: &str) -> Result<T> {
    let bytes = read_entry(archive, name)?;
    parse(name, &bytes)
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => {
            PackError::CorruptArchive(format!("missing entry '{}'", name))
        }
        other => corrupt(other),
    })?;
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| PackError::CorruptArchive(format!("{}: {}", name, e)))?;
    Ok(bytes)
}

fn parse<T: DeserializeOwned>(name: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| PackError::CorruptArchive(format!("{}: {}", name, e)))
}

fn corrupt(error: zip::result::ZipError) -> PackError {
    PackError::CorruptArchive(error.to_string())
}
