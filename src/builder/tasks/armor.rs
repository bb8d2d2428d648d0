use super::{parse_declaration, take_declarations};
use crate::asset::ArmorTexture;
use crate::builder::{BuildContext, Task};
use crate::error::{PackError, Result};
use crate::files::VirtualFile;
use crate::types::{ResourcePath, Rgb};
use image::imageops::{self, FilterType};
use image::{ImageEncoder, Rgba, RgbaImage};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const LEATHER_LAYER: &str = "assets/minecraft/textures/models/armor/leather_layer_";
const ARMOR_SHADER: &str = "include/assets/minecraft/shaders/core/rendertype_armor_cutout_no_cull.fsh";
const RESOLUTION_PLACEHOLDER: &str = "<#ARMOR_RESOLUTION#>";
const DEFAULT_RESOLUTION: u32 = 16;
const WIDTH_RATIO: u32 = 4;
const HEIGHT_RATIO: u32 = 2;

/// Packs custom armor textures into the leather armor layers.
///
/// Each layer image becomes a horizontal strip: the vanilla leather texture
/// first, then one cell per armor that has the layer, ordered by color. The
/// first row of each cell encodes the dye color and animation parameters for
/// the armor shader, whose resolution placeholder is filled in here.
#[derive(Debug, Default)]
pub struct ProcessArmorTextures;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColorDeclaration {
    Hex(Rgb),
    Channels { r: u8, g: u8, b: u8 },
}

impl ColorDeclaration {
    fn rgb(&self) -> Rgb {
        match self {
            ColorDeclaration::Hex(color) => *color,
            ColorDeclaration::Channels { r, g, b } => Rgb::new(*r, *g, *b),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LayerDeclaration {
    Image(String),
    Detailed {
        image: String,
        #[serde(default = "one")]
        frames: u8,
        #[serde(default = "default_speed")]
        speed: u8,
        #[serde(default)]
        interpolation: bool,
        #[serde(default)]
        emissivity: u8,
        #[serde(default)]
        keep_image: bool,
    },
}

fn one() -> u8 {
    1
}

fn default_speed() -> u8 {
    24
}

#[derive(Debug, Deserialize)]
struct ArmorDeclaration {
    color: ColorDeclaration,
    #[serde(default)]
    layer_1: Option<LayerDeclaration>,
    #[serde(default)]
    layer_2: Option<LayerDeclaration>,
}

struct Layer {
    image: RgbaImage,
    frames: u8,
    speed: u8,
    interpolation: bool,
    emissivity: u8,
}

struct Armor {
    layers: [Option<Layer>; 2],
}

impl Task for ProcessArmorTextures {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let mut armors: BTreeMap<Rgb, Armor> = BTreeMap::new();

        for (path, file) in take_declarations(&mut ctx.files, ".armor.json")? {
            let declaration: ArmorDeclaration = parse_declaration(&file)?;
            let (color, armor) = load_armor(ctx, &path, declaration).map_err(|e| e.in_file(file.path()))?;
            if armors.contains_key(&color) {
                return Err(PackError::Config(format!("armor color {} is used twice", color)).in_file(file.path()));
            }
            ctx.assets.put(ArmorTexture {
                path,
                color,
                has_layer_1: armor.layers[0].is_some(),
                has_layer_2: armor.layers[1].is_some(),
            })?;
            armors.insert(color, armor);
        }

        let mut resolution = DEFAULT_RESOLUTION;
        if !armors.is_empty() {
            for layer in armors.values().flat_map(|a| a.layers.iter().flatten()) {
                resolution = resolution.max(layer.image.width() / WIDTH_RATIO);
            }
            for index in 0..2 {
                let image = compile_layer(ctx, &armors, index, resolution)?;
                let path = format!("{}{}.png", LEATHER_LAYER, index + 1);
                ctx.files.insert_file(VirtualFile::bytes(&path, image));
            }
            debug!(armors = armors.len(), resolution, "Compiled armor layers");
        }

        ctx.armor_resolution = Some(resolution);
        if let Some(shader) = ctx.files.get_file_mut(ARMOR_SHADER).and_then(|f| f.as_text_mut()) {
            *shader = shader.replace(RESOLUTION_PLACEHOLDER, &resolution.to_string());
        }
        Ok(())
    }
}

fn load_armor(ctx: &mut BuildContext<'_>, path: &ResourcePath, declaration: ArmorDeclaration) -> Result<(Rgb, Armor)> {
    let color = declaration.color.rgb();
    if color == Rgb::WHITE {
        return Err(PackError::Config(format!("armor color {} is reserved", color)));
    }
    let layers = [
        declaration.layer_1.map(|l| load_layer(ctx, path, l)).transpose()?,
        declaration.layer_2.map(|l| load_layer(ctx, path, l)).transpose()?,
    ];
    if layers.iter().all(Option::is_none) {
        return Err(PackError::Config("armor must have at least one layer".to_string()));
    }
    Ok((color, Armor { layers }))
}

fn load_layer(ctx: &mut BuildContext<'_>, path: &ResourcePath, declaration: LayerDeclaration) -> Result<Layer> {
    let (image, frames, speed, interpolation, emissivity, keep_image) = match declaration {
        LayerDeclaration::Image(image) => (image, 1, default_speed(), false, 0, false),
        LayerDeclaration::Detailed {
            image,
            frames,
            speed,
            interpolation,
            emissivity,
            keep_image,
        } => (image, frames, speed, interpolation, emissivity, keep_image),
    };

    let resolved = ResourcePath::resolve(&image, path)?;
    let value = if resolved.value().ends_with(".png") {
        resolved.value().to_string()
    } else {
        format!("{}.png", resolved.value())
    };
    let assets = format!("assets/{}/textures/{}", resolved.namespace(), value);
    let candidates = [
        format!("content/{}/{}", resolved.namespace(), value),
        format!("include/{}", assets),
        assets,
    ];
    let source = candidates
        .iter()
        .find(|c| ctx.files.contains(c))
        .ok_or_else(|| PackError::MissingFile(candidates[0].clone()))?
        .clone();

    let bytes = match ctx.files.get_file(&source) {
        Some(file) => file.read_bytes()?,
        None => return Err(PackError::MissingFile(source)),
    };
    let image = image::load_from_memory(&bytes)
        .map_err(|e| PackError::from(e).in_file(source.clone()))?
        .to_rgba8();
    if !keep_image {
        ctx.files.remove_file(&source);
    }

    Ok(Layer {
        image,
        frames: frames.max(1),
        speed,
        interpolation,
        emissivity,
    })
}

/// Scale `image` to the cell width, keeping its aspect ratio.
fn scale_to_cell(image: &RgbaImage, resolution: u32) -> RgbaImage {
    let width = resolution * WIDTH_RATIO;
    if image.width() == width || image.width() == 0 {
        return image.clone();
    }
    let height = image.height() * width / image.width();
    imageops::resize(image, width, height, FilterType::Nearest)
}

fn compile_layer(
    ctx: &mut BuildContext<'_>,
    armors: &BTreeMap<Rgb, Armor>,
    index: usize,
    resolution: u32,
) -> Result<Vec<u8>> {
    let default_path = format!("include/{}{}.png", LEATHER_LAYER, index + 1);
    let leather = match ctx.files.remove_file(&default_path) {
        Some(file) => Some(
            image::load_from_memory(&file.read_bytes()?)
                .map_err(|e| PackError::from(e).in_file(default_path.clone()))?
                .to_rgba8(),
        ),
        None => {
            warn!(path = %default_path, "Default leather layer not found, leaving it blank");
            None
        }
    };

    let mut cells = vec![leather.map(|image| scale_to_cell(&image, resolution))];
    let mut colors = Vec::new();
    for (color, armor) in armors {
        if let Some(layer) = &armor.layers[index] {
            cells.push(Some(scale_to_cell(&layer.image, resolution)));
            colors.push((*color, layer));
        }
    }

    let cell_width = resolution * WIDTH_RATIO;
    let height = cells
        .iter()
        .flatten()
        .map(|cell| cell.height())
        .fold(resolution * HEIGHT_RATIO, u32::max);
    let mut canvas = RgbaImage::new(cell_width * cells.len() as u32, height);

    for (i, cell) in cells.iter().enumerate() {
        if let Some(cell) = cell {
            imageops::replace(&mut canvas, cell, (cell_width * i as u32) as i64, 0);
        }
    }
    canvas.put_pixel(0, 1, Rgba(Rgb::WHITE.to_rgba()));
    for (i, (color, layer)) in colors.iter().enumerate() {
        let x = cell_width * (i as u32 + 1);
        canvas.put_pixel(x, 0, Rgba(color.to_rgba()));
        if layer.frames > 1 {
            let interpolation = if layer.interpolation { 1 } else { 0 };
            canvas.put_pixel(x + 1, 0, Rgba([layer.frames, layer.speed, interpolation, 255]));
        }
        if layer.emissivity > 0 {
            canvas.put_pixel(x + 2, 0, Rgba([layer.emissivity, 0, 0, 255]));
        }
    }

    encode_png(&canvas)
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(std::io::Cursor::new(&mut bytes)).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}
