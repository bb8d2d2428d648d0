//! Shared types used throughout the library.

mod direction;
mod item;
mod path;
mod transform;

pub use direction::{Axis, Direction};
pub use item::{Item, ItemDefinition, ItemDefinitionFile};
pub use path::{join_file_path, normalize_file_path, ResourcePath, DEFAULT_NAMESPACE};
pub use transform::ElementRotation;

pub(crate) use path::is_valid_namespace_char;

use crate::error::{PackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex::decode(digits)
            .map_err(|e| PackError::Config(format!("invalid color '{}': {}", hex, e)))?;
        match bytes.as_slice() {
            [r, g, b] => Ok(Self::new(*r, *g, *b)),
            _ => Err(PackError::Config(format!(
                "invalid color '{}': expected 6 hex digits",
                hex
            ))),
        }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", hex::encode([self.r, self.g, self.b]))
    }
}

impl TryFrom<String> for Rgb {
    type Error = PackError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}
