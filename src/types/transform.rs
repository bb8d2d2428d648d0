//! Element rotation as written in mesh model files.

use super::Axis;
use serde::{Deserialize, Serialize};

/// Element-level rotation from a mesh element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRotation {
    /// Origin point for rotation (in 0-16 Minecraft coordinates).
    #[serde(default = "default_origin")]
    pub origin: [f32; 3],
    /// Axis to rotate around.
    pub axis: Axis,
    /// Rotation angle in degrees (-45 to 45, in 22.5 increments).
    pub angle: f32,
    /// Whether to rescale the element after rotation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rescale: bool,
}

fn default_origin() -> [f32; 3] {
    [8.0, 8.0, 8.0]
}

impl ElementRotation {
    /// Shift the rotation origin along with its element.
    pub fn translate(&mut self, offset: [f32; 3]) {
        for (axis, delta) in offset.iter().enumerate() {
            self.origin[axis] += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_origin() {
        let mut rotation: ElementRotation =
            serde_json::from_str(r#"{ "axis": "y", "angle": 22.5 }"#).unwrap();
        assert_eq!(rotation.origin, [8.0, 8.0, 8.0]);
        rotation.translate([1.0, 0.0, -2.0]);
        assert_eq!(rotation.origin, [9.0, 8.0, 6.0]);
        assert_eq!(rotation.axis.index(), 1);
    }
}
