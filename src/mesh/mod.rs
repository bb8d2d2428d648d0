//! Mesh model files and variant generation.

mod model;

pub use model::{MeshElement, MeshFace, MeshModel};
