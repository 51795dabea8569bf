//! Minimal vector helpers for scripted logic.

pub use glam::{IVec3, Vec3};

/// Build a vector from its components.
pub fn vec_new(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Component-wise sum of two vectors.
pub fn vec_add(a: Vec3, b: Vec3) -> Vec3 {
    a + b
}

/// Format a vector the way scripts print positions: `[x, y, z]`.
pub fn format_vec(v: Vec3) -> String {
    format!("[{}, {}, {}]", v.x, v.y, v.z)
}

/// The block containing a point, flooring each component.
pub fn block_pos(v: Vec3) -> IVec3 {
    v.floor().as_ivec3()
}
