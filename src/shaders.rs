//! GLSL ES 3.00 sources and the full-screen quad they draw.

/// Passthrough vertex stage; `position` is fed straight from [`QUAD_VERTICES`].
pub const VERTEX_SOURCE: &str = include_str!("shaders/quad.vert");

/// Cloud/fbm hero background. Declares the full uniform contract:
/// `resolution`, `time`, `move`, `touch`, `pointerCount`, `pointers[MAX_POINTERS]`.
pub const DEFAULT_FRAGMENT_SOURCE: &str = include_str!("shaders/hero.frag");

/// Capacity of the `pointers` uniform array in [`DEFAULT_FRAGMENT_SOURCE`].
pub const MAX_POINTERS: usize = 10;

/// Clip-space quad as a triangle strip, two floats per vertex.
pub const QUAD_VERTICES: [f32; 8] = [-1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0, -1.0];

pub const QUAD_VERTEX_COUNT: i32 = 4;
