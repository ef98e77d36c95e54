//! Capability interface over an OpenGL ES 3 style context.
//!
//! [`crate::ShaderProgram`] and [`crate::FrameRenderer`] only talk to the GPU
//! through this trait. The browser build implements it on top of
//! `WebGl2RenderingContext`; [`crate::headless::HeadlessBackend`] implements it
//! in memory.

use std::fmt;

use crate::error::HeroError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Handles are cheap clones of context-owned objects. Every call takes `&self`;
/// a context is only ever touched from the single browser thread.
pub trait GraphicsBackend: Clone {
    type Shader: Clone;
    type Program: Clone + PartialEq;
    type Buffer: Clone;
    type UniformLocation: Clone;

    fn create_shader(&self, kind: ShaderKind) -> Result<Self::Shader, HeroError>;
    fn shader_source(&self, shader: &Self::Shader, source: &str);
    fn compile_shader(&self, shader: &Self::Shader);
    fn compile_status(&self, shader: &Self::Shader) -> bool;
    fn shader_info_log(&self, shader: &Self::Shader) -> String;
    fn delete_shader(&self, shader: &Self::Shader);

    fn create_program(&self) -> Result<Self::Program, HeroError>;
    fn attach_shader(&self, program: &Self::Program, shader: &Self::Shader);
    fn detach_shader(&self, program: &Self::Program, shader: &Self::Shader);
    fn link_program(&self, program: &Self::Program);
    fn link_status(&self, program: &Self::Program) -> bool;
    fn program_info_log(&self, program: &Self::Program) -> String;
    /// True once the program has been flagged for deletion (or is gone).
    fn delete_status(&self, program: &Self::Program) -> bool;
    fn delete_program(&self, program: &Self::Program);
    fn use_program(&self, program: &Self::Program);

    fn create_buffer(&self) -> Result<Self::Buffer, HeroError>;
    /// Binds `buffer` as the array buffer and uploads `data` with static usage.
    fn upload_static_vertices(&self, buffer: &Self::Buffer, data: &[f32]);
    fn bind_array_buffer(&self, buffer: &Self::Buffer);
    fn delete_buffer(&self, buffer: &Self::Buffer);

    fn attrib_location(&self, program: &Self::Program, name: &str) -> Option<u32>;
    /// Enables `location` and points it at tightly packed, unnormalised floats.
    fn float_attrib_pointer(&self, location: u32, components: i32);

    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<Self::UniformLocation>;
    fn uniform1f(&self, location: Option<&Self::UniformLocation>, x: f32);
    fn uniform2f(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32);
    fn uniform1i(&self, location: Option<&Self::UniformLocation>, x: i32);
    fn uniform2fv(&self, location: Option<&Self::UniformLocation>, data: &[f32]);

    fn viewport(&self, width: i32, height: i32);
    /// Clears the colour buffer to `(r, g, b, a)`.
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn draw_triangle_strip(&self, count: i32);

    /// Current drawing-buffer size in device pixels.
    fn drawable_size(&self) -> (u32, u32);
    fn set_drawable_size(&self, width: u32, height: u32);
}
