//! Per-frame uniform submission and the full-screen draw.

use crate::backend::GraphicsBackend;
use crate::coords::{DrawableSize, SurfacePoint};
use crate::error::HeroError;
use crate::program::ShaderProgram;
use crate::shaders::{MAX_POINTERS, QUAD_VERTEX_COUNT, QUAD_VERTICES};

struct UniformTable<L> {
    resolution: Option<L>,
    time: Option<L>,
    movement: Option<L>,
    touch: Option<L>,
    pointer_count: Option<L>,
    pointers: Option<L>,
}

impl<L> UniformTable<L> {
    fn resolve<B>(backend: &B, program: &B::Program) -> Self
    where
        B: GraphicsBackend<UniformLocation = L>,
    {
        Self {
            resolution: backend.uniform_location(program, "resolution"),
            time: backend.uniform_location(program, "time"),
            movement: backend.uniform_location(program, "move"),
            touch: backend.uniform_location(program, "touch"),
            pointer_count: backend.uniform_location(program, "pointerCount"),
            pointers: backend.uniform_location(program, "pointers"),
        }
    }
}

/// Draws the hero quad with the latest pointer-derived uniforms.
///
/// The viewport always covers `viewport_size × scale` device pixels. Setters
/// only touch local state; the context sees the values on [`Self::render`].
pub struct FrameRenderer<B: GraphicsBackend> {
    backend: B,
    viewport_size: (f64, f64),
    scale: f64,
    buffer: Option<B::Buffer>,
    bound: Option<(B::Program, UniformTable<B::UniformLocation>)>,

    time: f32,
    movement: [f32; 2],
    primary: [f32; 2],
    pointer_count: i32,
    pointers: Vec<f32>,
}

impl<B: GraphicsBackend> FrameRenderer<B> {
    /// `viewport_size` is in CSS pixels; the viewport is applied immediately.
    pub fn new(backend: B, viewport_size: (f64, f64), scale: f64) -> Self {
        let renderer = Self {
            backend,
            viewport_size,
            scale,
            buffer: None,
            bound: None,
            time: 0.0,
            movement: [0.0, 0.0],
            primary: [0.0, 0.0],
            pointer_count: 0,
            pointers: vec![0.0, 0.0],
        };
        renderer.apply_viewport();
        renderer
    }

    /// Uploads the quad (once) and binds `position` and the uniform table to
    /// `program`. Call again after the program is rebuilt.
    pub fn initialize(&mut self, program: &ShaderProgram<B>) -> Result<(), HeroError> {
        let buffer = match self.buffer.take() {
            Some(buffer) => buffer,
            None => {
                let buffer = self.backend.create_buffer()?;
                self.backend.upload_static_vertices(&buffer, &QUAD_VERTICES);
                buffer
            }
        };
        self.backend.bind_array_buffer(&buffer);
        self.buffer = Some(buffer);

        let Some(handle) = program.active() else {
            log::warn!("renderer initialised without a linked program");
            self.bound = None;
            return Ok(());
        };
        match self.backend.attrib_location(handle, "position") {
            Some(position) => self.backend.float_attrib_pointer(position, 2),
            None => log::warn!("`position` attribute not found in program"),
        }
        self.bound = Some((handle.clone(), UniformTable::resolve(&self.backend, handle)));
        Ok(())
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.time = seconds;
    }

    pub fn set_movement(&mut self, movement: [f64; 2]) {
        self.movement = [movement[0] as f32, movement[1] as f32];
    }

    pub fn set_primary_pointer(&mut self, point: SurfacePoint) {
        self.primary = point.to_array();
    }

    pub fn set_pointer_count(&mut self, count: usize) {
        self.pointer_count = count.min(MAX_POINTERS) as i32;
    }

    /// Flat `[x0, y0, x1, y1, ..]` list; anything past `MAX_POINTERS` pairs is dropped.
    pub fn set_pointer_list(&mut self, mut coords: Vec<f32>) {
        coords.truncate(MAX_POINTERS * 2);
        self.pointers = coords;
    }

    /// Draws one frame. Does nothing unless `program` is linked, alive, and the
    /// one this renderer was initialised against.
    pub fn render(&mut self, program: &ShaderProgram<B>, timestamp_ms: f64) {
        let Some(handle) = program.active() else {
            return;
        };
        self.set_time((timestamp_ms / 1000.0) as f32);
        let (Some(buffer), Some((bound, uniforms))) = (&self.buffer, &self.bound) else {
            return;
        };
        if bound != handle {
            log::debug!("program changed since initialisation; skipping frame");
            return;
        }

        let gl = &self.backend;
        gl.clear_color(0.0, 0.0, 0.0, 1.0);
        gl.use_program(handle);
        gl.bind_array_buffer(buffer);

        let (width, height) = gl.drawable_size();
        gl.uniform2f(uniforms.resolution.as_ref(), width as f32, height as f32);
        gl.uniform1f(uniforms.time.as_ref(), self.time);
        gl.uniform2f(uniforms.movement.as_ref(), self.movement[0], self.movement[1]);
        gl.uniform2f(uniforms.touch.as_ref(), self.primary[0], self.primary[1]);
        gl.uniform1i(uniforms.pointer_count.as_ref(), self.pointer_count);
        if !self.pointers.is_empty() {
            gl.uniform2fv(uniforms.pointers.as_ref(), &self.pointers);
        }

        gl.draw_triangle_strip(QUAD_VERTEX_COUNT);
    }

    /// Stores the new scale and re-derives the viewport. The drawing buffer
    /// itself is resized by the controller.
    pub fn update_scale(&mut self, scale: f64) {
        self.scale = scale;
        self.apply_viewport();
    }

    /// New CSS-pixel size of the area being covered; takes effect on the next
    /// [`Self::update_scale`].
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = (width, height);
    }

    pub fn viewport(&self) -> DrawableSize {
        DrawableSize::from_viewport(self.viewport_size.0, self.viewport_size.1, self.scale)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    fn apply_viewport(&self) {
        let size = self.viewport();
        self.backend.viewport(size.width as i32, size.height as i32);
    }

    /// Deletes the vertex buffer. The program belongs to [`ShaderProgram`].
    pub fn release(&mut self) {
        self.bound = None;
        if let Some(buffer) = self.buffer.take() {
            self.backend.delete_buffer(&buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Command, HeadlessBackend};
    use crate::shaders::DEFAULT_FRAGMENT_SOURCE;

    fn setup() -> (HeadlessBackend, ShaderProgram<HeadlessBackend>, FrameRenderer<HeadlessBackend>) {
        let backend = HeadlessBackend::new(800, 600);
        let mut program = ShaderProgram::new(backend.clone(), DEFAULT_FRAGMENT_SOURCE);
        program.build().unwrap();
        let mut renderer = FrameRenderer::new(backend.clone(), (800.0, 600.0), 1.0);
        renderer.initialize(&program).unwrap();
        backend.clear_commands();
        (backend, program, renderer)
    }

    #[test]
    fn initialize_uploads_quad_and_binds_position() {
        let backend = HeadlessBackend::new(800, 600);
        let mut program = ShaderProgram::new(backend.clone(), DEFAULT_FRAGMENT_SOURCE);
        program.build().unwrap();
        let mut renderer = FrameRenderer::new(backend.clone(), (800.0, 600.0), 1.0);
        renderer.initialize(&program).unwrap();

        let commands = backend.commands();
        assert!(commands.contains(&Command::UploadVertices {
            buffer: 4,
            data: QUAD_VERTICES.to_vec()
        }));
        assert!(commands.contains(&Command::VertexAttribPointer {
            location: 0,
            components: 2
        }));
        assert_eq!(backend.live_buffers(), 1);
    }

    #[test]
    fn render_submits_uniforms_then_draws() {
        let (backend, program, mut renderer) = setup();
        renderer.set_movement([5.0, -3.0]);
        renderer.set_primary_pointer(SurfacePoint::new(100.0, 400.0));
        renderer.set_pointer_count(1);
        renderer.set_pointer_list(vec![100.0, 400.0]);
        renderer.render(&program, 2500.0);

        let commands = backend.commands();
        assert_eq!(commands.first(), Some(&Command::ClearColor([0.0, 0.0, 0.0, 1.0])));
        assert!(commands.contains(&Command::Uniform2f { name: "resolution".into(), x: 800.0, y: 600.0 }));
        assert!(commands.contains(&Command::Uniform1f { name: "time".into(), value: 2.5 }));
        assert_eq!(renderer.time(), 2.5);
        assert!(commands.contains(&Command::Uniform2f { name: "move".into(), x: 5.0, y: -3.0 }));
        assert!(commands.contains(&Command::Uniform2f { name: "touch".into(), x: 100.0, y: 400.0 }));
        assert!(commands.contains(&Command::Uniform1i { name: "pointerCount".into(), value: 1 }));
        assert!(commands.contains(&Command::Uniform2fv { name: "pointers".into(), data: vec![100.0, 400.0] }));
        assert_eq!(commands.last(), Some(&Command::DrawTriangleStrip(4)));
    }

    #[test]
    fn empty_pointer_list_is_not_uploaded() {
        let (backend, program, mut renderer) = setup();
        renderer.set_pointer_list(Vec::new());
        renderer.render(&program, 0.0);

        assert!(!backend
            .commands()
            .iter()
            .any(|c| matches!(c, Command::Uniform2fv { .. })));
        assert_eq!(backend.draw_calls(), 1);
    }

    #[test]
    fn pointers_are_clamped_to_shader_capacity() {
        let (backend, program, mut renderer) = setup();
        renderer.set_pointer_count(14);
        renderer.set_pointer_list((0..28).map(|i| i as f32).collect());
        renderer.render(&program, 0.0);

        let commands = backend.commands();
        assert!(commands.contains(&Command::Uniform1i { name: "pointerCount".into(), value: 10 }));
        let uploaded = commands.iter().find_map(|c| match c {
            Command::Uniform2fv { data, .. } => Some(data.len()),
            _ => None,
        });
        assert_eq!(uploaded, Some(20));
    }

    #[test]
    fn render_after_reset_is_a_no_op() {
        let (backend, mut program, mut renderer) = setup();
        program.reset();
        backend.clear_commands();

        renderer.render(&program, 16.0);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn render_skips_a_program_it_was_not_bound_to() {
        let (backend, mut program, mut renderer) = setup();
        program.build().unwrap();
        backend.clear_commands();
        renderer.render(&program, 16.0);
        assert_eq!(backend.draw_calls(), 0);

        renderer.initialize(&program).unwrap();
        renderer.render(&program, 16.0);
        assert_eq!(backend.draw_calls(), 1);
        assert_eq!(backend.live_buffers(), 1);
    }

    #[test]
    fn update_scale_resizes_viewport() {
        let (backend, _program, mut renderer) = setup();
        renderer.update_scale(1.5);
        assert_eq!(renderer.viewport(), DrawableSize::new(1200, 900));
        assert_eq!(backend.commands(), vec![Command::Viewport { width: 1200, height: 900 }]);
        assert_eq!(backend.drawable_size(), (800, 600));
    }
}
