use js_sys::Float32Array;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlContextAttributes, WebGlProgram,
    WebGlShader, WebGlUniformLocation,
};

use crate::backend::{GraphicsBackend, ShaderKind};
use crate::error::HeroError;

/// [`GraphicsBackend`] over the canvas' WebGL2 context.
#[derive(Clone)]
pub struct WebGl2Backend {
    gl: GL,
    canvas: HtmlCanvasElement,
}

impl WebGl2Backend {
    /// Requests a `webgl2` context without antialiasing or an alpha channel.
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, HeroError> {
        let attributes = WebGlContextAttributes::new();
        attributes.set_antialias(false);
        attributes.set_alpha(false);

        let gl: GL = canvas
            .get_context_with_context_options("webgl2", &attributes)?
            .ok_or(HeroError::ContextUnavailable)?
            .dyn_into()
            .map_err(|_| HeroError::ContextUnavailable)?;

        Ok(Self {
            gl,
            canvas: canvas.clone(),
        })
    }
}

impl GraphicsBackend for WebGl2Backend {
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type Buffer = WebGlBuffer;
    type UniformLocation = WebGlUniformLocation;

    fn create_shader(&self, kind: ShaderKind) -> Result<WebGlShader, HeroError> {
        let kind = match kind {
            ShaderKind::Vertex => GL::VERTEX_SHADER,
            ShaderKind::Fragment => GL::FRAGMENT_SHADER,
        };
        self.gl
            .create_shader(kind)
            .ok_or(HeroError::ResourceCreation("shader"))
    }

    fn shader_source(&self, shader: &WebGlShader, source: &str) {
        self.gl.shader_source(shader, source);
    }

    fn compile_shader(&self, shader: &WebGlShader) {
        self.gl.compile_shader(shader);
    }

    fn compile_status(&self, shader: &WebGlShader) -> bool {
        self.gl
            .get_shader_parameter(shader, GL::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn shader_info_log(&self, shader: &WebGlShader) -> String {
        self.gl.get_shader_info_log(shader).unwrap_or_default()
    }

    fn delete_shader(&self, shader: &WebGlShader) {
        self.gl.delete_shader(Some(shader));
    }

    fn create_program(&self) -> Result<WebGlProgram, HeroError> {
        self.gl
            .create_program()
            .ok_or(HeroError::ResourceCreation("program"))
    }

    fn attach_shader(&self, program: &WebGlProgram, shader: &WebGlShader) {
        self.gl.attach_shader(program, shader);
    }

    fn detach_shader(&self, program: &WebGlProgram, shader: &WebGlShader) {
        self.gl.detach_shader(program, shader);
    }

    fn link_program(&self, program: &WebGlProgram) {
        self.gl.link_program(program);
    }

    fn link_status(&self, program: &WebGlProgram) -> bool {
        self.gl
            .get_program_parameter(program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn program_info_log(&self, program: &WebGlProgram) -> String {
        self.gl.get_program_info_log(program).unwrap_or_default()
    }

    fn delete_status(&self, program: &WebGlProgram) -> bool {
        // A deleted program answers `null` (and raises INVALID_VALUE), so ask
        // `isProgram` first.
        !self.gl.is_program(Some(program))
            || self
                .gl
                .get_program_parameter(program, GL::DELETE_STATUS)
                .as_bool()
                .unwrap_or(true)
    }

    fn delete_program(&self, program: &WebGlProgram) {
        self.gl.delete_program(Some(program));
    }

    fn use_program(&self, program: &WebGlProgram) {
        self.gl.use_program(Some(program));
    }

    fn create_buffer(&self) -> Result<WebGlBuffer, HeroError> {
        self.gl
            .create_buffer()
            .ok_or(HeroError::ResourceCreation("vertex buffer"))
    }

    fn upload_static_vertices(&self, buffer: &WebGlBuffer, data: &[f32]) {
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(buffer));
        let vertices = Float32Array::from(data);
        self.gl
            .buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &vertices, GL::STATIC_DRAW);
    }

    fn bind_array_buffer(&self, buffer: &WebGlBuffer) {
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(buffer));
    }

    fn delete_buffer(&self, buffer: &WebGlBuffer) {
        self.gl.delete_buffer(Some(buffer));
    }

    fn attrib_location(&self, program: &WebGlProgram, name: &str) -> Option<u32> {
        u32::try_from(self.gl.get_attrib_location(program, name)).ok()
    }

    fn float_attrib_pointer(&self, location: u32, components: i32) {
        self.gl.enable_vertex_attrib_array(location);
        self.gl
            .vertex_attrib_pointer_with_i32(location, components, GL::FLOAT, false, 0, 0);
    }

    fn uniform_location(&self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        self.gl.get_uniform_location(program, name)
    }

    fn uniform1f(&self, location: Option<&WebGlUniformLocation>, x: f32) {
        self.gl.uniform1f(location, x);
    }

    fn uniform2f(&self, location: Option<&WebGlUniformLocation>, x: f32, y: f32) {
        self.gl.uniform2f(location, x, y);
    }

    fn uniform1i(&self, location: Option<&WebGlUniformLocation>, x: i32) {
        self.gl.uniform1i(location, x);
    }

    fn uniform2fv(&self, location: Option<&WebGlUniformLocation>, data: &[f32]) {
        self.gl.uniform2fv_with_f32_array(location, data);
    }

    fn viewport(&self, width: i32, height: i32) {
        self.gl.viewport(0, 0, width, height);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(GL::COLOR_BUFFER_BIT);
    }

    fn draw_triangle_strip(&self, count: i32) {
        self.gl.draw_arrays(GL::TRIANGLE_STRIP, 0, count);
    }

    fn drawable_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_drawable_size(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }
}
