//! In-memory [`GraphicsBackend`].
//!
//! Simulates object lifetimes (creation, compile/link status, deletion) and
//! records every command in submission order. The host test-suite drives the
//! whole hero through it; it is equally usable for rendering nothing at all.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::backend::{GraphicsBackend, ShaderKind};
use crate::error::HeroError;

/// One call made against the context.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateShader(u32, ShaderKind),
    ShaderSource(u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    DeleteProgram(u32),
    UseProgram(u32),
    CreateBuffer(u32),
    UploadVertices { buffer: u32, data: Vec<f32> },
    BindArrayBuffer(u32),
    DeleteBuffer(u32),
    VertexAttribPointer { location: u32, components: i32 },
    Uniform1f { name: String, value: f32 },
    Uniform2f { name: String, x: f32, y: f32 },
    Uniform1i { name: String, value: i32 },
    Uniform2fv { name: String, data: Vec<f32> },
    Viewport { width: i32, height: i32 },
    ClearColor([f32; 4]),
    DrawTriangleStrip(i32),
    SetDrawableSize { width: u32, height: u32 },
}

/// Returns diagnostic text when `source` should fail to compile.
pub type CompileRule = Rc<dyn Fn(ShaderKind, &str) -> Option<String>>;

#[derive(Debug)]
struct ShaderObject {
    compiled: Option<Result<(), String>>,
    source: String,
    kind: ShaderKind,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: Option<Result<(), String>>,
}

struct State {
    next_id: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    buffers: HashSet<u32>,
    drawable: (u32, u32),
    commands: Vec<Command>,
    compile_rule: CompileRule,
    link_failure: Option<String>,
}

impl State {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HeadlessUniform {
    pub program: u32,
    pub name: String,
}

#[derive(Clone)]
pub struct HeadlessBackend {
    state: Rc<RefCell<State>>,
}

impl HeadlessBackend {
    /// A context whose drawing buffer is `width × height` device pixels and
    /// which accepts every shader.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                next_id: 0,
                shaders: HashMap::new(),
                programs: HashMap::new(),
                buffers: HashSet::new(),
                drawable: (width, height),
                commands: Vec::new(),
                compile_rule: Rc::new(|_, _| None),
                link_failure: None,
            })),
        }
    }

    pub fn with_compile_rule<F>(self, rule: F) -> Self
    where
        F: Fn(ShaderKind, &str) -> Option<String> + 'static,
    {
        self.state.borrow_mut().compile_rule = Rc::new(rule);
        self
    }

    /// Makes every subsequent link fail with `log`, or succeed again with `None`.
    pub fn set_link_failure(&self, log: Option<&str>) {
        self.state.borrow_mut().link_failure = log.map(str::to_owned);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    pub fn draw_calls(&self) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| matches!(c, Command::DrawTriangleStrip(_)))
            .count()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    fn record(&self, command: Command) {
        self.state.borrow_mut().commands.push(command);
    }
}

impl fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HeadlessBackend")
            .field("drawable", &state.drawable)
            .field("shaders", &state.shaders.len())
            .field("programs", &state.programs.len())
            .field("commands", &state.commands.len())
            .finish()
    }
}

impl GraphicsBackend for HeadlessBackend {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type UniformLocation = HeadlessUniform;

    fn create_shader(&self, kind: ShaderKind) -> Result<u32, HeroError> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.shaders.insert(
            id,
            ShaderObject {
                compiled: None,
                source: String::new(),
                kind,
            },
        );
        state.commands.push(Command::CreateShader(id, kind));
        Ok(id)
    }

    fn shader_source(&self, shader: &u32, source: &str) {
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(shader) {
            object.source = source.to_owned();
        }
        self.record(Command::ShaderSource(*shader));
    }

    fn compile_shader(&self, shader: &u32) {
        let mut state = self.state.borrow_mut();
        let rule = Rc::clone(&state.compile_rule);
        if let Some(object) = state.shaders.get_mut(shader) {
            object.compiled = Some(match rule(object.kind, &object.source) {
                Some(log) => Err(log),
                None => Ok(()),
            });
        }
        state.commands.push(Command::CompileShader(*shader));
    }

    fn compile_status(&self, shader: &u32) -> bool {
        matches!(
            self.state.borrow().shaders.get(shader).and_then(|s| s.compiled.as_ref()),
            Some(Ok(()))
        )
    }

    fn shader_info_log(&self, shader: &u32) -> String {
        match self.state.borrow().shaders.get(shader).and_then(|s| s.compiled.clone()) {
            Some(Err(log)) => log,
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: &u32) {
        self.state.borrow_mut().shaders.remove(shader);
        self.record(Command::DeleteShader(*shader));
    }

    fn create_program(&self) -> Result<u32, HeroError> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.programs.insert(id, ProgramObject::default());
        state.commands.push(Command::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: &u32, shader: &u32) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(program) {
            object.attached.push(*shader);
        }
        self.record(Command::AttachShader {
            program: *program,
            shader: *shader,
        });
    }

    fn detach_shader(&self, program: &u32, shader: &u32) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(program) {
            object.attached.retain(|s| s != shader);
        }
        self.record(Command::DetachShader {
            program: *program,
            shader: *shader,
        });
    }

    fn link_program(&self, program: &u32) {
        let mut state = self.state.borrow_mut();
        let failure = state.link_failure.clone();
        let all_compiled = match state.programs.get(program) {
            Some(object) => object.attached.iter().all(|s| {
                matches!(
                    state.shaders.get(s).and_then(|s| s.compiled.as_ref()),
                    Some(Ok(()))
                )
            }),
            None => false,
        };
        if let Some(object) = state.programs.get_mut(program) {
            object.linked = Some(match failure {
                Some(log) => Err(log),
                None if !all_compiled => Err("attached shader is not compiled".to_owned()),
                None => Ok(()),
            });
        }
        state.commands.push(Command::LinkProgram(*program));
    }

    fn link_status(&self, program: &u32) -> bool {
        matches!(
            self.state.borrow().programs.get(program).and_then(|p| p.linked.as_ref()),
            Some(Ok(()))
        )
    }

    fn program_info_log(&self, program: &u32) -> String {
        match self.state.borrow().programs.get(program).and_then(|p| p.linked.clone()) {
            Some(Err(log)) => log,
            _ => String::new(),
        }
    }

    fn delete_status(&self, program: &u32) -> bool {
        !self.state.borrow().programs.contains_key(program)
    }

    fn delete_program(&self, program: &u32) {
        self.state.borrow_mut().programs.remove(program);
        self.record(Command::DeleteProgram(*program));
    }

    fn use_program(&self, program: &u32) {
        self.record(Command::UseProgram(*program));
    }

    fn create_buffer(&self) -> Result<u32, HeroError> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.buffers.insert(id);
        state.commands.push(Command::CreateBuffer(id));
        Ok(id)
    }

    fn upload_static_vertices(&self, buffer: &u32, data: &[f32]) {
        self.record(Command::UploadVertices {
            buffer: *buffer,
            data: data.to_vec(),
        });
    }

    fn bind_array_buffer(&self, buffer: &u32) {
        self.record(Command::BindArrayBuffer(*buffer));
    }

    fn delete_buffer(&self, buffer: &u32) {
        self.state.borrow_mut().buffers.remove(buffer);
        self.record(Command::DeleteBuffer(*buffer));
    }

    fn attrib_location(&self, program: &u32, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let linked = state.programs.get(program).is_some_and(|p| matches!(p.linked, Some(Ok(()))));
        (linked && name == "position").then_some(0)
    }

    fn float_attrib_pointer(&self, location: u32, components: i32) {
        self.record(Command::VertexAttribPointer {
            location,
            components,
        });
    }

    fn uniform_location(&self, program: &u32, name: &str) -> Option<HeadlessUniform> {
        let state = self.state.borrow();
        let linked = state.programs.get(program).is_some_and(|p| matches!(p.linked, Some(Ok(()))));
        linked.then(|| HeadlessUniform {
            program: *program,
            name: name.to_owned(),
        })
    }

    fn uniform1f(&self, location: Option<&HeadlessUniform>, value: f32) {
        if let Some(location) = location {
            self.record(Command::Uniform1f {
                name: location.name.clone(),
                value,
            });
        }
    }

    fn uniform2f(&self, location: Option<&HeadlessUniform>, x: f32, y: f32) {
        if let Some(location) = location {
            self.record(Command::Uniform2f {
                name: location.name.clone(),
                x,
                y,
            });
        }
    }

    fn uniform1i(&self, location: Option<&HeadlessUniform>, value: i32) {
        if let Some(location) = location {
            self.record(Command::Uniform1i {
                name: location.name.clone(),
                value,
            });
        }
    }

    fn uniform2fv(&self, location: Option<&HeadlessUniform>, data: &[f32]) {
        if let Some(location) = location {
            self.record(Command::Uniform2fv {
                name: location.name.clone(),
                data: data.to_vec(),
            });
        }
    }

    fn viewport(&self, width: i32, height: i32) {
        self.record(Command::Viewport { width, height });
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(Command::ClearColor([r, g, b, a]));
    }

    fn draw_triangle_strip(&self, count: i32) {
        self.record(Command::DrawTriangleStrip(count));
    }

    fn drawable_size(&self) -> (u32, u32) {
        self.state.borrow().drawable
    }

    fn set_drawable_size(&self, width: u32, height: u32) {
        self.state.borrow_mut().drawable = (width, height);
        self.record(Command::SetDrawableSize { width, height });
    }
}
