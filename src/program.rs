use crate::backend::{GraphicsBackend, ShaderKind};
use crate::error::HeroError;
use crate::shaders::VERTEX_SOURCE;

/// Owns one linked vertex + fragment program on a context.
///
/// The program stays usable until [`ShaderProgram::reset`] releases it; after
/// that it can be rebuilt, possibly from a new fragment source.
pub struct ShaderProgram<B: GraphicsBackend> {
    backend: B,
    fragment_source: String,
    vertex: Option<B::Shader>,
    fragment: Option<B::Shader>,
    program: Option<B::Program>,
    linked: bool,
}

impl<B: GraphicsBackend> ShaderProgram<B> {
    /// An empty program; nothing is created on the context until [`Self::build`].
    pub fn new(backend: B, fragment_source: impl Into<String>) -> Self {
        Self {
            backend,
            fragment_source: fragment_source.into(),
            vertex: None,
            fragment: None,
            program: None,
            linked: false,
        }
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Replaces the source used by the next [`Self::build`]. Live state is untouched.
    pub fn set_fragment_source(&mut self, source: impl Into<String>) {
        self.fragment_source = source.into();
    }

    /// Compiles both stages and links them.
    ///
    /// Compile failures abort before linking and leave nothing allocated. A
    /// link failure keeps the objects around for [`Self::reset`] to release.
    pub fn build(&mut self) -> Result<(), HeroError> {
        let vertex = self.compile_source(ShaderKind::Vertex, VERTEX_SOURCE)?;
        let fragment = match self.compile_source(ShaderKind::Fragment, &self.fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                self.backend.delete_shader(&vertex);
                return Err(err);
            }
        };
        self.link_program(vertex, fragment)
    }

    /// Creates and compiles a shader object. On failure the object is deleted
    /// and the compiler log is returned.
    pub fn compile_source(&self, kind: ShaderKind, source: &str) -> Result<B::Shader, HeroError> {
        let shader = self.backend.create_shader(kind)?;
        self.backend.shader_source(&shader, source);
        self.backend.compile_shader(&shader);

        if self.backend.compile_status(&shader) {
            return Ok(shader);
        }
        let log = self.backend.shader_info_log(&shader);
        log::error!("{kind} shader compilation error: {log}");
        self.backend.delete_shader(&shader);
        Err(HeroError::Compile { kind, log })
    }

    /// Attaches both stages to a fresh program and links it. Ownership of the
    /// shader objects moves into `self` either way.
    pub fn link_program(&mut self, vertex: B::Shader, fragment: B::Shader) -> Result<(), HeroError> {
        self.reset();

        let program = match self.backend.create_program() {
            Ok(program) => program,
            Err(err) => {
                self.backend.delete_shader(&vertex);
                self.backend.delete_shader(&fragment);
                return Err(err);
            }
        };
        self.backend.attach_shader(&program, &vertex);
        self.backend.attach_shader(&program, &fragment);
        self.backend.link_program(&program);

        self.linked = self.backend.link_status(&program);
        self.vertex = Some(vertex);
        self.fragment = Some(fragment);

        let result = if self.linked {
            Ok(())
        } else {
            let log = self.backend.program_info_log(&program);
            log::error!("program link error: {log}");
            Err(HeroError::Link(log))
        };
        self.program = Some(program);
        result
    }

    /// Compiles `candidate` as a throwaway fragment shader. Returns the
    /// diagnostic text if it does not compile; live state is never touched.
    pub fn validate(&self, candidate: &str) -> Option<String> {
        let shader = match self.backend.create_shader(ShaderKind::Fragment) {
            Ok(shader) => shader,
            Err(err) => return Some(err.to_string()),
        };
        self.backend.shader_source(&shader, candidate);
        self.backend.compile_shader(&shader);

        let result = if self.backend.compile_status(&shader) {
            None
        } else {
            Some(self.backend.shader_info_log(&shader))
        };
        self.backend.delete_shader(&shader);
        result
    }

    /// The program handle if it linked and has not been deleted since.
    pub fn active(&self) -> Option<&B::Program> {
        self.program
            .as_ref()
            .filter(|program| self.linked && !self.backend.delete_status(program))
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    /// Releases the fragment shader, the vertex shader, then the program.
    /// Safe to call repeatedly or before anything was built.
    pub fn reset(&mut self) {
        let vertex = self.vertex.take();
        let fragment = self.fragment.take();
        self.linked = false;

        let Some(program) = self.program.take() else {
            return;
        };
        if self.backend.delete_status(&program) {
            return;
        }
        if let Some(fragment) = fragment {
            self.backend.detach_shader(&program, &fragment);
            self.backend.delete_shader(&fragment);
        }
        if let Some(vertex) = vertex {
            self.backend.detach_shader(&program, &vertex);
            self.backend.delete_shader(&vertex);
        }
        self.backend.delete_program(&program);
        log::debug!("shader program released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Command, HeadlessBackend};
    use crate::shaders::DEFAULT_FRAGMENT_SOURCE;

    fn rejecting(marker: &'static str) -> HeadlessBackend {
        HeadlessBackend::new(800, 600).with_compile_rule(move |_, source| {
            source.contains(marker).then(|| format!("ERROR: 0:1: '{marker}' : syntax error"))
        })
    }

    #[test]
    fn build_links_default_shader() {
        let backend = HeadlessBackend::new(800, 600);
        let mut program = ShaderProgram::new(backend.clone(), DEFAULT_FRAGMENT_SOURCE);
        assert!(!program.is_active());

        program.build().unwrap();
        assert!(program.is_active());
        assert_eq!(backend.live_shaders(), 2);
        assert_eq!(backend.live_programs(), 1);
    }

    #[test]
    fn compile_failure_aborts_without_leaking() {
        let backend = rejecting("oops");
        let mut program = ShaderProgram::new(backend.clone(), "oops");

        let err = program.build().unwrap_err();
        assert!(matches!(err, HeroError::Compile { kind: ShaderKind::Fragment, .. }));
        assert!(!program.is_active());
        assert_eq!(backend.live_shaders(), 0);
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn link_failure_keeps_objects_until_reset() {
        let backend = HeadlessBackend::new(800, 600);
        backend.set_link_failure(Some("too many uniforms"));
        let mut program = ShaderProgram::new(backend.clone(), DEFAULT_FRAGMENT_SOURCE);

        assert_eq!(program.build(), Err(HeroError::Link("too many uniforms".into())));
        assert!(!program.is_active());
        assert_eq!(backend.live_programs(), 1);

        program.reset();
        assert_eq!(backend.live_shaders(), 0);
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn reset_releases_fragment_then_vertex_then_program() {
        let backend = HeadlessBackend::new(800, 600);
        let mut program = ShaderProgram::new(backend.clone(), DEFAULT_FRAGMENT_SOURCE);
        program.build().unwrap();
        backend.clear_commands();

        program.reset();
        let (vs, fs, p) = (1, 2, 3);
        assert_eq!(
            backend.commands(),
            vec![
                Command::DetachShader { program: p, shader: fs },
                Command::DeleteShader(fs),
                Command::DetachShader { program: p, shader: vs },
                Command::DeleteShader(vs),
                Command::DeleteProgram(p),
            ]
        );
    }

    #[test]
    fn reset_is_idempotent() {
        let backend = HeadlessBackend::new(800, 600);
        let mut program = ShaderProgram::new(backend.clone(), DEFAULT_FRAGMENT_SOURCE);
        program.reset();
        assert!(backend.commands().is_empty());

        program.build().unwrap();
        program.reset();
        backend.clear_commands();
        program.reset();
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn validate_uses_a_throwaway_shader() {
        let backend = rejecting("bad");
        let mut program = ShaderProgram::new(backend.clone(), DEFAULT_FRAGMENT_SOURCE);
        program.build().unwrap();

        assert_eq!(program.validate(DEFAULT_FRAGMENT_SOURCE), None);
        let log = program.validate("bad").unwrap();
        assert!(log.contains("syntax error"));
        assert!(program.is_active());
        assert_eq!(backend.live_shaders(), 2);
    }

    #[test]
    fn rebuild_from_new_source() {
        let backend = HeadlessBackend::new(800, 600);
        let mut program = ShaderProgram::new(backend.clone(), DEFAULT_FRAGMENT_SOURCE);
        program.build().unwrap();

        program.set_fragment_source("void main(){}");
        program.build().unwrap();
        assert_eq!(program.fragment_source(), "void main(){}");
        assert_eq!(backend.live_shaders(), 2);
        assert_eq!(backend.live_programs(), 1);
    }
}
