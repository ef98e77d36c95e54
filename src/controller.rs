//! Lifecycle of one hero: owns the program, renderer and pointer tracker and
//! moves pointer state into uniforms once per frame.
//!
//! Scheduling lives with the host: the browser glue calls [`HeroController::tick`]
//! from `requestAnimationFrame` and stops rescheduling as soon as it returns
//! `false`.

use crate::backend::{GraphicsBackend, ShaderKind};
use crate::config::HeroConfig;
use crate::coords::DrawableSize;
use crate::error::HeroError;
use crate::pointer::{PointerInput, PointerTracker};
use crate::program::ShaderProgram;
use crate::renderer::FrameRenderer;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeroState {
    Uninitialized,
    Running,
    Destroyed,
}

pub struct HeroController<B: GraphicsBackend> {
    config: HeroConfig,
    state: HeroState,
    backend: Option<B>,
    program: Option<ShaderProgram<B>>,
    renderer: Option<FrameRenderer<B>>,
    pointers: Option<PointerTracker>,
}

impl<B: GraphicsBackend> HeroController<B> {
    pub fn new(config: HeroConfig) -> Self {
        Self {
            config,
            state: HeroState::Uninitialized,
            backend: None,
            program: None,
            renderer: None,
            pointers: None,
        }
    }

    /// Sizes the drawing buffer for `viewport` (CSS px) at the configured
    /// density and wires program, renderer and tracker together.
    ///
    /// Shader compile/link problems are logged and leave the hero drawing
    /// nothing; only a context that cannot allocate a buffer is fatal.
    pub fn initialize(&mut self, backend: B, viewport: (f64, f64), device_pixel_ratio: f64) -> Result<(), HeroError> {
        match self.state {
            HeroState::Uninitialized => {}
            HeroState::Running => return Ok(()),
            HeroState::Destroyed => return Err(HeroError::Destroyed),
        }

        let scale = self.config.scale_for(device_pixel_ratio);
        let size = DrawableSize::from_viewport(viewport.0, viewport.1, scale);
        backend.set_drawable_size(size.width, size.height);

        let mut program = ShaderProgram::new(backend.clone(), self.config.fragment_source.clone());
        if let Err(err) = program.build() {
            log::error!("hero shader unavailable: {err}");
        }

        let mut renderer = FrameRenderer::new(backend.clone(), viewport, scale);
        if let Err(err) = renderer.initialize(&program) {
            program.reset();
            return Err(err);
        }

        if self.config.validate_on_start {
            if let Some(diagnostic) = program.validate(program.fragment_source()) {
                log::error!("fragment shader failed validation: {diagnostic}");
            }
        }

        self.pointers = Some(PointerTracker::new(scale, size.height as f64));
        self.program = Some(program);
        self.renderer = Some(renderer);
        self.backend = Some(backend);
        self.state = HeroState::Running;
        log::info!("hero running at {}x{} (scale {scale})", size.width, size.height);
        Ok(())
    }

    /// One animation frame. Returns `false` once the hero has been torn down,
    /// which tells the caller not to schedule another frame.
    pub fn tick(&mut self, timestamp_ms: f64) -> bool {
        if self.state != HeroState::Running {
            return false;
        }
        let (Some(program), Some(renderer), Some(pointers)) =
            (&self.program, &mut self.renderer, &self.pointers)
        else {
            return false;
        };

        renderer.set_primary_pointer(pointers.primary_coordinate());
        renderer.set_pointer_count(pointers.contact_count());
        renderer.set_pointer_list(pointers.projected_coordinates());
        renderer.set_movement(pointers.cumulative_movement());
        renderer.render(program, timestamp_ms);
        true
    }

    pub fn handle_pointer(&mut self, input: PointerInput) {
        if let Some(pointers) = self.pointers.as_mut() {
            pointers.apply(input);
        }
    }

    /// Re-derives the scale, resizes the drawing buffer, and hands the new
    /// values to renderer and tracker before the next frame reads them.
    pub fn resize(&mut self, viewport: (f64, f64), device_pixel_ratio: f64) {
        if self.state != HeroState::Running {
            return;
        }
        let scale = self.config.scale_for(device_pixel_ratio);
        let size = DrawableSize::from_viewport(viewport.0, viewport.1, scale);

        if let Some(backend) = &self.backend {
            backend.set_drawable_size(size.width, size.height);
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_viewport_size(viewport.0, viewport.1);
            renderer.update_scale(scale);
        }
        if let Some(pointers) = self.pointers.as_mut() {
            pointers.update_scale(scale);
            pointers.update_surface_height(size.height as f64);
        }
        log::debug!("resized to {}x{} (scale {scale})", size.width, size.height);
    }

    /// Compiles `candidate` without touching the running program.
    pub fn validate(&self, candidate: &str) -> Option<String> {
        self.program.as_ref()?.validate(candidate)
    }

    /// Swaps the fragment shader. A candidate that fails validation is
    /// rejected and the current program keeps running.
    pub fn replace_fragment_source(&mut self, source: &str) -> Result<(), HeroError> {
        let (Some(program), Some(renderer)) = (self.program.as_mut(), self.renderer.as_mut()) else {
            return Err(HeroError::Destroyed);
        };
        if let Some(log) = program.validate(source) {
            log::warn!("rejected fragment shader edit: {log}");
            return Err(HeroError::Compile {
                kind: ShaderKind::Fragment,
                log,
            });
        }

        program.set_fragment_source(source);
        program.build()?;
        renderer.initialize(program)?;
        self.config.fragment_source = source.to_owned();
        log::info!("fragment shader replaced");
        Ok(())
    }

    /// Releases every context resource and drops all references. Later calls
    /// do nothing.
    pub fn destroy(&mut self) {
        if self.state == HeroState::Destroyed {
            return;
        }
        if let Some(mut program) = self.program.take() {
            program.reset();
        }
        if let Some(mut renderer) = self.renderer.take() {
            renderer.release();
        }
        self.pointers = None;
        self.backend = None;
        self.state = HeroState::Destroyed;
        log::info!("hero destroyed");
    }

    pub fn state(&self) -> HeroState {
        self.state
    }

    pub fn config(&self) -> &HeroConfig {
        &self.config
    }

    pub fn pointers(&self) -> Option<&PointerTracker> {
        self.pointers.as_ref()
    }

    pub fn renderer(&self) -> Option<&FrameRenderer<B>> {
        self.renderer.as_ref()
    }

    pub fn program(&self) -> Option<&ShaderProgram<B>> {
        self.program.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{PagePoint, SurfacePoint};
    use crate::headless::{Command, HeadlessBackend};

    fn running() -> (HeadlessBackend, HeroController<HeadlessBackend>) {
        let backend = HeadlessBackend::new(0, 0);
        let mut hero = HeroController::new(HeroConfig::default());
        hero.initialize(backend.clone(), (800.0, 600.0), 1.0).unwrap();
        (backend, hero)
    }

    #[test]
    fn initialize_sizes_surface_at_half_density() {
        let backend = HeadlessBackend::new(0, 0);
        let mut hero = HeroController::new(HeroConfig::default());
        hero.initialize(backend.clone(), (1000.0, 500.0), 4.0).unwrap();

        assert_eq!(hero.state(), HeroState::Running);
        assert_eq!(backend.drawable_size(), (2000, 1000));
        assert_eq!(hero.renderer().map(|r| r.viewport()), Some(DrawableSize::new(2000, 1000)));
        assert_eq!(hero.pointers().map(|p| p.scale()), Some(2.0));
    }

    #[test]
    fn preflight_compile_can_be_turned_off() {
        let created_shaders = |validate: bool| {
            let backend = HeadlessBackend::new(0, 0);
            let mut hero = HeroController::new(HeroConfig::default().with_validate_on_start(validate));
            hero.initialize(backend.clone(), (800.0, 600.0), 1.0).unwrap();
            backend
                .commands()
                .iter()
                .filter(|c| matches!(c, Command::CreateShader(..)))
                .count()
        };

        assert_eq!(created_shaders(true), 3);
        assert_eq!(created_shaders(false), 2);
    }

    #[test]
    fn tick_feeds_tracker_into_uniforms() {
        let (backend, mut hero) = running();
        hero.handle_pointer(PointerInput::Start { id: 1, page: PagePoint::new(100.0, 200.0) });
        backend.clear_commands();

        assert!(hero.tick(1000.0));
        let commands = backend.commands();
        assert!(commands.contains(&Command::Uniform2f { name: "touch".into(), x: 100.0, y: 400.0 }));
        assert!(commands.contains(&Command::Uniform1i { name: "pointerCount".into(), value: 1 }));
        assert_eq!(backend.draw_calls(), 1);
    }

    #[test]
    fn broken_shader_is_not_fatal() {
        let backend = HeadlessBackend::new(0, 0)
            .with_compile_rule(|kind, _| (kind == ShaderKind::Fragment).then(|| "nope".to_owned()));
        let mut hero = HeroController::new(HeroConfig::default());
        hero.initialize(backend.clone(), (800.0, 600.0), 1.0).unwrap();

        assert!(hero.tick(16.0));
        assert_eq!(backend.draw_calls(), 0);
    }

    #[test]
    fn resize_propagates_scale_everywhere() {
        let (backend, mut hero) = running();
        hero.handle_pointer(PointerInput::Start { id: 1, page: PagePoint::new(10.0, 10.0) });
        hero.resize((400.0, 300.0), 3.0);

        assert_eq!(backend.drawable_size(), (600, 450));
        assert_eq!(hero.renderer().map(|r| r.viewport()), Some(DrawableSize::new(600, 450)));
        let pointers = hero.pointers().unwrap();
        assert_eq!(pointers.coordinate(1), Some(SurfacePoint::new(10.0, 590.0)));
        assert_eq!(pointers.project(PagePoint::new(10.0, 10.0)), SurfacePoint::new(15.0, 435.0));
    }

    #[test]
    fn replace_fragment_source_rejects_bad_edits() {
        let backend = HeadlessBackend::new(0, 0)
            .with_compile_rule(|_, source| source.contains("broken").then(|| "syntax error".to_owned()));
        let mut hero = HeroController::new(HeroConfig::default());
        hero.initialize(backend.clone(), (800.0, 600.0), 1.0).unwrap();

        let err = hero.replace_fragment_source("broken").unwrap_err();
        assert!(matches!(err, HeroError::Compile { .. }));
        assert!(hero.program().is_some_and(|p| p.is_active()));

        hero.replace_fragment_source("void main(){}").unwrap();
        assert_eq!(hero.config().fragment_source, "void main(){}");
        backend.clear_commands();
        assert!(hero.tick(0.0));
        assert_eq!(backend.draw_calls(), 1);
        assert_eq!(backend.live_programs(), 1);
    }

    #[test]
    fn destroy_releases_everything_once() {
        let (backend, mut hero) = running();
        hero.destroy();
        assert_eq!(hero.state(), HeroState::Destroyed);
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_shaders(), 0);
        assert_eq!(backend.live_buffers(), 0);

        backend.clear_commands();
        hero.destroy();
        assert!(!hero.tick(32.0));
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn cannot_restart_after_destroy() {
        let (backend, mut hero) = running();
        hero.destroy();
        assert_eq!(hero.initialize(backend, (800.0, 600.0), 1.0), Err(HeroError::Destroyed));
    }
}
