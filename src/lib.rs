//! Full-screen WebGL2 shader background for a portfolio hero section.
//!
//! Pointer, touch and pen contacts are tracked in surface space and fed to a
//! fragment shader every animation frame. The platform-independent pieces
//! (tracker, program, renderer, controller) run against any
//! [`GraphicsBackend`]; the browser glue is only compiled for wasm32.

pub mod backend;
pub mod config;
pub mod controller;
pub mod coords;
pub mod error;
pub mod headless;
pub mod pointer;
pub mod program;
pub mod renderer;
pub mod shaders;

pub use backend::{GraphicsBackend, ShaderKind};
pub use config::HeroConfig;
pub use controller::{HeroController, HeroState};
pub use coords::{DrawableSize, PagePoint, Projection, SurfacePoint};
pub use error::HeroError;
pub use pointer::{ContactId, PointerInput, PointerTracker};
pub use program::ShaderProgram;
pub use renderer::FrameRenderer;

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;

    mod gl;
    mod render;

    pub use gl::WebGl2Backend;
    use render::Hero;

    use crate::{HeroConfig, HeroError};

    thread_local! {
        static DEFAULT_HERO: RefCell<Option<WebGlHero>> = const { RefCell::new(None) };
    }

    fn init_logging(level: log::Level) {
        console_error_panic_hook::set_once();
        // Already installed when a second hero is created.
        console_log::init_with_level(level).ok();
    }

    /// Mounts the default hero on `#home` as soon as the module loads.
    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        let config = HeroConfig::default();
        init_logging(config.log_level);

        match Hero::mount(config) {
            Ok(hero) => DEFAULT_HERO.with(|slot| {
                *slot.borrow_mut() = Some(WebGlHero { inner: Some(hero) });
            }),
            Err(err) => log::error!("{err}"),
        }
        Ok(())
    }

    /// Tears down the hero mounted by `main`.
    #[wasm_bindgen(js_name = destroyHero)]
    pub fn destroy_hero() {
        let hero = DEFAULT_HERO.with(|slot| slot.borrow_mut().take());
        drop(hero);
    }

    #[wasm_bindgen]
    pub struct WebGlHero {
        inner: Option<Hero>,
    }

    #[wasm_bindgen]
    impl WebGlHero {
        #[wasm_bindgen(constructor)]
        pub fn new(section_selector: Option<String>, fragment_source: Option<String>) -> Result<WebGlHero, JsValue> {
            let mut config = HeroConfig::default();
            if let Some(selector) = section_selector {
                config = config.with_section_selector(selector);
            }
            if let Some(source) = fragment_source {
                config = config.with_fragment_source(source);
            }
            init_logging(config.log_level);

            let hero = Hero::mount(config).map_err(|err| {
                log::error!("{err}");
                err
            })?;
            Ok(WebGlHero { inner: Some(hero) })
        }

        /// Compiler diagnostics for `source`, or `undefined` if it compiles.
        pub fn validate(&self, source: &str) -> Option<String> {
            self.inner.as_ref()?.validate(source)
        }

        #[wasm_bindgen(js_name = setFragmentSource)]
        pub fn set_fragment_source(&self, source: &str) -> Result<(), JsValue> {
            let hero = self.inner.as_ref().ok_or(HeroError::Destroyed)?;
            hero.replace_fragment_source(source)?;
            Ok(())
        }

        #[wasm_bindgen(getter)]
        pub fn running(&self) -> bool {
            self.inner.as_ref().is_some_and(Hero::is_running)
        }

        pub fn destroy(&mut self) {
            if let Some(mut hero) = self.inner.take() {
                hero.destroy();
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{destroy_hero, WebGl2Backend, WebGlHero};
