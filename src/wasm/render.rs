use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, AddEventListenerOptions, Document, Event, EventTarget, HtmlCanvasElement, MouseEvent,
    PointerEvent, Window,
};

use super::gl::WebGl2Backend;
use crate::config::HeroConfig;
use crate::coords::PagePoint;
use crate::error::HeroError;
use crate::pointer::PointerInput;
use crate::{HeroController, HeroState};

type Controller = Rc<RefCell<HeroController<WebGl2Backend>>>;

/// Marks a canvas that a hero is currently drawing into.
const OWNER_ATTRIBUTE: &str = "data-shader-hero";

/// A running hero bound to one canvas. Dropping it tears everything down.
pub struct Hero {
    controller: Controller,
    canvas: HtmlCanvasElement,
    frames: Rc<FrameLoop>,
    listeners: Vec<Listener>,
}

impl Hero {
    /// Finds (or creates) the canvas, brings the controller up, then starts
    /// listening and schedules the first frame.
    pub fn mount(config: HeroConfig) -> Result<Self, HeroError> {
        let window = window().ok_or_else(|| HeroError::MissingElement("window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| HeroError::MissingElement("document".into()))?;

        let canvas = locate_canvas(&document, &config)?;
        let backend = WebGl2Backend::new(&canvas)?;
        let (viewport, ratio) = viewport_metrics(&window)?;

        let controller = Rc::new(RefCell::new(HeroController::new(config)));
        controller.borrow_mut().initialize(backend, viewport, ratio)?;

        // From here on `Drop` cleans up whatever was set up before a failure.
        let mut hero = Self {
            controller,
            canvas,
            frames: FrameLoop::new(),
            listeners: Vec::new(),
        };
        hero.canvas.set_attribute(OWNER_ATTRIBUTE, "running")?;
        hero.listen(&window)?;
        FrameLoop::start(&hero.frames, Rc::clone(&hero.controller))?;
        Ok(hero)
    }

    fn listen(&mut self, window: &Window) -> Result<(), HeroError> {
        let resize = {
            let controller = Rc::clone(&self.controller);
            let window = window.clone();
            Closure::wrap(Box::new(move |_: Event| match viewport_metrics(&window) {
                Ok((viewport, ratio)) => controller.borrow_mut().resize(viewport, ratio),
                Err(err) => log::warn!("resize ignored: {err}"),
            }) as Box<dyn FnMut(Event)>)
        };
        self.listeners.push(Listener::attach(window, "resize", resize, true)?);

        let canvas: &EventTarget = &self.canvas;
        let pointer_events: [(&'static str, fn(&PointerEvent) -> PointerInput); 5] = [
            ("pointerdown", |e| PointerInput::Start {
                id: e.pointer_id(),
                page: page_point(e),
            }),
            ("pointermove", |e| PointerInput::Move {
                id: e.pointer_id(),
                page: page_point(e),
                movement: (e.movement_x() as f64, e.movement_y() as f64),
            }),
            ("pointerup", |e| PointerInput::End { id: e.pointer_id() }),
            ("pointerleave", |e| PointerInput::Leave { id: e.pointer_id() }),
            ("pointercancel", |e| PointerInput::Leave { id: e.pointer_id() }),
        ];
        for (kind, to_input) in pointer_events {
            let controller = Rc::clone(&self.controller);
            let callback = Closure::wrap(Box::new(move |event: Event| {
                if let Some(event) = event.dyn_ref::<PointerEvent>() {
                    controller.borrow_mut().handle_pointer(to_input(event));
                }
            }) as Box<dyn FnMut(Event)>);
            self.listeners.push(Listener::attach(canvas, kind, callback, false)?);
        }

        let controller = Rc::clone(&self.controller);
        let legacy = Closure::wrap(Box::new(move |event: Event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                let page = PagePoint::new(event.client_x() as f64, event.client_y() as f64);
                controller
                    .borrow_mut()
                    .handle_pointer(PointerInput::LegacyMove { page });
            }
        }) as Box<dyn FnMut(Event)>);
        self.listeners.push(Listener::attach(canvas, "mousemove", legacy, false)?);
        Ok(())
    }

    pub fn validate(&self, source: &str) -> Option<String> {
        self.controller.borrow().validate(source)
    }

    pub fn replace_fragment_source(&self, source: &str) -> Result<(), HeroError> {
        self.controller.borrow_mut().replace_fragment_source(source)
    }

    pub fn is_running(&self) -> bool {
        self.controller.borrow().state() == HeroState::Running
    }

    /// Cancels the pending frame and every listener, then releases the
    /// context resources. Repeat calls do nothing.
    pub fn destroy(&mut self) {
        self.frames.cancel();
        self.listeners.clear();
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.destroy(),
            Err(_) => log::warn!("hero controller busy during destroy; context resources not released"),
        }
        let _ = self.canvas.remove_attribute(OWNER_ATTRIBUTE);
    }
}

impl Drop for Hero {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// `requestAnimationFrame` chain with at most one outstanding request.
#[derive(Default)]
struct FrameLoop {
    request: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameLoop {
    fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn start(frames: &Rc<Self>, controller: Controller) -> Result<(), HeroError> {
        // The closure only holds a weak handle back to its loop, so cancelling
        // (or dropping) the loop also ends a frame that was already queued.
        let this: Weak<Self> = Rc::downgrade(frames);
        *frames.callback.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
            let Some(frames) = this.upgrade() else {
                return;
            };
            frames.request.set(None);
            if !controller.borrow_mut().tick(now) {
                return;
            }
            if let Err(err) = frames.schedule() {
                log::error!("failed to schedule next frame: {err}");
            }
        }) as Box<dyn FnMut(f64)>));

        frames.schedule()
    }

    fn schedule(&self) -> Result<(), HeroError> {
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            return Ok(());
        };
        let id = window()
            .ok_or_else(|| HeroError::MissingElement("window".into()))?
            .request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.request.set(Some(id));
        Ok(())
    }

    fn cancel(&self) {
        if let Some(id) = self.request.take() {
            if let Some(window) = window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        self.callback.borrow_mut().take();
    }
}

/// An event listener that removes itself when dropped.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        callback: Closure<dyn FnMut(Event)>,
        passive: bool,
    ) -> Result<Self, JsValue> {
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

fn page_point(event: &PointerEvent) -> PagePoint {
    PagePoint::new(event.client_x() as f64, event.client_y() as f64)
}

/// Window size in CSS pixels and its device pixel ratio.
fn viewport_metrics(window: &Window) -> Result<((f64, f64), f64), HeroError> {
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let height = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok(((width, height), window.device_pixel_ratio()))
}

/// Reuses a matching canvas inside the hero section, or inserts a new one as
/// its first child.
fn locate_canvas(document: &Document, config: &HeroConfig) -> Result<HtmlCanvasElement, HeroError> {
    let section = document
        .query_selector(&config.section_selector)?
        .ok_or_else(|| HeroError::MissingElement(format!("hero section {}", config.section_selector)))?;

    if let Some(existing) = section.query_selector(&config.canvas_selector)? {
        let canvas: HtmlCanvasElement = existing
            .dyn_into()
            .map_err(|_| HeroError::MissingElement(format!("canvas {}", config.canvas_selector)))?;
        if canvas.has_attribute(OWNER_ATTRIBUTE) {
            return Err(HeroError::SurfaceInUse);
        }
        return Ok(canvas);
    }

    let canvas: HtmlCanvasElement = document
        .create_element("canvas")?
        .dyn_into()
        .map_err(|_| HeroError::MissingElement("canvas".into()))?;
    canvas.set_class_name(&config.canvas_class);
    canvas
        .style()
        .set_property("background", &config.canvas_background)?;
    section.insert_before(&canvas, section.first_child().as_ref())?;
    Ok(canvas)
}
