use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::backend::ShaderKind;

/// Everything that can go wrong while bringing the hero up or editing its shader.
///
/// None of these escape the frame tick; they surface from initialisation and
/// from explicit calls such as [`crate::HeroController::replace_fragment_source`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeroError {
    #[error("WebGL2 not supported")]
    ContextUnavailable,

    #[error("{0} not found")]
    MissingElement(String),

    #[error("canvas is already driven by another hero")]
    SurfaceInUse,

    #[error("failed to create {0}")]
    ResourceCreation(&'static str),

    #[error("{kind} shader compilation error: {log}")]
    Compile { kind: ShaderKind, log: String },

    #[error("program link error: {0}")]
    Link(String),

    #[error("hero has been destroyed")]
    Destroyed,

    #[error("{0}")]
    Js(String),
}

impl From<JsValue> for HeroError {
    fn from(value: JsValue) -> Self {
        let text = value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}"));
        HeroError::Js(text)
    }
}

impl From<HeroError> for JsValue {
    fn from(err: HeroError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
