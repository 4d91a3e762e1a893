#![forbid(unsafe_code)]

//! Browser adapter for `floating-runtime`.
//!
//! Positions DOM elements with the `FloatingUIDOM` global (the
//! `@floating-ui/dom` browser bundle), which must be loaded before a
//! [`DomEngine`] is created. Everything DOM-facing only exists on `wasm32`;
//! the JSON shapes exchanged with the engine live in [`convert`] and are
//! available everywhere.

pub mod convert;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use convert::{AutoUpdateOptions, GLOBAL_NAMESPACE};

#[cfg(target_arch = "wasm32")]
pub use wasm::{
    DomElement, DomEngine, WasmSpawner, apply_styles, auto_update, dom_floating_state,
};
