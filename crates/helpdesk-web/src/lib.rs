#![forbid(unsafe_code)]

//! WASM frontend for the helpdesk chat launcher.
//!
//! On `wasm32` this crate boots the launcher from the host page's global
//! `window.HelpdeskWidget` configuration object, wires DOM listeners and
//! replaces that global with the public API (`toggle`, `open`, `close`,
//! `maximize`, `reinit`, `destroy`, ...).
//!
//! The [`protocol`] module holds the page-facing message and record formats
//! and compiles on every target.

pub mod protocol;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::DomDocument;

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct DomDocument;
