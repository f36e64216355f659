//! Platform abstraction layer
//!
//! Browser-only pieces: the canvas-backed surface and the
//! `requestAnimationFrame` driver. Everything else in the crate is
//! platform-neutral and runs natively in tests.

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{AnimationLoop, CanvasSurface, Stage};
