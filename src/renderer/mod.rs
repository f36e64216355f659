//! Rendering module
//!
//! Immediate-mode 2D drawing through the [`Surface`] trait.

pub mod color;
pub mod recorder;
pub mod surface;

pub use color::{Rgba, hsl_to_rgb};
pub use recorder::{DrawCommand, RecordingSurface};
pub use surface::{Surface, TextStyle};
