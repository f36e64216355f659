//! Drawing surface abstraction
//!
//! The simulation never talks to a canvas directly. Each animation draws
//! through a [`Surface`]; the browser host backs it with a 2D canvas context
//! and tests back it with a [`RecordingSurface`](super::RecordingSurface).

use glam::Vec2;

use super::color::Rgba;

/// Text styling for overlay captions
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font size in drawing units
    pub size: f32,
    pub color: Rgba,
    /// Glow colour drawn behind the glyphs
    pub glow: Option<Rgba>,
}

/// A 2D immediate-mode drawing target
pub trait Surface {
    /// Current drawable size (width, height)
    fn size(&self) -> (f32, f32);

    /// Erase everything to transparent
    fn clear(&mut self);

    /// Fill an axis-aligned rectangle
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba);

    /// Fill a circle
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Stroke a straight line
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);

    /// Draw text centred on `center`
    fn fill_text(&mut self, text: &str, center: Vec2, style: &TextStyle);

    /// A zero-area surface is skipped rather than drawn to
    fn is_drawable(&self) -> bool {
        let (w, h) = self.size();
        w > 0.0 && h > 0.0
    }
}
