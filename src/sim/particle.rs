//! The smallest moving visual unit

use glam::Vec2;
use rand::Rng;

use crate::Viewport;
use crate::renderer::{Rgba, Surface};
use crate::settings::BurstSettings;

/// A point that moves every step and, for debris, fades out
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Rgba,
    /// 1 when spawned; removed once it reaches 0
    pub alpha: f32,
    /// Alpha lost per step (zero for ambient particles, which never fade)
    pub decay: f32,
    /// Added to `vel.y` each step
    pub gravity: f32,
}

impl Particle {
    /// Place a non-fading particle uniformly within the viewport
    pub fn ambient<R: Rng>(rng: &mut R, bounds: Viewport, palette: &[Rgba]) -> Self {
        let color = if palette.is_empty() {
            Rgba::WHITE
        } else {
            palette[rng.random_range(0..palette.len())]
        };

        Self {
            pos: Vec2::new(
                rng.random::<f32>() * bounds.width.max(0.0),
                rng.random::<f32>() * bounds.height.max(0.0),
            ),
            vel: Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
            radius: rng.random_range(1.0..4.0),
            color,
            alpha: 1.0,
            decay: 0.0,
            gravity: 0.0,
        }
    }

    /// Spawn a fading debris particle at a detonation point
    pub fn debris<R: Rng>(
        rng: &mut R,
        origin: Vec2,
        color: Rgba,
        settings: &BurstSettings,
    ) -> Self {
        let speed = settings.debris_speed;
        Self {
            pos: origin,
            vel: Vec2::new(
                rng.random_range(-speed..speed),
                rng.random_range(-speed..speed),
            ),
            radius: rng.random_range(1.0..3.0),
            color,
            alpha: 1.0,
            decay: rng.random_range(settings.decay_min..settings.decay_max),
            gravity: settings.debris_gravity,
        }
    }

    /// Advance one step: gravity, motion, fade. Returns whether still alive.
    #[inline]
    pub fn step(&mut self) -> bool {
        self.vel.y += self.gravity;
        self.pos += self.vel;
        self.alpha -= self.decay;
        self.is_alive()
    }

    /// Motion only, no gravity or fade
    #[inline]
    pub fn drift(&mut self) {
        self.pos += self.vel;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alpha > 0.0
    }

    /// Alpha as drawn, always within 0-1
    #[inline]
    pub fn draw_alpha(&self) -> f32 {
        self.alpha.clamp(0.0, 1.0)
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        surface.fill_circle(self.pos, self.radius, self.color.fade(self.draw_alpha()));
    }
}
