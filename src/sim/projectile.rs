//! Firework shells
//!
//! A shell flies in a straight line from its launch point to its target in a
//! fixed number of steps, then detonates into a debris cloud. After detonation
//! the shell itself is frozen and only its cloud evolves.

use glam::Vec2;
use rand::Rng;

use super::particle::Particle;
use crate::Viewport;
use crate::consts::SHELL_RADIUS;
use crate::renderer::{Rgba, Surface};
use crate::settings::BurstSettings;

/// A firework shell and, once detonated, its debris
#[derive(Debug, Clone)]
pub struct Projectile {
    pub pos: Vec2,
    pub origin: Vec2,
    pub target: Vec2,
    /// Per-step displacement, fixed at launch
    pub vel: Vec2,
    pub color: Rgba,
    pub radius: f32,
    /// Steps flown so far
    pub ticks_flown: u32,
    /// Flight budget in steps
    pub travel_ticks: u32,
    detonated: bool,
    /// Empty until detonation
    particles: Vec<Particle>,
}

impl Projectile {
    /// Launch a shell that reaches `target` after `travel_ticks` steps
    pub fn launch(origin: Vec2, target: Vec2, color: Rgba, travel_ticks: u32) -> Self {
        let travel_ticks = travel_ticks.max(1);
        Self {
            pos: origin,
            origin,
            target,
            vel: (target - origin) / travel_ticks as f32,
            color,
            radius: SHELL_RADIUS,
            ticks_flown: 0,
            travel_ticks,
            detonated: false,
            particles: Vec::new(),
        }
    }

    /// Launch from a random point on the bottom edge toward `target`
    pub fn from_ground<R: Rng>(
        rng: &mut R,
        viewport: Viewport,
        target: Vec2,
        settings: &BurstSettings,
    ) -> Self {
        let origin = Vec2::new(rng.random::<f32>() * viewport.width.max(0.0), viewport.height);
        Self::launch(origin, target, random_shell_color(rng), settings.travel_ticks)
    }

    /// Launch from the bottom edge toward a random point in the upper half
    pub fn random<R: Rng>(rng: &mut R, viewport: Viewport, settings: &BurstSettings) -> Self {
        let target = Vec2::new(
            rng.random::<f32>() * viewport.width.max(0.0),
            rng.random::<f32>() * viewport.height.max(0.0) / 2.0,
        );
        Self::from_ground(rng, viewport, target, settings)
    }

    /// Advance one step. Flight moves the shell; afterwards only the cloud moves.
    /// Returns `true` on the step the shell detonates.
    pub fn step<R: Rng>(&mut self, rng: &mut R, settings: &BurstSettings) -> bool {
        if self.detonated {
            self.particles.retain_mut(|p| p.step());
            return false;
        }

        self.pos += self.vel;
        self.ticks_flown += 1;

        let arrived = self.pos.distance(self.target) < settings.arrival_tolerance;
        if arrived || self.ticks_flown >= self.travel_ticks {
            self.detonate(rng, settings);
            return true;
        }
        false
    }

    fn detonate<R: Rng>(&mut self, rng: &mut R, settings: &BurstSettings) {
        self.detonated = true;
        self.particles.reserve_exact(settings.burst_particles);
        for _ in 0..settings.burst_particles {
            self.particles
                .push(Particle::debris(rng, self.pos, self.color, settings));
        }
    }

    pub fn is_detonated(&self) -> bool {
        self.detonated
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Detonated with nothing left to draw
    pub fn is_spent(&self) -> bool {
        self.detonated && self.particles.is_empty()
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        if self.detonated {
            for particle in &self.particles {
                particle.draw(surface);
            }
        } else {
            surface.fill_circle(self.pos, self.radius, self.color);
        }
    }
}

/// Bright, fully saturated hue
fn random_shell_color<R: Rng>(rng: &mut R) -> Rgba {
    Rgba::from_hsl(rng.random::<f32>() * 360.0, 1.0, 0.7)
}
