//! Ambient background particle field
//!
//! A perpetual, non-interactive field of drifting points that bounce off the
//! viewport edges. Points closer than the link distance are joined by faint
//! lines whose opacity falls off linearly with distance.

use rand::Rng;

use super::frame_loop::Animation;
use super::particle::Particle;
use crate::Viewport;
use crate::renderer::{Rgba, Surface};
use crate::settings::AmbientSettings;

/// Line width for particle links
const LINK_WIDTH: f32 = 1.0;

/// Opacity of a link between two points `distance` apart.
///
/// Full `base_alpha` at zero distance, falling linearly to zero at
/// `max_distance`; zero at or beyond it.
#[inline]
pub fn link_opacity(distance: f32, max_distance: f32, base_alpha: f32) -> f32 {
    if distance >= max_distance || max_distance <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / max_distance) * base_alpha
}

/// The background particle field
#[derive(Debug, Clone)]
pub struct AmbientField {
    bounds: Viewport,
    settings: AmbientSettings,
    particles: Vec<Particle>,
}

impl AmbientField {
    /// Number of particles for a viewport: one per `density` units of area, capped
    pub fn particle_count_for(viewport: Viewport, settings: &AmbientSettings) -> usize {
        if viewport.is_empty() || !(settings.density > 0.0) {
            return 0;
        }
        let by_area = (viewport.area() / settings.density).floor() as usize;
        by_area.min(settings.max_particles)
    }

    /// Populate a field for `viewport`. Invalid settings fall back to the defaults.
    pub fn initialize<R: Rng>(viewport: Viewport, settings: &AmbientSettings, rng: &mut R) -> Self {
        let settings = settings.clone().or_default();
        let count = Self::particle_count_for(viewport, &settings);
        let particles = (0..count)
            .map(|_| Particle::ambient(rng, viewport, &settings.palette))
            .collect();

        log::info!(
            "Ambient field: {} particles for {}x{}",
            count,
            viewport.width,
            viewport.height
        );

        Self {
            bounds: viewport,
            settings,
            particles,
        }
    }

    /// Adopt new bounds. Existing particles are kept where they are.
    pub fn on_resize(&mut self, viewport: Viewport) {
        log::debug!("Ambient field resized to {}x{}", viewport.width, viewport.height);
        self.bounds = viewport;
    }

    /// Drift every particle and bounce off the edges
    pub fn tick(&mut self) {
        let Viewport { width, height } = self.bounds;
        for particle in self.particles.iter_mut() {
            particle.drift();

            if particle.pos.x > width || particle.pos.x < 0.0 {
                particle.vel.x = -particle.vel.x;
            }
            if particle.pos.y > height || particle.pos.y < 0.0 {
                particle.vel.y = -particle.vel.y;
            }
        }
    }

    /// Clear the frame, draw particles, then link nearby pairs
    pub fn render(&self, surface: &mut dyn Surface) {
        if !surface.is_drawable() {
            return;
        }
        surface.clear();

        for particle in &self.particles {
            surface.fill_circle(particle.pos, particle.radius, particle.color);
        }

        let max = self.settings.link_distance;
        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = a.pos.distance(b.pos);
                let opacity = link_opacity(distance, max, self.settings.link_alpha);
                if opacity > 0.0 {
                    surface.stroke_line(a.pos, b.pos, LINK_WIDTH, Rgba::WHITE.with_alpha(opacity));
                }
            }
        }
    }

    /// Drop every particle
    pub fn teardown(&mut self) {
        if !self.particles.is_empty() {
            log::info!("Ambient field torn down");
        }
        self.particles.clear();
    }

    pub fn bounds(&self) -> Viewport {
        self.bounds
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

impl Animation for AmbientField {
    fn step(&mut self) {
        self.tick();
    }

    fn render(&self, surface: &mut dyn Surface) {
        AmbientField::render(self, surface);
    }
}
