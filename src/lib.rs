//! Greeting FX - particle and firework animations for a greeting page
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ambient field, firework show, frame loop)
//! - `renderer`: Drawing surface abstraction and colours
//! - `platform`: Browser canvas and animation-frame plumbing
//! - `settings`: Data-driven tuning loaded from JSON

pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Animation constants
pub mod consts {
    use std::time::Duration;

    /// Fixed simulation step (one display frame at 60 Hz)
    pub const SIM_STEP: Duration = Duration::from_nanos(16_666_667);
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame gap fed into the accumulator, in seconds
    pub const MAX_FRAME_GAP: f32 = 0.1;

    /// Viewport area per ambient particle
    pub const AMBIENT_DENSITY: f32 = 15_000.0;
    /// Upper bound on ambient particles
    pub const AMBIENT_MAX_PARTICLES: usize = 100;
    /// Pairs closer than this are linked by a line
    pub const LINK_DISTANCE: f32 = 150.0;
    /// Line alpha at zero distance
    pub const LINK_BASE_ALPHA: f32 = 0.2;

    /// Shell flight time, in simulation steps
    pub const SHELL_TRAVEL_TICKS: u32 = 100;
    /// Shells detonate this close to their target
    pub const ARRIVAL_TOLERANCE: f32 = 5.0;
    /// Shell draw radius
    pub const SHELL_RADIUS: f32 = 2.0;
    /// Debris particles per detonation
    pub const BURST_PARTICLES: usize = 150;
    /// Downward acceleration on debris, per step
    pub const DEBRIS_GRAVITY: f32 = 0.05;
    /// Max absolute debris speed per axis at detonation
    pub const DEBRIS_SPEED: f32 = 3.0;

    /// Chance per step of a random shell launch
    pub const SPAWN_PROBABILITY: f64 = 0.05;
    /// Random launches stop at this many active shells
    pub const MAX_ACTIVE_SHELLS: usize = 8;

    /// Number of shells in the heart formation
    pub const HEART_POINTS: usize = 20;
    /// Delay from start to the first heart launch
    pub const HEART_DELAY: Duration = Duration::from_millis(1000);
    /// Gap between consecutive heart launches
    pub const HEART_STAGGER: Duration = Duration::from_millis(100);
    /// Delay from the first heart launch to the text reveal
    pub const REVEAL_DELAY: Duration = Duration::from_millis(2000);
    /// Text fade-in duration
    pub const REVEAL_FADE: Duration = Duration::from_millis(2000);
    /// Alpha of the black overlay painted each frame to leave trails
    pub const TRAIL_FADE_ALPHA: f32 = 0.2;
}

/// Seeded generator used by every simulation
#[inline]
pub fn seeded_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Viewport size in drawing units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Area, treating negative extents as empty
    #[inline]
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.area() <= 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}
