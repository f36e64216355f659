//! Deterministic simulation module
//!
//! All animation logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Scripted timing runs on a virtual session clock, never wall-clock timers
//! - No platform dependencies; drawing goes through `renderer::Surface`

pub mod ambient;
pub mod burst;
pub mod frame_loop;
pub mod particle;
pub mod projectile;
pub mod schedule;

pub use ambient::{AmbientField, link_opacity};
pub use burst::{BurstPhase, BurstSequencer, CompletionCallback, heart_layout, heart_points};
pub use frame_loop::{Animation, FrameLoop, FrameOutcome};
pub use particle::Particle;
pub use projectile::Projectile;
pub use schedule::{Cue, Schedule};
