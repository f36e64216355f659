//! Animation settings
//!
//! Loaded once at startup from JSON. Every field has a default, so a partial
//! document only overrides what it names. Nothing is written back.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::renderer::Rgba;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Multiplier applied to particle counts (1.0 = full)
    pub fn particle_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.34,
            QualityPreset::Medium => 0.67,
            QualityPreset::High => 1.0,
        }
    }

    fn scale_count(&self, count: usize) -> usize {
        (count as f32 * self.particle_scale()).round() as usize
    }
}

/// Background particle field tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientSettings {
    /// Viewport area per particle
    pub density: f32,
    /// Particle cap regardless of area
    pub max_particles: usize,
    /// Pairs closer than this are linked
    pub link_distance: f32,
    /// Link alpha at zero distance
    pub link_alpha: f32,
    /// Colours particles are drawn from
    pub palette: Vec<Rgba>,
}

impl Default for AmbientSettings {
    fn default() -> Self {
        Self {
            density: AMBIENT_DENSITY,
            max_particles: AMBIENT_MAX_PARTICLES,
            link_distance: LINK_DISTANCE,
            link_alpha: LINK_BASE_ALPHA,
            palette: vec![
                Rgba::new(255, 107, 149, 0.7), // Pink
                Rgba::new(155, 111, 204, 0.7), // Purple
                Rgba::new(255, 215, 0, 0.7),   // Gold
                Rgba::new(74, 144, 226, 0.7),  // Blue
            ],
        }
    }
}

impl AmbientSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.density > 0.0) {
            return Err(ConfigError::invalid("ambient.density", "must be positive"));
        }
        if !(self.link_distance > 0.0) {
            return Err(ConfigError::invalid("ambient.link_distance", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.link_alpha) {
            return Err(ConfigError::invalid("ambient.link_alpha", "must be within 0-1"));
        }
        if self.palette.is_empty() {
            return Err(ConfigError::invalid("ambient.palette", "must not be empty"));
        }
        Ok(())
    }

    /// These settings if valid, otherwise the defaults
    pub fn or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                log::warn!("Invalid ambient settings ({}), using defaults", e);
                Self::default()
            }
        }
    }
}

/// Firework show tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstSettings {
    // === Shells ===
    /// Steps a shell takes to reach its target
    pub travel_ticks: u32,
    /// Detonation distance from target
    pub arrival_tolerance: f32,
    /// Chance per step of a random launch
    pub spawn_probability: f64,
    /// Random launches pause at this many active shells
    pub max_active_shells: usize,

    // === Debris ===
    pub burst_particles: usize,
    pub debris_gravity: f32,
    /// Max absolute speed per axis
    pub debris_speed: f32,
    /// Alpha lost per step, sampled from [decay_min, decay_max)
    pub decay_min: f32,
    pub decay_max: f32,

    // === Heart formation ===
    pub heart_points: usize,
    /// Curve scale as a fraction of the smaller viewport side
    pub heart_scale: f32,
    /// Upward offset of the curve centre from the viewport centre
    pub heart_lift: f32,
    pub heart_delay_ms: u64,
    pub heart_stagger_ms: u64,

    // === Reveal ===
    /// Delay from the first heart launch to the fade-in
    pub reveal_delay_ms: u64,
    pub reveal_fade_ms: u64,
    pub text_size: f32,
    /// Text size on narrow viewports
    pub compact_text_size: f32,
    /// Viewports at most this wide use the compact size
    pub compact_width: f32,

    /// Black overlay alpha painted per frame
    pub trail_alpha: f32,
    /// Complete as soon as the show drains before the reveal starts
    pub early_completion: bool,
}

impl Default for BurstSettings {
    fn default() -> Self {
        Self {
            travel_ticks: SHELL_TRAVEL_TICKS,
            arrival_tolerance: ARRIVAL_TOLERANCE,
            spawn_probability: SPAWN_PROBABILITY,
            max_active_shells: MAX_ACTIVE_SHELLS,

            burst_particles: BURST_PARTICLES,
            debris_gravity: DEBRIS_GRAVITY,
            debris_speed: DEBRIS_SPEED,
            decay_min: 0.01,
            decay_max: 0.04,

            heart_points: HEART_POINTS,
            heart_scale: 0.2,
            heart_lift: 50.0,
            heart_delay_ms: HEART_DELAY.as_millis() as u64,
            heart_stagger_ms: HEART_STAGGER.as_millis() as u64,

            reveal_delay_ms: REVEAL_DELAY.as_millis() as u64,
            reveal_fade_ms: REVEAL_FADE.as_millis() as u64,
            text_size: 80.0,
            compact_text_size: 48.0,
            compact_width: 768.0,

            trail_alpha: TRAIL_FADE_ALPHA,
            early_completion: false,
        }
    }
}

impl BurstSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.travel_ticks == 0 {
            return Err(ConfigError::invalid("burst.travel_ticks", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(ConfigError::invalid("burst.spawn_probability", "must be within 0-1"));
        }
        if !(self.decay_min > 0.0) {
            return Err(ConfigError::invalid("burst.decay_min", "must be positive"));
        }
        if !(self.decay_max > self.decay_min) {
            return Err(ConfigError::invalid("burst.decay_max", "must exceed decay_min"));
        }
        if !(self.debris_speed > 0.0) {
            return Err(ConfigError::invalid("burst.debris_speed", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.trail_alpha) {
            return Err(ConfigError::invalid("burst.trail_alpha", "must be within 0-1"));
        }
        Ok(())
    }

    /// These settings if valid, otherwise the defaults
    pub fn or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                log::warn!("Invalid burst settings ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn heart_delay(&self) -> Duration {
        Duration::from_millis(self.heart_delay_ms)
    }

    pub fn heart_stagger(&self) -> Duration {
        Duration::from_millis(self.heart_stagger_ms)
    }

    /// Absolute offset from session start at which the fade begins
    pub fn reveal_start(&self) -> Duration {
        self.heart_delay() + Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn reveal_fade(&self) -> Duration {
        Duration::from_millis(self.reveal_fade_ms)
    }

    /// Text size for a viewport of the given width
    pub fn text_size_for(&self, width: f32) -> f32 {
        if width <= self.compact_width {
            self.compact_text_size
        } else {
            self.text_size
        }
    }
}

/// Top-level settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Particle count preset
    pub quality: QualityPreset,
    pub ambient: AmbientSettings,
    pub burst: BurstSettings,
    /// Caption revealed over the heart formation
    pub message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::default(),
            ambient: AmbientSettings::default(),
            burst: BurstSettings::default(),
            message: "I Love You".to_string(),
        }
    }
}

impl Settings {
    /// Parse and validate a JSON settings document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ambient.validate()?;
        self.burst.validate()
    }

    /// Ambient settings with the quality preset applied
    pub fn resolved_ambient(&self) -> AmbientSettings {
        AmbientSettings {
            max_particles: self.quality.scale_count(self.ambient.max_particles),
            ..self.ambient.clone()
        }
    }

    /// Burst settings with the quality preset applied
    pub fn resolved_burst(&self) -> BurstSettings {
        BurstSettings {
            burst_particles: self.quality.scale_count(self.burst.burst_particles),
            ..self.burst.clone()
        }
    }

    /// Read settings from the page's `<script id="fx-settings">` block (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("fx-settings"))
            .and_then(|el| el.text_content());

        match text {
            Some(json) if !json.trim().is_empty() => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings ({} quality)", settings.quality.as_str());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring page settings: {}", e);
                    Self::default()
                }
            },
            _ => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Read settings from a JSON file, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: Option<&std::path::Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Self::default();
        };

        match std::fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
