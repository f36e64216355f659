//! Firework show
//!
//! One activation runs a fixed choreography against a virtual session clock:
//!
//! - `T+1000ms`: heart-formation shells launch, one every 100ms
//! - `T+3000ms`: the caption starts fading in (2000ms, cubic ease-out)
//! - `T+5000ms`: caption fully visible; the show waits for acknowledgement
//!
//! Random shells keep launching throughout. The host is told the show is over
//! through a completion callback that fires at most once per `start`.

use std::fmt;
use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::frame_loop::Animation;
use super::projectile::Projectile;
use super::schedule::{Cue, Schedule};
use crate::consts::SIM_STEP;
use crate::renderer::{Rgba, Surface, TextStyle};
use crate::settings::{BurstSettings, Settings};
use crate::{Viewport, seeded_rng};

/// Glow behind the caption
const CAPTION_GLOW: Rgba = Rgba::rgb(255, 107, 149);

/// Lifecycle of a show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstPhase {
    /// Nothing running (initial state and after `reset`)
    Idle,
    /// Shells launching, caption not yet fully visible
    Running,
    /// Caption fully visible; waiting for the viewer
    AwaitingAcknowledgement,
    /// Done; the completion callback has fired
    Completed,
}

/// Completion signal handed to `start`
pub type CompletionCallback = Box<dyn FnOnce()>;

/// Heart curve sampled at `count` evenly spaced parameters.
///
/// `x = cx + s·16·sin³t`, `y = cy − s·(13cos t − 5cos 2t − 2cos 3t − cos 4t)`
/// with `t = 2πi / count`.
pub fn heart_points(center: Vec2, scale: f32, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32 * std::f32::consts::TAU;
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
            Vec2::new(center.x + scale * x, center.y - scale * y)
        })
        .collect()
}

/// Heart targets for a viewport: centred slightly above the middle, scaled to its smaller side
pub fn heart_layout(viewport: Viewport, settings: &BurstSettings) -> Vec<Vec2> {
    let center = viewport.center() - Vec2::new(0.0, settings.heart_lift);
    let scale = settings.heart_scale * viewport.width.min(viewport.height).max(0.0);
    heart_points(center, scale, settings.heart_points)
}

/// Caption fade curve (cubic ease-out)
#[inline]
fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// A single firework show session
pub struct BurstSequencer<R: Rng = Pcg32> {
    settings: BurstSettings,
    message: String,
    rng: R,
    phase: BurstPhase,
    viewport: Viewport,
    /// Time since `start`
    clock: Duration,
    schedule: Schedule,
    /// Active shells (in flight or with a live debris cloud)
    projectiles: Vec<Projectile>,
    /// Scheduled start of the caption fade
    reveal_started: Option<Duration>,
    reveal_opacity: f32,
    on_complete: Option<CompletionCallback>,
    /// Number of `start` calls, for logs
    session: u64,
}

impl BurstSequencer<Pcg32> {
    /// Idle sequencer with a seeded generator
    pub fn new(settings: &Settings, seed: u64) -> Self {
        Self::with_rng(settings.resolved_burst(), settings.message.clone(), seeded_rng(seed))
    }
}

impl<R: Rng> BurstSequencer<R> {
    /// Idle sequencer drawing randomness from `rng`. Invalid settings fall back to the defaults.
    pub fn with_rng(settings: BurstSettings, message: String, rng: R) -> Self {
        Self {
            settings: settings.or_default(),
            message,
            rng,
            phase: BurstPhase::Idle,
            viewport: Viewport::default(),
            clock: Duration::ZERO,
            schedule: Schedule::new(),
            projectiles: Vec::new(),
            reveal_started: None,
            reveal_opacity: 0.0,
            on_complete: None,
            session: 0,
        }
    }

    /// Begin a show. A show already in progress is discarded, its callback dropped unfired.
    pub fn start(&mut self, viewport: Viewport, on_complete: impl FnOnce() + 'static) {
        if matches!(
            self.phase,
            BurstPhase::Running | BurstPhase::AwaitingAcknowledgement
        ) {
            log::info!("Restarting firework show {} from scratch", self.session);
        }
        self.clear_session();

        self.session += 1;
        self.viewport = viewport;

        let first_launch = self.settings.heart_delay();
        let stagger = self.settings.heart_stagger();
        for (index, target) in heart_layout(viewport, &self.settings).into_iter().enumerate() {
            self.schedule
                .push(first_launch + stagger * index as u32, Cue::LaunchHeart { index, target });
        }
        self.schedule.push(self.settings.reveal_start(), Cue::BeginReveal);

        self.on_complete = Some(Box::new(on_complete));
        self.set_phase(BurstPhase::Running);

        log::info!(
            "Firework show {} started on {}x{} ({} cues)",
            self.session,
            viewport.width,
            viewport.height,
            self.schedule.len()
        );
    }

    /// Advance the show by one step
    pub fn step(&mut self) {
        if !self.is_active() {
            return;
        }

        self.clock += SIM_STEP;

        for (at, cue) in self.schedule.drain_due(self.clock) {
            self.fire(at, cue);
        }

        for shell in self.projectiles.iter_mut() {
            if shell.step(&mut self.rng, &self.settings) {
                log::trace!("Shell detonated at ({:.0}, {:.0})", shell.pos.x, shell.pos.y);
            }
        }
        self.projectiles.retain(|shell| !shell.is_spent());

        if self.projectiles.len() < self.settings.max_active_shells
            && self.rng.random::<f64>() < self.settings.spawn_probability
        {
            let shell = Projectile::random(&mut self.rng, self.viewport, &self.settings);
            self.projectiles.push(shell);
        }

        self.update_reveal();

        if self.phase == BurstPhase::Running {
            if self.reveal_opacity >= 1.0 {
                self.set_phase(BurstPhase::AwaitingAcknowledgement);
            } else if self.settings.early_completion && self.has_drained() {
                log::info!("Firework show {} drained before the reveal", self.session);
                self.complete();
            }
        }
    }

    /// Viewer input. Completes the show only once the caption is fully visible.
    pub fn acknowledge(&mut self) -> bool {
        if self.phase != BurstPhase::AwaitingAcknowledgement {
            log::debug!("Acknowledgement ignored in {:?}", self.phase);
            return false;
        }
        self.complete();
        true
    }

    /// Drop all shells, cues and the pending callback; back to Idle
    pub fn reset(&mut self) {
        self.clear_session();
        if self.phase != BurstPhase::Idle {
            self.set_phase(BurstPhase::Idle);
        }
    }

    /// Host teardown: same as `reset`
    pub fn teardown(&mut self) {
        if self.phase != BurstPhase::Idle {
            log::info!("Firework show {} torn down", self.session);
        }
        self.reset();
    }

    /// Draw the current frame over the previous one
    pub fn render(&self, surface: &mut dyn Surface) {
        if self.phase == BurstPhase::Idle || !surface.is_drawable() {
            return;
        }

        let (width, height) = surface.size();
        surface.fill_rect(
            Vec2::ZERO,
            Vec2::new(width, height),
            Rgba::BLACK.with_alpha(self.settings.trail_alpha),
        );

        for shell in &self.projectiles {
            shell.draw(surface);
        }

        if self.reveal_opacity > 0.0 {
            let style = TextStyle {
                size: self.settings.text_size_for(width),
                color: Rgba::WHITE.with_alpha(self.reveal_opacity),
                glow: Some(CAPTION_GLOW.with_alpha(self.reveal_opacity)),
            };
            surface.fill_text(&self.message, Vec2::new(width / 2.0, height / 2.0), &style);
        }
    }

    pub fn phase(&self) -> BurstPhase {
        self.phase
    }

    /// Time since `start`
    pub fn elapsed(&self) -> Duration {
        self.clock
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Live debris particles across all shells
    pub fn particle_count(&self) -> usize {
        self.projectiles.iter().map(|s| s.particles().len()).sum()
    }

    /// Caption opacity, 0-1
    pub fn reveal_opacity(&self) -> f32 {
        self.reveal_opacity
    }

    pub fn pending_cues(&self) -> usize {
        self.schedule.len()
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn settings(&self) -> &BurstSettings {
        &self.settings
    }

    /// Running or awaiting acknowledgement
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            BurstPhase::Running | BurstPhase::AwaitingAcknowledgement
        )
    }

    fn fire(&mut self, at: Duration, cue: Cue) {
        match cue {
            Cue::LaunchHeart { index, target } => {
                log::trace!("Heart shell {} launched at {:?}", index, at);
                let shell = Projectile::from_ground(&mut self.rng, self.viewport, target, &self.settings);
                self.projectiles.push(shell);
            }
            Cue::BeginReveal => {
                log::debug!("Caption reveal begins at {:?}", at);
                self.reveal_started = Some(at);
            }
        }
    }

    fn update_reveal(&mut self) {
        let Some(started) = self.reveal_started else {
            return;
        };
        let fade = self.settings.reveal_fade();
        let elapsed = self.clock.saturating_sub(started);

        self.reveal_opacity = if elapsed >= fade {
            1.0
        } else {
            ease_out(elapsed.as_secs_f32() / fade.as_secs_f32())
        };
    }

    /// No heart left to launch, nothing on screen, caption still hidden
    fn has_drained(&self) -> bool {
        self.schedule.pending_launches() == 0
            && self.projectiles.is_empty()
            && self.reveal_opacity <= 0.0
    }

    fn complete(&mut self) {
        self.set_phase(BurstPhase::Completed);
        log::info!("Firework show {} complete after {:?}", self.session, self.clock);
        if let Some(callback) = self.on_complete.take() {
            callback();
        }
    }

    fn clear_session(&mut self) {
        self.schedule.clear();
        self.projectiles.clear();
        self.clock = Duration::ZERO;
        self.reveal_started = None;
        self.reveal_opacity = 0.0;
        self.on_complete = None;
    }

    fn set_phase(&mut self, phase: BurstPhase) {
        log::debug!("Firework show {}: {:?} -> {:?}", self.session, self.phase, phase);
        self.phase = phase;
    }
}

impl<R: Rng> Animation for BurstSequencer<R> {
    fn step(&mut self) {
        BurstSequencer::step(self);
    }

    fn render(&self, surface: &mut dyn Surface) {
        BurstSequencer::render(self, surface);
    }

    fn is_finished(&self) -> bool {
        !self.is_active()
    }
}

impl<R: Rng> fmt::Debug for BurstSequencer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BurstSequencer")
            .field("session", &self.session)
            .field("phase", &self.phase)
            .field("clock", &self.clock)
            .field("projectiles", &self.projectiles.len())
            .field("pending_cues", &self.schedule.len())
            .field("reveal_opacity", &self.reveal_opacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCommand, RecordingSurface};
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const VIEW: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };

    fn quiet_settings() -> BurstSettings {
        BurstSettings {
            spawn_probability: 0.0,
            ..BurstSettings::default()
        }
    }

    fn sequencer(settings: BurstSettings) -> BurstSequencer {
        BurstSequencer::with_rng(settings, "I Love You".to_string(), seeded_rng(42))
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = count.clone();
        (count, move || handle.set(handle.get() + 1))
    }

    fn run_until(show: &mut BurstSequencer, ms: u64) {
        let until = Duration::from_millis(ms);
        for _ in 0..100_000 {
            if show.elapsed() >= until || !show.is_active() {
                return;
            }
            show.step();
        }
        panic!("show never reached {}ms", ms);
    }

    #[test]
    fn test_heart_first_point() {
        let center = Vec2::new(400.0, 250.0);
        let s = 12.0;
        let points = heart_points(center, s, 20);
        assert_eq!(points.len(), 20);
        // t = 0: sin = 0, 13 - 5 - 2 - 1 = 5
        assert!((points[0].x - 400.0).abs() < 1e-4);
        assert!((points[0].y - (250.0 - 5.0 * s)).abs() < 1e-4);
    }

    #[test]
    fn test_heart_layout_for_viewport() {
        let settings = BurstSettings::default();
        let points = heart_layout(Viewport::new(1000.0, 800.0), &settings);
        // Centre (500, 350), scale 0.2 * 800 = 160
        assert_eq!(points.len(), 20);
        assert!((points[0] - Vec2::new(500.0, 350.0 - 5.0 * 160.0)).length() < 1e-3);
    }

    #[test]
    fn test_start_schedules_choreography() {
        let mut show = sequencer(quiet_settings());
        assert_eq!(show.phase(), BurstPhase::Idle);

        let (_, done) = counter();
        show.start(VIEW, done);
        assert_eq!(show.phase(), BurstPhase::Running);
        assert_eq!(show.pending_cues(), 21);
        assert!(show.projectiles().is_empty());
        assert_eq!(show.session(), 1);
    }

    #[test]
    fn test_heart_launches_are_staggered() {
        let mut show = sequencer(quiet_settings());
        let (_, done) = counter();
        show.start(VIEW, done);

        // 59 steps is just under a second
        for _ in 0..59 {
            show.step();
        }
        assert!(show.elapsed() < Duration::from_millis(1000));
        assert!(show.projectiles().is_empty());

        show.step();
        assert!(show.elapsed() >= Duration::from_millis(1000));
        assert_eq!(show.projectiles().len(), 1);

        run_until(&mut show, 1100);
        assert_eq!(show.projectiles().len(), 2);

        run_until(&mut show, 2900);
        assert_eq!(show.projectiles().len(), 20);
        assert_eq!(show.pending_cues(), 1);
        assert_eq!(show.reveal_opacity(), 0.0);

        run_until(&mut show, 3100);
        assert!(show.reveal_opacity() > 0.0 && show.reveal_opacity() < 1.0);
        assert_eq!(show.pending_cues(), 0);
    }

    #[test]
    fn test_end_to_end_acknowledgement() {
        let mut show = sequencer(BurstSettings::default());
        let (count, done) = counter();
        show.start(VIEW, done);

        run_until(&mut show, 4900);
        assert_eq!(show.phase(), BurstPhase::Running);
        assert!(!show.acknowledge(), "too early");
        assert_eq!(count.get(), 0);

        run_until(&mut show, 5000);
        assert_eq!(show.phase(), BurstPhase::AwaitingAcknowledgement);
        assert_eq!(show.reveal_opacity(), 1.0);
        assert_eq!(count.get(), 0);

        // The show keeps animating while it waits
        for _ in 0..600 {
            show.step();
        }
        assert_eq!(show.phase(), BurstPhase::AwaitingAcknowledgement);
        assert_eq!(count.get(), 0);

        assert!(show.acknowledge());
        assert_eq!(show.phase(), BurstPhase::Completed);
        assert_eq!(count.get(), 1);

        assert!(!show.acknowledge());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_completed_show_stops_simulating() {
        let mut show = sequencer(BurstSettings::default());
        let (_, done) = counter();
        show.start(VIEW, done);
        run_until(&mut show, 5000);
        show.acknowledge();

        let clock = show.elapsed();
        show.step();
        assert_eq!(show.elapsed(), clock);
        assert!(Animation::is_finished(&show));
    }

    #[test]
    fn test_restart_discards_previous_session() {
        let mut show = sequencer(BurstSettings::default());
        let (first, done) = counter();
        show.start(VIEW, done);
        run_until(&mut show, 2000);
        assert!(!show.projectiles().is_empty());

        let (second, done) = counter();
        show.start(VIEW, done);
        assert_eq!(show.elapsed(), Duration::ZERO);
        assert!(show.projectiles().is_empty());
        assert_eq!(show.pending_cues(), 21);
        assert_eq!(show.session(), 2);

        run_until(&mut show, 5000);
        show.acknowledge();
        assert_eq!(first.get(), 0, "replaced callback must never fire");
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_reset_then_start_is_fresh() {
        let mut show = sequencer(quiet_settings());
        let (count, done) = counter();
        show.start(VIEW, done);
        run_until(&mut show, 2500);
        assert!(show.particle_count() > 0 || !show.projectiles().is_empty());

        show.reset();
        assert_eq!(show.phase(), BurstPhase::Idle);
        assert!(show.projectiles().is_empty());
        assert_eq!(show.pending_cues(), 0);

        let (_, done) = counter();
        show.start(VIEW, done);
        show.step();

        let mut surface = RecordingSurface::new(VIEW.width, VIEW.height);
        show.render(&mut surface);
        assert_eq!(surface.circles().count(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_reset_and_acknowledge_are_noops_when_idle() {
        let mut show = sequencer(BurstSettings::default());
        show.reset();
        show.reset();
        show.teardown();
        assert_eq!(show.phase(), BurstPhase::Idle);
        assert!(!show.acknowledge());

        show.step();
        assert_eq!(show.elapsed(), Duration::ZERO);

        let mut surface = RecordingSurface::new(100.0, 100.0);
        show.render(&mut surface);
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn test_teardown_drops_callback() {
        let mut show = sequencer(BurstSettings::default());
        let (count, done) = counter();
        show.start(VIEW, done);
        run_until(&mut show, 5000);
        show.teardown();

        assert!(!show.acknowledge());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_random_launches_respect_cap() {
        let settings = BurstSettings {
            spawn_probability: 1.0,
            heart_points: 0,
            ..BurstSettings::default()
        };
        let mut show = sequencer(settings);
        let (_, done) = counter();
        show.start(VIEW, done);

        let mut peak = 0;
        for _ in 0..400 {
            show.step();
            peak = peak.max(show.projectiles().len());
        }
        assert_eq!(peak, 8);
    }

    #[test]
    fn test_early_completion_when_enabled() {
        let settings = BurstSettings {
            spawn_probability: 0.0,
            heart_points: 0,
            early_completion: true,
            ..BurstSettings::default()
        };
        let mut show = sequencer(settings);
        let (count, done) = counter();
        show.start(VIEW, done);
        show.step();

        assert_eq!(show.phase(), BurstPhase::Completed);
        assert_eq!(count.get(), 1);
        assert!(!show.acknowledge());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_no_early_completion_by_default() {
        let settings = BurstSettings {
            spawn_probability: 0.0,
            heart_points: 0,
            ..BurstSettings::default()
        };
        let mut show = sequencer(settings);
        let (count, done) = counter();
        show.start(VIEW, done);
        run_until(&mut show, 2000);

        assert_eq!(show.phase(), BurstPhase::Running);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_render_layers() {
        let mut show = sequencer(BurstSettings::default());
        let (_, done) = counter();
        show.start(VIEW, done);
        run_until(&mut show, 4000);

        let mut surface = RecordingSurface::new(VIEW.width, VIEW.height);
        show.render(&mut surface);
        let commands = surface.commands();

        match &commands[0] {
            DrawCommand::Rect { size, color, .. } => {
                assert_eq!(*size, Vec2::new(VIEW.width, VIEW.height));
                assert_eq!(color.a, 0.2);
            }
            other => panic!("expected trail overlay, got {:?}", other),
        }

        let texts: Vec<_> = surface.texts().collect();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "I Love You");
        assert_eq!(texts[0].1.size, 80.0);
        assert!((texts[0].1.color.a - show.reveal_opacity()).abs() < 1e-6);

        for (_, _, color) in surface.circles() {
            assert!((0.0..=1.0).contains(&color.a));
        }
    }

    #[test]
    fn test_zero_viewport_degrades_silently() {
        let mut show = sequencer(BurstSettings::default());
        let (count, done) = counter();
        show.start(Viewport::new(0.0, 0.0), done);
        run_until(&mut show, 5000);
        assert_eq!(show.phase(), BurstPhase::AwaitingAcknowledgement);

        let mut surface = RecordingSurface::new(0.0, 0.0);
        show.render(&mut surface);
        assert!(surface.commands().is_empty());

        assert!(show.acknowledge());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_ease_out_endpoints() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert!((ease_out(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_settings_fall_back_to_defaults() {
        let mut settings = Settings::default();
        settings.burst.decay_min = settings.burst.decay_max;
        let mut show = BurstSequencer::new(&settings, 1);
        assert_eq!(show.settings(), &BurstSettings::default());

        let (count, done) = counter();
        show.start(VIEW, done);
        for _ in 0..400 {
            show.step();
        }
        assert_eq!(show.phase(), BurstPhase::AwaitingAcknowledgement);
        assert!(show.acknowledge());
        assert_eq!(count.get(), 1);

        let still = BurstSettings {
            debris_speed: 0.0,
            ..BurstSettings::default()
        };
        let mut show = sequencer(still);
        assert_eq!(show.settings().debris_speed, BurstSettings::default().debris_speed);
        let (_, done) = counter();
        show.start(VIEW, done);
        run_until(&mut show, 5000);
        assert_eq!(show.phase(), BurstPhase::AwaitingAcknowledgement);
    }

    #[test]
    fn test_caption_halfway_through_fade() {
        let mut show = sequencer(quiet_settings());
        let (_, done) = counter();
        show.start(VIEW, done);
        run_until(&mut show, 4000);

        // 1000ms into a 2000ms fade, give or take one step
        let opacity = show.reveal_opacity();
        assert!(opacity > 0.86 && opacity < 0.89, "opacity {}", opacity);
    }

    proptest! {
        #[test]
        fn prop_heart_is_mirror_symmetric(
            cx in -500.0f32..500.0,
            cy in -500.0f32..500.0,
            s in 0.1f32..50.0,
        ) {
            let points = heart_points(Vec2::new(cx, cy), s, 20);
            for i in 1..20 {
                let a = points[i];
                let b = points[20 - i];
                let tol = 1e-3 * s.max(1.0) * 20.0;
                prop_assert!(((a.x - cx) + (b.x - cx)).abs() < tol);
                prop_assert!((a.y - b.y).abs() < tol);
            }
        }

        #[test]
        fn prop_nothing_dead_survives_a_step(seed in any::<u64>(), steps in 1usize..400) {
            let mut show = BurstSequencer::with_rng(
                BurstSettings { spawn_probability: 0.5, ..BurstSettings::default() },
                String::new(),
                seeded_rng(seed),
            );
            show.start(VIEW, || {});
            for _ in 0..steps {
                show.step();
                for shell in show.projectiles() {
                    prop_assert!(!shell.is_spent());
                    for p in shell.particles() {
                        prop_assert!(p.alpha > 0.0 && p.alpha <= 1.0);
                    }
                }
            }
        }
    }
}
