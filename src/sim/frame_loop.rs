//! Fixed-timestep frame driver
//!
//! The host calls [`FrameLoop::frame`] once per display refresh with the
//! refresh timestamp. Elapsed time is accumulated and spent in whole
//! [`SIM_STEP`]s, then the animation is rendered once. Every step in a frame
//! finishes before anything is drawn.

use crate::consts::{MAX_FRAME_GAP, MAX_SUBSTEPS, SIM_STEP};
use crate::renderer::Surface;

/// Something the frame loop can advance and draw
pub trait Animation {
    /// Advance by one fixed step
    fn step(&mut self);

    /// Draw the current state
    fn render(&self, surface: &mut dyn Surface);

    /// Once true the host should stop requesting frames
    fn is_finished(&self) -> bool {
        false
    }
}

/// What the host should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Request another frame
    Continue,
    /// The animation is done; stop requesting frames
    Finished,
    /// The loop was stopped; nothing was simulated or drawn
    Stopped,
}

/// Accumulator state for one running animation
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    accumulator: f32,
    last_time: Option<f64>,
    stopped: bool,
    frames: u64,
    steps: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the steps owed since the last frame, then render
    pub fn frame<A: Animation + ?Sized>(
        &mut self,
        now_ms: f64,
        animation: &mut A,
        surface: &mut dyn Surface,
    ) -> FrameOutcome {
        if self.stopped {
            return FrameOutcome::Stopped;
        }

        let step = SIM_STEP.as_secs_f32();
        let dt = match self.last_time {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => step,
        };
        self.last_time = Some(now_ms);
        self.accumulator += dt.clamp(0.0, MAX_FRAME_GAP);

        let mut substeps = 0;
        while self.accumulator >= step && substeps < MAX_SUBSTEPS {
            animation.step();
            self.accumulator -= step;
            self.steps += 1;
            substeps += 1;

            if animation.is_finished() {
                self.accumulator = 0.0;
                break;
            }
        }

        if surface.is_drawable() {
            animation.render(surface);
        }
        self.frames += 1;

        if animation.is_finished() {
            FrameOutcome::Finished
        } else {
            FrameOutcome::Continue
        }
    }

    /// Stop driving; later frames are ignored
    pub fn stop(&mut self) {
        if !self.stopped {
            log::debug!("Frame loop stopped after {} frames / {} steps", self.frames, self.steps);
        }
        self.stopped = true;
    }

    /// Forget timing history so the next frame starts fresh
    pub fn restart(&mut self) {
        *self = Self::default();
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingSurface;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Probe {
        steps: u32,
        finish_after: Option<u32>,
        log: RefCell<Vec<&'static str>>,
    }

    impl Animation for Probe {
        fn step(&mut self) {
            self.steps += 1;
            self.log.borrow_mut().push("step");
        }

        fn render(&self, _surface: &mut dyn Surface) {
            self.log.borrow_mut().push("render");
        }

        fn is_finished(&self) -> bool {
            self.finish_after.is_some_and(|n| self.steps >= n)
        }
    }

    const FRAME_MS: f64 = 1000.0 / 60.0;

    #[test]
    fn test_one_step_per_refresh() {
        let mut frame_loop = FrameLoop::new();
        let mut probe = Probe::default();
        let mut surface = RecordingSurface::new(100.0, 100.0);

        for i in 0..60 {
            let outcome = frame_loop.frame(i as f64 * FRAME_MS, &mut probe, &mut surface);
            assert_eq!(outcome, FrameOutcome::Continue);
        }
        assert!((59..=61).contains(&probe.steps), "steps = {}", probe.steps);
        assert_eq!(frame_loop.frames(), 60);
    }

    #[test]
    fn test_steps_precede_render() {
        let mut frame_loop = FrameLoop::new();
        let mut probe = Probe::default();
        let mut surface = RecordingSurface::new(100.0, 100.0);

        frame_loop.frame(0.0, &mut probe, &mut surface);
        probe.log.borrow_mut().clear();
        frame_loop.frame(4.0 * FRAME_MS, &mut probe, &mut surface);

        let log = probe.log.borrow();
        assert_eq!(log.last(), Some(&"render"));
        assert_eq!(log.iter().filter(|e| **e == "render").count(), 1);
        assert!(log.iter().filter(|e| **e == "step").count() >= 3);
    }

    #[test]
    fn test_long_gap_is_clamped() {
        let mut frame_loop = FrameLoop::new();
        let mut probe = Probe::default();
        let mut surface = RecordingSurface::new(100.0, 100.0);

        frame_loop.frame(0.0, &mut probe, &mut surface);
        let before = probe.steps;
        // Tab was hidden for ten seconds
        frame_loop.frame(10_000.0, &mut probe, &mut surface);
        let taken = probe.steps - before;
        assert!(taken <= 6, "took {} steps", taken);
        assert!(taken as u32 <= MAX_SUBSTEPS);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let mut frame_loop = FrameLoop::new();
        let mut probe = Probe::default();
        let mut surface = RecordingSurface::new(100.0, 100.0);

        frame_loop.frame(1000.0, &mut probe, &mut surface);
        let before = probe.steps;
        frame_loop.frame(500.0, &mut probe, &mut surface);
        assert_eq!(probe.steps, before);
    }

    #[test]
    fn test_zero_area_surface_skips_render() {
        let mut frame_loop = FrameLoop::new();
        let mut probe = Probe::default();
        let mut surface = RecordingSurface::new(0.0, 480.0);

        frame_loop.frame(0.0, &mut probe, &mut surface);
        assert_eq!(probe.steps, 1);
        assert!(!probe.log.borrow().contains(&"render"));
    }

    #[test]
    fn test_finished_and_stopped() {
        let mut frame_loop = FrameLoop::new();
        let mut probe = Probe {
            finish_after: Some(2),
            ..Default::default()
        };
        let mut surface = RecordingSurface::new(10.0, 10.0);

        assert_eq!(frame_loop.frame(0.0, &mut probe, &mut surface), FrameOutcome::Continue);
        assert_eq!(frame_loop.frame(5.0 * FRAME_MS, &mut probe, &mut surface), FrameOutcome::Finished);
        assert_eq!(probe.steps, 2);

        frame_loop.stop();
        frame_loop.stop();
        assert_eq!(frame_loop.frame(10.0 * FRAME_MS, &mut probe, &mut surface), FrameOutcome::Stopped);
        assert_eq!(probe.steps, 2);

        frame_loop.restart();
        assert_eq!(frame_loop.frame(11.0 * FRAME_MS, &mut probe, &mut surface), FrameOutcome::Finished);
    }
}
