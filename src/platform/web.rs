//! Browser canvas surface and `requestAnimationFrame` loop

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::Viewport;
use crate::renderer::{Rgba, Surface, TextStyle};
use crate::sim::{Animation, FrameLoop, FrameOutcome};

type FrameCallback = Closure<dyn FnMut(f64)>;

/// [`Surface`] backed by a canvas 2D context
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("2d context unavailable")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Look up a canvas by element id
    pub fn from_element_id(id: &str) -> Result<Self, JsValue> {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .ok_or_else(|| JsValue::from_str(&format!("no element #{}", id)))?
            .dyn_into::<HtmlCanvasElement>()?;
        Self::new(canvas)
    }

    /// Match the backing store to the window size
    pub fn fit_to_window(&self) -> Viewport {
        let (w, h) = web_sys::window()
            .map(|w| {
                let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
                let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
                (width, height)
            })
            .unwrap_or((0.0, 0.0));
        self.canvas.set_width(w.max(0.0) as u32);
        self.canvas.set_height(h.max(0.0) as u32);
        self.viewport()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (f32, f32) {
        (self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn clear(&mut self) {
        let (w, h) = self.size();
        self.ctx.clear_rect(0.0, 0.0, w as f64, h as f64);
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx
            .fill_rect(origin.x as f64, origin.y as f64, size.x as f64, size.y as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            radius.max(0.0) as f64,
            0.0,
            std::f64::consts::TAU,
        );
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill();
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    fn fill_text(&mut self, text: &str, center: Vec2, style: &TextStyle) {
        self.ctx.save();
        self.ctx.set_font(&format!("bold {}px sans-serif", style.size));
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        if let Some(glow) = style.glow {
            self.ctx.set_shadow_color(&glow.to_css());
            self.ctx.set_shadow_blur(20.0);
        }
        self.ctx.set_fill_style_str(&style.color.to_css());
        let _ = self.ctx.fill_text(text, center.x as f64, center.y as f64);
        self.ctx.restore();
    }
}

/// An animation bound to the canvas it draws on
pub struct Stage<A> {
    pub animation: A,
    pub surface: CanvasSurface,
    frame_loop: FrameLoop,
}

impl<A: Animation> Stage<A> {
    pub fn new(animation: A, surface: CanvasSurface) -> Self {
        Self {
            animation,
            surface,
            frame_loop: FrameLoop::new(),
        }
    }

    /// Forget frame timing, e.g. before a new show
    pub fn restart_timing(&mut self) {
        self.frame_loop.restart();
    }

    /// Ignore any frame that still arrives
    pub fn stop(&mut self) {
        self.frame_loop.stop();
    }

    fn frame(&mut self, now_ms: f64) -> FrameOutcome {
        self.frame_loop
            .frame(now_ms, &mut self.animation, &mut self.surface)
    }
}

/// Owns the pending frame request and the callback that services it.
///
/// `stop` (or drop) cancels the pending request and releases the callback,
/// and with it the only reference the loop held to its [`Stage`]. It must be
/// called from outside the frame callback.
pub struct AnimationLoop {
    raf_id: Rc<Cell<Option<i32>>>,
    callback: Rc<RefCell<Option<FrameCallback>>>,
}

impl AnimationLoop {
    /// Start requesting frames for `stage`
    pub fn start<A: Animation + 'static>(stage: Rc<RefCell<Stage<A>>>) -> Result<Self, JsValue> {
        let raf_id = Rc::new(Cell::new(None));
        let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));

        let pending = raf_id.clone();
        let this = Rc::downgrade(&callback);
        let closure = FrameCallback::new(move |time: f64| {
            pending.set(None);

            let outcome = match stage.try_borrow_mut() {
                Ok(mut stage) => stage.frame(time),
                Err(_) => {
                    log::warn!("Stage busy, skipping frame");
                    FrameOutcome::Continue
                }
            };
            if outcome != FrameOutcome::Continue {
                log::debug!("Animation loop ended: {:?}", outcome);
                return;
            }

            let Some(slot) = this.upgrade() else {
                return;
            };
            if let Some(next) = slot.borrow().as_ref() {
                match request_frame(next) {
                    Ok(id) => pending.set(Some(id)),
                    Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
                }
            }
        });

        raf_id.set(Some(request_frame(&closure)?));
        *callback.borrow_mut() = Some(closure);

        Ok(Self { raf_id, callback })
    }

    /// Cancel the pending frame and release the callback. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(id) = self.raf_id.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        self.callback.borrow_mut().take();
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn request_frame(callback: &FrameCallback) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or("no window")?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}
