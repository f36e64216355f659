//! greeting-fx entry point
//!
//! In the browser this mounts the ambient background and wires the
//! celebrate button to the firework show. Natively it plays both
//! headlessly against a recording surface and prints a summary.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlElement, MouseEvent};

    use greeting_fx::platform::{AnimationLoop, CanvasSurface, Stage};
    use greeting_fx::renderer::Surface;
    use greeting_fx::sim::{AmbientField, BurstSequencer};
    use greeting_fx::{Settings, seeded_rng};

    type ClickHandler = Closure<dyn FnMut(MouseEvent)>;

    /// The firework overlay and whatever is driving it
    struct Show {
        stage: Rc<RefCell<Stage<BurstSequencer>>>,
        layer: HtmlElement,
        animation: Option<AnimationLoop>,
        acknowledge: Option<ClickHandler>,
    }

    impl Show {
        /// Stop the frame loop and detach the acknowledgement listener
        fn halt(&mut self) {
            if let Some(animation) = self.animation.take() {
                animation.stop();
            }
            self.stage.borrow_mut().stop();
            if let Some(handler) = self.acknowledge.take() {
                if let Some(window) = web_sys::window() {
                    let _ = window
                        .remove_event_listener_with_callback("click", handler.as_ref().unchecked_ref());
                }
            }
        }
    }

    /// Page-level state shared by the event listeners
    struct App {
        background: Rc<RefCell<Stage<AmbientField>>>,
        background_loop: Option<AnimationLoop>,
        show: Show,
    }

    impl App {
        fn teardown(&mut self) {
            if let Some(animation) = self.background_loop.take() {
                animation.stop();
            }
            {
                let mut background = self.background.borrow_mut();
                background.stop();
                background.animation.teardown();
            }
            self.show.halt();
            self.show.stage.borrow_mut().animation.teardown();
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        log::info!("greeting-fx starting with seed {}", seed);

        if let Err(e) = mount(&settings, seed) {
            log::error!("Failed to mount: {:?}", e);
        }
    }

    fn mount(settings: &Settings, seed: u64) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let surface = CanvasSurface::from_element_id("background-canvas")?;
        let viewport = surface.fit_to_window();
        let field = AmbientField::initialize(viewport, &settings.resolved_ambient(), &mut seeded_rng(seed));
        let background = Rc::new(RefCell::new(Stage::new(field, surface)));
        let background_loop = AnimationLoop::start(background.clone())?;

        let layer = document
            .get_element_by_id("fireworks-layer")
            .ok_or("no element #fireworks-layer")?
            .dyn_into::<HtmlElement>()?;
        set_visible(&layer, false)?;
        let sequencer = BurstSequencer::new(settings, seed.wrapping_add(1));
        let surface = CanvasSurface::from_element_id("fireworks-canvas")?;
        let show = Show {
            stage: Rc::new(RefCell::new(Stage::new(sequencer, surface))),
            layer,
            animation: None,
            acknowledge: None,
        };

        let app = Rc::new(RefCell::new(App {
            background,
            background_loop: Some(background_loop),
            show,
        }));

        // Resize: refit the background, keep its particles
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let app = app.borrow();
                let mut stage = app.background.borrow_mut();
                let viewport = stage.surface.fit_to_window();
                stage.animation.on_resize(viewport);
            });
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Celebrate button
        {
            let button = document
                .get_element_by_id("celebrate-btn")
                .ok_or("no element #celebrate-btn")?;
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                if let Err(e) = start_show(&app) {
                    log::error!("Failed to start show: {:?}", e);
                }
            });
            button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Page unload
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().teardown();
            });
            window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn start_show(app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let mut app_ref = app.borrow_mut();
        let show = &mut app_ref.show;
        show.halt();
        set_visible(&show.layer, true)?;

        {
            let weak = Rc::downgrade(app);
            let mut stage = show.stage.borrow_mut();
            let viewport = stage.surface.fit_to_window();
            stage.restart_timing();
            // Deferred so the sequencer is no longer borrowed when the show is torn down
            stage.animation.start(viewport, move || {
                wasm_bindgen_futures::spawn_local(async move {
                    if let Some(app) = weak.upgrade() {
                        finish_show(&app);
                    }
                });
            });
        }
        show.animation = Some(AnimationLoop::start(show.stage.clone())?);

        let weak = Rc::downgrade(app);
        let handler = ClickHandler::new(move |_event: MouseEvent| {
            let Some(app) = weak.upgrade() else {
                return;
            };
            let app = app.borrow();
            if app.show.stage.borrow_mut().animation.acknowledge() {
                log::info!("Message acknowledged");
            }
        });
        window.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
        show.acknowledge = Some(handler);

        Ok(())
    }

    fn finish_show(app: &Rc<RefCell<App>>) {
        let mut app = app.borrow_mut();
        app.show.halt();
        {
            let mut stage = app.show.stage.borrow_mut();
            stage.animation.teardown();
            stage.surface.clear();
        }
        if let Err(e) = set_visible(&app.show.layer, false) {
            log::warn!("Failed to hide fireworks layer: {:?}", e);
        }
        log::info!("Firework show finished");
    }

    fn set_visible(element: &HtmlElement, visible: bool) -> Result<(), JsValue> {
        element
            .style()
            .set_property("display", if visible { "block" } else { "none" })
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    web_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("greeting-fx (native) starting...");
    log::info!("Native mode runs headless - use `trunk serve` for the web version");

    let path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let settings = greeting_fx::Settings::load_from(path.as_deref());
    headless::run(&settings);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::Cell;
    use std::rc::Rc;

    use greeting_fx::renderer::RecordingSurface;
    use greeting_fx::sim::{AmbientField, BurstPhase, BurstSequencer, FrameLoop};
    use greeting_fx::{Settings, Viewport, seeded_rng};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up on a show after this many frames
    const MAX_FRAMES: u32 = 60 * 30;
    const SEED: u64 = 0x5eed;

    pub fn run(settings: &Settings) {
        let viewport = Viewport::new(1280.0, 720.0);
        let mut surface = RecordingSurface::new(viewport.width, viewport.height);

        let mut field = AmbientField::initialize(viewport, &settings.resolved_ambient(), &mut seeded_rng(SEED));
        let mut frames = FrameLoop::new();
        for i in 0..120 {
            surface.take();
            frames.frame(i as f64 * FRAME_MS, &mut field, &mut surface);
        }
        println!(
            "Ambient: {} particles, {} links in the last frame",
            field.len(),
            surface.lines().count()
        );
        field.teardown();

        let completed = Rc::new(Cell::new(false));
        let flag = completed.clone();
        let mut show = BurstSequencer::new(settings, SEED);
        show.start(viewport, move || flag.set(true));

        let mut frames = FrameLoop::new();
        let mut peak_particles = 0;
        let mut frame = 0;
        while show.phase() == BurstPhase::Running && frame < MAX_FRAMES {
            surface.take();
            frames.frame(frame as f64 * FRAME_MS, &mut show, &mut surface);
            peak_particles = peak_particles.max(show.particle_count());
            frame += 1;
        }

        println!(
            "Show: {:?} after {:.2}s ({} frames, {} steps), peak {} particles",
            show.phase(),
            show.elapsed().as_secs_f32(),
            frames.frames(),
            frames.steps(),
            peak_particles
        );

        if show.acknowledge() {
            println!("Acknowledged, completion callback fired: {}", completed.get());
        } else {
            println!("Show never reached the acknowledgement phase");
        }
    }
}
