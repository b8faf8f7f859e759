//! Particle Toybox entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_toy {
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{DeviceOrientationEvent, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use particle_toybox::consts::SIM_DT;
    use particle_toybox::renderer::{self, RenderState, VertexBatch};
    use particle_toybox::sim::{Caster, FrameInput, InputEvent, Rect, Scene, TapStyle, tick};
    use particle_toybox::{FrameClock, Settings};

    /// Largest tilt angle that maps to full gravity (degrees)
    const MAX_TILT_DEG: f64 = 45.0;
    /// Radius of the blocker dropped with the caster key
    const CASTER_RADIUS: f32 = 40.0;

    /// Toy instance holding all state
    struct Toy {
        scene: Scene,
        render_state: Option<RenderState>,
        clock: FrameClock,
        input: FrameInput,
        batch: VertexBatch,
        pointer: Option<Vec2>,
    }

    impl Toy {
        fn new(seed: u64, bounds: Rect, settings: &Settings) -> Self {
            Self {
                scene: Scene::new(seed, bounds, settings),
                render_state: None,
                clock: FrameClock::new(),
                input: FrameInput::default(),
                batch: VertexBatch::new(),
                pointer: None,
            }
        }

        /// Run simulation ticks; queued input goes to the first one
        fn update(&mut self, time: f64) {
            let substeps = self.clock.advance(time);
            for _ in 0..substeps {
                tick(&mut self.scene, &self.input, SIM_DT);
                self.input.clear();
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            renderer::draw_scene(&self.scene, &mut self.batch);

            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.batch) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let view = render_state.view;
                        render_state.resize(render_state.size.0, render_state.size.1, view);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        fn set_tap_style(&mut self, style: TapStyle) {
            let settings = Settings {
                tap_style: style,
                ..self.scene.settings.clone()
            };
            self.scene.apply_settings(&settings);
            settings.save();
            log::info!("Tap style: {}", style.as_str());
        }
    }

    fn pointer_pos(event: &PointerEvent) -> Vec2 {
        Vec2::new(event.offset_x() as f32, event.offset_y() as f32)
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Particle Toybox starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Scene runs in CSS pixels, the surface in device pixels
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        let bounds = Rect::from_size(client_w as f32, client_h as f32);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let toy = Rc::new(RefCell::new(Toy::new(seed, bounds, &settings)));

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height, bounds).await {
            Ok(render_state) => toy.borrow_mut().render_state = Some(render_state),
            // Keep simulating; the canvas just stays blank
            Err(e) => log::warn!("{}; rendering disabled", e),
        }

        setup_pointer_handlers(&canvas, toy.clone());
        setup_keyboard(toy.clone())?;
        setup_tilt(toy.clone())?;
        setup_visibility(toy.clone())?;

        request_animation_frame(toy);

        log::info!("Particle Toybox running!");
        Ok(())
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, toy: Rc<RefCell<Toy>>) {
        // Press: tap with pen/touch pressure as intensity
        {
            let toy = toy.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let mut t = toy.borrow_mut();
                let pos = pointer_pos(&event);
                // Mice report 0.5 while pressed
                let pressure = event.pressure();
                let intensity = if event.pointer_type() == "mouse" || pressure <= 0.0 {
                    1.0
                } else {
                    pressure * 2.0
                };
                t.pointer = Some(pos);
                t.input.push(InputEvent::Tap { pos, intensity });
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Move while pressed: drag stroke
        {
            let toy = toy.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut t = toy.borrow_mut();
                let Some(last) = t.pointer else {
                    return;
                };
                let pos = pointer_pos(&event);
                t.pointer = Some(pos);
                t.input.push(InputEvent::Drag {
                    pos,
                    delta: pos - last,
                });
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Release
        for name in ["pointerup", "pointercancel", "pointerleave"] {
            let toy = toy.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                toy.borrow_mut().pointer = None;
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(toy: Rc<RefCell<Toy>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let mut t = toy.borrow_mut();
            let center = t.scene.bounds.center();
            match event.key().as_str() {
                "r" | "R" | "Escape" => t.input.push(InputEvent::Reset),
                "b" | "B" => {
                    let pos = t.pointer.unwrap_or(center);
                    t.input.push(InputEvent::Ball {
                        pos,
                        vel: Vec2::ZERO,
                    });
                }
                "l" | "L" => {
                    let pos = t.pointer.unwrap_or(center);
                    t.input.push(InputEvent::Light { pos });
                }
                "c" | "C" => {
                    let center = t.pointer.unwrap_or(center);
                    t.input.push(InputEvent::Caster(Caster::Circle {
                        center,
                        radius: CASTER_RADIUS,
                    }));
                }
                "1" => t.set_tap_style(TapStyle::Simple),
                "2" => t.set_tap_style(TapStyle::Standard),
                "3" => t.set_tap_style(TapStyle::Fancy),
                _ => {}
            }
        });
        window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    /// Device tilt steers gravity; angles are clamped to ±45° and scaled to [-1, 1]
    fn setup_tilt(toy: Rc<RefCell<Toy>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::<dyn FnMut(_)>::new(move |event: DeviceOrientationEvent| {
            let (Some(gamma), Some(beta)) = (event.gamma(), event.beta()) else {
                return;
            };
            let norm = |deg: f64| (deg.clamp(-MAX_TILT_DEG, MAX_TILT_DEG) / MAX_TILT_DEG) as f32;
            toy.borrow_mut().input.push(InputEvent::Tilt {
                x: norm(gamma),
                y: norm(beta),
            });
        });
        window.add_event_listener_with_callback(
            "deviceorientation",
            closure.as_ref().unchecked_ref(),
        )?;
        closure.forget();
        Ok(())
    }

    /// A hidden tab stops rAF; forget the gap instead of replaying it
    fn setup_visibility(toy: Rc<RefCell<Toy>>) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("no document")?;
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Visible {
                toy.borrow_mut().clock.reset();
                log::debug!("Clock reset after tab became visible");
            }
        });
        document.add_event_listener_with_callback(
            "visibilitychange",
            closure.as_ref().unchecked_ref(),
        )?;
        closure.forget();
        Ok(())
    }

    fn request_animation_frame(toy: Rc<RefCell<Toy>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame_loop(toy, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(toy: Rc<RefCell<Toy>>, time: f64) {
        {
            let mut t = toy.borrow_mut();
            t.update(time);
            t.render();
        }

        request_animation_frame(toy);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_toy::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Particle Toybox (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted two-second session through every toy, logging what the core does
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use glam::Vec2;
    use particle_toybox::consts::SIM_DT;
    use particle_toybox::renderer::{self, VertexBatch};
    use particle_toybox::sim::{BrushTool, Caster, FrameInput, InputEvent, Placement, Rect, Scene, tick};
    use particle_toybox::{FrameClock, Settings};

    let settings = Settings::load();
    let bounds = Rect::from_size(800.0, 600.0);
    let mut scene = Scene::new(2024, bounds, &settings);
    let mut clock = FrameClock::new();
    let mut batch = VertexBatch::new();

    let script = |frame: u64| -> Vec<InputEvent> {
        let center = bounds.center();
        match frame {
            0 => vec![
                InputEvent::Tap {
                    pos: center,
                    intensity: 1.0,
                },
                InputEvent::Wall {
                    points: vec![Vec2::new(50.0, 500.0), Vec2::new(400.0, 560.0), Vec2::new(750.0, 500.0)],
                },
                InputEvent::Place(Placement::Bumper(Vec2::new(400.0, 350.0))),
                InputEvent::Ball {
                    pos: Vec2::new(380.0, 100.0),
                    vel: Vec2::new(40.0, 0.0),
                },
            ],
            20 => (1..=10)
                .map(|combo| InputEvent::Combo { pos: center, combo })
                .collect(),
            40 => vec![InputEvent::Drag {
                pos: Vec2::new(200.0, 200.0),
                delta: Vec2::new(12.0, 4.0),
            }],
            60 => vec![InputEvent::Brush {
                tool: BrushTool::Shake,
                pos: center,
                radius: 200.0,
                strength: 150.0,
            }],
            80 => vec![
                InputEvent::Light {
                    pos: Vec2::new(100.0, 100.0),
                },
                InputEvent::Caster(Caster::Circle {
                    center: Vec2::new(300.0, 300.0),
                    radius: 40.0,
                }),
            ],
            100 => vec![InputEvent::Tilt { x: 0.5, y: 0.5 }],
            _ => Vec::new(),
        }
    };

    let mut input = FrameInput::default();
    for frame in 0..120u64 {
        let now_ms = frame as f64 * 1000.0 / 60.0;
        input.events.extend(script(frame));
        for _ in 0..clock.advance(now_ms) {
            let stats = tick(&mut scene, &input, SIM_DT);
            input.clear();
            if stats.spawned > 0 || stats.contacts > 0 {
                log::debug!(
                    "frame {}: +{} -{} particles, {} contacts",
                    scene.frame,
                    stats.spawned,
                    stats.removed,
                    stats.contacts
                );
            }
        }

        renderer::draw_scene(&scene, &mut batch);
        if frame % 30 == 0 {
            log::info!(
                "t={:.2}s particles={} rings={} balls={} vertices={}",
                scene.time,
                scene.pool.len(),
                scene.ripples.len(),
                scene.table.bodies.len(),
                batch.len()
            );
        }
    }

    log::info!(
        "Demo finished: {} particles live, {} evicted",
        scene.pool.len(),
        scene.pool.evicted_total()
    );
}
