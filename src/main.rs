//! Claw Machine entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, Event, MessageEvent, MouseEvent, PointerEvent};

    use claw_machine::platform::{self, HostMessage};
    use claw_machine::renderer::DomSurface;
    use claw_machine::sim::Button;
    use claw_machine::{Catalog, Engine, Settings, SpeedPreset};

    const CATALOG_URL: &str = "toys.json";
    /// Longest stretch of time simulated for one frame (tab switches, stalls)
    const MAX_FRAME_MS: f64 = 250.0;

    /// Game instance holding all state
    struct Game {
        engine: Engine<DomSurface>,
        last_time: f64,
        /// Sub-millisecond remainder carried to the next frame
        carry_ms: f64,
    }

    impl Game {
        /// Advance by one animation frame
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (time - self.last_time).clamp(0.0, MAX_FRAME_MS)
            } else {
                0.0
            };
            self.last_time = time;

            self.carry_ms += dt;
            let whole = self.carry_ms.floor();
            self.carry_ms -= whole;
            if whole >= 1.0 {
                self.engine.advance(whole as u64);
            }
            self.notify_host();
        }

        fn notify_host(&mut self) {
            for event in self.engine.drain_events() {
                platform::post_to_parent(&event);
            }
        }
    }

    fn query_param(name: &str) -> Option<String> {
        web_sys::window()
            .and_then(|w| w.location().search().ok())
            .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
            .and_then(|params| params.get(name))
    }

    /// Starting turn budget from `?turns=N`; the host may overwrite it later
    fn initial_turns() -> i32 {
        query_param("turns")
            .and_then(|turns| turns.parse().ok())
            .unwrap_or(0)
    }

    /// Stored settings, with `?speed=` overriding and persisting the preset
    fn load_settings() -> Settings {
        let mut settings = Settings::load();
        if let Some(speed) = query_param("speed") {
            match SpeedPreset::from_str(&speed) {
                Some(preset) if preset != settings.preset => {
                    settings.preset = preset;
                    settings.save();
                }
                Some(_) => {}
                None => log::warn!("Unknown speed preset `{}`", speed),
            }
        }
        settings
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Claw Machine starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document, cannot start");
            return;
        };
        let Some(surface) = DomSurface::new("machine") else {
            log::error!("No #machine container, cannot start");
            return;
        };

        let settings = load_settings();
        log::info!("Speed preset: {}", settings.preset.as_str());

        let catalog = Catalog::fetch_or_empty(CATALOG_URL).await;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let seed = js_sys::Date::now() as u64;
        let turns = initial_turns();
        let mut engine = Engine::new(catalog, turns, seed, settings.timing(), surface);

        let parts = engine.session().parts;
        let surface = engine.surface_mut();
        surface.bind(parts.rail, "rail");
        surface.bind(parts.joint, "joint");
        surface.bind(parts.arm, "arm");
        surface.bind_claw("claw");
        engine.redraw();

        log::info!("Game initialized with seed: {}, turns: {}", seed, turns);

        let game = Rc::new(RefCell::new(Game {
            engine,
            last_time: 0.0,
            carry_ms: 0.0,
        }));

        setup_button(&document, "btn-horizontal", Button::Horizontal, game.clone());
        setup_button(&document, "btn-vertical", Button::Vertical, game.clone());
        setup_toy_clicks(&document, game.clone());
        setup_host_messages(game.clone());
        setup_teardown(game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Claw Machine running!");
    }

    /// Momentary button: pointer down presses, any way of letting go releases
    fn setup_button(
        document: &web_sys::Document,
        element_id: &str,
        button: Button,
        game: Rc<RefCell<Game>>,
    ) {
        let Some(el) = document.get_element_by_id(element_id) else {
            log::warn!("No #{} button", element_id);
            return;
        };

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                g.engine.press(button);
                g.notify_host();
            });
            let _ = el
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for kind in ["pointerup", "pointerleave", "pointercancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                let mut g = game.borrow_mut();
                g.engine.release(button);
                g.notify_host();
            });
            let _ = el.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Clicks anywhere in the machine resolve to the toy element under them
    fn setup_toy_clicks(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        let Some(container) = document.get_element_by_id("machine") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let spawn_index = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest("[data-spawn-index]").ok().flatten())
                .and_then(|el| el.get_attribute("data-spawn-index"))
                .and_then(|index| index.parse::<usize>().ok());
            if let Some(spawn_index) = spawn_index {
                let mut g = game.borrow_mut();
                g.engine.click_toy(spawn_index);
                g.notify_host();
            }
        });
        let _ = container.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_host_messages(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MessageEvent| {
            match HostMessage::from_js(&event.data()) {
                Ok(message) => game.borrow_mut().engine.handle_host_message(&message),
                Err(e) => log::warn!("Bad host message: {}", e),
            }
        });
        let _ = window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_teardown(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
            game.borrow_mut().engine.teardown();
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            if g.engine.session().is_torn_down() {
                return;
            }
            g.update(time);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Claw Machine (native) starting...");
    log::info!("Native mode plays one scripted cycle - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    demo_cycle(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one grab cycle over a freshly spawned cavity and report the outcome
#[cfg(not(target_arch = "wasm32"))]
fn demo_cycle(seed: u64) {
    use std::collections::BTreeMap;

    use claw_machine::renderer::RecordingSurface;
    use claw_machine::sim::{Button, ToyVisual};
    use claw_machine::{Catalog, Engine, Settings, ToyMeta};

    let entries: BTreeMap<String, ToyMeta> = [("bear", 60.0, 40.0), ("duck", 44.0, 36.0)]
        .into_iter()
        .map(|(id, w, h)| {
            let meta = ToyMeta {
                w,
                h,
                sprite_width: w,
                sprite_height: h,
                sprite_top: 0.0,
                sprite_left: 0.0,
                mime_type: "image/png".into(),
                sprite_normal: String::new(),
                sprite_grabbed: None,
                sprite_collected: None,
            };
            (id.to_string(), meta)
        })
        .collect();

    let settings = Settings::load();
    let mut engine = Engine::new(
        Catalog::new(entries),
        1,
        seed,
        settings.timing(),
        RecordingSurface::new(),
    );

    engine.press(Button::Horizontal);
    engine.advance(1_200);
    engine.release(Button::Horizontal);
    engine.press(Button::Vertical);
    engine.advance(1_000);
    engine.release(Button::Vertical);
    engine.advance(60_000);

    let selected = engine
        .session()
        .toys
        .iter()
        .find(|t| t.visual == ToyVisual::Selected)
        .map(|t| t.spawn_index);
    match selected {
        Some(index) => {
            engine.click_toy(index);
            println!("Won a toy from slot {}", index);
        }
        None => println!("Missed"),
    }
    for event in engine.drain_events() {
        claw_machine::platform::post_to_parent(&event);
        println!("Event: {:?}", event);
    }
    println!(
        "Turns left: {}, placements applied: {}",
        engine.session().remaining_turns,
        engine.surface().placement_writes
    );
}
