//! Math Arcade entry point
//!
//! On the web this boots the Asteroid Field screen on `#canvas` and drives it
//! from `requestAnimationFrame`. Natively it plays a short headless round.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent};

    use math_arcade::audio::{AudioManager, SoundEffect};
    use math_arcade::config::GameConfig;
    use math_arcade::consts::MAX_FRAME_MS;
    use math_arcade::game::AsteroidField;
    use math_arcade::platform::{HtmlImageLoader, ImageCache, InputSource};
    use math_arcade::renderer::CanvasRenderer;

    /// Keys the page must not scroll on
    const CAPTURED_KEYS: [&str; 5] = [" ", "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"];

    struct Game {
        config: GameConfig,
        input: Rc<InputSource>,
        field: AsteroidField,
        loader: HtmlImageLoader,
        renderer: CanvasRenderer,
        audio: AudioManager,
        last_time: f64,
    }

    impl Game {
        fn new(config: GameConfig, renderer: CanvasRenderer, images: ImageCache) -> Self {
            let input = Rc::new(InputSource::new());
            let loader = HtmlImageLoader::new(images);
            let field = AsteroidField::new(config.clone(), input.clone(), seed());
            wasm_bindgen_futures::spawn_local(field.load(&loader));
            Self {
                config,
                input,
                field,
                loader,
                renderer,
                audio: AudioManager::new(),
                last_time: 0.0,
            }
        }

        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) as f32).min(MAX_FRAME_MS)
            } else {
                0.0
            };
            self.last_time = time;
            self.input.set_now(time);

            if let Err(err) = self.field.update(dt) {
                log::error!("Frame aborted: {}", err);
            }
            for feedback in self.field.drain_feedback() {
                self.audio.play(SoundEffect::from(feedback));
            }
        }

        fn render(&self) {
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            self.renderer.resize(dpr);
            self.renderer.render(&self.field);
        }

        /// Replace the finished screen with a fresh one. Sprites are already
        /// cached, so the reload resolves almost immediately.
        fn restart(&mut self) {
            self.field.dispose();
            self.input.release_all();
            self.field = AsteroidField::new(self.config.clone(), self.input.clone(), seed());
            wasm_bindgen_futures::spawn_local(self.field.load(&self.loader));
            log::info!("Restarted");
        }
    }

    fn seed() -> u64 {
        js_sys::Date::now() as u64
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Math Arcade starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let config = GameConfig::load();
        let images: ImageCache = Rc::new(RefCell::new(HashMap::new()));
        let renderer = CanvasRenderer::new(canvas, images.clone(), config.arena.size())
            .expect("canvas 2d context");

        let game = Rc::new(RefCell::new(Game::new(config, renderer, images)));

        setup_input_handlers(game.clone());
        setup_focus_handlers(game.clone());

        request_animation_frame(game);
        log::info!("Math Arcade running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                if CAPTURED_KEYS.contains(&key.as_str()) {
                    event.prevent_default();
                }

                let mut g = game.borrow_mut();
                g.audio.resume();
                if key == "Enter" && g.field.is_game_over() {
                    g.restart();
                    return;
                }
                g.input.key_down(&key);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow().input.key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Keys held while focus leaves never get a keyup; drop them all.
    fn setup_focus_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow().input.release_all();
                    log::info!("Keys released (tab hidden)");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow().input.release_all();
                log::info!("Keys released (window blur)");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::rc::Rc;

    use futures::executor::block_on;
    use math_arcade::config::GameConfig;
    use math_arcade::game::AsteroidField;
    use math_arcade::platform::{InputSource, PresetLoader};

    env_logger::init();
    log::info!("Math Arcade (native) starting...");
    log::info!("Native mode runs a headless round - build for wasm32 to play");

    let config = GameConfig::load();
    let loader = PresetLoader::new()
        .with_image(&config.player.sprite_url, 64.0, 64.0)
        .with_image(&config.projectile.sprite_url, 6.0, 24.0)
        .with_image(&config.asteroid.sprite_url, 72.0, 72.0);

    let input = Rc::new(InputSource::new());
    let mut field = AsteroidField::new(config, input.clone(), 0x5eed);
    block_on(field.load(&loader));

    // Sixty seconds at 60 fps, holding fire and sweeping left and right
    let dt = 1000.0 / 60.0;
    input.key_down("space");
    for frame in 0..3600u32 {
        input.set_now(f64::from(frame) * f64::from(dt));
        let (release, press) = if (frame / 120) % 2 == 0 {
            ("ArrowRight", "ArrowLeft")
        } else {
            ("ArrowLeft", "ArrowRight")
        };
        input.key_up(release);
        input.key_down(press);

        if let Err(err) = field.update(dt) {
            log::error!("Frame {} aborted: {}", frame, err);
        }
        field.drain_feedback();
        if field.is_game_over() {
            log::info!("Game over after {:.1} s", f64::from(frame) * f64::from(dt) / 1000.0);
            break;
        }
    }

    let score = field.score();
    println!(
        "Score {} | lives {} | correct {} | wrong {} | missed {}",
        score.points, score.lives, score.correct_hits, score.wrong_hits, score.misses
    );
    field.dispose();
}
