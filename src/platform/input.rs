//! Keyboard state tracker
//!
//! Constructed once at composition time and handed to whatever reads input.
//! Browser key listeners feed it with `key_down`/`key_up`; the frame loop
//! stamps it with the frame time so debounced presses can measure cooldowns.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Canonical form of a key name: lowercase, with the space bar spelled `"space"`.
pub fn normalize_key(name: &str) -> String {
    match name {
        " " | "Spacebar" | "Space" | "space" => "space".to_string(),
        other => other.to_lowercase(),
    }
}

#[derive(Debug, Default)]
struct KeyState {
    down: HashSet<String>,
    /// Time of the last successful `consume_press`, per held key
    last_fired: HashMap<String, f64>,
    now_ms: f64,
}

/// Held-key set plus per-key press debounce
#[derive(Debug, Default)]
pub struct InputSource {
    state: RefCell<KeyState>,
}

impl InputSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&self, name: &str) {
        self.state.borrow_mut().down.insert(normalize_key(name));
    }

    /// Releasing a key also resets its debounce
    pub fn key_up(&self, name: &str) {
        let key = normalize_key(name);
        let mut state = self.state.borrow_mut();
        state.down.remove(&key);
        state.last_fired.remove(&key);
    }

    /// Drop every held key (window blur, screen switch)
    pub fn release_all(&self) {
        let mut state = self.state.borrow_mut();
        state.down.clear();
        state.last_fired.clear();
    }

    /// Current frame timestamp in milliseconds
    pub fn set_now(&self, now_ms: f64) {
        self.state.borrow_mut().now_ms = now_ms;
    }

    pub fn now(&self) -> f64 {
        self.state.borrow().now_ms
    }

    /// Unknown key names are simply not pressed
    pub fn is_key_pressed(&self, name: &str) -> bool {
        self.state.borrow().down.contains(&normalize_key(name))
    }

    pub fn is_any_key_pressed<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().any(|n| self.is_key_pressed(n.as_ref()))
    }

    /// Debounced press: true on the first check while `name` is held, then
    /// again only once `cooldown_ms` has passed since the last true.
    pub fn consume_press(&self, name: &str, cooldown_ms: f64) -> bool {
        let key = normalize_key(name);
        let mut state = self.state.borrow_mut();
        if !state.down.contains(&key) {
            return false;
        }

        let now = state.now_ms;
        let ready = match state.last_fired.get(&key) {
            None => true,
            Some(&fired_at) => now - fired_at >= cooldown_ms,
        };
        if ready {
            state.last_fired.insert(key, now);
        }
        ready
    }
}
