//! Sound boundary. The page exposes a global `playSound(name)` hook that
//! owns the AudioContext (it can only start from a user gesture, which the
//! page handles). Calls are fire-and-forget: the engine never waits on or
//! inspects the result, and a missing hook is silently fine.

/// Sound played on upgrades, swaps, and rewards.
pub const SOUND_UPGRADE: &str = "upgrade";

/// Ambient cow sound.
pub const SOUND_MOO: &str = "moo";

#[cfg(target_arch = "wasm32")]
pub fn play_sound(name: &str) {
    use wasm_bindgen::JsCast;

    let Some(window) = web_sys::window() else { return };
    let Ok(hook) = js_sys::Reflect::get(&window, &"playSound".into()) else {
        return;
    };
    let Some(func) = hook.dyn_ref::<js_sys::Function>() else {
        return;
    };
    let _ = func.call1(&wasm_bindgen::JsValue::NULL, &name.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn play_sound(_name: &str) {}
