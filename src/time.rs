//! Frame clock and cooperative scheduling primitives.
//!
//! `draw_web()` fires at ~60fps with a variable delta. `FrameClock` turns
//! wall-clock timestamps into bounded frame deltas, and each recurring
//! concern (engine tick, persistence flush, ambient roll) runs off its own
//! `PeriodicTask` so no two cadences share a timer. `OneShot` covers
//! single deferred events like the referral verification delay.

/// Current wall clock in epoch milliseconds.
pub fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as f64)
            .unwrap_or(0.0)
    }
}

/// Converts frame timestamps into clamped deltas.
///
/// Long gaps (backgrounded tab) are clamped; catching up on real elapsed
/// time is the offline-earnings path's job, not the live loop's.
pub struct FrameClock {
    last_timestamp: Option<f64>,
    /// Largest delta handed to the simulation per frame (ms).
    max_delta_ms: f64,
}

impl FrameClock {
    pub fn new(max_delta_ms: f64) -> Self {
        Self {
            last_timestamp: None,
            max_delta_ms,
        }
    }

    /// Feed a wall-clock timestamp; returns the bounded delta since the
    /// previous frame. The first frame yields zero.
    pub fn frame(&mut self, now_ms: f64) -> f64 {
        let delta = match self.last_timestamp {
            Some(prev) => (now_ms - prev).clamp(0.0, self.max_delta_ms),
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);
        delta
    }
}

/// A fixed-interval task driven by frame deltas, accumulator style.
pub struct PeriodicTask {
    interval_ms: f64,
    accumulator: f64,
    active: bool,
}

impl PeriodicTask {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            accumulator: 0.0,
            active: true,
        }
    }

    /// Advance by `delta_ms`; returns how many intervals elapsed.
    pub fn advance(&mut self, delta_ms: f64) -> u32 {
        if !self.active {
            return 0;
        }
        self.accumulator += delta_ms;
        let fires = (self.accumulator / self.interval_ms) as u32;
        self.accumulator -= fires as f64 * self.interval_ms;
        fires
    }

    /// Stop the task permanently.
    #[allow(dead_code)]
    pub fn cancel(&mut self) {
        self.active = false;
        self.accumulator = 0.0;
    }
}

/// A single deferred firing.
pub struct OneShot {
    remaining_ms: f64,
    fired: bool,
}

impl OneShot {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            remaining_ms: delay_ms,
            fired: false,
        }
    }

    /// Advance by `delta_ms`; returns true exactly once, when the delay
    /// elapses.
    pub fn advance(&mut self, delta_ms: f64) -> bool {
        if self.fired {
            return false;
        }
        self.remaining_ms -= delta_ms;
        if self.remaining_ms <= 0.0 {
            self.fired = true;
            return true;
        }
        false
    }
}
