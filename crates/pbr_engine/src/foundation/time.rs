//! Frame timing
//!
//! The demo animates from a normalized timer that loops over [0, 1) instead of
//! raw wall-clock time. Pausing freezes the timer but not the frame delta, so
//! the camera keeps moving while lights stand still.

use std::time::{Duration, Instant};

/// Default speed of the normalized timer, in loops per second
pub const DEFAULT_TIMER_SPEED: f32 = 0.25;

/// Per-frame delta tracking plus the looping animation timer
#[derive(Debug, Clone)]
pub struct FrameTimer {
    timer: f32,
    timer_speed: f32,
    paused: bool,
    last_frame: Instant,
    frame_delta: f32,
    fps_window_start: Instant,
    frames_in_window: u32,
    last_fps: u32,
}

impl FrameTimer {
    /// Create a timer advancing `timer_speed` loops per second
    pub fn new(timer_speed: f32) -> Self {
        let now = Instant::now();
        Self {
            timer: 0.0,
            timer_speed,
            paused: false,
            last_frame: now,
            frame_delta: 0.0,
            fps_window_start: now,
            frames_in_window: 0,
            last_fps: 0,
        }
    }

    /// Measure the time since the previous tick and advance the animation timer
    ///
    /// Returns the frame delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(delta.as_secs_f32());

        self.frames_in_window += 1;
        if now.duration_since(self.fps_window_start) >= Duration::from_secs(1) {
            self.last_fps = self.frames_in_window;
            self.frames_in_window = 0;
            self.fps_window_start = now;
            log::debug!("{} fps (timer {:.3})", self.last_fps, self.timer);
        }

        self.frame_delta
    }

    /// Advance by an explicit delta in seconds
    pub fn advance(&mut self, delta_seconds: f32) {
        self.frame_delta = delta_seconds;
        if !self.paused {
            self.timer = (self.timer + self.timer_speed * delta_seconds).rem_euclid(1.0);
        }
    }

    /// Current animation timer in [0, 1)
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Jump the animation timer to a given value
    pub fn set_timer(&mut self, timer: f32) {
        self.timer = timer.rem_euclid(1.0);
    }

    /// Animation speed in loops per second
    pub fn timer_speed(&self) -> f32 {
        self.timer_speed
    }

    /// Delta of the most recent frame in seconds
    pub fn frame_delta(&self) -> f32 {
        self.frame_delta
    }

    /// Frames counted over the last full second
    pub fn fps(&self) -> u32 {
        self.last_fps
    }

    /// Whether animation is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume animation
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Flip the pause flag and return the new state
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMER_SPEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_timer_advances_by_speed() {
        let mut timer = FrameTimer::new(0.0625);
        timer.advance(2.0);
        assert_relative_eq!(timer.timer(), 0.125);
        assert_relative_eq!(timer.frame_delta(), 2.0);
    }

    #[test]
    fn test_timer_wraps_past_one() {
        let mut timer = FrameTimer::new(0.5);
        timer.advance(1.5);
        assert_relative_eq!(timer.timer(), 0.75);
        timer.advance(1.0);
        assert_relative_eq!(timer.timer(), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_timer_wraps_long_stalls() {
        let mut timer = FrameTimer::new(0.5);
        timer.advance(6.5);
        assert_relative_eq!(timer.timer(), 0.25);

        let mut timer = FrameTimer::new(0.5);
        timer.advance(2.0);
        assert_eq!(timer.timer(), 0.0);
    }

    #[test]
    fn test_paused_timer_keeps_delta_but_not_time() {
        let mut timer = FrameTimer::new(0.25);
        timer.advance(1.0);
        timer.set_paused(true);
        timer.advance(3.0);

        assert_relative_eq!(timer.timer(), 0.25);
        assert_relative_eq!(timer.frame_delta(), 3.0);
        assert!(!timer.toggle_pause());
    }

    #[test]
    fn test_set_timer_wraps_into_range() {
        let mut timer = FrameTimer::default();
        timer.set_timer(1.25);
        assert_relative_eq!(timer.timer(), 0.25);
        timer.set_timer(-0.25);
        assert_relative_eq!(timer.timer(), 0.75);
    }
}
