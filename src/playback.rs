// src/playback.rs - Authoritative time cursor shared by video, plots and insights
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Paused,
    Running,
}

/// What a running clock does once the cursor reaches the end of the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndBehavior {
    /// Clamp to the end and pause.
    Stop,
    /// Hold the last instant for one tick, then restart from zero.
    Loop,
}

/// Owns the playback cursor and the play/pause mode.
///
/// The three input channels (free-running ticks, manual seeks and reset) all
/// funnel through this type, so the cursor is always in `[0, duration]`.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    cursor: f64,
    mode: PlaybackMode,
    duration: f64,
    step: f64,
    end_behavior: EndBehavior,
}

impl PlaybackClock {
    /// `step` is the fixed logical advance per tick (usually `1 / fps`).
    pub fn new(duration: f64, step: f64) -> Self {
        debug_assert!(duration > 0.0, "duration must be positive");
        debug_assert!(step >= 0.0, "tick step must not be negative");
        Self {
            cursor: 0.0,
            mode: PlaybackMode::Paused,
            duration,
            step,
            end_behavior: EndBehavior::Stop,
        }
    }

    pub fn with_end_behavior(mut self, end_behavior: EndBehavior) -> Self {
        self.end_behavior = end_behavior;
        self
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode == PlaybackMode::Running
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn end_behavior(&self) -> EndBehavior {
        self.end_behavior
    }

    pub fn set_end_behavior(&mut self, end_behavior: EndBehavior) {
        self.end_behavior = end_behavior;
    }

    pub fn toggle_play(&mut self) {
        self.mode = match self.mode {
            PlaybackMode::Paused => PlaybackMode::Running,
            PlaybackMode::Running => PlaybackMode::Paused,
        };
    }

    pub fn reset(&mut self) {
        self.mode = PlaybackMode::Paused;
        self.cursor = 0.0;
    }

    /// Moves the cursor to `t` (clamped) and pauses playback.
    ///
    /// Seeking to the current cursor does nothing, not even pausing: the
    /// timeline slider reports its value on every frame and must not keep
    /// interrupting playback. Returns whether the cursor moved.
    pub fn seek(&mut self, t: f64) -> bool {
        if t.is_nan() {
            return false;
        }
        let t = t.clamp(0.0, self.duration);
        if t == self.cursor {
            return false;
        }
        self.cursor = t;
        self.mode = PlaybackMode::Paused;
        true
    }

    /// Advances a running clock by `dt`. Paused clocks ignore ticks.
    pub fn tick(&mut self, dt: f64) {
        debug_assert!(dt >= 0.0, "tick step must not be negative");
        if self.mode != PlaybackMode::Running {
            return;
        }

        if self.cursor >= self.duration {
            match self.end_behavior {
                EndBehavior::Stop => {
                    self.cursor = self.duration;
                    self.mode = PlaybackMode::Paused;
                }
                EndBehavior::Loop => self.cursor = 0.0,
            }
            return;
        }

        let next = self.cursor + dt;
        if next >= self.duration {
            self.cursor = self.duration;
            if self.end_behavior == EndBehavior::Stop {
                self.mode = PlaybackMode::Paused;
            }
        } else {
            self.cursor = next;
        }
    }

    /// Ticks by the configured step.
    pub fn advance(&mut self) {
        self.tick(self.step);
    }

    /// Row of a `table_size`-row table that spans the whole duration.
    pub fn sample_index(&self, table_size: usize) -> usize {
        if table_size == 0 {
            return 0;
        }
        let raw = (self.cursor * table_size as f64 / self.duration).floor();
        (raw.max(0.0) as usize).min(table_size - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPS: f64 = 30.0;

    fn clock() -> PlaybackClock {
        PlaybackClock::new(6.0, 1.0 / FPS)
    }

    fn running_at(cursor: f64) -> PlaybackClock {
        let mut clock = clock();
        clock.seek(cursor);
        clock.toggle_play();
        clock
    }

    #[test]
    fn starts_paused_at_zero() {
        let clock = clock();
        assert_eq!(clock.cursor(), 0.0);
        assert_eq!(clock.mode(), PlaybackMode::Paused);
    }

    #[test]
    fn toggle_flips_mode_without_moving_cursor() {
        let mut clock = clock();
        clock.seek(1.5);
        clock.toggle_play();
        assert!(clock.is_running());
        assert_eq!(clock.cursor(), 1.5);
        clock.toggle_play();
        assert_eq!(clock.mode(), PlaybackMode::Paused);
        assert_eq!(clock.cursor(), 1.5);
    }

    #[test]
    fn seek_sets_cursor_and_pauses_from_any_mode() {
        for t in [0.25, 1.0, 2.2, 3.0, 5.99, 6.0] {
            let mut paused = clock();
            paused.seek(t);
            assert_eq!(paused.cursor(), t);
            assert_eq!(paused.mode(), PlaybackMode::Paused);

            let mut running = running_at(0.1);
            assert!(running.seek(t));
            assert_eq!(running.cursor(), t);
            assert_eq!(running.mode(), PlaybackMode::Paused);
        }
    }

    #[test]
    fn seek_clamps_out_of_domain_values() {
        let mut clock = clock();
        clock.seek(42.0);
        assert_eq!(clock.cursor(), 6.0);
        clock.seek(-3.0);
        assert_eq!(clock.cursor(), 0.0);
        clock.seek(f64::INFINITY);
        assert_eq!(clock.cursor(), 6.0);
    }

    #[test]
    fn seek_to_current_cursor_is_a_no_op() {
        let mut clock = running_at(2.0);
        assert!(!clock.seek(2.0));
        assert!(clock.is_running());
        assert_eq!(clock.cursor(), 2.0);
    }

    #[test]
    fn seek_ignores_nan() {
        let mut clock = running_at(2.0);
        assert!(!clock.seek(f64::NAN));
        assert_eq!(clock.cursor(), 2.0);
        assert!(clock.is_running());
    }

    #[test]
    fn reset_always_returns_to_paused_zero() {
        let mut clock = running_at(4.0);
        clock.advance();
        clock.reset();
        assert_eq!(clock.cursor(), 0.0);
        assert_eq!(clock.mode(), PlaybackMode::Paused);

        clock.reset();
        assert_eq!(clock.cursor(), 0.0);
        assert_eq!(clock.mode(), PlaybackMode::Paused);
    }

    #[test]
    fn ticks_advance_by_step_until_the_end() {
        let mut clock = running_at(0.5);
        let dt = 1.0 / FPS;
        let mut previous = clock.cursor();
        let mut ticks = 0;
        while clock.is_running() {
            clock.tick(dt);
            ticks += 1;
            if clock.is_running() {
                assert!((clock.cursor() - previous - dt).abs() < 1e-9);
            }
            assert!(clock.cursor() > previous);
            assert!(clock.cursor() <= 6.0);
            previous = clock.cursor();
            assert!(ticks < 1_000, "clock never stopped");
        }
        assert_eq!(clock.cursor(), 6.0);
        assert_eq!(clock.mode(), PlaybackMode::Paused);

        clock.tick(dt);
        assert_eq!(clock.cursor(), 6.0);
        assert_eq!(clock.mode(), PlaybackMode::Paused);
    }

    #[test]
    fn tick_near_end_clamps_and_pauses() {
        let mut clock = running_at(5.99);
        clock.tick(1.0 / FPS);
        assert_eq!(clock.cursor(), 6.0);
        assert_eq!(clock.mode(), PlaybackMode::Paused);
    }

    #[test]
    fn tick_while_paused_is_ignored() {
        let mut clock = clock();
        clock.seek(1.0);
        clock.tick(0.5);
        assert_eq!(clock.cursor(), 1.0);
    }

    #[test]
    fn running_at_end_pauses_on_next_tick() {
        let mut clock = clock();
        clock.seek(6.0);
        clock.toggle_play();
        clock.advance();
        assert_eq!(clock.cursor(), 6.0);
        assert_eq!(clock.mode(), PlaybackMode::Paused);
    }

    #[test]
    fn loop_holds_the_end_then_wraps() {
        let mut clock = running_at(5.99).with_end_behavior(EndBehavior::Loop);
        clock.advance();
        assert_eq!(clock.cursor(), 6.0);
        assert!(clock.is_running());

        clock.advance();
        assert_eq!(clock.cursor(), 0.0);
        assert!(clock.is_running());

        clock.advance();
        assert!((clock.cursor() - 1.0 / FPS).abs() < 1e-12);
    }

    #[test]
    fn sample_index_matches_reference_scenario() {
        let mut clock = clock();
        clock.seek(3.0);
        assert_eq!(clock.sample_index(181), 90);
    }

    #[test]
    fn sample_index_is_monotonic_and_bounded() {
        let mut clock = clock();
        let mut last = 0;
        for i in 0..=600 {
            clock.seek(i as f64 * 0.01);
            let index = clock.sample_index(181);
            assert!(index < 181);
            assert!(index >= last);
            last = index;
        }
        assert_eq!(last, 180);
        assert_eq!(clock.sample_index(0), 0);
        assert_eq!(clock.sample_index(1), 0);
    }
}
