//! Time management utilities

use std::time::{Duration, Instant};

/// Frame time handed to every update and draw callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameTime {
    elapsed: Duration,
    total: Duration,
    frame: u64,
}

impl GameTime {
    /// Create a frame time value
    pub fn new(elapsed: Duration, total: Duration, frame: u64) -> Self {
        Self { elapsed, total, frame }
    }

    /// Frame time for the `frame`-th step of a fixed-step loop
    pub fn fixed(step: Duration, frame: u64) -> Self {
        let steps = u32::try_from(frame).unwrap_or(u32::MAX);
        Self::new(step, step.saturating_mul(steps), frame)
    }

    /// Time since the previous frame
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time since the previous frame in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Total time since the clock started
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Frame index, starting at 1 for the first tick
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// Frame clock producing [`GameTime`] values
///
/// `tick` measures wall-clock time; `advance` steps by a fixed amount, which
/// keeps simulations and tests deterministic.
#[derive(Debug, Clone)]
pub struct GameClock {
    last_tick: Instant,
    elapsed: Duration,
    total: Duration,
    frame: u64,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GameClock {
    /// Create a new clock starting now
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            elapsed: Duration::ZERO,
            total: Duration::ZERO,
            frame: 0,
        }
    }

    /// Advance by the wall-clock time since the previous tick
    pub fn tick(&mut self) -> GameTime {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.step(elapsed)
    }

    /// Advance by a fixed step, ignoring the wall clock
    pub fn advance(&mut self, step: Duration) -> GameTime {
        self.last_tick = Instant::now();
        self.step(step)
    }

    fn step(&mut self, elapsed: Duration) -> GameTime {
        self.elapsed = elapsed;
        self.total += elapsed;
        self.frame += 1;
        self.current()
    }

    /// Time of the most recent frame
    pub fn current(&self) -> GameTime {
        GameTime::new(self.elapsed, self.total, self.frame)
    }

    /// Number of frames produced so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Average FPS since the clock started
    pub fn average_fps(&self) -> f32 {
        let total = self.total.as_secs_f32();
        if total > 0.0 {
            self.frame as f32 / total
        } else {
            0.0
        }
    }

    /// FPS based on the most recent frame
    pub fn current_fps(&self) -> f32 {
        let elapsed = self.elapsed.as_secs_f32();
        if elapsed > 0.0 {
            1.0 / elapsed
        } else {
            0.0
        }
    }
}
