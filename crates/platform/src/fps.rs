//! Frame-rate accounting: counts frames and recomputes once per second.

use std::time::{Duration, Instant};

const UPDATE_INTERVAL: Duration = Duration::from_secs(1);

pub struct FpsCounter {
    frames: u32,
    window_start: Instant,
    fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frames: 0,
            window_start: Instant::now(),
            fps: 0.0,
        }
    }

    /// Record one rendered frame. Returns the refreshed rate once per
    /// update interval, `None` otherwise.
    pub fn frame(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed < UPDATE_INTERVAL {
            return None;
        }
        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = Instant::now();
        Some(self.fps)
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[cfg(test)]
    fn rewind(&mut self, by: Duration) {
        self.window_start -= by;
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
