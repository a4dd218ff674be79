use std::time::{Duration, SystemTime, UNIX_EPOCH};

use oorandom::Rand32;
use remind_core::alert::{sparkle, swirl_pixel, GREEN, GRID_SIZE, OFF};
use remind_core::{Alert, Pattern};
use smart_leds::RGB8;
use tokio::time::sleep;

use super::Matrix;
use crate::error::DisplayError;

/// Patterns drawn on a [`Matrix`].
///
/// Device write failures are logged and otherwise ignored: a glitching panel
/// must never stop the calendar from being polled.
pub struct Lights<M: Matrix> {
    matrix: M,
    rng: Rand32,
}

impl<M: Matrix> Lights<M> {
    pub fn new(matrix: M) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(666);
        Self::with_seed(matrix, seed)
    }

    pub fn with_seed(matrix: M, seed: u64) -> Self {
        Self {
            matrix,
            rng: Rand32::new(seed),
        }
    }

    pub fn matrix(&self) -> &M {
        &self.matrix
    }

    pub fn set_brightness(&mut self, level: f32) {
        self.matrix.set_brightness(level);
    }

    pub fn off(&mut self) {
        let result = self.matrix.clear();
        log_failure(result);
    }

    /// Light every pixel in one colour.
    pub fn set_all(&mut self, color: RGB8) {
        self.fill(color);
        let result = self.matrix.show();
        log_failure(result);
    }

    /// Light every pixel `count` times, holding each state for `delay`.
    pub async fn flash_all(&mut self, count: u32, delay: Duration, color: RGB8) {
        for _ in 0..count {
            self.set_all(color);
            sleep(delay).await;
            self.off();
            sleep(delay).await;
        }
    }

    /// Clear the panel and light only pixel `index` of the bottom row.
    pub fn set_activity_light(&mut self, index: u8, color: RGB8) {
        self.fill(OFF);
        self.matrix.set_pixel(index, 0, color);
        let result = self.matrix.show();
        log_failure(result);
    }

    /// Rotating colour field for `frames` frames, then everything off.
    pub async fn swirl(&mut self, frames: u32, frame_delay: Duration) {
        for step in 0..frames {
            for y in 0..GRID_SIZE {
                for x in 0..GRID_SIZE {
                    self.matrix.set_pixel(x, y, swirl_pixel(x, y, step));
                }
            }
            let result = self.matrix.show();
            log_failure(result);
            sleep(frame_delay).await;
        }
        self.off();
    }

    /// Random warm sparkle, used as a start-up light show.
    pub async fn flash_random(&mut self, count: u32, delay: Duration) {
        for _ in 0..count {
            for y in 0..GRID_SIZE {
                for x in 0..GRID_SIZE {
                    let color = sparkle(self.rng.rand_float());
                    self.matrix.set_pixel(x, y, color);
                }
            }
            let result = self.matrix.show();
            log_failure(result);
            sleep(delay).await;
            self.off();
            sleep(delay).await;
        }
    }

    /// Start-up light show: sparkle, then a green flash to prove every pixel works.
    pub async fn startup(&mut self, brightness: f32) {
        self.set_brightness(brightness);
        self.flash_random(5, Duration::from_millis(100)).await;
        self.flash_all(1, Duration::from_secs(1), GREEN).await;
    }

    /// Play the flash or swirl for an alert. The activity pixel is left to the caller.
    pub async fn play(&mut self, alert: &Alert) {
        match alert.pattern {
            Pattern::Flash {
                color,
                count,
                delay,
            } => self.flash_all(count, delay, color).await,
            Pattern::Swirl {
                frames,
                frame_delay,
            } => self.swirl(frames, frame_delay).await,
        }
    }

    fn fill(&mut self, color: RGB8) {
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                self.matrix.set_pixel(x, y, color);
            }
        }
    }
}

fn log_failure(result: Result<(), DisplayError>) {
    if let Err(e) = result {
        tracing::warn!("LED update failed: {}", e);
    }
}
