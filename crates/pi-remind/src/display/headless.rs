use smart_leds::RGB8;

use super::{buffer_index, Matrix, PIXEL_COUNT};
use crate::error::DisplayError;

/// Frame buffer with no device behind it. Pushed frames go to the trace log.
#[derive(Debug, Clone)]
pub struct HeadlessMatrix {
    pending: [RGB8; PIXEL_COUNT],
    shown: [RGB8; PIXEL_COUNT],
    brightness: f32,
    frames: u64,
}

impl Default for HeadlessMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessMatrix {
    pub fn new() -> Self {
        Self {
            pending: [RGB8::default(); PIXEL_COUNT],
            shown: [RGB8::default(); PIXEL_COUNT],
            brightness: 1.0,
            frames: 0,
        }
    }

    /// Colour of (x, y) in the last pushed frame
    pub fn pixel(&self, x: u8, y: u8) -> Option<RGB8> {
        buffer_index(x, y).map(|i| self.shown[i])
    }

    pub fn lit_count(&self) -> usize {
        self.shown.iter().filter(|p| **p != RGB8::default()).count()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }
}

impl Matrix for HeadlessMatrix {
    fn set_pixel(&mut self, x: u8, y: u8, color: RGB8) {
        if let Some(i) = buffer_index(x, y) {
            self.pending[i] = color;
        }
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        self.shown = self.pending;
        self.frames += 1;
        tracing::trace!("frame {}: {} pixels lit", self.frames, self.lit_count());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.pending = [RGB8::default(); PIXEL_COUNT];
        self.show()
    }

    fn set_brightness(&mut self, level: f32) {
        self.brightness = level.clamp(0.0, 1.0);
    }
}
