//! LED panel output.
//!
//! [`Matrix`] is the raw 8x8 device. [`Lights`] builds the flashes, swirls and
//! activity indicator on top of it.

pub mod headless;
pub mod lights;
#[cfg(feature = "hardware")]
pub mod ws2812;

pub use headless::HeadlessMatrix;
pub use lights::Lights;

use remind_core::alert::GRID_SIZE;
use smart_leds::RGB8;

use crate::error::DisplayError;

/// Pixels on the panel
pub const PIXEL_COUNT: usize = (GRID_SIZE as usize) * (GRID_SIZE as usize);

/// An 8x8 grid of RGB pixels. Writes are buffered until [`Matrix::show`].
pub trait Matrix {
    /// Set one pixel in the frame buffer. Out-of-range coordinates are ignored.
    fn set_pixel(&mut self, x: u8, y: u8, color: RGB8);

    /// Push the frame buffer to the device.
    fn show(&mut self) -> Result<(), DisplayError>;

    /// Turn every pixel off and push.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Global brightness, 0.0 to 1.0
    fn set_brightness(&mut self, level: f32);
}

/// Row-major frame buffer index for (x, y).
pub(crate) fn buffer_index(x: u8, y: u8) -> Option<usize> {
    if x < GRID_SIZE && y < GRID_SIZE {
        Some(usize::from(y) * usize::from(GRID_SIZE) + usize::from(x))
    } else {
        None
    }
}

/// Index along the LED chain for (x, y) when rows snake back and forth.
pub(crate) fn serpentine_index(x: u8, y: u8) -> Option<usize> {
    if x >= GRID_SIZE || y >= GRID_SIZE {
        return None;
    }
    let row = usize::from(y) * usize::from(GRID_SIZE);
    let col = if y % 2 == 0 {
        usize::from(x)
    } else {
        usize::from(GRID_SIZE - 1 - x)
    };
    Some(row + col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_index_bounds() {
        assert_eq!(buffer_index(0, 0), Some(0));
        assert_eq!(buffer_index(7, 7), Some(63));
        assert_eq!(buffer_index(8, 0), None);
        assert_eq!(buffer_index(0, 8), None);
    }

    #[test]
    fn test_serpentine_rows_alternate() {
        assert_eq!(serpentine_index(0, 0), Some(0));
        assert_eq!(serpentine_index(7, 0), Some(7));
        assert_eq!(serpentine_index(7, 1), Some(8));
        assert_eq!(serpentine_index(0, 1), Some(15));
        assert_eq!(serpentine_index(0, 2), Some(16));
        assert_eq!(serpentine_index(8, 2), None);
    }

    #[test]
    fn test_serpentine_covers_every_led_once() {
        let mut seen = [false; PIXEL_COUNT];
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                let i = serpentine_index(x, y).unwrap();
                assert!(!seen[i]);
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }
}
