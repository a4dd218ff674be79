//! WS2812 panel wired to the Raspberry Pi SPI0 MOSI pin.

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use smart_leds::{brightness, gamma, SmartLedsWrite, RGB8};
use ws2812_spi::Ws2812;

use super::{serpentine_index, Matrix, PIXEL_COUNT};
use crate::error::DisplayError;

/// ws2812-spi encodes each data bit as SPI bits; it expects 2 to 3.8 MHz.
const SPI_CLOCK_HZ: u32 = 3_800_000;

pub struct Ws2812Matrix {
    leds: Ws2812<Spi>,
    pending: [RGB8; PIXEL_COUNT],
    brightness: u8,
}

impl Ws2812Matrix {
    pub fn open() -> Result<Self, DisplayError> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(|e| DisplayError::Open(e.to_string()))?;
        tracing::info!("Opened WS2812 panel on SPI0 at {} Hz", SPI_CLOCK_HZ);

        Ok(Self {
            leds: Ws2812::new(spi),
            pending: [RGB8::default(); PIXEL_COUNT],
            brightness: u8::MAX,
        })
    }
}

impl Matrix for Ws2812Matrix {
    fn set_pixel(&mut self, x: u8, y: u8, color: RGB8) {
        if let Some(i) = serpentine_index(x, y) {
            self.pending[i] = color;
        }
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        let frame = brightness(gamma(self.pending.iter().copied()), self.brightness);
        self.leds
            .write(frame)
            .map_err(|e| DisplayError::Write(format!("{:?}", e)))
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.pending = [RGB8::default(); PIXEL_COUNT];
        self.show()
    }

    fn set_brightness(&mut self, level: f32) {
        self.brightness = (level.clamp(0.0, 1.0) * f32::from(u8::MAX)).round() as u8;
    }
}
