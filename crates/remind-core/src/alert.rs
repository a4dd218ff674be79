//! Colours and the visual treatment played for each urgency band.

use std::time::Duration;

use smart_leds::hsv::{hsv2rgb, Hsv};
use smart_leds::RGB8;

use crate::urgency::Urgency;

pub const RED: RGB8 = RGB8::new(255, 0, 0);
pub const GREEN: RGB8 = RGB8::new(0, 255, 0);
pub const BLUE: RGB8 = RGB8::new(0, 0, 255);
pub const ORANGE: RGB8 = RGB8::new(255, 153, 0);
pub const WHITE: RGB8 = RGB8::new(255, 255, 255);
pub const YELLOW: RGB8 = RGB8::new(255, 255, 0);
pub const OFF: RGB8 = RGB8::new(0, 0, 0);

/// Activity pixel while a query is in flight
pub const CHECKING_COLOR: RGB8 = BLUE;
/// Activity pixel after a successful query
pub const SUCCESS_COLOR: RGB8 = GREEN;
/// Full-panel flash and activity pixel after a failed query
pub const FAILURE_COLOR: RGB8 = RED;

/// Panel edge length
pub const GRID_SIZE: u8 = 8;

const FLASH_DELAY: Duration = Duration::from_millis(250);
const SWIRL_FRAME_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Light every pixel `count` times, `delay` on then `delay` off
    Flash {
        color: RGB8,
        count: u32,
        delay: Duration,
    },
    /// Rotating colour field, one frame per `frame_delay`
    Swirl { frames: u32, frame_delay: Duration },
}

/// What the panel shows once an event has been classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub pattern: Pattern,
    /// Colour the activity pixel keeps until the next poll
    pub indicator: RGB8,
}

impl Alert {
    /// The swirl lengthens by 100 frames for every minute closer to the start.
    pub fn for_urgency(urgency: Urgency, minutes: i64) -> Self {
        match urgency {
            Urgency::Far => Alert {
                pattern: Pattern::Flash {
                    color: WHITE,
                    count: 1,
                    delay: FLASH_DELAY,
                },
                indicator: WHITE,
            },
            Urgency::Near => Alert {
                pattern: Pattern::Flash {
                    color: YELLOW,
                    count: 2,
                    delay: FLASH_DELAY,
                },
                indicator: YELLOW,
            },
            Urgency::Imminent => {
                let frames = 4i64.saturating_sub(minutes.max(0)).max(1) * 100;
                Alert {
                    pattern: Pattern::Swirl {
                        frames: u32::try_from(frames).unwrap_or(u32::MAX),
                        frame_delay: SWIRL_FRAME_DELAY,
                    },
                    indicator: ORANGE,
                }
            }
        }
    }
}

fn clamp_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Colour of pixel (x, y) in swirl frame `step`.
pub fn swirl_pixel(x: u8, y: u8, step: u32) -> RGB8 {
    let x = f64::from(x) - 4.0;
    let y = f64::from(y) - 4.0;

    let dist = (x * x + y * y).sqrt() / 2.0;
    let angle = f64::from(step) / 10.0 + dist * 1.5;
    let (s, c) = angle.sin_cos();

    let xs = x * c - y * s;
    let ys = x * s + y * c;

    let r = (xs + ys).abs() * 64.0 - 20.0;
    RGB8::new(
        clamp_channel(r),
        clamp_channel(r + s * 130.0),
        clamp_channel(r + c * 130.0),
    )
}

/// Warm random sparkle colour for a sample `value` in `0.0..=1.0`.
pub fn sparkle(value: f32) -> RGB8 {
    let value = value.clamp(0.0, 1.0);
    hsv2rgb(Hsv {
        hue: (0.1 * value * 255.0) as u8,
        sat: 204,
        val: (value * 255.0) as u8,
    })
}
