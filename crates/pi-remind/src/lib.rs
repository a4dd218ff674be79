//! Pi Remind: a Raspberry Pi LED panel that lights up before calendar events.
//!
//! The binary polls Google Calendar once a minute, picks the next event that
//! has a reminder and plays a white, yellow or swirling pattern on an 8x8
//! panel depending on how soon it starts.

pub mod calendar_client;
pub mod config;
pub mod display;
pub mod error;
pub mod service;
pub mod source;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use service::{LoopExit, LoopSettings, LoopState, Reminder, TickOutcome};
