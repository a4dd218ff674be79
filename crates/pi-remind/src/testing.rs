//! Test doubles for the polling loop and the light patterns.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use remind_core::CalendarEvent;
use smart_leds::RGB8;

use crate::display::{buffer_index, Matrix, PIXEL_COUNT};
use crate::error::{DisplayError, QueryError};
use crate::source::{CalendarSource, Clock, EventQuery};

pub type Frame = [RGB8; PIXEL_COUNT];

/// Matrix that keeps every pushed frame.
#[derive(Debug, Clone)]
pub struct RecordingMatrix {
    pending: Frame,
    frames: Vec<Frame>,
    brightness: f32,
    fail_writes: bool,
}

impl Default for RecordingMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingMatrix {
    pub fn new() -> Self {
        Self {
            pending: [RGB8::default(); PIXEL_COUNT],
            frames: Vec::new(),
            brightness: 1.0,
            fail_writes: false,
        }
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Pixel in the most recent frame
    pub fn pixel(&self, x: u8, y: u8) -> Option<RGB8> {
        let i = buffer_index(x, y)?;
        self.last_frame().map(|frame| frame[i])
    }

    pub fn lit_count(&self) -> usize {
        self.last_frame()
            .map(|frame| frame.iter().filter(|p| **p != RGB8::default()).count())
            .unwrap_or(0)
    }

    /// Whether any frame had every pixel set to `color`
    pub fn showed_full(&self, color: RGB8) -> bool {
        self.frames.iter().any(|f| f.iter().all(|p| *p == color))
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }
}

impl Matrix for RecordingMatrix {
    fn set_pixel(&mut self, x: u8, y: u8, color: RGB8) {
        if let Some(i) = buffer_index(x, y) {
            self.pending[i] = color;
        }
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        if self.fail_writes {
            return Err(DisplayError::Write("simulated failure".to_string()));
        }
        self.frames.push(self.pending);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.pending = [RGB8::default(); PIXEL_COUNT];
        self.show()
    }

    fn set_brightness(&mut self, level: f32) {
        self.brightness = level;
    }
}

/// Clock moved by hand. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

type Scripted = Result<Vec<CalendarEvent>, QueryError>;

#[derive(Debug, Default)]
struct SourceState {
    responses: VecDeque<Scripted>,
    queries: Vec<EventQuery>,
    delay: Option<Duration>,
}

/// Calendar that answers from a queue of canned responses.
///
/// Once the queue is empty it answers with an empty list. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    state: Arc<Mutex<SourceState>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_events(&self, events: Vec<CalendarEvent>) {
        self.state.lock().unwrap().responses.push_back(Ok(events));
    }

    pub fn push_error(&self, error: QueryError) {
        self.state.lock().unwrap().responses.push_back(Err(error));
    }

    /// Make every answer take `delay` (tokio time)
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn query_count(&self) -> usize {
        self.state.lock().unwrap().queries.len()
    }

    pub fn queries(&self) -> Vec<EventQuery> {
        self.state.lock().unwrap().queries.clone()
    }
}

#[async_trait]
impl CalendarSource for ScriptedSource {
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<CalendarEvent>, QueryError> {
        let (response, delay) = {
            let mut state = self.state.lock().unwrap();
            state.queries.push(query.clone());
            (state.responses.pop_front(), state.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response.unwrap_or_else(|| Ok(Vec::new()))
    }
}
