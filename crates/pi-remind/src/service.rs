//! The reminder polling loop.
//!
//! Every tick compares the wall-clock minute with the last one processed. On a
//! rollover the calendar is queried once, the soonest qualifying event is
//! classified, and the panel plays the matching alert. A failed query flashes
//! red and bumps the failure counter; the next minute is the retry.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Timelike;
use remind_core::alert::{CHECKING_COLOR, FAILURE_COLOR, GRID_SIZE, SUCCESS_COLOR};
use remind_core::{
    minutes_until, select_next_event, Alert, CalendarEvent, ReminderPolicy, Thresholds, Urgency,
};
use tokio::time::{self, MissedTickBehavior};

use crate::config::{Config, RebootConfig};
use crate::display::{Lights, Matrix};
use crate::error::QueryError;
use crate::source::{CalendarSource, Clock, EventQuery};

/// Full-panel red flash after a failed query
const FAILURE_FLASH: Duration = Duration::from_secs(2);

/// Per-run settings the loop needs, taken from [`Config`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    pub calendar_id: String,
    pub lookahead: chrono::Duration,
    pub policy: ReminderPolicy,
    pub thresholds: Thresholds,
    pub query_timeout: Duration,
    /// Consecutive failures that end the loop for a restart; `None` retries forever
    pub escalation_ceiling: Option<u32>,
}

impl From<&Config> for LoopSettings {
    fn from(config: &Config) -> Self {
        Self {
            calendar_id: config.calendar_id.clone(),
            lookahead: config.lookahead(),
            policy: config.reminder_policy,
            thresholds: config.thresholds,
            query_timeout: config.query_timeout(),
            escalation_ceiling: config.escalation_ceiling(),
        }
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Everything the loop remembers between ticks. Lost on restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    last_minute: Option<u32>,
    failures: u32,
    activity_pixel: u8,
    has_error: bool,
}

impl Default for LoopState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopState {
    pub fn new() -> Self {
        Self {
            last_minute: None,
            failures: 0,
            // One past the end, so the first advance lands on the last pixel.
            activity_pixel: GRID_SIZE,
            has_error: false,
        }
    }

    /// Record `minute` and report whether it differs from the last one seen.
    pub fn enter_minute(&mut self, minute: u32) -> bool {
        if self.last_minute == Some(minute) {
            return false;
        }
        self.last_minute = Some(minute);
        true
    }

    /// Step the activity pixel one to the left, wrapping back to the right edge.
    pub fn advance_activity(&mut self) -> u8 {
        if self.activity_pixel < 1 {
            self.activity_pixel = GRID_SIZE;
        }
        self.activity_pixel -= 1;
        self.activity_pixel
    }

    pub fn activity_pixel(&self) -> u8 {
        self.activity_pixel.min(GRID_SIZE - 1)
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
        self.has_error = false;
    }

    pub fn record_failure(&mut self) -> u32 {
        self.failures = self.failures.saturating_add(1);
        self.has_error = true;
        self.failures
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn last_minute(&self) -> Option<u32> {
        self.last_minute
    }
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Same minute as last time, nothing queried
    Idle,
    /// Query succeeded but nothing qualifies
    NoEvent,
    Alerted {
        title: String,
        minutes: i64,
        urgency: Urgency,
    },
    Failed {
        failures: u32,
    },
    /// Failure ceiling reached; the caller should restart the device
    Escalate {
        failures: u32,
    },
}

/// Why [`Reminder::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Interrupted,
    Escalated { failures: u32 },
}

pub struct Reminder<S, M, K>
where
    S: CalendarSource,
    M: Matrix,
    K: Clock,
{
    source: S,
    lights: Lights<M>,
    clock: K,
    settings: LoopSettings,
    state: LoopState,
}

impl<S, M, K> Reminder<S, M, K>
where
    S: CalendarSource,
    M: Matrix,
    K: Clock,
{
    pub fn new(source: S, lights: Lights<M>, clock: K, settings: LoopSettings) -> Self {
        Self {
            source,
            lights,
            clock,
            settings,
            state: LoopState::new(),
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn lights(&self) -> &Lights<M> {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut Lights<M> {
        &mut self.lights
    }

    /// Tick every `tick_interval` until `shutdown` resolves or a restart is due.
    pub async fn run<F>(&mut self, tick_interval: Duration, shutdown: F) -> LoopExit
    where
        F: Future<Output = ()>,
    {
        let mut ticker = time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!("Reminder loop started (tick: {:?})", tick_interval);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, leaving reminder loop");
                    return LoopExit::Interrupted;
                }
                outcome = async {
                    ticker.tick().await;
                    self.tick().await
                } => {
                    if let TickOutcome::Escalate { failures } = outcome {
                        return LoopExit::Escalated { failures };
                    }
                }
            }
        }
    }

    /// Handle one tick. Queries at most once per wall-clock minute.
    pub async fn tick(&mut self) -> TickOutcome {
        let minute = self.clock.now().minute();
        if !self.state.enter_minute(minute) {
            return TickOutcome::Idle;
        }
        self.check().await
    }

    async fn check(&mut self) -> TickOutcome {
        let now = self.clock.now();
        tracing::debug!("Getting next event");

        // While in error the red indicator stays up until a query succeeds.
        if !self.state.has_error() {
            let index = self.state.advance_activity();
            self.lights.set_activity_light(index, CHECKING_COLOR);
        }

        let query = EventQuery::upcoming(&self.settings.calendar_id, now, self.settings.lookahead);
        match self.query(&query).await {
            Ok(events) => self.handle_events(events).await,
            Err(e) => self.handle_failure(e).await,
        }
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<CalendarEvent>, QueryError> {
        let limit = self.settings.query_timeout;
        match time::timeout(limit, self.source.list_events(query)).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout(limit)),
        }
    }

    async fn handle_events(&mut self, events: Vec<CalendarEvent>) -> TickOutcome {
        self.lights
            .set_activity_light(self.state.activity_pixel(), SUCCESS_COLOR);
        self.state.record_success();

        if events.is_empty() {
            tracing::info!("No entries returned");
            return TickOutcome::NoEvent;
        }

        // Sampled after the query so a slow response cannot skew the countdown.
        let now = self.clock.now();
        let Some(event) = select_next_event(&events, now, self.settings.policy) else {
            tracing::info!("No upcoming events with reminders ({} returned)", events.len());
            return TickOutcome::NoEvent;
        };
        let Some(start) = event.start_time() else {
            return TickOutcome::NoEvent;
        };

        tracing::info!("Found event: {}", event.title);
        tracing::info!("Event starts: {}", start.to_rfc3339());

        let minutes = minutes_until(start, now);
        let urgency = self.settings.thresholds.classify(minutes);
        if minutes == 1 {
            tracing::info!("Starts in 1 minute ({})", urgency.as_str());
        } else {
            tracing::info!("Starts in {} minutes ({})", minutes, urgency.as_str());
        }

        let title = event.title.clone();
        let alert = Alert::for_urgency(urgency, minutes);
        self.lights.play(&alert).await;
        self.lights
            .set_activity_light(self.state.activity_pixel(), alert.indicator);

        TickOutcome::Alerted {
            title,
            minutes,
            urgency,
        }
    }

    async fn handle_failure(&mut self, err: QueryError) -> TickOutcome {
        tracing::error!("Calendar query failed: {}", err);

        self.lights.flash_all(1, FAILURE_FLASH, FAILURE_COLOR).await;
        self.lights
            .set_activity_light(self.state.activity_pixel(), FAILURE_COLOR);
        let failures = self.state.record_failure();

        if let Some(ceiling) = self.settings.escalation_ceiling {
            tracing::info!("Incrementing the reboot counter ({}/{})", failures, ceiling);
            if failures >= ceiling {
                tracing::warn!("{} consecutive failures, restart required", failures);
                return TickOutcome::Escalate { failures };
            }
        }

        TickOutcome::Failed { failures }
    }
}

/// Count down, then run the configured restart command.
pub async fn restart_device(config: &RebootConfig) -> Result<()> {
    let (program, args) = config
        .command
        .split_first()
        .context("Reboot command is empty")?;

    for remaining in (1..=config.countdown_secs).rev() {
        tracing::warn!("Rebooting in {} seconds", remaining);
        time::sleep(Duration::from_secs(1)).await;
    }

    tracing::warn!("Running {}", config.command.join(" "));
    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .with_context(|| format!("Failed to run {}", program))?;

    if !status.success() {
        anyhow::bail!("{} exited with {}", program, status);
    }
    Ok(())
}
