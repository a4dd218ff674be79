use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use google_calendar3::api::{Event, Scope};
use google_calendar3::hyper_rustls::HttpsConnector;
use google_calendar3::yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod};
use google_calendar3::CalendarHub;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use remind_core::event::UNTITLED;
use remind_core::{CalendarEvent, EventStart, ReminderOverride, ReminderSettings};

use crate::config::AuthConfig;
use crate::error::QueryError;
use crate::source::{CalendarSource, EventQuery};

const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// How the installed-application OAuth flow hands the code back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthFlow {
    /// Local redirect server on a random port
    #[default]
    LocalServer,
    /// Local redirect server on a fixed port
    LocalServerPort(u16),
    /// Print a URL and read the code from stdin
    Interactive,
}

impl AuthFlow {
    fn return_method(self) -> InstalledFlowReturnMethod {
        match self {
            AuthFlow::LocalServer => InstalledFlowReturnMethod::HTTPRedirect,
            AuthFlow::LocalServerPort(port) => InstalledFlowReturnMethod::HTTPPortRedirect(port),
            AuthFlow::Interactive => InstalledFlowReturnMethod::Interactive,
        }
    }
}

/// Read-only client for the Google Calendar API
pub struct GoogleCalendar {
    hub: CalendarHub<HttpsConnector<HttpConnector>>,
}

impl GoogleCalendar {
    /// Build an authorized client, running the OAuth flow if no cached token exists.
    ///
    /// With a cached token the refresh is bounded by `refresh_timeout`. The
    /// first-time flow waits on the user and is not bounded.
    pub async fn connect(
        config: &AuthConfig,
        flow: AuthFlow,
        refresh_timeout: Duration,
    ) -> Result<Self> {
        let secret = google_calendar3::yup_oauth2::read_application_secret(&config.client_secret_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to read OAuth credentials from {}",
                    config.client_secret_path
                )
            })?;

        let token_cache = config.token_cache_path();
        let has_cached_token = token_cache.exists();
        if let Some(dir) = token_cache.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                tracing::info!("Creating {}", dir.display());
                tokio::fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }

        let auth = InstalledFlowAuthenticator::builder(secret, flow.return_method())
            .persist_tokens_to_disk(token_cache.clone())
            .build()
            .await
            .context("Failed to build authenticator")?;

        // Surface missing or revoked credentials now rather than on the first poll.
        let limit = has_cached_token.then_some(refresh_timeout);
        within(auth.token(&[READONLY_SCOPE]), limit)
            .await
            .context("Failed to obtain calendar access token")?;
        tracing::info!("Credentials cached at {}", token_cache.display());

        let connector = google_calendar3::hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .context("Failed to load native TLS roots")?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(connector);
        let hub = CalendarHub::new(client, auth);

        Ok(Self { hub })
    }
}

/// Await `fetch`, giving up after `limit` when one is set.
async fn within<T, E, F>(fetch: F, limit: Option<Duration>) -> Result<T>
where
    F: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| anyhow!("Timed out after {:?}", limit))?,
        None => fetch.await,
    };
    Ok(result?)
}

#[async_trait]
impl CalendarSource for GoogleCalendar {
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<CalendarEvent>, QueryError> {
        let mut call = self
            .hub
            .events()
            .list(&query.calendar_id)
            .time_min(query.time_min)
            .time_max(query.time_max)
            .single_events(query.single_events)
            .add_scope(Scope::Readonly);
        if query.order_by_start {
            call = call.order_by("startTime");
        }

        let (_, events) = call.doit().await.map_err(map_api_error)?;
        let items = events.items.unwrap_or_default();
        tracing::debug!("Calendar returned {} events", items.len());

        Ok(items.into_iter().map(convert_event).collect())
    }
}

fn map_api_error(err: google_calendar3::Error) -> QueryError {
    match err {
        google_calendar3::Error::MissingToken(e) => QueryError::Auth(e.to_string()),
        google_calendar3::Error::JsonDecodeError(body, e) => {
            tracing::debug!("Undecodable response body: {}", body);
            QueryError::malformed(e.to_string())
        }
        other => QueryError::api(other.to_string()),
    }
}

/// Convert an API event. A `date` without `dateTime` marks an all-day event.
pub fn convert_event(event: Event) -> CalendarEvent {
    let start = event.start.and_then(|start| match (start.date_time, start.date) {
        (Some(at), _) => Some(EventStart::At(at)),
        (None, Some(date)) => Some(EventStart::AllDay(date)),
        (None, None) => None,
    });

    let reminders = event
        .reminders
        .map(|reminders| ReminderSettings {
            use_default: reminders.use_default.unwrap_or(false),
            overrides: reminders
                .overrides
                .unwrap_or_default()
                .into_iter()
                .map(|o| ReminderOverride {
                    method: o.method,
                    minutes: o.minutes,
                })
                .collect(),
        })
        .unwrap_or_default();

    CalendarEvent {
        id: event.id,
        title: event.summary.unwrap_or_else(|| UNTITLED.to_string()),
        start,
        reminders,
        status: event.status,
    }
}
