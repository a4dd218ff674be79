use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pi_remind::calendar_client::{AuthFlow, GoogleCalendar};
use pi_remind::config::{Config, RebootConfig};
use pi_remind::display::{Lights, Matrix};
use pi_remind::service::{restart_device, LoopExit, LoopSettings, Reminder};
use pi_remind::source::SystemClock;
use remind_core::alert::FAILURE_COLOR;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long the all-red panel stays up after a failed start
const INIT_FAILURE_HOLD: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "pi-remind", version, about = "Light an LED panel before calendar events")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "PI_REMIND_CONFIG", default_value = "pi-remind.toml")]
    config: PathBuf,

    /// Print an example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Paste the OAuth code by hand instead of running a local redirect server
    #[arg(long)]
    noauth_local_webserver: bool,

    /// Port for the local OAuth redirect server
    #[arg(long, value_name = "PORT")]
    auth_host_port: Option<u16>,
}

impl Cli {
    fn auth_flow(&self) -> AuthFlow {
        if self.noauth_local_webserver {
            AuthFlow::Interactive
        } else if let Some(port) = self.auth_host_port {
            AuthFlow::LocalServerPort(port)
        } else {
            AuthFlow::LocalServer
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.print_config {
        let example =
            toml::to_string_pretty(&Config::example()).context("Failed to render example config")?;
        print!("{}", example);
        return Ok(ExitCode::SUCCESS);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pi_remind=info,remind_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Select the ring provider before any TLS connection is made.
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing::info!("");
    tracing::info!("Pi Remind v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("LED calendar reminders for Raspberry Pi");
    tracing::info!("");

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    if config.reboot.enabled {
        tracing::info!(
            "Reboot mode enabled (after {} failed queries)",
            config.reboot.max_retries
        );
    } else {
        tracing::info!("Reboot mode disabled");
    }

    #[cfg(feature = "hardware")]
    let matrix =
        pi_remind::display::ws2812::Ws2812Matrix::open().context("Failed to open LED panel")?;
    #[cfg(not(feature = "hardware"))]
    let matrix = {
        tracing::info!("Built without the hardware feature, LED frames go to the trace log");
        pi_remind::display::HeadlessMatrix::new()
    };

    run(&cli, config, Lights::new(matrix)).await
}

async fn run<M: Matrix>(cli: &Cli, config: Config, mut lights: Lights<M>) -> Result<ExitCode> {
    let Some(calendar) = connect_calendar(cli, &config, &mut lights).await else {
        return Ok(ExitCode::SUCCESS);
    };

    let mut reminder = Reminder::new(calendar, lights, SystemClock, LoopSettings::from(&config));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let exit = reminder.run(config.tick_interval(), shutdown).await;
    Ok(finish(exit, reminder.lights_mut(), &config.reboot).await)
}

/// Play the start-up show and authorize. On failure the panel holds all red.
async fn connect_calendar<M: Matrix>(
    cli: &Cli,
    config: &Config,
    lights: &mut Lights<M>,
) -> Option<GoogleCalendar> {
    lights.startup(config.brightness).await;

    tracing::info!("Connecting to Google Calendar ({})", config.calendar_id);
    let connecting =
        GoogleCalendar::connect(&config.auth, cli.auth_flow(), config.query_timeout());
    match connecting.await {
        Ok(calendar) => Some(calendar),
        Err(e) => {
            tracing::error!("Initialization failed: {:#}", e);
            lights.set_all(FAILURE_COLOR);
            tokio::time::sleep(INIT_FAILURE_HOLD).await;
            None
        }
    }
}

/// Turn the panel off on interrupt, or restart the device on escalation.
async fn finish<M: Matrix>(
    exit: LoopExit,
    lights: &mut Lights<M>,
    reboot: &RebootConfig,
) -> ExitCode {
    match exit {
        LoopExit::Interrupted => {
            tracing::info!("Exiting application");
            lights.off();
            ExitCode::SUCCESS
        }
        LoopExit::Escalated { failures } => {
            tracing::warn!("Giving up after {} failed queries", failures);
            match restart_device(reboot).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("Restart failed: {:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pi_remind::display::HeadlessMatrix;
    use remind_core::alert::{GREEN, RED};

    fn missing_secret() -> Config {
        let mut config = Config::default();
        config.auth.client_secret_path = "/nonexistent/client_secret.json".to_string();
        config.auth.token_cache_path = "/nonexistent/pi_remind.json".to_string();
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_failure_holds_red_panel() {
        let cli = Cli::try_parse_from(["pi-remind"]).unwrap();
        let mut lights = Lights::with_seed(HeadlessMatrix::new(), 1);

        let started = tokio::time::Instant::now();
        let calendar = connect_calendar(&cli, &missing_secret(), &mut lights).await;
        assert!(calendar.is_none());
        assert!(started.elapsed() >= INIT_FAILURE_HOLD);

        let matrix = lights.matrix();
        assert_eq!(matrix.lit_count(), 64);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(matrix.pixel(x, y), Some(RED));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_failure_exits_cleanly() {
        let cli = Cli::try_parse_from(["pi-remind"]).unwrap();
        let lights = Lights::with_seed(HeadlessMatrix::new(), 1);
        let code = run(&cli, missing_secret(), lights).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_turns_panel_off() {
        let mut lights = Lights::with_seed(HeadlessMatrix::new(), 1);
        lights.set_activity_light(5, GREEN);
        assert_eq!(lights.matrix().lit_count(), 1);

        let code = finish(LoopExit::Interrupted, &mut lights, &RebootConfig::default()).await;
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(lights.matrix().lit_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalation_runs_restart_command() {
        let mut lights = Lights::with_seed(HeadlessMatrix::new(), 1);
        let reboot = RebootConfig {
            enabled: true,
            countdown_secs: 1,
            command: vec!["true".to_string()],
            ..RebootConfig::default()
        };
        let code = finish(LoopExit::Escalated { failures: 10 }, &mut lights, &reboot).await;
        assert_eq!(code, ExitCode::SUCCESS);

        let reboot = RebootConfig {
            command: vec!["false".to_string()],
            ..reboot
        };
        let code = finish(LoopExit::Escalated { failures: 10 }, &mut lights, &reboot).await;
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["pi-remind"]).unwrap();
        assert!(!cli.print_config);
        assert_eq!(cli.auth_flow(), AuthFlow::LocalServer);
    }

    #[test]
    fn test_cli_auth_flags() {
        let cli = Cli::try_parse_from(["pi-remind", "--auth-host-port", "8085"]).unwrap();
        assert_eq!(cli.auth_flow(), AuthFlow::LocalServerPort(8085));

        let cli = Cli::try_parse_from([
            "pi-remind",
            "--noauth-local-webserver",
            "--auth-host-port",
            "8085",
        ])
        .unwrap();
        assert_eq!(cli.auth_flow(), AuthFlow::Interactive);
    }

    #[test]
    fn test_cli_config_path() {
        let cli = Cli::try_parse_from(["pi-remind", "--config", "/etc/pi-remind.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/pi-remind.toml"));
    }
}
