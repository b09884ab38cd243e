//! pv-dashboard - version 0.1.0
//!
//! Live inverter power dashboard with tracing logging.
//! This is the main entry point that initializes the poll loop and the HTTP
//! server and handles subcommands.

use axum::{routing::get, Router};
use chrono::Local;
use clap::Parser;
use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn, Level};

use pv_dashboard::cli::{Args, Commands, LogLevel};
use pv_dashboard::commands::{command_config, command_day, command_generate_replay};
use pv_dashboard::config::{render_config, resolve_config, validate_effective_config, Config};
use pv_dashboard::handlers::{
    config_handler, dashboard_handler, day_handler, health_handler, session_handler,
};
use pv_dashboard::poll::{Liveness, PollLoop};
use pv_dashboard::source;
use pv_dashboard::state::AppState;
use pv_dashboard::store::DailyFileStore;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };
    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {:?}", args.log_level);
}

/// Loads and validates configuration.
/// Exits the process with error code 1 if loading or validation fails.
fn load_validated_config(args: &Args) -> Config {
    let config = match resolve_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    config
}

/// Logs the inverter stack settings that are carried but not acted upon.
fn log_inverter_stack(config: &Config) {
    let ahoy = &config.ahoy;
    info!(
        "Inverter stack: {} inverter(s), {} radio(s), interval {}s",
        ahoy.inverters.len(),
        ahoy.nrf.len(),
        ahoy.interval
    );
    for inverter in &ahoy.inverters {
        info!(
            "Inverter {} ({}) publishes on {}",
            inverter.serial,
            inverter.name.as_deref().unwrap_or("unnamed"),
            inverter.topic()
        );
    }
    match &ahoy.mqtt {
        Some(mqtt) if !mqtt.disabled => info!("MQTT enabled: {}:{}", mqtt.host, mqtt.port),
        _ => info!("MQTT disabled"),
    }
    for sub in ahoy.command_subscriptions() {
        info!("Command topic for {}: {}", sub.serial, sub.topic);
    }
    match &ahoy.influxdb {
        Some(influx) if !influx.disabled => info!(
            "InfluxDB enabled: {} measurement={}",
            influx.url.as_deref().unwrap_or("-"),
            influx.measurement
        ),
        _ => info!("InfluxDB disabled"),
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = load_validated_config(&args);

        if args.check_config {
            println!("✅ Configuration is valid");
            return Ok(());
        }

        print!("{}", render_config(&config.redacted(), args.config_format)?);
        return Ok(());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Config { output } => Ok(command_config(output.clone())?),

            Commands::GenerateReplay {
                output,
                count,
                serial,
            } => Ok(command_generate_replay(output.clone(), *count, serial)?),

            Commands::Day { date, format } => {
                let config = load_validated_config(&args);
                Ok(command_day(date, *format, &config)?)
            }
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args);

    setup_logging(&args);

    info!("Starting pv-dashboard");
    log_inverter_stack(&config);

    let addr: SocketAddr = format!("{}:{}", config.viewer.bind, config.viewer.port).parse()?;

    let telemetry = match source::from_config(&config) {
        Ok(source) => source,
        Err(e) => {
            error!("❌ Telemetry source unavailable: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Telemetry source: {} (value field {:?})",
        telemetry.name(),
        config.viewer.value_field
    );

    let store = DailyFileStore::new(config.viewer.summary_naming(), config.viewer.full_naming());
    info!(
        "Daily logs in {} (full log {})",
        config.viewer.log_dir.display(),
        if config.viewer.full_log { "enabled" } else { "disabled" }
    );

    let state = AppState::new(config, Local::now().naive_local()).shared();

    let (liveness, host_guard) = Liveness::new();
    let poll_thread = PollLoop::new(state.clone(), telemetry, store, liveness).spawn()?;

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    // Configure HTTP server routes
    let app = Router::new()
        .route("/", get(dashboard_handler))
        .route("/ws", get(session_handler))
        .route("/api/day/{date}", get(day_handler))
        .route("/health", get(health_handler))
        .route("/config", get(config_handler))
        .with_state(state.clone());

    let listener = TcpListener::bind(addr).await?;
    info!("pv-dashboard listening on http://{}", addr);

    // Open WebSocket sessions never end on their own, so the signal wins the
    // select rather than draining connections.
    let server = axum::serve(listener, app);
    let served = tokio::select! {
        result = server => result,
        _ = shutdown_signal => {
            info!("Shutdown signal received, exiting...");
            Ok(())
        }
    };

    // Clear liveness before waiting for the poll thread to notice.
    drop(host_guard);
    match tokio::task::spawn_blocking(move || poll_thread.join()).await {
        Ok(Ok(())) => info!("Poll loop joined"),
        Ok(Err(_)) => warn!("Poll loop panicked"),
        Err(e) => warn!("Failed to join poll loop: {}", e),
    }

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("pv-dashboard stopped gracefully");
    Ok(())
}
