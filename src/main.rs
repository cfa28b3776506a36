use clap::Parser;
use relink::cli::{Cli, Commands};
use relink::config::{AppConfig, LoggingConfig, StaticSettings, WatchdogConfig};
use relink::error::{RelinkError, Result};
use relink::link::{ConnectionOptions, LinkStatus, PortSelection, ScriptedLink};
use relink::supervisor::LinkWatchdog;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app_config = AppConfig::load_from(&cli.config)?;

    match &cli.command {
        Commands::Simulate {
            statuses,
            port,
            baud,
            port_absent,
            initial_delay,
            poll_period,
            offline_threshold,
            run_for,
        } => {
            init_logging(&app_config.logging);
            let watchdog_config = WatchdogConfig {
                enabled: true,
                initial_delay_secs: *initial_delay,
                poll_period_secs: *poll_period,
                offline_threshold: *offline_threshold,
            };
            run_simulate(
                statuses,
                port,
                *baud,
                !*port_absent,
                watchdog_config,
                *run_for,
            )
            .await?;
        }
        Commands::Config => {
            let effective = AppConfig {
                watchdog: app_config.watchdog.sanitized(),
                logging: app_config.logging.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&effective)?);
        }
    }

    Ok(())
}

/// Drive the watchdog against a scripted link for a bounded wall-clock run.
async fn run_simulate(
    statuses: &str,
    port: &str,
    baud: u32,
    port_present: bool,
    config: WatchdogConfig,
    run_for: u64,
) -> Result<()> {
    let script = parse_status_script(statuses)?;
    let fallback = *script
        .last()
        .ok_or_else(|| RelinkError::InvalidArgument("empty status script".to_string()))?;

    let options = ConnectionOptions {
        port: PortSelection::from(port),
        baud,
    };
    let link = Arc::new(ScriptedLink::new(script, fallback, options, port_present));
    let settings = Arc::new(StaticSettings::new(config));
    let watchdog = LinkWatchdog::new(link.clone(), link.clone(), settings);

    watchdog.start().await;

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(run_for)) => {
            info!("simulation window elapsed");
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    watchdog.stop().await;

    let health = watchdog.health().await;
    info!(
        "simulation finished: {} status polls, {} reconnect attempts, {} connect requests, last status {}",
        link.poll_count(),
        health.reconnect_attempts,
        link.connect_count(),
        health
            .last_status
            .map(|status| status.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}

fn parse_status_script(statuses: &str) -> Result<Vec<LinkStatus>> {
    statuses
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,relink={}", config.level)));

    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
