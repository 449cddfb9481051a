//! Daemon assembly -- configuration, notifier wiring, and monitor lifecycle.
//!
//! # Startup order
//!
//! 1. Load configuration (file, environment overrides, CLI overrides, validation)
//! 2. Initialize tracing (done by `main` once the config is known)
//! 3. Install the Prometheus recorder when `metrics.enabled`
//! 4. Build the Telegram notifier and the monitor loop
//! 5. Spawn the signal watcher that cancels the monitor
//! 6. Run until cancelled, then flush and send the shutdown summary

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use logbell_core::config::LogbellConfig;
use logbell_monitor::{
    MonitorConfig, MonitorLoopBuilder, Notifier, PatternSet, RunSummary, TelegramNotifier,
};

use crate::cli::DaemonCli;
use crate::metrics_server;

/// Load the configuration file and apply environment and CLI overrides.
///
/// Validation runs once, after every override layer, so a CLI flag can
/// replace an invalid file or environment value. The monitor's own checks
/// run here too, so `--validate` rejects exactly what startup would.
///
/// # Errors
///
/// Returns an error if the file is missing, cannot be parsed, or fails
/// validation after overrides are applied.
pub async fn load_config(cli: &DaemonCli) -> Result<LogbellConfig> {
    let mut config = LogbellConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;

    config.apply_env_overrides();
    cli.apply_overrides(&mut config);

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    MonitorConfig::from_core(&config)
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    Ok(config)
}

/// Render the `--validate` report: target file and filter compilation results.
pub fn describe_config(config: &LogbellConfig) -> String {
    let patterns = PatternSet::compile(&config.filters);
    let monitoring = &config.monitoring;

    let mut report = String::new();
    let _ = writeln!(report, "configuration OK");
    let _ = writeln!(report, "  log_file: {}", config.log_file);
    let _ = writeln!(report, "  chat_id: {}", config.telegram.chat_id);
    let _ = writeln!(
        report,
        "  filters: {} active, {} skipped",
        patterns.len(),
        patterns.skipped().len()
    );
    for rule in patterns.rules() {
        let _ = writeln!(report, "    [{}] {}", rule.name(), rule.pattern());
    }
    for skipped in patterns.skipped() {
        let _ = writeln!(report, "    [{}] skipped: {}", skipped.name, skipped.reason);
    }
    let _ = write!(
        report,
        "  check_interval: {}s, batch_size: {}, batch_timeout: {}s",
        monitoring.check_interval, monitoring.batch_size, monitoring.batch_timeout
    );
    report
}

/// Build the production notifier and run the monitor until a shutdown signal.
///
/// # Errors
///
/// Returns an error for configuration-level failures: metrics recorder
/// installation, notifier construction, the connectivity probe, or the
/// startup message.
pub async fn run(config: LogbellConfig) -> Result<RunSummary> {
    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    let notifier = Arc::new(
        TelegramNotifier::new(&config.telegram)
            .map_err(|e| anyhow::anyhow!("failed to create telegram notifier: {}", e))?,
    );

    let cancel = CancellationToken::new();
    let watcher = spawn_signal_watcher(cancel.clone());

    let result = run_with_notifier(&config, notifier, cancel).await;
    watcher.abort();
    result
}

/// Run the monitor with an arbitrary notifier until `cancel` fires.
pub async fn run_with_notifier<N: Notifier>(
    config: &LogbellConfig,
    notifier: Arc<N>,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let mut monitor = MonitorLoopBuilder::new()
        .config(MonitorConfig::from_core(config))
        .notifier(notifier)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build monitor: {}", e))?;

    let summary = monitor.run(cancel).await?;
    Ok(summary)
}

/// Spawn a task that cancels `cancel` on SIGTERM or SIGINT.
pub fn spawn_signal_watcher(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(signal) => {
                tracing::info!(signal = signal, "shutdown signal received");
                cancel.cancel();
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handlers");
            }
        }
    })
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Ctrl-C handler: {}", e))?;
    Ok("Ctrl-C")
}
