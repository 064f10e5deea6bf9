// # ddns-syncd - DDNS reconciliation daemon
//
// Thin integration layer:
// 1. Load `.env` (optional) and initialize logging (console + daily rotating file)
// 2. Load the configuration from the environment
// 3. Wire the HTTP IP resolver and the Cloudflare client into the loop
// 4. Run until SIGTERM/SIGINT or a fatal error
//
// All reconciliation logic lives in ddns-sync-core.
//
// ## Configuration
//
// ### Required
// - `DDNS_ZONE_ID` (or `DDNS_ZONE_ID_FILE`): Cloudflare zone ID
// - `DDNS_API_TOKEN` (or `DDNS_API_TOKEN_FILE`): API token with DNS edit rights
// - `DDNS_DOMAINS` and/or `DDNS_DOMAIN_FILE`: domains to manage
//
// ### Optional
// - `DDNS_CHECK_INTERVAL`: seconds between ticks (default 300)
// - `DDNS_IP_CHECK_URL`: IP echo service (default https://api.ipify.org)
// - `DDNS_REQUEST_TIMEOUT_SECS`, `DDNS_RECORD_TTL`, `DDNS_RECORD_PROXIED`
// - `DDNS_RESOLVE_MAX_ATTEMPTS`, `DDNS_RESOLVE_RETRY_DELAY_SECS`
// - `DDNS_MODE`: `live` (default) or `dry-run`
// - `DDNS_LOG_LEVEL`, `DDNS_LOG_DIR`, `DDNS_LOG_TIMEZONE`
//
// ## Example
//
// ```bash
// export DDNS_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export DDNS_API_TOKEN_FILE=/run/secrets/cf_token
// export DDNS_DOMAINS=home.example.com,vpn.example.com
//
// ddns-syncd
// ```

mod logging;

use anyhow::Result;
use ddns_sync_cloudflare::CloudflareClient;
use ddns_sync_core::{ConfigSource, EnvConfigSource, ReconciliationConfig, ReconciliationLoop};
use ddns_sync_ip_http::HttpIpResolver;
use logging::LogConfig;
use std::process::ExitCode;
use tracing::{debug, error, info};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Authentication or runtime failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error
    ConfigError = 1,
    /// Authentication or unexpected runtime failure
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DdnsExitCode {
    fn for_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<ddns_sync_core::Error>() {
            Some(ddns_sync_core::Error::Config(_)) => Self::ConfigError,
            _ => Self::RuntimeError,
        }
    }
}

fn main() -> ExitCode {
    // A missing .env is not an error
    dotenvy::dotenv().ok();

    let log_config = match LogConfig::from_env() {
        Ok(log_config) => log_config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Flushes the file writer when main returns
    let _log_guard = match logging::init(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Starting ddns-syncd v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_config(&EnvConfigSource::from_process_env()) {
        Ok(config) => config,
        Err(code) => return code.into(),
    };
    info!(
        "Configuration loaded: {} domain(s), checking every {}s{}",
        config.domain_names().len(),
        config.check_interval_secs(),
        if config.dry_run() { " [DRY-RUN]" } else { "" }
    );
    debug!("{:?}", config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let code = match rt.block_on(run_daemon(config)) {
        Ok(()) => DdnsExitCode::CleanShutdown,
        Err(e) => {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::for_error(&e)
        }
    };

    info!("ddns-syncd exiting with code {}", code as u8);
    code.into()
}

/// Load the configuration, logging the reason it was rejected
fn load_config(
    source: &impl ConfigSource,
) -> std::result::Result<ReconciliationConfig, DdnsExitCode> {
    source.load().map_err(|e| {
        error!("{}", e);
        DdnsExitCode::for_error(&anyhow::Error::from(e))
    })
}

/// Run the daemon
async fn run_daemon(config: ReconciliationConfig) -> Result<()> {
    let ip_resolver = HttpIpResolver::from_config(&config)?;
    let client = CloudflareClient::from_config(&config)?;

    // Installed before bootstrap so startup lookups can be interrupted
    let mut shutdown = Box::pin(wait_for_shutdown());

    let bootstrap = ReconciliationLoop::bootstrap(Box::new(ip_resolver), Box::new(client), config);
    let (mut reconciliation, mut event_rx) = tokio::select! {
        result = bootstrap => result?,
        signal = &mut shutdown => {
            info!("Received {} during startup, shutting down", signal?);
            return Ok(());
        }
    };

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Loop event: {:?}", event);
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match shutdown.await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Signal handling failed, shutting down: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    reconciliation.run_with_shutdown(Some(shutdown_rx)).await?;
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
