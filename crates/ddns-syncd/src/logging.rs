//! Console + rotating file logging
//!
//! Settings come from the environment:
//!
//! - `DDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//! - `DDNS_LOG_DIR`: defaults to `/app/logs` when `DOCKERIZED=true`, else `./logs`
//! - `DDNS_LOG_TIMEZONE`: `UTC`, `local` (default) or a fixed offset like `+02:00`

use anyhow::{Context, Result};
use chrono::{FixedOffset, Local, Utc};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Base name of the log file; the appender adds the date suffix
pub const LOG_FILE_NAME: &str = "ddns-sync.log";

/// Rotated files kept on disk (one per day)
const MAX_LOG_FILES: usize = 7;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Timezone used for log timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTimezone {
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl LogTimezone {
    fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("utc") => Ok(Self::Utc),
            v if v.eq_ignore_ascii_case("local") => Ok(Self::Local),
            v => v.parse::<FixedOffset>().map(Self::Fixed).map_err(|_| {
                anyhow::anyhow!(
                    "DDNS_LOG_TIMEZONE '{}' is not valid. Use UTC, local, or an offset like +02:00",
                    v
                )
            }),
        }
    }
}

/// Timestamp formatter honoring [`LogTimezone`]
#[derive(Debug, Clone, Copy)]
struct LogTimer(LogTimezone);

impl FormatTime for LogTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";

        match self.0 {
            LogTimezone::Utc => write!(w, "{}", Utc::now().format(FORMAT)),
            LogTimezone::Local => write!(w, "{}", Local::now().format(FORMAT)),
            LogTimezone::Fixed(offset) => {
                write!(w, "{}", Utc::now().with_timezone(&offset).format(FORMAT))
            }
        }
    }
}

/// Validated logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub dir: PathBuf,
    pub timezone: LogTimezone,
}

impl LogConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let level = get("DDNS_LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase();
        if !VALID_LEVELS.contains(&level.as_str()) {
            anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. Valid levels: {}",
                level,
                VALID_LEVELS.join(", ")
            );
        }

        let dockerized = get("DOCKERIZED").is_some_and(|v| v.eq_ignore_ascii_case("true"));
        let dir = match get("DDNS_LOG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None if dockerized => PathBuf::from("/app/logs"),
            None => PathBuf::from("logs"),
        };

        let timezone = match get("DDNS_LOG_TIMEZONE") {
            Some(tz) => LogTimezone::parse(&tz)?,
            None => LogTimezone::Local,
        };

        Ok(Self {
            level,
            dir,
            timezone,
        })
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::new(format!(
            "ddns_syncd={level},\
             ddns_sync_core={level},\
             ddns_sync_cloudflare={level},\
             ddns_sync_ip_http={level},\
             reqwest=warn,\
             hyper=warn",
            level = self.level
        ))
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the lifetime of the process.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.dir)
        .with_context(|| format!("Failed to create log directory {}", config.dir.display()))?;

    let file_appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_NAME)
        .max_log_files(MAX_LOG_FILES)
        .build(&config.dir)
        .context("Failed to open log file")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let timer = LogTimer(config.timezone);
    let console_layer = fmt::layer().with_target(false).with_timer(timer);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_timer(timer)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(config.filter())
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to set tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<LogConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.level, "info");
        assert_eq!(config.dir, PathBuf::from("logs"));
        assert_eq!(config.timezone, LogTimezone::Local);
    }

    #[test]
    fn test_dockerized_log_dir() {
        let config = load(&[("DOCKERIZED", "TRUE")]).unwrap();
        assert_eq!(config.dir, PathBuf::from("/app/logs"));

        let config = load(&[("DOCKERIZED", "true"), ("DDNS_LOG_DIR", "/var/log/ddns")]).unwrap();
        assert_eq!(config.dir, PathBuf::from("/var/log/ddns"));
    }

    #[test]
    fn test_level_is_case_insensitive_and_validated() {
        assert_eq!(load(&[("DDNS_LOG_LEVEL", "DEBUG")]).unwrap().level, "debug");
        assert!(load(&[("DDNS_LOG_LEVEL", "verbose")]).is_err());
    }

    #[test]
    fn test_timezone_parsing() {
        assert_eq!(
            load(&[("DDNS_LOG_TIMEZONE", "utc")]).unwrap().timezone,
            LogTimezone::Utc
        );

        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            load(&[("DDNS_LOG_TIMEZONE", "+02:00")]).unwrap().timezone,
            LogTimezone::Fixed(offset)
        );

        assert!(load(&[("DDNS_LOG_TIMEZONE", "Mars/Olympus")]).is_err());
    }

    #[test]
    fn test_timer_writes_configured_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let mut utc = String::new();
        let mut fixed = String::new();

        LogTimer(LogTimezone::Utc).format_time(&mut Writer::new(&mut utc)).unwrap();
        LogTimer(LogTimezone::Fixed(offset))
            .format_time(&mut Writer::new(&mut fixed))
            .unwrap();

        assert!(utc.ends_with("+00:00"), "utc timestamp: {}", utc);
        assert!(fixed.ends_with("+02:00"), "fixed timestamp: {}", fixed);
    }
}
