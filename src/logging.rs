//! Tracing setup shared by the binaries
//!
//! Tracing is off unless `VAPOR_TRACE` is set to something other than `0`.
//! Events go to a file through a non-blocking writer so they never mix with
//! console output.
//!
//! | Variable | Meaning | Fallback |
//! |----------|---------|----------|
//! | `VAPOR_TRACE` | enable tracing | off |
//! | `VAPOR_TRACE_FILE` | log file path | `vapor_trace.log` |
//! | `VAPOR_TRACE_LEVEL` | `EnvFilter` directive | `logging.level` |
//! | `VAPOR_TRACE_JSON` | JSON lines instead of compact text | `logging.format == "json"` |

use std::env;
use std::sync::OnceLock;

use crate::config::LoggingConfig;

static TRACE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

const DEFAULT_TRACE_FILE: &str = "vapor_trace.log";

/// Resolved tracing settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSettings {
    pub path: String,
    pub level: String,
    pub json: bool,
}

impl TraceSettings {
    /// Resolve settings from a variable lookup, falling back to the config
    /// file values. Returns `None` when tracing is disabled.
    pub fn resolve<F>(logging: &LoggingConfig, var: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Environment variables take precedence over config file values
        let enabled = var("VAPOR_TRACE").is_some_and(|v| v != "0");
        if !enabled {
            return None;
        }

        let path = var("VAPOR_TRACE_FILE").unwrap_or_else(|| DEFAULT_TRACE_FILE.to_string());
        let json = var("VAPOR_TRACE_JSON").map_or_else(|| logging.format == "json", |v| v != "0");
        let level = var("VAPOR_TRACE_LEVEL").unwrap_or_else(|| logging.level.clone());

        Some(TraceSettings { path, level, json })
    }

    pub fn from_env(logging: &LoggingConfig) -> Option<Self> {
        Self::resolve(logging, |name| env::var(name).ok())
    }
}

/// Install the global subscriber if tracing is enabled
pub fn init_tracing(logging: &LoggingConfig) {
    let Some(settings) = TraceSettings::from_env(logging) else {
        return;
    };

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.path)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("ERROR: Unable to open VAPOR_TRACE_FILE '{}': {e}", settings.path);
            return;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let _ = TRACE_GUARD.set(guard);

    let filter = tracing_subscriber::EnvFilter::try_new(&settings.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let base = || {
        tracing_subscriber::fmt()
            .with_env_filter(filter.clone())
            .with_ansi(false)
            .with_target(true)
            .with_writer(non_blocking.clone())
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
    };

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if settings.json {
        Box::new(base().json().finish())
    } else {
        Box::new(base().compact().finish())
    };

    let _ = tracing::subscriber::set_global_default(subscriber);
}
