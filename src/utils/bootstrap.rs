//! Bootstrap utilities for the chatvault binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LEGACY_LOG_ENV_VAR, LOG_ENV_VAR, LOG_FORMAT_ENV_VAR};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Filter directive from `CHATVAULT_LOG`, then `LOG_LEVEL`, then "info".
fn filter_directive<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(LOG_ENV_VAR)
        .or_else(|| lookup(LEGACY_LOG_ENV_VAR))
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Initialize tracing from the logging environment variables.
pub fn init_tracing() {
    let lookup = |name: &str| std::env::var(name).ok();
    let filter = EnvFilter::try_new(filter_directive(lookup))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let format = LogFormat::parse(lookup(LOG_FORMAT_ENV_VAR).as_deref());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Value of `--config <path>` (or `--config=<path>`) from the command line.
pub fn parse_config_path() -> Option<String> {
    config_path_from(std::env::args().skip(1))
}

fn config_path_from<I>(args: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}
