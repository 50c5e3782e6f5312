//! Logging setup for the binary.
//!
//! The filter comes from `RUST_LOG` when set, else from `LOG_LEVEL`
//! (a bare level such as `debug`), else `info`. Output goes to stderr so
//! that answers and `--json` output on stdout stay clean.

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_directive(std::env::var("LOG_LEVEL").ok())));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn fallback_directive(log_level: Option<String>) -> String {
    log_level
        .map(|level| level.trim().to_lowercase())
        .filter(|level| !level.is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_fallback() {
        assert_eq!(fallback_directive(None), "info");
        assert_eq!(fallback_directive(Some(" DEBUG ".into())), "debug");
        assert_eq!(fallback_directive(Some(String::new())), "info");
    }
}
