use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE: &str = "sales_leads.log";
const DEFAULT_DIRECTIVES: &str = "sales_leads=info,info";

/// Console output plus a daily-rotated JSON log under `log_dir`.
///
/// Buffered file output is flushed when the returned guard drops, so the
/// caller keeps it alive for as long as it logs. `RUST_LOG` overrides the
/// default filter.
pub fn init_logging(log_dir: &Path) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(file_writer);
    let console_layer = fmt::layer().with_target(true).with_writer(io::stdout);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_log_dir_and_tolerates_reinit() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let _first = init_logging(&dir).unwrap();
        assert!(dir.is_dir());
        let _second = init_logging(&dir).unwrap();
    }
}
