use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter, e.g. `SORTDIR_LOG=debug`.
pub const LOG_ENV: &str = "SORTDIR_LOG";

const DEFAULT_FILTER: &str = "error";

/// Installs the global tracing subscriber.
///
/// Diagnostics go to stderr so they never mix with the report on stdout.
pub fn init_logger() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
