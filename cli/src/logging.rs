use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `--verbose` wins, then `RUST_LOG`, then the configured level.
pub fn init_logging(configured_level: Option<&str>, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured_level.unwrap_or("warn")))
    };

    // Logs go to stderr so they never interleave with rendered answers on stdout
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
