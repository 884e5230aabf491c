//! Logging setup shared by both binaries.

/// Installs the fmt subscriber. Logs go to stderr so the CLI's progress line
/// on stdout stays readable. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tubesave=info".into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
