use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to `info`.
/// Later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
