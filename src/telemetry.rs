use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,quanta_ethos=info";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Output goes to stderr so CLI stdout stays machine-readable.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
