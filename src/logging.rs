use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `--verbose` beats `RUST_LOG`, which beats the config level.
pub fn enable_logging(config_level: &str, verbose: bool) {
    let crate_name = env!("CARGO_PKG_NAME").replace('-', "_");
    let filter = if verbose {
        EnvFilter::new(format!("{crate_name}=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(format!("{crate_name}={config_level}")))
            .unwrap_or_else(|_| EnvFilter::new(format!("{crate_name}=warn")))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
