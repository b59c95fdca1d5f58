use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays machine-readable.
///
/// `STUDYTIMER_LOG` takes precedence, then `--verbose`, then the configured
/// level.
pub fn init(verbose: bool, configured_level: &str) {
    let filter = EnvFilter::try_from_env("STUDYTIMER_LOG").unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { configured_level };
        EnvFilter::try_new(format!("studytimer_core={level},studytimer={level}"))
            .unwrap_or_else(|_| EnvFilter::new("studytimer_core=info,studytimer=info"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
