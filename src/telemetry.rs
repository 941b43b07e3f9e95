use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber for the command-line tools.
///
/// `RUST_LOG` directives are honored; otherwise the crate logs at `info`, or
/// `debug` with `verbose`.
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,evidence_core={level},select_evidence={level},extract_keywords={level}"
        ))
    });

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
