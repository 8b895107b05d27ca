//! linecheck CLI entry point

fn main() {
    // Structured logs go to stderr; keep them quiet by default so they do not interleave with the report
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    linecheck::cli::run();
}
