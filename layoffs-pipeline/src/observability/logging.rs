use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes tracing with a console layer plus a daily-rolling JSON
/// file under `logs/`.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "layoffs.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stdout);

    // RUST_LOG wins; default to verbose output for our own crate only.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("layoffs_pipeline=debug,info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    // Leak the appender guard so file logs keep flushing for the whole
    // process lifetime.
    std::mem::forget(guard);
}
