use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_level` for anything the environment does not mention.
pub fn init_logging(default_level: tracing::Level) {
    let filter = EnvFilter::from_default_env().add_directive(default_level.into());
    // A second call (tests, embedding hosts) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}
