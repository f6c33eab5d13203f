use {
    std::sync::Once,
    tracing_subscriber::{EnvFilter, FmtSubscriber},
};

// A process can only install one global subscriber.
static TRACING: Once = Once::new();

/// Prints the ledger's logs at `level` and above. The `RUST_LOG` environment
/// variable, if set, takes precedence.
pub fn setup_tracing_subscriber(level: tracing::Level) {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_test_writer()
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("failed to set global tracing subscriber");
    });
}
