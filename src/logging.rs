use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Installs the global subscriber. `RUST_LOG` wins over `log_level`.
///
/// Calling it again after a subscriber is set is a no-op.
pub fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);

    if let Err(e) = Registry::default().with(env_filter).with(stdout_layer).try_init() {
        tracing::debug!(error = %e, "Tracing already initialized");
    }
}
