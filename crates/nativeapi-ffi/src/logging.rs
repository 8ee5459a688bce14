use nativeapi_core::LoggingConfig;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "NATIVEAPI_LOG";

fn resolve_filter(env: Option<String>, config: &LoggingConfig) -> String {
    env.filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.filter.clone())
}

/// Install the process-wide subscriber. Only the first call in a process has
/// an effect; the host may also have installed its own.
pub fn init(config: &LoggingConfig) {
    let filter = resolve_filter(std::env::var(LOG_ENV).ok(), config);
    let env_filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
