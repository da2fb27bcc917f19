use env_logger::Env;
use log::info;

const LOGGING: &str = "logging";

/// initializes the process logger. `RUST_LOG` takes precedence over the
/// default `info` filter.
pub fn setup_logging() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(true)
        .try_init()?;

    info!(target: LOGGING, "logger initialized");

    Ok(())
}
