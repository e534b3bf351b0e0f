//! Logger setup. Logs go to stderr so stdout stays machine-readable.

use env_logger::{Builder, Env, Target};

use crate::error::ProducerError;

/// Environment variable whose filter overrides the configured level.
pub const LOG_ENV: &str = "TESTSPEC_LOG";

/// Install the global logger with `default_filter`, e.g. `warn` or
/// `testspec_launch=debug`.
pub fn init(default_filter: &str) -> Result<(), ProducerError> {
    Builder::new()
        .parse_filters(default_filter)
        .parse_env(Env::new().filter(LOG_ENV))
        .format_timestamp(None)
        .target(Target::Stderr)
        .try_init()?;
    Ok(())
}
