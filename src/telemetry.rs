//! telemetry
//!
//! Log output setup for applications embedding the crate.
//!
//! The library only emits `tracing` events; nothing is printed until the
//! host installs a subscriber, either its own or the one from [`init`].

use tracing_subscriber::EnvFilter;

use crate::core::config::Config;

/// Default directive when neither an explicit filter nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "info";

/// Install a formatted stderr subscriber.
///
/// The filter comes from `filter` if given (typically
/// [`Config::log_filter`](crate::core::config::Config::log_filter)), else
/// `RUST_LOG`, else [`DEFAULT_FILTER`]. Returns `false` if a global
/// subscriber was already installed, in which case nothing changes.
pub fn init(filter: Option<&str>) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install the subscriber with the `[logging]` filter of a loaded config.
pub fn init_from_config(config: &Config) -> bool {
    init(config.log_filter())
}

fn env_filter(filter: Option<&str>) -> EnvFilter {
    match filter {
        Some(directives) => {
            EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}
