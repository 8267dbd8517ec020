// Bridge logging.
// Everything goes through the `log` facade; the host decides where records
// end up. `init` wires up env_logger for the CLI and tests.

use env_logger::{Builder, Env};

pub const TAG: &str = "mapbridge";

/// Install the global logger. `RUST_LOG` wins over `default_level`.
/// Repeated calls are ignored.
pub fn init(default_level: &str) {
    let result = Builder::from_env(Env::default().default_filter_or(default_level))
        .format_target(false)
        .try_init();
    match result {
        Ok(()) => log::debug!("[{TAG}] logger initialized at {default_level}"),
        Err(_) => log::trace!("[{TAG}] logger already installed"),
    }
}
