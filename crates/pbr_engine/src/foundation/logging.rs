//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system with `RUST_LOG` alone
pub fn init() {
    init_with_level("info");
}

/// Initialize the logging system with a default level
///
/// `RUST_LOG` still wins when it is set. Calling this more than once is harmless;
/// only the first call installs the logger.
pub fn init_with_level(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
