//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`, defaulting to `info`
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        trace!("logger already initialized");
    }
}

/// Initialize the logging system with an explicit filter such as
/// `"scene_lifecycle=trace,info"`
pub fn init_with_filter(filter: &str) {
    if env_logger::Builder::new().parse_filters(filter).try_init().is_err() {
        trace!("logger already initialized, ignoring filter `{filter}`");
    }
}
