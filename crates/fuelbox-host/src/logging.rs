//! Logging host function implementation.
//!
//! Guest logs are stored on the [`StoreContext`] and mirrored to `tracing`.

use fuelbox_core::{LogLevel, StoreContext};
use tracing::{debug, error, info, warn};

/// Host implementation for the logging interface.
pub struct LoggingHost;

impl LoggingHost {
    /// Log a message at the specified level.
    pub fn log(ctx: &mut StoreContext, level: LogLevel, message: &str) {
        ctx.log(level, message.to_string());

        let store_id = &ctx.store_id;
        match level {
            LogLevel::Debug => debug!(store_id, guest_log = true, "{}", message),
            LogLevel::Info => info!(store_id, guest_log = true, "{}", message),
            LogLevel::Warn => warn!(store_id, guest_log = true, "{}", message),
            LogLevel::Error => error!(store_id, guest_log = true, "{}", message),
        }
    }
}

/// Convert a numeric log level to [`LogLevel`].
///
/// 0=debug, 1=info, 2=warn, 3=error; anything else is Info.
pub fn level_from_i32(level: i32) -> LogLevel {
    match level {
        0 => LogLevel::Debug,
        2 => LogLevel::Warn,
        3 => LogLevel::Error,
        _ => LogLevel::Info,
    }
}
