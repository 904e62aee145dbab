use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BotError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("analog sample out of range: {0}")]
    OutOfRange(u16),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Map a boxed driver/sensor error to a typed `BotError`.
///
/// With the `hardware-errors` feature, `wallbot_hardware::HwError` values are
/// downcast so timeouts and faults keep their identity; everything else is
/// carried as an opaque hardware error string.
pub fn map_hw_error(e: &(dyn std::error::Error + Send + Sync + 'static)) -> BotError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<wallbot_hardware::error::HwError>() {
        return match hw {
            wallbot_hardware::error::HwError::Timeout => BotError::Timeout,
            wallbot_hardware::error::HwError::Fault(msg) => BotError::HardwareFault(msg.clone()),
            other => BotError::Hardware(other.to_string()),
        };
    }
    BotError::Hardware(e.to_string())
}
