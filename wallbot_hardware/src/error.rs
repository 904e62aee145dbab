use thiserror::Error;

/// Typed hardware faults surfaced through the driver trait objects.
#[derive(Debug, Error)]
pub enum HwError {
    #[error("timed out waiting for hardware")]
    Timeout,
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("adc error: {0}")]
    Adc(String),
    #[error("hardware fault: {0}")]
    Fault(String),
}
