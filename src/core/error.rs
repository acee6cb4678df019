use chrono::NaiveDate;

/// Rejected projection inputs. Nothing in the engine does I/O, so every
/// failure is a configuration problem the caller has to fix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("duration must be at least one month, got {months}")]
    InvalidDuration { months: u32 },

    #[error("{field} must be a non-negative percentage, got {value}")]
    InvalidRate { field: &'static str, value: f64 },

    #[error("{field} must be a non-negative amount, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("schedule of {months} months starting {start} runs past the supported date range")]
    DateOutOfRange { start: NaiveDate, months: u32 },

    #[error("unknown month: {0}")]
    UnknownMonth(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
