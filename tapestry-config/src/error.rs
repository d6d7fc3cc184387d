use std::error::Error;
use std::fmt;

use miette::Diagnostic;

/// Rejected recognizer configuration.
///
/// Returned by [`Thresholds::update`](crate::Thresholds::update) and
/// [`Thresholds::validate`](crate::Thresholds::validate). Invalid values are never clamped.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Negative {
        option: &'static str,
        value: f64,
    },
    NotFinite {
        option: &'static str,
        value: f64,
    },
    OutOfRange {
        option: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    Zero {
        option: &'static str,
    },
}

impl ValidationError {
    pub fn option(&self) -> &'static str {
        match self {
            ValidationError::Negative { option, .. }
            | ValidationError::NotFinite { option, .. }
            | ValidationError::OutOfRange { option, .. }
            | ValidationError::Zero { option } => option,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Negative { option, value } => {
                write!(f, "`{option}` must not be negative, got {value}")
            }
            ValidationError::NotFinite { option, value } => {
                write!(f, "`{option}` must be a finite number, got {value}")
            }
            ValidationError::OutOfRange {
                option,
                value,
                min,
                max,
            } => write!(f, "`{option}` must be between {min} and {max}, got {value}"),
            ValidationError::Zero { option } => write!(f, "`{option}` must be greater than 0"),
        }
    }
}

impl Error for ValidationError {}

impl Diagnostic for ValidationError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("tapestry::config::invalid_threshold"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!(
            "fix `{}` in the recognizer section",
            self.option()
        )))
    }
}
