//! Error types for pi computation.

use crate::config::{MAX_DIGITS, MAX_TERMS};

/// Error type for configuring and running a computation.
///
/// Every variant except `Io` is raised while validating the request, before
/// any term is evaluated or any digit is written.
#[derive(Debug)]
pub enum PiError {
    /// The precision argument is not an integer
    InvalidNumber(String),
    /// Requested digit count is outside `1..=MAX_DIGITS`
    OutOfRange { digits: i64 },
    /// The derived term count would overflow a lane divisor
    PrecisionTooLarge { terms: usize },
    /// Writing the digit stream failed
    Io(std::io::Error),
}

impl std::fmt::Display for PiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PiError::InvalidNumber(s) => write!(f, "argument is not a number: '{}'", s),
            PiError::OutOfRange { digits } => write!(
                f,
                "argument out of range ({} digits requested, 1..={} supported)",
                digits, MAX_DIGITS
            ),
            PiError::PrecisionTooLarge { terms } => write!(
                f,
                "precision too big ({} series terms, at most {})",
                terms, MAX_TERMS
            ),
            PiError::Io(e) => write!(f, "output error: {}", e),
        }
    }
}

impl std::error::Error for PiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PiError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PiError {
    fn from(e: std::io::Error) -> Self {
        PiError::Io(e)
    }
}
