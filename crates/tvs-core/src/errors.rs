//! Error types for the workspace.
//!
//! A single `thiserror`-derived enum covers configuration mistakes,
//! numerical failures and I/O. The `ensure!`, `ensure_post!` and `fail!`
//! macros keep precondition checks to one line at the call site.

use thiserror::Error;

/// The top-level error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// Index out of range.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// Invalid argument or configuration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The strategy optimisation could not produce a usable weight vector
    /// (singular diffusion matrix, zero portfolio volatility, infeasible
    /// constraints).
    #[error("optimization failed: {0}")]
    Optimization(String),

    /// Reading or writing persisted results failed.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Shorthand `Result` type used throughout the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use tvs_core::{ensure, errors::Error};
/// fn positive(x: f64) -> tvs_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use tvs_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> tvs_core::errors::Result<f64> {
///     let result = x * 2.0;
///     ensure_post!(result.is_finite(), "result must be finite, got {result}");
///     Ok(result)
/// }
/// assert!(compute(1.0).is_ok());
/// assert!(compute(f64::INFINITY).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use tvs_core::{fail, errors::Error};
/// fn always_err() -> tvs_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked_ratio(a: f64, b: f64) -> Result<f64> {
        crate::ensure!(b != 0.0, "denominator must be non-zero");
        Ok(a / b)
    }

    #[test]
    fn ensure_returns_precondition() {
        assert_eq!(checked_ratio(1.0, 2.0), Ok(0.5));
        match checked_ratio(1.0, 0.0) {
            Err(Error::Precondition(msg)) => assert!(msg.contains("denominator")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(ref m) if m.contains("missing file")));
    }

    #[test]
    fn display_messages() {
        let e = Error::Optimization("singular diffusion".into());
        assert_eq!(e.to_string(), "optimization failed: singular diffusion");
        let e = Error::IndexOutOfRange { index: 3, size: 2 };
        assert_eq!(e.to_string(), "index (3) out of range [0, 2)");
    }
}
