use std::error::Error;
use std::fmt::{Display, Formatter, Result};
use crate::utils::sanitize_sensitive_info;

#[macro_export]
macro_rules! fatal_err {
    ($($arg:tt)*) => {
        $crate::error::TvEpgError::new($crate::error::TvEpgErrorKind::Fatal, format!($($arg)*))
    };
}

pub use fatal_err;

#[macro_export]
macro_rules! fatal_err_res {
    ($($arg:tt)*) => {
        Err($crate::error::TvEpgError::new($crate::error::TvEpgErrorKind::Fatal, format!($($arg)*)))
    };
}

pub use fatal_err_res;

#[macro_export]
macro_rules! info_err {
    // This matches any arguments (format string + variables) and forwards them
    // to format!, then wraps them in the error constructor.
    ($($arg:tt)*) => {
        $crate::error::TvEpgError::new($crate::error::TvEpgErrorKind::Info, format!($($arg)*))
    };
}

pub use info_err;

#[macro_export]
macro_rules! info_err_res {
    ($($arg:tt)*) => {
        Err($crate::error::TvEpgError::new($crate::error::TvEpgErrorKind::Info, format!($($arg)*)))
    };
}

pub use info_err_res;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TvEpgErrorKind {
    // logged, the job continues with the next item
    Info,
    // the job is aborted
    Fatal,
}

#[derive(Debug)]
pub struct TvEpgError {
    pub kind: TvEpgErrorKind,
    pub message: String,
}

impl TvEpgError {
    pub const fn new(kind: TvEpgErrorKind, message: String) -> Self {
        Self { kind, message }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == TvEpgErrorKind::Fatal
    }
}

impl Display for TvEpgError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", sanitize_sensitive_info(&self.message))
    }
}

impl Error for TvEpgError {}

#[cfg(test)]
mod tests {
    use crate::error::TvEpgErrorKind;

    #[test]
    fn test_error_macros() {
        let err = info_err!("failed {}", 1);
        assert_eq!(err.kind, TvEpgErrorKind::Info);
        assert_eq!(err.message, "failed 1");
        assert!(!err.is_fatal());

        let res: Result<(), _> = info_err_res!("skipped {}", "x");
        assert!(res.is_err_and(|e| !e.is_fatal() && e.message == "skipped x"));

        let res: Result<(), _> = fatal_err_res!("boom");
        assert!(res.is_err_and(|e| e.is_fatal()));
    }

    #[test]
    fn test_error_display_is_sanitized() {
        let err = info_err!("can't fetch https://host/list.txt?pwd=secret");
        assert_eq!(err.to_string(), "can't fetch https://host/list.txt?pwd=***");
    }
}
