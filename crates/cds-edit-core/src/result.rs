//! Result alias and helpers for skipping what the writer cannot express

use crate::error::CdsEditError;

pub type Result<T> = std::result::Result<T, CdsEditError>;

pub trait ResultExt<T> {
    /// `Ok(None)` for an ambiguous writer case, which is logged and skipped
    fn recoverable(self) -> Result<Option<T>>;

    /// Log any error and go on without a value
    fn log_and_continue(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, "skipping operation");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn log_and_continue(self) -> Option<T> {
        self.map_err(|err| {
            if err.is_recoverable() {
                tracing::warn!(error = %err, "continuing after error");
            } else {
                tracing::error!(error = %err, "giving up on value");
            }
        })
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ambiguous_cases_are_skipped() {
        let skipped: Result<u8> = Err(CdsEditError::ambiguous("set-flags", "single enum value"));
        assert!(matches!(skipped.recoverable(), Ok(None)));

        let fatal: Result<u8> = Err(CdsEditError::internal_error("overlapping edits"));
        assert!(fatal.recoverable().is_err());
    }

    #[test]
    fn test_log_and_continue() {
        let ok: Result<u8> = Ok(3);
        assert_eq!(ok.log_and_continue(), Some(3));
        let failed: Result<u8> = Err(CdsEditError::compiler_error("down"));
        assert_eq!(failed.log_and_continue(), None);
    }
}
