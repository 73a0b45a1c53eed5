use thiserror::Error;

/// Outcomes of a database call that callers are expected to tell apart.
///
/// They travel inside [`crate::Error`] and are recovered with
/// `error.downcast_ref::<DbError>()`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbError {
    #[error("no rows affected by an update, insert, or delete")]
    ZeroRowsAffected,
    #[error("failed to scan column into field type")]
    ScanRow,
    #[error("the operation was cancelled")]
    Cancelled,
    #[error("the operation deadline was exceeded")]
    DeadlineExceeded,
}

impl DbError {
    /// Classify any error carrying a [`DbError`] anywhere in its chain.
    pub fn of(error: &crate::Error) -> Option<DbError> {
        error.chain().find_map(|e| e.downcast_ref::<DbError>()).copied()
    }
}
