use crate::Placeholder;

/// Dialect specific SQL text used by the core.
pub trait SqlWriter {
    /// Positional placeholder style of the backend.
    fn placeholder(&self) -> Placeholder {
        Placeholder::QuestionMark
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK");
    }
}
