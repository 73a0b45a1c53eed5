use crate::{Connection, SqlWriter};

/// Static description of a backend: its name, connection type and dialect.
pub trait Driver: Send + Sync {
    type Connection: Connection;
    type SqlWriter: SqlWriter;

    /// Backend name, as used in connection URLs.
    const NAME: &'static str;

    fn get_instance() -> Self
    where
        Self: Sized;
    fn sql_writer(&self) -> Self::SqlWriter;
}
