//! Backend that talks to no database.
//!
//! Every transaction begins, commits and rolls back successfully, statements
//! affect zero rows and queries return no rows. It lets code built on
//! [`Database::transaction`](crate::Database::transaction) run without a
//! real database.

use crate::{
    Connection, Driver, Error, Executor, Query, QueryResult, Result, SqlWriter, Transaction,
    future::BoxFuture,
    stream::{self, BoxStream, StreamExt},
};
use std::future::Future;

#[derive(Default, Debug, Clone, Copy)]
pub struct NoopDriver;

#[derive(Default, Debug, Clone, Copy)]
pub struct NoopSqlWriter;

impl SqlWriter for NoopSqlWriter {}

impl Driver for NoopDriver {
    type Connection = NoopConnection;
    type SqlWriter = NoopSqlWriter;

    const NAME: &'static str = "noop";

    fn get_instance() -> Self {
        NoopDriver
    }

    fn sql_writer(&self) -> NoopSqlWriter {
        NoopSqlWriter
    }
}

#[derive(Default, Debug)]
pub struct NoopConnection {
    driver: NoopDriver,
}

impl NoopConnection {
    pub fn new() -> Self {
        Self::default()
    }
}

fn nothing<'s>(_query: Query) -> BoxStream<'s, Result<QueryResult>> {
    stream::empty().boxed()
}

impl Executor for NoopConnection {
    fn run<'s>(&'s mut self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        nothing(query)
    }
}

impl Connection for NoopConnection {
    type Driver = NoopDriver;

    fn driver(&self) -> &NoopDriver {
        &self.driver
    }

    fn connect(url: &str) -> impl Future<Output = Result<Self>> {
        let prefix = format!("{}://", NoopDriver::NAME);
        let result = if url.starts_with(&prefix) {
            Ok(NoopConnection::new())
        } else {
            Err(Error::msg(format!(
                "Noop connection url must start with `{prefix}`"
            )))
        };
        async move { result }
    }

    fn begin<'c>(&'c mut self) -> BoxFuture<'c, Result<Box<dyn Transaction<'c> + 'c>>> {
        Box::pin(async move {
            Ok(Box::new(NoopTransaction {
                _connection: self,
            }) as Box<dyn Transaction<'c> + 'c>)
        })
    }
}

/// Transaction of a [`NoopConnection`], it always settles successfully.
#[derive(Debug)]
pub struct NoopTransaction<'c> {
    _connection: &'c mut NoopConnection,
}

impl Executor for NoopTransaction<'_> {
    fn run<'s>(&'s mut self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        nothing(query)
    }
}

impl<'c> Transaction<'c> for NoopTransaction<'c> {
    fn as_executor(&mut self) -> &mut dyn Executor {
        self
    }

    fn commit(self: Box<Self>) -> BoxFuture<'c, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'c, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}
