use crate::{Driver, Executor, Result, Transaction, future::BoxFuture};
use std::future::Future;

/// A live session with a backend.
pub trait Connection: Executor + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Open a connection to the given URL.
    fn connect(url: &str) -> impl Future<Output = Result<Self>>;

    /// Start a transaction, borrowing the connection until it is settled.
    fn begin<'c>(&'c mut self) -> BoxFuture<'c, Result<Box<dyn Transaction<'c> + 'c>>>;
}
