use crate::{Executor, Result, future::BoxFuture};

/// An open transaction.
///
/// `commit` and `rollback` consume the handle, so it resolves exactly once.
/// Dropping it without calling either leaves the outcome to the backend.
pub trait Transaction<'c>: Executor {
    fn as_executor(&mut self) -> &mut dyn Executor;
    fn commit(self: Box<Self>) -> BoxFuture<'c, Result<()>>;
    fn rollback(self: Box<Self>) -> BoxFuture<'c, Result<()>>;
}
