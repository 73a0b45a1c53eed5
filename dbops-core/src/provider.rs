use crate::{Query, Result};

/// Deferred construction of a [`Query`].
///
/// Consumed by value so each execution invokes it at most once. Closures
/// returning `Result<Query>` and ready-made queries both qualify:
///
/// ```rust
/// use dbops_core::{Query, QueryProvider};
/// let provider = || -> dbops_core::Result<Query> { Ok(Query::from("SELECT 1")) };
/// assert_eq!(provider.provide().unwrap().sql, "SELECT 1");
/// ```
pub trait QueryProvider: Send {
    fn provide(self) -> Result<Query>;
}

impl<F> QueryProvider for F
where
    F: FnOnce() -> Result<Query> + Send,
{
    fn provide(self) -> Result<Query> {
        self()
    }
}

impl QueryProvider for Query {
    fn provide(self) -> Result<Query> {
        Ok(self)
    }
}
