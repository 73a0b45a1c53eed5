use crate::{
    Query, QueryResult, Result, RowLabeled, RowsAffected,
    future::{BoxFuture, FutureExt},
    stream::{BoxStream, StreamExt, TryStreamExt},
};

/// Anything able to run a [`Query`]: a connection or an open transaction.
///
/// Object safe, so the active transaction can travel as `&mut dyn Executor`
/// inside a [`Context`](crate::Context).
pub trait Executor: Send {
    /// General method to send any query and return any result type (either row or count).
    fn run<'s>(&'s mut self, query: Query) -> BoxStream<'s, Result<QueryResult>>;

    /// Execute the query and returns the rows.
    fn fetch<'s>(&'s mut self, query: Query) -> BoxStream<'s, Result<RowLabeled>> {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Row(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .boxed()
    }

    /// Execute the query and return the first row, if any.
    fn fetch_one<'s>(&'s mut self, query: Query) -> BoxFuture<'s, Result<Option<RowLabeled>>> {
        Box::pin(async move {
            let mut stream = self.fetch(query);
            stream.next().await.transpose()
        })
    }

    /// Execute the query and return the total number of rows affected.
    fn execute<'s>(&'s mut self, query: Query) -> BoxFuture<'s, Result<RowsAffected>> {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect::<RowsAffected>()
            .boxed()
    }
}
