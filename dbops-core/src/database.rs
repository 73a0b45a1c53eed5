use crate::{
    Connection, Context, DbError, Driver, Executor, QueryBuilder, QueryProvider, Result,
    RowsAffected, ScanRow, Signal, SqlWriter, Transaction, scan_row, stream::StreamExt,
};
use futures::FutureExt;
use std::{
    ops::AsyncFnOnce,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};
use tokio::sync::{Mutex, MutexGuard};

/// Whether zero affected rows is a failure for [`Database::execute`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Any number of affected rows is a success.
    #[default]
    Ignore,
    /// Zero affected rows fails with [`DbError::ZeroRowsAffected`].
    Required,
}

/// Shared handle to a base connection, entry point of every operation.
///
/// Cloning is cheap and every clone uses the same connection. Statements
/// lock the connection for their own duration, a transaction locks it until
/// it is settled. Calls made with a [`Context`] carrying a transaction run
/// through that transaction instead.
pub struct Database<C: Connection> {
    connection: Arc<Mutex<C>>,
}

impl<C: Connection> Clone for Database<C> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
        }
    }
}

enum Target<'a, C> {
    Transaction(&'a mut dyn Executor),
    Base(MutexGuard<'a, C>),
}

impl<C: Connection> Target<'_, C> {
    fn executor(&mut self) -> &mut dyn Executor {
        match self {
            Target::Transaction(executor) => &mut **executor,
            Target::Base(connection) => &mut **connection,
        }
    }
}

impl<C: Connection> Database<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(C::connect(url).await?))
    }

    /// Builder using the placeholder style of the backend.
    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(C::Driver::get_instance().sql_writer().placeholder())
    }

    /// The transaction in `ctx` if any, the locked base connection otherwise.
    async fn acquire<'a>(
        &'a self,
        ctx: &'a mut Context<'_>,
    ) -> Result<(Target<'a, C>, &'a Signal)> {
        let signal = &ctx.signal;
        signal.check()?;
        let target = match &mut ctx.transaction {
            Some(transaction) => Target::Transaction(&mut **transaction),
            None => Target::Base(signal.guard(self.connection.lock()).await?),
        };
        Ok((target, signal))
    }

    /// Run a statement and report the rows it affected.
    ///
    /// With [`Feedback::Required`] zero affected rows is reported as
    /// [`DbError::ZeroRowsAffected`].
    pub async fn execute(
        &self,
        ctx: &mut Context<'_>,
        provider: impl QueryProvider,
        feedback: Feedback,
    ) -> Result<RowsAffected> {
        let query = provider.provide()?;
        let (mut target, signal) = self.acquire(ctx).await?;
        let affected = signal.guard(target.executor().execute(query)).await??;
        if affected.rows_affected == 0 && feedback == Feedback::Required {
            return Err(DbError::ZeroRowsAffected.into());
        }
        Ok(affected)
    }

    /// Fetch at most one record, `None` when the query returns no rows.
    pub async fn fetch_one<T>(
        &self,
        ctx: &mut Context<'_>,
        provider: impl QueryProvider,
    ) -> Result<Option<T>>
    where
        T: ScanRow + Default + Send,
    {
        let query = provider.provide()?;
        let (mut target, signal) = self.acquire(ctx).await?;
        let Some(row) = signal.guard(target.executor().fetch_one(query)).await?? else {
            return Ok(None);
        };
        let mut record = T::default();
        scan_row(&mut record, row)?;
        Ok(Some(record))
    }

    /// Fetch every record returned by the query, in order.
    ///
    /// A row that does not fit `T` aborts with [`DbError::ScanRow`], the
    /// underlying conversion error is logged.
    pub async fn fetch_many<T>(
        &self,
        ctx: &mut Context<'_>,
        provider: impl QueryProvider,
    ) -> Result<Vec<T>>
    where
        T: ScanRow + Default + Send,
    {
        let query = provider.provide()?;
        let (mut target, signal) = self.acquire(ctx).await?;
        let mut stream = target.executor().fetch(query);
        let mut records = Vec::new();
        while let Some(row) = signal.guard(stream.next()).await? {
            let mut record = T::default();
            if let Err(error) = scan_row(&mut record, row?) {
                log::error!("{:#}", error);
                return Err(DbError::ScanRow.into());
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Value of a single column count query, `0` when no row is returned.
    pub async fn count(&self, ctx: &mut Context<'_>, provider: impl QueryProvider) -> Result<u64> {
        Ok(self
            .fetch_one::<(u64,)>(ctx, provider)
            .await?
            .map(|(count,)| count)
            .unwrap_or_default())
    }

    /// Run `body` inside a transaction.
    ///
    /// The body receives a context carrying the transaction, every call made
    /// with it joins the transaction. When the body returns `Ok` the
    /// transaction is committed and a commit failure is returned. When it
    /// returns `Err` or panics the transaction is rolled back, the original
    /// error is returned (or the panic resumed) and a rollback failure is
    /// only logged.
    ///
    /// If `ctx` already carries a transaction the body runs in it and the
    /// outer call remains the one settling it.
    pub async fn transaction<R, F>(&self, ctx: &mut Context<'_>, body: F) -> Result<R>
    where
        F: AsyncFnOnce(&mut Context<'_>) -> Result<R>,
    {
        if ctx.in_transaction() {
            log::debug!("Joining the transaction already carried by the context");
            return body(ctx).await;
        }
        let mut connection = ctx.signal.guard(self.connection.lock()).await?;
        let mut transaction = ctx.signal.guard(connection.begin()).await??;
        let mut scope = ctx.derive(transaction.as_executor());
        let outcome = AssertUnwindSafe(body(&mut scope)).catch_unwind().await;
        drop(scope);
        settle(transaction, outcome).await
    }
}

async fn settle<'c, R>(
    transaction: Box<dyn Transaction<'c> + 'c>,
    outcome: thread::Result<Result<R>>,
) -> Result<R> {
    match outcome {
        Ok(Ok(value)) => {
            if let Err(error) = transaction.commit().await {
                log::error!("Could not commit the transaction: {:#}", error);
                return Err(error);
            }
            Ok(value)
        }
        Ok(Err(error)) => {
            if let Err(e) = transaction.rollback().await {
                log::error!("Could not roll back the transaction: {:#}", e);
            }
            Err(error)
        }
        Err(payload) => {
            log::warn!("The transaction body panicked, rolling back");
            if let Err(e) = transaction.rollback().await {
                log::error!("Could not roll back the transaction: {:#}", e);
            }
            panic::resume_unwind(payload)
        }
    }
}
