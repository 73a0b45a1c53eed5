use crate::{DbError, Executor, Result};
use std::{fmt, future::Future, time::Duration};
use tokio::{
    sync::watch,
    time::{Instant, sleep_until},
};

/// Cancellation signal shared by every call made with the same [`Context`].
///
/// Combines an optional explicit cancel handle with an optional deadline.
#[derive(Default, Clone, Debug)]
pub struct Signal {
    cancellation: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Signal {
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(|v| *v.borrow())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Error to report if the signal already fired, if any.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(DbError::Cancelled.into());
        }
        if self.deadline.is_some_and(|v| v <= Instant::now()) {
            return Err(DbError::DeadlineExceeded.into());
        }
        Ok(())
    }

    /// Drive `future` to completion unless the signal fires first.
    ///
    /// When it fires the future is dropped and the error is
    /// [`DbError::Cancelled`] or [`DbError::DeadlineExceeded`].
    pub async fn guard<T>(&self, future: impl Future<Output = T>) -> Result<T> {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(DbError::Cancelled.into()),
            _ = self.expired() => Err(DbError::DeadlineExceeded.into()),
            result = future => Ok(result),
        }
    }

    async fn cancelled(&self) {
        let Some(receiver) = &self.cancellation else {
            return std::future::pending().await;
        };
        let mut receiver = receiver.clone();
        let closed = receiver.wait_for(|v| *v).await.is_err();
        if closed {
            // Dropped handle, it can no longer cancel
            std::future::pending::<()>().await;
        }
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

/// Handle that cancels every call made with the paired [`Context`].
#[derive(Debug)]
pub struct Canceller(watch::Sender<bool>);

impl Canceller {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Execution context threaded through every database call.
///
/// Carries the cancellation [`Signal`] and, while inside
/// [`Database::transaction`](crate::Database::transaction), the active
/// transaction. Statements run with a context holding a transaction go
/// through that transaction instead of the base connection.
///
/// Only the transaction manager can place a transaction in a context, and
/// the borrow ends when the transaction body returns.
#[derive(Default)]
pub struct Context<'t> {
    pub(crate) signal: Signal,
    pub(crate) transaction: Option<&'t mut dyn Executor>,
}

impl Context<'static> {
    /// Empty context: never cancelled, no deadline, no transaction.
    pub fn background() -> Self {
        Self::default()
    }
}

impl<'t> Context<'t> {
    /// Cancel at `deadline`, or earlier if a previous deadline is earlier.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.signal.deadline = Some(match self.signal.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attach an explicit cancel handle, replacing any previous one.
    pub fn with_cancel(mut self) -> (Self, Canceller) {
        let (sender, receiver) = watch::channel(false);
        self.signal.cancellation = Some(receiver);
        (self, Canceller(sender))
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Context with the same signal, running on `transaction`.
    pub(crate) fn derive<'a>(&self, transaction: &'a mut dyn Executor) -> Context<'a> {
        Context {
            signal: self.signal.clone(),
            transaction: Some(transaction),
        }
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("signal", &self.signal)
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}
