use crate::SqliteConnection;
use dbops_core::{
    Connection, Driver, Executor, Query, QueryResult, Result, SqlWriter, Transaction,
    future::{BoxFuture, FutureExt},
    stream::BoxStream,
};
use libsqlite3_sys::{SQLITE_OK, sqlite3_exec, sqlite3_get_autocommit};
use std::{ffi::CString, ptr};

/// Transaction on a [`SqliteConnection`], borrowing it until settled.
///
/// Dropped while still open, without `commit` or `rollback`, it rolls back.
pub struct SqliteTransaction<'c> {
    connection: &'c mut SqliteConnection,
    settled: bool,
}

impl<'c> SqliteTransaction<'c> {
    pub async fn new(connection: &'c mut SqliteConnection) -> Result<Self> {
        let mut sql = String::new();
        connection
            .driver()
            .sql_writer()
            .write_transaction_begin(&mut sql);
        connection.execute(sql.into()).await?;
        Ok(Self {
            connection,
            settled: false,
        })
    }

    fn is_open(&self) -> bool {
        unsafe { sqlite3_get_autocommit(*self.connection.connection) == 0 }
    }

    /// Run `sql`, then close the transaction if SQLite kept it open.
    ///
    /// A `COMMIT` failing on deferred constraints leaves the transaction
    /// active, it is rolled back here so the connection can begin again.
    async fn settle(mut self: Box<Self>, sql: String) -> Result<()> {
        let result = self.connection.execute(sql.into()).await.map(|_| ());
        if result.is_err() && self.is_open() {
            log::warn!("The transaction is still open after a failed settlement, rolling back");
            let mut sql = String::new();
            self.connection
                .driver()
                .sql_writer()
                .write_transaction_rollback(&mut sql);
            if let Err(e) = self.connection.execute(sql.into()).await {
                log::error!("Could not roll back the transaction: {:#}", e);
                return result;
            }
        }
        self.settled = true;
        result
    }
}

impl Executor for SqliteTransaction<'_> {
    fn run<'s>(&'s mut self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        self.connection.run(query)
    }
}

impl<'c> Transaction<'c> for SqliteTransaction<'c> {
    fn as_executor(&mut self) -> &mut dyn Executor {
        self
    }

    fn commit(self: Box<Self>) -> BoxFuture<'c, Result<()>> {
        let mut sql = String::new();
        self.connection
            .driver()
            .sql_writer()
            .write_transaction_commit(&mut sql);
        self.settle(sql).boxed()
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'c, Result<()>> {
        let mut sql = String::new();
        self.connection
            .driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        self.settle(sql).boxed()
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if !self.is_open() {
            return;
        }
        let connection = *self.connection.connection;
        log::warn!("Transaction dropped while still open, rolling back");
        let mut sql = String::new();
        self.connection
            .driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        let Ok(sql) = CString::new(sql) else {
            return;
        };
        let rc = unsafe {
            sqlite3_exec(
                connection,
                sql.as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if rc != SQLITE_OK {
            log::error!("{:#}", self.connection.last_error());
        }
    }
}
