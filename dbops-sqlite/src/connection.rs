use crate::{
    CBox, SqliteDriver, SqliteTransaction,
    bind::bind_args,
    error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use async_stream::try_stream;
use dbops_core::{
    Connection, Driver, Error, ErrorContext, Executor, Query, QueryResult, Result, Row,
    RowLabeled, RowNames, RowsAffected, Transaction,
    future::BoxFuture,
    stream::{BoxStream, StreamExt},
    truncate_long,
};
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, CString, c_int},
    ptr,
    sync::atomic::{AtomicPtr, Ordering},
};
use tokio::task::spawn_blocking;

/// Milliseconds a statement waits on a locked database before failing.
const BUSY_TIMEOUT_MS: c_int = 5_000;

/// Connection to a SQLite database.
///
/// Opened from URLs like `sqlite://path/to/file.sqlite?mode=rwc` or
/// `sqlite://:memory:`. Everything after the scheme is used as a SQLite URI
/// filename, so the usual URI parameters (`mode`, `cache`, ...) apply.
pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
    driver: SqliteDriver,
}

impl SqliteConnection {
    pub(crate) fn last_error(&self) -> Error {
        unsafe { Error::msg(error_message_from_ptr(&sqlite3_errmsg(*self.connection)).to_string()) }
    }

    /// Compile `sql`, the statement pointer is null when `sql` contains no statement.
    async fn prepare(&mut self, sql: String) -> Result<CBox<*mut sqlite3_stmt>> {
        let connection = AtomicPtr::new(*self.connection);
        let context = format!("While preparing the query:\n{}", truncate_long!(sql));
        let prepared = spawn_blocking(move || unsafe {
            let connection = connection.load(Ordering::Relaxed);
            let source = match CString::new(sql.as_bytes()) {
                Ok(source) => source,
                Err(e) => {
                    let error =
                        Error::new(e).context("Could not create a CString from the query String");
                    log::error!("{:#}", error);
                    return Err(error);
                }
            };
            let mut statement = CBox::new(ptr::null_mut(), |p| {
                sqlite3_finalize(p);
            });
            let mut tail = ptr::null();
            let rc = sqlite3_prepare_v2(
                connection,
                source.as_ptr(),
                sql.len() as c_int,
                &mut *statement,
                &mut tail,
            );
            if rc != SQLITE_OK {
                let error =
                    Error::msg(error_message_from_ptr(&sqlite3_errmsg(connection)).to_string())
                        .context(context);
                log::error!("{:#}", error);
                return Err(error);
            }
            if !tail.is_null()
                && !CStr::from_ptr(tail)
                    .to_bytes()
                    .iter()
                    .all(u8::is_ascii_whitespace)
            {
                let error =
                    Error::msg("Cannot prepare more than one statement at a time").context(context);
                log::error!("{:#}", error);
                return Err(error);
            }
            Ok(statement)
        })
        .await?;
        prepared
    }
}

impl Executor for SqliteConnection {
    fn run<'s>(&'s mut self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        try_stream! {
            let Query { sql, args } = query;
            let statement = self.prepare(sql).await?;
            if statement.is_null() {
                yield QueryResult::Affected(RowsAffected::default());
            } else {
                unsafe { bind_args(*statement, &args)? };
                let count = unsafe { sqlite3_column_count(*statement) };
                if count == 0 {
                    let (changes, rowid) = unsafe {
                        (
                            sqlite3_total_changes64(*self.connection),
                            sqlite3_last_insert_rowid(*self.connection),
                        )
                    };
                    loop {
                        match unsafe { sqlite3_step(*statement) } {
                            SQLITE_DONE => break,
                            SQLITE_ROW => continue,
                            _ => Err::<(), _>(self.last_error())?,
                        }
                    }
                    let (total, last) = unsafe {
                        (
                            sqlite3_total_changes64(*self.connection),
                            sqlite3_last_insert_rowid(*self.connection),
                        )
                    };
                    // The total includes trigger writes, only the statement's own rows count
                    let rows_affected = if total == changes {
                        0
                    } else {
                        unsafe { sqlite3_changes64(*self.connection) }.max(0) as u64
                    };
                    yield QueryResult::Affected(RowsAffected {
                        rows_affected,
                        last_affected_id: (last != rowid).then_some(last),
                    });
                } else {
                    let labels = (0..count)
                        .map(|i| unsafe { extract_name(*statement, i) })
                        .collect::<Result<RowNames>>()?;
                    loop {
                        match unsafe { sqlite3_step(*statement) } {
                            SQLITE_ROW => {
                                let values = (0..count)
                                    .map(|i| unsafe { extract_value(*statement, i) })
                                    .collect::<Result<Row>>()?;
                                yield QueryResult::Row(RowLabeled::new(labels.clone(), values));
                            }
                            SQLITE_DONE => break,
                            _ => Err::<(), _>(self.last_error())?,
                        }
                    }
                }
            }
        }
        .boxed()
    }
}

impl Connection for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        &self.driver
    }

    async fn connect(url: &str) -> Result<SqliteConnection> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let context = || format!("While decoding the connection URL: `{}`", url);
        let filename = CString::new(format!("file:{location}")).with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                filename.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        let result = Self {
            connection,
            driver: SqliteDriver::new(),
        };
        if rc != SQLITE_OK {
            let error = result
                .last_error()
                .context(format!("Could not open the database `{}`", url));
            log::error!("{:#}", error);
            return Err(error);
        }
        unsafe {
            sqlite3_busy_timeout(*result.connection, BUSY_TIMEOUT_MS);
        }
        Ok(result)
    }

    fn begin<'c>(&'c mut self) -> BoxFuture<'c, Result<Box<dyn Transaction<'c> + 'c>>> {
        Box::pin(async move {
            let transaction = SqliteTransaction::new(self).await?;
            Ok(Box::new(transaction) as Box<dyn Transaction<'c> + 'c>)
        })
    }
}
