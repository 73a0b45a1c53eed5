use dbops::{
    Connection, Driver, Error, Executor, Query, QueryResult, Result, RowLabeled, RowNames,
    RowsAffected, SqlWriter, Transaction, Value,
    future::BoxFuture,
    stream::{self, BoxStream, StreamExt},
};
use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};

/// Interaction recorded by a [`MockConnection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Run {
        sql: String,
        args: Vec<Value>,
        in_transaction: bool,
    },
    Begin,
    Commit,
    Rollback,
}

/// Scripted outcome of the next statement.
#[derive(Debug, Clone)]
pub enum Response {
    /// Rows, then the end of the result set.
    Rows(RowNames, Vec<Vec<Value>>),
    /// Rows, then a cursor failure.
    RowsThenError(RowNames, Vec<Vec<Value>>, String),
    Affected(RowsAffected),
    Error(String),
    /// Never completes.
    Pending,
}

impl Response {
    pub fn rows(labels: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Response::Rows(labels.iter().map(|v| v.to_string()).collect(), rows)
    }

    pub fn affected(rows_affected: u64) -> Self {
        Response::Affected(RowsAffected {
            rows_affected,
            last_affected_id: None,
        })
    }

    fn into_stream<'s>(self) -> BoxStream<'s, Result<QueryResult>> {
        let labeled = |labels: RowNames, rows: Vec<Vec<Value>>| {
            rows.into_iter()
                .map(move |v| {
                    Ok(QueryResult::Row(RowLabeled::new(
                        labels.clone(),
                        v.into_boxed_slice(),
                    )))
                })
                .collect::<Vec<_>>()
        };
        match self {
            Response::Rows(labels, rows) => stream::iter(labeled(labels, rows)).boxed(),
            Response::RowsThenError(labels, rows, error) => {
                let mut items = labeled(labels, rows);
                items.push(Err(Error::msg(error)));
                stream::iter(items).boxed()
            }
            Response::Affected(affected) => {
                stream::iter([Ok(QueryResult::Affected(affected))]).boxed()
            }
            Response::Error(error) => stream::iter([Err(Error::msg(error))]).boxed(),
            Response::Pending => stream::pending().boxed(),
        }
    }
}

#[derive(Default, Debug)]
struct MockState {
    calls: Vec<Call>,
    responses: VecDeque<Response>,
    fail_begin: Option<String>,
    fail_commit: Option<String>,
    fail_rollback: Option<String>,
}

/// Shared view of a [`MockConnection`]: scripts responses and reads the call log.
#[derive(Default, Debug, Clone)]
pub struct MockHandle(Arc<Mutex<MockState>>);

impl MockHandle {
    fn state(&self) -> MutexGuard<'_, MockState> {
        // A test that panicked while holding the lock must not hide the call log
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue the response of the next statement. Without one a statement yields nothing.
    pub fn respond(&self, response: Response) -> &Self {
        self.state().responses.push_back(response);
        self
    }

    pub fn fail_begin(&self, error: &str) -> &Self {
        self.state().fail_begin = Some(error.into());
        self
    }

    pub fn fail_commit(&self, error: &str) -> &Self {
        self.state().fail_commit = Some(error.into());
        self
    }

    pub fn fail_rollback(&self, error: &str) -> &Self {
        self.state().fail_rollback = Some(error.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.state().calls.iter().filter(|v| *v == call).count()
    }

    /// Statements recorded, with whether they ran inside a transaction.
    pub fn statements(&self) -> Vec<(String, bool)> {
        self.state()
            .calls
            .iter()
            .filter_map(|v| match v {
                Call::Run {
                    sql,
                    in_transaction,
                    ..
                } => Some((sql.clone(), *in_transaction)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }

    fn run<'s>(&self, query: Query, in_transaction: bool) -> BoxStream<'s, Result<QueryResult>> {
        let mut state = self.state();
        state.calls.push(Call::Run {
            sql: query.sql,
            args: query.args,
            in_transaction,
        });
        match state.responses.pop_front() {
            Some(response) => response.into_stream(),
            None => stream::empty().boxed(),
        }
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct MockDriver;

#[derive(Default, Debug, Clone, Copy)]
pub struct MockSqlWriter;

impl SqlWriter for MockSqlWriter {}

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = MockSqlWriter;

    const NAME: &'static str = "mock";

    fn get_instance() -> Self {
        MockDriver
    }

    fn sql_writer(&self) -> MockSqlWriter {
        MockSqlWriter
    }
}

/// Connection recording every interaction into a [`MockHandle`].
#[derive(Default, Debug)]
pub struct MockConnection {
    handle: MockHandle,
    driver: MockDriver,
}

impl MockConnection {
    pub fn new(handle: MockHandle) -> Self {
        Self {
            handle,
            driver: MockDriver,
        }
    }

    pub fn handle(&self) -> &MockHandle {
        &self.handle
    }
}

impl Executor for MockConnection {
    fn run<'s>(&'s mut self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        self.handle.run(query, false)
    }
}

impl Connection for MockConnection {
    type Driver = MockDriver;

    fn driver(&self) -> &MockDriver {
        &self.driver
    }

    fn connect(url: &str) -> impl Future<Output = Result<Self>> {
        let prefix = format!("{}://", MockDriver::NAME);
        let result = if url.starts_with(&prefix) {
            Ok(MockConnection::default())
        } else {
            Err(Error::msg(format!(
                "Expected mock connection url to start with `{prefix}`"
            )))
        };
        async move { result }
    }

    fn begin<'c>(&'c mut self) -> BoxFuture<'c, Result<Box<dyn Transaction<'c> + 'c>>> {
        Box::pin(async move {
            self.handle.record(Call::Begin);
            if let Some(error) = self.handle.state().fail_begin.clone() {
                return Err(Error::msg(error));
            }
            Ok(Box::new(MockTransaction { connection: self }) as Box<dyn Transaction<'c> + 'c>)
        })
    }
}

/// Transaction of a [`MockConnection`], statements are recorded as `in_transaction`.
#[derive(Debug)]
pub struct MockTransaction<'c> {
    connection: &'c mut MockConnection,
}

impl Executor for MockTransaction<'_> {
    fn run<'s>(&'s mut self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        self.connection.handle.run(query, true)
    }
}

impl<'c> Transaction<'c> for MockTransaction<'c> {
    fn as_executor(&mut self) -> &mut dyn Executor {
        self
    }

    fn commit(self: Box<Self>) -> BoxFuture<'c, Result<()>> {
        let handle = self.connection.handle.clone();
        Box::pin(async move {
            handle.record(Call::Commit);
            match handle.state().fail_commit.clone() {
                Some(error) => Err(Error::msg(error)),
                None => Ok(()),
            }
        })
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'c, Result<()>> {
        let handle = self.connection.handle.clone();
        Box::pin(async move {
            handle.record(Call::Rollback);
            match handle.state().fail_rollback.clone() {
                Some(error) => Err(Error::msg(error)),
                None => Ok(()),
            }
        })
    }
}
