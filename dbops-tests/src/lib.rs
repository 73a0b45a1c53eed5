pub mod mock;

mod accounts;
mod todos;
mod transactions;

use crate::{accounts::accounts, todos::todos};
use dbops::{Connection, Database, Placeholder};
use log::LevelFilter;
use std::{env, fmt::Write};
#[cfg(not(feature = "disable-transactions"))]
use transactions::transactions;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run the whole backend suite against `connection`.
pub async fn execute_tests<C: Connection>(connection: C) {
    let db = Database::new(connection);
    accounts(&db).await;
    todos(&db).await;
    #[cfg(not(feature = "disable-transactions"))]
    transactions(&db).await;
}

/// Rewrite the `?` placeholders of `sql` into the style of the backend of `db`.
pub fn dialect<C: Connection>(db: &Database<C>, sql: &str) -> String {
    match db.query_builder().placeholder() {
        Placeholder::QuestionMark => sql.into(),
        Placeholder::Dollar => {
            let mut out = String::with_capacity(sql.len() + 8);
            for (i, part) in sql.split('?').enumerate() {
                if i > 0 {
                    let _ = write!(out, "${i}");
                }
                out.push_str(part);
            }
            out
        }
    }
}

/// Evaluate the code with logging turned off, returning its value.
#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        let result = { $($code)+ };
        log::set_max_level(level);
        result
    }};
}
