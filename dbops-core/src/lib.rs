mod as_value;
mod builder;
mod connection;
mod context;
mod database;
mod driver;
mod error;
mod executor;
pub mod noop;
mod provider;
mod query;
mod scan;
mod sql_writer;
mod transaction;
mod util;
mod value;

pub use ::anyhow::Context as ErrorContext;
pub use as_value::*;
pub use builder::*;
pub use connection::*;
pub use context::*;
pub use database::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use provider::*;
pub use query::*;
pub use scan::*;
pub use sql_writer::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
