//! Generic SQL data access.
//!
//! Parameterized queries, typed row mapping and context-propagated
//! transactions on top of any backend implementing [`Connection`].
//!
//! ```rust
//! use dbops::{Context, Database, Feedback, Query, Record, noop::NoopConnection};
//!
//! #[derive(Default, Record)]
//! struct Account {
//!     id: i64,
//!     email: String,
//! }
//!
//! # tokio_test_block(async {
//! let db = Database::<NoopConnection>::connect("noop://").await?;
//! let mut ctx = Context::background();
//! db.transaction(&mut ctx, async |ctx| {
//!     db.execute(ctx, Query::from("UPDATE accounts SET active = 1"), Feedback::Ignore)
//!         .await?;
//!     let account = db
//!         .fetch_one::<Account>(ctx, Query::from("SELECT id, email FROM accounts"))
//!         .await?;
//!     assert!(account.is_none());
//!     Ok(())
//! })
//! .await
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = dbops::Result<()>>) {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f).unwrap();
//! # }
//! ```

pub use dbops_core::*;
pub use dbops_macros::*;
