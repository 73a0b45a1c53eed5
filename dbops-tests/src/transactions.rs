use crate::{dialect, silent_logs};
use dbops::{Connection, Context, Database, Error, Feedback, Query, Result, Value};
use futures::FutureExt;
use std::{
    panic::AssertUnwindSafe,
    sync::LazyLock,
};
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

async fn total<C: Connection>(db: &Database<C>, ctx: &mut Context<'_>) -> u64 {
    db.count(ctx, Query::from("SELECT count(*) FROM ledger"))
        .await
        .expect("Failed to count the ledger entries")
}

pub async fn transactions<C: Connection>(db: &Database<C>) {
    let _lock = MUTEX.lock().await;
    let mut ctx = Context::background();

    // Setup
    db.execute(&mut ctx, Query::from("DROP TABLE IF EXISTS ledger"), Feedback::Ignore)
        .await
        .expect("Failed to drop the ledger table");
    db.execute(
        &mut ctx,
        Query::from("CREATE TABLE ledger (entry TEXT NOT NULL, amount INTEGER NOT NULL)"),
        Feedback::Ignore,
    )
    .await
    .expect("Failed to create the ledger table");
    let insert = dialect(db, "INSERT INTO ledger (entry, amount) VALUES (?, ?)");
    let entry = |name: &str, amount: i64| Query::new(insert.as_str(), [Value::from(name), Value::from(amount)]);

    // Commit
    let inserted = db
        .transaction(&mut ctx, async |ctx: &mut Context<'_>| -> Result<u64> {
            let mut rows = 0;
            for (name, amount) in [("rent", -900), ("salary", 2500)] {
                rows += db
                    .execute(ctx, entry(name, amount), Feedback::Required)
                    .await?
                    .rows_affected;
            }
            // Reads inside the transaction see its own writes
            assert_eq!(total(db, ctx).await, 2);
            Ok(rows)
        })
        .await
        .expect("Failed to commit the transaction");
    assert_eq!(inserted, 2);
    assert_eq!(total(db, &mut ctx).await, 2);

    // Rollback on error
    let error = db
        .transaction(&mut ctx, async |ctx: &mut Context<'_>| -> Result<()> {
            db.execute(ctx, entry("groceries", -120), Feedback::Required)
                .await?;
            Err(Error::msg("insufficient funds"))
        })
        .await
        .expect_err("The transaction body failed");
    assert_eq!(error.to_string(), "insufficient funds");
    assert_eq!(total(db, &mut ctx).await, 2);

    // Rollback on a failing statement
    let failed = silent_logs! {
        db.transaction(&mut ctx, async |ctx: &mut Context<'_>| -> Result<()> {
            db.execute(ctx, entry("bonus", 300), Feedback::Required)
                .await?;
            db.execute(ctx, Query::from("INSERT INTO missing_table VALUES (1)"), Feedback::Ignore)
                .await?;
            Ok(())
        })
        .await
        .is_err()
    };
    assert!(failed);
    assert_eq!(total(db, &mut ctx).await, 2);

    // Rollback on panic, then the panic continues
    let outcome = AssertUnwindSafe(db.transaction(
        &mut ctx,
        async |ctx: &mut Context<'_>| -> Result<()> {
            db.execute(ctx, entry("lottery", 1_000_000), Feedback::Required)
                .await?;
            panic!("the body gave up");
        },
    ))
    .catch_unwind()
    .await;
    assert!(outcome.is_err(), "The panic must reach the caller");
    assert_eq!(total(db, &mut ctx).await, 2);

    // Nested calls join the outer transaction
    let error = db
        .transaction(&mut ctx, async |ctx: &mut Context<'_>| -> Result<()> {
            db.transaction(ctx, async |ctx: &mut Context<'_>| -> Result<()> {
                db.execute(ctx, entry("refund", 40), Feedback::Required)
                    .await?;
                Ok(())
            })
            .await?;
            assert_eq!(total(db, ctx).await, 3);
            Err(Error::msg("changed my mind"))
        })
        .await
        .expect_err("The outer body failed");
    assert_eq!(error.to_string(), "changed my mind");
    assert_eq!(total(db, &mut ctx).await, 2);
}
