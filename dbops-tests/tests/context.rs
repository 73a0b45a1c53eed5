#[cfg(test)]
mod tests {
    use dbops::{Context, Database, DbError, Feedback, Query, Result};
    use dbops_tests::{
        init_logs,
        mock::{Call, MockConnection, MockHandle, Response},
    };
    use std::time::Duration;
    use tokio::time::{Instant, sleep};

    fn database() -> (Database<MockConnection>, MockHandle) {
        init_logs();
        let handle = MockHandle::default();
        (Database::new(MockConnection::new(handle.clone())), handle)
    }

    #[tokio::test]
    async fn deadline_interrupts_a_pending_statement() {
        let (db, handle) = database();
        handle.respond(Response::Pending);
        let mut ctx = Context::background().with_timeout(Duration::from_millis(20));
        let error = db
            .execute(&mut ctx, Query::from("SELECT pg_sleep(10)"), Feedback::Ignore)
            .await
            .expect_err("The statement never completes");
        assert_eq!(DbError::of(&error), Some(DbError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn deadline_interrupts_a_pending_cursor() {
        let (db, handle) = database();
        handle.respond(Response::Pending);
        let mut ctx = Context::background().with_timeout(Duration::from_millis(20));
        let error = db
            .fetch_many::<(i64,)>(&mut ctx, Query::from("SELECT id FROM huge"))
            .await
            .expect_err("The cursor never yields");
        assert_eq!(DbError::of(&error), Some(DbError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn earliest_deadline_wins() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(3));
        assert_eq!(ctx.signal().deadline(), Some(now + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn expired_context_runs_nothing() {
        let (db, handle) = database();
        let mut ctx = Context::background().with_deadline(Instant::now());
        let error = db
            .execute(&mut ctx, Query::from("DELETE FROM t"), Feedback::Ignore)
            .await
            .expect_err("The deadline already passed");
        assert_eq!(DbError::of(&error), Some(DbError::DeadlineExceeded));
        assert!(handle.calls().is_empty());
    }

    #[tokio::test]
    async fn cancel_interrupts_a_pending_statement() {
        let (db, handle) = database();
        handle.respond(Response::Pending);
        let (mut ctx, canceller) = Context::background().with_cancel();
        let (result, _) = tokio::join!(
            db.execute(&mut ctx, Query::from("SELECT pg_sleep(10)"), Feedback::Ignore),
            async {
                sleep(Duration::from_millis(10)).await;
                canceller.cancel();
            }
        );
        let error = result.expect_err("The statement was cancelled");
        assert_eq!(DbError::of(&error), Some(DbError::Cancelled));
        assert_eq!(error.to_string(), "the operation was cancelled");
    }

    #[tokio::test]
    async fn cancelled_context_runs_nothing() {
        let (db, handle) = database();
        let (mut ctx, canceller) = Context::background().with_cancel();
        canceller.cancel();
        assert!(ctx.signal().is_cancelled());
        let error = db
            .transaction(&mut ctx, async |_ctx: &mut Context<'_>| -> Result<()> { Ok(()) })
            .await
            .expect_err("The context was cancelled");
        assert_eq!(DbError::of(&error), Some(DbError::Cancelled));
        assert!(handle.calls().is_empty());
    }

    #[tokio::test]
    async fn dropped_canceller_never_cancels() {
        let (db, handle) = database();
        handle.respond(Response::affected(1));
        let (mut ctx, canceller) = Context::background().with_cancel();
        drop(canceller);
        let affected = db
            .execute(&mut ctx, Query::from("DELETE FROM t"), Feedback::Required)
            .await
            .expect("Nobody can cancel anymore");
        assert_eq!(affected.rows_affected, 1);
    }

    #[tokio::test]
    async fn cancel_inside_a_transaction_rolls_back() {
        let (db, handle) = database();
        handle.respond(Response::affected(1));
        handle.respond(Response::Pending);
        let (mut ctx, canceller) = Context::background().with_cancel();
        let error = db
            .transaction(&mut ctx, async |ctx: &mut Context<'_>| -> Result<()> {
                db.execute(ctx, Query::from("INSERT INTO t VALUES (1)"), Feedback::Required)
                    .await?;
                canceller.cancel();
                db.execute(ctx, Query::from("INSERT INTO t VALUES (2)"), Feedback::Required)
                    .await?;
                Ok(())
            })
            .await
            .expect_err("The second statement was cancelled");
        assert_eq!(DbError::of(&error), Some(DbError::Cancelled));
        assert_eq!(handle.count(&Call::Rollback), 1);
        assert_eq!(handle.count(&Call::Commit), 0);
        assert_eq!(
            handle.statements(),
            [("INSERT INTO t VALUES (1)".to_string(), true)],
            "An already cancelled context does not reach the backend"
        );
    }
}
