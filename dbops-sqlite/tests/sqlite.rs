#[cfg(test)]
mod tests {
    use dbops::{Connection, Context, Database, Feedback, Query, Result};
    use dbops_sqlite::SqliteConnection;
    use dbops_tests::{execute_tests, init_logs, silent_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    async fn memory() -> Database<SqliteConnection> {
        init_logs();
        Database::connect("sqlite://:memory:")
            .await
            .expect("Could not open an in memory database")
    }

    async fn setup(db: &Database<SqliteConnection>, statements: &[&str]) {
        let mut ctx = Context::background();
        for sql in statements {
            db.execute(&mut ctx, Query::from(*sql), Feedback::Ignore)
                .await
                .expect(format!("Failed to run `{}`", sql).as_str());
        }
    }

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        const DB_PATH: &str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).await.expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        let connection = SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        execute_tests(connection).await;
    }

    #[tokio::test]
    async fn trigger_writes_are_not_affected_rows() {
        let db = memory().await;
        setup(
            &db,
            &[
                "CREATE TABLE orders (id INTEGER PRIMARY KEY, total INTEGER NOT NULL)",
                "CREATE TABLE audit (entry TEXT NOT NULL)",
                "CREATE TRIGGER orders_created AFTER INSERT ON orders BEGIN INSERT INTO audit VALUES ('created'); INSERT INTO audit VALUES ('checked'); END",
                "CREATE TRIGGER orders_updated AFTER UPDATE ON orders BEGIN INSERT INTO audit VALUES ('updated'); END",
            ],
        )
        .await;
        let mut ctx = Context::background();
        let inserted = db
            .execute(
                &mut ctx,
                Query::from("INSERT INTO orders (total) VALUES (?)").bind(10i64),
                Feedback::Required,
            )
            .await
            .expect("Failed to insert an order");
        assert_eq!(inserted.rows_affected, 1);
        assert_eq!(inserted.last_affected_id, Some(1));
        db.execute(
            &mut ctx,
            Query::from("INSERT INTO orders (total) VALUES (?)").bind(20i64),
            Feedback::Required,
        )
        .await
        .expect("Failed to insert an order");
        let updated = db
            .execute(
                &mut ctx,
                Query::from("UPDATE orders SET total = total + 1"),
                Feedback::Required,
            )
            .await
            .expect("Failed to update the orders");
        assert_eq!(updated.rows_affected, 2);
        let created = db
            .execute(
                &mut ctx,
                Query::from("CREATE INDEX orders_total ON orders (total)"),
                Feedback::Ignore,
            )
            .await
            .expect("Failed to create the index");
        assert_eq!(created.rows_affected, 0);
        let audited = db
            .count(&mut ctx, Query::from("SELECT count(*) FROM audit"))
            .await
            .expect("Failed to count the audit entries");
        assert_eq!(audited, 6);
    }

    #[tokio::test]
    async fn failed_commit_leaves_the_connection_usable() {
        let db = memory().await;
        setup(
            &db,
            &[
                "PRAGMA foreign_keys = ON",
                "CREATE TABLE parent (id INTEGER PRIMARY KEY)",
                "CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER REFERENCES parent (id) DEFERRABLE INITIALLY DEFERRED)",
                "CREATE TABLE marker (note TEXT NOT NULL)",
            ],
        )
        .await;
        let mut ctx = Context::background();
        let result = silent_logs! {
            db.transaction(&mut ctx, async |ctx: &mut Context<'_>| -> Result<()> {
                db.execute(ctx, Query::from("INSERT INTO marker VALUES ('first')"), Feedback::Required)
                    .await?;
                // Checked only when committing
                db.execute(ctx, Query::from("INSERT INTO child (parent_id) VALUES (42)"), Feedback::Required)
                    .await?;
                Ok(())
            })
            .await
        };
        let error = result.expect_err("The deferred foreign key fails the commit");
        assert!(
            format!("{error:#}").contains("FOREIGN KEY constraint failed"),
            "Unexpected error: {error:#}"
        );
        let markers = db
            .count(&mut ctx, Query::from("SELECT count(*) FROM marker"))
            .await
            .expect("Failed to count the markers");
        assert_eq!(markers, 0);

        db.transaction(&mut ctx, async |ctx: &mut Context<'_>| -> Result<()> {
            db.execute(ctx, Query::from("INSERT INTO parent (id) VALUES (42)"), Feedback::Required)
                .await?;
            db.execute(ctx, Query::from("INSERT INTO child (parent_id) VALUES (42)"), Feedback::Required)
                .await?;
            db.execute(ctx, Query::from("INSERT INTO marker VALUES ('second')"), Feedback::Required)
                .await?;
            Ok(())
        })
        .await
        .expect("A new transaction begins after the failed commit");
        let markers = db
            .count(&mut ctx, Query::from("SELECT count(*) FROM marker"))
            .await
            .expect("Failed to count the markers");
        assert_eq!(markers, 1);
    }
}
