#[cfg(test)]
mod tests {
    use dbops::{Context, Database, DbError, Error, Feedback, Query, Record, Value};
    use dbops_tests::{
        init_logs,
        mock::{Call, MockConnection, MockHandle, Response},
        silent_logs,
    };
    use indoc::indoc;

    #[derive(Record, Default, Debug, PartialEq)]
    struct User {
        id: i64,
        name: String,
        email: Option<String>,
    }

    fn database() -> (Database<MockConnection>, MockHandle) {
        init_logs();
        let handle = MockHandle::default();
        (Database::new(MockConnection::new(handle.clone())), handle)
    }

    fn user(id: i64, name: &str) -> Vec<Value> {
        vec![id.into(), name.into(), Value::Varchar(None)]
    }

    #[tokio::test]
    async fn execute_reports_affected_rows() {
        let (db, handle) = database();
        handle.respond(Response::affected(3));
        let mut ctx = Context::background();
        let affected = db
            .execute(
                &mut ctx,
                Query::from("UPDATE users SET active = ?").bind(false),
                Feedback::Required,
            )
            .await
            .expect("The update affected rows");
        assert_eq!(affected.rows_affected, 3);
        assert_eq!(
            handle.calls(),
            [Call::Run {
                sql: "UPDATE users SET active = ?".into(),
                args: vec![Value::Boolean(Some(false))],
                in_transaction: false,
            }]
        );
    }

    #[tokio::test]
    async fn execute_feedback() {
        let (db, handle) = database();
        let mut ctx = Context::background();
        handle.respond(Response::affected(0));
        let error = db
            .execute(&mut ctx, Query::from("DELETE FROM users"), Feedback::Required)
            .await
            .expect_err("Zero rows with required feedback");
        assert_eq!(DbError::of(&error), Some(DbError::ZeroRowsAffected));
        assert_eq!(
            error.to_string(),
            "no rows affected by an update, insert, or delete"
        );

        handle.respond(Response::affected(0));
        let affected = db
            .execute(&mut ctx, Query::from("DELETE FROM users"), Feedback::Ignore)
            .await
            .expect("Zero rows are fine when ignored");
        assert_eq!(affected.rows_affected, 0);
    }

    #[tokio::test]
    async fn provider_error_skips_the_backend() {
        let (db, handle) = database();
        let mut ctx = Context::background();
        let provider = || -> dbops::Result<Query> { Err(Error::msg("cannot build the query")) };
        let error = db
            .execute(&mut ctx, provider, Feedback::Ignore)
            .await
            .expect_err("The provider failed");
        assert_eq!(error.to_string(), "cannot build the query");
        assert!(handle.calls().is_empty());

        let provider = || -> dbops::Result<Query> {
            Ok(Query::new(
                indoc! {"
                    SELECT id, name, email
                    FROM users
                    WHERE id = ?
                "},
                [Value::from(7i64)],
            ))
        };
        handle.respond(Response::rows(&["id", "name", "email"], vec![user(7, "ada")]));
        let found = db
            .fetch_one::<User>(&mut ctx, provider)
            .await
            .expect("The provider built the query");
        assert_eq!(
            found,
            Some(User {
                id: 7,
                name: "ada".into(),
                email: None,
            })
        );
    }

    #[tokio::test]
    async fn fetch_one_without_rows() {
        let (db, handle) = database();
        let mut ctx = Context::background();
        let found = db
            .fetch_one::<User>(&mut ctx, Query::from("SELECT id, name, email FROM users"))
            .await
            .expect("No rows is not an error");
        assert_eq!(found, None);
        assert_eq!(handle.statements().len(), 1);
    }

    #[tokio::test]
    async fn fetch_one_scan_error_is_returned() {
        let (db, handle) = database();
        let mut ctx = Context::background();
        handle.respond(Response::rows(
            &["id", "name"],
            vec![vec![1i64.into(), "ada".into()]],
        ));
        let error = db
            .fetch_one::<User>(&mut ctx, Query::from("SELECT id, name FROM users"))
            .await
            .expect_err("Two columns do not fit three fields");
        assert_eq!(DbError::of(&error), None);
        assert!(error.to_string().contains("expects 3 columns"));
    }

    #[tokio::test]
    async fn fetch_many_in_order() {
        let (db, handle) = database();
        let mut ctx = Context::background();
        handle.respond(Response::rows(
            &["id", "name", "email"],
            vec![user(1, "ada"), user(2, "grace"), user(3, "linus")],
        ));
        let users = db
            .fetch_many::<User>(&mut ctx, Query::from("SELECT id, name, email FROM users"))
            .await
            .expect("Failed to fetch the users");
        assert_eq!(
            users.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["ada", "grace", "linus"]
        );

        let users = db
            .fetch_many::<User>(&mut ctx, Query::from("SELECT id, name, email FROM users"))
            .await
            .expect("Failed to fetch the users");
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn fetch_many_scan_error() {
        let (db, handle) = database();
        let mut ctx = Context::background();
        handle.respond(Response::rows(
            &["id", "name", "email"],
            vec![user(1, "ada"), vec!["two".into(), "grace".into(), Value::Null]],
        ));
        silent_logs! {
            let error = db
                .fetch_many::<User>(&mut ctx, Query::from("SELECT id, name, email FROM users"))
                .await
                .expect_err("The second row does not fit");
            assert_eq!(DbError::of(&error), Some(DbError::ScanRow));
            assert_eq!(error.to_string(), "failed to scan column into field type");
        }
    }

    #[tokio::test]
    async fn fetch_many_cursor_error() {
        let (db, handle) = database();
        let mut ctx = Context::background();
        handle.respond(Response::RowsThenError(
            ["id", "name", "email"].map(String::from).into(),
            vec![user(1, "ada")],
            "connection reset".into(),
        ));
        let error = db
            .fetch_many::<User>(&mut ctx, Query::from("SELECT id, name, email FROM users"))
            .await
            .expect_err("The cursor failed");
        assert_eq!(error.to_string(), "connection reset");
        assert_eq!(DbError::of(&error), None);
    }

    #[tokio::test]
    async fn backend_error_is_returned() {
        let (db, handle) = database();
        let mut ctx = Context::background();
        handle.respond(Response::Error("syntax error".into()));
        let error = db
            .execute(&mut ctx, Query::from("UPDAT users"), Feedback::Ignore)
            .await
            .expect_err("The backend failed");
        assert_eq!(error.to_string(), "syntax error");
    }

    #[tokio::test]
    async fn count() {
        let (db, handle) = database();
        let mut ctx = Context::background();
        handle.respond(Response::rows(&["count"], vec![vec![Value::Int64(Some(12))]]));
        let query = db
            .query_builder()
            .select(&["count(*)"])
            .from("users")
            .filter("active", true)
            .to_query();
        let total = db
            .count(&mut ctx, query)
            .await
            .expect("Failed to count the users");
        assert_eq!(total, 12);
        assert_eq!(
            handle.statements(),
            [("SELECT count(*) FROM users WHERE active=?".to_string(), false)]
        );

        let total = db
            .count(&mut ctx, Query::from("SELECT count(*) FROM users"))
            .await
            .expect("No rows count as zero");
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(Database::<MockConnection>::connect("sqlite://memory").await.is_err());
        }
        assert!(Database::<MockConnection>::connect("mock://").await.is_ok());
    }
}
