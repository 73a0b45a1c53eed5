use crate::dialect;
use dbops::{Connection, Context, Database, DbError, Feedback, Query, Record};
use rust_decimal::Decimal;
use time::{Date, Month};
use uuid::Uuid;

#[derive(Record, Default, Debug, Clone, PartialEq)]
struct Account {
    id: Uuid,
    owner: String,
    balance: Decimal,
    opened: Option<Date>,
    active: bool,
}

pub async fn accounts<C: Connection>(db: &Database<C>) {
    let mut ctx = Context::background();

    // Setup
    db.execute(&mut ctx, Query::from("DROP TABLE IF EXISTS accounts"), Feedback::Ignore)
        .await
        .expect("Failed to drop the accounts table");
    db.execute(
        &mut ctx,
        Query::from(
            "CREATE TABLE accounts (id TEXT PRIMARY KEY, owner TEXT NOT NULL, balance REAL NOT NULL, opened TEXT, active INTEGER NOT NULL)",
        ),
        Feedback::Ignore,
    )
    .await
    .expect("Failed to create the accounts table");

    let insert = dialect(
        db,
        "INSERT INTO accounts (id, owner, balance, opened, active) VALUES (?, ?, ?, ?, ?)",
    );
    let alice = Account {
        id: Uuid::new_v4(),
        owner: "alice".into(),
        balance: Decimal::new(12050, 2),
        opened: Date::from_calendar_date(2021, Month::March, 14).ok(),
        active: true,
    };
    let bob = Account {
        id: Uuid::new_v4(),
        owner: "bob".into(),
        balance: Decimal::new(-75, 1),
        opened: None,
        active: false,
    };
    for account in [&alice, &bob] {
        let affected = db
            .execute(
                &mut ctx,
                Query::from(insert.as_str())
                    .bind(account.id)
                    .bind(account.owner.clone())
                    .bind(account.balance)
                    .bind(account.opened)
                    .bind(account.active),
                Feedback::Required,
            )
            .await
            .expect("Failed to insert an account");
        assert_eq!(affected.rows_affected, 1);
    }

    // Typed round trip
    let found = db
        .fetch_one::<Account>(
            &mut ctx,
            db.query_builder()
                .select(&["id", "owner", "balance", "opened", "active"])
                .from("accounts")
                .filter("id", alice.id)
                .to_query(),
        )
        .await
        .expect("Failed to fetch alice");
    assert_eq!(found.as_ref(), Some(&alice));

    let all = db
        .fetch_many::<Account>(
            &mut ctx,
            db.query_builder()
                .select(&["id", "owner", "balance", "opened", "active"])
                .from("accounts")
                .order_by(dbops::Order::ASC, &["owner"])
                .to_query(),
        )
        .await
        .expect("Failed to fetch every account");
    assert_eq!(all, vec![alice.clone(), bob.clone()]);

    // Missing row
    let missing = db
        .fetch_one::<Account>(
            &mut ctx,
            db.query_builder()
                .select(&["id", "owner", "balance", "opened", "active"])
                .from("accounts")
                .filter("id", Uuid::nil())
                .to_query(),
        )
        .await
        .expect("A missing row is not an error");
    assert_eq!(missing, None);

    // Feedback
    let update = dialect(db, "UPDATE accounts SET balance = ? WHERE owner = ?");
    let error = db
        .execute(
            &mut ctx,
            Query::from(update.as_str()).bind(Decimal::ONE).bind("carol"),
            Feedback::Required,
        )
        .await
        .expect_err("Updating no rows must fail when feedback is required");
    assert_eq!(DbError::of(&error), Some(DbError::ZeroRowsAffected));
    let affected = db
        .execute(
            &mut ctx,
            Query::from(update.as_str()).bind(Decimal::ONE).bind("carol"),
            Feedback::Ignore,
        )
        .await
        .expect("Updating no rows is fine when feedback is ignored");
    assert_eq!(affected.rows_affected, 0);

    // A column that does not fit the record
    let error = db
        .fetch_many::<(String, i64)>(
            &mut ctx,
            Query::from("SELECT owner, id FROM accounts"),
        )
        .await
        .expect_err("A text id does not fit into i64");
    assert_eq!(DbError::of(&error), Some(DbError::ScanRow));

    // Counting
    let active = db
        .count(
            &mut ctx,
            db.query_builder()
                .select(&["count(*)"])
                .from("accounts")
                .filter("active", true)
                .to_query(),
        )
        .await
        .expect("Failed to count the active accounts");
    assert_eq!(active, 1);
}
