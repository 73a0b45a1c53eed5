use crate::dialect;
use dbops::{Connection, Context, Database, Feedback, Order, Query, Record, Value};
use futures::future::join;

#[derive(Record, Default, Debug, PartialEq)]
struct Todo {
    id: i64,
    title: String,
    done: bool,
    #[record(skip)]
    selected: bool,
}

pub async fn todos<C: Connection>(db: &Database<C>) {
    let mut ctx = Context::background();

    // Setup
    db.execute(&mut ctx, Query::from("DROP TABLE IF EXISTS todos"), Feedback::Ignore)
        .await
        .expect("Failed to drop the todos table");
    db.execute(
        &mut ctx,
        Query::from("CREATE TABLE todos (id INTEGER PRIMARY KEY, title TEXT NOT NULL, done INTEGER NOT NULL)"),
        Feedback::Ignore,
    )
    .await
    .expect("Failed to create the todos table");
    let insert = dialect(db, "INSERT INTO todos (id, title, done) VALUES (?, ?, ?)");
    for id in 1..=25i64 {
        db.execute(
            &mut ctx,
            Query::new(
                insert.as_str(),
                [Value::from(id), Value::from(format!("todo {id}")), Value::from(id % 3 == 0)],
            ),
            Feedback::Required,
        )
        .await
        .expect("Failed to insert a todo");
    }

    // Offset pagination
    let page = db
        .fetch_many::<Todo>(
            &mut ctx,
            db.query_builder()
                .select(&["id", "title", "done"])
                .from("todos")
                .order_by(Order::ASC, &["id"])
                .offset(20)
                .to_query(),
        )
        .await
        .expect("Failed to fetch the last page");
    assert_eq!(
        page.iter().map(|v| v.id).collect::<Vec<_>>(),
        [21, 22, 23, 24, 25]
    );
    assert!(page.iter().all(|v| !v.selected));

    let page = db
        .fetch_many::<Todo>(
            &mut ctx,
            db.query_builder()
                .select(&["id", "title", "done"])
                .from("todos")
                .order_by(Order::ASC, &["id"])
                .limit(4)
                .offset(8)
                .to_query(),
        )
        .await
        .expect("Failed to fetch a page with an explicit limit");
    assert_eq!(
        page.iter().map(|v| v.id).collect::<Vec<_>>(),
        [9, 10, 11, 12]
    );
    assert!(page[0].done);
    assert_eq!(page[1].title, "todo 10");

    // Seek pagination, walking every page
    let mut cursor = Value::Int64(None);
    let mut pages = Vec::new();
    loop {
        let page = db
            .fetch_many::<Todo>(
                &mut ctx,
                db.query_builder()
                    .select(&["id", "title", "done"])
                    .from("todos")
                    .order_by(Order::ASC, &["id"])
                    .limit(7)
                    .seek("id", cursor.clone())
                    .to_query(),
            )
            .await
            .expect("Failed to fetch a page by cursor");
        let Some(last) = page.last() else {
            break;
        };
        cursor = last.id.into();
        pages.push(page.len());
    }
    assert_eq!(pages, [7, 7, 7, 4]);

    // Membership and equality
    let done = db
        .fetch_many::<(i64,)>(
            &mut ctx,
            db.query_builder()
                .select(&["id"])
                .from("todos")
                .where_in("id", [1i64, 3, 6, 7])
                .filter("done", true)
                .order_by(Order::DESC, &["id"])
                .to_query(),
        )
        .await
        .expect("Failed to fetch the done todos");
    assert_eq!(done, [(6,), (3,)]);

    let titled = db
        .fetch_one::<(i64, String)>(
            &mut ctx,
            db.query_builder()
                .select(&["id", "title"])
                .from("todos")
                .where_eq(&["title", "todo 17"])
                .to_query(),
        )
        .await
        .expect("Failed to fetch the todo by title");
    assert_eq!(titled, Some((17, "todo 17".to_string())));

    // Concurrent callers share the connection
    let (left, right) = join(
        async {
            let mut ctx = Context::background();
            db.count(&mut ctx, Query::from("SELECT count(*) FROM todos"))
                .await
        },
        async {
            let mut ctx = Context::background();
            db.count(
                &mut ctx,
                Query::new(dialect(db, "SELECT count(*) FROM todos WHERE done = ?"), [Value::from(true)]),
            )
            .await
        },
    )
    .await;
    assert_eq!(left.expect("Failed to count every todo"), 25);
    assert_eq!(right.expect("Failed to count the done todos"), 8);

    // Empty result
    let count = db
        .count(
            &mut ctx,
            Query::from("SELECT count(*) FROM todos GROUP BY done HAVING count(*) > 100"),
        )
        .await
        .expect("Failed to count with no rows");
    assert_eq!(count, 0);
}
