use crate::{Query, Value, separated_by};
use std::{fmt::Write, mem};

/// Rows per page when pagination is requested without an explicit limit.
pub const DEFAULT_PAGINATION_LIMIT: u64 = 10;

/// Positional placeholder style.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?` for every argument.
    #[default]
    QuestionMark,
    /// `$1`, `$2`, ... numbered in order of appearance.
    Dollar,
}

impl Placeholder {
    /// Style used by the backend named `driver`.
    pub fn for_driver(driver: &str) -> Self {
        match driver {
            "postgres" | "postgresql" => Placeholder::Dollar,
            _ => Placeholder::QuestionMark,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    #[default]
    ASC,
    DESC,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::ASC => "ASC",
            Order::DESC => "DESC",
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
enum Pagination {
    #[default]
    None,
    LimitOffset(u64),
    Seek(String, Value),
}

/// Incremental `SELECT` builder.
///
/// Every method mutates the builder in place and returns it for chaining.
/// [`QueryBuilder::to_sql`] renders the accumulated state and resets the
/// builder to its zero state, keeping only the placeholder style, so one
/// builder can produce several queries in sequence.
///
/// ```rust
/// use dbops_core::{Order, Placeholder, QueryBuilder, Value};
/// let mut builder = QueryBuilder::new(Placeholder::Dollar);
/// let (sql, args) = builder
///     .select(&["id", "name"])
///     .from("users")
///     .where_eq(&["status", "active"])
///     .order_by(Order::DESC, &["created_at"])
///     .to_sql();
/// assert_eq!(sql, "SELECT id,name FROM users WHERE status=$1 ORDER BY created_at DESC");
/// assert_eq!(args, vec![Value::Varchar(Some("active".into()))]);
/// ```
#[derive(Default, Debug)]
pub struct QueryBuilder {
    placeholder: Placeholder,
    placeholder_index: usize,
    columns: String,
    table: String,
    conditions: Vec<String>,
    ordering: Vec<String>,
    args: Vec<Value>,
    limit: Option<u64>,
    pagination: Pagination,
}

impl QueryBuilder {
    pub fn new(placeholder: Placeholder) -> Self {
        Self {
            placeholder,
            ..Default::default()
        }
    }

    pub fn placeholder(&self) -> Placeholder {
        self.placeholder
    }

    fn write_placeholder(&mut self, out: &mut String) {
        match self.placeholder {
            Placeholder::QuestionMark => out.push('?'),
            Placeholder::Dollar => {
                self.placeholder_index += 1;
                let _ = write!(out, "${}", self.placeholder_index);
            }
        }
    }

    /// Columns to select, `*` when empty.
    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        self.columns = if columns.is_empty() {
            "*".into()
        } else {
            columns.join(",")
        };
        self
    }

    pub fn from(&mut self, table: &str) -> &mut Self {
        self.table = table.into();
        self
    }

    /// Equality predicates from a flat `[column, value, column, value, ...]` list.
    ///
    /// A list of odd length is ignored entirely.
    pub fn where_eq(&mut self, pairs: &[&str]) -> &mut Self {
        if pairs.len() % 2 != 0 {
            return self;
        }
        for pair in pairs.chunks_exact(2) {
            self.filter(pair[0], pair[1]);
        }
        self
    }

    /// Single equality predicate with a typed value.
    pub fn filter(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let mut condition = format!("{column}=");
        self.write_placeholder(&mut condition);
        self.conditions.push(condition);
        self.args.push(value.into());
        self
    }

    /// Membership predicate, one placeholder per value: `column IN(?,?,?)`.
    pub fn where_in<V: Into<Value>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        let mut condition = format!("{column} IN(");
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        separated_by(
            &mut condition,
            values.iter(),
            |out, _| self.write_placeholder(out),
            ",",
        );
        condition.push(')');
        self.conditions.push(condition);
        self.args.extend(values);
        self
    }

    pub fn order_by(&mut self, order: Order, columns: &[&str]) -> &mut Self {
        self.ordering.extend(
            columns
                .iter()
                .map(|column| format!("{column} {}", order.as_str())),
        );
        self
    }

    /// Maximum number of rows, `0` is ignored.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        if limit > 0 {
            self.limit = Some(limit);
        }
        self
    }

    /// Offset pagination: `LIMIT <limit> OFFSET <offset>`.
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.pagination = Pagination::LimitOffset(offset);
        self
    }

    /// Cursor pagination: rows with `column` strictly greater than `cursor`.
    ///
    /// A NULL cursor selects the first page.
    pub fn seek(&mut self, column: &str, cursor: impl Into<Value>) -> &mut Self {
        self.pagination = Pagination::Seek(column.into(), cursor.into());
        self
    }

    /// Render the statement and its arguments, then reset the builder.
    ///
    /// Returns `("", [])` when the columns or the table are missing.
    pub fn to_sql(&mut self) -> (String, Vec<Value>) {
        let placeholder = self.placeholder;
        let mut state = mem::replace(self, Self::new(placeholder));
        if state.columns.is_empty() || state.table.is_empty() {
            return (String::new(), Vec::new());
        }
        let pagination = mem::take(&mut state.pagination);
        if let Pagination::Seek(column, cursor) = &pagination {
            if !cursor.is_null() {
                let mut condition = format!("{column} > ");
                state.write_placeholder(&mut condition);
                state.conditions.push(condition);
                state.args.push(cursor.clone());
            }
        }
        let mut sql = format!("SELECT {} FROM {}", state.columns, state.table);
        if !state.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&state.conditions.join(" AND "));
        }
        if !state.ordering.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&state.ordering.join(", "));
        }
        let limit = state.limit.unwrap_or(DEFAULT_PAGINATION_LIMIT);
        match pagination {
            Pagination::None => {
                if let Some(limit) = state.limit {
                    let _ = write!(sql, " LIMIT {limit}");
                }
            }
            Pagination::LimitOffset(offset) => {
                let _ = write!(sql, " LIMIT {limit} OFFSET {offset}");
            }
            Pagination::Seek(..) => {
                let _ = write!(sql, " LIMIT {limit}");
            }
        }
        (sql, state.args)
    }

    /// Same as [`QueryBuilder::to_sql`], packed into a [`Query`].
    pub fn to_query(&mut self) -> Query {
        self.to_sql().into()
    }
}
