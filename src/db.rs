//! The persistence gateway.
//!
//! Owns the connection pool and the mapping from logical collections to SQLite
//! tables, and provides the small query vocabulary the rest of the app uses:
//! [find], [insert], [update], [delete] and the aggregation [sum_grouped].
//!
//! Filters are conjunctions of equality and range predicates. Column names are
//! always `'static` strings chosen by the caller, never client input, while
//! values are passed as bound parameters.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{
    Connection, Row, Transaction as SqlTransaction, TransactionBehavior, params_from_iter,
    types::Value,
};

use crate::{
    Error, category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// A pool of SQLite connections shared by all requests.
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out from a [DbPool].
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Build a connection pool with up to `max_size` connections and create the
/// application tables if they do not exist yet.
///
/// # Errors
/// Returns an error if the pool cannot open a connection or if the tables
/// cannot be created.
pub fn create_pool(manager: SqliteConnectionManager, max_size: u32) -> Result<DbPool, Error> {
    let pool = Pool::builder().max_size(max_size).build(manager)?;

    let connection = pool.get()?;
    initialize(&connection)?;

    Ok(pool)
}

/// Create the all of the database tables for the application.
///
/// # Errors
/// This function may return a [rusqlite::Error] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// The logical collections persisted by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Registered users.
    Users,
    /// Transaction categories.
    Categories,
    /// Income and expense records.
    Transactions,
}

impl Collection {
    /// The quoted SQL table name that backs the collection.
    pub fn table_name(self) -> &'static str {
        match self {
            Collection::Users => "user",
            Collection::Categories => "category",
            // `transaction` is a keyword in SQLite.
            Collection::Transactions => "\"transaction\"",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Eq(&'static str, Value),
    AtLeast(&'static str, Value),
    Before(&'static str, Value),
}

/// A conjunction of predicates used to select records.
///
/// ```ignore
/// let filter = Filter::new()
///     .eq("user_id", user_id.as_i64())
///     .at_least("date", start)
///     .before("date", end);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// A filter that matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match records where `column` equals `value`.
    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq(column, value.into()));
        self
    }

    /// Match records where `column` is greater than or equal to `value`.
    pub fn at_least(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::AtLeast(column, value.into()));
        self
    }

    /// Match records where `column` is strictly less than `value`.
    pub fn before(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Before(column, value.into()));
        self
    }

    /// Render the filter as a `WHERE` clause with numbered parameters starting
    /// at `?{first_parameter}`.
    ///
    /// Returns an empty clause for an empty filter.
    fn to_sql(&self, first_parameter: usize) -> (String, Vec<Value>) {
        if self.predicates.is_empty() {
            return (String::new(), Vec::new());
        }

        let mut clause_parts = Vec::with_capacity(self.predicates.len());
        let mut parameters = Vec::with_capacity(self.predicates.len());

        for (offset, predicate) in self.predicates.iter().enumerate() {
            let index = first_parameter + offset;
            let (column, operator, value) = match predicate {
                Predicate::Eq(column, value) => (column, "=", value),
                Predicate::AtLeast(column, value) => (column, ">=", value),
                Predicate::Before(column, value) => (column, "<", value),
            };

            clause_parts.push(format!("{column} {operator} ?{index}"));
            parameters.push(value.clone());
        }

        (
            format!("WHERE {}", clause_parts.join(" AND ")),
            parameters,
        )
    }
}

/// The order to sort records in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// Sort records by `column` in the given `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    /// The column to sort by.
    pub column: &'static str,
    /// The direction to sort in.
    pub order: SortOrder,
}

impl Sort {
    /// Sort by `column` in increasing order.
    pub fn ascending(column: &'static str) -> Self {
        Self {
            column,
            order: SortOrder::Ascending,
        }
    }

    /// Sort by `column` in decreasing order.
    pub fn descending(column: &'static str) -> Self {
        Self {
            column,
            order: SortOrder::Descending,
        }
    }

    fn to_sql(self) -> String {
        match self.order {
            SortOrder::Ascending => format!("{} ASC", self.column),
            SortOrder::Descending => format!("{} DESC", self.column),
        }
    }
}

/// Select `columns` from the records in `collection` matching `filter`,
/// ordered by each entry in `sort` in turn.
///
/// `map_row` receives the columns in the order they were given.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn find<T, F>(
    connection: &Connection,
    collection: Collection,
    columns: &[&str],
    filter: &Filter,
    sort: &[Sort],
    map_row: F,
) -> Result<Vec<T>, Error>
where
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
    let (where_clause, parameters) = filter.to_sql(1);

    let mut query_string_parts = vec![format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        collection.table_name()
    )];

    if !where_clause.is_empty() {
        query_string_parts.push(where_clause);
    }

    if !sort.is_empty() {
        let order_by = sort
            .iter()
            .map(|sort| sort.to_sql())
            .collect::<Vec<_>>()
            .join(", ");
        query_string_parts.push(format!("ORDER BY {order_by}"));
    }

    let query_string = query_string_parts.join(" ");
    let mut statement = connection.prepare(&query_string)?;
    let records = statement
        .query_map(params_from_iter(parameters.iter()), map_row)?
        .collect::<Result<Vec<T>, rusqlite::Error>>()?;

    Ok(records)
}

/// Insert a record made of `(column, value)` pairs into `collection`.
///
/// Returns the ID the store generated for the new record.
///
/// # Errors
/// Returns an [Error::SqlError] if the insert fails, or
/// [Error::DuplicateUsername] if a username is already taken.
pub fn insert(
    connection: &Connection,
    collection: Collection,
    record: &[(&'static str, Value)],
) -> Result<i64, Error> {
    let columns = record
        .iter()
        .map(|(column, _)| *column)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=record.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");

    connection.execute(
        &format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            collection.table_name()
        ),
        params_from_iter(record.iter().map(|(_, value)| value)),
    )?;

    Ok(connection.last_insert_rowid())
}

/// Set the `(column, value)` pairs in `patch` on every record in `collection`
/// that matches `filter`.
///
/// Returns the number of matched records. `patch` must not be empty.
///
/// # Errors
/// Returns an [Error::SqlError] if the update fails.
pub fn update(
    connection: &Connection,
    collection: Collection,
    filter: &Filter,
    patch: &[(&'static str, Value)],
) -> Result<usize, Error> {
    let assignments = patch
        .iter()
        .enumerate()
        .map(|(offset, (column, _))| format!("{column} = ?{}", offset + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let (where_clause, filter_parameters) = filter.to_sql(patch.len() + 1);

    let parameters = patch
        .iter()
        .map(|(_, value)| value)
        .chain(filter_parameters.iter());

    let matched = connection.execute(
        &format!(
            "UPDATE {} SET {assignments} {where_clause}",
            collection.table_name()
        ),
        params_from_iter(parameters),
    )?;

    Ok(matched)
}

/// Delete every record in `collection` that matches `filter`.
///
/// Returns the number of deleted records.
///
/// # Errors
/// Returns an [Error::SqlError] if the delete fails.
pub fn delete(
    connection: &Connection,
    collection: Collection,
    filter: &Filter,
) -> Result<usize, Error> {
    let (where_clause, parameters) = filter.to_sql(1);

    let deleted = connection.execute(
        &format!("DELETE FROM {} {where_clause}", collection.table_name()),
        params_from_iter(parameters.iter()),
    )?;

    Ok(deleted)
}

/// Sum `sum_column` over the records in `collection` that match `filter`,
/// grouped by the text column `group_column`.
///
/// Groups without any matching records are absent from the result.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn sum_grouped(
    connection: &Connection,
    collection: Collection,
    sum_column: &'static str,
    group_column: &'static str,
    filter: &Filter,
) -> Result<Vec<(String, f64)>, Error> {
    let (where_clause, parameters) = filter.to_sql(1);

    let query_string = format!(
        "SELECT {group_column}, COALESCE(SUM({sum_column}), 0.0) FROM {} {where_clause} \
         GROUP BY {group_column}",
        collection.table_name()
    );

    let mut statement = connection.prepare(&query_string)?;
    let groups = statement
        .query_map(params_from_iter(parameters.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<(String, f64)>, rusqlite::Error>>()?;

    Ok(groups)
}


#[cfg(test)]
mod gateway_tests {
    use rusqlite::{Connection, types::Value};

    use super::{
        Collection, Filter, Sort, delete, find, initialize, insert, sum_grouped, update,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn insert_row(connection: &Connection, user_id: i64, kind: &str, amount: f64, date: i64) -> i64 {
        insert(
            connection,
            Collection::Transactions,
            &[
                ("type", Value::Text(kind.to_owned())),
                ("amount", Value::Real(amount)),
                ("description", Value::Text(String::new())),
                ("date", Value::Integer(date)),
                ("user_id", Value::Integer(user_id)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = get_test_connection();

        assert_eq!(initialize(&connection), Ok(()));
    }

    #[test]
    fn insert_returns_generated_ids() {
        let connection = get_test_connection();

        let first = insert_row(&connection, 1, "income", 1.0, 0);
        let second = insert_row(&connection, 1, "income", 1.0, 0);

        assert!(first > 0);
        assert_ne!(first, second);
    }

    #[test]
    fn find_applies_filter_and_sort() {
        let connection = get_test_connection();
        insert_row(&connection, 1, "income", 1.0, 100);
        insert_row(&connection, 1, "expense", 2.0, 300);
        insert_row(&connection, 1, "income", 3.0, 200);
        insert_row(&connection, 2, "income", 4.0, 250);

        let amounts = find(
            &connection,
            Collection::Transactions,
            &["amount"],
            &Filter::new().eq("user_id", 1).at_least("date", 150),
            &[Sort::descending("date")],
            |row| row.get::<_, f64>(0),
        )
        .unwrap();

        assert_eq!(amounts, vec![2.0, 3.0]);
    }

    #[test]
    fn update_reports_matched_records() {
        let connection = get_test_connection();
        let id = insert_row(&connection, 1, "income", 1.0, 100);

        let matched = update(
            &connection,
            Collection::Transactions,
            &Filter::new().eq("id", id).eq("user_id", 2),
            &[("amount", Value::Real(9.0))],
        )
        .unwrap();
        assert_eq!(matched, 0);

        let matched = update(
            &connection,
            Collection::Transactions,
            &Filter::new().eq("id", id).eq("user_id", 1),
            &[("amount", Value::Real(9.0))],
        )
        .unwrap();
        assert_eq!(matched, 1);
    }

    #[test]
    fn delete_reports_deleted_records() {
        let connection = get_test_connection();
        let id = insert_row(&connection, 1, "income", 1.0, 100);

        let deleted = delete(
            &connection,
            Collection::Transactions,
            &Filter::new().eq("id", id).eq("user_id", 2),
        )
        .unwrap();
        assert_eq!(deleted, 0);

        let deleted = delete(
            &connection,
            Collection::Transactions,
            &Filter::new().eq("id", id).eq("user_id", 1),
        )
        .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(
            connection
                .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| {
                    row.get::<_, i64>(0)
                })
                .unwrap(),
            0
        );
    }

    #[test]
    fn sum_grouped_sums_each_group() {
        let connection = get_test_connection();
        insert_row(&connection, 1, "income", 1.5, 100);
        insert_row(&connection, 1, "income", 2.5, 100);
        insert_row(&connection, 1, "expense", 3.0, 100);
        insert_row(&connection, 2, "expense", 100.0, 100);

        let mut groups = sum_grouped(
            &connection,
            Collection::Transactions,
            "amount",
            "type",
            &Filter::new().eq("user_id", 1),
        )
        .unwrap();
        groups.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(
            groups,
            vec![("expense".to_owned(), 3.0), ("income".to_owned(), 4.0)]
        );
    }

    #[test]
    fn sum_grouped_is_empty_without_records() {
        let connection = get_test_connection();

        let groups = sum_grouped(
            &connection,
            Collection::Transactions,
            "amount",
            "type",
            &Filter::new().eq("user_id", 1),
        )
        .unwrap();

        assert!(groups.is_empty());
    }
}
