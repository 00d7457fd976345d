//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, Value, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    category::CategoryId,
    db::{Collection, Filter, delete, find, insert, update},
};

// ============================================================================
// MODELS
// ============================================================================

/// The ID the store assigns to a transaction.
pub type TransactionId = i64;

/// Whether money was earned or spent.
///
/// Categories carry a type as well, so that a category can be meant for
/// either income or expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money that was earned.
    Income,
    /// Money that was spent.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in JSON and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl From<TransactionType> for Value {
    fn from(value: TransactionType) -> Self {
        Value::Text(value.as_str().to_owned())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The category the transaction was filed under, if any.
    ///
    /// The category is not required to exist.
    pub category_id: Option<CategoryId>,
    /// The amount of money spent or earned. Never negative, the direction is
    /// given by `transaction_type`.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// The user who owns the transaction.
    pub user_id: UserID,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: f64,
        date: OffsetDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            transaction_type,
            amount,
            date,
            category_id: None,
            description: None,
        }
    }
}

/// A builder for creating and replacing [Transaction] records.
///
/// # Examples
///
/// ```ignore
/// use time::macros::datetime;
///
/// let builder = Transaction::build(TransactionType::Expense, 45.99, datetime!(2025-01-15 9:30 UTC))
///     .description(Some("Coffee".to_owned()))
///     .category_id(Some(3));
/// let transaction = create_transaction(builder, user_id, &connection)?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the money was earned or spent.
    pub transaction_type: TransactionType,
    /// The amount of money, must be finite and not negative.
    pub amount: f64,
    /// When the transaction happened. Stored with second precision.
    pub date: OffsetDateTime,
    /// The category of the transaction, e.g. "Groceries" or "Salary".
    pub category_id: Option<CategoryId>,
    /// A human-readable description of the transaction.
    pub description: Option<String>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.amount.is_finite() && self.amount >= 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidAmount(self.amount))
        }
    }

    fn into_record(self) -> Vec<(&'static str, Value)> {
        vec![
            ("type", self.transaction_type.into()),
            ("category_id", self.category_id.into()),
            ("amount", Value::Real(self.amount)),
            ("description", self.description.into()),
            ("date", Value::Integer(self.date.unix_timestamp())),
        ]
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(super) const TRANSACTION_COLUMNS: &[&str] = &[
    "id",
    "type",
    "category_id",
    "amount",
    "description",
    "date",
    "user_id",
];

/// Create the transaction table and the index used by windowed queries.
///
/// # Errors
/// Returns an error if the table or index could not be created.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category_id INTEGER,
                amount REAL NOT NULL CHECK (amount >= 0),
                description TEXT,
                date INTEGER NOT NULL,
                user_id INTEGER NOT NULL
                );
        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )?;

    Ok(())
}

/// Create a new transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is negative or not a finite number,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate()?;

    let mut record = builder.into_record();
    record.push(("user_id", Value::Integer(user_id.as_i64())));

    let id = insert(connection, Collection::Transactions, &record)?;

    get_transaction(id, user_id, connection)
}

/// Retrieve the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    find(
        connection,
        Collection::Transactions,
        TRANSACTION_COLUMNS,
        &owned_by(id, user_id),
        &[],
        map_transaction_row,
    )?
    .into_iter()
    .next()
    .ok_or(Error::NotFound)
}

/// Replace the type, category, amount, description and date of the
/// transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is negative or not a finite number,
/// - [Error::NotFound] if `id` does not refer to a transaction owned by
///   `user_id`, in which case nothing is modified,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate()?;

    let matched = update(
        connection,
        Collection::Transactions,
        &owned_by(id, user_id),
        &builder.into_record(),
    )?;

    if matched == 0 {
        return Err(Error::NotFound);
    }

    get_transaction(id, user_id, connection)
}

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match delete(connection, Collection::Transactions, &owned_by(id, user_id))? {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

fn owned_by(id: TransactionId, user_id: UserID) -> Filter {
    Filter::new().eq("id", id).eq("user_id", user_id.as_i64())
}

/// Map a database row of [TRANSACTION_COLUMNS] to a [Transaction].
///
/// # Errors
/// Returns a [rusqlite::Error] if a column is missing or has the wrong type.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_date: i64 = row.get(5)?;
    let date = OffsetDateTime::from_unix_timestamp(raw_date).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Integer,
            Box::new(error),
        )
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        transaction_type: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        date,
        user_id: UserID::new(row.get(6)?),
    })
}
