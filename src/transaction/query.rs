//! Database query helpers for listing a user's transactions.

use rusqlite::Connection;

use crate::{
    Error, UserID,
    db::{Collection, Filter, Sort, find},
};

use super::{
    core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row},
    window::TimestampRange,
};

/// Selects the transactions of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    /// The owner of the transactions.
    pub user_id: UserID,
    /// Only include transactions dated within this range.
    pub date_range: Option<TimestampRange>,
}

impl TransactionQuery {
    /// All of `user_id`'s transactions.
    pub fn for_user(user_id: UserID) -> Self {
        Self {
            user_id,
            date_range: None,
        }
    }

    /// Restrict the query to transactions dated within `date_range`.
    pub fn date_range(mut self, date_range: TimestampRange) -> Self {
        self.date_range = Some(date_range);
        self
    }

    pub(crate) fn to_filter(&self) -> Filter {
        let filter = Filter::new().eq("user_id", self.user_id.as_i64());

        match self.date_range {
            Some(TimestampRange { start, end }) => {
                filter.at_least("date", start).before("date", end)
            }
            None => filter,
        }
    }
}

/// Get the transactions selected by `query`, newest first.
///
/// Transactions on the same date are ordered by descending ID, so the order is
/// stable across updates.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn query_transactions(
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    find(
        connection,
        Collection::Transactions,
        TRANSACTION_COLUMNS,
        &query.to_filter(),
        &[Sort::descending("date"), Sort::descending("id")],
        map_transaction_row,
    )
}
