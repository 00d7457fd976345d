//! The income, expense and balance totals for a user.
//!
//! All three totals come from one grouped aggregation over the user's
//! transactions, so the balance always equals total income minus total expense.

use axum::{Json, extract::State};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    auth::CurrentUser,
    db::{Collection, sum_grouped},
    extract::ApiQuery,
    timezone::local_offset,
    transaction::{DateWindow, TimestampRange, TransactionQuery, TransactionType, WindowQuery},
};

/// Totals over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Total income minus total expense.
    pub current_balance: f64,
    /// The sum of all income amounts.
    pub total_income: f64,
    /// The sum of all expense amounts.
    pub total_expense: f64,
}

/// Compute the totals of `user_id`'s transactions, optionally restricted to
/// transactions dated within `date_range`.
///
/// A user without any matching transactions gets all zeros.
///
/// # Errors
/// Returns an [Error::SqlError] if the aggregation fails, or
/// [Error::TotalOutOfRange] if a total overflows to infinity.
pub fn compute_summary(
    user_id: UserID,
    date_range: Option<TimestampRange>,
    connection: &Connection,
) -> Result<Summary, Error> {
    let mut query = TransactionQuery::for_user(user_id);

    if let Some(date_range) = date_range {
        query = query.date_range(date_range);
    }

    let totals = sum_grouped(
        connection,
        Collection::Transactions,
        "amount",
        "type",
        &query.to_filter(),
    )?;

    let mut summary = Summary::default();

    for (raw_type, total) in totals {
        match raw_type.parse()? {
            TransactionType::Income => summary.total_income = total,
            TransactionType::Expense => summary.total_expense = total,
        }
    }

    for (name, total) in [
        ("total income", summary.total_income),
        ("total expense", summary.total_expense),
    ] {
        if !total.is_finite() {
            return Err(Error::TotalOutOfRange(name));
        }
    }

    // Both totals are finite and non-negative, so their difference is finite.
    summary.current_balance = summary.total_income - summary.total_expense;

    Ok(summary)
}

/// The body of a `GET /balance` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    #[serde(flatten)]
    pub summary: Summary,
    /// The window the totals cover, or `null` for all-time totals.
    pub window: Option<DateWindow>,
}

/// Get the current user's totals.
///
/// The totals are all-time unless both `start_date` and `end_date` are given,
/// in which case they only cover transactions in that window.
pub async fn get_balance_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiQuery(window_query): ApiQuery<WindowQuery>,
) -> Result<Json<BalanceResponse>, Error> {
    let window = window_query.explicit_window()?;

    let date_range = match window {
        Some(window) => Some(window.to_timestamps(local_offset(&state.local_timezone)?)),
        None => None,
    };

    let connection = state.connection()?;
    let summary = compute_summary(user_id, date_range, &connection)?;

    Ok(Json(BalanceResponse { summary, window }))
}
