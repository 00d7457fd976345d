//! HTTP handlers for creating, listing, editing and deleting transactions.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    category::CategoryId,
    extract::{ApiJson, ApiPath, ApiQuery},
    timezone::local_today,
};

use super::{
    core::{
        Transaction, TransactionBuilder, TransactionId, create_transaction, delete_transaction,
        get_transaction, update_transaction,
    },
    query::{TransactionQuery, query_transactions},
    window::WindowQuery,
};

/// The request body for creating or replacing a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionForm {
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    /// An RFC 3339 date-time, e.g. "2024-01-15T09:30:00Z".
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

impl TransactionForm {
    /// Validate the form, using `default_date` if the form has no date.
    fn into_builder(self, default_date: OffsetDateTime) -> Result<TransactionBuilder, Error> {
        let builder = Transaction::build(
            self.transaction_type.parse()?,
            self.amount,
            self.date.unwrap_or(default_date),
        );

        Ok(builder
            .category_id(self.category_id)
            .description(self.description))
    }
}

/// List the current user's transactions in a date window, newest first.
///
/// The window is given by the `start_date` and `end_date` query parameters.
/// If either is missing, the window is the current calendar month.
pub async fn list_transactions_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiQuery(window_query): ApiQuery<WindowQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let (today, local_offset) = local_today(&state.local_timezone)?;
    let window = window_query.window_or_month_of(today)?;

    let query = TransactionQuery::for_user(user_id).date_range(window.to_timestamps(local_offset));

    let connection = state.connection()?;

    query_transactions(&query, &connection).map(Json)
}

/// Create a transaction owned by the current user.
///
/// The transaction is dated now if the request does not include a date.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let builder = form.into_builder(OffsetDateTime::now_utc())?;

    let connection = state.connection()?;
    let transaction = create_transaction(builder, user_id, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Get one of the current user's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.connection()?;

    get_transaction(transaction_id, user_id, &connection).map(Json)
}

/// Replace the type, category, amount and description of one of the current
/// user's transactions, and its date if the request includes one.
pub async fn update_transaction_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(transaction_id): ApiPath<TransactionId>,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.connection()?;
    let existing = get_transaction(transaction_id, user_id, &connection)?;
    let builder = form.into_builder(existing.date)?;

    update_transaction(transaction_id, user_id, builder, &connection).map(Json)
}

/// Delete one of the current user's transactions.
pub async fn delete_transaction_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<Json<Value>, Error> {
    let connection = state.connection()?;
    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(json!({ "message": "Transaction deleted successfully" })))
}
