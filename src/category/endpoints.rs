//! HTTP handlers for creating, listing, editing and deleting categories.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::CurrentUser,
    category::{
        Category, CategoryForm, CategoryId, NewCategory, create_category, delete_category,
        get_categories, get_category, update_category,
    },
    extract::{ApiJson, ApiPath},
};

/// Create a category owned by the current user.
pub async fn create_category_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let new_category = NewCategory::try_from(form)?;

    let connection = state.connection()?;
    let category = create_category(new_category, user_id, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// List the current user's categories, sorted by name.
pub async fn list_categories_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state.connection()?;

    get_categories(user_id, &connection).map(Json)
}

/// Get one of the current user's categories.
pub async fn get_category_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = state.connection()?;

    get_category(category_id, user_id, &connection).map(Json)
}

/// Replace the name, description and type of one of the current user's categories.
pub async fn update_category_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(category_id): ApiPath<CategoryId>,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Result<Json<Category>, Error> {
    let new_category = NewCategory::try_from(form)?;

    let connection = state.connection()?;

    update_category(category_id, user_id, new_category, &connection).map(Json)
}

/// Delete one of the current user's categories.
pub async fn delete_category_endpoint(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<Json<Value>, Error> {
    let connection = state.connection()?;
    delete_category(category_id, user_id, &connection)?;

    Ok(Json(json!({ "message": "Category deleted successfully" })))
}
