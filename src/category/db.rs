//! Database operations for categories.
//!
//! Every operation is scoped to the owning user. Categories of other users
//! behave as if they do not exist.

use rusqlite::{Connection, Row, types::Value};

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName, NewCategory},
    db::{Collection, Filter, Sort, delete, find, insert, update},
};

const CATEGORY_COLUMNS: &[&str] = &["id", "name", "description", "type", "user_id"];

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            user_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

/// Create a category for `user_id` and return it with its generated ID.
pub fn create_category(
    category: NewCategory,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let mut record = category_record(&category);
    record.push(("user_id", Value::Integer(user_id.as_i64())));

    let id = insert(connection, Collection::Categories, &record)?;

    Ok(Category {
        id,
        name: category.name,
        description: category.description,
        category_type: category.category_type,
        user_id,
    })
}

/// Retrieve the category `category_id` owned by `user_id`.
///
/// Returns [Error::NotFound] if there is no such category.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    find(
        connection,
        Collection::Categories,
        CATEGORY_COLUMNS,
        &owned_by(category_id, user_id),
        &[],
        map_row,
    )?
    .into_iter()
    .next()
    .ok_or(Error::NotFound)
}

/// Retrieve all of `user_id`'s categories ordered alphabetically by name.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    find(
        connection,
        Collection::Categories,
        CATEGORY_COLUMNS,
        &Filter::new().eq("user_id", user_id.as_i64()),
        &[Sort::ascending("name"), Sort::ascending("id")],
        map_row,
    )
}

/// Replace the name, description and type of a category.
///
/// Returns [Error::NotFound] if the category does not exist or belongs to
/// another user.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserID,
    category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let matched = update(
        connection,
        Collection::Categories,
        &owned_by(category_id, user_id),
        &category_record(&category),
    )?;

    if matched == 0 {
        return Err(Error::NotFound);
    }

    Ok(Category {
        id: category_id,
        name: category.name,
        description: category.description,
        category_type: category.category_type,
        user_id,
    })
}

/// Delete a category. Transactions that refer to it keep their category ID.
///
/// Returns [Error::NotFound] if the category does not exist or belongs to
/// another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let deleted = delete(
        connection,
        Collection::Categories,
        &owned_by(category_id, user_id),
    )?;

    if deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn owned_by(category_id: CategoryId, user_id: UserID) -> Filter {
    Filter::new()
        .eq("id", category_id)
        .eq("user_id", user_id.as_i64())
}

fn category_record(category: &NewCategory) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(category.name.to_string())),
        ("description", category.description.clone().into()),
        ("type", category.category_type.into()),
    ]
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        description: row.get(2)?,
        category_type: row.get(3)?,
        user_id: UserID::new(row.get(4)?),
    })
}
