//! Core category domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Error, UserID, transaction::TransactionType};

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A label for classifying transactions, e.g. "Groceries" or "Salary".
///
/// Deleting a category does not affect the transactions that refer to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: CategoryName,
    /// Optional free text about what the category covers.
    pub description: Option<String>,
    /// Whether the category is meant for income or expenses.
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    /// The ID of the user that owns the category.
    pub user_id: UserID,
}

/// The request body for creating or replacing a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryForm {
    /// The category name, which must not be empty.
    pub name: String,
    /// Defaults to no description.
    #[serde(default)]
    pub description: Option<String>,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub category_type: String,
}

/// A category that passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The validated category name.
    pub name: CategoryName,
    /// Optional free text about what the category covers.
    pub description: Option<String>,
    /// Whether the category is meant for income or expenses.
    pub category_type: TransactionType,
}

impl TryFrom<CategoryForm> for NewCategory {
    type Error = Error;

    fn try_from(form: CategoryForm) -> Result<Self, Self::Error> {
        Ok(Self {
            name: CategoryName::new(&form.name)?,
            description: form.description,
            category_type: form.category_type.parse()?,
        })
    }
}
