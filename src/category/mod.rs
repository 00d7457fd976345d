//! Categories for classifying transactions as a kind of income or expense.
//!
//! Categories are private to the user who created them.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_category, create_category_table, delete_category, get_categories, get_category,
    update_category,
};
pub use domain::{Category, CategoryForm, CategoryId, CategoryName, NewCategory};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, get_category_endpoint,
    list_categories_endpoint, update_category_endpoint,
};
