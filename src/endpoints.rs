//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/categories/{category_id}', use [format_endpoint].

/// Register a new user.
pub const REGISTER: &str = "/register";
/// Exchange a username and password for a bearer token.
pub const LOG_IN: &str = "/login";
/// Create and list categories.
pub const CATEGORIES: &str = "/categories";
/// Get, replace and delete a single category.
pub const CATEGORY: &str = "/categories/{category_id}";
/// Create and list transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// Get, replace and delete a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The income, expense and balance totals.
pub const BALANCE: &str = "/balance";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is the first substring that starts with a left brace and ends
/// with a right brace. For example, in the endpoint path
/// '/categories/{category_id}', '{category_id}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| start + offset + 1);

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}

#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::REGISTER);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::CATEGORY, 1));
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::TRANSACTION, 1));
        assert_endpoint_is_valid_uri(endpoints::BALANCE);
    }

    #[test]
    fn replaces_parameter() {
        assert_eq!(
            format_endpoint(endpoints::TRANSACTION, 42),
            "/transactions/42"
        );
        assert_eq!(format_endpoint("/hello/{world}/bye", 1), "/hello/1/bye");
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        assert_eq!(format_endpoint("/hello/world", 1), "/hello/world");
    }
}
