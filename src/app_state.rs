//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use axum::extract::FromRef;
use jsonwebtoken::{DecodingKey, EncodingKey};
use time::Duration;

use crate::{
    Error, PasswordHash,
    db::{DbConnection, DbPool},
    timezone::get_local_offset,
};

/// How long a bearer token stays valid after it is issued.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(24);

/// The keys used to sign and verify bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Derive the signing and verification keys from a shared `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// The key for signing new tokens.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// The key for verifying tokens sent by clients.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The pool that requests check database connections out of.
    pub db_pool: DbPool,

    /// The keys for signing and verifying bearer tokens.
    pub token_keys: Arc<TokenKeys>,

    /// The duration for which bearer tokens are valid.
    pub token_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl AppState {
    /// Create a new [AppState] around an initialized connection pool.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezone] if `local_timezone` is not a known timezone.
    pub fn new(db_pool: DbPool, token_secret: &str, local_timezone: &str) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezone(local_timezone.to_owned()));
        }

        Ok(Self {
            db_pool,
            token_keys: Arc::new(TokenKeys::from_secret(token_secret)),
            token_duration: DEFAULT_TOKEN_DURATION,
            local_timezone: local_timezone.to_owned(),
            password_cost: PasswordHash::DEFAULT_COST,
        })
    }

    /// Set the bcrypt cost used for new passwords.
    pub fn with_password_cost(mut self, password_cost: u32) -> Self {
        self.password_cost = password_cost;
        self
    }

    /// Check a connection out of the pool.
    ///
    /// # Errors
    /// Returns [Error::PoolError] if no connection became available in time.
    pub fn connection(&self) -> Result<DbConnection, Error> {
        Ok(self.db_pool.get()?)
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db_pool.clone()
    }
}

impl FromRef<AppState> for Arc<TokenKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.token_keys.clone()
    }
}

#[cfg(test)]
mod tests {
    use r2d2_sqlite::SqliteConnectionManager;

    use crate::{Error, db::create_pool};

    use super::{AppState, DEFAULT_TOKEN_DURATION};

    #[test]
    fn new_accepts_canonical_timezone() {
        let pool = create_pool(SqliteConnectionManager::memory(), 1).unwrap();

        let state = AppState::new(pool, "foobar", "Pacific/Auckland").unwrap();

        assert_eq!(state.local_timezone, "Pacific/Auckland");
        assert_eq!(state.token_duration, DEFAULT_TOKEN_DURATION);
    }

    #[test]
    fn new_rejects_unknown_timezone() {
        let pool = create_pool(SqliteConnectionManager::memory(), 1).unwrap();

        let result = AppState::new(pool, "foobar", "Atlantis/Lost");

        assert!(matches!(result, Err(Error::InvalidTimezone(_))));
    }
}
