//! Defines the claims carried by bearer tokens and how tokens are signed and verified.

use jsonwebtoken::{Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID, app_state::TokenKeys};

/// The contents of a JSON Web Token.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// The time the token was issued as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: i64,
}

impl Claims {
    /// The ID of the user the token was issued to.
    ///
    /// # Errors
    /// Returns [Error::InvalidCredential] if the subject is not a user ID.
    pub fn user_id(&self) -> Result<UserID, Error> {
        self.sub
            .parse()
            .map(UserID::new)
            .map_err(|_| Error::InvalidCredential)
    }
}

/// A signed token and the time it stops being valid.
#[derive(Debug, PartialEq)]
pub struct IssuedToken {
    /// The encoded JSON Web Token.
    pub token: String,
    /// When the token expires.
    pub expires_at: OffsetDateTime,
}

/// Sign a token for `user_id` that is valid from `issued_at` for `duration`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    issued_at: OffsetDateTime,
    duration: Duration,
    keys: &TokenKeys,
) -> Result<IssuedToken, Error> {
    let expires_at = issued_at + duration;
    let claims = Claims {
        sub: user_id.to_string(),
        iat: issued_at.unix_timestamp(),
        exp: expires_at.unix_timestamp(),
    };

    let token = encode(&Header::default(), &claims, keys.encoding_key())
        .map_err(|error| Error::TokenCreation(error.to_string()))?;

    Ok(IssuedToken { token, expires_at })
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns [Error::InvalidCredential] if the token is malformed, was signed
/// with another key, or has expired.
pub fn decode_token(token: &str, keys: &TokenKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, keys.decoding_key(), &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected bearer token: {error}");
            Error::InvalidCredential
        })
}
