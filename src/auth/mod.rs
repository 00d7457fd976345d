//! Bearer token authentication: registration, log-in and the route guard.

mod extractor;
mod log_in;
mod register;
mod token;

pub use extractor::CurrentUser;
pub use log_in::{Credentials, LogInResponse, log_in};
pub use register::{RegisteredUser, register_user};
pub use token::{Claims, IssuedToken, decode_token, encode_token};
