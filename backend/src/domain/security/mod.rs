//! Credential helpers: password hashing and the signed user cookie.

mod cookie;
mod password;

pub use cookie::{get_auth_cookie, get_user_id_from_cookie};
pub use password::{HashStrength, PasswordHashError, hash_password, verify_password};
