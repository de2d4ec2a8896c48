//! Per-page view models.
//!
//! Each view model parses [`FormData`](super::form::FormData) into typed
//! fields, then `validate()` records at most one error message: the first
//! rule that fails. Handlers turn that message into a `400` response via
//! [`ensure_valid`].

pub mod account;
pub mod home;
pub mod recipe;

use crate::domain::{Error, User};

/// Name shown for anonymous visitors.
pub const GUEST_NAME: &str = "Guest";

/// Display name for the page header.
pub fn display_name(user: Option<&User>) -> String {
    user.map_or_else(|| GUEST_NAME.to_owned(), |user| user.name.clone())
}

/// Map a recorded validation error to `400 Bad Request`.
pub fn ensure_valid(error: Option<&str>) -> Result<(), Error> {
    match error {
        Some(message) => Err(Error::invalid_request(message)),
        None => Ok(()),
    }
}
