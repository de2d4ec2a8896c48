//! HTTP inbound adapter.
//!
//! Pages answer with their view model as JSON; form submissions that succeed
//! redirect the way a browser flow expects.

pub mod account;
pub mod error;
pub mod form;
pub mod health;
pub mod home;
pub mod recipes;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod view_models;

use actix_web::http::header;
use actix_web::{HttpResponse, HttpResponseBuilder};

pub use error::ApiResult;

/// `302 Found` pointing at `location`.
pub(crate) fn redirect(location: &str) -> HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location));
    builder
}
