//! Recipebox: a multi-user recipe collection served over HTTP.
//!
//! The crate follows a hexagonal layout. [`domain`] holds the records, use
//! cases and ports; [`outbound`] implements the ports (PostgreSQL, memory,
//! files, remote pages); [`inbound`] exposes the use cases over actix-web.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(test)]
mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
