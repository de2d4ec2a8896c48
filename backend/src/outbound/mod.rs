//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process repositories used when no database is configured
//! - **images**: thumbnail storage on the local filesystem
//! - **export**: PDF documents carrying recipe metadata
//! - **scraper**: schema.org recipe extraction over HTTP
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod export;
pub mod images;
pub mod memory;
pub mod persistence;
pub mod scraper;
