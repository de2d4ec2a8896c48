//! Port for preparing storage before the server accepts traffic.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised while initialising storage.
    pub enum DbInitError {
        /// Storage could not be reached.
        Connection { message: String } => "database connection failed: {message}",
        /// Schema migrations failed to apply.
        Migration { message: String } => "database migration failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DbInitializer: Send + Sync {
    /// Create or upgrade the schema. Safe to call on every start-up.
    async fn initialize(&self) -> Result<(), DbInitError>;
}

/// Initialiser for stores that need no preparation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpDbInitializer;

#[async_trait]
impl DbInitializer for NoOpDbInitializer {
    async fn initialize(&self) -> Result<(), DbInitError> {
        Ok(())
    }
}
