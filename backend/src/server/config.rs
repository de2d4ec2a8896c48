//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;

use recipebox::domain::security::HashStrength;
use recipebox::inbound::http::session::AuthSettings;
use recipebox::outbound::persistence::DbPool;

/// Where uploaded images and exports live, and which images are accepted.
#[derive(Debug, Clone)]
pub struct FileSettings {
    pub(crate) image_dir: PathBuf,
    pub(crate) export_dir: PathBuf,
    pub(crate) allowed_image_extensions: Vec<String>,
}

impl FileSettings {
    #[must_use]
    pub fn new(
        image_dir: PathBuf,
        export_dir: PathBuf,
        allowed_image_extensions: Vec<String>,
    ) -> Self {
        Self {
            image_dir,
            export_dir,
            allowed_image_extensions,
        }
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) auth: AuthSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) files: FileSettings,
    pub(crate) hash_strength: HashStrength,
    pub(crate) swagger: bool,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration backed by the in-memory store.
    #[must_use]
    pub fn new(auth: AuthSettings, bind_addr: SocketAddr, files: FileSettings) -> Self {
        Self {
            auth,
            bind_addr,
            files,
            hash_strength: HashStrength::Standard,
            swagger: cfg!(debug_assertions),
            db_pool: None,
        }
    }

    /// Attach a database connection pool; repositories switch to PostgreSQL.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_hash_strength(mut self, strength: HashStrength) -> Self {
        self.hash_strength = strength;
        self
    }

    /// Serve Swagger UI even in release builds.
    #[must_use]
    pub fn with_swagger(mut self, enabled: bool) -> Self {
        self.swagger = self.swagger || enabled;
        self
    }
}
