//! Application settings loaded via OrthoConfig.
//!
//! Every key can be given on the command line, in a configuration file, or
//! through a `RECIPEBOX_`-prefixed environment variable.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_COOKIE_NAME: &str = "recipebox_user";
const DEFAULT_IMAGE_EXTENSIONS: &str = "png,jpg,jpeg,gif,webp";
const DEFAULT_IMAGE_DIR: &str = "files/images";
const DEFAULT_EXPORT_DIR: &str = "files/exports";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime configuration for the server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RECIPEBOX")]
pub struct AppSettings {
    /// Salt for identity cookies. A random key is generated when unset,
    /// which signs everybody out on restart.
    pub secret_key: Option<String>,
    /// PostgreSQL URL. Without one the server keeps data in memory.
    pub database_url: Option<String>,
    /// Serve the Swagger UI and log at debug level.
    #[ortho_config(default = false)]
    pub debug: bool,
    /// Use fast password hashing.
    #[ortho_config(default = false)]
    pub testing: bool,
    pub cookie_name: Option<String>,
    /// Mark the identity cookie `Secure`.
    #[ortho_config(default = false)]
    pub cookie_secure: bool,
    /// Comma separated list of accepted image extensions.
    pub allowed_image_extensions: Option<String>,
    pub image_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub bind_addr: Option<String>,
}

impl AppSettings {
    /// The configured secret, or a fresh random one.
    pub fn secret_key(&self) -> String {
        self.secret_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()))
    }

    pub fn cookie_name(&self) -> &str {
        self.cookie_name.as_deref().unwrap_or(DEFAULT_COOKIE_NAME)
    }

    /// Lower-cased extensions without leading dots.
    pub fn allowed_image_extensions(&self) -> Vec<String> {
        self.allowed_image_extensions
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_EXTENSIONS)
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    pub fn image_dir(&self) -> PathBuf {
        self.image_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR))
    }

    /// Parse the bind address.
    ///
    /// # Errors
    /// Returns the parse error when the address is malformed.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
    }
}
