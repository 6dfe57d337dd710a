//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Secrets (JWT key,
//! media host credentials) are injected as environment variables in
//! deployment.

use std::env;

/// Default request body ceiling for media uploads (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Which store backend the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set).
    Firestore,
    /// Process-local in-memory tree, for local development.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Firebase project ID (Firestore project and ID-token audience)
    pub firebase_project_id: String,
    /// Firebase Storage bucket for post media
    pub firebase_storage_bucket: String,
    /// Frontend URL (CORS origin, cookie security)
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Store backend selection
    pub store_backend: StoreBackend,
    /// Maximum accepted upload body size in bytes
    pub max_upload_bytes: usize,
    /// Media host cloud name
    pub cloudinary_cloud_name: String,
    /// Media host API key (public)
    pub cloudinary_api_key: String,

    // --- Secrets ---
    /// Media host API secret (request signing)
    pub cloudinary_api_secret: String,
    /// JWT signing key for session cookies (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let firebase_project_id = required("FIREBASE_PROJECT_ID")?;
        let firebase_storage_bucket = env::var("FIREBASE_STORAGE_BUCKET")
            .unwrap_or_else(|_| format!("{firebase_project_id}.firebasestorage.app"));

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw.clone()))?,
            Err(_) => 8080,
        };

        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("MAX_UPLOAD_BYTES", raw.clone()))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .parse()?;

        Ok(Self {
            firebase_project_id,
            firebase_storage_bucket,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port,
            store_backend,
            max_upload_bytes,
            cloudinary_cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            cloudinary_api_key: required("CLOUDINARY_API_KEY")?,
            cloudinary_api_secret: required("CLOUDINARY_API_SECRET")?,
            jwt_signing_key: required("JWT_SIGNING_KEY")?.into_bytes(),
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "eventgenie-test".to_string(),
            firebase_storage_bucket: "eventgenie-test.firebasestorage.app".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cloudinary_cloud_name: "test-cloud".to_string(),
            cloudinary_api_key: "test_api_key".to_string(),
            cloudinary_api_secret: "test_api_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Whether cookies may omit the `Secure` attribute (local frontend).
    pub fn is_local_frontend(&self) -> bool {
        self.frontend_url.starts_with("http://localhost")
            || self.frontend_url.starts_with("http://127.0.0.1")
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
