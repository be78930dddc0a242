use std::path::PathBuf;

use wizflow_core::upload::UploadConfig;

/// Deployment flavour. Controls whether internal error details reach
/// API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse `APP_ENV`. Anything other than `development`/`dev` is treated
    /// as production.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Postgres connection string. When unset the server keeps workflows
    /// in memory.
    pub database_url: Option<String>,
    /// Directory uploaded file bytes are written to (default: `uploads`).
    pub upload_dir: PathBuf,
    /// URL prefix the upload directory is served under (default: `/uploads`).
    pub uploads_url_prefix: String,
    /// File count and size limits.
    pub upload: UploadConfig,
    pub environment: Environment,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:8080`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `DATABASE_URL`          | unset (in-memory store)    |
    /// | `UPLOAD_DIR`            | `uploads`                  |
    /// | `UPLOADS_URL_PREFIX`    | `/uploads`                 |
    /// | `APP_ENV`               | `production`               |
    ///
    /// Upload limits are read by [`UploadConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8080".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
        );

        let uploads_url_prefix = normalize_prefix(
            &std::env::var("UPLOADS_URL_PREFIX").unwrap_or_else(|_| "/uploads".into()),
        );

        let environment =
            Environment::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "production".into()));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            upload_dir,
            uploads_url_prefix,
            upload: UploadConfig::from_env(),
            environment,
        }
    }

    /// Largest request body accepted by the upload endpoint: every allowed
    /// file at full size plus 1 MiB of multipart framing.
    pub fn upload_body_limit(&self) -> usize {
        let files = (self.upload.max_files as u64).saturating_mul(self.upload.max_size_bytes);
        usize::try_from(files.saturating_add(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

/// Ensure a URL prefix starts with `/` and has no trailing slash.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
