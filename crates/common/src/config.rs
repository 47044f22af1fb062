//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Token signing configuration.
    pub auth: AuthConfig,
    /// Upload storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Certificate output configuration.
    #[serde(default)]
    pub certificates: CertificateConfig,
    /// Background sweep configuration.
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the frontend, used in certificate verification links.
    pub url: String,
    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Bearer token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory uploads are written to.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Path the upload directory is served under.
    #[serde(default = "default_upload_base_url")]
    pub base_url: String,
    /// Maximum size of a single upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Certificate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateConfig {
    /// Directory generated PDFs are written to.
    #[serde(default = "default_certificate_dir")]
    pub output_dir: PathBuf,
    /// Base of the verification link embedded in the QR code.
    /// Falls back to `{server.url}/verify-certificate` when unset.
    #[serde(default)]
    pub verify_base_url: Option<String>,
    /// TrueType font embedded in certificates. Without one the builtin
    /// Helvetica faces are used, which only draw Latin-1 text.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Bold face for headings; the regular font is reused when unset.
    #[serde(default)]
    pub bold_font_path: Option<PathBuf>,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// Whether the event completion sweep runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between two sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            base_url: default_upload_base_url(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            output_dir: default_certificate_dir(),
            verify_base_url: None,
            font_path: None,
            bold_font_path: None,
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_token_ttl_hours() -> i64 {
    24
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("public/uploads")
}

fn default_upload_base_url() -> String {
    "/uploads".to_string()
}

const fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_certificate_dir() -> PathBuf {
    PathBuf::from("public/certificates")
}

const fn default_sweep_interval_secs() -> u64 {
    24 * 60 * 60
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `VHUB_ENV`)
    /// 4. Environment variables with `VHUB_` prefix, e.g. `VHUB__AUTH__JWT_SECRET`
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("VHUB_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("VHUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("VHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Verification link base for certificate QR codes.
    #[must_use]
    pub fn certificate_verify_base(&self) -> String {
        self.certificates.verify_base_url.clone().unwrap_or_else(|| {
            format!("{}/verify-certificate", self.server.url.trim_end_matches('/'))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_for_optional_sections() {
        let raw = r#"
            [server]
            url = "https://volunteer.example.org/"

            [database]
            url = "postgres://localhost/vhub"

            [auth]
            jwt_secret = "secret"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.storage.upload_dir, PathBuf::from("public/uploads"));
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert!(config.scheduler.enabled);
        assert_eq!(
            config.certificate_verify_base(),
            "https://volunteer.example.org/verify-certificate"
        );
    }
}
