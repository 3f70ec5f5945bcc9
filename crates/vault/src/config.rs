//! Configuration loading and validation for the vault service.
//!
//! Values come from an optional JSON file overlaid by `VAULT_*` environment
//! variables (`VAULT_TRUST_ANCHOR_DIR`, `VAULT_LISTEN`, ...). The process
//! exits with a clear error message if anything required is missing or invalid.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::http::HeaderName;
use serde::Deserialize;

/// File read when no path is given on the command line. Optional.
pub const DEFAULT_CONFIG_PATH: &str = "conf/config.json";

/// Prefix of the environment variables that override file values.
const ENV_PREFIX: &str = "VAULT";

/// Validated vault service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the server binds to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// SQLite database file. Parent directories are created on startup.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory holding one `<issuer>.crt` public key per trusted issuer. **Required.**
    pub trust_anchor_dir: PathBuf,

    /// Header carrying the per-request encryption secret.
    #[serde(default = "default_secret_header")]
    pub secret_header_name: String,

    /// PEM certificate chain. Set together with `tls_key_path` to serve HTTPS.
    #[serde(default)]
    pub tls_cert_path: Option<PathBuf>,

    /// PEM private key matching `tls_cert_path`.
    #[serde(default)]
    pub tls_key_path: Option<PathBuf>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP/gRPC collector endpoint. Span export is off when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Upper bound on the handling time of a single request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_listen() -> String {
    "127.0.0.1:5100".into()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("db/vault.db")
}
fn default_secret_header() -> String {
    "X-Vault-Key".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_request_timeout() -> u64 {
    30
}

impl Config {
    /// Load and validate configuration.
    ///
    /// An explicit `path` must exist; without one, [`DEFAULT_CONFIG_PATH`] is
    /// read if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read, a value cannot be parsed,
    /// or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        let cfg = config::Config::builder()
            .add_source(config::File::from(file).required(required))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to build configuration from {}", file.display()))?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.trust_anchor_dir.as_os_str().is_empty() {
            anyhow::bail!("trust_anchor_dir is required and must not be empty");
        }
        self.listen_addr()?;
        self.secret_header()?;
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be > 0");
        }
        self.tls_paths()?;
        Ok(())
    }

    /// Parsed bind address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .with_context(|| format!("listen is not a socket address: {:?}", self.listen))
    }

    /// Secret header as an HTTP header name (lower-cased).
    pub fn secret_header(&self) -> Result<HeaderName> {
        if self.secret_header_name.trim().is_empty() {
            anyhow::bail!("secret_header_name is required and must not be empty");
        }
        HeaderName::from_bytes(self.secret_header_name.as_bytes())
            .with_context(|| format!("secret_header_name is not a valid header: {:?}", self.secret_header_name))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Certificate and key paths, if TLS is configured.
    ///
    /// # Errors
    ///
    /// Returns an error when only one of the pair is set.
    pub fn tls_paths(&self) -> Result<Option<(&Path, &Path)>> {
        match (&self.tls_cert_path, &self.tls_key_path) {
            (Some(cert), Some(key)) => Ok(Some((cert.as_path(), key.as_path()))),
            (None, None) => Ok(None),
            _ => anyhow::bail!("tls_cert_path and tls_key_path must be set together"),
        }
    }
}
