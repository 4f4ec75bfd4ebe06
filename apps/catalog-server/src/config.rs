//! Layered server configuration.
//!
//! Precedence, lowest first: built-in defaults, YAML file, `CATALOG__*`
//! environment variables, command-line overrides.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use catalog_auth::JwtConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use product_catalog::{CatalogConfig, DEFAULT_BODY_LIMIT};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "CATALOG__";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub bind_addr: SocketAddr,
    pub body_limit_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8087)),
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// Token verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// HS256 secret; must be set for `run`
    pub secret: String,
    pub issuers: Vec<String>,
    pub audiences: Vec<String>,
    pub leeway_seconds: u64,
}

impl Default for AuthSection {
    fn default() -> Self {
        let jwt = JwtConfig::default();
        Self {
            secret: jwt.secret,
            issuers: jwt.issuers,
            audiences: jwt.audiences,
            leeway_seconds: jwt.leeway_seconds,
        }
    }
}

impl AuthSection {
    #[must_use]
    pub fn to_jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.secret.clone(),
            issuers: self.issuers.clone(),
            audiences: self.audiences.clone(),
            leeway_seconds: self.leeway_seconds,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub logging: LoggingSection,
    pub auth: AuthSection,
    pub catalog: CatalogConfig,
}

/// Values taken from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub verbose: u8,
}

impl AppConfig {
    /// Load defaults, then `path` (if any), then the environment.
    ///
    /// # Errors
    /// Fails when the file is missing or unreadable, or when any layer
    /// carries a value of the wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            anyhow::ensure!(
                path.is_file(),
                "config file does not exist: {}",
                path.display()
            );
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }

    pub fn apply_cli_overrides(&mut self, cli: CliOverrides) {
        if let Some(port) = cli.port {
            self.server.bind_addr.set_port(port);
        }
        let level = match cli.verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// Checks that only matter when the server is about to serve.
    ///
    /// # Errors
    /// Lists the first setting that makes the server unusable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.auth.secret.is_empty(), "auth.secret must be set");
        anyhow::ensure!(
            self.catalog.default_page_size >= 1
                && self.catalog.default_page_size <= self.catalog.max_page_size,
            "catalog.default_page_size must be between 1 and catalog.max_page_size"
        );
        anyhow::ensure!(
            self.catalog.max_image_bytes <= self.server.body_limit_bytes,
            "catalog.max_image_bytes exceeds server.body_limit_bytes"
        );
        Ok(())
    }

    /// # Errors
    /// Fails if the config cannot be serialized.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("serializing configuration")
    }
}
