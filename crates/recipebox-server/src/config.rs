use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Uploaded image storage
    #[serde(default)]
    pub media: MediaConfig,
    /// Account rules
    #[serde(default)]
    pub auth: AuthSettings,
    /// Bootstrap configuration (initial admin user)
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

// Default derived via field defaults

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Media validation
        let prefix = &self.media.url_prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            return Err("media.url_prefix must look like '/media'".into());
        }
        if self.media.max_image_bytes == 0 {
            return Err("media.max_image_bytes must be > 0".into());
        }
        if self.media.max_image_bytes > self.server.body_limit_bytes {
            return Err("media.max_image_bytes must be <= server.body_limit_bytes".into());
        }
        // Auth validation
        if self.auth.min_password_length == 0 {
            return Err("auth.min_password_length must be > 0".into());
        }
        if let Some(ref admin) = self.bootstrap.admin_user {
            if admin.email.trim().is_empty() {
                return Err("bootstrap.admin_user.email must not be empty".into());
            }
            if admin.password.chars().count() < self.auth.min_password_length {
                return Err(format!(
                    "bootstrap.admin_user.password must have at least {} characters",
                    self.auth.min_password_length
                ));
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Applies to JSON and multipart bodies alike.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded files are written under.
    #[serde(default = "default_media_root")]
    pub root: PathBuf,
    /// Public path the media root is served from.
    #[serde(default = "default_media_url_prefix")]
    pub url_prefix: String,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}
fn default_media_url_prefix() -> String {
    "/media".into()
}
fn default_max_image_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            url_prefix: default_media_url_prefix(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

fn default_min_password_length() -> usize {
    5
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
        }
    }
}

/// Bootstrap configuration for initial server setup
///
/// Admin credentials can also be set via environment variables:
/// - RECIPEBOX__BOOTSTRAP__ADMIN_USER__EMAIL
/// - RECIPEBOX__BOOTSTRAP__ADMIN_USER__PASSWORD
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    /// If set, creates a superuser on startup (if not already exists)
    #[serde(default)]
    pub admin_user: Option<AdminUserConfig>,
}

/// Configuration for bootstrapping an admin user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserConfig {
    pub email: String,
    /// Plain text, hashed before storage.
    /// For security, prefer using the RECIPEBOX__BOOTSTRAP__ADMIN_USER__PASSWORD env var
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "recipebox.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        } else if path.is_some() {
            tracing::warn!(path = %pathbuf.display(), "Config file not found, using defaults");
        }
        // Environment variable overrides, e.g., RECIPEBOX__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("RECIPEBOX")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.media.url_prefix, "/media");
        assert_eq!(cfg.auth.min_password_length, 5);
        assert_eq!(cfg.addr().port(), 8000);
    }

    #[test]
    fn rejects_bad_media_prefix() {
        let mut cfg = AppConfig::default();
        cfg.media.url_prefix = "media".into();
        assert!(cfg.validate().is_err());
        cfg.media.url_prefix = "/".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_short_admin_password() {
        let mut cfg = AppConfig::default();
        cfg.bootstrap.admin_user = Some(AdminUserConfig {
            email: "admin@example.com".into(),
            password: "abc".into(),
            name: None,
        });
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("at least 5"));
    }
}
