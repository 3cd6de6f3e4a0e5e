use serde::Deserialize;
use std::env;
use wayfare_shared::{Masked, WebDavConfig};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub linking: LinkingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default = "default_path")]
    pub path: String,
    pub redis_url: Option<String>,
    #[serde(default)]
    pub key_prefix: String,
}

fn default_path() -> String {
    "data".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinkingConfig {
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

fn default_window_days() -> i64 {
    30
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Masked<String>,
    #[serde(default)]
    pub use_proxy: bool,
}

impl SyncConfig {
    pub fn webdav(&self) -> WebDavConfig {
        WebDavConfig {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            enabled: self.enabled,
            use_proxy: self.use_proxy,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Machine-local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `WAYFARE__LINKING__WINDOW_DAYS=45`
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse("[storage]\nbackend = \"memory\"\n");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.path, "data");
        assert_eq!(config.linking.window_days, 30);
        assert!(!config.sync.webdav().is_usable());
    }

    #[test]
    fn test_sync_section_maps_to_webdav() {
        let config = parse(
            r#"
            [storage]
            backend = "file"
            path = "/var/lib/wayfare"

            [linking]
            window_days = 45

            [sync]
            enabled = true
            url = "https://app.koofr.net/dav/Koofr"
            username = "me@example.com"
            password = "app-password"
            use_proxy = true
            "#,
        );
        assert_eq!(config.linking.window_days, 45);

        let webdav = config.sync.webdav();
        assert!(webdav.is_usable());
        assert_eq!(webdav.password.expose(), "app-password");
        assert!(!format!("{:?}", config.sync).contains("app-password"));
    }
}
