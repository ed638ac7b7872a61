use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::source::{DEFAULT_EMBEDDED_BASE_URL, DEFAULT_RELEASE_BASE_URL};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_release_base_url")]
    pub release_base_url: String,
    #[serde(default = "default_embedded_base_url")]
    pub embedded_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/kdmq/config.toml")
    }

    /// Reads `path` (or the default location). A missing file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn default_template() -> String {
        format!(
            r#"[sources]
release_base_url = "{release}"
embedded_base_url = "{embedded}"

[http]
user_agent = "{agent}"
timeout_secs = {timeout}
connect_timeout_secs = {connect}
"#,
            release = default_release_base_url(),
            embedded = default_embedded_base_url(),
            agent = default_user_agent(),
            timeout = default_timeout_secs(),
            connect = default_connect_timeout_secs(),
        )
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            release_base_url: default_release_base_url(),
            embedded_base_url: default_embedded_base_url(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_release_base_url() -> String {
    DEFAULT_RELEASE_BASE_URL.to_string()
}

fn default_embedded_base_url() -> String {
    DEFAULT_EMBEDDED_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("kdmq/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_back_to_defaults() {
        let parsed: Config = toml::from_str(&Config::default_template()).expect("valid template");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Config::load(Some(&dir.path().join("absent.toml"))).expect("defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[sources]\nrelease_base_url = \"http://127.0.0.1:9000/kdm\"\n",
        )
        .expect("write config");

        let config = Config::load(Some(&path)).expect("loads");
        assert_eq!(config.sources.release_base_url, "http://127.0.0.1:9000/kdm");
        assert_eq!(config.sources.embedded_base_url, DEFAULT_EMBEDDED_BASE_URL);
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn write_template_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested/kdmq/config.toml");
        Config::write_template(&path).expect("writes");
        assert_eq!(Config::load(Some(&path)).expect("loads"), Config::default());
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[http\ntimeout_secs = 1").expect("write config");
        let err = Config::load(Some(&path)).expect_err("invalid toml");
        assert!(err.to_string().contains("failed parsing TOML config"));
    }
}
