pub mod fetcher;
pub mod resolver;

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::config::SourcesConfig;
use crate::error::KdmError;

pub use fetcher::{HttpFetcher, MetadataFetcher, FETCH_RETRIES};
pub use resolver::Resolver;

pub const DEFAULT_RELEASE_BASE_URL: &str = "https://releases.rancher.com/kontainer-driver-metadata";
pub const DEFAULT_EMBEDDED_BASE_URL: &str =
    "https://raw.githubusercontent.com/superseb/kdmq/main/embedded";

static CHANNEL_VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v2\.[4-9]").expect("channel version pattern is valid"));

/// Named metadata distribution tracks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Release,
    Latest,
    Dev,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Release, Channel::Latest, Channel::Dev];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Latest => "latest",
            Self::Dev => "dev",
        }
    }

    /// Path segment used on the metadata host. `latest` is published as `release`.
    pub fn url_slug(&self) -> &'static str {
        match self {
            Self::Release | Self::Latest => "release",
            Self::Dev => "dev",
        }
    }

    /// Pinned channels are served from the per-release snapshot instead of the
    /// per-minor channel document.
    pub fn is_pinned(&self) -> bool {
        matches!(self, Self::Release | Self::Latest)
    }

    fn valid_options() -> String {
        Self::ALL
            .iter()
            .map(Channel::as_slug)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

impl FromStr for Channel {
    type Err = KdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "release" => Ok(Self::Release),
            "latest" => Ok(Self::Latest),
            "dev" => Ok(Self::Dev),
            _ => Err(KdmError::InvalidChannel {
                channel: s.to_string(),
                valid: Self::valid_options(),
            }),
        }
    }
}

/// Where a metadata document comes from, decided once from the raw channel argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSpec {
    LocalPath(PathBuf),
    Url(Url),
    Named(Channel),
}

impl ChannelSpec {
    /// Local paths (`./...`) win over URLs, URLs over channel names.
    pub fn parse(raw: &str) -> Result<Self, KdmError> {
        if raw.starts_with("./") {
            return Ok(Self::LocalPath(PathBuf::from(raw)));
        }
        if let Some(url) = absolute_url(raw) {
            return Ok(Self::Url(url));
        }
        raw.parse().map(Self::Named)
    }
}

impl FromStr for ChannelSpec {
    type Err = KdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ChannelSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalPath(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
            Self::Named(channel) => write!(f, "{channel}"),
        }
    }
}

fn absolute_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
        return None;
    }
    Some(url)
}

/// A product minor line such as `v2.7`, naming which channel document to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelVersion(String);

impl ChannelVersion {
    pub fn parse(raw: &str) -> Result<Self, KdmError> {
        if CHANNEL_VERSION_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(KdmError::InvalidChannelVersion(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChannelVersion {
    type Err = KdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ChannelVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base locations of the well-known documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrls {
    release_base_url: String,
    embedded_base_url: String,
}

impl SourceUrls {
    pub fn new(release_base_url: &str, embedded_base_url: &str) -> Self {
        Self {
            release_base_url: release_base_url.trim_end_matches('/').to_string(),
            embedded_base_url: embedded_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `<base>/<channel>-<channel_version>/data.json`
    pub fn channel_url(&self, channel: Channel, channel_version: &str) -> String {
        format!(
            "{}/{}-{}/data.json",
            self.release_base_url,
            channel.url_slug(),
            channel_version
        )
    }

    /// `<base>/data.<release_version>.json`
    pub fn embedded_url(&self, release_version: &str) -> String {
        format!("{}/data.{}.json", self.embedded_base_url, release_version)
    }
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASE_BASE_URL, DEFAULT_EMBEDDED_BASE_URL)
    }
}

impl From<&SourcesConfig> for SourceUrls {
    fn from(value: &SourcesConfig) -> Self {
        Self::new(&value.release_base_url, &value.embedded_base_url)
    }
}
