use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::KdmError;
use crate::metadata::KdmData;
use crate::source::{ChannelSpec, ChannelVersion, MetadataFetcher, SourceUrls};
use crate::version::{parse_semver, prepend_v};

/// Turns a channel spec plus a product version into a parsed document.
///
/// Nothing is cached: every call reads or fetches again.
#[derive(Clone)]
pub struct Resolver {
    fetcher: Arc<dyn MetadataFetcher>,
    urls: SourceUrls,
}

impl Resolver {
    pub fn new(fetcher: Arc<dyn MetadataFetcher>, urls: SourceUrls) -> Self {
        Self { fetcher, urls }
    }

    /// Resolves the document describing `release_version` (e.g. `v2.7.5`).
    ///
    /// Pinned channels read the per-release snapshot (`2.7.5` and `v2.7.5` name the
    /// same one). Other named channels read the channel document of the release's
    /// `MAJOR.MINOR` line, which requires `release_version` to be valid semver.
    pub async fn resolve(
        &self,
        release_version: &str,
        spec: &ChannelSpec,
    ) -> Result<KdmData, KdmError> {
        match spec {
            ChannelSpec::LocalPath(path) => read_local(path).await,
            ChannelSpec::Url(url) => self.fetch_document(url.as_str()).await,
            ChannelSpec::Named(channel) if channel.is_pinned() => {
                self.fetch_document(&self.urls.embedded_url(&prepend_v(release_version)))
                    .await
            }
            ChannelSpec::Named(channel) => {
                let version = parse_semver(release_version)?;
                let channel_version = format!("v{}.{}", version.major, version.minor);
                self.fetch_document(&self.urls.channel_url(*channel, &channel_version))
                    .await
            }
        }
    }

    /// Resolves the channel document for a product minor line (e.g. `v2.7`).
    /// Local paths and URLs are read as-is.
    pub async fn resolve_channel_version(
        &self,
        channel_version: &ChannelVersion,
        spec: &ChannelSpec,
    ) -> Result<KdmData, KdmError> {
        match spec {
            ChannelSpec::LocalPath(path) => read_local(path).await,
            ChannelSpec::Url(url) => self.fetch_document(url.as_str()).await,
            ChannelSpec::Named(channel) => {
                self.fetch_document(&self.urls.channel_url(*channel, channel_version.as_str()))
                    .await
            }
        }
    }

    async fn fetch_document(&self, url: &str) -> Result<KdmData, KdmError> {
        info!(url, "fetching KDM data");
        let body = self.fetcher.fetch(url).await?;
        KdmData::from_slice(&body, url)
    }
}

pub async fn read_local(path: &Path) -> Result<KdmData, KdmError> {
    info!(path = %path.display(), "reading local KDM data");
    let body = tokio::fs::read(path).await.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            KdmError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            KdmError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    KdmData::from_slice(&body, &path.display().to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::source::Channel;

    /// Serves canned bodies by URL and records what was requested.
    #[derive(Default)]
    pub(crate) struct FakeFetcher {
        bodies: HashMap<String, String>,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub(crate) fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requested.lock().expect("requested mutex").clone()
        }
    }

    #[async_trait]
    impl MetadataFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, KdmError> {
            self.requested
                .lock()
                .expect("requested mutex")
                .push(url.to_string());
            self.bodies
                .get(url)
                .map(|body| body.as_bytes().to_vec())
                .ok_or_else(|| KdmError::FetchError {
                    url: url.to_string(),
                    reason: "server returned 404 Not Found".to_string(),
                })
        }
    }

    const DOC: &str = r#"{"K8sVersionRKESystemImages":{"v1.24.10-rancher4-1":{"etcd":"rancher/mirrored-coreos-etcd:v3.5.6"}}}"#;

    fn resolver(fetcher: Arc<FakeFetcher>) -> Resolver {
        Resolver::new(fetcher, SourceUrls::default())
    }

    #[tokio::test]
    async fn pinned_channels_read_release_snapshot() {
        let url = "https://raw.githubusercontent.com/superseb/kdmq/main/embedded/data.v2.7.5.json";
        let fetcher = Arc::new(FakeFetcher::default().with(url, DOC));
        let resolver = resolver(fetcher.clone());

        for channel in [Channel::Release, Channel::Latest] {
            let data = resolver
                .resolve("v2.7.5", &ChannelSpec::Named(channel))
                .await
                .expect("resolves");
            assert!(data.system_images("v1.24.10-rancher4-1").is_some());
        }
        assert_eq!(fetcher.requested(), vec![url.to_string(), url.to_string()]);
    }

    #[tokio::test]
    async fn release_snapshot_name_gets_v_prefix() {
        let url = "https://raw.githubusercontent.com/superseb/kdmq/main/embedded/data.v2.6.9.json";
        let fetcher = Arc::new(FakeFetcher::default().with(url, DOC));

        resolver(fetcher.clone())
            .resolve("2.6.9", &ChannelSpec::Named(Channel::Release))
            .await
            .expect("resolves");
        assert_eq!(fetcher.requested(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn dev_channel_truncates_release_to_minor() {
        let url = "https://releases.rancher.com/kontainer-driver-metadata/dev-v2.7/data.json";
        let fetcher = Arc::new(FakeFetcher::default().with(url, DOC));

        resolver(fetcher.clone())
            .resolve("v2.7.5-rc3", &ChannelSpec::Named(Channel::Dev))
            .await
            .expect("resolves");
        assert_eq!(fetcher.requested(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn dev_channel_requires_semver_before_fetching() {
        let fetcher = Arc::new(FakeFetcher::default());
        let err = resolver(fetcher.clone())
            .resolve("v2.7", &ChannelSpec::Named(Channel::Dev))
            .await
            .expect_err("partial version");

        assert!(matches!(err, KdmError::InvalidVersion { ref version, .. } if version == "v2.7"));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn custom_url_is_fetched_verbatim() {
        let url = "https://mirror.example.com/kdm/custom.json";
        let fetcher = Arc::new(FakeFetcher::default().with(url, DOC));
        let spec = ChannelSpec::parse(url).expect("url spec");

        resolver(fetcher.clone())
            .resolve("anything", &spec)
            .await
            .expect("resolves");
        assert_eq!(fetcher.requested(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let fetcher = Arc::new(FakeFetcher::default());
        let spec = ChannelSpec::parse("./local.json").expect("local spec");

        let err = resolver(fetcher.clone())
            .resolve("v2.7.5", &spec)
            .await
            .expect_err("missing file");

        match &err {
            KdmError::NotFound { path } => assert_eq!(path, &PathBuf::from("./local.json")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("./local.json"));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn local_file_is_parsed_like_a_response() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(DOC.as_bytes()).expect("write doc");

        let data = read_local(file.path()).await.expect("parses");
        assert_eq!(
            data.system_images("v1.24.10-rancher4-1")
                .map(|images| images.etcd.as_str()),
            Some("rancher/mirrored-coreos-etcd:v3.5.6")
        );
    }

    #[tokio::test]
    async fn unparseable_local_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"<html>").expect("write junk");

        let err = read_local(file.path()).await.expect_err("junk");
        assert!(matches!(err, KdmError::ParseError { .. }));
    }

    #[tokio::test]
    async fn unparseable_response_is_parse_error() {
        let url = "https://releases.rancher.com/kontainer-driver-metadata/release-v2.8/data.json";
        let fetcher = Arc::new(FakeFetcher::default().with(url, "not json"));
        let version = ChannelVersion::parse("v2.8").expect("channel version");

        let err = resolver(fetcher)
            .resolve_channel_version(&version, &ChannelSpec::Named(Channel::Latest))
            .await
            .expect_err("junk body");

        match err {
            KdmError::ParseError { origin, .. } => assert_eq!(origin, url),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn fetch_failures_propagate() {
        let fetcher = Arc::new(FakeFetcher::default());
        let version = ChannelVersion::parse("v2.6").expect("channel version");

        let err = resolver(fetcher)
            .resolve_channel_version(&version, &ChannelSpec::Named(Channel::Dev))
            .await
            .expect_err("nothing served");
        assert!(matches!(err, KdmError::FetchError { ref url, .. } if url.ends_with("/dev-v2.6/data.json")));
    }
}
