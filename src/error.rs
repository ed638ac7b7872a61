use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KdmError {
    #[error("not a valid channel [{channel}], valid options are [{valid}]")]
    InvalidChannel { channel: String, valid: String },

    #[error("not a valid semver version [{version}]: {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("not a valid channel version [{0}], expected something like v2.7")]
    InvalidChannelVersion(String),

    #[error("range [{range}] for {addon} is not a valid semver range: {reason}")]
    InvalidRange {
        addon: String,
        range: String,
        reason: String,
    },

    #[error("local data file [{}] does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("failed reading local data file [{}]: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed fetching KDM data from [{url}]: {reason}")]
    FetchError { url: String, reason: String },

    #[error("failed translating data from [{origin}] to KDM data: {source}")]
    ParseError {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no {addon} template found for k8sVersion {k8s_version}")]
    TemplateNotFound { addon: String, k8s_version: String },

    #[error("no images found for k8sVersion [{k8s_version}], available versions: [{}]", available.join(", "))]
    NoImagesFound {
        k8s_version: String,
        available: Vec<String>,
    },
}

impl KdmError {
    pub(crate) fn invalid_version(version: &str, reason: impl ToString) -> Self {
        Self::InvalidVersion {
            version: version.to_string(),
            reason: reason.to_string(),
        }
    }
}
