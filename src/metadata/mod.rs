pub mod images;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::KdmError;

pub use images::SystemImages;

/// Key inside `K8sVersionedTemplates` that maps template ids to template names
/// instead of describing an add-on.
pub const TEMPLATE_KEYS: &str = "templateKeys";

/// Range expression -> template id, in document order.
pub type TemplateRanges = IndexMap<String, String>;

/// A parsed KDM `data.json` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KdmData {
    #[serde(rename = "K8sVersionRKESystemImages", default)]
    pub k8s_version_rke_system_images: BTreeMap<String, SystemImages>,
    #[serde(rename = "K8sVersionServiceOptions", default)]
    pub k8s_version_service_options: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "K8sVersionWindowsServiceOptions", default)]
    pub k8s_version_windows_service_options: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "K8sVersionInfo", default)]
    pub k8s_version_info: BTreeMap<String, VersionInfo>,
    #[serde(rename = "K8sVersionedTemplates", default)]
    pub k8s_versioned_templates: IndexMap<String, TemplateRanges>,
    #[serde(rename = "RancherDefaultK8sVersions", default)]
    pub rancher_default_k8s_versions: BTreeMap<String, String>,
    #[serde(rename = "RKEDefaultK8sVersions", default)]
    pub rke_default_k8s_versions: BTreeMap<String, String>,
    #[serde(default)]
    pub rke2: ExternalReleases,
    #[serde(default)]
    pub k3s: ExternalReleases,
}

impl KdmData {
    /// Decodes a document. `origin` names the file or URL for error messages.
    pub fn from_slice(bytes: &[u8], origin: &str) -> Result<Self, KdmError> {
        serde_json::from_slice(bytes).map_err(|source| KdmError::ParseError {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn system_images(&self, k8s_version: &str) -> Option<&SystemImages> {
        self.k8s_version_rke_system_images.get(k8s_version)
    }

    pub fn template_ranges(&self, addon: &str) -> Option<&TemplateRanges> {
        self.k8s_versioned_templates.get(addon)
    }

    pub fn template_name(&self, template_id: &str) -> Option<&str> {
        self.k8s_versioned_templates
            .get(TEMPLATE_KEYS)
            .and_then(|keys| keys.get(template_id))
            .map(String::as_str)
    }
}

/// Product-version bounds for a Kubernetes version (or a whole `vMAJOR.MINOR` family).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionInfo {
    pub min_rancher_version: String,
    pub max_rancher_version: String,
    pub deprecate_rancher_version: String,
    #[serde(rename = "minRKEVersion")]
    pub min_rke_version: String,
    #[serde(rename = "maxRKEVersion")]
    pub max_rke_version: String,
    #[serde(rename = "deprecateRKEVersion")]
    pub deprecate_rke_version: String,
}

/// Release table for a distribution shipped outside the RKE image map (RKE2, K3s).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalReleases {
    pub releases: Vec<ExternalRelease>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalRelease {
    pub version: String,
    pub min_channel_server_version: String,
    pub max_channel_server_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "K8sVersionRKESystemImages": {
            "v1.24.10-rancher4-1": {
                "etcd": "rancher/mirrored-coreos-etcd:v3.5.6",
                "kubernetes": "rancher/hyperkube:v1.24.10-rancher4"
            }
        },
        "K8sVersionInfo": {
            "v1.24": { "minRancherVersion": "2.6.9-patch0", "minRKEVersion": "1.3.16-rc0" }
        },
        "K8sVersionedTemplates": {
            "coredns": { ">=1.24.0-rancher0": "coredns-v1.8.6" },
            "templateKeys": { "coredns-v1.8.6": "coredns template" }
        },
        "rke2": {
            "releases": [
                {
                    "version": "v1.24.10+rke2r1",
                    "minChannelServerVersion": "v2.6.9-alpha1",
                    "maxChannelServerVersion": "v2.7.99",
                    "serverArgs": {}
                }
            ]
        },
        "K8sVersionDockerInfo": { "1.24": ["20.10"] }
    }"#;

    #[test]
    fn parses_upstream_document_shape() {
        let data = KdmData::from_slice(SAMPLE.as_bytes(), "sample").expect("valid document");
        let images = data
            .system_images("v1.24.10-rancher4-1")
            .expect("images for version");
        assert_eq!(images.etcd, "rancher/mirrored-coreos-etcd:v3.5.6");
        assert_eq!(
            data.k8s_version_info["v1.24"].min_rancher_version,
            "2.6.9-patch0"
        );
        assert_eq!(data.k8s_version_info["v1.24"].min_rke_version, "1.3.16-rc0");
        assert_eq!(data.template_name("coredns-v1.8.6"), Some("coredns template"));
        assert_eq!(data.rke2.releases[0].max_channel_server_version, "v2.7.99");
        assert!(data.k3s.releases.is_empty());
    }

    #[test]
    fn parse_failure_names_origin() {
        let err = KdmData::from_slice(b"{ not json", "./local.json").expect_err("invalid json");
        match err {
            KdmError::ParseError { origin, .. } => assert_eq!(origin, "./local.json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_shape_is_a_parse_error() {
        let err = KdmData::from_slice(br#"{"K8sVersionRKESystemImages": []}"#, "remote")
            .expect_err("array is not a map");
        assert!(matches!(err, KdmError::ParseError { .. }));
    }
}
