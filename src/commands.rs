//! One entry point per CLI command. Each resolves its documents through a
//! [`Resolver`] and returns a serializable report; rendering lives in `output`.

use serde::Serialize;
use tracing::debug;

use crate::diff::{diff_one_way, diff_symmetric, unique};
use crate::error::KdmError;
use crate::metadata::KdmData;
use crate::query::{
    images_for_k8s_versions, list_addon_names, list_k8s_versions, list_versions, require_images,
    resolve_template, Product,
};
use crate::source::{ChannelSpec, ChannelVersion, Resolver};
use crate::version::latest_per_minor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    #[default]
    Symmetric,
    /// Only what the right-hand side adds.
    OneWay,
}

impl DiffMode {
    pub fn from_one_way(one_way: bool) -> Self {
        if one_way {
            Self::OneWay
        } else {
            Self::Symmetric
        }
    }

    /// Unsorted difference between `left` and `right` under this mode.
    pub fn apply<S: AsRef<str>>(&self, left: &[S], right: &[S]) -> Vec<String> {
        match self {
            Self::Symmetric => diff_symmetric(left, right),
            Self::OneWay => diff_one_way(right, left),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionList {
    pub release_version: String,
    pub channel: String,
    pub product: Product,
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseVersions {
    pub release_version: String,
    pub channel: String,
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDiff {
    pub left: ReleaseVersions,
    pub right: ReleaseVersions,
    pub mode: DiffMode,
    pub difference: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseImages {
    pub release_version: String,
    pub channel: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseImageDiff {
    pub left: ReleaseImages,
    pub right: ReleaseImages,
    pub mode: DiffMode,
    pub difference: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct K8sImages {
    pub k8s_version: String,
    pub channel: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct K8sImageDiff {
    pub left: K8sImages,
    pub right: K8sImages,
    pub mode: DiffMode,
    pub difference: Vec<String>,
}

/// Outcome of resolving one add-on. A failure is kept as text so the rest of the
/// table still renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AddonTemplate {
    Resolved {
        template_id: String,
        template_name: String,
    },
    Unresolved {
        error: String,
    },
}

impl AddonTemplate {
    fn resolve(data: &KdmData, addon: &str, k8s_version: &str) -> Self {
        match resolve_template(data, addon, k8s_version) {
            Ok(found) => Self::Resolved {
                template_id: found.template_id,
                template_name: found.template_name,
            },
            Err(err) => {
                debug!(addon, k8s_version, error = %err, "no template");
                Self::Unresolved {
                    error: err.to_string(),
                }
            }
        }
    }

    /// Template id, or the error text when nothing applies.
    pub fn label(&self) -> &str {
        match self {
            Self::Resolved { template_id, .. } => template_id,
            Self::Unresolved { error } => error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddonRow {
    pub addon: String,
    pub template: AddonTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddonList {
    pub k8s_version: String,
    pub channel: String,
    pub addons: Vec<AddonRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddonDiffRow {
    pub addon: String,
    pub left: AddonTemplate,
    pub right: AddonTemplate,
    pub differs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddonDiff {
    pub left_version: String,
    pub right_version: String,
    pub channel: String,
    pub addons: Vec<AddonDiffRow>,
}

/// `listk8s`: Kubernetes versions a release can deploy.
pub async fn list_k8s(
    resolver: &Resolver,
    release_version: &str,
    channel: &ChannelSpec,
    product: Product,
    latest: bool,
) -> Result<VersionList, KdmError> {
    let data = resolver.resolve(release_version, channel).await?;
    let mut versions = list_versions(&data, product, release_version);
    if latest {
        versions = latest_per_minor(&versions);
    }
    Ok(VersionList {
        release_version: release_version.to_string(),
        channel: channel.to_string(),
        product,
        versions,
    })
}

/// `diffk8s`: compares the RKE versions of two releases. Without `right_channel`
/// both releases are read from the left document.
pub async fn diff_k8s(
    resolver: &Resolver,
    left_release: &str,
    right_release: &str,
    left_channel: &ChannelSpec,
    right_channel: Option<&ChannelSpec>,
    mode: DiffMode,
) -> Result<VersionDiff, KdmError> {
    let left_data = resolver.resolve(left_release, left_channel).await?;
    let right_data = match right_channel {
        Some(channel) => Some(resolver.resolve(right_release, channel).await?),
        None => None,
    };

    let left_versions = list_k8s_versions(&left_data, left_release);
    let right_versions =
        list_k8s_versions(right_data.as_ref().unwrap_or(&left_data), right_release);
    let mut difference = mode.apply(&left_versions, &right_versions);
    difference.sort();

    Ok(VersionDiff {
        left: ReleaseVersions {
            release_version: left_release.to_string(),
            channel: left_channel.to_string(),
            versions: left_versions,
        },
        right: ReleaseVersions {
            release_version: right_release.to_string(),
            channel: right_channel.unwrap_or(left_channel).to_string(),
            versions: right_versions,
        },
        mode,
        difference,
    })
}

/// `diffallk8simages`: compares every image of every applicable version of two
/// releases. The difference is deduplicated and sorted.
pub async fn diff_all_k8s_images(
    resolver: &Resolver,
    left_release: &str,
    right_release: &str,
    left_channel: &ChannelSpec,
    right_channel: &ChannelSpec,
    mode: DiffMode,
) -> Result<ReleaseImageDiff, KdmError> {
    let left_data = resolver.resolve(left_release, left_channel).await?;
    let right_data = resolver.resolve(right_release, right_channel).await?;

    let left_images = images_for_k8s_versions(
        &left_data,
        &list_k8s_versions(&left_data, left_release),
    );
    let right_images = images_for_k8s_versions(
        &right_data,
        &list_k8s_versions(&right_data, right_release),
    );
    let mut difference = unique(&mode.apply(&left_images, &right_images));
    difference.sort();

    Ok(ReleaseImageDiff {
        left: ReleaseImages {
            release_version: left_release.to_string(),
            channel: left_channel.to_string(),
            images: left_images,
        },
        right: ReleaseImages {
            release_version: right_release.to_string(),
            channel: right_channel.to_string(),
            images: right_images,
        },
        mode,
        difference,
    })
}

/// `listk8simages`
pub async fn list_k8s_images(
    resolver: &Resolver,
    k8s_version: &str,
    channel_version: &ChannelVersion,
    channel: &ChannelSpec,
) -> Result<K8sImages, KdmError> {
    let data = resolver
        .resolve_channel_version(channel_version, channel)
        .await?;
    Ok(K8sImages {
        k8s_version: k8s_version.to_string(),
        channel: channel.to_string(),
        images: require_images(&data, k8s_version)?,
    })
}

/// `diffk8simages`: both versions come from the same channel document.
pub async fn diff_k8s_images(
    resolver: &Resolver,
    left_version: &str,
    right_version: &str,
    channel_version: &ChannelVersion,
    channel: &ChannelSpec,
    mode: DiffMode,
) -> Result<K8sImageDiff, KdmError> {
    let data = resolver
        .resolve_channel_version(channel_version, channel)
        .await?;
    let left_images = require_images(&data, left_version)?;
    let right_images = require_images(&data, right_version)?;
    let mut difference = mode.apply(&left_images, &right_images);
    difference.sort();

    Ok(K8sImageDiff {
        left: K8sImages {
            k8s_version: left_version.to_string(),
            channel: channel.to_string(),
            images: left_images,
        },
        right: K8sImages {
            k8s_version: right_version.to_string(),
            channel: channel.to_string(),
            images: right_images,
        },
        mode,
        difference,
    })
}

/// `listk8saddons`
pub async fn list_k8s_addons(
    resolver: &Resolver,
    k8s_version: &str,
    channel_version: &ChannelVersion,
    channel: &ChannelSpec,
) -> Result<AddonList, KdmError> {
    let data = resolver
        .resolve_channel_version(channel_version, channel)
        .await?;
    let addons = list_addon_names(&data)
        .into_iter()
        .map(|addon| {
            let template = AddonTemplate::resolve(&data, &addon, k8s_version);
            AddonRow { addon, template }
        })
        .collect();
    Ok(AddonList {
        k8s_version: k8s_version.to_string(),
        channel: channel.to_string(),
        addons,
    })
}

/// `diffk8saddons`: every add-on with the template each version gets.
pub async fn diff_k8s_addons(
    resolver: &Resolver,
    left_version: &str,
    right_version: &str,
    channel_version: &ChannelVersion,
    channel: &ChannelSpec,
) -> Result<AddonDiff, KdmError> {
    let data = resolver
        .resolve_channel_version(channel_version, channel)
        .await?;
    let addons = list_addon_names(&data)
        .into_iter()
        .map(|addon| {
            let left = AddonTemplate::resolve(&data, &addon, left_version);
            let right = AddonTemplate::resolve(&data, &addon, right_version);
            let differs = left.label() != right.label();
            AddonDiffRow {
                addon,
                left,
                right,
                differs,
            }
        })
        .collect();
    Ok(AddonDiff {
        left_version: left_version.to_string(),
        right_version: right_version.to_string(),
        channel: channel.to_string(),
        addons,
    })
}
