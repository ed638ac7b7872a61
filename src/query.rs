//! Read-only projections over a [`KdmData`] document.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::diff::unique;
use crate::error::KdmError;
use crate::metadata::{ExternalReleases, KdmData, VersionInfo, TEMPLATE_KEYS};
use crate::version::{parse_lenient, parse_semver, tag_major_version, VersionRange};

/// External distributions only list releases from this Kubernetes version on.
const EXTERNAL_MIN_K8S_VERSION: Version = Version::new(1, 21, 0);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    #[default]
    Rke,
    Rke2,
    K3s,
}

impl Product {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Rke => "rke",
            Self::Rke2 => "rke2",
            Self::K3s => "k3s",
        }
    }
}

impl Display for Product {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown product: {0}, valid options are [rke, rke2, k3s]")]
pub struct ProductParseError(pub String);

impl FromStr for Product {
    type Err = ProductParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rke" | "rke1" => Ok(Self::Rke),
            "rke2" => Ok(Self::Rke2),
            "k3s" => Ok(Self::K3s),
            _ => Err(ProductParseError(s.to_string())),
        }
    }
}

/// Kubernetes versions a product release can deploy, sorted.
pub fn list_versions(data: &KdmData, product: Product, release_version: &str) -> Vec<String> {
    match product {
        Product::Rke => list_k8s_versions(data, release_version),
        Product::Rke2 => list_external_versions(&data.rke2, release_version),
        Product::K3s => list_external_versions(&data.k3s, release_version),
    }
}

/// RKE Kubernetes versions applicable to `release_version`, sorted.
///
/// A `K8sVersionInfo` entry for the exact version, or else for its `vMAJOR.MINOR`
/// family, can exclude it. Releases that aren't versions (`dev`, `master-head`) see
/// the full catalog.
pub fn list_k8s_versions(data: &KdmData, release_version: &str) -> Vec<String> {
    let release = parse_lenient(release_version);
    let mut versions: Vec<String> = data
        .k8s_version_rke_system_images
        .keys()
        .filter(|k8s_version| match &release {
            Some(release) => !is_excluded(data, k8s_version, release),
            None => true,
        })
        .cloned()
        .collect();
    versions.sort();
    versions
}

fn is_excluded(data: &KdmData, k8s_version: &str, release: &Version) -> bool {
    let info = data
        .k8s_version_info
        .get(k8s_version)
        .or_else(|| data.k8s_version_info.get(&tag_major_version(k8s_version)));
    match info {
        Some(info) if excluded_by(info, release) => {
            debug!(k8s_version, %release, "excluded by version info");
            true
        }
        _ => false,
    }
}

fn excluded_by(info: &VersionInfo, release: &Version) -> bool {
    let deprecated = bound(&info.deprecate_rancher_version)
        .is_some_and(|deprecate| release.cmp_precedence(&deprecate) != Ordering::Less);
    let too_old = bound(&info.min_rancher_version)
        .is_some_and(|min| release.cmp_precedence(&min) == Ordering::Less);
    deprecated || too_old
}

fn bound(raw: &str) -> Option<Version> {
    if raw.trim().is_empty() {
        return None;
    }
    parse_lenient(raw)
}

/// Versions from an external release table (RKE2, K3s) whose channel-server window
/// contains `release_version`, in image tag form (`+` becomes `-`), sorted.
pub fn list_external_versions(releases: &ExternalReleases, release_version: &str) -> Vec<String> {
    let release = parse_lenient(release_version);
    let mut versions: Vec<String> = releases
        .releases
        .iter()
        .filter(|entry| {
            parse_lenient(&entry.version)
                .is_some_and(|v| v.cmp_precedence(&EXTERNAL_MIN_K8S_VERSION) != Ordering::Less)
        })
        .filter(|entry| match &release {
            Some(release) => {
                let above_min = bound(&entry.min_channel_server_version)
                    .map_or(true, |min| release.cmp_precedence(&min) != Ordering::Less);
                let below_max = bound(&entry.max_channel_server_version)
                    .map_or(true, |max| release.cmp_precedence(&max) != Ordering::Greater);
                above_min && below_max
            }
            None => true,
        })
        .map(|entry| entry.version.replace('+', "-"))
        .collect();
    versions.sort();
    versions.dedup();
    versions
}

/// Non-empty image references for `k8s_version` in field order, without duplicates.
/// Unknown versions yield an empty list.
pub fn images_for_k8s_version(data: &KdmData, k8s_version: &str) -> Vec<String> {
    match data.system_images(k8s_version) {
        Some(images) => unique(&images.references().collect::<Vec<_>>()),
        None => Vec::new(),
    }
}

/// Like [`images_for_k8s_version`], but an empty result is an error listing the
/// versions the document does know.
pub fn require_images(data: &KdmData, k8s_version: &str) -> Result<Vec<String>, KdmError> {
    let images = images_for_k8s_version(data, k8s_version);
    if images.is_empty() {
        return Err(KdmError::NoImagesFound {
            k8s_version: k8s_version.to_string(),
            available: data.k8s_version_rke_system_images.keys().cloned().collect(),
        });
    }
    Ok(images)
}

/// Per-version image lists concatenated in `k8s_versions` order. Images shared by
/// several versions appear once per version.
pub fn images_for_k8s_versions<S: AsRef<str>>(data: &KdmData, k8s_versions: &[S]) -> Vec<String> {
    k8s_versions
        .iter()
        .flat_map(|k8s_version| images_for_k8s_version(data, k8s_version.as_ref()))
        .collect()
}

/// Add-on names with versioned templates, sorted, without the template-key table.
pub fn list_addon_names(data: &KdmData) -> Vec<String> {
    let mut names: Vec<String> = data
        .k8s_versioned_templates
        .keys()
        .filter(|name| name.as_str() != TEMPLATE_KEYS)
        .cloned()
        .collect();
    names.sort();
    names
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMatch {
    pub template_id: String,
    /// Empty when the id has no `templateKeys` entry.
    pub template_name: String,
}

/// Finds the template `addon` uses for `k8s_version`.
///
/// Ranges are tested in document order and the first match wins. Ranges listed
/// after the winner are only checked for overlap, which is logged; a malformed
/// range there does not affect the result.
pub fn resolve_template(
    data: &KdmData,
    addon: &str,
    k8s_version: &str,
) -> Result<TemplateMatch, KdmError> {
    let version = parse_semver(k8s_version)?;
    let not_found = || KdmError::TemplateNotFound {
        addon: addon.to_string(),
        k8s_version: k8s_version.to_string(),
    };
    let ranges = data.template_ranges(addon).ok_or_else(not_found)?;

    let mut remaining = ranges.iter();
    let mut matched: Option<(&str, &str)> = None;
    for (raw_range, template_id) in remaining.by_ref() {
        let range = VersionRange::parse(raw_range).map_err(|e| KdmError::InvalidRange {
            addon: addon.to_string(),
            range: raw_range.clone(),
            reason: e.reason,
        })?;
        if range.matches(&version) {
            matched = Some((raw_range.as_str(), template_id.as_str()));
            break;
        }
    }
    let (first_range, template_id) = matched.ok_or_else(not_found)?;

    for (raw_range, other_id) in remaining {
        let overlaps = VersionRange::parse(raw_range).is_ok_and(|range| range.matches(&version));
        if overlaps {
            warn!(
                addon,
                k8s_version,
                first_range,
                first_id = template_id,
                overlapping_range = raw_range.as_str(),
                overlapping_id = other_id.as_str(),
                "overlapping template ranges, keeping the first"
            );
        }
    }

    Ok(TemplateMatch {
        template_id: template_id.to_string(),
        template_name: data
            .template_name(template_id)
            .unwrap_or_default()
            .to_string(),
    })
}
