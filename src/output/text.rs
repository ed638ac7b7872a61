//! Plain text rendering. Without `verbose` only the result lines are printed, so
//! output can be piped straight into other tools.

use crate::commands::{
    AddonDiff, AddonList, K8sImageDiff, K8sImages, ReleaseImageDiff, VersionDiff, VersionList,
};
use crate::output::table::{render_addon_diff_table, render_addon_table};
use crate::query::Product;

fn section(title: String, lines: &[String]) -> String {
    format!("{title}:\n\n{}\n", lines.join("\n"))
}

fn difference(lines: &[String]) -> String {
    format!("Difference:\n{}", lines.join("\n"))
}

fn product_label(product: Product) -> &'static str {
    match product {
        Product::Rke => "Kubernetes",
        Product::Rke2 => "RKE2",
        Product::K3s => "K3s",
    }
}

pub fn render_version_list(list: &VersionList, verbose: bool) -> String {
    if !verbose {
        return list.versions.join("\n");
    }
    format!(
        "{} versions found for version [{}] in channel [{}]:\n{}",
        product_label(list.product),
        list.release_version,
        list.channel,
        list.versions.join("\n")
    )
}

pub fn render_version_diff(diff: &VersionDiff, verbose: bool) -> String {
    if !verbose {
        return diff.difference.join("\n");
    }
    let mut out = String::new();
    for side in [&diff.left, &diff.right] {
        out.push_str(&section(
            format!(
                "Kubernetes versions found for version [{}] in channel [{}]",
                side.release_version, side.channel
            ),
            &side.versions,
        ));
        out.push('\n');
    }
    out.push_str(&difference(&diff.difference));
    out
}

pub fn render_release_image_diff(diff: &ReleaseImageDiff, verbose: bool) -> String {
    if !verbose {
        return diff.difference.join("\n");
    }
    let mut out = String::new();
    for side in [&diff.left, &diff.right] {
        out.push_str(&section(
            format!(
                "Images found for version [{}] in channel [{}]",
                side.release_version, side.channel
            ),
            &side.images,
        ));
        out.push('\n');
    }
    out.push_str(&difference(&diff.difference));
    out
}

pub fn render_k8s_images(images: &K8sImages, verbose: bool) -> String {
    if !verbose {
        return images.images.join("\n");
    }
    format!(
        "Images for Kubernetes version [{}] for channel [{}]:\n\n{}",
        images.k8s_version,
        images.channel,
        images.images.join("\n")
    )
}

pub fn render_k8s_image_diff(diff: &K8sImageDiff, verbose: bool) -> String {
    if !verbose {
        return diff.difference.join("\n");
    }
    let mut out = String::new();
    for side in [&diff.left, &diff.right] {
        out.push_str(&section(
            format!(
                "Images [{}] for Kubernetes version [{}] for channel [{}]",
                side.images.len(),
                side.k8s_version,
                side.channel
            ),
            &side.images,
        ));
        out.push('\n');
    }
    out.push_str(&difference(&diff.difference));
    out
}

pub fn render_addon_list(list: &AddonList, verbose: bool) -> String {
    let table = render_addon_table(list, verbose);
    if !verbose {
        return table;
    }
    format!(
        "Addons for Kubernetes version [{}] for channel [{}]:\n\n{table}",
        list.k8s_version, list.channel
    )
}

pub fn render_addon_diff(diff: &AddonDiff, verbose: bool) -> String {
    render_addon_diff_table(diff, verbose)
}
