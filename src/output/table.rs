use comfy_table::presets::NOTHING;
use comfy_table::{ContentArrangement, Table};

use crate::commands::{AddonDiff, AddonList, AddonTemplate};

/// Borderless and unwrapped.
fn plain_table(header: Option<Vec<String>>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled);
    if let Some(header) = header {
        table.set_header(header);
    }
    table
}

// trailing cell padding is dropped so lines diff cleanly
fn finish(table: &Table) -> String {
    table
        .to_string()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_addon_table(list: &AddonList, verbose: bool) -> String {
    let header = verbose.then(|| vec!["ADDON".to_string(), "TEMPLATE NAME".to_string()]);
    let mut table = plain_table(header);
    for row in &list.addons {
        table.add_row(vec![row.addon.clone(), row.template.label().to_string()]);
    }
    finish(&table)
}

pub fn render_addon_diff_table(diff: &AddonDiff, verbose: bool) -> String {
    let header = verbose.then(|| {
        vec![
            "ADDON".to_string(),
            diff.left_version.clone(),
            diff.right_version.clone(),
            "DIFF?".to_string(),
        ]
    });
    let mut table = plain_table(header);
    for row in &diff.addons {
        table.add_row(vec![
            row.addon.clone(),
            diff_cell(&row.left),
            diff_cell(&row.right),
            if row.differs { "Yes" } else { "No" }.to_string(),
        ]);
    }
    finish(&table)
}

fn diff_cell(template: &AddonTemplate) -> String {
    match template {
        AddonTemplate::Resolved { template_id, .. } => template_id.clone(),
        AddonTemplate::Unresolved { error } => format!("Error: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AddonDiffRow, AddonRow};

    fn resolved(id: &str) -> AddonTemplate {
        AddonTemplate::Resolved {
            template_id: id.to_string(),
            template_name: String::new(),
        }
    }

    fn addon_list() -> AddonList {
        AddonList {
            k8s_version: "v1.25.6-rancher4-1".to_string(),
            channel: "dev".to_string(),
            addons: vec![
                AddonRow {
                    addon: "coredns".to_string(),
                    template: resolved("coredns-v1.9.4"),
                },
                AddonRow {
                    addon: "weave".to_string(),
                    template: AddonTemplate::Unresolved {
                        error: "no weave template found for k8sVersion v1.25.6-rancher4-1"
                            .to_string(),
                    },
                },
            ],
        }
    }

    #[test]
    fn addon_table_has_no_header_unless_verbose() {
        let quiet = render_addon_table(&addon_list(), false);
        assert_eq!(quiet.lines().count(), 2);
        assert!(!quiet.contains("TEMPLATE NAME"));
        assert!(quiet.lines().next().is_some_and(|line| line.contains("coredns-v1.9.4")));

        let verbose = render_addon_table(&addon_list(), true);
        assert_eq!(verbose.lines().count(), 3);
        assert!(verbose.lines().next().is_some_and(|line| line.contains("TEMPLATE NAME")));
        assert!(verbose.contains("no weave template found"));
    }

    #[test]
    fn addon_table_lines_are_trimmed_and_borderless() {
        let rendered = render_addon_table(&addon_list(), false);
        for line in rendered.lines() {
            assert_eq!(line, line.trim_end());
            assert!(!line.contains('|'));
        }
    }

    #[test]
    fn diff_table_marks_changes() {
        let diff = AddonDiff {
            left_version: "v1.24.10-rancher4-1".to_string(),
            right_version: "v1.25.6-rancher4-1".to_string(),
            channel: "dev".to_string(),
            addons: vec![
                AddonDiffRow {
                    addon: "coredns".to_string(),
                    left: resolved("coredns-v1.8.3"),
                    right: resolved("coredns-v1.9.4"),
                    differs: true,
                },
                AddonDiffRow {
                    addon: "nginxIngress".to_string(),
                    left: resolved("nginxingress-v1.5.1"),
                    right: resolved("nginxingress-v1.5.1"),
                    differs: false,
                },
                AddonDiffRow {
                    addon: "weave".to_string(),
                    left: resolved("weave-v2.8.1"),
                    right: AddonTemplate::Unresolved {
                        error: "no weave template found".to_string(),
                    },
                    differs: true,
                },
            ],
        };

        let rendered = render_addon_diff_table(&diff, true);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("v1.24.10-rancher4-1") && lines[0].contains("DIFF?"));
        assert!(lines[1].ends_with("Yes"));
        assert!(lines[2].ends_with("No"));
        assert!(lines[3].contains("Error: no weave template found"));
    }
}
