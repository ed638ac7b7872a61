use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kdmq::commands::{
    diff_all_k8s_images, diff_k8s, diff_k8s_addons, diff_k8s_images, list_k8s, list_k8s_addons,
    list_k8s_images, DiffMode,
};
use kdmq::config::Config;
use kdmq::output::json::render_json;
use kdmq::output::text::{
    render_addon_diff, render_addon_list, render_k8s_image_diff, render_k8s_images,
    render_release_image_diff, render_version_diff, render_version_list,
};
use kdmq::query::Product;
use kdmq::source::{ChannelSpec, ChannelVersion, HttpFetcher, Resolver, SourceUrls};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "kdmq",
    version,
    about = "Query and diff Kubernetes distribution metadata (KDM)"
)]
struct Cli {
    /// Print explanatory headers around results
    #[arg(long, global = true)]
    verbose: bool,
    /// Show only what the second version adds instead of a symmetric difference
    #[arg(long = "diff-oneway", global = true)]
    diff_oneway: bool,
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List Kubernetes versions available to a release
    #[command(name = "listk8s", visible_alias = "lk")]
    ListK8s {
        release_version: String,
        /// release, latest, dev, ./local/file.json or an http(s) URL
        channel: ChannelSpec,
        #[arg(long, default_value = "rke")]
        product: Product,
        /// Only the newest version of every minor line
        #[arg(long)]
        latest: bool,
    },
    /// Diff the Kubernetes versions of two releases
    #[command(name = "diffk8s", visible_alias = "dk")]
    DiffK8s {
        release_version1: String,
        release_version2: String,
        channel1: ChannelSpec,
        /// Defaults to reading both releases from channel1
        channel2: Option<ChannelSpec>,
    },
    /// Diff all system images of two releases
    #[command(name = "diffallk8simages", visible_alias = "daki")]
    DiffAllK8sImages {
        release_version1: String,
        release_version2: String,
        channel1: ChannelSpec,
        channel2: ChannelSpec,
    },
    /// List system images of a Kubernetes version
    #[command(name = "listk8simages", visible_alias = "lki")]
    ListK8sImages {
        k8s_version: String,
        channel_version: ChannelVersion,
        channel: ChannelSpec,
    },
    /// Diff system images of two Kubernetes versions
    #[command(name = "diffk8simages", visible_alias = "dki")]
    DiffK8sImages {
        k8s_version1: String,
        k8s_version2: String,
        channel_version: ChannelVersion,
        channel: ChannelSpec,
    },
    /// List add-on templates used by a Kubernetes version
    #[command(name = "listk8saddons", visible_alias = "lka")]
    ListK8sAddons {
        k8s_version: String,
        channel_version: ChannelVersion,
        channel: ChannelSpec,
    },
    /// Compare add-on templates of two Kubernetes versions
    #[command(name = "diffk8saddons", visible_alias = "dka")]
    DiffK8sAddons {
        k8s_version1: String,
        k8s_version2: String,
        channel_version: ChannelVersion,
        channel: ChannelSpec,
    },
    /// Write a config template or print the effective configuration
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    // --init must work even when the existing file no longer parses
    if let Commands::Config { init, show } = &cli.command {
        println!("{}", handle_config_command(*init, *show, &config_path)?);
        return Ok(());
    }
    let config = Config::load(Some(&config_path))?;

    let fetcher = HttpFetcher::new(&config.http)?;
    let resolver = Resolver::new(Arc::new(fetcher), SourceUrls::from(&config.sources));
    let mode = DiffMode::from_one_way(cli.diff_oneway);
    let verbose = cli.verbose;
    debug!(?mode, config = %config_path.display(), "starting");

    let rendered = match &cli.command {
        Commands::ListK8s {
            release_version,
            channel,
            product,
            latest,
        } => {
            let report = list_k8s(&resolver, release_version, channel, *product, *latest)
                .await
                .with_context(|| {
                    format!("failed listing {product} versions for [{release_version}] in channel [{channel}]")
                })?;
            render(&report, cli.output, |r| render_version_list(r, verbose))?
        }
        Commands::DiffK8s {
            release_version1,
            release_version2,
            channel1,
            channel2,
        } => {
            let report = diff_k8s(
                &resolver,
                release_version1,
                release_version2,
                channel1,
                channel2.as_ref(),
                mode,
            )
            .await
            .with_context(|| {
                format!("failed diffing Kubernetes versions of [{release_version1}] and [{release_version2}]")
            })?;
            render(&report, cli.output, |r| render_version_diff(r, verbose))?
        }
        Commands::DiffAllK8sImages {
            release_version1,
            release_version2,
            channel1,
            channel2,
        } => {
            let report = diff_all_k8s_images(
                &resolver,
                release_version1,
                release_version2,
                channel1,
                channel2,
                mode,
            )
            .await
            .with_context(|| {
                format!("failed diffing images of [{release_version1}] and [{release_version2}]")
            })?;
            render(&report, cli.output, |r| render_release_image_diff(r, verbose))?
        }
        Commands::ListK8sImages {
            k8s_version,
            channel_version,
            channel,
        } => {
            let report = list_k8s_images(&resolver, k8s_version, channel_version, channel)
                .await
                .with_context(|| {
                    format!("failed listing images for [{k8s_version}] in channel [{channel}]")
                })?;
            render(&report, cli.output, |r| render_k8s_images(r, verbose))?
        }
        Commands::DiffK8sImages {
            k8s_version1,
            k8s_version2,
            channel_version,
            channel,
        } => {
            let report = diff_k8s_images(
                &resolver,
                k8s_version1,
                k8s_version2,
                channel_version,
                channel,
                mode,
            )
            .await
            .with_context(|| {
                format!("failed diffing images of [{k8s_version1}] and [{k8s_version2}]")
            })?;
            render(&report, cli.output, |r| render_k8s_image_diff(r, verbose))?
        }
        Commands::ListK8sAddons {
            k8s_version,
            channel_version,
            channel,
        } => {
            let report = list_k8s_addons(&resolver, k8s_version, channel_version, channel)
                .await
                .with_context(|| {
                    format!("failed listing addons for [{k8s_version}] in channel [{channel}]")
                })?;
            render(&report, cli.output, |r| render_addon_list(r, verbose))?
        }
        Commands::DiffK8sAddons {
            k8s_version1,
            k8s_version2,
            channel_version,
            channel,
        } => {
            let report = diff_k8s_addons(
                &resolver,
                k8s_version1,
                k8s_version2,
                channel_version,
                channel,
            )
            .await
            .with_context(|| {
                format!("failed diffing addons of [{k8s_version1}] and [{k8s_version2}]")
            })?;
            render(&report, cli.output, |r| render_addon_diff(r, verbose))?
        }
        Commands::Config { .. } => unreachable!("config command handled before dispatch"),
    };

    println!("{rendered}");
    Ok(())
}

/// Logs go to stderr so stdout stays pipeable. `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn render<T: Serialize>(
    report: &T,
    format: OutputFormat,
    text: impl FnOnce(&T) -> String,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text(report)),
        OutputFormat::Json => render_json(report),
    }
}

fn handle_config_command(init: bool, show: bool, config_path: &Path) -> Result<String> {
    let mut lines = Vec::new();
    if init {
        Config::write_template(config_path)?;
        lines.push(format!("Wrote config template to {}", config_path.display()));
    }
    if show || !init {
        let config = Config::load(Some(config_path))?;
        lines.push(render_json(&config)?);
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_rewrites_an_unparseable_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sources\nrelease_base_url = ").expect("write broken config");
        assert!(handle_config_command(false, true, &path).is_err());

        let output = handle_config_command(true, true, &path).expect("init succeeds");
        assert!(output.starts_with("Wrote config template to "));
        assert_eq!(
            std::fs::read_to_string(&path).expect("read config"),
            Config::default_template()
        );
        assert!(output.contains("\"sources\""));
    }
}
