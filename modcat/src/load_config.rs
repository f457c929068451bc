/// `load_config` module: merges the optional YAML config file, command-line flags and
/// environment into the settings a catalog build needs.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into [`FileConfig`]
/// - Let command-line flags override file values
/// - Pick up the access token from `--token` or `GITHUB_TOKEN`
/// - Fail with a clear message when a required value is missing
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{bail, Context, Result};
use modcat_core::catalog::DEFAULT_CONCURRENCY;
use modcat_core::github::ForgeConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::cli::BuildArgs;

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Settings that may live in a YAML file; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub account: Option<String>,
    pub output: Option<PathBuf>,
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub forge: ForgeConfig,
}

/// Fully resolved settings for one catalog build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub account: String,
    pub output: PathBuf,
    pub concurrency: usize,
    pub forge: ForgeConfig,
    pub token: String,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let config: FileConfig = serde_yaml::from_str(&config_content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })?;

    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(config)
}

/// Merges flags over the optional config file and reads the token.
pub fn resolve_build_config(args: &BuildArgs) -> Result<BuildConfig> {
    let file = match &args.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };

    let Some(account) = args.user.clone().or(file.account) else {
        bail!("No account given: pass --user or set `account` in the config file");
    };
    let Some(output) = args.write.clone().or(file.output) else {
        bail!("No output path given: pass --write or set `output` in the config file");
    };

    let concurrency = args
        .concurrency
        .or(file.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);
    if concurrency == 0 {
        bail!("concurrency must be at least 1");
    }

    let token = match &args.token {
        Some(token) => token.clone(),
        None => std::env::var(TOKEN_ENV)
            .with_context(|| format!("No access token: pass --token or set {TOKEN_ENV}"))?,
    };
    if token.trim().is_empty() {
        bail!("Access token is empty");
    }

    info!(
        account = %account,
        output = %output.display(),
        concurrency,
        api_url = %file.forge.api_url,
        "Build configuration resolved"
    );

    Ok(BuildConfig {
        account,
        output,
        concurrency,
        forge: file.forge,
        token,
    })
}
