//! Module resolution: one repository in, at most one [`ModuleRecord`] out.
//!
//! A repository becomes a module when it publishes a descriptor with an `id`.
//! Its kind follows the descriptor: a non-empty `updateJson` selects the JSON
//! update channel, anything else is served straight from git and gets a
//! changelog probe. The remaining metadata (support, donation, homepage and
//! license) is looked up independently and normalized to empty strings.
//!
//! Forge errors are returned as-is; only "not found" answers are folded into
//! empty values.

use tracing::{debug, info, warn};

use crate::descriptor::fetch_descriptor;
use crate::error::ForgeError;
use crate::forge::{fetch_funding_links, fetch_homepage, Forge, Lookup, Repository};
use crate::module::{ModuleKind, ModuleMetadata, ModuleRecord};

pub const CHANGELOG_FILE: &str = "changelog.md";

/// The forge's SPDX id for a license file it could not classify.
pub const NO_ASSERTION: &str = "NOASSERTION";

/// Resolves `repository` into a module record.
///
/// Returns `Ok(None)` for repositories that are not modules: no descriptor,
/// or a descriptor without an `id` key.
pub async fn resolve_module<F>(
    forge: &F,
    repository: &Repository,
) -> Result<Option<ModuleRecord>, ForgeError>
where
    F: Forge + ?Sized,
{
    let full_name = repository.full_name();
    let Some(descriptor) = fetch_descriptor(forge, repository).await? else {
        return Ok(None);
    };
    let Some(id) = descriptor.id() else {
        warn!(repository = %full_name, "Module descriptor has no id, skipping");
        return Ok(None);
    };

    let (kind, provider, changelog) = match descriptor.update_json() {
        Some(update_json) => (ModuleKind::UpdateJson, update_json.to_string(), String::new()),
        None => (
            ModuleKind::Git,
            repository.ssh_url.clone(),
            changelog_url(forge, repository).await?,
        ),
    };

    let owner = repository.owner.login.as_str();
    let name = repository.name.as_str();

    let donate = fetch_funding_links(forge, owner, name)
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();
    let homepage = fetch_homepage(forge, owner, name).await?.unwrap_or_default();

    let metadata = ModuleMetadata {
        license: license(forge, repository).await?,
        homepage,
        source: repository.clone_url.clone(),
        donate,
        support: support_url(repository),
    };

    info!(repository = %full_name, id, ?kind, "Resolved module");
    Ok(Some(ModuleRecord {
        id: id.to_string(),
        kind,
        provider,
        changelog,
        metadata,
    }))
}

/// Download URL of the root changelog, or empty.
async fn changelog_url<F>(forge: &F, repository: &Repository) -> Result<String, ForgeError>
where
    F: Forge + ?Sized,
{
    let url = forge
        .file_metadata(repository, CHANGELOG_FILE)
        .await?
        .found()
        .and_then(|file| file.download_url)
        .unwrap_or_default();
    if url.is_empty() {
        debug!(repository = %repository.full_name(), "No changelog");
    }
    Ok(url)
}

/// SPDX id of the detected license; unrecognized or missing licenses are empty.
async fn license<F>(forge: &F, repository: &Repository) -> Result<String, ForgeError>
where
    F: Forge + ?Sized,
{
    Ok(match forge.license_spdx_id(repository).await? {
        Lookup::Found(spdx_id) if spdx_id != NO_ASSERTION => spdx_id,
        _ => String::new(),
    })
}

/// Issue tracker URL when issues are enabled.
pub fn support_url(repository: &Repository) -> String {
    if repository.has_issues {
        format!("{}/issues", repository.html_url)
    } else {
        String::new()
    }
}
