//! High-level pipeline: account → repositories → module records → catalog.
//!
//! [`build_catalog`] lists every repository of an account and resolves them
//! with bounded concurrency. Results come back in listing order regardless of
//! which lookups finish first, so two runs against an unchanged forge write
//! identical manifests.
//!
//! # Error Handling
//! The first forge error aborts the whole build; a partial catalog is never
//! returned. Repositories that simply are not modules are skipped.
//!
//! # Navigation
//! - Main entrypoint: [`build_catalog`]
//! - Output: [`write_catalog`]

use std::fs;
use std::path::Path;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{error, info};

use crate::error::CatalogError;
use crate::forge::Forge;
use crate::module::{Catalog, ModuleRecord};
use crate::resolve::resolve_module;

/// Repositories resolved at the same time unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 8;

pub async fn build_catalog<F>(
    forge: &F,
    account: &str,
    concurrency: usize,
) -> Result<Catalog, CatalogError>
where
    F: Forge + ?Sized,
{
    info!(account, concurrency, "[CATALOG] Listing repositories");
    let repositories = forge
        .list_repositories(account)
        .await
        .map_err(|source| {
            error!(account, error = %source, "[CATALOG][ERROR] Repository listing failed");
            CatalogError::Listing {
                account: account.to_string(),
                source,
            }
        })?;
    let total = repositories.len();

    let resolved: Vec<Option<ModuleRecord>> = stream::iter(repositories.iter())
        .map(|repository| async move {
            resolve_module(forge, repository).await.map_err(|source| {
                error!(
                    repository = %repository.full_name(),
                    error = %source,
                    "[CATALOG][ERROR] Resolution failed"
                );
                CatalogError::Resolve {
                    repository: repository.full_name(),
                    source,
                }
            })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let modules: Vec<ModuleRecord> = resolved.into_iter().flatten().collect();
    info!(
        account,
        repositories = total,
        modules = modules.len(),
        "[CATALOG] Catalog built"
    );
    Ok(Catalog::new(modules))
}

/// Writes the catalog as two-space indented JSON, creating parent directories.
pub fn write_catalog(catalog: &Catalog, path: &Path) -> Result<(), CatalogError> {
    let json = catalog.to_json_pretty()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CatalogError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, json).map_err(|source| CatalogError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        modules = catalog.modules.len(),
        "[CATALOG] Catalog written"
    );
    Ok(())
}
