//! Module descriptor (`module.prop`) fetching and parsing.
//!
//! The descriptor is a line-oriented `key=value` text file at the root of the
//! default branch. Lines without `=` are ignored, the first `=` splits key from
//! value, nothing is trimmed, and a repeated key overwrites the earlier value
//! while keeping its original position.

use tracing::debug;

use crate::error::ForgeError;
use crate::forge::{Forge, Lookup, Repository};

pub const DESCRIPTOR_FILE: &str = "module.prop";

pub const ID_KEY: &str = "id";
pub const UPDATE_JSON_KEY: &str = "updateJson";

/// Ordered `key=value` pairs from a descriptor file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDescriptor {
    entries: Vec<(String, String)>,
}

impl ModuleDescriptor {
    pub fn parse(text: &str) -> Self {
        let mut descriptor = Self::default();
        for line in text.lines() {
            if let Some((key, value)) = line.split_once('=') {
                descriptor.insert(key, value);
            }
        }
        descriptor
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The declared module id, if the key exists.
    pub fn id(&self) -> Option<&str> {
        self.get(ID_KEY)
    }

    /// The JSON update channel, only when set to a non-empty value.
    pub fn update_json(&self) -> Option<&str> {
        self.get(UPDATE_JSON_KEY).filter(|url| !url.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches and parses the descriptor; `None` when the repository has none.
pub async fn fetch_descriptor<F>(
    forge: &F,
    repository: &Repository,
) -> Result<Option<ModuleDescriptor>, ForgeError>
where
    F: Forge + ?Sized,
{
    match forge.file_text(repository, DESCRIPTOR_FILE).await? {
        Lookup::Found(text) => {
            let descriptor = ModuleDescriptor::parse(&text);
            debug!(
                repository = %repository.full_name(),
                keys = descriptor.len(),
                "Parsed module descriptor"
            );
            Ok(Some(descriptor))
        }
        Lookup::NotFound => {
            debug!(repository = %repository.full_name(), "No module descriptor");
            Ok(None)
        }
    }
}
