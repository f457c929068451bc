//! Output data model: module records and the catalog envelope.
//!
//! Every metadata field is a plain string and absence is always the empty
//! string, never `null` and never an omitted key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Distribution channel of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    /// Installed from a direct git checkout; `provider` is the SSH clone URL.
    Git,
    /// Installed through a remote update descriptor; `provider` is its URL.
    UpdateJson,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub license: String,
    pub homepage: String,
    pub source: String,
    pub donate: String,
    pub support: String,
}

/// One installable module, resolved from one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: String,
    pub kind: ModuleKind,
    pub provider: String,
    pub changelog: String,
    pub metadata: ModuleMetadata,
}

/// The manifest written at the end of a run.
///
/// `log` and `repository` are reserved and stay empty; `modules` keeps the
/// forge's repository listing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub log: Map<String, Value>,
    pub repository: Map<String, Value>,
    pub modules: Vec<ModuleRecord>,
}

impl Catalog {
    pub fn new(modules: Vec<ModuleRecord>) -> Self {
        Self {
            modules,
            ..Self::default()
        }
    }

    /// Two-space indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
