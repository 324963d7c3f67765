//! Factory configuration.
//!
//! [`FactoryConfig`] controls module classification, preloading, type synonyms, constructor
//! ambiguity handling and parallel type discovery. It can be built in code or loaded from
//! TOML:
//!
//! ```toml
//! system_module_prefixes = ["Contoso.Platform"]
//! preload_modules = ["Acme.Billing"]
//! ambiguity = "reject"
//! parallel_discovery = true
//!
//! [[synonyms]]
//! alias = "money"
//! type = "Acme.Billing.Money"
//! ```
//!
//! Every field is optional; missing fields take their default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Module name prefixes that are always classified as system modules.
///
/// A prefix ending in `.` also matches the name without the dot, so `System.` covers
/// `System` and `System.Linq` but not `SystemsIntegration`.
pub const DEFAULT_SYSTEM_PREFIXES: &[&str] = &[
    "System.",
    "Microsoft.",
    "mscorlib",
    "netstandard",
    "Mono.",
    "WindowsBase",
    "PresentationCore",
    "PresentationFramework",
];

/// What to do when several constructors accept an argument signature equally well
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Pick the first accepting constructor in declaration order
    #[default]
    FirstFit,
    /// Fail with [`crate::Error::AmbiguousConstructor`]
    Reject,
}

/// A configured type synonym
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymEntry {
    /// Short name, matched case-insensitively
    pub alias: String,
    /// Canonical type name the alias stands for
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Configuration of a [`crate::Factory`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Additional module name prefixes classified as system modules
    pub system_module_prefixes: Vec<String>,
    /// Modules that must be loaded when the module set is first populated
    pub preload_modules: Vec<String>,
    /// Alias to type name pairs, merged over the built-in keywords
    pub synonyms: Vec<SynonymEntry>,
    /// Constructor ambiguity handling
    pub ambiguity: AmbiguityPolicy,
    /// Enumerate module types on the rayon pool during discovery
    pub parallel_discovery: bool,
}

impl FactoryConfig {
    /// Parse a configuration from TOML text
    ///
    /// # Errors
    /// Returns [`crate::Error::Config`] for malformed TOML or unknown values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read and
    /// [`crate::Error::Config`] if its content is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Add a system module prefix
    #[must_use]
    pub fn with_system_prefix(mut self, prefix: &str) -> Self {
        self.system_module_prefixes.push(prefix.to_string());
        self
    }

    /// Add a module to the preload list
    #[must_use]
    pub fn with_preload(mut self, module: &str) -> Self {
        self.preload_modules.push(module.to_string());
        self
    }

    /// Add a synonym
    #[must_use]
    pub fn with_synonym(mut self, alias: &str, type_name: &str) -> Self {
        self.synonyms.push(SynonymEntry {
            alias: alias.to_string(),
            type_name: type_name.to_string(),
        });
        self
    }

    /// Set the ambiguity policy
    #[must_use]
    pub fn with_ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity = policy;
        self
    }

    /// Enable or disable parallel discovery
    #[must_use]
    pub fn with_parallel_discovery(mut self, enabled: bool) -> Self {
        self.parallel_discovery = enabled;
        self
    }

    /// The built-in prefixes followed by the configured ones (trimmed, empties dropped)
    #[must_use]
    pub fn effective_system_prefixes(&self) -> Vec<String> {
        DEFAULT_SYSTEM_PREFIXES
            .iter()
            .map(|prefix| (*prefix).to_string())
            .chain(
                self.system_module_prefixes
                    .iter()
                    .map(|prefix| prefix.trim())
                    .filter(|prefix| !prefix.is_empty())
                    .map(str::to_string),
            )
            .collect()
    }

    /// Preload entries, trimmed with empties dropped
    #[must_use]
    pub fn effective_preload(&self) -> Vec<String> {
        self.preload_modules
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Does the module `name` fall under the system `prefix`
#[must_use]
pub fn matches_system_prefix(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
        || prefix
            .strip_suffix('.')
            .is_some_and(|namespace| name == namespace)
}
