//! Case-insensitive type synonyms.
//!
//! The table maps short names to types. It starts from the language keywords
//! (`int`, `string`, `bool`, ...), then the configured aliases are merged over them, and
//! finally every value type entry gets a nullable companion (`int?`). Keys are stored
//! lower case.
//!
//! The table is built once, on first lookup, and is immutable afterwards. A lookup
//! that arrives while the first build is still running (from a module listener) builds
//! its own copy; only one of them is kept.

use std::{collections::HashMap, sync::OnceLock};

use crate::{
    config::SynonymEntry,
    metadata::typesystem::{CoreLibrary, TypeRc, BUILTIN_ALIASES},
};

/// Lazily built alias table
#[derive(Default)]
pub(crate) struct SynonymTable {
    table: OnceLock<HashMap<String, TypeRc>>,
}

impl SynonymTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Build the table with `build` unless it exists.
    ///
    /// `build` runs outside the cell: it may load modules, and listeners of those modules
    /// may look up synonyms again. Concurrent builders race and the first stored table
    /// wins.
    pub(crate) fn get_or_build<F>(&self, build: F) -> &HashMap<String, TypeRc>
    where
        F: FnOnce() -> HashMap<String, TypeRc>,
    {
        if let Some(table) = self.table.get() {
            return table;
        }

        let built = build();
        self.table.get_or_init(|| built)
    }

    /// Look up an alias, `None` if the table has not been built yet or has no entry
    pub(crate) fn get(&self, alias: &str) -> Option<TypeRc> {
        self.table
            .get()
            .and_then(|table| table.get(&alias.to_lowercase()).cloned())
    }
}

/// Build the synonym table.
///
/// ## Arguments
/// * 'core'       - Provides the keyword types and nullable companions
/// * 'configured' - Alias pairs from the configuration; blank entries are ignored
/// * 'resolve'    - Resolves the canonical type name of a configured alias
pub(crate) fn build_table<R>(
    core: &CoreLibrary,
    configured: &[SynonymEntry],
    resolve: R,
) -> HashMap<String, TypeRc>
where
    R: Fn(&str) -> Option<TypeRc>,
{
    let mut table: HashMap<String, TypeRc> = BUILTIN_ALIASES
        .iter()
        .map(|(alias, kind)| ((*alias).to_string(), core.primitive(*kind)))
        .collect();

    for entry in configured {
        let alias = entry.alias.trim();
        let type_name = entry.type_name.trim();
        if alias.is_empty() || type_name.is_empty() {
            continue;
        }

        match resolve(type_name) {
            Some(ty) => {
                table.insert(alias.to_lowercase(), ty);
            }
            None => {
                tracing::warn!(alias, type_name, "synonym target not found, ignoring");
            }
        }
    }

    let nullable: Vec<(String, TypeRc)> = table
        .iter()
        .filter(|(alias, _)| !alias.ends_with('?'))
        .filter_map(|(alias, ty)| core.nullable_of(ty).map(|n| (format!("{alias}?"), n)))
        .collect();
    for (alias, ty) in nullable {
        table.entry(alias).or_insert(ty);
    }

    tracing::debug!(entries = table.len(), "synonym table built");
    table
}
