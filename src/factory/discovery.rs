//! Type discovery over the application modules.
//!
//! Discovery answers three questions: which types match a predicate, which types derive
//! from a given type, and which types implement a given interface. Interfaces are never
//! part of a result. Results list types module by module in load order, and within a
//! module in declaration order.
//!
//! Results can be cached. Every cache entry is tagged with the generation of the module
//! set it was computed from; registering a new application module bumps the generation
//! and drops all entries, and entries computed against an older generation are never
//! stored. A cached answer therefore always reflects the complete current module set.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use arc_swap::ArcSwap;
use rayon::prelude::*;

use crate::{
    factory::snapshot::publish,
    metadata::{
        module::ModuleRc,
        token::Token,
        typesystem::{TypeDescriptor, TypeList, TypeRc},
    },
    Error,
};

/// A predicate over types
pub type TypePredicate = Arc<dyn Fn(&TypeDescriptor) -> bool + Send + Sync>;

static NEXT_FILTER_ID: AtomicU64 = AtomicU64::new(1);

/// A type predicate with a stable identity, so its results can be cached.
///
/// Clones share the identity. Two filters created separately never share a cache entry,
/// even if their predicates are equivalent.
#[derive(Clone)]
pub struct TypeFilter {
    id: u64,
    predicate: TypePredicate,
}

impl TypeFilter {
    /// Wrap a predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        TypeFilter {
            id: NEXT_FILTER_ID.fetch_add(1, Ordering::Relaxed),
            predicate: Arc::new(predicate),
        }
    }

    /// The cache identity of this filter
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Evaluate the predicate
    #[must_use]
    pub fn matches(&self, ty: &TypeDescriptor) -> bool {
        (self.predicate)(ty)
    }
}

impl fmt::Debug for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeFilter").field("id", &self.id).finish()
    }
}

/// Key of a cached discovery query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum QueryKey {
    Filter(u64),
    Subtypes(Token),
    Implementors(Token),
}

#[derive(Default)]
struct CacheMaps {
    generation: u64,
    queries: HashMap<QueryKey, TypeList>,
    names: HashMap<String, TypeRc>,
}

impl CacheMaps {
    fn empty(generation: u64) -> Self {
        CacheMaps {
            generation,
            ..CacheMaps::default()
        }
    }

    /// Copy of `self` ready to receive an entry computed at `generation`, or `None` if
    /// such an entry would be stale.
    fn writable_at(&self, generation: u64) -> Option<CacheMaps> {
        match self.generation.cmp(&generation) {
            std::cmp::Ordering::Greater => None,
            std::cmp::Ordering::Less => Some(CacheMaps::empty(generation)),
            std::cmp::Ordering::Equal => Some(CacheMaps {
                generation,
                queries: self.queries.clone(),
                names: self.names.clone(),
            }),
        }
    }
}

/// Generation-tagged caches of discovery results and resolved type names
pub(crate) struct DiscoveryCache {
    maps: ArcSwap<CacheMaps>,
}

impl DiscoveryCache {
    pub(crate) fn new() -> Self {
        DiscoveryCache {
            maps: ArcSwap::from_pointee(CacheMaps::default()),
        }
    }

    /// Drop every entry computed before `generation`
    pub(crate) fn invalidate(&self, generation: u64) {
        publish(&self.maps, |maps| {
            (maps.generation < generation).then(|| CacheMaps::empty(generation))
        });
    }

    pub(crate) fn query(&self, key: QueryKey, generation: u64) -> Option<TypeList> {
        let maps = self.maps.load();
        if maps.generation != generation {
            return None;
        }
        maps.queries.get(&key).cloned()
    }

    /// Store a result computed at `generation`, returning the list that is cached for
    /// `key` afterwards (an earlier concurrent result wins).
    pub(crate) fn store(&self, key: QueryKey, generation: u64, list: TypeList) -> TypeList {
        let current = publish(&self.maps, |maps| {
            if maps.generation == generation && maps.queries.contains_key(&key) {
                return None;
            }
            let mut next = maps.writable_at(generation)?;
            next.queries.insert(key, list.clone());
            Some(next)
        });

        match current.queries.get(&key) {
            Some(cached) if current.generation == generation => cached.clone(),
            _ => list,
        }
    }

    pub(crate) fn name(&self, name: &str, generation: u64) -> Option<TypeRc> {
        let maps = self.maps.load();
        if maps.generation != generation {
            return None;
        }
        maps.names.get(name).cloned()
    }

    pub(crate) fn store_name(&self, name: &str, generation: u64, ty: &TypeRc) {
        publish(&self.maps, |maps| {
            if maps.generation == generation && maps.names.contains_key(name) {
                return None;
            }
            let mut next = maps.writable_at(generation)?;
            next.names.insert(name.to_string(), ty.clone());
            Some(next)
        });
    }

    /// Number of cached discovery results
    pub(crate) fn cached_queries(&self) -> usize {
        self.maps.load().queries.len()
    }

    /// Run `keep` over the application modules, consulting the cache under `key`
    pub(crate) fn lookup_or_scan<F>(
        &self,
        key: QueryKey,
        modules: &[ModuleRc],
        generation: u64,
        use_cache: bool,
        parallel: bool,
        keep: F,
    ) -> TypeList
    where
        F: Fn(&TypeRc) -> bool + Send + Sync,
    {
        if use_cache {
            if let Some(hit) = self.query(key, generation) {
                return hit;
            }
        }

        let list: TypeList = enumerate(modules, parallel, keep).into();
        if use_cache {
            self.store(key, generation, list)
        } else {
            list
        }
    }
}

/// All non-interface types of `modules` accepted by `keep`, in module and declaration order
pub(crate) fn enumerate<F>(modules: &[ModuleRc], parallel: bool, keep: F) -> Vec<TypeRc>
where
    F: Fn(&TypeRc) -> bool + Send + Sync,
{
    let scan = |module: &ModuleRc| -> Vec<TypeRc> {
        module_types(module)
            .into_iter()
            .filter(|ty| !ty.is_interface() && keep(ty))
            .collect()
    };

    if parallel {
        modules
            .par_iter()
            .map(scan)
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    } else {
        modules.iter().flat_map(scan).collect()
    }
}

/// Types of a module, skipping the ones that failed to load
fn module_types(module: &ModuleRc) -> Vec<TypeRc> {
    match module.types() {
        Ok(types) => types,
        Err(Error::PartialTypeLoad {
            loaded, failures, ..
        }) => {
            tracing::debug!(
                module = module.name(),
                failed = failures.len(),
                "skipping types that failed to load"
            );
            loaded
        }
        Err(error) => {
            tracing::warn!(module = module.name(), %error, "cannot enumerate module types");
            Vec::new()
        }
    }
}
