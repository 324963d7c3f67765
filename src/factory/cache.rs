//! Concurrent invoker caches.
//!
//! Three lock-free skip maps hold compiled invokers: parameterless invokers keyed by type,
//! constructor invokers keyed by type and argument signature, and member invokers keyed
//! by member token. Invokers are compiled outside the map and inserted with
//! `get_or_insert`, so concurrent misses on the same key agree on a single cached
//! invoker even if both compiled one.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;

use crate::{
    config::AmbiguityPolicy,
    factory::invoker::CompiledInvoker,
    metadata::{
        token::Token,
        typesystem::{TypeDescriptor, TypeRc},
    },
    Result,
};

/// Reference to a `CompiledInvoker`
pub type InvokerRc = Arc<CompiledInvoker>;

/// Type plus argument signature; `None` marks a `null` argument.
///
/// The ambiguity policy is part of the key because it decides which constructor an
/// ambiguous signature selects, or whether it selects one at all.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstructorKey {
    /// The constructed type
    pub declaring: Token,
    /// Runtime argument types
    pub arguments: Box<[Option<Token>]>,
    /// Policy the constructor was selected under
    pub policy: AmbiguityPolicy,
}

impl ConstructorKey {
    /// Build the key for constructing `ty` from `arguments` under `policy`
    #[must_use]
    pub fn new(
        ty: &TypeDescriptor,
        arguments: &[Option<TypeRc>],
        policy: AmbiguityPolicy,
    ) -> Self {
        ConstructorKey {
            declaring: ty.token,
            arguments: arguments
                .iter()
                .map(|arg| arg.as_ref().map(|ty| ty.token))
                .collect(),
            policy,
        }
    }
}

/// Entry counts of the invoker caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvokerCacheStats {
    /// Cached parameterless invokers
    pub parameterless: usize,
    /// Cached constructor invokers
    pub constructors: usize,
    /// Cached member invokers
    pub members: usize,
}

#[derive(Default)]
pub(crate) struct InvokerCache {
    parameterless: SkipMap<Token, InvokerRc>,
    constructors: SkipMap<ConstructorKey, InvokerRc>,
    members: SkipMap<Token, InvokerRc>,
}

impl InvokerCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn parameterless<F>(&self, ty: Token, compile: F) -> Result<InvokerRc>
    where
        F: FnOnce() -> Result<InvokerRc>,
    {
        get_or_compile(&self.parameterless, ty, compile)
    }

    pub(crate) fn constructor<F>(&self, key: ConstructorKey, compile: F) -> Result<InvokerRc>
    where
        F: FnOnce() -> Result<InvokerRc>,
    {
        get_or_compile(&self.constructors, key, compile)
    }

    pub(crate) fn member<F>(&self, member: Token, compile: F) -> Result<InvokerRc>
    where
        F: FnOnce() -> Result<InvokerRc>,
    {
        get_or_compile(&self.members, member, compile)
    }

    pub(crate) fn stats(&self) -> InvokerCacheStats {
        InvokerCacheStats {
            parameterless: self.parameterless.len(),
            constructors: self.constructors.len(),
            members: self.members.len(),
        }
    }
}

fn get_or_compile<K, F>(map: &SkipMap<K, InvokerRc>, key: K, compile: F) -> Result<InvokerRc>
where
    K: Ord + Send + 'static,
    F: FnOnce() -> Result<InvokerRc>,
{
    if let Some(entry) = map.get(&key) {
        return Ok(entry.value().clone());
    }

    let compiled = compile()?;
    Ok(map.get_or_insert(key, compiled).value().clone())
}
