//! The module set: classification, on-demand loading and load notifications.
//!
//! The registry splits every known module into *system* modules (the core library,
//! platform modules recognised by name prefix, and modules with an all-zero version)
//! and *application* modules. Only application modules take part in type discovery.
//!
//! The set is populated lazily on first use from the core library and the loader's
//! preloaded modules, then the configured preload list is imported. Afterwards modules
//! are added by explicit registration or loaded on demand. The set is published as an
//! immutable snapshot, so readers never block writers.

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use crate::{
    config::matches_system_prefix,
    factory::{discovery::DiscoveryCache, snapshot::publish},
    metadata::{
        identity::{ModuleIdentity, ModuleVersion},
        module::{ModuleLoader, ModuleRc},
    },
    Result,
};

/// Callback fired for every newly registered application module
pub type ModuleListener = Arc<dyn Fn(&ModuleRc) + Send + Sync>;

/// An immutable snapshot of the known modules
#[derive(Debug, Default, Clone)]
pub struct ModuleSet {
    /// Incremented for every application module added
    pub generation: u64,
    application: Vec<ModuleRc>,
    system: Vec<ModuleRc>,
}

impl ModuleSet {
    /// Application modules in load order
    #[must_use]
    pub fn application(&self) -> &[ModuleRc] {
        &self.application
    }

    /// System modules in load order, the core library first
    #[must_use]
    pub fn system(&self) -> &[ModuleRc] {
        &self.system
    }

    /// All modules, system modules first
    pub fn all(&self) -> impl Iterator<Item = &ModuleRc> {
        self.system.iter().chain(self.application.iter())
    }

    /// Find a known module by simple name (case-insensitive)
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ModuleRc> {
        self.all()
            .find(|module| module.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    fn contains(&self, module: &ModuleRc) -> bool {
        self.all()
            .any(|known| known.token == module.token || known.name() == module.name())
    }
}

/// Outcome of registering a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The module (or one with the same name) was already known
    AlreadyKnown,
    /// Added as a system module
    System,
    /// Added as an application module
    Application,
}

/// Thread safe registry of loaded modules
pub(crate) struct ModuleRegistry {
    loader: Arc<dyn ModuleLoader>,
    core: ModuleRc,
    caches: Arc<DiscoveryCache>,
    set: ArcSwap<ModuleSet>,
    initialized: OnceLock<()>,
    listeners: boxcar::Vec<ModuleListener>,
    prefixes: ArcSwap<Vec<String>>,
    preload: ArcSwap<Vec<String>>,
}

impl ModuleRegistry {
    pub(crate) fn new(
        loader: Arc<dyn ModuleLoader>,
        core: ModuleRc,
        caches: Arc<DiscoveryCache>,
        prefixes: Vec<String>,
        preload: Vec<String>,
    ) -> Self {
        ModuleRegistry {
            loader,
            core,
            caches,
            set: ArcSwap::from_pointee(ModuleSet::default()),
            initialized: OnceLock::new(),
            listeners: boxcar::Vec::new(),
            prefixes: ArcSwap::from_pointee(prefixes),
            preload: ArcSwap::from_pointee(preload),
        }
    }

    /// The current module set, populating it on first use
    pub(crate) fn snapshot(&self) -> Arc<ModuleSet> {
        self.ensure_initialized();
        self.set.load_full()
    }

    /// Is a module with this identity a system module
    pub(crate) fn is_system(&self, identity: &ModuleIdentity) -> bool {
        identity.version == ModuleVersion::zero()
            || self
                .prefixes
                .load()
                .iter()
                .any(|prefix| matches_system_prefix(&identity.name, prefix))
    }

    pub(crate) fn set_prefixes(&self, prefixes: Vec<String>) {
        self.prefixes.store(Arc::new(prefixes));
    }

    /// Replace the preload list and import it
    pub(crate) fn set_preload(&self, preload: Vec<String>) {
        self.preload.store(Arc::new(preload));
        if self.initialized.get().is_some() {
            self.import_preload();
        }
    }

    pub(crate) fn subscribe(&self, listener: ModuleListener) {
        self.listeners.push(listener);
    }

    /// Add a module to the set.
    ///
    /// Registering a module that is already known (same token or same name) is a no-op.
    /// A new application module invalidates the discovery caches and notifies listeners
    /// after it is visible in the set.
    pub(crate) fn register(&self, module: &ModuleRc) -> Registration {
        self.ensure_initialized();

        let system = self.is_system(&module.identity);
        let mut outcome = Registration::AlreadyKnown;
        let published = publish(&self.set, |set| {
            if set.contains(module) {
                outcome = Registration::AlreadyKnown;
                return None;
            }

            let mut next = set.clone();
            if system {
                outcome = Registration::System;
                next.system.push(module.clone());
            } else {
                outcome = Registration::Application;
                next.application.push(module.clone());
                next.generation += 1;
            }
            Some(next)
        });

        match outcome {
            Registration::Application => {
                tracing::debug!(
                    module = %module.identity,
                    generation = published.generation,
                    "registered application module"
                );
                self.caches.invalidate(published.generation);
                self.notify(module);
            }
            Registration::System => {
                tracing::trace!(module = %module.identity, "registered system module");
            }
            Registration::AlreadyKnown => {}
        }
        outcome
    }

    /// Find a loaded module, or ask the loader for it.
    ///
    /// `name` may be a simple name or a display name with version. Failures are always
    /// logged; with `throw_on_error` they are returned, otherwise they yield `Ok(None)`.
    pub(crate) fn try_load(&self, name: &str, throw_on_error: bool) -> Result<Option<ModuleRc>> {
        let result = ModuleIdentity::parse(name).and_then(|identity| {
            if let Some(known) = self.snapshot().find(&identity.name) {
                return Ok(known);
            }

            let module = self.loader.load(&identity.name)?;
            self.register(&module);
            Ok(module)
        });

        match result {
            Ok(module) => Ok(Some(module)),
            Err(error) => {
                tracing::warn!(module = name, %error, "failed to load module");
                if throw_on_error {
                    Err(error)
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn ensure_initialized(&self) {
        let mut fresh = Vec::new();
        self.initialized.get_or_init(|| {
            let mut set = ModuleSet {
                system: vec![self.core.clone()],
                ..ModuleSet::default()
            };

            for module in self.loader.preloaded() {
                self.classify_into(&mut set, module, &mut fresh);
            }

            for name in self.preload.load().iter() {
                let loaded = ModuleIdentity::parse(name).and_then(|identity| {
                    match set.find(&identity.name) {
                        Some(_) => Ok(None),
                        None => self.loader.load(&identity.name).map(Some),
                    }
                });
                match loaded {
                    Ok(Some(module)) => self.classify_into(&mut set, module, &mut fresh),
                    Ok(None) => {}
                    Err(error) => {
                        tracing::warn!(module = name.as_str(), %error, "failed to preload module");
                    }
                }
            }

            tracing::debug!(
                system = set.system.len(),
                application = set.application.len(),
                "module set initialized"
            );
            self.caches.invalidate(set.generation);
            self.set.store(Arc::new(set));
        });

        // Listeners run once the set is published and may re-enter the registry
        for module in &fresh {
            self.notify(module);
        }
    }

    fn classify_into(&self, set: &mut ModuleSet, module: ModuleRc, fresh: &mut Vec<ModuleRc>) {
        if set.contains(&module) {
            return;
        }

        if self.is_system(&module.identity) {
            set.system.push(module);
        } else {
            set.application.push(module.clone());
            set.generation += 1;
            fresh.push(module);
        }
    }

    fn import_preload(&self) {
        let preload = self.preload.load_full();
        for name in preload.iter() {
            // failures are logged by try_load
            let _ = self.try_load(name, false);
        }
    }

    fn notify(&self, module: &ModuleRc) {
        for (_, listener) in self.listeners.iter() {
            listener(module);
        }
    }
}
