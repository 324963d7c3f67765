//! The factory: type lookup, discovery, constructor resolution and cached invocation.
//!
//! A [`Factory`] ties the descriptor model together. It owns the module set, the synonym
//! table, the discovery caches and the invoker caches, and is safe to share across
//! threads (`Arc<Factory>`). All caches only ever grow, except the discovery caches which
//! are dropped whenever an application module is registered.
//!
//! # Key Components
//!
//! - [`Factory`] - The entry point
//! - [`TypeFilter`] - Cacheable predicate for type discovery
//! - [`ConstructorSelector`] / [`TieredResolver`] - Constructor overload resolution
//! - [`CompiledInvoker`] - Reusable, pre-planned calls
//!
//! # Type names
//!
//! [`Factory::get_type`] accepts, after trimming surrounding whitespace:
//!
//! - a synonym (`int`, `string?`, configured aliases), case-insensitive
//! - a full name (`Acme.Billing.Money`), searched in system modules first, then in
//!   application modules in load order
//! - a full name with a trailing `?` for `Nullable<T>` (`Acme.Billing.Money?`)
//! - a qualified name (`Acme.Billing.Money, Acme.Billing`), searched only in the named
//!   module, which is loaded on demand. An empty module part (`Acme.Billing.Money,`)
//!   means an unqualified lookup.
//!
//! # Examples
//!
//! ```rust
//! use typefactory::prelude::*;
//!
//! let factory = Factory::new(FactoryConfig::default());
//!
//! let int = factory.get_type(" int ")?;
//! assert_eq!(int.fullname(), "System.Int32");
//!
//! // resolution is by runtime type, the invoker converts
//! let invoker = factory.constructor_invoker(&int, &[Some(int.clone())])?;
//! assert_eq!(invoker.call(&[Value::string("42")])?, Value::I4(42));
//!
//! let zero = factory.construct_by_name("long", &[])?;
//! assert_eq!(zero, Value::I8(0));
//! # Ok::<(), typefactory::Error>(())
//! ```

mod cache;
mod discovery;
mod invoker;
mod modules;
mod resolver;
mod snapshot;
mod synonyms;

use std::sync::Arc;

use arc_swap::ArcSwap;

pub use cache::{ConstructorKey, InvokerCacheStats, InvokerRc};
pub use discovery::{TypeFilter, TypePredicate};
pub use invoker::CompiledInvoker;
pub use modules::{ModuleListener, ModuleSet, Registration};
pub use resolver::{render_signature, ConstructorSelector, MatchTier, Resolution, TieredResolver};

use crate::{
    config::FactoryConfig,
    factory::{
        cache::InvokerCache,
        discovery::{DiscoveryCache, QueryKey},
        modules::ModuleRegistry,
        synonyms::SynonymTable,
    },
    metadata::{
        identity::ModuleIdentity,
        method::MethodRc,
        module::{ModuleLoader, ModuleRc, StaticLoader},
        typesystem::{CoreLibrary, TypeList, TypeRc, Value},
    },
    Error, Result,
};

/// Dynamic type resolution and construction over a registry of type descriptors
pub struct Factory {
    config: ArcSwap<FactoryConfig>,
    core: Arc<CoreLibrary>,
    caches: Arc<DiscoveryCache>,
    modules: ModuleRegistry,
    synonyms: SynonymTable,
    selector: Arc<dyn ConstructorSelector>,
    invokers: InvokerCache,
}

impl Factory {
    /// Create a factory without a module loader.
    ///
    /// Modules are added with [`Factory::load_module`].
    #[must_use]
    pub fn new(config: FactoryConfig) -> Self {
        Self::with_loader(config, Arc::new(StaticLoader::new()))
    }

    /// Create a factory that loads unknown modules through `loader`
    ///
    /// ## Arguments
    /// * 'config' - The initial configuration
    /// * 'loader' - Provides startup modules and loads modules on demand
    #[must_use]
    pub fn with_loader(config: FactoryConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        let core = Arc::new(CoreLibrary::new());
        let caches = Arc::new(DiscoveryCache::new());
        let modules = ModuleRegistry::new(
            loader,
            core.module().clone(),
            caches.clone(),
            config.effective_system_prefixes(),
            config.effective_preload(),
        );

        Factory {
            config: ArcSwap::from_pointee(config),
            core,
            caches,
            modules,
            synonyms: SynonymTable::new(),
            selector: Arc::new(TieredResolver),
            invokers: InvokerCache::new(),
        }
    }

    /// Replace the constructor selector
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn ConstructorSelector>) -> Self {
        self.selector = selector;
        self
    }

    // ============================================================================================
    // Configuration
    // ============================================================================================

    /// The current configuration
    #[must_use]
    pub fn config(&self) -> Arc<FactoryConfig> {
        self.config.load_full()
    }

    /// Replace the configuration.
    ///
    /// New system prefixes apply to modules registered afterwards, and the preload list is
    /// imported right away. The synonym table is built once and keeps its entries.
    pub fn update_config(&self, config: FactoryConfig) {
        self.modules.set_prefixes(config.effective_system_prefixes());
        let preload = config.effective_preload();
        self.config.store(Arc::new(config));
        self.modules.set_preload(preload);
    }

    /// The core library with all built-in types
    #[must_use]
    pub fn core(&self) -> &CoreLibrary {
        &self.core
    }

    // ============================================================================================
    // Modules
    // ============================================================================================

    /// Register a module.
    ///
    /// Returns how the module was classified, or [`Registration::AlreadyKnown`] if a module
    /// with the same token or name was registered before.
    pub fn load_module(&self, module: &ModuleRc) -> Registration {
        self.modules.register(module)
    }

    /// Find a loaded module by name, or load it through the module loader.
    ///
    /// `name` may carry a version (`Acme.Billing, Version=1.0.0.0`). Failures are always
    /// logged.
    ///
    /// # Errors
    /// With `throw_on_error`, returns the loader error; otherwise failures yield `Ok(None)`.
    pub fn try_load_module(&self, name: &str, throw_on_error: bool) -> Result<Option<ModuleRc>> {
        self.modules.try_load(name, throw_on_error)
    }

    /// Subscribe to newly registered application modules.
    ///
    /// The callback runs on the registering thread after the module is visible to
    /// discovery and after the discovery caches were dropped.
    pub fn on_module_loaded<F>(&self, listener: F)
    where
        F: Fn(&ModuleRc) + Send + Sync + 'static,
    {
        self.modules.subscribe(Arc::new(listener));
    }

    /// The current module set
    #[must_use]
    pub fn modules(&self) -> Arc<ModuleSet> {
        self.modules.snapshot()
    }

    /// Application modules in load order
    #[must_use]
    pub fn application_modules(&self) -> Vec<ModuleRc> {
        self.modules.snapshot().application().to_vec()
    }

    /// System modules in load order
    #[must_use]
    pub fn system_modules(&self) -> Vec<ModuleRc> {
        self.modules.snapshot().system().to_vec()
    }

    // ============================================================================================
    // Type lookup
    // ============================================================================================

    /// Resolve a type name.
    ///
    /// # Errors
    /// - [`Error::InvalidTypeName`] for empty names or an empty type part
    /// - [`Error::TypeNotFound`] if nothing matches
    pub fn get_type(&self, name: &str) -> Result<TypeRc> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidTypeName(name.to_string()));
        }

        if let Some(ty) = self.synonym(name) {
            return Ok(ty);
        }

        self.resolve_canonical(name)
    }

    /// Resolve a type name, `None` if it cannot be resolved
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<TypeRc> {
        self.get_type(name).ok()
    }

    fn synonym(&self, name: &str) -> Option<TypeRc> {
        // startup modules first, so the build sees them
        self.modules.snapshot();
        self.synonyms.get_or_build(|| {
            let config = self.config.load();
            synonyms::build_table(&self.core, &config.synonyms, |target| {
                self.resolve_canonical(target).ok()
            })
        });
        self.synonyms.get(name)
    }

    fn resolve_canonical(&self, name: &str) -> Result<TypeRc> {
        match name.split_once(',') {
            Some((type_part, module_part)) => {
                let type_part = type_part.trim();
                let module_part = module_part.trim();
                if type_part.is_empty() {
                    return Err(Error::InvalidTypeName(name.to_string()));
                }
                if module_part.is_empty() {
                    return self.resolve_unqualified(type_part);
                }
                self.resolve_in_module(type_part, module_part)
            }
            None => self.resolve_unqualified(name),
        }
    }

    fn resolve_unqualified(&self, name: &str) -> Result<TypeRc> {
        if let Some(inner) = name.strip_suffix('?') {
            let inner = self.resolve_unqualified(inner.trim_end())?;
            return self
                .core
                .nullable_of(&inner)
                .ok_or_else(|| Error::TypeNotFound(name.to_string()));
        }

        let set = self.modules.snapshot();
        if let Some(ty) = self.caches.name(name, set.generation) {
            return Ok(ty);
        }

        let found = set.all().find_map(|module| module.find_type(name));
        match found {
            Some(ty) => {
                self.caches.store_name(name, set.generation, &ty);
                Ok(ty)
            }
            None => Err(Error::TypeNotFound(name.to_string())),
        }
    }

    fn resolve_in_module(&self, type_name: &str, module_name: &str) -> Result<TypeRc> {
        let qualified = || format!("{type_name}, {module_name}");

        let module = match self.modules.try_load(module_name, false)? {
            Some(module) => module,
            None => return Err(Error::TypeNotFound(qualified())),
        };

        let (inner_name, nullable) = match type_name.strip_suffix('?') {
            Some(inner) => (inner.trim_end(), true),
            None => (type_name, false),
        };

        let ty = module
            .find_type(inner_name)
            .ok_or_else(|| Error::TypeNotFound(qualified()))?;
        if !nullable {
            return Ok(ty);
        }
        self.core
            .nullable_of(&ty)
            .ok_or_else(|| Error::TypeNotFound(qualified()))
    }

    /// Parse and validate a module display name
    ///
    /// # Errors
    /// Returns [`Error::InvalidModuleIdentity`] for malformed names.
    pub fn parse_module_identity(name: &str) -> Result<ModuleIdentity> {
        ModuleIdentity::parse(name)
    }

    // ============================================================================================
    // Discovery
    // ============================================================================================

    /// Non-interface types of the application modules matching `filter`
    #[must_use]
    pub fn types_matching(&self, filter: &TypeFilter, cache: bool) -> TypeList {
        let set = self.modules.snapshot();
        self.caches.lookup_or_scan(
            QueryKey::Filter(filter.id()),
            set.application(),
            set.generation,
            cache,
            self.config.load().parallel_discovery,
            |ty| filter.matches(ty),
        )
    }

    /// Non-interface types of the application modules deriving from `base` (excluding
    /// `base` itself)
    #[must_use]
    pub fn subtypes(&self, base: &TypeRc, cache: bool) -> TypeList {
        let set = self.modules.snapshot();
        self.caches.lookup_or_scan(
            QueryKey::Subtypes(base.token),
            set.application(),
            set.generation,
            cache,
            self.config.load().parallel_discovery,
            |ty| ty.token != base.token && base.is_assignable_from(ty),
        )
    }

    /// Concrete (non-abstract) subtypes of `base`
    #[must_use]
    pub fn concrete_subtypes(&self, base: &TypeRc, cache: bool) -> TypeList {
        self.subtypes(base, cache)
            .iter()
            .filter(|ty| ty.is_concrete())
            .cloned()
            .collect()
    }

    /// Non-interface types of the application modules implementing `iface`
    #[must_use]
    pub fn implementors(&self, iface: &TypeRc, cache: bool) -> TypeList {
        let set = self.modules.snapshot();
        self.caches.lookup_or_scan(
            QueryKey::Implementors(iface.token),
            set.application(),
            set.generation,
            cache,
            self.config.load().parallel_discovery,
            |ty| iface.is_assignable_from(ty),
        )
    }

    // ============================================================================================
    // Constructor resolution and invocation
    // ============================================================================================

    /// Resolve the constructor of `ty` for arguments of the given runtime types
    ///
    /// # Errors
    /// See [`ConstructorSelector::select`].
    pub fn resolve_constructor(
        &self,
        ty: &TypeRc,
        arguments: &[Option<TypeRc>],
    ) -> Result<Resolution> {
        self.selector
            .select(ty, arguments, self.config.load().ambiguity)
    }

    /// Resolve a constructor, `None` if there is none
    #[must_use]
    pub fn find_constructor(
        &self,
        ty: &TypeRc,
        arguments: &[Option<TypeRc>],
    ) -> Option<Resolution> {
        self.resolve_constructor(ty, arguments).ok()
    }

    /// The cached invoker for a constructor or method
    ///
    /// # Errors
    /// Returns [`Error::Invocation`] if a type the member references was dropped.
    pub fn method_invoker(&self, method: &MethodRc) -> Result<InvokerRc> {
        self.invokers.member(method.token, || {
            CompiledInvoker::for_member(method, &self.core).map(Arc::new)
        })
    }

    /// The cached constructor invoker of `ty` for an argument signature.
    ///
    /// Resolution runs only on a cache miss; a hit returns the same invoker instance.
    /// Entries are kept per ambiguity policy, so a configuration change never returns an
    /// invoker selected under the previous policy.
    ///
    /// # Errors
    /// Resolution errors, see [`Factory::resolve_constructor`].
    pub fn constructor_invoker(
        &self,
        ty: &TypeRc,
        arguments: &[Option<TypeRc>],
    ) -> Result<InvokerRc> {
        let policy = self.config.load().ambiguity;
        let key = ConstructorKey::new(ty, arguments, policy);
        self.invokers.constructor(key, || {
            match self.selector.select(ty, arguments, policy)? {
                Resolution::Constructor { ctor, .. } => self.method_invoker(&ctor),
                Resolution::Copy(ty) => Ok(Arc::new(CompiledInvoker::for_copy(&ty, &self.core))),
            }
        })
    }

    /// The cached parameterless invoker of `ty`
    ///
    /// # Errors
    /// Returns [`Error::ConstructorNotFound`] if `ty` has no parameterless constructor and
    /// no zero value.
    pub fn parameterless_invoker(&self, ty: &TypeRc) -> Result<InvokerRc> {
        self.invokers.parameterless(ty.token, || {
            CompiledInvoker::parameterless(ty, &self.core).map(Arc::new)
        })
    }

    /// Invoke a method on an optional instance
    ///
    /// # Errors
    /// See [`CompiledInvoker::invoke`].
    pub fn invoke(
        &self,
        method: &MethodRc,
        instance: Option<&Value>,
        args: &[Value],
    ) -> Result<Value> {
        self.method_invoker(method)?.invoke(instance, args)
    }

    /// Construct an instance of `ty`.
    ///
    /// Without arguments the parameterless invoker is used; otherwise the constructor is
    /// resolved from the runtime types of `args`.
    ///
    /// # Errors
    /// Resolution and invocation errors.
    pub fn construct(&self, ty: &TypeRc, args: &[Value]) -> Result<Value> {
        let invoker = if args.is_empty() {
            self.parameterless_invoker(ty)?
        } else {
            let arguments: Vec<Option<TypeRc>> =
                args.iter().map(|arg| self.core.runtime_type(arg)).collect();
            self.constructor_invoker(ty, &arguments)?
        };
        invoker.call(args)
    }

    /// Construct an instance of `ty`, `None` on failure (logged)
    #[must_use]
    pub fn try_construct(&self, ty: &TypeRc, args: &[Value]) -> Option<Value> {
        match self.construct(ty, args) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(type_name = %ty.fullname(), %error, "construction failed");
                None
            }
        }
    }

    /// Resolve `name` and construct an instance
    ///
    /// # Errors
    /// Lookup, resolution and invocation errors.
    pub fn construct_by_name(&self, name: &str, args: &[Value]) -> Result<Value> {
        let ty = self.get_type(name)?;
        self.construct(&ty, args)
    }

    /// Resolve `name` and construct an instance, `None` on failure (logged)
    #[must_use]
    pub fn try_construct_by_name(&self, name: &str, args: &[Value]) -> Option<Value> {
        match self.construct_by_name(name, args) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(type_name = name, %error, "construction failed");
                None
            }
        }
    }

    /// The runtime type of a value, `None` for null
    #[must_use]
    pub fn runtime_type(&self, value: &Value) -> Option<TypeRc> {
        self.core.runtime_type(value)
    }

    /// Entry counts of the invoker caches
    #[must_use]
    pub fn invoker_cache_stats(&self) -> InvokerCacheStats {
        self.invokers.stats()
    }

    /// Number of cached discovery results
    #[must_use]
    pub fn cached_discovery_results(&self) -> usize {
        self.caches.cached_queries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AmbiguityPolicy,
        metadata::{
            identity::ModuleVersion,
            method::MethodBuilder,
            module::ModuleBuilder,
            typesystem::{PrimitiveKind, TypeBuilder},
        },
        test::{billing, MoneyData},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn billing_factory(config: FactoryConfig) -> (Factory, crate::test::Billing) {
        let fixture = billing();
        let factory = Factory::new(config);
        factory.load_module(&fixture.module);
        (factory, fixture)
    }

    #[test]
    fn test_get_type_forms() {
        let (factory, fixture) = billing_factory(FactoryConfig::default());

        assert_eq!(factory.get_type("Acme.Billing.Money").unwrap().token, fixture.money.token);
        assert_eq!(factory.get_type("  INT ").unwrap().token, PrimitiveKind::I4.token());
        assert_eq!(factory.get_type("System.String").unwrap().token, PrimitiveKind::String.token());
        assert_eq!(
            factory.get_type("Acme.Billing.Money, Acme.Billing").unwrap().token,
            fixture.money.token
        );
        assert_eq!(
            factory.get_type("Acme.Billing.Money ,  ").unwrap().token,
            fixture.money.token
        );

        let nullable = factory.get_type("Acme.Billing.Money?").unwrap();
        assert_eq!(nullable.nullable_inner().unwrap().token, fixture.money.token);
        assert!(Arc::ptr_eq(&nullable, &factory.get_type("Acme.Billing.Money ?").unwrap()));
        assert_eq!(factory.get_type("long?").unwrap().fullname(), "System.Int64?");
    }

    #[test]
    fn test_get_type_errors() {
        let (factory, _) = billing_factory(FactoryConfig::default());

        assert!(matches!(factory.get_type("   "), Err(Error::InvalidTypeName(_))));
        assert!(matches!(factory.get_type(", Acme.Billing"), Err(Error::InvalidTypeName(_))));
        assert!(matches!(factory.get_type("Acme.Nope"), Err(Error::TypeNotFound(_))));
        assert!(matches!(
            factory.get_type("Acme.Billing.Money, Acme.Other"),
            Err(Error::TypeNotFound(_))
        ));
        assert!(matches!(factory.get_type("string?"), Err(Error::TypeNotFound(_))));
        assert!(factory.find_type("acme.billing.money").is_none());
    }

    #[test]
    fn test_configured_synonyms() {
        let config = FactoryConfig::default()
            .with_synonym(" cash ", "Acme.Billing.Money")
            .with_synonym("ghost", "Acme.Ghost");
        let (factory, fixture) = billing_factory(config);

        assert_eq!(factory.get_type("Cash").unwrap().token, fixture.money.token);
        assert!(factory.get_type("cash?").unwrap().nullable_inner().is_some());
        assert!(factory.find_type("ghost").is_none());
    }

    #[test]
    fn test_construct() {
        let (factory, fixture) = billing_factory(FactoryConfig::default());

        let money = factory
            .construct(&fixture.money, &[Value::I8(500), fixture.currency_value("EUR")])
            .unwrap();
        assert_eq!(money.downcast_ref::<MoneyData>().unwrap().minor_units, 500);

        // copy constructor is declared on Money
        let copy = factory.construct(&fixture.money, &[money.clone()]).unwrap();
        assert_eq!(copy.downcast_ref::<MoneyData>().unwrap().minor_units, 500);

        // primitives fall back to copy semantics
        assert_eq!(factory.construct_by_name("int", &[Value::I4(3)]).unwrap(), Value::I4(3));
        assert_eq!(factory.construct_by_name("double", &[]).unwrap(), Value::R8(0.0));

        assert!(factory.try_construct(&fixture.shape, &[]).is_none());
        assert!(factory.try_construct_by_name("Acme.Nope", &[]).is_none());
    }

    #[test]
    fn test_constructor_invoker_cached() {
        struct Counting {
            calls: AtomicUsize,
        }
        impl ConstructorSelector for Counting {
            fn select(
                &self,
                ty: &TypeRc,
                arguments: &[Option<TypeRc>],
                policy: AmbiguityPolicy,
            ) -> Result<Resolution> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                TieredResolver.select(ty, arguments, policy)
            }
        }

        let selector = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let fixture = billing();
        let factory = Factory::new(FactoryConfig::default()).with_selector(selector.clone());
        factory.load_module(&fixture.module);

        let signature = [Some(fixture.int64()), Some(fixture.currency.clone())];
        let a = factory.constructor_invoker(&fixture.money, &signature).unwrap();
        let b = factory.constructor_invoker(&fixture.money, &signature).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(selector.calls.load(Ordering::SeqCst), 1);

        // the constructor invoker is the member invoker
        let member = factory.method_invoker(&fixture.money_ctor()).unwrap();
        assert!(Arc::ptr_eq(&a, &member));

        let stats = factory.invoker_cache_stats();
        assert_eq!(stats.constructors, 1);
        assert_eq!(stats.members, 1);
    }

    #[test]
    fn test_ambiguity_policy_from_config() {
        let (factory, fixture) =
            billing_factory(FactoryConfig::default().with_ambiguity(AmbiguityPolicy::Reject));
        assert!(matches!(
            factory.resolve_constructor(&fixture.printer, &[None]),
            Err(Error::AmbiguousConstructor { .. })
        ));

        assert!(matches!(
            factory.construct(&fixture.printer, &[Value::Null]),
            Err(Error::AmbiguousConstructor { .. })
        ));

        factory.update_config(FactoryConfig::default());
        assert!(factory.find_constructor(&fixture.printer, &[None]).is_some());
        let printer = factory.construct(&fixture.printer, &[Value::Null]).unwrap();
        assert_eq!(printer.downcast_ref::<u8>(), Some(&0));

        // the first-fit invoker is not reused once ambiguity is rejected
        factory.update_config(FactoryConfig::default().with_ambiguity(AmbiguityPolicy::Reject));
        assert!(matches!(
            factory.construct(&fixture.printer, &[Value::Null]),
            Err(Error::AmbiguousConstructor { .. })
        ));
        assert!(factory.try_construct(&fixture.printer, &[Value::Null]).is_none());
    }

    #[test]
    fn test_discovery() {
        let (factory, fixture) = billing_factory(FactoryConfig::default());

        let shapes = factory.subtypes(&fixture.shape, true);
        let names: Vec<_> = shapes.iter().map(|ty| ty.name.as_str()).collect();
        assert_eq!(names, vec!["Polygon", "Circle", "Square"]);

        let concrete = factory.concrete_subtypes(&fixture.shape, true);
        assert_eq!(concrete.len(), 2);

        let implementors = factory.implementors(&fixture.ishape, true);
        assert_eq!(implementors.len(), 4);
        assert!(implementors.iter().all(|ty| !ty.is_interface()));

        let filter = TypeFilter::new(|ty| ty.is_enum());
        assert_eq!(factory.types_matching(&filter, true).len(), 1);
        assert_eq!(factory.cached_discovery_results(), 3);
    }

    #[test]
    fn test_discovery_invalidated_by_new_module() {
        let (factory, fixture) = billing_factory(FactoryConfig::default());
        let before = factory.subtypes(&fixture.shape, true);

        let hexagon = TypeBuilder::class("Acme.Geometry", "Hexagon")
            .extends(&fixture.polygon)
            .build();
        let extra = ModuleBuilder::new("Acme.Geometry")
            .version(ModuleVersion::new(1, 0, 0, 0))
            .add(&hexagon)
            .build();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        factory.on_module_loaded(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(factory.load_module(&extra), Registration::Application);
        assert_eq!(factory.load_module(&extra), Registration::AlreadyKnown);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let after = factory.subtypes(&fixture.shape, true);
        assert_eq!(after.len(), before.len() + 1);
        assert!(after.iter().any(|ty| ty.token == hexagon.token));
    }

    #[test]
    fn test_system_modules_not_discovered() {
        let (factory, fixture) =
            billing_factory(FactoryConfig::default().with_system_prefix("Contoso."));

        let platform_shape = TypeBuilder::class("Contoso.Shapes", "Blob")
            .extends(&fixture.shape)
            .build();
        let platform = ModuleBuilder::new("Contoso.Shapes")
            .version(ModuleVersion::new(2, 0, 0, 0))
            .add(&platform_shape)
            .build();

        assert_eq!(factory.load_module(&platform), Registration::System);
        assert_eq!(factory.system_modules().len(), 2);
        assert_eq!(factory.application_modules().len(), 1);
        assert!(factory
            .subtypes(&fixture.shape, false)
            .iter()
            .all(|ty| ty.token != platform_shape.token));

        // but its types resolve by name
        assert!(factory.find_type("Contoso.Shapes.Blob").is_some());
    }

    #[test]
    fn test_listener_lookup_during_synonym_build() {
        let fixture = billing();
        let loader = StaticLoader::new().with_module(fixture.module.clone());
        let config =
            FactoryConfig::default().with_synonym("cash", "Acme.Billing.Money, Acme.Billing");
        let factory = Arc::new(Factory::with_loader(config, Arc::new(loader)));

        let resolved = Arc::new(AtomicUsize::new(0));
        let counter = resolved.clone();
        let weak = Arc::downgrade(&factory);
        factory.on_module_loaded(move |_| {
            if let Some(factory) = weak.upgrade() {
                if factory.find_type("int").is_some() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        // resolving the alias loads Acme.Billing, whose listener looks up a synonym
        let cash = factory.find_type("cash").unwrap();
        assert_eq!(cash.token, fixture.money.token);
        assert_eq!(resolved.load(Ordering::SeqCst), 1);
        assert_eq!(factory.get_type("CASH").unwrap().token, fixture.money.token);
    }

    #[test]
    fn test_nullable_parameters_from_other_core() {
        let (factory, fixture) = billing_factory(FactoryConfig::default());
        let own_int = fixture
            .core
            .nullable_of(&fixture.core.primitive(PrimitiveKind::I4))
            .unwrap();

        let meter = TypeBuilder::class("Acme.Billing", "Meter").build();
        MethodBuilder::constructor()
            .param("limit", &own_int)
            .body(|_, args| Ok(Value::native(args[0].as_i32())))
            .attach(&meter);

        let nullable = factory.get_type("int?").unwrap();
        assert_eq!(nullable.token, own_int.token);

        let resolution = factory.resolve_constructor(&meter, &[Some(nullable)]).unwrap();
        assert_eq!(resolution.tier(), MatchTier::Exact);

        let value = factory.construct(&meter, &[Value::I4(7)]).unwrap();
        assert_eq!(value.downcast_ref::<Option<i32>>(), Some(&Some(7)));
    }

    #[test]
    fn test_invoke_method() {
        let (factory, fixture) = billing_factory(FactoryConfig::default());
        let money = factory
            .construct(&fixture.money, &[Value::I8(250), fixture.currency_value("CHF")])
            .unwrap();
        let describe = fixture.money.find_method("Describe").unwrap();

        assert_eq!(
            factory.invoke(&describe, Some(&money), &[]).unwrap(),
            Value::string("2.50 CHF")
        );
    }
}
