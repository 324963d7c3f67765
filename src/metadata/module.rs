//! Modules: named, versioned units of types.
//!
//! A [`ModuleDescriptor`] groups the types a unit of code declares, together with any
//! types that failed to load. The factory never constructs modules on its own; they are
//! either registered directly or produced on demand by a [`ModuleLoader`].
//!
//! # Partial type loads
//!
//! A module can be partially broken: some of its types load, others do not.
//! [`ModuleDescriptor::types`] reports this as [`Error::PartialTypeLoad`], which still
//! carries every type that did load, so callers can skip the broken part.
//!
//! # Example
//!
//! ```rust
//! use typefactory::metadata::{
//!     identity::ModuleVersion,
//!     module::ModuleBuilder,
//!     typesystem::TypeBuilder,
//! };
//!
//! let invoice = TypeBuilder::class("Acme.Billing", "Invoice").build();
//! let module = ModuleBuilder::new("Acme.Billing")
//!     .version(ModuleVersion::new(1, 0, 0, 0))
//!     .add(&invoice)
//!     .build();
//!
//! assert_eq!(module.types()?.len(), 1);
//! assert_eq!(invoice.module(), Some("Acme.Billing"));
//! # Ok::<(), typefactory::Error>(())
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    metadata::{
        identity::{ModuleIdentity, ModuleVersion},
        token::{Token, TokenTable},
        typesystem::TypeRc,
    },
    Error, Result,
};

/// Reference to a `ModuleDescriptor`
pub type ModuleRc = Arc<ModuleDescriptor>;

/// A type that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLoadFailure {
    /// Full name of the type
    pub type_name: String,
    /// Why loading failed
    pub reason: String,
}

/// A loaded module
pub struct ModuleDescriptor {
    /// Token
    pub token: Token,
    /// Name and version
    pub identity: ModuleIdentity,
    types: Vec<TypeRc>,
    failures: Vec<TypeLoadFailure>,
}

impl ModuleDescriptor {
    /// Simple name of the module
    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Version of the module
    #[must_use]
    pub fn version(&self) -> ModuleVersion {
        self.identity.version
    }

    /// Enumerate all types of this module in declaration order.
    ///
    /// # Errors
    /// Returns [`Error::PartialTypeLoad`] if any type failed to load. The error carries
    /// the types that did load.
    pub fn types(&self) -> Result<Vec<TypeRc>> {
        if self.failures.is_empty() {
            return Ok(self.types.clone());
        }

        Err(Error::PartialTypeLoad {
            module: self.identity.name.clone(),
            loaded: self.types.clone(),
            failures: self
                .failures
                .iter()
                .map(|failure| format!("{}: {}", failure.type_name, failure.reason))
                .collect(),
        })
    }

    /// The types that loaded, ignoring failures
    #[must_use]
    pub fn loaded_types(&self) -> &[TypeRc] {
        &self.types
    }

    /// Types that failed to load
    #[must_use]
    pub fn failures(&self) -> &[TypeLoadFailure] {
        &self.failures
    }

    /// Find a loaded type by full name (case-sensitive)
    #[must_use]
    pub fn find_type(&self, fullname: &str) -> Option<TypeRc> {
        self.types
            .iter()
            .find(|ty| ty.fullname() == fullname)
            .cloned()
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("token", &self.token)
            .field("identity", &self.identity.display_name())
            .field("types", &self.types.len())
            .field("failures", &self.failures.len())
            .finish()
    }
}

/// Provides a fluent API for assembling modules
pub struct ModuleBuilder {
    identity: ModuleIdentity,
    types: Vec<TypeRc>,
    failures: Vec<TypeLoadFailure>,
}

impl ModuleBuilder {
    /// Start building a module with version `0.0.0.0`
    ///
    /// ## Arguments
    /// * 'name' - The simple module name
    #[must_use]
    pub fn new(name: &str) -> Self {
        ModuleBuilder {
            identity: ModuleIdentity::new(name, ModuleVersion::zero()),
            types: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Set the module version
    #[must_use]
    pub fn version(mut self, version: ModuleVersion) -> Self {
        self.identity.version = version;
        self
    }

    /// Add a type. Types belong to the first module they are added to.
    #[must_use]
    pub fn add(mut self, ty: &TypeRc) -> Self {
        ty.set_module(&self.identity.name);
        self.types.push(ty.clone());
        self
    }

    /// Add several types
    #[must_use]
    pub fn add_all<'a>(self, types: impl IntoIterator<Item = &'a TypeRc>) -> Self {
        types.into_iter().fold(self, ModuleBuilder::add)
    }

    /// Record a type that failed to load
    ///
    /// ## Arguments
    /// * 'type_name' - Full name of the broken type
    /// * 'reason'    - Why it failed
    #[must_use]
    pub fn fail(mut self, type_name: &str, reason: &str) -> Self {
        self.failures.push(TypeLoadFailure {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        });
        self
    }

    /// Build the module
    #[must_use]
    pub fn build(self) -> ModuleRc {
        Arc::new(ModuleDescriptor {
            token: Token::allocate(TokenTable::MODULE),
            identity: self.identity,
            types: self.types,
            failures: self.failures,
        })
    }
}

/// Produces modules by name.
///
/// The factory asks the loader for modules it does not know yet (qualified type names,
/// preload lists, explicit `try_load_module` calls). Implementations must be thread safe;
/// the factory may call them concurrently.
pub trait ModuleLoader: Send + Sync {
    /// Load the module with the given simple name
    ///
    /// # Errors
    /// Returns [`Error::ModuleNotFound`] for unknown names, [`Error::ModuleLoad`] if the
    /// module exists but could not be produced.
    fn load(&self, name: &str) -> Result<ModuleRc>;

    /// Modules that are present from the start, in load order
    fn preloaded(&self) -> Vec<ModuleRc> {
        Vec::new()
    }
}

/// A [`ModuleLoader`] over a fixed catalog of modules.
#[derive(Default)]
pub struct StaticLoader {
    catalog: HashMap<String, std::result::Result<ModuleRc, String>>,
    preloaded: Vec<ModuleRc>,
}

impl StaticLoader {
    /// Create an empty loader
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `module` loadable on demand
    #[must_use]
    pub fn with_module(mut self, module: ModuleRc) -> Self {
        self.catalog.insert(module.name().to_string(), Ok(module));
        self
    }

    /// Make `module` present from the start
    #[must_use]
    pub fn with_preloaded(mut self, module: ModuleRc) -> Self {
        self.preloaded.push(module);
        self
    }

    /// Make loading `name` fail with `message`
    #[must_use]
    pub fn with_failure(mut self, name: &str, message: &str) -> Self {
        self.catalog
            .insert(name.to_string(), Err(message.to_string()));
        self
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&self, name: &str) -> Result<ModuleRc> {
        match self.catalog.get(name) {
            Some(Ok(module)) => Ok(module.clone()),
            Some(Err(message)) => Err(Error::ModuleLoad {
                name: name.to_string(),
                message: message.clone(),
            }),
            None => Err(Error::ModuleNotFound(name.to_string())),
        }
    }

    fn preloaded(&self) -> Vec<ModuleRc> {
        self.preloaded.clone()
    }
}
