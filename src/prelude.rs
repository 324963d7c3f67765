//! # typefactory Prelude
//!
//! The most commonly used types of the typefactory library. Import this module to build
//! descriptors, register modules and construct values without spelling out module paths.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all typefactory operations
pub use crate::Error;

/// The result type used throughout typefactory
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Type lookup, discovery and construction
pub use crate::Factory;

/// Factory configuration
pub use crate::config::{AmbiguityPolicy, FactoryConfig, SynonymEntry};

// ================================================================================================
// Descriptor Model
// ================================================================================================

/// Descriptor identities
pub use crate::metadata::token::Token;

/// Module names and versions
pub use crate::metadata::identity::{ModuleIdentity, ModuleVersion};

/// Modules and module loading
pub use crate::metadata::module::{
    ModuleBuilder, ModuleDescriptor, ModuleLoader, ModuleRc, StaticLoader,
};

/// Constructors and methods
pub use crate::metadata::method::{MethodBuilder, MethodDescriptor, MethodKind, MethodRc};

/// Types and values
pub use crate::metadata::typesystem::{
    CoreLibrary, Instance, PrimitiveKind, TypeBuilder, TypeDescriptor, TypeFlavor, TypeList,
    TypeRc, Value,
};

// ================================================================================================
// Factory Components
// ================================================================================================

/// Type discovery
pub use crate::factory::TypeFilter;

/// Module registration outcome and the registered module set
pub use crate::factory::{ModuleSet, Registration};

/// Constructor resolution
pub use crate::factory::{ConstructorSelector, MatchTier, Resolution, TieredResolver};

/// Compiled invokers
pub use crate::factory::{CompiledInvoker, InvokerRc};
