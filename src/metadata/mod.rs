//! Descriptor model: modules, types, members and their identities.
//!
//! This module contains the registry data the factory operates on. Nothing in here
//! performs resolution or caching; it only describes what exists.
//!
//! # Key Components
//!
//! - [`token`] - Identities of modules, types and members, used as cache keys
//! - [`identity`] - Module names and four-part versions
//! - [`module`] - Modules, partial type loads and the [`module::ModuleLoader`] seam
//! - [`method`] - Constructors and methods with their bodies
//! - [`typesystem`] - Type descriptors, primitives, values and conversions
//!
//! # Examples
//!
//! ```rust
//! use typefactory::metadata::{
//!     method::MethodBuilder,
//!     module::ModuleBuilder,
//!     typesystem::{CoreLibrary, PrimitiveKind, TypeBuilder, Value},
//! };
//!
//! let core = CoreLibrary::new();
//! let counter = TypeBuilder::class("Acme", "Counter").build();
//! MethodBuilder::constructor()
//!     .param("start", &core.primitive(PrimitiveKind::I4))
//!     .body(|_, args| Ok(Value::native(args[0].as_i32().unwrap_or_default())))
//!     .attach(&counter);
//!
//! let module = ModuleBuilder::new("Acme.Counters").add(&counter).build();
//! assert_eq!(module.types()?.len(), 1);
//! # Ok::<(), typefactory::Error>(())
//! ```

/// Module names and versions
pub mod identity;
/// Constructors and methods
pub mod method;
/// Modules and module loading
pub mod module;
/// Identities of descriptors
pub mod token;
/// Types, values and conversions
pub mod typesystem;
