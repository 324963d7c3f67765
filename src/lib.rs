// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # typefactory
//!
//! Dynamic type resolution and constructor compilation over a registry of .NET-style type
//! descriptors. Given a type name, a base type or an interface, `typefactory` locates
//! candidate types across all registered modules, resolves the constructor that best
//! matches an argument signature, and hands out a reusable invoker so that constructing
//! the same type from the same signature again costs a cache lookup.
//!
//! ## Features
//!
//! - **Type lookup** - Keywords (`int`, `string?`), configured synonyms, full names,
//!   nullable suffixes and module-qualified names
//! - **Discovery** - Subtypes, implementors and arbitrary predicates over application
//!   modules, with snapshot caches that are dropped when a module is registered
//! - **Constructor resolution** - Exact, assignable and copy tiers with a configurable
//!   ambiguity policy
//! - **Compiled invokers** - Argument conversion plans computed once, cached per member
//!   and per argument signature
//! - **Lock-free reads** - Module sets are published copy-on-write, caches use concurrent
//!   maps
//!
//! ## Quick Start
//!
//! ```rust
//! use typefactory::prelude::*;
//!
//! let factory = Factory::new(FactoryConfig::default());
//!
//! // A module with one type and one constructor
//! let core = factory.core();
//! let meter = TypeBuilder::class("Acme.Metering", "Meter").build();
//! MethodBuilder::constructor()
//!     .param("limit", &core.primitive(PrimitiveKind::I8))
//!     .body(|_, args| Ok(Value::native(args[0].as_i64().unwrap_or_default())))
//!     .attach(&meter);
//! let module = ModuleBuilder::new("Acme.Metering")
//!     .version(ModuleVersion::new(1, 0, 0, 0))
//!     .add(&meter)
//!     .build();
//! factory.load_module(&module);
//!
//! let ty = factory.get_type("Acme.Metering.Meter")?;
//! let meter = factory.construct(&ty, &[Value::I8(500)])?;
//! assert_eq!(meter.downcast_ref::<i64>(), Some(&500));
//! # Ok::<(), typefactory::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - The descriptor model: tokens, module identities, modules, types,
//!   constructors, methods, values and the conversion table
//! - [`factory`] - Module registry, synonym table, discovery, constructor resolution and
//!   the invoker caches
//! - [`config`] - [`FactoryConfig`], loadable from TOML
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result). The `try_*` variants of
//! the factory operations log the failure and return `None` instead.
//!
//! ```rust
//! use typefactory::{Error, Factory, FactoryConfig};
//!
//! let factory = Factory::new(FactoryConfig::default());
//! match factory.construct_by_name("object", &[]) {
//!     Ok(value) => println!("constructed {}", value),
//!     Err(Error::ConstructorNotFound { type_name, .. }) => println!("{} has no default", type_name),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! `typefactory` emits [`tracing`] events: module registration and first-fit constructor
//! choices at `debug`, load failures and unresolvable synonyms at `warn`. Install any
//! `tracing` subscriber to see them.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use typefactory::prelude::*;
///
/// let factory = Factory::new(FactoryConfig::default());
/// let int = factory.get_type("int")?;
/// assert!(int.is_primitive(PrimitiveKind::I4));
/// # Ok::<(), typefactory::Error>(())
/// ```
pub mod prelude;

/// Factory configuration and its TOML representation
pub mod config;

/// The descriptor model: modules, types, members and values
pub mod metadata;

/// Type lookup, discovery, constructor resolution and compiled invokers
pub mod factory;

/// `typefactory` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `typefactory` Error type
///
/// Every fallible operation of the crate reports one of its variants.
pub use error::Error;

/// Main entry point, see [`factory::Factory`]
pub use factory::Factory;

/// Factory configuration, see [`config::FactoryConfig`]
pub use config::FactoryConfig;
