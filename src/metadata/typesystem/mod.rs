//! Type descriptors and the core library.
//!
//! This module holds the explicit, reflection-free description of every type the factory
//! can resolve and construct. A [`TypeDescriptor`] carries identity (token, namespace,
//! name, owning module), shape ([`TypeFlavor`] and [`TypeAttributes`]), the inheritance
//! graph (base type and interfaces) and the callable members (constructors and methods).
//!
//! # Key Components
//!
//! - [`TypeDescriptor`]: A single type, shared as [`TypeRc`]
//! - [`TypeRef`]: Weak reference used for cyclic edges (parameters, base types)
//! - [`TypeBuilder`]: Builder for user defined types
//! - [`CoreLibrary`]: The system module with all primitive types and the zero-value table
//! - [`PrimitiveKind`]: Built-in primitive types (Int32, String, Object, ...)
//! - [`Value`]: Dynamically typed runtime values
//!
//! # Assignability
//!
//! [`TypeDescriptor::is_assignable_from`] answers "can a value of type `other` be passed
//! where `self` is declared":
//!
//! - Every type is assignable to itself and to `System.Object`
//! - A type is assignable to each type in its base chain
//! - A type is assignable to every interface it (or a base type) implements, including
//!   interfaces inherited by those interfaces
//! - `T` is assignable to `Nullable<T>`
//! - Value types are assignable to `System.ValueType`, enumerations to `System.Enum`
//!
//! # Examples
//!
//! ```rust
//! use typefactory::metadata::typesystem::{TypeBuilder, TypeFlavor};
//!
//! let shape = TypeBuilder::interface("Acme.Geometry", "IShape").build();
//! let circle = TypeBuilder::class("Acme.Geometry", "Circle")
//!     .implements(&shape)
//!     .build();
//!
//! assert!(shape.is_assignable_from(&circle));
//! assert!(!circle.is_assignable_from(&shape));
//! assert_eq!(circle.fullname(), "Acme.Geometry.Circle");
//! ```

mod builder;
pub mod convert;
mod corelib;
mod primitives;
mod value;

use std::{
    fmt,
    sync::{Arc, OnceLock, Weak},
};

use bitflags::bitflags;

pub use builder::TypeBuilder;
pub use corelib::{CoreLibrary, CORE_LIBRARY_NAME};
pub use primitives::{PrimitiveKind, BUILTIN_ALIASES};
pub use value::{Instance, Payload, Value};

use crate::{
    metadata::{method::MethodRc, token::Token},
    Result,
};

/// Reference to a `TypeDescriptor`
pub type TypeRc = Arc<TypeDescriptor>;
/// An immutable, shared list of types
pub type TypeList = Arc<[TypeRc]>;
/// Produces the zero (default) value of a value type
pub type ZeroFn = Arc<dyn Fn() -> Value + Send + Sync>;
/// Custom conversion of an argument into a value of the owning type
pub type FromValueFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Guard against malformed (cyclic) inheritance graphs
const MAX_INHERITANCE_DEPTH: usize = 64;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Attributes of a type, using the `TypeAttributes` bit layout
    pub struct TypeAttributes: u32 {
        /// Type is visible outside its module
        const PUBLIC = 0x0000_0001;
        /// Type is an interface
        const INTERFACE = 0x0000_0020;
        /// Type is abstract and cannot be instantiated
        const ABSTRACT = 0x0000_0080;
        /// Type cannot be derived from
        const SEALED = 0x0000_0100;
    }
}

/// The shape of a type
#[derive(Clone)]
pub enum TypeFlavor {
    /// A built-in type of the core library
    Primitive(PrimitiveKind),
    /// A reference type
    Class,
    /// A user defined value type
    Struct,
    /// An interface
    Interface,
    /// An enumeration with the given underlying integral kind
    Enum {
        /// Underlying integral type of the enumeration
        underlying: PrimitiveKind,
    },
    /// `Nullable<T>` over a value type
    Nullable(TypeRc),
}

impl fmt::Debug for TypeFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFlavor::Primitive(kind) => write!(f, "Primitive({kind:?})"),
            TypeFlavor::Class => write!(f, "Class"),
            TypeFlavor::Struct => write!(f, "Struct"),
            TypeFlavor::Interface => write!(f, "Interface"),
            TypeFlavor::Enum { underlying } => write!(f, "Enum({underlying:?})"),
            TypeFlavor::Nullable(inner) => write!(f, "Nullable({})", inner.fullname()),
        }
    }
}

/// A weak reference to a `TypeDescriptor`, used wherever a strong edge could form a cycle
/// (constructor parameters of the declaring type, base types, interfaces).
#[derive(Clone)]
pub struct TypeRef {
    weak_ref: Weak<TypeDescriptor>,
}

impl TypeRef {
    /// Create a new `TypeRef` from a strong reference
    pub fn new(strong_ref: &TypeRc) -> Self {
        Self {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Get a strong reference to the type, returning None if the type has been dropped
    #[must_use]
    pub fn upgrade(&self) -> Option<TypeRc> {
        self.weak_ref.upgrade()
    }

    /// Check if the referenced type is still alive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.weak_ref.strong_count() > 0
    }

    /// Get the token of the referenced type (if still alive)
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.upgrade().map(|t| t.token)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(ty) => write!(f, "TypeRef({})", ty.fullname()),
            None => write!(f, "TypeRef(<dropped>)"),
        }
    }
}

/// A type, with identity, shape, inheritance and members.
///
/// Descriptors are created through [`TypeBuilder`] (or by the [`CoreLibrary`] for
/// primitives) and are immutable afterwards, except for the append-only member lists which
/// allow constructors to reference their declaring type.
pub struct TypeDescriptor {
    /// Token
    pub token: Token,
    /// Namespace (can be empty)
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// Shape of the type
    pub flavor: TypeFlavor,
    /// Attribute flags
    pub flags: TypeAttributes,
    /// Enumeration literals in declaration order
    pub literals: Vec<(String, i64)>,
    /// All constructors this type declares, in declaration order
    pub constructors: boxcar::Vec<MethodRc>,
    /// All other methods this type declares
    pub methods: boxcar::Vec<MethodRc>,
    /// Interfaces this type implements directly
    interfaces: boxcar::Vec<TypeRef>,
    /// Base type aka 'extends'
    base: OnceLock<TypeRef>,
    /// Name of the owning module, set when the type is added to a module
    module: OnceLock<String>,
    zero: Option<ZeroFn>,
    from_value: Option<FromValueFn>,
}

impl TypeDescriptor {
    /// Create a new descriptor without members
    pub(crate) fn new(
        token: Token,
        namespace: String,
        name: String,
        flavor: TypeFlavor,
        flags: TypeAttributes,
    ) -> Self {
        TypeDescriptor {
            token,
            namespace,
            name,
            flavor,
            flags,
            literals: Vec::new(),
            constructors: boxcar::Vec::new(),
            methods: boxcar::Vec::new(),
            interfaces: boxcar::Vec::new(),
            base: OnceLock::new(),
            module: OnceLock::new(),
            zero: None,
            from_value: None,
        }
    }

    pub(crate) fn with_hooks(
        mut self,
        literals: Vec<(String, i64)>,
        zero: Option<ZeroFn>,
        from_value: Option<FromValueFn>,
    ) -> Self {
        self.literals = literals;
        self.zero = zero;
        self.from_value = from_value;
        self
    }

    /// Returns the full name (Namespace.Name) of the type
    #[must_use]
    pub fn fullname(&self) -> String {
        if let TypeFlavor::Nullable(inner) = &self.flavor {
            return format!("{}?", inner.fullname());
        }

        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Name of the module this type belongs to (if added to one)
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.get().map(String::as_str)
    }

    pub(crate) fn set_module(&self, module: &str) -> bool {
        self.module.set(module.to_string()).is_ok()
    }

    /// Access the base type of this type
    #[must_use]
    pub fn base(&self) -> Option<TypeRc> {
        self.base.get().and_then(TypeRef::upgrade)
    }

    /// Set the base type, can only be done once.
    ///
    /// Returns `false` if a base type was already set.
    pub fn set_base(&self, base: &TypeRc) -> bool {
        self.base.set(TypeRef::new(base)).is_ok()
    }

    /// Interfaces this type implements directly
    #[must_use]
    pub fn interfaces(&self) -> Vec<TypeRc> {
        self.interfaces
            .iter()
            .filter_map(|(_, iface)| iface.upgrade())
            .collect()
    }

    /// Add a directly implemented interface
    pub fn add_interface(&self, iface: &TypeRc) {
        self.interfaces.push(TypeRef::new(iface));
    }

    /// The primitive kind, for types of the core library
    #[must_use]
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.flavor {
            TypeFlavor::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Is this the primitive `kind`
    #[must_use]
    pub fn is_primitive(&self, kind: PrimitiveKind) -> bool {
        self.primitive_kind() == Some(kind)
    }

    /// Is this an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self.flavor, TypeFlavor::Interface)
    }

    /// Is this an enumeration
    #[must_use]
    pub fn is_enum(&self) -> bool {
        matches!(self.flavor, TypeFlavor::Enum { .. })
    }

    /// Is this type abstract (interfaces are abstract too)
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeAttributes::ABSTRACT)
            || self.is_interface()
            || self.is_primitive(PrimitiveKind::ValueType)
            || self.is_primitive(PrimitiveKind::Enum)
    }

    /// Is this type a concrete (instantiable) class or value type
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        !self.is_abstract()
    }

    /// Is this a value type
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        match &self.flavor {
            TypeFlavor::Primitive(kind) => kind.is_value_type(),
            TypeFlavor::Struct | TypeFlavor::Enum { .. } | TypeFlavor::Nullable(_) => true,
            TypeFlavor::Class | TypeFlavor::Interface => false,
        }
    }

    /// Is this a reference type
    #[must_use]
    pub fn is_reference_type(&self) -> bool {
        match &self.flavor {
            TypeFlavor::Primitive(kind) => kind.is_reference_type(),
            TypeFlavor::Class | TypeFlavor::Interface => true,
            _ => false,
        }
    }

    /// Can a parameter of this type receive `null`
    #[must_use]
    pub fn can_hold_null(&self) -> bool {
        self.is_reference_type() || matches!(self.flavor, TypeFlavor::Nullable(_))
    }

    /// The inner type of a `Nullable<T>`
    #[must_use]
    pub fn nullable_inner(&self) -> Option<&TypeRc> {
        match &self.flavor {
            TypeFlavor::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    /// The zero value hook of a user defined value type
    #[must_use]
    pub fn zero_hook(&self) -> Option<&ZeroFn> {
        self.zero.as_ref()
    }

    /// The custom conversion hook of this type
    #[must_use]
    pub fn from_value_hook(&self) -> Option<&FromValueFn> {
        self.from_value.as_ref()
    }

    /// Look up an enumeration literal by name (case-insensitive)
    #[must_use]
    pub fn literal_value(&self, name: &str) -> Option<i64> {
        self.literals
            .iter()
            .find(|(literal, _)| literal.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }

    /// Name of the first enumeration literal with `value`
    #[must_use]
    pub fn literal_name(&self, value: i64) -> Option<&str> {
        self.literals
            .iter()
            .find(|(_, literal)| *literal == value)
            .map(|(name, _)| name.as_str())
    }

    /// The declared parameterless constructor, if any
    #[must_use]
    pub fn parameterless_constructor(&self) -> Option<MethodRc> {
        self.constructors
            .iter()
            .find(|(_, ctor)| ctor.params.is_empty())
            .map(|(_, ctor)| ctor.clone())
    }

    /// Find the first declared method named `name`
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<MethodRc> {
        self.methods
            .iter()
            .find(|(_, method)| method.name == name)
            .map(|(_, method)| method.clone())
    }

    /// Walks the base chain (excluding `self`)
    pub fn base_chain(&self) -> impl Iterator<Item = TypeRc> {
        let mut next = self.base();
        let mut depth = 0;
        std::iter::from_fn(move || {
            if depth >= MAX_INHERITANCE_DEPTH {
                return None;
            }
            depth += 1;

            let current = next.take()?;
            next = current.base();
            Some(current)
        })
    }

    /// Is `self` derived (directly or indirectly) from `base`
    #[must_use]
    pub fn is_subclass_of(&self, base: &TypeDescriptor) -> bool {
        self.base_chain().any(|ancestor| ancestor.token == base.token)
    }

    /// Does `self`, a base type or an inherited interface implement `iface`
    #[must_use]
    pub fn implements(&self, iface: &TypeDescriptor) -> bool {
        self.implements_inner(iface, 0)
            || self
                .base_chain()
                .any(|ancestor| ancestor.implements_inner(iface, 0))
    }

    fn implements_inner(&self, iface: &TypeDescriptor, depth: usize) -> bool {
        if depth >= MAX_INHERITANCE_DEPTH {
            return false;
        }

        self.interfaces.iter().any(|(_, entry)| match entry.upgrade() {
            Some(direct) => {
                direct.token == iface.token || direct.implements_inner(iface, depth + 1)
            }
            None => false,
        })
    }

    /// Can a value of type `other` be passed where `self` is declared
    #[must_use]
    pub fn is_assignable_from(&self, other: &TypeDescriptor) -> bool {
        if self.token == other.token {
            return true;
        }

        match &self.flavor {
            TypeFlavor::Primitive(PrimitiveKind::Object) => true,
            TypeFlavor::Primitive(PrimitiveKind::ValueType) => {
                other.is_value_type() && other.nullable_inner().is_none()
            }
            TypeFlavor::Primitive(PrimitiveKind::Enum) => other.is_enum(),
            TypeFlavor::Nullable(inner) => inner.token == other.token,
            TypeFlavor::Interface => other.implements(self),
            TypeFlavor::Class => other.is_subclass_of(self),
            // Primitives, structs and enums are sealed
            _ => false,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("token", &self.token)
            .field("fullname", &self.fullname())
            .field("flavor", &self.flavor)
            .field("flags", &self.flags)
            .field("module", &self.module())
            .field("constructors", &self.constructors.count())
            .field("methods", &self.methods.count())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname())
    }
}
