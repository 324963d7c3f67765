//! Builder for user defined type descriptors.
//!
//! [`TypeBuilder`] offers a fluent API for declaring classes, structs, interfaces and
//! enumerations together with their inheritance edges and conversion hooks. Members are
//! attached afterwards with [`crate::metadata::method::MethodBuilder`], because
//! constructors commonly reference their own declaring type.
//!
//! # Example
//!
//! ```rust
//! use typefactory::metadata::typesystem::{PrimitiveKind, TypeBuilder, Value};
//!
//! let currency = TypeBuilder::enumeration("Acme.Billing", "Currency", PrimitiveKind::I4)
//!     .literal("Eur", 0)
//!     .literal("Usd", 1)
//!     .build();
//!
//! let money = TypeBuilder::structure("Acme.Billing", "Money")
//!     .zero(|| Value::I8(0))
//!     .build();
//!
//! assert!(currency.is_enum());
//! assert!(money.is_value_type());
//! ```

use std::sync::Arc;

use crate::{
    metadata::{
        token::{Token, TokenTable},
        typesystem::{
            FromValueFn, PrimitiveKind, TypeAttributes, TypeDescriptor, TypeFlavor, TypeRc,
            Value, ZeroFn,
        },
    },
    Result,
};

/// Provides a fluent API for building type descriptors
pub struct TypeBuilder {
    namespace: String,
    name: String,
    flavor: TypeFlavor,
    flags: TypeAttributes,
    base: Option<TypeRc>,
    interfaces: Vec<TypeRc>,
    literals: Vec<(String, i64)>,
    zero: Option<ZeroFn>,
    from_value: Option<FromValueFn>,
}

impl TypeBuilder {
    fn new(namespace: &str, name: &str, flavor: TypeFlavor, flags: TypeAttributes) -> Self {
        TypeBuilder {
            namespace: namespace.to_string(),
            name: name.to_string(),
            flavor,
            flags: flags | TypeAttributes::PUBLIC,
            base: None,
            interfaces: Vec::new(),
            literals: Vec::new(),
            zero: None,
            from_value: None,
        }
    }

    /// Start building a class (reference type)
    ///
    /// ## Arguments
    /// * 'namespace' - The namespace of the class, can be empty
    /// * 'name'      - The simple name of the class
    #[must_use]
    pub fn class(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, TypeFlavor::Class, TypeAttributes::empty())
    }

    /// Start building a struct (value type)
    ///
    /// ## Arguments
    /// * 'namespace' - The namespace of the struct, can be empty
    /// * 'name'      - The simple name of the struct
    #[must_use]
    pub fn structure(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, TypeFlavor::Struct, TypeAttributes::SEALED)
    }

    /// Start building an interface
    ///
    /// ## Arguments
    /// * 'namespace' - The namespace of the interface, can be empty
    /// * 'name'      - The simple name of the interface
    #[must_use]
    pub fn interface(namespace: &str, name: &str) -> Self {
        Self::new(
            namespace,
            name,
            TypeFlavor::Interface,
            TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
        )
    }

    /// Start building an enumeration
    ///
    /// Underlying kinds that are not integral fall back to `Int32`.
    ///
    /// ## Arguments
    /// * 'namespace'  - The namespace of the enumeration, can be empty
    /// * 'name'       - The simple name of the enumeration
    /// * 'underlying' - The underlying integral type
    #[must_use]
    pub fn enumeration(namespace: &str, name: &str, underlying: PrimitiveKind) -> Self {
        let underlying = if underlying.is_enum_underlying() {
            underlying
        } else {
            tracing::warn!(
                enumeration = name,
                underlying = underlying.name(),
                "invalid enum underlying type, using Int32"
            );
            PrimitiveKind::I4
        };

        Self::new(
            namespace,
            name,
            TypeFlavor::Enum { underlying },
            TypeAttributes::SEALED,
        )
    }

    pub(crate) fn primitive(kind: PrimitiveKind) -> TypeRc {
        let flags = match kind {
            PrimitiveKind::ValueType | PrimitiveKind::Enum => TypeAttributes::ABSTRACT,
            PrimitiveKind::Object => TypeAttributes::empty(),
            _ => TypeAttributes::SEALED,
        };

        Arc::new(TypeDescriptor::new(
            kind.token(),
            kind.namespace().to_string(),
            kind.name().to_string(),
            TypeFlavor::Primitive(kind),
            flags | TypeAttributes::PUBLIC,
        ))
    }

    /// Mark the type abstract
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.flags |= TypeAttributes::ABSTRACT;
        self
    }

    /// Mark the type sealed
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.flags |= TypeAttributes::SEALED;
        self
    }

    /// Mark the type internal (not public)
    #[must_use]
    pub fn internal(mut self) -> Self {
        self.flags.remove(TypeAttributes::PUBLIC);
        self
    }

    /// Set the base type
    ///
    /// ## Arguments
    /// * 'base' - The type to derive from
    #[must_use]
    pub fn extends(mut self, base: &TypeRc) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add an implemented interface
    ///
    /// ## Arguments
    /// * 'iface' - The interface this type implements
    #[must_use]
    pub fn implements(mut self, iface: &TypeRc) -> Self {
        self.interfaces.push(iface.clone());
        self
    }

    /// Add an enumeration literal
    ///
    /// ## Arguments
    /// * 'name'  - Name of the literal
    /// * 'value' - Numeric value of the literal
    #[must_use]
    pub fn literal(mut self, name: &str, value: i64) -> Self {
        self.literals.push((name.to_string(), value));
        self
    }

    /// Provide the zero value of a user defined value type.
    ///
    /// The hook runs for every default construction, so it should hand out fresh payloads.
    #[must_use]
    pub fn zero<F>(mut self, zero: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.zero = Some(Arc::new(zero));
        self
    }

    /// Provide a custom conversion used when an argument of a foreign type is passed to a
    /// parameter of this type.
    #[must_use]
    pub fn from_value<F>(mut self, convert: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.from_value = Some(Arc::new(convert));
        self
    }

    /// Build the type
    #[must_use]
    pub fn build(self) -> TypeRc {
        let descriptor = TypeDescriptor::new(
            Token::allocate(TokenTable::TYPE),
            self.namespace,
            self.name,
            self.flavor,
            self.flags,
        )
        .with_hooks(self.literals, self.zero, self.from_value);

        if let Some(base) = &self.base {
            descriptor.set_base(base);
        }
        for iface in &self.interfaces {
            descriptor.add_interface(iface);
        }

        Arc::new(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let class = TypeBuilder::class("Acme", "Thing").build();
        assert!(class.flags.contains(TypeAttributes::PUBLIC));
        assert!(!class.is_abstract());

        let hidden = TypeBuilder::class("Acme", "Hidden").internal().sealed().build();
        assert!(!hidden.flags.contains(TypeAttributes::PUBLIC));
        assert!(hidden.flags.contains(TypeAttributes::SEALED));

        let iface = TypeBuilder::interface("Acme", "IThing").build();
        assert!(iface.flags.contains(TypeAttributes::INTERFACE));
    }

    #[test]
    fn test_tokens_unique() {
        let a = TypeBuilder::class("Acme", "Same").build();
        let b = TypeBuilder::class("Acme", "Same").build();
        assert_ne!(a.token, b.token);
        assert_eq!(a.token.table(), TokenTable::TYPE);
    }

    #[test]
    fn test_invalid_enum_underlying() {
        let ty = TypeBuilder::enumeration("Acme", "Odd", PrimitiveKind::R8).build();
        assert!(matches!(
            ty.flavor,
            TypeFlavor::Enum {
                underlying: PrimitiveKind::I4
            }
        ));
    }

    #[test]
    fn test_hooks() {
        let ty = TypeBuilder::structure("Acme", "Meters")
            .zero(|| Value::R8(0.0))
            .from_value(|value| Ok(Value::R8(value.as_f64().unwrap_or_default())))
            .build();

        assert_eq!((ty.zero_hook().unwrap())(), Value::R8(0.0));
        assert_eq!(
            (ty.from_value_hook().unwrap())(&Value::I4(3)).unwrap(),
            Value::R8(3.0)
        );
    }

    #[test]
    fn test_primitive() {
        let int = TypeBuilder::primitive(PrimitiveKind::I4);
        assert_eq!(int.token, PrimitiveKind::I4.token());
        assert_eq!(int.fullname(), "System.Int32");
        assert!(int.is_value_type());

        let value_type = TypeBuilder::primitive(PrimitiveKind::ValueType);
        assert!(value_type.is_abstract());
        assert!(value_type.is_assignable_from(&int));
    }
}
