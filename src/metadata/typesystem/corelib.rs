//! The core library: built-in types, `Nullable<T>` interning and zero values.
//!
//! Every factory owns one [`CoreLibrary`]. Its module is always classified as a system
//! module and is the first module searched when resolving canonical names, so
//! `System.Int32` resolves without any configuration.

use std::sync::Arc;

use dashmap::DashMap;
use strum::IntoEnumIterator;

use crate::metadata::{
    identity::ModuleVersion,
    module::{ModuleBuilder, ModuleRc},
    token::Token,
    typesystem::{
        Instance, PrimitiveKind, TypeAttributes, TypeBuilder, TypeDescriptor, TypeFlavor, TypeRc,
        Value,
    },
};

/// Name of the module holding the built-in types
pub const CORE_LIBRARY_NAME: &str = "System.Private.CoreLib";

/// Built-in types of the runtime
pub struct CoreLibrary {
    module: ModuleRc,
    /// Indexed by `PrimitiveKind as usize`
    primitives: Vec<TypeRc>,
    /// Interned `Nullable<T>`, keyed by the token of `T`
    nullables: DashMap<Token, TypeRc>,
}

impl CoreLibrary {
    /// Create the core library with all primitive types
    #[must_use]
    pub fn new() -> Self {
        let primitives: Vec<TypeRc> = PrimitiveKind::iter().map(TypeBuilder::primitive).collect();

        let object = &primitives[PrimitiveKind::Object as usize];
        let value_type = &primitives[PrimitiveKind::ValueType as usize];
        for kind in PrimitiveKind::iter() {
            let ty = &primitives[kind as usize];
            match kind {
                PrimitiveKind::Object => {}
                PrimitiveKind::String | PrimitiveKind::ValueType => {
                    ty.set_base(object);
                }
                _ => {
                    ty.set_base(value_type);
                }
            }
        }

        let module = ModuleBuilder::new(CORE_LIBRARY_NAME)
            .version(ModuleVersion::new(4, 0, 0, 0))
            .add_all(&primitives)
            .build();

        CoreLibrary {
            module,
            primitives,
            nullables: DashMap::new(),
        }
    }

    /// The core library module
    #[must_use]
    pub fn module(&self) -> &ModuleRc {
        &self.module
    }

    /// The type of a primitive kind
    #[must_use]
    pub fn primitive(&self, kind: PrimitiveKind) -> TypeRc {
        self.primitives[kind as usize].clone()
    }

    /// `System.Object`
    #[must_use]
    pub fn object(&self) -> TypeRc {
        self.primitive(PrimitiveKind::Object)
    }

    /// `System.String`
    #[must_use]
    pub fn string(&self) -> TypeRc {
        self.primitive(PrimitiveKind::String)
    }

    /// `Nullable<T>` for a value type `T`.
    ///
    /// Nullable types are interned, so repeated calls return the same descriptor. The token
    /// derives from the token of `ty`, so independent core libraries agree on it. Returns
    /// `None` for reference types and for types that already are nullable.
    #[must_use]
    pub fn nullable_of(&self, ty: &TypeRc) -> Option<TypeRc> {
        if !ty.is_value_type() || ty.nullable_inner().is_some() {
            return None;
        }

        let entry = self.nullables.entry(ty.token).or_insert_with(|| {
            let nullable = Arc::new(TypeDescriptor::new(
                Token::nullable_of(ty.token),
                "System".to_string(),
                "Nullable`1".to_string(),
                TypeFlavor::Nullable(ty.clone()),
                TypeAttributes::PUBLIC | TypeAttributes::SEALED,
            ));
            nullable.set_base(&self.primitive(PrimitiveKind::ValueType));
            nullable.set_module(CORE_LIBRARY_NAME);
            nullable
        });
        Some(entry.value().clone())
    }

    /// The zero value of `ty`, used for default construction and for `null` arguments.
    ///
    /// - primitives use their fixed zero value (`""` for `String`)
    /// - enumerations are the value `0`
    /// - `Nullable<T>` is `null`
    /// - user defined structs use their zero hook, if any
    ///
    /// Reference types (other than `String`) have no zero value.
    #[must_use]
    pub fn zero_value(&self, ty: &TypeRc) -> Option<Value> {
        match &ty.flavor {
            TypeFlavor::Primitive(kind) => kind.zero_value(),
            TypeFlavor::Enum { .. } => Some(Value::Enum {
                ty: ty.clone(),
                value: 0,
            }),
            TypeFlavor::Nullable(_) => Some(Value::Null),
            TypeFlavor::Struct => ty.zero_hook().map(|zero| match zero() {
                Value::Native(payload) => Value::Object(Instance::new(ty.clone(), payload)),
                other => other,
            }),
            TypeFlavor::Class | TypeFlavor::Interface => None,
        }
    }

    /// The runtime type of `value`, `None` for null
    #[must_use]
    pub fn runtime_type(&self, value: &Value) -> Option<TypeRc> {
        match value {
            Value::Null => None,
            Value::Enum { ty, .. } => Some(ty.clone()),
            Value::Object(instance) => Some(instance.ty().clone()),
            Value::Native(_) => Some(self.object()),
            other => other.kind().map(|kind| self.primitive(kind)),
        }
    }
}

impl Default for CoreLibrary {
    fn default() -> Self {
        Self::new()
    }
}
