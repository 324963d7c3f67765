//! Runtime values passed into and returned from invokers.
//!
//! [`Value`] is the dynamically typed currency of the factory: constructor arguments,
//! member results and zero values are all values. Primitive kinds have dedicated
//! variants, user defined instances are carried as [`Instance`] (a type plus an opaque,
//! shared payload).
//!
//! Member bodies written in Rust typically return [`Value::Native`] and leave it to the
//! invoker to tag the payload with the declaring or return type of the member.

use std::{any::Any, fmt, sync::Arc};

use chrono::NaiveDateTime;

use crate::metadata::{
    token::Token,
    typesystem::{PrimitiveKind, TypeDescriptor, TypeFlavor, TypeRc},
};

/// Opaque payload of an [`Instance`]
pub type Payload = Arc<dyn Any + Send + Sync>;

/// An instance of a user defined type.
///
/// Instances are immutable and cheap to clone, clones share the payload.
#[derive(Clone)]
pub struct Instance {
    ty: TypeRc,
    payload: Payload,
}

impl Instance {
    /// Create an instance of `ty` holding `payload`
    pub fn new(ty: TypeRc, payload: Payload) -> Self {
        Instance { ty, payload }
    }

    /// Create an instance from any owned Rust value
    pub fn from_native<T: Any + Send + Sync>(ty: TypeRc, value: T) -> Self {
        Instance::new(ty, Arc::new(value))
    }

    /// The runtime type of this instance
    #[must_use]
    pub fn ty(&self) -> &TypeRc {
        &self.ty
    }

    /// The shared payload
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Borrow the payload as `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.ty.fullname())
            .field("payload", &Arc::as_ptr(&self.payload))
            .finish()
    }
}

/// A dynamically typed value.
#[derive(Clone)]
pub enum Value {
    /// The null reference
    Null,
    /// System.Boolean
    Boolean(bool),
    /// System.Char
    Char(char),
    /// System.SByte
    I1(i8),
    /// System.Byte
    U1(u8),
    /// System.Int16
    I2(i16),
    /// System.UInt16
    U2(u16),
    /// System.Int32
    I4(i32),
    /// System.UInt32
    U4(u32),
    /// System.Int64
    I8(i64),
    /// System.UInt64
    U8(u64),
    /// System.Single
    R4(f32),
    /// System.Double
    R8(f64),
    /// System.IntPtr
    I(isize),
    /// System.UIntPtr
    U(usize),
    /// System.String
    String(Arc<str>),
    /// System.DateTime
    DateTime(NaiveDateTime),
    /// A value of an enumeration type
    Enum {
        /// The enumeration type
        ty: TypeRc,
        /// Numeric value, widened to 64 bits
        value: i64,
    },
    /// A Rust value not yet associated with a type
    Native(Payload),
    /// An instance of a user defined type
    Object(Instance),
}

impl Value {
    /// Create a string value
    pub fn string(value: impl AsRef<str>) -> Self {
        Value::String(Arc::from(value.as_ref()))
    }

    /// Wrap an owned Rust value as an untyped native payload
    pub fn native<T: Any + Send + Sync>(value: T) -> Self {
        Value::Native(Arc::new(value))
    }

    /// Returns `true` for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The primitive kind of this value, if it is a primitive
    #[must_use]
    pub fn kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Value::Boolean(_) => PrimitiveKind::Boolean,
            Value::Char(_) => PrimitiveKind::Char,
            Value::I1(_) => PrimitiveKind::I1,
            Value::U1(_) => PrimitiveKind::U1,
            Value::I2(_) => PrimitiveKind::I2,
            Value::U2(_) => PrimitiveKind::U2,
            Value::I4(_) => PrimitiveKind::I4,
            Value::U4(_) => PrimitiveKind::U4,
            Value::I8(_) => PrimitiveKind::I8,
            Value::U8(_) => PrimitiveKind::U8,
            Value::R4(_) => PrimitiveKind::R4,
            Value::R8(_) => PrimitiveKind::R8,
            Value::I(_) => PrimitiveKind::I,
            Value::U(_) => PrimitiveKind::U,
            Value::String(_) => PrimitiveKind::String,
            Value::DateTime(_) => PrimitiveKind::DateTime,
            Value::Null | Value::Enum { .. } | Value::Native(_) | Value::Object(_) => return None,
        })
    }

    /// Token of the runtime type, `None` for null.
    ///
    /// Native payloads report `System.Object`.
    #[must_use]
    pub fn type_token(&self) -> Option<Token> {
        match self {
            Value::Null => None,
            Value::Enum { ty, .. } => Some(ty.token),
            Value::Object(instance) => Some(instance.ty.token),
            Value::Native(_) => Some(PrimitiveKind::Object.token()),
            other => other.kind().map(|kind| kind.token()),
        }
    }

    /// Is this value an instance of `ty` (including derived types and interfaces).
    ///
    /// `null` is an instance of nothing, callers decide whether the target accepts it.
    #[must_use]
    pub fn is_instance_of(&self, ty: &TypeDescriptor) -> bool {
        if let TypeFlavor::Nullable(inner) = &ty.flavor {
            return self.is_instance_of(inner);
        }

        match self {
            Value::Null => false,
            Value::Object(instance) => ty.is_assignable_from(&instance.ty),
            Value::Enum { ty: enum_ty, .. } => ty.is_assignable_from(enum_ty),
            Value::Native(_) => ty.is_primitive(PrimitiveKind::Object),
            other => match other.kind() {
                Some(kind) => match ty.primitive_kind() {
                    Some(PrimitiveKind::Object) => true,
                    Some(PrimitiveKind::ValueType) => kind.is_value_type(),
                    Some(target) => target == kind,
                    None => false,
                },
                None => false,
            },
        }
    }

    /// Borrow the instance, if this is an object
    #[must_use]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Borrow the payload of an object or native value as `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(instance) => instance.downcast_ref::<T>(),
            Value::Native(payload) => payload.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Borrow the string, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read a boolean
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Read any integral (or enum) value widened to `i128`
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::I1(v) => i128::from(*v),
            Value::U1(v) => i128::from(*v),
            Value::I2(v) => i128::from(*v),
            Value::U2(v) => i128::from(*v),
            Value::I4(v) => i128::from(*v),
            Value::U4(v) => i128::from(*v),
            Value::I8(v) => i128::from(*v),
            Value::U8(v) => i128::from(*v),
            Value::I(v) => *v as i128,
            Value::U(v) => *v as i128,
            Value::Enum { value, .. } => i128::from(*value),
            _ => return None,
        })
    }

    /// Read any integral value that fits into `i64`
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// Read any integral value that fits into `i32`
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        self.as_i128().and_then(|v| i32::try_from(v).ok())
    }

    /// Read a floating point or integral value as `f64`
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::R4(v) => Some(f64::from(*v)),
            Value::R8(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Read a date time
    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I1(a), Value::I1(b)) => a == b,
            (Value::U1(a), Value::U1(b)) => a == b,
            (Value::I2(a), Value::I2(b)) => a == b,
            (Value::U2(a), Value::U2(b)) => a == b,
            (Value::I4(a), Value::I4(b)) => a == b,
            (Value::U4(a), Value::U4(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::R4(a), Value::R4(b)) => a == b,
            (Value::R8(a), Value::R8(b)) => a == b,
            (Value::I(a), Value::I(b)) => a == b,
            (Value::U(a), Value::U(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Enum { ty: ta, value: va }, Value::Enum { ty: tb, value: vb }) => {
                ta.token == tb.token && va == vb
            }
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => {
                a.ty.token == b.ty.token && Arc::ptr_eq(&a.payload, &b.payload)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Enum { ty, value } => write!(f, "Enum({}, {value})", ty.fullname()),
            Value::Native(payload) => write!(f, "Native({:p})", Arc::as_ptr(payload)),
            Value::Object(instance) => write!(f, "{instance:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            Value::Char(v) => write!(f, "{v}"),
            Value::I1(v) => write!(f, "{v}"),
            Value::U1(v) => write!(f, "{v}"),
            Value::I2(v) => write!(f, "{v}"),
            Value::U2(v) => write!(f, "{v}"),
            Value::I4(v) => write!(f, "{v}"),
            Value::U4(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::R4(v) => write!(f, "{v}"),
            Value::R8(v) => write!(f, "{v}"),
            Value::I(v) => write!(f, "{v}"),
            Value::U(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Value::Enum { ty, value } => match ty.literal_name(*value) {
                Some(name) => write!(f, "{name}"),
                None => write!(f, "{value}"),
            },
            Value::Native(_) => write!(f, "<native>"),
            Value::Object(instance) => write!(f, "{}", instance.ty.fullname()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I4(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I8(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::U4(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::U8(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::R8(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::TypeBuilder;

    #[test]
    fn test_kind() {
        assert_eq!(Value::I4(1).kind(), Some(PrimitiveKind::I4));
        assert_eq!(Value::string("a").kind(), Some(PrimitiveKind::String));
        assert_eq!(Value::Null.kind(), None);
        assert_eq!(Value::native(5u8).kind(), None);
    }

    #[test]
    fn test_integral_accessors() {
        assert_eq!(Value::U8(u64::MAX).as_i64(), None);
        assert_eq!(Value::I2(-4).as_i64(), Some(-4));
        assert_eq!(Value::U1(200).as_i32(), Some(200));
        assert_eq!(Value::R8(1.5).as_i64(), None);
        assert_eq!(Value::I4(3).as_f64(), Some(3.0));
    }

    #[test]
    fn test_object_equality_is_identity() {
        let ty = TypeBuilder::class("Acme", "Widget").build();
        let a = Value::Object(Instance::from_native(ty.clone(), 1u32));
        let b = Value::Object(Instance::from_native(ty, 1u32));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<u32>(), Some(&1));
        assert_eq!(a.downcast_ref::<u64>(), None);
    }

    #[test]
    fn test_is_instance_of() {
        let base = TypeBuilder::class("Acme", "Base").build();
        let derived = TypeBuilder::class("Acme", "Derived").extends(&base).build();
        let value = Value::Object(Instance::from_native(derived.clone(), ()));

        assert!(value.is_instance_of(&base));
        assert!(value.is_instance_of(&derived));
        assert!(!Value::Null.is_instance_of(&base));
        assert!(!Value::I4(1).is_instance_of(&base));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Boolean(true).to_string(), "True");
        assert_eq!(Value::string("abc").to_string(), "abc");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
