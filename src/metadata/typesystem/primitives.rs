use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::metadata::{token::Token, typesystem::Value};

/// Built-in language keywords and the primitive each one names.
///
/// These seed the synonym table. Keys are matched case-insensitively.
pub const BUILTIN_ALIASES: &[(&str, PrimitiveKind)] = &[
    ("void", PrimitiveKind::Void),
    ("bool", PrimitiveKind::Boolean),
    ("char", PrimitiveKind::Char),
    ("sbyte", PrimitiveKind::I1),
    ("byte", PrimitiveKind::U1),
    ("short", PrimitiveKind::I2),
    ("ushort", PrimitiveKind::U2),
    ("int", PrimitiveKind::I4),
    ("uint", PrimitiveKind::U4),
    ("long", PrimitiveKind::I8),
    ("ulong", PrimitiveKind::U8),
    ("float", PrimitiveKind::R4),
    ("double", PrimitiveKind::R8),
    ("nint", PrimitiveKind::I),
    ("nuint", PrimitiveKind::U),
    ("object", PrimitiveKind::Object),
    ("string", PrimitiveKind::String),
];

/// Represents all built-in types of the core library
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCount)]
pub enum PrimitiveKind {
    /// System.Void - represents no value
    Void,
    /// System.Boolean - true/false value
    Boolean,
    /// System.Char - Unicode character
    Char,
    /// System.SByte - signed 8-bit integer
    I1,
    /// System.Byte - unsigned 8-bit integer
    U1,
    /// System.Int16 - signed 16-bit integer
    I2,
    /// System.UInt16 - unsigned 16-bit integer
    U2,
    /// System.Int32 - signed 32-bit integer
    I4,
    /// System.UInt32 - unsigned 32-bit integer
    U4,
    /// System.Int64 - signed 64-bit integer
    I8,
    /// System.UInt64 - unsigned 64-bit integer
    U8,
    /// System.Single - 32-bit floating point
    R4,
    /// System.Double - 64-bit floating point
    R8,
    /// System.IntPtr - native sized signed integer
    I,
    /// System.UIntPtr - native sized unsigned integer
    U,
    /// System.Object - base class for all types
    Object,
    /// System.String - immutable string of Unicode characters
    String,
    /// System.DateTime - date and time without offset
    DateTime,
    /// System.ValueType - abstract base class of value types
    ValueType,
    /// System.Enum - abstract base class of enumerations
    Enum,
}

impl PrimitiveKind {
    /// Get the fixed token for this type
    #[must_use]
    pub fn token(&self) -> Token {
        Token::new(match self {
            PrimitiveKind::Void => 0xF000_0001,
            PrimitiveKind::Boolean => 0xF000_0002,
            PrimitiveKind::Char => 0xF000_0003,
            PrimitiveKind::I1 => 0xF000_0004,
            PrimitiveKind::U1 => 0xF000_0005,
            PrimitiveKind::I2 => 0xF000_0006,
            PrimitiveKind::U2 => 0xF000_0007,
            PrimitiveKind::I4 => 0xF000_0008,
            PrimitiveKind::U4 => 0xF000_0009,
            PrimitiveKind::I8 => 0xF000_000A,
            PrimitiveKind::U8 => 0xF000_000B,
            PrimitiveKind::R4 => 0xF000_000C,
            PrimitiveKind::R8 => 0xF000_000D,
            PrimitiveKind::I => 0xF000_000E,
            PrimitiveKind::U => 0xF000_000F,
            PrimitiveKind::Object => 0xF000_0010,
            PrimitiveKind::String => 0xF000_0011,
            PrimitiveKind::DateTime => 0xF000_0012,
            PrimitiveKind::ValueType => 0xF000_0013,
            PrimitiveKind::Enum => 0xF000_0014,
        })
    }

    /// Get the short name (without namespace)
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Void => "Void",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::I1 => "SByte",
            PrimitiveKind::U1 => "Byte",
            PrimitiveKind::I2 => "Int16",
            PrimitiveKind::U2 => "UInt16",
            PrimitiveKind::I4 => "Int32",
            PrimitiveKind::U4 => "UInt32",
            PrimitiveKind::I8 => "Int64",
            PrimitiveKind::U8 => "UInt64",
            PrimitiveKind::R4 => "Single",
            PrimitiveKind::R8 => "Double",
            PrimitiveKind::I => "IntPtr",
            PrimitiveKind::U => "UIntPtr",
            PrimitiveKind::Object => "Object",
            PrimitiveKind::String => "String",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::ValueType => "ValueType",
            PrimitiveKind::Enum => "Enum",
        }
    }

    /// Get the namespace of this type
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        "System"
    }

    /// Get the full type name (with namespace)
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace(), self.name())
    }

    /// Is this a value type
    ///
    /// `System.ValueType` and `System.Enum` are abstract reference types themselves, only
    /// their derivations are value types.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Boolean
                | PrimitiveKind::Char
                | PrimitiveKind::I1
                | PrimitiveKind::U1
                | PrimitiveKind::I2
                | PrimitiveKind::U2
                | PrimitiveKind::I4
                | PrimitiveKind::U4
                | PrimitiveKind::I8
                | PrimitiveKind::U8
                | PrimitiveKind::R4
                | PrimitiveKind::R8
                | PrimitiveKind::I
                | PrimitiveKind::U
                | PrimitiveKind::DateTime
        )
    }

    /// Is this a reference type
    #[must_use]
    pub fn is_reference_type(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Object
                | PrimitiveKind::String
                | PrimitiveKind::ValueType
                | PrimitiveKind::Enum
        )
    }

    /// Is this an integral type (including native sized integers)
    #[must_use]
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::I1
                | PrimitiveKind::U1
                | PrimitiveKind::I2
                | PrimitiveKind::U2
                | PrimitiveKind::I4
                | PrimitiveKind::U4
                | PrimitiveKind::I8
                | PrimitiveKind::U8
                | PrimitiveKind::I
                | PrimitiveKind::U
        )
    }

    /// Is this a floating point type
    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveKind::R4 | PrimitiveKind::R8)
    }

    /// Can values be converted to this kind through the conversion table
    #[must_use]
    pub fn is_convertible(&self) -> bool {
        self.is_value_type() || *self == PrimitiveKind::String
    }

    /// Valid underlying type of an enumeration
    #[must_use]
    pub fn is_enum_underlying(&self) -> bool {
        self.is_integral() && !matches!(self, PrimitiveKind::I | PrimitiveKind::U)
    }

    /// The zero value of this kind, used when a `null` reaches a parameter of this type.
    ///
    /// Reference kinds other than `String` have no zero value. `String` maps to the empty
    /// string.
    #[must_use]
    pub fn zero_value(&self) -> Option<Value> {
        match self {
            PrimitiveKind::Boolean => Some(Value::Boolean(false)),
            PrimitiveKind::Char => Some(Value::Char('\0')),
            PrimitiveKind::I1 => Some(Value::I1(0)),
            PrimitiveKind::U1 => Some(Value::U1(0)),
            PrimitiveKind::I2 => Some(Value::I2(0)),
            PrimitiveKind::U2 => Some(Value::U2(0)),
            PrimitiveKind::I4 => Some(Value::I4(0)),
            PrimitiveKind::U4 => Some(Value::U4(0)),
            PrimitiveKind::I8 => Some(Value::I8(0)),
            PrimitiveKind::U8 => Some(Value::U8(0)),
            PrimitiveKind::R4 => Some(Value::R4(0.0)),
            PrimitiveKind::R8 => Some(Value::R8(0.0)),
            PrimitiveKind::I => Some(Value::I(0)),
            PrimitiveKind::U => Some(Value::U(0)),
            PrimitiveKind::String => Some(Value::string("")),
            PrimitiveKind::DateTime => Some(Value::DateTime(chrono::NaiveDateTime::default())),
            PrimitiveKind::Void
            | PrimitiveKind::Object
            | PrimitiveKind::ValueType
            | PrimitiveKind::Enum => None,
        }
    }

    /// Look up a built-in keyword (case-insensitive)
    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        BUILTIN_ALIASES
            .iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(alias))
            .map(|(_, kind)| *kind)
    }

    /// Look up a primitive by its token
    #[must_use]
    pub fn from_token(token: Token) -> Option<Self> {
        PrimitiveKind::iter().find(|kind| kind.token() == token)
    }
}
