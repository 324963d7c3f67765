use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identity of a module, type or member in the descriptor registry.
///
/// Tokens use the metadata layout: the high byte (bits 24-31) names the table,
/// the low 24 bits (bits 0-23) are the row within that table. Tokens are the keys of
/// every cache in the factory, so two descriptors are the same entity exactly when
/// their tokens are equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

/// Table bytes used for token allocation
pub struct TokenTable;

impl TokenTable {
    /// Loaded modules
    pub const MODULE: u8 = 0x00;
    /// Declared types (classes, structs, interfaces, enums)
    pub const TYPE: u8 = 0x02;
    /// Constructors and methods
    pub const METHOD: u8 = 0x06;
    /// Constructed `Nullable<T>` over a declared type, row of `T`
    pub const NULLABLE: u8 = 0x1B;
    /// Built-in primitive types (artificial)
    pub const PRIMITIVE: u8 = 0xF0;
    /// Constructed `Nullable<T>` over a primitive, row of `T` (artificial)
    pub const NULLABLE_PRIMITIVE: u8 = 0xF1;
}

static NEXT_MODULE_ROW: AtomicU32 = AtomicU32::new(1);
static NEXT_TYPE_ROW: AtomicU32 = AtomicU32::new(1);
static NEXT_METHOD_ROW: AtomicU32 = AtomicU32::new(1);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table byte and a row
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token(u32::from(table) << 24 | (row & 0x00FF_FFFF))
    }

    /// Allocates the next free token of `table`.
    ///
    /// Allocation is process wide, so descriptors built by independent factories never
    /// collide. Primitive tokens are fixed and never allocated.
    #[must_use]
    pub fn allocate(table: u8) -> Self {
        let counter = match table {
            TokenTable::MODULE => &NEXT_MODULE_ROW,
            TokenTable::METHOD => &NEXT_METHOD_ROW,
            _ => &NEXT_TYPE_ROW,
        };

        let row = counter.fetch_add(1, Ordering::Relaxed);
        debug_assert!(row <= 0x00FF_FFFF, "token rows exhausted for table {table:#04x}");
        Token::from_parts(table, row)
    }

    /// The token of `Nullable<T>` for a value type with token `inner`.
    ///
    /// Derived from the inner token, so every core library agrees on it.
    #[must_use]
    pub fn nullable_of(inner: Token) -> Self {
        let table = if inner.table() == TokenTable::PRIMITIVE {
            TokenTable::NULLABLE_PRIMITIVE
        } else {
            TokenTable::NULLABLE
        };
        Token::from_parts(table, inner.row())
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
