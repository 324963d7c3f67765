use thiserror::Error;

use crate::metadata::typesystem::TypeRc;

macro_rules! conversion_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Conversion {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Conversion {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Resolution Errors
/// - [`Error::TypeNotFound`] - No type matches the requested name
/// - [`Error::InvalidTypeName`] - The requested name could not be parsed
/// - [`Error::ConstructorNotFound`] - No constructor accepts the argument signature
/// - [`Error::AmbiguousConstructor`] - Several constructors accept the signature and the
///   configured policy rejects first-fit selection
///
/// ## Invocation Errors
/// - [`Error::Conversion`] - An argument could not be converted to a declared parameter type
/// - [`Error::ArgumentCount`] - Wrong number of arguments supplied to an invoker
/// - [`Error::MissingInstance`] - Instance method invoked without a target
/// - [`Error::Invocation`] - A member body reported a failure
///
/// ## Module Errors
/// - [`Error::ModuleNotFound`] - The loader does not know the module
/// - [`Error::ModuleLoad`] - The loader failed while producing the module
/// - [`Error::PartialTypeLoad`] - Some types of a module could not be enumerated
///
/// ## Configuration Errors
/// - [`Error::Config`] - Invalid TOML configuration
/// - [`Error::FileError`] - Configuration file could not be read
///
/// # Examples
///
/// ```rust
/// use typefactory::{Error, Factory, FactoryConfig};
///
/// let factory = Factory::new(FactoryConfig::default());
/// match factory.get_type("Acme.DoesNotExist") {
///     Ok(ty) => println!("found {}", ty.fullname()),
///     Err(Error::TypeNotFound(name)) => println!("no such type: {}", name),
///     Err(e) => println!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Resolution errors
    /// No type could be resolved for the given name.
    #[error("Type not found - {0}")]
    TypeNotFound(String),

    /// The type name is syntactically invalid.
    ///
    /// Raised for empty names and for qualified names with an empty type part.
    #[error("Invalid type name - '{0}'")]
    InvalidTypeName(String),

    /// No constructor of the type accepts the supplied argument signature.
    #[error("No constructor of {type_name} accepts ({signature})")]
    ConstructorNotFound {
        /// Full name of the type that was searched
        type_name: String,
        /// Rendered argument signature, `null` marks unknown slots
        signature: String,
    },

    /// More than one constructor accepts the supplied argument signature.
    ///
    /// Only raised when the factory is configured with
    /// [`crate::config::AmbiguityPolicy::Reject`].
    #[error("Ambiguous constructor for {type_name}({signature}) - candidates: {candidates:?}")]
    AmbiguousConstructor {
        /// Full name of the type that was searched
        type_name: String,
        /// Rendered argument signature, `null` marks unknown slots
        signature: String,
        /// Rendered signatures of every accepting constructor, in declaration order
        candidates: Vec<String>,
    },

    // Invocation errors
    /// An argument could not be converted to the declared parameter type.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the failed conversion
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Conversion - {file}:{line}: {message}")]
    Conversion {
        /// The message to be printed for the Conversion error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An invoker was called with the wrong number of arguments.
    #[error("{member} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        /// Rendered member signature
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// An instance method was invoked without a target instance.
    #[error("Instance method {0} requires a target instance")]
    MissingInstance(String),

    /// A member body failed.
    #[error("{0}")]
    Invocation(String),

    // Module errors
    /// A module display name could not be parsed.
    #[error("Invalid module identity - {0}")]
    InvalidModuleIdentity(String),

    /// The module loader does not know a module with this name.
    #[error("Module not found - {0}")]
    ModuleNotFound(String),

    /// The module loader failed to produce the module.
    #[error("Failed to load module {name}: {message}")]
    ModuleLoad {
        /// Requested module name
        name: String,
        /// Loader supplied reason
        message: String,
    },

    /// Type enumeration of a module only partially succeeded.
    ///
    /// `loaded` carries every type that could be enumerated, so callers can
    /// keep working with the healthy part of the module.
    #[error("Module {module} failed to load {} type(s): {failures:?}", .failures.len())]
    PartialTypeLoad {
        /// Name of the module being enumerated
        module: String,
        /// Types that loaded successfully, in declaration order
        loaded: Vec<TypeRc>,
        /// Names of types that failed, with their reasons
        failures: Vec<String>,
    },

    // Configuration errors
    /// The configuration could not be parsed.
    #[error("{0}")]
    Config(#[from] toml::de::Error),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
