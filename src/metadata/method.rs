//! Constructors and methods of type descriptors.
//!
//! A [`MethodDescriptor`] couples a declared signature (parameter names and types, return
//! type, static or instance) with a [`MethodBody`], the Rust closure that implements the
//! member. Bodies receive arguments that were already converted to the declared parameter
//! types by the invoker, so they can read them with the typed accessors of
//! [`Value`] without further checks.
//!
//! # Example
//!
//! ```rust
//! use typefactory::metadata::{
//!     method::MethodBuilder,
//!     typesystem::{CoreLibrary, PrimitiveKind, TypeBuilder, Value},
//! };
//!
//! let core = CoreLibrary::new();
//! let meters = TypeBuilder::class("Acme.Units", "Meters").build();
//!
//! let ctor = MethodBuilder::constructor()
//!     .param("value", &core.primitive(PrimitiveKind::R8))
//!     .body(|_, args| Ok(Value::native(args[0].as_f64().unwrap_or_default())))
//!     .attach(&meters);
//!
//! assert_eq!(ctor.signature(), "Acme.Units.Meters(System.Double)");
//! assert_eq!(meters.constructors.count(), 1);
//! ```

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use crate::{
    metadata::{
        token::{Token, TokenTable},
        typesystem::{TypeRc, TypeRef, Value},
    },
    Error, Result,
};

/// Reference to a `MethodDescriptor`
pub type MethodRc = Arc<MethodDescriptor>;

/// Implementation of a member.
///
/// Receives the target instance (`None` for constructors and static methods) and the
/// converted arguments. Constructors return the new instance, typically as
/// [`Value::Native`], which the invoker tags with the declaring type.
pub type MethodBody = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync>;

/// What kind of member a method is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Instance constructor
    Constructor,
    /// Instance method, requires a target
    Instance,
    /// Static method
    Static,
}

/// A declared parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    ty: TypeRef,
}

impl Parameter {
    /// The declared type of this parameter
    #[must_use]
    pub fn ty(&self) -> Option<TypeRc> {
        self.ty.upgrade()
    }
}

/// A constructor or method
pub struct MethodDescriptor {
    /// Token
    pub token: Token,
    /// Member name (`.ctor` for constructors)
    pub name: String,
    /// Constructor, instance or static method
    pub kind: MethodKind,
    /// Declared parameters, in order
    pub params: Vec<Parameter>,
    returns: Option<TypeRef>,
    declaring: OnceLock<TypeRef>,
    body: MethodBody,
}

impl MethodDescriptor {
    /// The type that declares this member
    #[must_use]
    pub fn declaring_type(&self) -> Option<TypeRc> {
        self.declaring.get().and_then(TypeRef::upgrade)
    }

    /// The declared return type, `None` for constructors and `void` methods
    #[must_use]
    pub fn return_type(&self) -> Option<TypeRc> {
        self.returns.as_ref().and_then(TypeRef::upgrade)
    }

    /// Is this a constructor
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    /// Is this a static method
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.kind == MethodKind::Static
    }

    /// Resolve all parameter types.
    ///
    /// # Errors
    /// Returns [`Error::Invocation`] if a parameter type has been dropped.
    pub fn param_types(&self) -> Result<Vec<TypeRc>> {
        self.params
            .iter()
            .map(|param| {
                param.ty().ok_or_else(|| {
                    Error::Invocation(format!(
                        "parameter '{}' of {} references a dropped type",
                        param.name, self.name
                    ))
                })
            })
            .collect()
    }

    /// Run the body directly, without argument conversion
    ///
    /// # Errors
    /// Returns whatever the body reports.
    pub fn call(&self, instance: Option<&Value>, args: &[Value]) -> Result<Value> {
        (self.body)(instance, args)
    }

    /// Rendered signature, e.g. `Acme.Money(System.Int64, Acme.Currency)`
    #[must_use]
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|param| match param.ty() {
                Some(ty) => ty.fullname(),
                None => "?".to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let owner = self
            .declaring_type()
            .map_or_else(|| "?".to_string(), |ty| ty.fullname());

        if self.is_constructor() {
            format!("{owner}({params})")
        } else {
            format!("{owner}.{}({params})", self.name)
        }
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("token", &self.token)
            .field("signature", &self.signature())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Provides a fluent API for declaring members and attaching them to their type
pub struct MethodBuilder {
    name: String,
    kind: MethodKind,
    params: Vec<Parameter>,
    returns: Option<TypeRef>,
    body: Option<MethodBody>,
}

impl MethodBuilder {
    /// Start building a constructor
    #[must_use]
    pub fn constructor() -> Self {
        MethodBuilder {
            name: ".ctor".to_string(),
            kind: MethodKind::Constructor,
            params: Vec::new(),
            returns: None,
            body: None,
        }
    }

    /// Start building an instance method
    ///
    /// ## Arguments
    /// * 'name' - The method name
    #[must_use]
    pub fn method(name: &str) -> Self {
        MethodBuilder {
            name: name.to_string(),
            kind: MethodKind::Instance,
            ..Self::constructor()
        }
    }

    /// Start building a static method
    ///
    /// ## Arguments
    /// * 'name' - The method name
    #[must_use]
    pub fn static_method(name: &str) -> Self {
        MethodBuilder {
            kind: MethodKind::Static,
            ..Self::method(name)
        }
    }

    /// Append a parameter
    ///
    /// ## Arguments
    /// * 'name' - The parameter name
    /// * 'ty'   - The declared parameter type, may be the declaring type itself
    #[must_use]
    pub fn param(mut self, name: &str, ty: &TypeRc) -> Self {
        self.params.push(Parameter {
            name: name.to_string(),
            ty: TypeRef::new(ty),
        });
        self
    }

    /// Set the return type
    #[must_use]
    pub fn returns(mut self, ty: &TypeRc) -> Self {
        self.returns = Some(TypeRef::new(ty));
        self
    }

    /// Set the implementation
    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Build the member and append it to `owner`.
    ///
    /// A member without a body fails every invocation with [`Error::Invocation`].
    pub fn attach(self, owner: &TypeRc) -> MethodRc {
        let name = self.name;
        let body: MethodBody = match self.body {
            Some(body) => body,
            None => {
                let member = format!("{}.{}", owner.fullname(), name);
                Arc::new(move |_: Option<&Value>, _: &[Value]| {
                    Err(Error::Invocation(format!("{member} has no body")))
                })
            }
        };

        let method = Arc::new(MethodDescriptor {
            token: Token::allocate(TokenTable::METHOD),
            name,
            kind: self.kind,
            params: self.params,
            returns: self.returns,
            declaring: OnceLock::from(TypeRef::new(owner)),
            body,
        });

        match method.kind {
            MethodKind::Constructor => owner.constructors.push(method.clone()),
            MethodKind::Instance | MethodKind::Static => owner.methods.push(method.clone()),
        };
        method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{CoreLibrary, PrimitiveKind, TypeBuilder};

    #[test]
    fn test_self_referencing_constructor() {
        let money = TypeBuilder::structure("Acme", "Money").build();
        let copy = MethodBuilder::constructor()
            .param("other", &money)
            .body(|_, args| Ok(args[0].clone()))
            .attach(&money);

        assert_eq!(copy.param_types().unwrap()[0].token, money.token);
        assert_eq!(copy.declaring_type().unwrap().token, money.token);
        assert_eq!(copy.signature(), "Acme.Money(Acme.Money)");
    }

    #[test]
    fn test_methods_and_kinds() {
        let core = CoreLibrary::new();
        let counter = TypeBuilder::class("Acme", "Counter").build();

        let next = MethodBuilder::method("Next")
            .returns(&core.primitive(PrimitiveKind::I4))
            .attach(&counter);
        let parse = MethodBuilder::static_method("Parse")
            .param("text", &core.string())
            .attach(&counter);

        assert_eq!(counter.methods.count(), 2);
        assert_eq!(counter.constructors.count(), 0);
        assert!(!next.is_static());
        assert!(parse.is_static());
        assert_eq!(next.signature(), "Acme.Counter.Next()");
        assert_eq!(
            next.return_type().unwrap().token,
            PrimitiveKind::I4.token()
        );
        assert!(counter.find_method("Parse").is_some());
    }

    #[test]
    fn test_missing_body() {
        let ty = TypeBuilder::class("Acme", "Empty").build();
        let ctor = MethodBuilder::constructor().attach(&ty);
        assert!(matches!(ctor.call(None, &[]), Err(Error::Invocation(_))));
    }
}
