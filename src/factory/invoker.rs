//! Compiled invokers.
//!
//! An invoker is built once per member (or per type, for default construction) and then
//! called any number of times. Building it resolves every parameter type into a
//! [`ParamConversion`] plan, so invocation is a straight walk over the arguments with no
//! further lookups.
//!
//! For each argument the plan applies, in order:
//!
//! 1. **Null guard** - `null` becomes the zero value for value-typed and `String`
//!    parameters, and stays `null` for reference and `Nullable<T>` parameters.
//! 2. **Pass-through** - values whose runtime type the parameter already accepts.
//! 3. **Conversion** - primitives through the conversion table, enumerations by value or
//!    literal name, types with a custom conversion hook through the hook.
//!
//! Results of constructors and methods are boxed: a [`Value::Native`] returned by a body
//! is tagged with the declaring type (constructors) or the declared return type.

use std::fmt;

use crate::{
    metadata::{
        method::MethodRc,
        typesystem::{
            convert::{convert, convert_enum},
            CoreLibrary, FromValueFn, Instance, PrimitiveKind, TypeFlavor, TypeRc, Value,
            ZeroFn,
        },
    },
    Error, Result,
};

/// How one argument is brought into the declared parameter type
#[derive(Clone)]
pub(crate) enum ParamConversion {
    /// Any value, including `null` (`System.Object`)
    Any,
    /// A primitive kind, through the conversion table
    Primitive {
        kind: PrimitiveKind,
        zero: Option<Value>,
    },
    /// An enumeration, by value or literal name
    Enum(TypeRc),
    /// A type with a custom conversion hook
    Custom {
        ty: TypeRc,
        hook: FromValueFn,
        zero: Option<Value>,
    },
    /// `Nullable<T>`: `null` stays `null`, anything else converts like `T`
    Nullable(Box<ParamConversion>),
    /// Must be an instance of the type; `null` is replaced by `zero` if present
    Instance { ty: TypeRc, zero: Option<Value> },
}

impl ParamConversion {
    /// Build the plan for a parameter of type `ty`
    pub(crate) fn plan(ty: &TypeRc, core: &CoreLibrary) -> Self {
        let zero = core.zero_value(ty);

        if let Some(hook) = ty.from_value_hook() {
            return ParamConversion::Custom {
                ty: ty.clone(),
                hook: hook.clone(),
                zero,
            };
        }

        match &ty.flavor {
            TypeFlavor::Primitive(PrimitiveKind::Object) => ParamConversion::Any,
            TypeFlavor::Primitive(kind) if kind.is_convertible() => ParamConversion::Primitive {
                kind: *kind,
                zero,
            },
            TypeFlavor::Enum { .. } => ParamConversion::Enum(ty.clone()),
            TypeFlavor::Nullable(inner) => {
                ParamConversion::Nullable(Box::new(ParamConversion::plan(inner, core)))
            }
            _ => ParamConversion::Instance {
                ty: ty.clone(),
                zero,
            },
        }
    }

    /// Bring `arg` into the parameter type
    pub(crate) fn apply(&self, arg: &Value) -> Result<Value> {
        match self {
            ParamConversion::Any => Ok(arg.clone()),
            ParamConversion::Primitive { kind, zero } => match (arg, zero) {
                (Value::Null, Some(zero)) => Ok(zero.clone()),
                (Value::Null, None) => Ok(Value::Null),
                _ => convert(arg, *kind),
            },
            ParamConversion::Enum(ty) => match arg {
                Value::Null => Ok(Value::Enum {
                    ty: ty.clone(),
                    value: 0,
                }),
                _ => convert_enum(arg, ty),
            },
            ParamConversion::Custom { ty, hook, zero } => match (arg, zero) {
                (Value::Null, Some(zero)) => Ok(zero.clone()),
                (Value::Null, None) => Ok(Value::Null),
                _ if arg.is_instance_of(ty) => Ok(arg.clone()),
                _ => box_native(hook(arg)?, ty),
            },
            ParamConversion::Nullable(inner) => match arg {
                Value::Null => Ok(Value::Null),
                _ => inner.apply(arg),
            },
            ParamConversion::Instance { ty, zero } => match (arg, zero) {
                (Value::Null, Some(zero)) => Ok(zero.clone()),
                (Value::Null, None) => Ok(Value::Null),
                _ if arg.is_instance_of(ty) => Ok(arg.clone()),
                _ => Err(conversion_error!(
                    "{:?} is not an instance of {}",
                    arg,
                    ty.fullname()
                )),
            },
        }
    }
}

/// Tag a native payload with `ty`
fn box_native(value: Value, ty: &TypeRc) -> Result<Value> {
    Ok(match value {
        Value::Native(payload) => Value::Object(Instance::new(ty.clone(), payload)),
        other => other,
    })
}

/// What an invoker calls
#[derive(Clone)]
enum Target {
    /// A declared constructor or method
    Member(MethodRc),
    /// Copy semantics: the single argument is the result
    Copy,
    /// A fixed zero value
    Zero(Value),
    /// A zero hook producing a fresh value per call
    ZeroHook(ZeroFn),
}

/// A reusable, pre-planned call of a constructor, method or default construction.
///
/// Invokers are immutable and shared through the factory caches; cloning the `Arc` is
/// the intended way to hold on to one.
pub struct CompiledInvoker {
    member: String,
    target: Target,
    conversions: Box<[ParamConversion]>,
    result_type: Option<TypeRc>,
    requires_instance: bool,
}

impl CompiledInvoker {
    /// Compile an invoker for a constructor or method
    ///
    /// # Errors
    /// Returns [`Error::Invocation`] if a parameter or the declaring type was dropped.
    pub(crate) fn for_member(method: &MethodRc, core: &CoreLibrary) -> Result<Self> {
        let conversions = method
            .param_types()?
            .iter()
            .map(|ty| ParamConversion::plan(ty, core))
            .collect();

        let result_type = if method.is_constructor() {
            Some(method.declaring_type().ok_or_else(|| {
                Error::Invocation(format!("declaring type of {} was dropped", method.name))
            })?)
        } else {
            method.return_type()
        };

        let member = method.signature();
        tracing::trace!(member = %member, "compiled invoker");

        Ok(CompiledInvoker {
            member,
            target: Target::Member(method.clone()),
            conversions,
            result_type,
            requires_instance: !method.is_constructor() && !method.is_static(),
        })
    }

    /// Compile a copy invoker: one argument of `ty`, returned unchanged
    pub(crate) fn for_copy(ty: &TypeRc, core: &CoreLibrary) -> Self {
        CompiledInvoker {
            member: format!("{}({})", ty.fullname(), ty.fullname()),
            target: Target::Copy,
            conversions: Box::new([ParamConversion::plan(ty, core)]),
            result_type: Some(ty.clone()),
            requires_instance: false,
        }
    }

    /// Compile a parameterless invoker for `ty`.
    ///
    /// A declared parameterless constructor wins; otherwise value types with a zero value
    /// are zero-initialized.
    ///
    /// # Errors
    /// Returns [`Error::ConstructorNotFound`] if the type has neither.
    pub(crate) fn parameterless(ty: &TypeRc, core: &CoreLibrary) -> Result<Self> {
        if !ty.is_abstract() {
            if let Some(ctor) = ty.parameterless_constructor() {
                return Self::for_member(&ctor, core);
            }

            if ty.is_value_type() || ty.is_primitive(PrimitiveKind::String) {
                let target = match (&ty.flavor, ty.zero_hook()) {
                    (TypeFlavor::Struct, Some(hook)) => Some(Target::ZeroHook(hook.clone())),
                    _ => core.zero_value(ty).map(Target::Zero),
                };

                if let Some(target) = target {
                    return Ok(CompiledInvoker {
                        member: format!("{}()", ty.fullname()),
                        target,
                        conversions: Box::new([]),
                        result_type: Some(ty.clone()),
                        requires_instance: false,
                    });
                }
            }
        }

        Err(Error::ConstructorNotFound {
            type_name: ty.fullname(),
            signature: String::new(),
        })
    }

    /// Rendered signature of the invoked member
    #[must_use]
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Number of arguments this invoker expects
    #[must_use]
    pub fn arity(&self) -> usize {
        self.conversions.len()
    }

    /// Invoke a constructor, static method or default construction
    ///
    /// # Errors
    /// See [`CompiledInvoker::invoke`].
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        self.invoke(None, args)
    }

    /// Invoke with an optional target instance.
    ///
    /// # Errors
    /// - [`Error::ArgumentCount`] if `args` does not match the declared parameters
    /// - [`Error::MissingInstance`] for instance methods without a (non-null) target
    /// - [`Error::Conversion`] if an argument cannot be converted
    /// - whatever the member body reports
    pub fn invoke(&self, instance: Option<&Value>, args: &[Value]) -> Result<Value> {
        if args.len() != self.conversions.len() {
            return Err(Error::ArgumentCount {
                member: self.member.clone(),
                expected: self.conversions.len(),
                actual: args.len(),
            });
        }

        let instance = instance.filter(|value| !value.is_null());
        if self.requires_instance && instance.is_none() {
            return Err(Error::MissingInstance(self.member.clone()));
        }

        let converted = self
            .conversions
            .iter()
            .zip(args)
            .map(|(conversion, arg)| conversion.apply(arg))
            .collect::<Result<Vec<_>>>()?;

        let result = match &self.target {
            Target::Member(method) => method.call(instance, &converted)?,
            Target::Copy => converted.into_iter().next().unwrap_or(Value::Null),
            Target::Zero(value) => value.clone(),
            Target::ZeroHook(hook) => hook(),
        };

        match &self.result_type {
            Some(ty) => box_native(result, ty),
            None => Ok(result),
        }
    }
}

impl fmt::Debug for CompiledInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledInvoker")
            .field("member", &self.member)
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}
