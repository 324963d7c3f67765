//! Constructor overload resolution.
//!
//! Given a type and the runtime types of the arguments (`None` for a `null` argument), the
//! resolver picks a constructor in three tiers:
//!
//! 1. **Exact** - a constructor whose parameter types equal the argument types. Only
//!    tried when no argument is `null`.
//! 2. **Assignable** - the first constructor, in declaration order, whose parameters
//!    accept every argument. A `null` argument is accepted by parameters that can hold
//!    null.
//! 3. **Copy** - a single argument of the type itself, with no declared constructor
//!    accepting it, yields the argument unchanged.
//!
//! Interfaces and abstract types never resolve.

use crate::{
    config::AmbiguityPolicy,
    metadata::{
        method::MethodRc,
        typesystem::{TypeDescriptor, TypeRc},
    },
    Error, Result,
};

/// Which tier produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Parameter types equal the argument types
    Exact,
    /// Parameters accept the arguments through assignability
    Assignable,
    /// No constructor; the single argument is the result
    Copy,
}

/// The outcome of constructor resolution
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A declared constructor
    Constructor {
        /// The selected constructor
        ctor: MethodRc,
        /// How it was selected
        tier: MatchTier,
    },
    /// Copy semantics: construction returns its single argument
    Copy(TypeRc),
}

impl Resolution {
    /// The tier that produced this resolution
    #[must_use]
    pub fn tier(&self) -> MatchTier {
        match self {
            Resolution::Constructor { tier, .. } => *tier,
            Resolution::Copy(_) => MatchTier::Copy,
        }
    }

    /// The selected constructor, `None` for copy semantics
    #[must_use]
    pub fn constructor(&self) -> Option<&MethodRc> {
        match self {
            Resolution::Constructor { ctor, .. } => Some(ctor),
            Resolution::Copy(_) => None,
        }
    }
}

/// Selects a constructor for an argument signature.
///
/// The factory calls the selector only on invoker cache misses, so an implementation is
/// consulted at most once per type and argument signature.
pub trait ConstructorSelector: Send + Sync {
    /// Select a constructor of `ty` for `arguments`
    ///
    /// # Errors
    /// Returns [`Error::ConstructorNotFound`] if nothing accepts the arguments, or
    /// [`Error::AmbiguousConstructor`] if the policy rejects an ambiguous match.
    fn select(
        &self,
        ty: &TypeRc,
        arguments: &[Option<TypeRc>],
        policy: AmbiguityPolicy,
    ) -> Result<Resolution>;
}

/// The three-tier resolver
#[derive(Debug, Default, Clone, Copy)]
pub struct TieredResolver;

impl ConstructorSelector for TieredResolver {
    fn select(
        &self,
        ty: &TypeRc,
        arguments: &[Option<TypeRc>],
        policy: AmbiguityPolicy,
    ) -> Result<Resolution> {
        if ty.is_abstract() {
            return Err(not_found(ty, arguments));
        }

        let candidates: Vec<(MethodRc, Vec<TypeRc>)> = ty
            .constructors
            .iter()
            .filter(|(_, ctor)| ctor.params.len() == arguments.len())
            .filter_map(|(_, ctor)| match ctor.param_types() {
                Ok(params) => Some((ctor.clone(), params)),
                Err(error) => {
                    tracing::warn!(ctor = %ctor.signature(), %error, "skipping constructor");
                    None
                }
            })
            .collect();

        if arguments.iter().all(Option::is_some) {
            let exact = candidates.iter().find(|(_, params)| {
                params
                    .iter()
                    .zip(arguments)
                    .all(|(param, arg)| arg.as_ref().is_some_and(|arg| arg.token == param.token))
            });
            if let Some((ctor, _)) = exact {
                return Ok(Resolution::Constructor {
                    ctor: ctor.clone(),
                    tier: MatchTier::Exact,
                });
            }
        }

        let accepting: Vec<&MethodRc> = candidates
            .iter()
            .filter(|(_, params)| accepts(params, arguments))
            .map(|(ctor, _)| ctor)
            .collect();

        match accepting.as_slice() {
            [] => {}
            [single] => {
                return Ok(Resolution::Constructor {
                    ctor: (*single).clone(),
                    tier: MatchTier::Assignable,
                })
            }
            [first, ..] => {
                let rendered: Vec<String> = accepting.iter().map(|c| c.signature()).collect();
                if policy == AmbiguityPolicy::Reject {
                    return Err(Error::AmbiguousConstructor {
                        type_name: ty.fullname(),
                        signature: render_signature(arguments),
                        candidates: rendered,
                    });
                }

                tracing::debug!(
                    type_name = %ty.fullname(),
                    signature = %render_signature(arguments),
                    candidates = ?rendered,
                    "ambiguous constructor, using first fit"
                );
                return Ok(Resolution::Constructor {
                    ctor: (*first).clone(),
                    tier: MatchTier::Assignable,
                });
            }
        }

        if let [Some(single)] = arguments {
            if single.token == ty.token {
                return Ok(Resolution::Copy(ty.clone()));
            }
        }

        Err(not_found(ty, arguments))
    }
}

/// Do `params` accept `arguments` slot by slot
fn accepts(params: &[TypeRc], arguments: &[Option<TypeRc>]) -> bool {
    params.iter().zip(arguments).all(|(param, arg)| match arg {
        Some(arg) => param.is_assignable_from(arg),
        None => param.can_hold_null(),
    })
}

fn not_found(ty: &TypeDescriptor, arguments: &[Option<TypeRc>]) -> Error {
    Error::ConstructorNotFound {
        type_name: ty.fullname(),
        signature: render_signature(arguments),
    }
}

/// Render argument types as `System.Int64, Acme.Currency, null`
#[must_use]
pub fn render_signature(arguments: &[Option<TypeRc>]) -> String {
    arguments
        .iter()
        .map(|arg| match arg {
            Some(ty) => ty.fullname(),
            None => "null".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            method::MethodBuilder,
            typesystem::{CoreLibrary, PrimitiveKind, TypeBuilder, Value},
        },
        test::billing,
    };

    fn select(ty: &TypeRc, arguments: &[Option<TypeRc>]) -> Result<Resolution> {
        TieredResolver.select(ty, arguments, AmbiguityPolicy::FirstFit)
    }

    #[test]
    fn test_exact_match() {
        let fixture = billing();
        let resolution = select(
            &fixture.money,
            &[Some(fixture.int64()), Some(fixture.currency.clone())],
        )
        .unwrap();

        assert_eq!(resolution.tier(), MatchTier::Exact);
        assert_eq!(
            resolution.constructor().unwrap().signature(),
            "Acme.Billing.Money(System.Int64, Acme.Billing.Currency)"
        );
    }

    #[test]
    fn test_assignable_match() {
        let fixture = billing();
        let circle = TypeBuilder::class("Acme", "Circle")
            .extends(&fixture.shape)
            .build();

        let resolution = select(&fixture.canvas, &[Some(circle)]).unwrap();
        assert_eq!(resolution.tier(), MatchTier::Assignable);
    }

    #[test]
    fn test_null_argument() {
        let fixture = billing();

        // Money(Int64, Currency): the reference slot accepts null
        let resolution = select(&fixture.money, &[Some(fixture.int64()), None]).unwrap();
        assert_eq!(resolution.tier(), MatchTier::Assignable);

        // the value type slot does not
        let err = select(&fixture.money, &[None, Some(fixture.currency.clone())]).unwrap_err();
        assert!(matches!(err, Error::ConstructorNotFound { signature, .. }
            if signature == "null, Acme.Billing.Currency"));
    }

    #[test]
    fn test_copy_fallback() {
        let core = CoreLibrary::new();
        let int = core.primitive(PrimitiveKind::I4);

        let resolution = select(&int, &[Some(int.clone())]).unwrap();
        assert!(matches!(resolution, Resolution::Copy(ref ty) if ty.token == int.token));

        assert!(select(&int, &[Some(core.string())]).is_err());
        assert!(select(&int, &[None]).is_err());
    }

    #[test]
    fn test_declared_copy_constructor_wins() {
        let fixture = billing();
        let resolution = select(&fixture.money, &[Some(fixture.money.clone())]).unwrap();
        assert_eq!(resolution.tier(), MatchTier::Exact);
    }

    #[test]
    fn test_ambiguity() {
        let core = CoreLibrary::new();
        let ty = TypeBuilder::class("Acme", "Holder").build();
        MethodBuilder::constructor()
            .param("value", &core.object())
            .body(|_, _| Ok(Value::native(1)))
            .attach(&ty);
        MethodBuilder::constructor()
            .param("value", &core.string())
            .body(|_, _| Ok(Value::native(2)))
            .attach(&ty);

        // both accept null: first fit picks the declaration order winner
        let first = TieredResolver
            .select(&ty, &[None], AmbiguityPolicy::FirstFit)
            .unwrap();
        assert_eq!(
            first.constructor().unwrap().signature(),
            "Acme.Holder(System.Object)"
        );

        let err = TieredResolver
            .select(&ty, &[None], AmbiguityPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousConstructor { ref candidates, .. }
            if candidates.len() == 2));

        // an exact match is never ambiguous
        let exact = TieredResolver
            .select(&ty, &[Some(core.string())], AmbiguityPolicy::Reject)
            .unwrap();
        assert_eq!(exact.tier(), MatchTier::Exact);
    }

    #[test]
    fn test_overloads_by_arity_and_type() {
        let core = CoreLibrary::new();
        let int = core.primitive(PrimitiveKind::I4);
        let ty = TypeBuilder::class("Acme", "Label").build();
        MethodBuilder::constructor()
            .param("id", &int)
            .attach(&ty);
        MethodBuilder::constructor()
            .param("text", &core.string())
            .attach(&ty);
        MethodBuilder::constructor()
            .param("id", &int)
            .param("text", &core.string())
            .attach(&ty);

        let by_int = select(&ty, &[Some(int.clone())]).unwrap();
        assert_eq!(by_int.tier(), MatchTier::Exact);
        assert_eq!(by_int.constructor().unwrap().signature(), "Acme.Label(System.Int32)");

        let pair = select(&ty, &[Some(int), None]).unwrap();
        assert_eq!(pair.tier(), MatchTier::Assignable);
        assert_eq!(
            pair.constructor().unwrap().signature(),
            "Acme.Label(System.Int32, System.String)"
        );

        let boxed = TypeBuilder::class("Acme", "Boxed").build();
        MethodBuilder::constructor()
            .param("value", &core.object())
            .attach(&boxed);
        assert_eq!(select(&boxed, &[None]).unwrap().tier(), MatchTier::Assignable);
    }

    #[test]
    fn test_abstract_and_interfaces() {
        let fixture = billing();
        assert!(select(&fixture.shape, &[]).is_err());
        assert!(select(&fixture.ishape, &[]).is_err());
    }

    #[test]
    fn test_render_signature() {
        let core = CoreLibrary::new();
        assert_eq!(
            render_signature(&[Some(core.primitive(PrimitiveKind::I8)), None]),
            "System.Int64, null"
        );
        assert_eq!(render_signature(&[]), "");
    }
}
