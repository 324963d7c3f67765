//! Shared fixtures for unit tests.
//!
//! `billing()` builds a small application module with the kinds of types the factory has
//! to deal with: a reference type with a parameterless constructor, a value type with a
//! zero hook, a conversion hook, a copy constructor and an instance method, an abstract
//! class hierarchy behind an interface, and a class with overlapping constructors.

use crate::metadata::{
    identity::ModuleVersion,
    method::{MethodBuilder, MethodRc},
    module::{ModuleBuilder, ModuleRc},
    typesystem::{CoreLibrary, Instance, PrimitiveKind, TypeBuilder, TypeRc, Value},
};
use crate::Error;

/// Payload of `Acme.Billing.Money` instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MoneyData {
    pub minor_units: i64,
    pub currency: String,
}

pub(crate) struct Billing {
    pub core: CoreLibrary,
    pub module: ModuleRc,
    /// class, payload is the currency code
    pub currency: TypeRc,
    /// struct with zero and conversion hooks
    pub money: TypeRc,
    /// class with a single `(Money)` constructor
    pub ledger: TypeRc,
    /// class with `(Object)` and `(String)` constructors
    pub printer: TypeRc,
    pub rounding: TypeRc,
    pub ishape: TypeRc,
    /// abstract, implements `IShape`
    pub shape: TypeRc,
    /// abstract, extends `Shape`
    pub polygon: TypeRc,
    pub circle: TypeRc,
    pub square: TypeRc,
    /// class with a single `(Shape)` constructor
    pub canvas: TypeRc,
}

impl Billing {
    pub fn int64(&self) -> TypeRc {
        self.core.primitive(PrimitiveKind::I8)
    }

    /// `Money(Int64 amount, Currency currency)`
    pub fn money_ctor(&self) -> MethodRc {
        self.money
            .constructors
            .iter()
            .map(|(_, ctor)| ctor.clone())
            .find(|ctor| ctor.params.len() == 2)
            .unwrap()
    }

    pub fn currency_value(&self, code: &str) -> Value {
        Value::Object(Instance::from_native(self.currency.clone(), code.to_string()))
    }
}

fn money_data(args: &[Value], index: usize) -> crate::Result<MoneyData> {
    args[index]
        .downcast_ref::<MoneyData>()
        .cloned()
        .ok_or_else(|| Error::Invocation(format!("argument {index} is not Money")))
}

// Parses "12.50 EUR"
fn parse_money(value: &Value) -> crate::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| conversion_error!("cannot convert {:?} to Money", value))?;
    let (amount, currency) = text
        .trim()
        .split_once(' ')
        .ok_or_else(|| conversion_error!("malformed amount '{}'", text))?;
    let (units, cents) = amount.split_once('.').unwrap_or((amount, "0"));
    let units: i64 = units
        .parse()
        .map_err(|_| conversion_error!("malformed amount '{}'", text))?;
    let cents: i64 = cents
        .parse()
        .map_err(|_| conversion_error!("malformed amount '{}'", text))?;

    Ok(Value::native(MoneyData {
        minor_units: units * 100 + cents,
        currency: currency.trim().to_string(),
    }))
}

pub(crate) fn billing() -> Billing {
    let core = CoreLibrary::new();
    let string = core.string();
    let int64 = core.primitive(PrimitiveKind::I8);

    let currency = TypeBuilder::class("Acme.Billing", "Currency").sealed().build();
    MethodBuilder::constructor()
        .body(|_, _| Ok(Value::native("XXX".to_string())))
        .attach(&currency);
    MethodBuilder::constructor()
        .param("code", &string)
        .body(|_, args| Ok(Value::native(args[0].as_str().unwrap_or_default().to_string())))
        .attach(&currency);

    let money = TypeBuilder::structure("Acme.Billing", "Money")
        .zero(|| {
            Value::native(MoneyData {
                minor_units: 0,
                currency: String::new(),
            })
        })
        .from_value(parse_money)
        .build();
    MethodBuilder::constructor()
        .param("amount", &int64)
        .param("currency", &currency)
        .body(|_, args| {
            Ok(Value::native(MoneyData {
                minor_units: args[0].as_i64().unwrap_or_default(),
                currency: args[1].downcast_ref::<String>().cloned().unwrap_or_default(),
            }))
        })
        .attach(&money);
    MethodBuilder::constructor()
        .param("other", &money)
        .body(|_, args| Ok(Value::native(money_data(args, 0)?)))
        .attach(&money);
    MethodBuilder::method("Describe")
        .returns(&string)
        .body(|this, _| {
            let data = this
                .and_then(|this| this.downcast_ref::<MoneyData>())
                .ok_or_else(|| Error::MissingInstance("Money.Describe".to_string()))?;
            Ok(Value::string(format!(
                "{}.{:02} {}",
                data.minor_units / 100,
                data.minor_units % 100,
                data.currency
            )))
        })
        .attach(&money);

    let ledger = TypeBuilder::class("Acme.Billing", "Ledger").build();
    MethodBuilder::constructor()
        .param("opening", &money)
        .body(|_, args| Ok(Value::native(money_data(args, 0)?)))
        .attach(&ledger);

    let printer = TypeBuilder::class("Acme.Billing", "Printer").build();
    MethodBuilder::constructor()
        .param("value", &core.object())
        .body(|_, _| Ok(Value::native(0_u8)))
        .attach(&printer);
    MethodBuilder::constructor()
        .param("text", &string)
        .body(|_, _| Ok(Value::native(1_u8)))
        .attach(&printer);

    let rounding = TypeBuilder::enumeration("Acme.Billing", "Rounding", PrimitiveKind::I4)
        .literal("Down", 0)
        .literal("HalfEven", 1)
        .literal("Up", 2)
        .build();

    let ishape = TypeBuilder::interface("Acme.Shapes", "IShape").build();
    let shape = TypeBuilder::class("Acme.Shapes", "Shape")
        .abstract_type()
        .implements(&ishape)
        .build();
    let polygon = TypeBuilder::class("Acme.Shapes", "Polygon")
        .abstract_type()
        .extends(&shape)
        .build();
    let circle = TypeBuilder::class("Acme.Shapes", "Circle").extends(&shape).build();
    let square = TypeBuilder::class("Acme.Shapes", "Square").extends(&polygon).build();
    for concrete in [&circle, &square] {
        MethodBuilder::constructor()
            .body(|_, _| Ok(Value::native(())))
            .attach(concrete);
    }

    let canvas = TypeBuilder::class("Acme.Shapes", "Canvas").build();
    MethodBuilder::constructor()
        .param("shape", &shape)
        .body(|_, _| Ok(Value::native(())))
        .attach(&canvas);

    let module = ModuleBuilder::new("Acme.Billing")
        .version(ModuleVersion::new(1, 2, 0, 0))
        .add_all([
            &currency, &money, &ledger, &printer, &rounding, &ishape, &shape, &polygon, &circle,
            &square, &canvas,
        ])
        .build();

    Billing {
        core,
        module,
        currency,
        money,
        ledger,
        printer,
        rounding,
        ishape,
        shape,
        polygon,
        circle,
        square,
        canvas,
    }
}
