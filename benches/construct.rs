//! Benchmarks for construction through the factory.
//!
//! Compares the cached paths (invoker reuse, cached discovery) against the work they
//! save: constructor resolution and uncached type enumeration.

extern crate typefactory;

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use typefactory::prelude::*;

struct Fixture {
    _core: CoreLibrary,
    factory: Factory,
    invoice: TypeRc,
    document: TypeRc,
}

/// An application module with one constructible `Invoice` and a few hundred documents
fn fixture() -> Fixture {
    let core = CoreLibrary::new();
    let factory = Factory::new(FactoryConfig::default());

    let document = TypeBuilder::class("Acme.Docs", "Document")
        .abstract_type()
        .build();
    let invoice = TypeBuilder::class("Acme.Docs", "Invoice")
        .extends(&document)
        .build();
    MethodBuilder::constructor()
        .param("number", &core.primitive(PrimitiveKind::I4))
        .param("customer", &core.string())
        .body(|_, args| {
            Ok(Value::native((
                args[0].as_i32().unwrap_or_default(),
                args[1].as_str().unwrap_or_default().to_string(),
            )))
        })
        .attach(&invoice);
    MethodBuilder::constructor()
        .param("number", &core.primitive(PrimitiveKind::I8))
        .body(|_, args| Ok(Value::native(args[0].as_i64().unwrap_or_default())))
        .attach(&invoice);

    let mut module = ModuleBuilder::new("Acme.Docs")
        .version(ModuleVersion::new(1, 0, 0, 0))
        .add(&document)
        .add(&invoice);
    let fillers: Vec<TypeRc> = (0..500)
        .map(|i| {
            let base = if i % 2 == 0 { &document } else { &invoice };
            TypeBuilder::class("Acme.Docs.Generated", &format!("Doc{i}"))
                .extends(base)
                .build()
        })
        .collect();
    module = module.add_all(&fillers);
    factory.load_module(&module.build());

    Fixture {
        _core: core,
        factory,
        invoice,
        document,
    }
}

fn bench_construct(c: &mut Criterion) {
    let fixture = fixture();
    let args = [Value::I4(42), Value::string("Contoso")];
    let signature: Vec<Option<TypeRc>> = args
        .iter()
        .map(|arg| fixture.factory.runtime_type(arg))
        .collect();

    c.bench_function("construct_cached", |b| {
        b.iter(|| {
            let value = fixture
                .factory
                .construct(black_box(&fixture.invoice), black_box(&args))
                .unwrap();
            black_box(value)
        });
    });

    let invoker = fixture
        .factory
        .constructor_invoker(&fixture.invoice, &signature)
        .unwrap();
    c.bench_function("invoker_call", |b| {
        b.iter(|| black_box(invoker.call(black_box(&args)).unwrap()));
    });

    c.bench_function("resolve_constructor", |b| {
        b.iter(|| {
            let resolution = fixture
                .factory
                .resolve_constructor(black_box(&fixture.invoice), black_box(&signature))
                .unwrap();
            black_box(resolution)
        });
    });
}

fn bench_discovery(c: &mut Criterion) {
    let fixture = fixture();

    c.bench_function("subtypes_cached", |b| {
        b.iter(|| black_box(fixture.factory.subtypes(black_box(&fixture.document), true)));
    });

    c.bench_function("subtypes_uncached", |b| {
        b.iter(|| black_box(fixture.factory.subtypes(black_box(&fixture.document), false)));
    });

    c.bench_function("get_type_by_name", |b| {
        b.iter(|| black_box(fixture.factory.get_type(black_box("Acme.Docs.Generated.Doc250"))));
    });
}

criterion_group!(benches, bench_construct, bench_discovery);
criterion_main!(benches);
