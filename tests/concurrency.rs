//! Concurrent use of a shared factory.
//!
//! Readers resolve, discover and construct while writers register modules. The tests
//! check the cache guarantees: one cached invoker per signature, and discovery results
//! that never miss a module registered before the query started.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
};

use typefactory::{config::AmbiguityPolicy, prelude::*, Result};

const THREADS: usize = 8;

struct Counting {
    calls: AtomicUsize,
}

impl ConstructorSelector for Counting {
    fn select(
        &self,
        ty: &TypeRc,
        arguments: &[Option<TypeRc>],
        policy: AmbiguityPolicy,
    ) -> Result<Resolution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TieredResolver.select(ty, arguments, policy)
    }
}

fn gauge_module(core: &CoreLibrary) -> (ModuleRc, TypeRc) {
    let gauge = TypeBuilder::class("Acme.Sensors", "Gauge").build();
    MethodBuilder::constructor()
        .param("reading", &core.primitive(PrimitiveKind::R8))
        .body(|_, args| Ok(Value::native(args[0].as_f64().unwrap_or_default())))
        .attach(&gauge);
    let module = ModuleBuilder::new("Acme.Sensors")
        .version(ModuleVersion::new(3, 0, 0, 0))
        .add(&gauge)
        .build();
    (module, gauge)
}

#[test]
fn test_parallel_constructor_invokers_agree() -> Result<()> {
    let core = CoreLibrary::new();
    let (module, gauge) = gauge_module(&core);

    let selector = Arc::new(Counting {
        calls: AtomicUsize::new(0),
    });
    let factory = Arc::new(
        Factory::new(FactoryConfig::default()).with_selector(selector.clone()),
    );
    factory.load_module(&module);

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let factory = factory.clone();
            let gauge = gauge.clone();
            let barrier = barrier.clone();
            thread::spawn(move || -> Result<(InvokerRc, Value)> {
                let double = factory.core().primitive(PrimitiveKind::R8);
                barrier.wait();
                let invoker = factory.constructor_invoker(&gauge, &[Some(double)])?;
                let value = invoker.call(&[Value::R8(i as f64)])?;
                Ok((invoker, value))
            })
        })
        .collect();

    let mut invokers = Vec::new();
    for (i, handle) in handles.into_iter().enumerate() {
        let (invoker, value) = handle.join().expect("worker panicked")?;
        assert_eq!(value.downcast_ref::<f64>(), Some(&(i as f64)));
        invokers.push(invoker);
    }

    assert!(invokers.iter().all(|inv| Arc::ptr_eq(inv, &invokers[0])));
    assert_eq!(factory.invoker_cache_stats().constructors, 1);

    // further lookups are cache hits
    let calls = selector.calls.load(Ordering::SeqCst);
    let double = factory.core().primitive(PrimitiveKind::R8);
    factory.constructor_invoker(&gauge, &[Some(double)])?;
    assert_eq!(selector.calls.load(Ordering::SeqCst), calls);
    Ok(())
}

#[test]
fn test_discovery_sees_modules_registered_by_other_threads() -> Result<()> {
    let ifeed = TypeBuilder::interface("Acme.Feeds", "IFeed").build();
    let contracts = ModuleBuilder::new("Acme.Feeds")
        .version(ModuleVersion::new(1, 0, 0, 0))
        .add(&ifeed)
        .build();

    let factory = Arc::new(Factory::new(FactoryConfig::default().with_parallel_discovery(true)));
    factory.load_module(&contracts);
    assert!(factory.implementors(&ifeed, true).is_empty());

    let feeds: Vec<(ModuleRc, TypeRc)> = (0..THREADS)
        .map(|i| {
            let feed = TypeBuilder::class("Acme.Feeds", &format!("Feed{i}"))
                .implements(&ifeed)
                .build();
            MethodBuilder::constructor()
                .body(|_, _| Ok(Value::native(())))
                .attach(&feed);
            let module = ModuleBuilder::new(&format!("Acme.Feeds.Source{i}"))
                .version(ModuleVersion::new(1, 0, 0, 0))
                .add(&feed)
                .build();
            (module, feed)
        })
        .collect();

    let handles: Vec<_> = feeds
        .iter()
        .map(|(module, feed)| {
            let factory = factory.clone();
            let ifeed = ifeed.clone();
            let module = module.clone();
            let feed = feed.clone();
            thread::spawn(move || {
                assert_eq!(factory.load_module(&module), Registration::Application);
                // the query runs after our own registration and must include it
                let found = factory.implementors(&ifeed, true);
                found.iter().any(|ty| ty.token == feed.token)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("worker panicked"));
    }

    let all = factory.implementors(&ifeed, true);
    assert_eq!(all.len(), THREADS);
    for (_, feed) in &feeds {
        factory.construct(feed, &[])?;
    }
    Ok(())
}

#[test]
fn test_concurrent_lookups_during_registration() {
    let core = CoreLibrary::new();
    let (module, gauge) = gauge_module(&core);
    let factory = Arc::new(Factory::new(FactoryConfig::default()));

    let loader = {
        let factory = factory.clone();
        thread::spawn(move || factory.load_module(&module))
    };

    let readers: Vec<_> = (0..THREADS)
        .map(|_| {
            let factory = factory.clone();
            thread::spawn(move || {
                // either before or after registration, never a torn view
                match factory.get_type("Acme.Sensors.Gauge") {
                    Ok(ty) => ty.name == "Gauge",
                    Err(Error::TypeNotFound(_)) => true,
                    Err(_) => false,
                }
            })
        })
        .collect();

    assert_eq!(loader.join().expect("loader panicked"), Registration::Application);
    for reader in readers {
        assert!(reader.join().expect("reader panicked"));
    }
    assert_eq!(
        factory.get_type("Acme.Sensors.Gauge").map(|ty| ty.token).ok(),
        Some(gauge.token)
    );
}
