use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value};

use super::*;
use crate::config::WeaverConfig;
use crate::error::AopError;
use crate::reflection::{parse_manifest, ClassRegistry};
use crate::settings::Settings;
use crate::weaver::{Weaver, WeaverContext};

const MANIFEST: &str = r#"
interfaces:
  - name: Acme::Greeter
    methods:
      - { name: greet, default: true }
classes:
  - name: Acme::Calculator
    methods:
      - { name: add }
      - { name: divide }
      - { name: factorial }
      - { name: checked, final: true }
  - name: Acme::Plain
    methods: [{ name: echo }]
  - name: Acme::AAspect
    tags: [aspect]
    introductions:
      - { interface: Acme::Greeter, pointcut: "class(Acme::Calculator)" }
    methods:
      - name: wrap
        advice: [{ around: "method(Acme::Calculator->add())" }]
      - name: guard
        advice: [{ before: "method(Acme::Calculator->divide())" }]
      - name: twice
        advice: [{ around: "method(Acme::Calculator->factorial())" }]
      - name: on_error
        advice: [{ after_throwing: "method(Acme::Calculator->divide())" }]
      - name: returned
        advice: [{ after_returning: "method(Acme::Calculator->(add|divide)())" }]
      - name: finally
        advice: [{ after: "method(Acme::Calculator->(add|divide)())" }]
  - name: Acme::BAspect
    tags: [aspect]
    methods:
      - name: wrap
        advice: [{ around: "method(Acme::Calculator->add())" }]
"#;

type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

fn num(args: &ArgVec, name: &str) -> i64 {
    args.iter()
        .find(|(n, _)| n.as_ref() == name)
        .and_then(|(_, v)| v.as_i64())
        .unwrap_or(0)
}

struct Fixture {
    log: Log,
    body_calls: Arc<AtomicUsize>,
    after_calls: Arc<AtomicUsize>,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            log: Arc::new(Mutex::new(Vec::new())),
            body_calls: Arc::new(AtomicUsize::new(0)),
            after_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn objects(&self) -> ObjectRegistry {
        let mut objects = ObjectRegistry::new();

        for (aspect, label) in [("Acme::AAspect", "A"), ("Acme::BAspect", "B")] {
            let log = Arc::clone(&self.log);
            objects.register_advice(aspect, "wrap", move |jp| {
                push(&log, format!("{label}-before"));
                let result = jp.proceed();
                push(&log, format!("{label}-after"));
                result
            });
        }

        let log = Arc::clone(&self.log);
        objects.register_advice("Acme::AAspect", "guard", move |jp| {
            push(&log, "guard");
            if jp.argument("b").and_then(Value::as_i64).unwrap_or(0) < 0 {
                return Err(InvocationError::new("InvalidArgument", "negative divisor"));
            }
            Ok(Value::Null)
        });
        objects.register_advice("Acme::AAspect", "twice", |jp| {
            let first = jp.proceed()?;
            let second = jp.proceed()?;
            assert_eq!(first, second);
            Ok(second)
        });
        let log = Arc::clone(&self.log);
        objects.register_advice("Acme::AAspect", "on_error", move |jp| {
            let class = jp.exception().map(|e| e.class.clone()).unwrap_or_default();
            push(&log, format!("on_error:{class}"));
            Ok(Value::Null)
        });
        let log = Arc::clone(&self.log);
        objects.register_advice("Acme::AAspect", "returned", move |jp| {
            push(&log, format!("returned:{}", jp.result().cloned().unwrap_or_default()));
            Ok(Value::Null)
        });
        let log = Arc::clone(&self.log);
        let after_calls = Arc::clone(&self.after_calls);
        objects.register_advice("Acme::AAspect", "finally", move |jp| {
            after_calls.fetch_add(1, Ordering::SeqCst);
            push(&log, "finally");
            if jp.argument("fail_after") == Some(&json!(true)) {
                return Err(InvocationError::new("AfterFailed", "after advice failed"));
            }
            Ok(Value::Null)
        });
        objects.register_introduction("Acme::AAspect", "greet", |proxy, _| {
            Ok(json!(format!("hello from {}", proxy.class_name())))
        });

        let log = Arc::clone(&self.log);
        let body_calls = Arc::clone(&self.body_calls);
        objects.register_body("Acme::Calculator", "add", move |_, args| {
            body_calls.fetch_add(1, Ordering::SeqCst);
            push(&log, "body");
            Ok(json!(num(args, "a") + num(args, "b")))
        });
        objects.register_body("Acme::Calculator", "divide", |_, args| {
            let b = num(args, "b");
            if b == 0 {
                return Err(InvocationError::new("DivisionByZero", "cannot divide by zero"));
            }
            Ok(json!(num(args, "a") / b))
        });
        let body_calls = Arc::clone(&self.body_calls);
        objects.register_body("Acme::Calculator", "factorial", move |proxy, args| {
            body_calls.fetch_add(1, Ordering::SeqCst);
            let n = num(args, "n");
            if n <= 1 {
                return Ok(json!(1));
            }
            let rest = proxy.call("factorial", arguments([("n", json!(n - 1))]))?;
            Ok(json!(n * rest.as_i64().unwrap_or(0)))
        });
        objects.register_body("Acme::Calculator", "checked", |_, _| Ok(json!("checked")));
        objects.register_body("Acme::Plain", "echo", |_, args| {
            Ok(args.first().map(|(_, v)| v.clone()).unwrap_or_default())
        });
        objects
    }

    fn factory(&self) -> ProxyFactory {
        let objects = self.objects();
        let context = weave(&objects);
        ProxyFactory::new(context, Arc::new(objects)).unwrap()
    }
}

fn classes() -> ClassRegistry {
    ClassRegistry::from_manifest(parse_manifest(MANIFEST, true).unwrap()).unwrap()
}

fn weave(objects: &ObjectRegistry) -> Arc<WeaverContext> {
    Weaver::new(WeaverConfig::default())
        .weave(classes(), Settings::default(), objects)
        .unwrap()
}

#[test]
fn test_around_advice_wraps_in_declared_order() {
    let fixture = Fixture::new();
    let calculator = fixture
        .factory()
        .instantiate("Acme::Calculator", ArgVec::new())
        .unwrap();
    let result = calculator
        .call("add", arguments([("a", json!(2)), ("b", json!(3))]))
        .unwrap();
    assert_eq!(result, json!(5));
    assert_eq!(
        fixture.entries(),
        vec!["A-before", "B-before", "body", "B-after", "A-after", "returned:5", "finally"]
    );
    assert_eq!(fixture.body_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_body_error_runs_after_throwing_and_after_once() {
    let fixture = Fixture::new();
    let calculator = fixture
        .factory()
        .instantiate("Acme::Calculator", ArgVec::new())
        .unwrap();
    let err = calculator
        .call("divide", arguments([("a", json!(1)), ("b", json!(0))]))
        .unwrap_err();
    assert_eq!(err, InvocationError::new("DivisionByZero", "cannot divide by zero"));
    assert_eq!(
        fixture.entries(),
        vec!["guard", "on_error:DivisionByZero", "finally"]
    );
    assert_eq!(fixture.after_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_before_error_skips_the_body() {
    let fixture = Fixture::new();
    let calculator = fixture
        .factory()
        .instantiate("Acme::Calculator", ArgVec::new())
        .unwrap();
    let err = calculator
        .call("divide", arguments([("a", json!(1)), ("b", json!(-1))]))
        .unwrap_err();
    assert_eq!(err.class, "InvalidArgument");
    assert_eq!(
        fixture.entries(),
        vec!["guard", "on_error:InvalidArgument", "finally"]
    );
}

#[test]
fn test_failing_after_advice_runs_once_and_propagates() {
    let fixture = Fixture::new();
    let calculator = fixture
        .factory()
        .instantiate("Acme::Calculator", ArgVec::new())
        .unwrap();
    let err = calculator
        .call(
            "divide",
            arguments([("a", json!(4)), ("b", json!(2)), ("fail_after", json!(true))]),
        )
        .unwrap_err();
    assert_eq!(err.class, "AfterFailed");
    assert_eq!(fixture.after_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        fixture.entries(),
        vec!["guard", "returned:2", "finally", "on_error:AfterFailed"]
    );
}

#[test]
fn test_repeated_proceed_and_recursion_run_each_body_once() {
    let fixture = Fixture::new();
    let calculator = fixture
        .factory()
        .instantiate("Acme::Calculator", ArgVec::new())
        .unwrap();
    let result = calculator
        .call("factorial", arguments([("n", json!(5))]))
        .unwrap();
    assert_eq!(result, json!(120));
    assert_eq!(fixture.body_calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_concurrent_calls_share_no_state() {
    let fixture = Fixture::new();
    let calculator = Arc::new(
        fixture
            .factory()
            .instantiate("Acme::Calculator", ArgVec::new())
            .unwrap(),
    );
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let calculator = Arc::clone(&calculator);
            thread::spawn(move || {
                for i in 0..50 {
                    let result = calculator
                        .call("add", arguments([("a", json!(t)), ("b", json!(i))]))
                        .unwrap();
                    assert_eq!(result, json!(t + i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(fixture.body_calls.load(Ordering::SeqCst), 400);
    assert_eq!(fixture.after_calls.load(Ordering::SeqCst), 400);
}

#[test]
fn test_unwoven_and_final_methods_pass_through() {
    let fixture = Fixture::new();
    let factory = fixture.factory();
    let plain = factory.instantiate("Acme::Plain", ArgVec::new()).unwrap();
    assert!(!plain.is_woven());
    assert_eq!(
        plain.call("echo", arguments([("v", json!("x"))])).unwrap(),
        json!("x")
    );

    let calculator = factory.instantiate("Acme::Calculator", ArgVec::new()).unwrap();
    assert_eq!(
        calculator.proxy_class(),
        Some("Acme::CalculatorAopProxy")
    );
    assert!(!calculator.table().is_intercepted("checked"));
    assert_eq!(calculator.call("checked", ArgVec::new()).unwrap(), json!("checked"));
    assert_eq!(
        calculator.call("missing", ArgVec::new()).unwrap_err().class,
        "UndefinedMethod"
    );
    assert_eq!(
        factory
            .instantiate("Acme::Nowhere", ArgVec::new())
            .unwrap_err()
            .class,
        "UnknownClass"
    );
    assert!(fixture.entries().is_empty());
}

#[test]
fn test_introduced_interface_uses_default_implementation() {
    let fixture = Fixture::new();
    let calculator = fixture
        .factory()
        .instantiate("Acme::Calculator", ArgVec::new())
        .unwrap();
    assert!(calculator.has_introduced("Acme::Greeter"));
    assert_eq!(
        calculator.call("greet", ArgVec::new()).unwrap(),
        json!("hello from Acme::Calculator")
    );
}

#[test]
fn test_missing_advice_handler_fails_factory_build() {
    let fixture = Fixture::new();
    let objects = fixture.objects();
    let context = weave(&objects);
    let mut incomplete = ObjectRegistry::new();
    incomplete.register_advice("Acme::AAspect", "wrap", |jp| jp.proceed());
    let err = ProxyFactory::new(context, Arc::new(incomplete)).unwrap_err();
    assert!(matches!(err, AopError::Configuration { .. }));
}

#[test]
fn test_proceed_outside_around_advice_is_an_error() {
    let fixture = Fixture::new();
    let plain = fixture
        .factory()
        .instantiate("Acme::Plain", ArgVec::new())
        .unwrap();
    let mut join_point = JoinPoint::new(&plain, "Acme::Plain", "echo", ArgVec::new());
    assert_eq!(join_point.proceed().unwrap_err().class, "AdviceChain");
}

#[test]
fn test_reload_swaps_tables_for_new_objects_only() {
    let fixture = Fixture::new();
    let objects = Arc::new(fixture.objects());
    let mut weaver = Weaver::new(WeaverConfig::default());
    let first = weaver
        .weave(classes(), Settings::default(), objects.as_ref())
        .unwrap();
    let factory = ProxyFactory::new(first, Arc::clone(&objects)).unwrap();
    let before = factory.instantiate("Acme::Calculator", ArgVec::new()).unwrap();

    let second = weaver
        .weave(classes(), Settings::default(), objects.as_ref())
        .unwrap();
    factory.reload(second).unwrap();
    let after = factory.instantiate("Acme::Calculator", ArgVec::new()).unwrap();

    assert_eq!(factory.context().generation(), 2);
    assert_eq!(before.proxy_class(), Some("Acme::CalculatorAopProxy"));
    assert_eq!(after.proxy_class(), Some("Acme::CalculatorAopProxy_v2"));
    assert_ne!(before.id(), after.id());
}

#[test]
fn test_around_advice_can_rewrite_arguments() {
    let fixture = Fixture::new();
    let mut objects = fixture.objects();
    objects.register_advice("Acme::BAspect", "wrap", |jp| {
        jp.set_argument("b", json!(10));
        jp.proceed()
    });
    let context = weave(&objects);
    let calculator = ProxyFactory::new(context, Arc::new(objects))
        .unwrap()
        .instantiate("Acme::Calculator", ArgVec::new())
        .unwrap();
    assert_eq!(
        calculator
            .call("add", arguments([("a", json!(1)), ("b", json!(1))]))
            .unwrap(),
        json!(11)
    );
}

const OUTCOMES: &str = r#"
classes:
  - name: Acme::Svc
    methods:
      - { name: new, static: true }
      - { name: run }
  - name: Acme::OutcomeAspect
    tags: [aspect]
    methods:
      - name: init
        advice: [{ before: "method(Acme::Svc->new())" }]
      - name: r1
        advice: [{ after_returning: "method(Acme::Svc->run())" }]
      - name: r2
        advice: [{ after_returning: "method(Acme::Svc->run())" }]
      - name: thrown
        advice: [{ after_throwing: "method(Acme::Svc->run())" }]
      - name: fin
        advice: [{ after: "method(Acme::Svc->run())" }]
"#;

fn outcome_objects(log: &Log, throwing_fails: bool) -> ObjectRegistry {
    let mut objects = ObjectRegistry::new();
    let entry = Arc::clone(log);
    objects.register_advice("Acme::OutcomeAspect", "init", move |_| {
        push(&entry, "init");
        Ok(Value::Null)
    });
    let entry = Arc::clone(log);
    objects.register_advice("Acme::OutcomeAspect", "r1", move |_| {
        push(&entry, "r1");
        Err(InvocationError::new("R1", "first after-returning advice failed"))
    });
    let entry = Arc::clone(log);
    objects.register_advice("Acme::OutcomeAspect", "r2", move |_| {
        push(&entry, "r2");
        Ok(Value::Null)
    });
    let entry = Arc::clone(log);
    objects.register_advice("Acme::OutcomeAspect", "thrown", move |jp| {
        let class = jp.exception().map(|e| e.class.clone()).unwrap_or_default();
        push(&entry, format!("thr:{class}"));
        if throwing_fails {
            return Err(InvocationError::new("Thrown", "after-throwing advice failed"));
        }
        Ok(Value::Null)
    });
    let entry = Arc::clone(log);
    objects.register_advice("Acme::OutcomeAspect", "fin", move |_| {
        push(&entry, "fin");
        Ok(Value::Null)
    });
    objects.register_body("Acme::Svc", "run", |_, _| Ok(json!("ran")));
    objects
}

fn outcome_service(log: &Log, throwing_fails: bool) -> ProxyObject {
    let objects = outcome_objects(log, throwing_fails);
    let classes =
        ClassRegistry::from_manifest(parse_manifest(OUTCOMES, true).unwrap()).unwrap();
    let context = Weaver::new(WeaverConfig::default())
        .weave(classes, Settings::default(), &objects)
        .unwrap();
    ProxyFactory::new(context, Arc::new(objects))
        .unwrap()
        .instantiate("Acme::Svc", ArgVec::new())
        .unwrap()
}

#[test]
fn test_declared_static_constructor_runs_its_advice() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let service = outcome_service(&log, false);
    assert!(service.table().is_intercepted("new"));
    assert_eq!(log.lock().unwrap().clone(), vec!["init"]);
}

#[test]
fn test_failing_after_returning_advice_switches_to_throw_path() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let service = outcome_service(&log, false);
    log.lock().unwrap().clear();

    let err = service.call("run", ArgVec::new()).unwrap_err();
    assert_eq!(err.class, "R1");
    assert_eq!(log.lock().unwrap().clone(), vec!["r1", "thr:R1", "fin"]);
}

#[test]
fn test_failing_after_throwing_advice_replaces_the_error() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let service = outcome_service(&log, true);
    log.lock().unwrap().clear();

    let err = service.call("run", ArgVec::new()).unwrap_err();
    assert_eq!(err.class, "Thrown");
    assert_eq!(log.lock().unwrap().clone(), vec!["r1", "thr:R1"]);
}
