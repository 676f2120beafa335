use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use gild_engine::core::{CapabilityDef, ParamType, ReturnType, Value};
use gild_engine::{
    DecorateOptions, Decorator, DecoratedTypeFactory, Marker, MethodDef, ServiceMap, TypeDef,
};

fn bench_factory() -> DecoratedTypeFactory {
    let services = Arc::new(ServiceMap::new());
    services.register("Logger", Value::str("bench-logger"));

    let action = CapabilityDef::new("Action", vec![ParamType::Any], ReturnType::Void);
    let def = TypeDef::builder("Bench")
        .method(
            MethodDef::new("echo", |_, args| Ok(args[0].clone()))
                .param(ParamType::Int)
                .returns(ParamType::Int),
        )
        .method(
            MethodDef::new("on", |_, _| Ok(Value::Null))
                .param(ParamType::Int)
                .param(ParamType::capability(&action)),
        )
        .method(
            MethodDef::new("on", |_, _| Ok(Value::Null))
                .param(ParamType::Str)
                .param(ParamType::capability(&action)),
        )
        .method(
            MethodDef::new("on", |_, _| Ok(Value::Null))
                .param(ParamType::Any)
                .param(ParamType::capability(&action)),
        )
        .method(
            MethodDef::new("logger", |_, _| Ok(Value::Null))
                .returns(ParamType::service("Logger"))
                .marker(Marker::new("inject")),
        )
        .build();

    Decorator::new(DecorateOptions::default(), services)
        .decorate(&def)
        .unwrap()
}

fn bench_declared_call(c: &mut Criterion) {
    let inst = bench_factory().instantiate(&[]).unwrap();

    c.bench_function("invoke_declared", |b| {
        b.iter(|| inst.invoke(black_box("echo"), &[Value::int(7)]).unwrap());
    });
}

fn bench_overloaded_call(c: &mut Criterion) {
    let inst = bench_factory().instantiate(&[]).unwrap();

    c.bench_function("invoke_overloaded_with_coercion", |b| {
        b.iter(|| {
            let callback = Value::callable(|_| Ok(Value::Null));
            inst.invoke(black_box("on"), &[Value::str("key"), callback])
                .unwrap()
        });
    });
}

fn bench_injected_read(c: &mut Criterion) {
    let inst = bench_factory().instantiate(&[]).unwrap();
    // Settle the slot so the loop measures the cached read path
    inst.get("logger").unwrap();

    c.bench_function("injected_read_cached", |b| {
        b.iter(|| inst.get(black_box("logger")).unwrap());
    });
}

criterion_group!(
    benches,
    bench_declared_call,
    bench_overloaded_call,
    bench_injected_read
);
criterion_main!(benches);
