use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hashbridge_abi::{BuiltinKind, InitPayload, MethodId, TypeId};
use hashbridge_runtime::{InvokeError, ObjectRegistry, ScalarKind, TypeDescriptor, Value};

fn registry() -> ObjectRegistry {
    let adder = TypeDescriptor::new("Bench.IAdder", "crate")
        .method("Add", &["System.Int32", "System.Int32"], "System.Int32", |_, args| {
            match (args[0].as_i32(), args[1].as_i32()) {
                (Some(a), Some(b)) => Ok(Value::from(a.wrapping_add(b))),
                _ => Err(InvokeError::argument(0, "System.Int32")),
            }
        })
        .method("Touch", &[], "System.Void", |_, _| Ok(Value::Void));
    ObjectRegistry::builder().register(adder).build().unwrap()
}

fn bench_construct(c: &mut Criterion) {
    let registry = registry();
    let int32 = BuiltinKind::Int32.type_id();

    c.bench_function("construct_free_int32", |b| {
        b.iter(|| {
            let handle = registry
                .construct(int32, InitPayload::Scalar(&black_box(42i32).to_le_bytes()))
                .unwrap();
            registry.free(handle).unwrap();
        });
    });

    c.bench_function("construct_string", |b| {
        b.iter(|| {
            let handle = registry
                .construct(
                    BuiltinKind::String.type_id(),
                    InitPayload::String(black_box("sample.mod")),
                )
                .unwrap();
            registry.free(handle).unwrap();
        });
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let registry = registry();
    let adder = TypeId::of_path("crate::bench::IAdder");
    let add = MethodId::of_signature("Add", ["System.Int32", "System.Int32"]);
    let touch = MethodId::of_signature("Touch", [] as [&str; 0]);
    let int32 = BuiltinKind::Int32.type_id();
    let a = registry.construct(int32, InitPayload::Scalar(&1i32.to_le_bytes())).unwrap();
    let b_arg = registry.construct(int32, InitPayload::Scalar(&2i32.to_le_bytes())).unwrap();

    c.bench_function("call_void_no_args", |b| {
        b.iter(|| {
            let marker = registry.call_function(adder, touch, Default::default()).unwrap();
            registry.free(marker).unwrap();
        });
    });

    c.bench_function("call_add_two_args", |b| {
        b.iter(|| {
            registry.push_parameter(adder, add, black_box(a)).unwrap();
            registry.push_parameter(adder, add, black_box(b_arg)).unwrap();
            let result = registry.call_function(adder, add, Default::default()).unwrap();
            let sum = registry.coerce(result, ScalarKind::U32).unwrap();
            registry.free(result).unwrap();
            sum
        });
    });
}

criterion_group!(benches, bench_construct, bench_dispatch);
criterion_main!(benches);
