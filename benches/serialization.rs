use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_tson::{from_str, to_string, to_string_pretty, value_from_str, MultiArray};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Clone)]
struct Inventory {
    id: u32,
    by_sku: BTreeMap<String, Product>,
    by_bin: BTreeMap<(u8, u8), Vec<u32>>,
    heights: MultiArray<f64>,
}

fn user() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    }
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product \"{}\"", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

fn inventory() -> Inventory {
    Inventory {
        id: 42,
        by_sku: products(20).into_iter().map(|p| (p.sku.clone(), p)).collect(),
        by_bin: (0..20u8).map(|i| ((i / 4, i % 4), vec![u32::from(i); 3])).collect(),
        heights: MultiArray::from_fn(vec![8, 8, 4], |i| (i[0] * i[1] + i[2]) as f64 / 4.0)
            .unwrap(),
    }
}

fn benchmark_serialize_simple(c: &mut Criterion) {
    let user = user();

    c.bench_function("serialize_simple_struct", |b| {
        b.iter(|| to_string(black_box(&user)))
    });
}

fn benchmark_deserialize_simple(c: &mut Criterion) {
    let tson = "{id:123,name:\"Alice\",email:\"alice@example.com\",active:True}";

    c.bench_function("deserialize_simple_struct", |b| {
        b.iter(|| from_str::<User>(black_box(tson)))
    });
}

fn benchmark_serialize_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_array");

    for size in [10, 50, 100, 500].iter() {
        let products = products(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| to_string(black_box(&products)))
        });
    }
    group.finish();
}

fn benchmark_deserialize_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize_array");

    for size in [10, 50, 100, 500].iter() {
        let tson = to_string(&products(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &tson, |b, tson| {
            b.iter(|| from_str::<Vec<Product>>(black_box(tson)))
        });
    }
    group.finish();
}

fn benchmark_composites(c: &mut Criterion) {
    let mut group = c.benchmark_group("composites");
    let data = inventory();
    let compact = to_string(&data).unwrap();
    let pretty = to_string_pretty(&data).unwrap();

    group.bench_function("serialize_compact", |b| {
        b.iter(|| to_string(black_box(&data)))
    });
    group.bench_function("serialize_pretty", |b| {
        b.iter(|| to_string_pretty(black_box(&data)))
    });
    group.bench_function("deserialize_compact", |b| {
        b.iter(|| from_str::<Inventory>(black_box(&compact)))
    });
    group.bench_function("deserialize_pretty", |b| {
        b.iter(|| from_str::<Inventory>(black_box(&pretty)))
    });
    group.bench_function("parse_value", |b| {
        b.iter(|| value_from_str(black_box(&compact)))
    });
    group.finish();
}

fn benchmark_primitive_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitive_array");

    let numbers: Vec<i32> = (0..100).collect();
    let bools: Vec<bool> = (0..100).map(|i| i % 2 == 0).collect();
    let floats: Vec<f64> = (0..100).map(|i| i as f64 * 1.5).collect();

    group.bench_function("serialize_integers", |b| {
        b.iter(|| to_string(black_box(&numbers)))
    });

    group.bench_function("serialize_booleans", |b| {
        b.iter(|| to_string(black_box(&bools)))
    });

    group.bench_function("serialize_floats", |b| {
        b.iter(|| to_string(black_box(&floats)))
    });

    let numbers_tson = to_string(&numbers).unwrap();
    let bools_tson = to_string(&bools).unwrap();
    let floats_tson = to_string(&floats).unwrap();

    group.bench_function("deserialize_integers", |b| {
        b.iter(|| from_str::<Vec<i32>>(black_box(&numbers_tson)))
    });

    group.bench_function("deserialize_booleans", |b| {
        b.iter(|| from_str::<Vec<bool>>(black_box(&bools_tson)))
    });

    group.bench_function("deserialize_floats", |b| {
        b.iter(|| from_str::<Vec<f64>>(black_box(&floats_tson)))
    });

    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let user = user();

    let mut group = c.benchmark_group("comparison");

    group.bench_function("tson_serialize", |b| {
        b.iter(|| serde_tson::to_string(black_box(&user)))
    });

    group.bench_function("json_serialize", |b| {
        b.iter(|| serde_json::to_string(black_box(&user)))
    });

    let tson_str = serde_tson::to_string(&user).unwrap();
    let json_str = serde_json::to_string(&user).unwrap();

    group.bench_function("tson_deserialize", |b| {
        b.iter(|| serde_tson::from_str::<User>(black_box(&tson_str)))
    });

    group.bench_function("json_deserialize", |b| {
        b.iter(|| serde_json::from_str::<User>(black_box(&json_str)))
    });

    group.finish();
}

fn benchmark_record_store(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.tson");
    for i in 0..200 {
        serde_tson::append_to_file(&path, &user(), &format!("user{}", i), Default::default())
            .unwrap();
    }

    c.bench_function("store_lookup_last_segment", |b| {
        b.iter(|| serde_tson::from_appended::<_, User>(black_box(&path), "user199"))
    });
}

criterion_group!(
    benches,
    benchmark_serialize_simple,
    benchmark_deserialize_simple,
    benchmark_serialize_array,
    benchmark_deserialize_array,
    benchmark_composites,
    benchmark_primitive_array,
    benchmark_comparison_with_json,
    benchmark_record_store
);
criterion_main!(benches);
