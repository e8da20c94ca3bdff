use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use migsql::{DynamicNameDdl, Fields, generate};

/// Build a field list with `n` integer columns: col0 = 0, col1 = 1, ...
fn build_fields(n: usize) -> Fields {
    (0..n).map(|i| (format!("t.col{i}"), i as i64)).collect()
}

fn bench_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_builder/upsert");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let unit = generate(|p| p.upsert(build_fields(n))).unwrap();
                black_box(unit.sql);
            });
        });
    }

    group.finish();
}

fn bench_update_where(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_builder/update_where");

    for n in [1, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let unit = generate(|p| {
                    let set = p.upsert(build_fields(n))?;
                    let filter = p.emit_if(true, |p| {
                        Ok(format!(" WHERE {}", p.all_equal(build_fields(n))?))
                    })?;
                    Ok(format!("UPDATE t SET {set}{filter}"))
                })
                .unwrap();
                black_box(unit);
            });
        });
    }

    group.finish();
}

fn bench_array_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_builder/array_bind");

    for n in [5, 100, 1000] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let unit = generate(|p| p.bind(values.clone())).unwrap();
                black_box(unit.types);
            });
        });
    }

    group.finish();
}

fn bench_dynamic_ddl(c: &mut Criterion) {
    c.bench_function("fragment_builder/dynamic_ddl", |b| {
        b.iter(|| {
            let sql = DynamicNameDdl::new(
                "CREATE TABLE",
                black_box("b_iblock_?_prop_?"),
                "SELECT ID FROM b_iblock WHERE CODE = 'catalog'",
            )
            .definition("(id INT NOT NULL, value TEXT)")
            .to_sql()
            .unwrap();
            black_box(sql);
        });
    });
}

criterion_group!(
    benches,
    bench_upsert,
    bench_update_where,
    bench_array_bind,
    bench_dynamic_ddl
);
criterion_main!(benches);
