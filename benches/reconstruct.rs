//! Benchmarks for structure reconstruction and animation sessions.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use mechtrace::{
    animation::{AnimationSession, MemoryEncoder},
    geometry::{Point2, Topology},
    schema::AnimationSettings,
    table::{Schema, Table},
};

/// Hanging chain of `bodies` masses swinging over `rows` samples.
fn chain_table(bodies: usize, rows: usize) -> Table {
    let time: Vec<f64> = (0..rows).map(|i| i as f64 * 0.01).collect();
    let mut columns = vec![("t".to_string(), time.clone())];
    for k in 0..bodies {
        let reach = (k + 1) as f64;
        columns.push((
            format!("x{}", k),
            time.iter().map(|t| reach * (0.3 * t.sin())).collect(),
        ));
        columns.push((
            format!("y{}", k),
            time.iter().map(|t| -reach * (0.3 * t.sin()).cos()).collect(),
        ));
    }
    Table::from_columns(columns).expect("valid chain table")
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");
    let topology = Topology::LinearChain {
        anchor: Point2::ORIGIN,
    };

    for bodies in [2, 8, 32, 128] {
        let table = chain_table(bodies, 1000);
        let schema = Schema::resolve(&table).expect("named schema");

        group.bench_with_input(BenchmarkId::from_parameter(format!("{}_bodies", bodies)), &bodies, |b, _| {
            b.iter(|| {
                for row in (0..1000).step_by(10) {
                    black_box(topology.reconstruct(&table, &schema, black_box(row)).expect("row in range"));
                }
            });
        });
    }

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("animation_session");
    let topology = Topology::LinearChain {
        anchor: Point2::ORIGIN,
    };
    let table = chain_table(8, 5000);
    let schema = Schema::resolve(&table).expect("named schema");

    for stride in [1, 5, 25] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("stride_{}", stride)), &stride, |b, &stride| {
            b.iter(|| {
                let settings = AnimationSettings {
                    stride,
                    show_trace: true,
                    ..Default::default()
                };
                let mut encoder = MemoryEncoder::new();
                AnimationSession::new(&table, &schema, topology, settings)
                    .run(&mut encoder)
                    .expect("session completes")
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reconstruct, bench_session);
criterion_main!(benches);
