use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use universe_core::prelude::*;

/// `count` ships on a circle, each chasing the next one round.
fn ring(count: u64) -> UniverseState {
    let mut entities = serde_json::Map::new();
    for id in 0..count {
        let angle = id as f64 / count as f64 * std::f64::consts::TAU;
        entities.insert(
            id.to_string(),
            json!({
                "type": "ship",
                "x": (500.0 + 200.0 * angle.cos()).round() as i64,
                "y": (500.0 + 200.0 * angle.sin()).round() as i64,
                "queue": [{"target_id": (id + 1) % count, "warp": 10}],
            }),
        );
    }
    serde_json::from_value(json!({"turn": 1, "width": 1000, "entities": entities})).unwrap()
}

fn bench_interception(c: &mut Criterion) {
    let four = ring(4);
    c.bench_function("four_way_cycle", |b| {
        b.iter(|| GameState::new(black_box(four.clone()), Updates::new()).generate().unwrap())
    });

    let large = ring(64);
    c.bench_function("sixty_four_way_cycle", |b| {
        b.iter(|| GameState::new(black_box(large.clone()), Updates::new()).generate().unwrap())
    });
}

criterion_group!(benches, bench_interception);
criterion_main!(benches);
