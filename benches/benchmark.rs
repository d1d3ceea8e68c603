// Performance benchmarks for scoring, delta ingestion and full queries
use carematch::math::cosine_similarity;
use carematch::prelude::*;
use carematch::EmbeddingStore;
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use std::sync::Arc;

fn generate_random_vector(rng: &mut StdRng, dim: usize) -> Vector {
    let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    Vector::new(data)
}

fn build_collection(size: usize, dim: usize) -> Collection {
    let mut rng = StdRng::seed_from_u64(1);
    let mut collection = Collection::new(CollectionConfig::named("doctors")).unwrap();
    for i in 0..size {
        let entity = Entity::new(
            format!("doc-{}", i),
            EntityKind::Doctor,
            format!("Doctor {}", i),
            GeoPoint::new(77.0 + rng.random_range(0.0..0.5), 28.4 + rng.random_range(0.0..0.5)),
        )
        .with_attributes(Attributes {
            rating: Some(rng.random_range(3.0..5.0)),
            slots: Some(rng.random_range(0..10)),
            ..Attributes::default()
        });
        collection
            .insert(entity, Some(generate_random_vector(&mut rng, dim)))
            .unwrap();
    }
    collection
}

fn benchmark_cosine(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine");
    let mut rng = StdRng::seed_from_u64(2);

    for dim in [128, 384, 1536].iter() {
        let a = generate_random_vector(&mut rng, *dim);
        let b = generate_random_vector(&mut rng, *dim);
        group.bench_with_input(BenchmarkId::from_parameter(dim), dim, |bench, _| {
            bench.iter(|| cosine_similarity(black_box(a.as_slice()), black_box(b.as_slice())).unwrap());
        });
    }

    group.finish();
}

fn benchmark_ingest(c: &mut Criterion) {
    let store = Arc::new(EmbeddingStore::default());
    let mut rng = StdRng::seed_from_u64(3);
    for i in 0..1000 {
        store
            .set_base(format!("doc-{}", i), generate_random_vector(&mut rng, 128))
            .unwrap();
    }
    let ingestor = DeltaIngestor::new(store, DeltaSchema::default());

    c.bench_function("ingest_availability_change", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let event = UpdateEvent::new(
                format!("doc-{}", i % 1000),
                Utc::now(),
                Change::AvailabilityChange { slots: (i % 10) as u32 },
            );
            ingestor.ingest(black_box(event)).unwrap();
            i += 1;
        });
    });
}

fn benchmark_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for size in [1000, 10000].iter() {
        let registry = Arc::new(CollectionRegistry::new());
        registry.insert(build_collection(*size, 128));
        let engine = RankingEngine::new(registry, Arc::new(DisabledProvider), EngineConfig::default());
        let query = Query::text("cardiologist near connaught place")
            .with_filters(SearchFilters {
                availability: true,
                ..SearchFilters::default()
            })
            .near(GeoPoint::new(77.2167, 28.6315), Some(25.0))
            .with_limit(10);

        group.bench_with_input(BenchmarkId::new("fallback_text", size), size, |b, _| {
            b.iter(|| runtime.block_on(engine.search("doctors", black_box(&query))).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_cosine, benchmark_ingest, benchmark_search);
criterion_main!(benches);
