use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use canoniq::{
    AliasCatalog, AliasProvenance, ClusterEngine, ClusteringConfig, Confidence, EngineConfig,
    InMemoryPropertyIndex, LocationDirectory, LocationResolver, OwnerRecordRaw, PhoneNormalizer,
    Scope, SourceRef, TransactionSide,
};

fn make_resolver(alias_count: usize) -> LocationResolver {
    let mut directory = LocationDirectory::new();
    let mut catalog = AliasCatalog::new();

    for i in 0..alias_count {
        let canonical = format!("Tower {i} Residences");
        directory.add_building(canonical.clone(), format!("Community {}", i % 40), None);
        catalog
            .upsert_alias(
                format!("tower {i}"),
                canonical,
                Scope::Building,
                Confidence::one(),
                AliasProvenance::Ingested,
            )
            .unwrap();
    }

    let mut store = InMemoryPropertyIndex::new();
    for i in 0..alias_count {
        store.insert("905", format!("Tower {i} Residences"), format!("Community {}", i % 40));
    }

    let registry = Arc::new(catalog.snapshot(&directory).unwrap());
    LocationResolver::new(registry, Arc::new(store), &EngineConfig::default())
}

fn bench_resolve_exact(c: &mut Criterion) {
    let resolver = make_resolver(2_000);
    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(1));
    group.bench_function("exact_alias", |b| {
        b.iter(|| resolver.resolve_location("tower 1203", None));
    });
    group.bench_function("fuzzy_alias", |b| {
        b.iter(|| resolver.resolve_location("towr 1203", None));
    });
    group.bench_function("sentence_with_unit", |b| {
        b.iter(|| resolver.resolve_location("who owns 905 at tower 1203?", Some("905")));
    });
    group.finish();
}

fn make_records(count: usize) -> Vec<OwnerRecordRaw> {
    let normalizer = PhoneNormalizer::default();
    let epoch = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    (0..count)
        .map(|i| {
            OwnerRecordRaw::new(
                format!("FAMILY{} MEMBER{}", i % 500, i),
                Some(&format!("0501{:06}", i % 700)),
                SourceRef::new(format!("t{i}"), TransactionSide::Buyer, epoch),
                &normalizer,
            )
            .unwrap()
        })
        .collect()
}

fn bench_clustering(c: &mut Criterion) {
    let records = make_records(2_000);
    let mut group = c.benchmark_group("cluster");
    group.sample_size(10);
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("batch_2k", |b| {
        b.iter(|| {
            ClusterEngine::new(ClusteringConfig::default())
                .cluster_owners(&records)
                .unwrap()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_resolve_exact, bench_clustering);
criterion_main!(benches);
