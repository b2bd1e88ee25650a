use std::sync::Arc;

use canoniq::{
    disambiguate, AliasCatalog, AliasProvenance, Confidence, DisambiguationOutcome, EngineConfig,
    InMemoryPropertyIndex, LocationDirectory, LocationResolver, PhoneResolution, ResolutionResult,
    Scope, SharedRegistry,
};

const SEVEN_PALM: &str = "SEVEN HOTEL & APARTMENTS THE PALM";

fn directory() -> LocationDirectory {
    let mut dir = LocationDirectory::new();
    dir.add_community("Palm Jumeirah");
    dir.add_community("Dubai Marina");
    dir.add_community("Jumeirah Village Circle");
    dir.add_building(SEVEN_PALM, "Palm Jumeirah", None);
    dir.add_building("Marina Gate", "Dubai Marina", None);
    dir
}

fn catalog() -> AliasCatalog {
    let mut catalog = AliasCatalog::new();
    catalog
        .upsert_alias(
            "Seven Palm",
            SEVEN_PALM,
            Scope::Building,
            Confidence::one(),
            AliasProvenance::Manual,
        )
        .unwrap();
    catalog
        .upsert_alias(
            "the palm",
            "Palm Jumeirah",
            Scope::Community,
            Confidence::one(),
            AliasProvenance::Manual,
        )
        .unwrap();
    catalog
        .upsert_alias(
            "jvc",
            "Jumeirah Village Circle",
            Scope::Community,
            Confidence::one(),
            AliasProvenance::Manual,
        )
        .unwrap();
    catalog
        .upsert_alias(
            "marina gate",
            "Marina Gate",
            Scope::Building,
            Confidence::new(0.9).unwrap(),
            AliasProvenance::Ingested,
        )
        .unwrap();
    catalog
}

fn store() -> InMemoryPropertyIndex {
    let mut index = InMemoryPropertyIndex::new();
    index.insert("905", SEVEN_PALM, "Palm Jumeirah");
    index.insert("905", "Marina Gate", "Dubai Marina");
    index.insert("1203", "Marina Gate", "Dubai Marina");
    index
}

fn resolver() -> LocationResolver {
    let registry = Arc::new(catalog().snapshot(&directory()).unwrap());
    LocationResolver::new(registry, Arc::new(store()), &EngineConfig::default())
}

#[test]
fn sentence_query_resolves_aliased_building() {
    let result = resolver().resolve_location("Who owns 905 at Seven Palm?", Some("905"));

    let ResolutionResult::Resolved {
        location,
        confidence,
    } = result
    else {
        panic!("expected resolved, got {result:?}");
    };
    assert_eq!(location.building.as_deref(), Some(SEVEN_PALM));
    assert_eq!(location.master_community, "Palm Jumeirah");
    assert_eq!(confidence, Confidence::one());
}

#[test]
fn unit_only_query_lists_every_containing_building() {
    let result = resolver().resolve_location("905", Some("905"));

    let ResolutionResult::Ambiguous { candidates } = result else {
        panic!("expected ambiguous, got {result:?}");
    };
    let mut buildings: Vec<&str> = candidates
        .iter()
        .filter_map(|c| c.location.building.as_deref())
        .collect();
    buildings.sort_unstable();
    assert_eq!(buildings, vec!["Marina Gate", SEVEN_PALM]);
    assert!(candidates
        .iter()
        .all(|c| c.example_phrase.starts_with("905 at ")));
}

#[test]
fn abbreviation_alias_resolves_community() {
    // Exact alias hit.
    let direct = resolver().resolve_location("JVC", None);
    let ResolutionResult::Resolved { location, .. } = direct else {
        panic!("expected resolved");
    };
    assert_eq!(location.master_community, "Jumeirah Village Circle");

    // The same alias embedded in a longer sentence resolves through the
    // mention scan.
    let embedded = resolver().resolve_location("any villas in JVC?", None);
    let ResolutionResult::Resolved { location, .. } = embedded else {
        panic!("expected resolved, got {embedded:?}");
    };
    assert_eq!(location.master_community, "Jumeirah Village Circle");
}

#[test]
fn repeated_calls_are_identical() {
    let resolver = resolver();
    let first = resolver.resolve_location("905", Some("905"));
    for _ in 0..10 {
        assert_eq!(resolver.resolve_location("905", Some("905")), first);
    }
}

#[test]
fn registry_reload_swaps_snapshot_atomically() {
    let shared = SharedRegistry::new(catalog().snapshot(&directory()).unwrap());

    let before = shared.current();
    let resolver_before = LocationResolver::new(
        Arc::clone(&before),
        Arc::new(store()),
        &EngineConfig::default(),
    );

    // Curate a new alias and reload.
    let mut catalog = catalog();
    catalog
        .upsert_alias(
            "7 palm",
            SEVEN_PALM,
            Scope::Building,
            Confidence::one(),
            AliasProvenance::Manual,
        )
        .unwrap();
    shared.reload(catalog.snapshot(&directory()).unwrap());

    // In-flight sessions keep the old snapshot.
    assert!(matches!(
        resolver_before.resolve_location("7 palm", None),
        ResolutionResult::Unresolved
    ));

    // New sessions see the new alias.
    let resolver_after = LocationResolver::new(
        shared.current(),
        Arc::new(store()),
        &EngineConfig::default(),
    );
    assert!(resolver_after.resolve_location("7 palm", None).is_resolved());
}

#[test]
fn protocol_round_trip_narrows_ambiguity() {
    let resolver = resolver();

    let first = disambiguate(&resolver, "905", Some("905"));
    let DisambiguationOutcome::AwaitingClarification { options, .. } = first else {
        panic!("expected clarification, got {first:?}");
    };
    assert_eq!(options.len(), 2);

    // The caller picks a phrase and re-invokes; the engine held no state.
    let phrase = options
        .iter()
        .find(|o| o.location.building.as_deref() == Some("Marina Gate"))
        .map(|o| o.example_phrase.clone())
        .unwrap();
    let second = disambiguate(&resolver, &phrase, Some("905"));
    let DisambiguationOutcome::Resolved { location, .. } = second else {
        panic!("expected resolved, got {second:?}");
    };
    assert_eq!(location.building.as_deref(), Some("Marina Gate"));
}

#[test]
fn phone_normalization_properties_hold() {
    // The documented fixed points.
    let cases = [
        ("0501234567", "+971501234567"),
        ("971501234567", "+971501234567"),
        ("+971501234567", "+971501234567"),
        ("050 123 4567", "+971501234567"),
    ];
    for (raw, expected) in cases {
        let PhoneResolution::Normalized(phone) = canoniq::resolve_phone(Some(raw)) else {
            panic!("expected normalized for {raw:?}");
        };
        assert_eq!(phone.as_str(), expected);
    }

    assert_eq!(canoniq::resolve_phone(Some("")), PhoneResolution::None);
    assert_eq!(canoniq::resolve_phone(None), PhoneResolution::None);

    // Totality over arbitrary garbage, and idempotence.
    for garbage in ["##", "abc", "+", "0", "99999999999999999999"] {
        let once = canoniq::resolve_phone(Some(garbage));
        if let PhoneResolution::Normalized(phone) = &once {
            assert_eq!(
                canoniq::resolve_phone(Some(phone.as_str())),
                once,
                "not idempotent for {garbage:?}"
            );
        }
    }
}

#[test]
fn upsert_is_idempotent_under_same_key() {
    let mut catalog = AliasCatalog::new();
    catalog
        .upsert_alias(
            "Seven Palm",
            SEVEN_PALM,
            Scope::Building,
            Confidence::new(0.7).unwrap(),
            AliasProvenance::Inferred,
        )
        .unwrap();
    catalog
        .upsert_alias(
            "SEVEN PALM",
            SEVEN_PALM,
            Scope::Building,
            Confidence::one(),
            AliasProvenance::Manual,
        )
        .unwrap();

    assert_eq!(catalog.len(), 1);
    let registry = catalog.snapshot(&directory()).unwrap();
    assert_eq!(registry.entries().len(), 1);
    assert_eq!(registry.entries()[0].confidence, Confidence::one());
}
