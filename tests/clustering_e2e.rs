use std::thread;

use chrono::{TimeZone, Utc};

use canoniq::{
    AssignOutcome, CancelFlag, ClusterEngine, ClusterError, ClusteringConfig, OwnerRecordRaw,
    PhoneNormalizer, SourceRef, TransactionSide,
};

fn record(name: &str, phone: Option<&str>, id: &str) -> OwnerRecordRaw {
    OwnerRecordRaw::new(
        name,
        phone,
        SourceRef::new(
            id,
            TransactionSide::Buyer,
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ),
        &PhoneNormalizer::default(),
    )
    .unwrap()
}

#[test]
fn end_to_end_batch_over_mixed_records() {
    let records = vec![
        // One person, three phone formats and a spelling variant.
        record("MOHAMMED AHMED", Some("0501234567"), "t1"),
        record("MOHAMED AHMED", Some("+971501234567"), "t2"),
        record("MOHAMMED AHMED", Some("971501234567"), "t3"),
        // A second person sharing a forename: must stay separate.
        record("MOHAMMED KHAN", Some("0509876543"), "t4"),
        // Institutional sides.
        record("EMAAR PROPERTIES", None, "t5"),
        record("EMAAR PROPERTIES LLC", None, "t6"),
        record("DUBAI ISLAMIC BANK PJSC", None, "t7"),
    ];

    let engine = ClusterEngine::new(ClusteringConfig::default());
    let report = engine.cluster_owners(&records).unwrap();

    assert_eq!(report.stats.records_in, 7);
    assert_eq!(report.identities.len(), 4);

    let person = report
        .identities
        .iter()
        .find(|i| i.representative_name == "MOHAMMED AHMED")
        .unwrap();
    assert_eq!(person.member_count(), 3);
    assert_eq!(person.phones.len(), 1);
    assert_eq!(person.name_variants.len(), 2);
    assert!(!person.needs_verification);

    let khan = report
        .identities
        .iter()
        .find(|i| i.representative_name == "MOHAMMED KHAN")
        .unwrap();
    assert_eq!(khan.member_count(), 1);

    let emaar = report
        .identities
        .iter()
        .find(|i| i.representative_name.starts_with("EMAAR"))
        .unwrap();
    assert!(emaar.is_institutional());
    assert_eq!(emaar.member_count(), 2);
}

#[test]
fn conflicting_evidence_is_flagged_not_merged() {
    let records = vec![
        record("SARAH AL MANSOORI", Some("0501111111"), "t1"),
        record("SARA AL MANSOORI", Some("0502222222"), "t2"),
    ];

    let engine = ClusterEngine::new(ClusteringConfig::default());
    let report = engine.cluster_owners(&records).unwrap();

    assert_eq!(report.identities.len(), 2);
    assert!(report.identities.iter().all(|i| i.needs_verification));
    assert_eq!(report.weak_links.len(), 1);
}

#[test]
fn batch_then_incremental_assignment() {
    let engine = ClusterEngine::new(ClusteringConfig::default());
    engine
        .cluster_owners(&[
            record("MOHAMMED AHMED", Some("0501234567"), "t1"),
            record("EMAAR PROPERTIES", None, "t2"),
        ])
        .unwrap();

    // Phone evidence assigns immediately.
    let by_phone = engine.assign_owner(&record("M AHMED", Some("050 123 4567"), "t3"));
    assert!(matches!(by_phone, AssignOutcome::Assigned(_)));

    // A brand-new person founds a new identity.
    let fresh = engine.assign_owner(&record("FATIMA HASSAN", Some("0505555555"), "t4"));
    assert!(matches!(fresh, AssignOutcome::Assigned(_)));

    // Name-only evidence parks for verification under default thresholds.
    let parked = engine.assign_owner(&record("MOHAMED AHMED", None, "t5"));
    assert!(matches!(parked, AssignOutcome::NeedsVerification { .. }));

    assert_eq!(engine.identities().len(), 3);
}

#[test]
fn concurrent_batches_are_mutually_exclusive() {
    let engine = std::sync::Arc::new(ClusterEngine::new(ClusteringConfig::default()));

    // A large batch to keep the run lock held while the second starts.
    let big: Vec<OwnerRecordRaw> = (0..3_000)
        .map(|i| {
            record(
                &format!("FAMILY{} MEMBER{}", i % 400, i),
                Some(&format!("0501{:06}", i % 900)),
                &format!("t{i}"),
            )
        })
        .collect();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let engine = std::sync::Arc::clone(&engine);
        let big = big.clone();
        handles.push(thread::spawn(move || engine.cluster_owners(&big)));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let busy = results
        .iter()
        .filter(|r| matches!(r, Err(ClusterError::RunInProgress)))
        .count();

    // At least one run wins; every loser failed with the run lock, nothing
    // else.
    assert!(ok >= 1);
    assert_eq!(ok + busy, 4);

    // The committed snapshot reflects a complete run, never a blend.
    assert!(!engine.identities().is_empty());
}

#[test]
fn cancellation_discards_everything() {
    let engine = ClusterEngine::new(ClusteringConfig::default());
    let cancel = CancelFlag::new();
    cancel.cancel();

    let result = engine.cluster_owners_with_cancel(
        &[record("MOHAMMED AHMED", Some("0501234567"), "t1")],
        &cancel,
    );

    assert!(matches!(result, Err(ClusterError::Cancelled { .. })));
    assert!(engine.identities().is_empty());

    // A fresh flag lets the same engine run normally afterwards.
    let report = engine
        .cluster_owners(&[record("MOHAMMED AHMED", Some("0501234567"), "t1")])
        .unwrap();
    assert_eq!(report.identities.len(), 1);
}

#[test]
fn rerun_is_reproducible() {
    let records: Vec<OwnerRecordRaw> = (0..200)
        .map(|i| {
            let phone = if i % 3 == 0 {
                None
            } else {
                Some(format!("0501{:06}", i % 45))
            };
            record(&format!("OWNER {}", i % 60), phone.as_deref(), &format!("t{i}"))
        })
        .collect();

    let first = ClusterEngine::new(ClusteringConfig::default())
        .cluster_owners(&records)
        .unwrap();
    let second = ClusterEngine::new(ClusteringConfig::default())
        .cluster_owners(&records)
        .unwrap();

    assert_eq!(first.stats, second.stats);
    let names: Vec<_> = first
        .identities
        .iter()
        .map(|i| (&i.representative_name, i.member_count()))
        .collect();
    let names2: Vec<_> = second
        .identities
        .iter()
        .map(|i| (&i.representative_name, i.member_count()))
        .collect();
    assert_eq!(names, names2);
}
