use std::sync::Arc;

use corral_common::error::{AcquireError, AddressFamily, CatalogError};
use corral_common::job::JobId;
use corral_common::request::AcquisitionRequest;
use corral_common::target::{RawRecord, Target};
use corral_plugins::lockers::NoopLocker;

use crate::support::{ObservedLocker, ids, init_logging, manager, web_records};

#[tokio::test]
async fn locks_up_to_the_maximum_and_skips_blank_rows() {
    init_logging();
    let mut records = web_records(5);
    records.insert(2, RawRecord::default());
    let locker = ObservedLocker::new();
    let manager = manager(records, locker.clone());

    let locked = manager
        .acquire(JobId(1), &AcquisitionRequest::new(3, 4))
        .await
        .unwrap();

    assert_eq!(ids(&locked), ["T1", "T2", "T3", "T4"]);
    assert!(locked.iter().all(|t| locker.holder(&t.id) == Some(JobId(1))));
    assert_eq!(locker.holder("T5"), None);
}

#[tokio::test]
async fn prefix_filter_limits_the_candidates() {
    init_logging();
    let records = vec![
        RawRecord::new("1", "web01.example.com", "", ""),
        RawRecord::new("2", "db01.example.com", "", ""),
        RawRecord::new("3", "", "10.1.1.1", ""),
    ];
    let manager = manager(records, Arc::new(NoopLocker));

    let request = AcquisitionRequest::new(1, 10)
        .with_prefixes([" web "])
        .validate()
        .unwrap();
    let locked = manager.acquire(JobId(2), &request).await.unwrap();

    assert_eq!(locked.len(), 1);
    assert_eq!(locked[0].display_name.as_deref(), Some("web01.example.com"));
}

#[tokio::test]
async fn invalid_address_aborts_before_locking() {
    init_logging();
    let mut records = web_records(3);
    records.push(RawRecord::new("h1", "", "999.999.999.999", ""));
    let locker = ObservedLocker::new();
    let manager = manager(records, locker.clone());

    let err = manager
        .acquire(JobId(3), &AcquisitionRequest::new(1, 2))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<CatalogError>(),
        Some(&CatalogError::InvalidAddress {
            id: "h1".into(),
            family: AddressFamily::V4,
            value: "999.999.999.999".into(),
        })
    );
    assert!(err.to_string().contains("999.999.999.999"));
    assert_eq!(locker.calls(), 0);
}

#[tokio::test]
async fn repeated_catalog_id_aborts_before_locking() {
    init_logging();
    let records = vec![
        RawRecord::new("T1", "web01.example.com", "", ""),
        RawRecord::new("T1", "web01.example.com", "", ""),
        RawRecord::new("T2", "web02.example.com", "", ""),
    ];
    let locker = ObservedLocker::new();
    let manager = manager(records, locker.clone());

    let err = manager
        .acquire(JobId(5), &AcquisitionRequest::new(1, 3))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<CatalogError>(),
        Some(&CatalogError::DuplicateId {
            id: "T1".into(),
            index: 1,
        })
    );
    assert_eq!(locker.calls(), 0);
    assert_eq!(locker.holder("T1"), None);
}

#[tokio::test]
async fn too_few_candidates_never_touch_the_locker() {
    init_logging();
    let locker = ObservedLocker::new();
    let manager = manager(web_records(5), locker.clone());

    let request = AcquisitionRequest::new(2, 4).with_prefixes(["web01"]);
    let err = manager.acquire(JobId(4), &request).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AcquireError>(),
        Some(AcquireError::InsufficientCandidates { required: 2, available: 1, .. })
    ));
    assert_eq!(locker.calls(), 0);
}

#[tokio::test]
async fn contention_below_quorum_releases_the_partial_grant() {
    init_logging();
    let records = web_records(3);
    let locker = ObservedLocker::new();
    let manager = manager(records, locker.clone());

    // Another job already holds T3.
    let busy = manager
        .acquire(JobId(10), &AcquisitionRequest::new(1, 1).with_prefixes(["web03"]))
        .await
        .unwrap();
    assert_eq!(ids(&busy), ["T3"]);

    let err = manager
        .acquire(JobId(11), &AcquisitionRequest::new(3, 3))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<AcquireError>(),
        Some(&AcquireError::QuorumNotMet {
            job: JobId(11),
            required: 3,
            got: 2,
            unwind: None,
        })
    );
    assert_eq!(locker.holder("T1"), None);
    assert_eq!(locker.holder("T2"), None);
    assert_eq!(locker.holder("T3"), Some(JobId(10)));
}

#[tokio::test]
async fn failing_release_is_reported_next_to_the_quorum_error() {
    init_logging();
    let locker = ObservedLocker::failing_on(&["T1"]);
    let manager = manager(web_records(2), locker.clone());

    // Job 20 takes T2 so job 21 only gets T1, whose release fails.
    manager
        .acquire(JobId(20), &AcquisitionRequest::new(1, 1).with_prefixes(["web02"]))
        .await
        .unwrap();

    let err = manager
        .acquire(JobId(21), &AcquisitionRequest::new(2, 2))
        .await
        .unwrap_err();

    let acquire_err = err.downcast_ref::<AcquireError>().unwrap();
    assert!(matches!(acquire_err, AcquireError::QuorumNotMet { got: 1, .. }));
    let unwind = acquire_err.unwind_error().unwrap();
    assert_eq!(unwind.failed_ids().collect::<Vec<_>>(), ["T1"]);
    assert_eq!(locker.holder("T1"), Some(JobId(21)));
}

#[tokio::test]
async fn release_is_idempotent() {
    init_logging();
    let locker = ObservedLocker::new();
    let manager = manager(web_records(2), locker.clone());

    let locked = manager
        .acquire(JobId(30), &AcquisitionRequest::new(2, 2))
        .await
        .unwrap();

    manager.release(JobId(30), &locked).await.unwrap();
    manager.release(JobId(30), &locked).await.unwrap();

    assert_eq!(locker.holder("T1"), None);
    assert_eq!(locker.holder("T2"), None);
}

#[tokio::test]
async fn shuffled_acquisition_returns_the_same_targets() {
    init_logging();
    let manager = manager(web_records(8), Arc::new(NoopLocker));

    let request = AcquisitionRequest::new(8, 8).shuffled(true);
    let locked: Vec<Target> = manager.acquire(JobId(40), &request).await.unwrap();

    let mut expected: Vec<String> = (1..=8).map(|i| format!("T{i}")).collect();
    expected.sort();
    assert_eq!(ids(&locked), expected);
}
