//! The store contract: behaviour every [`NoteStore`] must share.
//!
//! Each check takes a started store and panics on violation. Use
//! [`store_contract_tests!`](crate::store_contract_tests) to run the whole
//! suite against a backend.

use std::sync::Arc;

use burnote_core::{AccessContext, LogId, NoteId, NoteReadOptions};
use burnote_store::{NoteStatus, NoteStore, NoteStoreExt, StoreError};

use crate::fixtures::{sample_log, NoteFixture, HOUR_MS};

/// A started store shared between tasks.
pub type SharedStore = Arc<dyn NoteStore>;

pub async fn logs_round_trip(store: SharedStore) {
    let entry = sample_log();
    let id = store.store_log(&entry).await.unwrap();

    assert_eq!(LogId::parse(&id.to_string()).unwrap(), id);
    assert_eq!(store.get_log(&id).await.unwrap(), entry);
}

pub async fn unknown_log_is_not_found(store: SharedStore) {
    let err = store.get_log(&LogId::generate()).await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {:?}", err);
}

pub async fn note_round_trip_without_enforcement(store: SharedStore) {
    let notes = [
        NoteFixture::new().build(),
        NoteFixture::new().allowed_reads(7).scheme(None).build(),
        NoteFixture::new().burned().message(&[0u8; 1024]).build(),
    ];

    for note in notes {
        let id = store.store_note(&note).await.unwrap();
        let read = store
            .get_note(&id, &NoteReadOptions::inspect())
            .await
            .unwrap();
        assert_eq!(read, note);
    }
}

pub async fn single_read_then_exhausted(store: SharedStore) {
    let note = NoteFixture::new().allowed_reads(1).burn_in(HOUR_MS).build();
    let id = store.store_note(&note).await.unwrap();

    assert!(!store.has_been_read(&id).await.unwrap());
    let read = store
        .get_note(&id, &NoteReadOptions::default())
        .await
        .unwrap();
    assert_eq!(read, note);

    let err = store
        .get_note(&id, &NoteReadOptions::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, StoreError::ReadsExhausted { allowed: 1, reads: 1 }),
        "expected ReadsExhausted, got {:?}",
        err
    );
    assert!(store.has_been_read(&id).await.unwrap());
}

pub async fn burned_note_is_expired(store: SharedStore) {
    let note = NoteFixture::new().burned().build();
    let id = store.store_note(&note).await.unwrap();

    let err = store
        .get_note(&id, &NoteReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Expired { .. }), "got {:?}", err);

    let read = store
        .get_note(&id, &NoteReadOptions::default().with_check_burn_date(false))
        .await
        .unwrap();
    assert_eq!(read, note);
}

pub async fn inspection_never_consumes(store: SharedStore) {
    let id = store
        .store_note(&NoteFixture::new().build())
        .await
        .unwrap();
    let peek = NoteReadOptions::default().with_add_access(false);

    for _ in 0..5 {
        store.get_note(&id, &peek).await.unwrap();
    }
    assert!(store.accesses(&id).await.unwrap().is_empty());

    store
        .get_note(&id, &NoteReadOptions::default())
        .await
        .unwrap();
    assert!(store
        .get_note(&id, &NoteReadOptions::default())
        .await
        .is_err());
}

pub async fn unchecked_budget_allows_extra_reads(store: SharedStore) {
    let id = store
        .store_note(&NoteFixture::new().build())
        .await
        .unwrap();
    let unchecked = NoteReadOptions::default().with_check_allowed_reads(false);

    store
        .get_note(&id, &NoteReadOptions::default())
        .await
        .unwrap();
    for _ in 0..4 {
        store.get_note(&id, &unchecked).await.unwrap();
    }
    assert_eq!(store.accesses(&id).await.unwrap().len(), 5);

    let err = store
        .get_note(&id, &NoteReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReadsExhausted { allowed: 1, reads: 5 }));
}

pub async fn unknown_note_checks(store: SharedStore) {
    let id = NoteId::generate();

    assert!(!store.note_exists(&id).await.unwrap());
    assert!(store.has_burned(&id).await.unwrap_err().is_not_found());
    assert!(store.has_been_read(&id).await.unwrap_err().is_not_found());
    assert!(store
        .get_note(&id, &NoteReadOptions::default())
        .await
        .unwrap_err()
        .is_not_found());
    assert!(store
        .get_note(&id, &NoteReadOptions::inspect())
        .await
        .unwrap_err()
        .is_not_found());

    let stored = store
        .store_note(&NoteFixture::new().build())
        .await
        .unwrap();
    assert!(store.note_exists(&stored).await.unwrap());
    assert!(!store.note_exists(&id).await.unwrap());
}

pub async fn has_burned_tracks_burn_date(store: SharedStore) {
    let burned = store
        .store_note(&NoteFixture::new().burned().build())
        .await
        .unwrap();
    let live = store
        .store_note(&NoteFixture::new().build())
        .await
        .unwrap();

    assert!(store.has_burned(&burned).await.unwrap());
    assert!(!store.has_burned(&live).await.unwrap());
}

pub async fn exhaustion_precedes_expiry(store: SharedStore) {
    let id = store
        .store_note(&NoteFixture::new().burned().build())
        .await
        .unwrap();
    store
        .get_note(&id, &NoteReadOptions::default().with_check_burn_date(false))
        .await
        .unwrap();

    let err = store
        .get_note(&id, &NoteReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReadsExhausted { .. }), "got {:?}", err);

    // Expiry still applies once the budget check is switched off.
    let err = store
        .get_note(&id, &NoteReadOptions::default().with_check_allowed_reads(false))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Expired { .. }), "got {:?}", err);
    assert_eq!(store.accesses(&id).await.unwrap().len(), 1);
}

pub async fn access_records_keep_context(store: SharedStore) {
    let id = store
        .store_note(&NoteFixture::new().allowed_reads(2).build())
        .await
        .unwrap();
    let log_id = store.store_log(&sample_log()).await.unwrap();

    store
        .get_note(&id, &NoteReadOptions::for_log(log_id))
        .await
        .unwrap();
    let tagged = AccessContext::default().tag("client", "cli");
    store
        .get_note(&id, &NoteReadOptions::default().with_context(tagged.clone()))
        .await
        .unwrap();

    let accesses = store.accesses(&id).await.unwrap();
    assert_eq!(accesses.len(), 2);
    assert_eq!(accesses[0].context, AccessContext::for_log(log_id));
    assert_eq!(accesses[1].context, tagged);
}

pub async fn concurrent_reads_respect_budget(store: SharedStore) {
    const ALLOWED: u32 = 4;
    const READERS: usize = 48;

    let id = store
        .store_note(&NoteFixture::new().allowed_reads(ALLOWED).build())
        .await
        .unwrap();

    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get_note(&id, &NoteReadOptions::default()).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(StoreError::ReadsExhausted { .. }) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }

    assert_eq!(succeeded, ALLOWED as usize);
    assert_eq!(store.accesses(&id).await.unwrap().len(), ALLOWED as usize);
    assert!(store.has_been_read(&id).await.unwrap());
}

pub async fn purge_removes_only_dead(store: SharedStore) {
    let live = store
        .store_note(&NoteFixture::new().allowed_reads(2).build())
        .await
        .unwrap();
    let burned = store
        .store_note(&NoteFixture::new().burned().build())
        .await
        .unwrap();
    let read = store
        .store_note(&NoteFixture::new().build())
        .await
        .unwrap();
    store
        .get_note(&read, &NoteReadOptions::default())
        .await
        .unwrap();

    assert!(!store.purge_if_dead(&live).await.unwrap());
    assert!(store.purge_if_dead(&burned).await.unwrap());
    assert!(store.purge_if_dead(&read).await.unwrap());
    assert!(!store.purge_if_dead(&NoteId::generate()).await.unwrap());

    // Purged notes answer like never-created ones.
    for id in [burned, read] {
        assert!(!store.note_exists(&id).await.unwrap());
        assert!(store.has_burned(&id).await.unwrap_err().is_not_found());
        assert!(store.has_been_read(&id).await.unwrap_err().is_not_found());
        assert!(store.accesses(&id).await.unwrap_err().is_not_found());
        assert!(store
            .get_note(&id, &NoteReadOptions::inspect())
            .await
            .unwrap_err()
            .is_not_found());
    }
    assert!(store.note_exists(&live).await.unwrap());
}

pub async fn start_is_idempotent(store: SharedStore) {
    let id = store
        .store_note(&NoteFixture::new().build())
        .await
        .unwrap();

    let starts: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.start().await })
        })
        .collect();
    for start in starts {
        start.await.unwrap().unwrap();
    }

    // Nothing was reset by the extra starts.
    assert!(store.note_exists(&id).await.unwrap());
}

pub async fn status_reflects_fate(store: SharedStore) {
    let available = store
        .store_note(&NoteFixture::new().build())
        .await
        .unwrap();
    let burned = store
        .store_note(&NoteFixture::new().burned().build())
        .await
        .unwrap();
    let read = store
        .store_note(&NoteFixture::new().build())
        .await
        .unwrap();
    store
        .get_note(&read, &NoteReadOptions::default())
        .await
        .unwrap();

    assert_eq!(store.status(&available).await.unwrap(), NoteStatus::Available);
    assert_eq!(store.status(&burned).await.unwrap(), NoteStatus::Burned);
    assert_eq!(store.status(&read).await.unwrap(), NoteStatus::Read);
    assert_eq!(
        store.status(&NoteId::generate()).await.unwrap(),
        NoteStatus::Missing
    );

    // Asking never consumed the available note's read.
    assert!(store.accesses(&available).await.unwrap().is_empty());
}

/// Generate one test per contract check for a store factory.
///
/// `$factory` is an async function returning a started
/// [`SharedStore`](crate::contract::SharedStore). Each test gets a fresh store
/// and runs on a multi-threaded runtime so that concurrency checks race for
/// real.
///
/// ```rust,ignore
/// async fn memory() -> SharedStore {
///     Arc::new(MemoryStore::new())
/// }
///
/// burnote_testkit::store_contract_tests!(memory_contract, memory);
/// ```
#[macro_export]
macro_rules! store_contract_tests {
    (@checks $factory:path; $($check:ident),* $(,)?) => {
        $(
            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn $check() {
                $crate::fixtures::init_tracing();
                let store = $factory().await;
                $crate::contract::$check(store).await;
            }
        )*
    };
    ($module:ident, $factory:path) => {
        mod $module {
            use super::*;

            $crate::store_contract_tests!(@checks $factory;
                logs_round_trip,
                unknown_log_is_not_found,
                note_round_trip_without_enforcement,
                single_read_then_exhausted,
                burned_note_is_expired,
                inspection_never_consumes,
                unchecked_budget_allows_extra_reads,
                unknown_note_checks,
                has_burned_tracks_burn_date,
                exhaustion_precedes_expiry,
                access_records_keep_context,
                concurrent_reads_respect_budget,
                purge_removes_only_dead,
                start_is_idempotent,
                status_reflects_fate,
            );
        }
    };
}
