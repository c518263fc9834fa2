//! Shared store contract, run against every backend.
//!
//! The Redis suite needs a live server and is ignored by default:
//!
//! ```text
//! BURNOTE_TEST_REDIS_URL=redis://127.0.0.1/ cargo test -p burnote -- --ignored
//! ```

use std::sync::Arc;

use burnote::store::{DurableStore, MemoryStore, RedisKv, SqliteKv};
use burnote_testkit::SharedStore;

async fn memory() -> SharedStore {
    Arc::new(MemoryStore::new())
}

async fn sqlite() -> SharedStore {
    let store: SharedStore = Arc::new(DurableStore::new(SqliteKv::open_memory()));
    store.start().await.unwrap();
    store
}

burnote_testkit::store_contract_tests!(memory_contract, memory);
burnote_testkit::store_contract_tests!(sqlite_contract, sqlite);

mod redis_contract {
    use super::*;

    async fn redis() -> SharedStore {
        let url = std::env::var("BURNOTE_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
        let store: SharedStore = Arc::new(DurableStore::new(RedisKv::open(&url).unwrap()));
        store.start().await.unwrap();
        store
    }

    macro_rules! ignored_checks {
        ($($check:ident),* $(,)?) => {
            $(
                #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
                #[ignore = "needs a Redis server"]
                async fn $check() {
                    burnote_testkit::init_tracing();
                    burnote_testkit::contract::$check(redis().await).await;
                }
            )*
        };
    }

    ignored_checks!(
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
