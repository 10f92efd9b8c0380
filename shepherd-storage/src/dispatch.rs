//! The Dispatch Loop (component C8).
//!
//! Claims rows from `todo` under a `BEGIN IMMEDIATE` transaction (SQLite's
//! analog to `for update skip locked`), commits to reserve concurrency,
//! then hands each claimed attempt to the `Dispatcher` capability outside
//! the transaction — filesystem driver calls and executor submission must
//! never hold the State Store's write lock.

use std::sync::Arc;

use futures::future::join_all;
use shepherd_core::errors::StorageError;
use shepherd_core::traits::{AttemptOutcome, Dispatcher, ResourceRequest};

use crate::connection::DatabaseManager;
use crate::queries::{get_task, insert_attempt, record_completion, todo_for_job};

/// Upper bound on rows claimed per iteration — caps each `todo` drain to
/// a bounded batch rather than claiming everything eligible at once.
const DEFAULT_CLAIM_BATCH: usize = 32;

pub struct DispatchLoop {
    db: Arc<DatabaseManager>,
    dispatcher: Arc<dyn Dispatcher>,
    claim_batch: usize,
}

struct Claimed {
    attempt_id: i64,
    script: String,
}

impl DispatchLoop {
    pub fn new(db: Arc<DatabaseManager>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { db, dispatcher, claim_batch: DEFAULT_CLAIM_BATCH }
    }

    pub fn with_claim_batch(mut self, claim_batch: usize) -> Self {
        self.claim_batch = claim_batch;
        self
    }

    /// Runs one claim → dispatch → record cycle for `job_id`, returning the
    /// number of attempts claimed. A return of 0 means nothing was
    /// eligible this iteration — the caller decides whether that means
    /// the job is drained or just between dependency unlocks.
    pub async fn run_iteration(&self, job_id: i64, now_ms: i64) -> Result<usize, StorageError> {
        let claimed = self.claim(job_id, now_ms)?;
        if claimed.is_empty() {
            return Ok(0);
        }
        let count = claimed.len();

        let outcomes = join_all(claimed.into_iter().map(|c| {
            let dispatcher = Arc::clone(&self.dispatcher);
            async move {
                let outcome = dispatcher.submit(c.attempt_id, &c.script, &ResourceRequest::default()).await;
                (c.attempt_id, outcome)
            }
        }))
        .await;

        for (attempt_id, outcome) in outcomes {
            self.record(attempt_id, outcome, now_ms)?;
        }

        Ok(count)
    }

    fn claim(&self, job_id: i64, now_ms: i64) -> Result<Vec<Claimed>, StorageError> {
        self.db.with_immediate_transaction(|tx| {
            let rows = todo_for_job(tx, job_id)?;
            let mut claimed = Vec::with_capacity(self.claim_batch);
            for row in rows.into_iter().take(self.claim_batch) {
                let task = get_task(tx, row.task_id)?;
                let attempt_id = insert_attempt(tx, row.task_id, now_ms)?;
                claimed.push(Claimed { attempt_id, script: task.script });
            }
            Ok(claimed)
        })
    }

    fn record(
        &self,
        attempt_id: i64,
        outcome: Result<AttemptOutcome, shepherd_core::errors::DispatchError>,
        now_ms: i64,
    ) -> Result<(), StorageError> {
        self.db.with_writer(|conn| match outcome {
            Ok(o) => record_completion(conn, attempt_id, o.finished_at, o.exit_code),
            // The dispatcher could not even start the process — treat as a
            // failed attempt so it counts toward max_attempts like any
            // other failure — nothing distinguishes a driver-side failure
            // from a nonzero script exit.
            Err(_) => record_completion(conn, attempt_id, now_ms, 1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{get_or_create_data_item, insert_filesystem, insert_job, insert_task};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI32, Ordering};

    struct AlwaysSucceeds;

    #[async_trait]
    impl Dispatcher for AlwaysSucceeds {
        async fn submit(
            &self,
            _attempt_id: i64,
            _script: &str,
            _resources: &ResourceRequest,
        ) -> Result<AttemptOutcome, shepherd_core::errors::DispatchError> {
            Ok(AttemptOutcome { exit_code: 0, started_at: 0, finished_at: 1 })
        }
    }

    struct CountingDispatcher(Arc<AtomicI32>);

    #[async_trait]
    impl Dispatcher for CountingDispatcher {
        async fn submit(
            &self,
            _attempt_id: i64,
            _script: &str,
            _resources: &ResourceRequest,
        ) -> Result<AttemptOutcome, shepherd_core::errors::DispatchError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(AttemptOutcome { exit_code: 0, started_at: 0, finished_at: 1 })
        }
    }

    fn seed_chain(db: &DatabaseManager) -> i64 {
        db.with_writer(|conn| {
            let fs_id = insert_filesystem(conn, "xyzzy", "local", "{}", 10)?;
            let job_id = insert_job(conn, "client-1", 3, 0)?;
            let foo = get_or_create_data_item(conn, fs_id, "foo")?;
            let bar = get_or_create_data_item(conn, fs_id, "bar")?;
            insert_task(conn, job_id, foo.id, bar.id, "abc123", None)?;
            Ok(job_id)
        })
        .unwrap()
    }

    #[tokio::test]
    async fn claims_and_completes_one_iteration() {
        let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
        let job_id = seed_chain(&db);
        let loop_ = DispatchLoop::new(Arc::clone(&db), Arc::new(AlwaysSucceeds));

        let claimed = loop_.run_iteration(job_id, 0).await.unwrap();
        assert_eq!(claimed, 1);

        let remaining = db.with_reader(|conn| crate::queries::todo_for_job(conn, job_id)).unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn empty_todo_claims_nothing() {
        let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
        let job_id = db.with_writer(|conn| insert_job(conn, "client-1", 3, 0)).unwrap();
        let counter = Arc::new(AtomicI32::new(0));
        let loop_ = DispatchLoop::new(Arc::clone(&db), Arc::new(CountingDispatcher(Arc::clone(&counter))));

        let claimed = loop_.run_iteration(job_id, 0).await.unwrap();
        assert_eq!(claimed, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
