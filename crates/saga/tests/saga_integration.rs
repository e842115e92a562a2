//! End-to-end orchestrator scenarios over the in-memory state store.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use saga::{
    CompensationStatus, ContinueAllStrategy, FailFastStrategy, LogLevel, MemoryLogger,
    RetryConfig, RetryStrategy, Saga, SagaError, SagaState, SagaStateStore, SagaStatus,
    StepAction, StepError,
};
use saga_store::{InMemoryStateStore, SagaId, StateStoreError};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TestData {
    log: Vec<String>,
}

type CallOrder = Arc<Mutex<Vec<&'static str>>>;

fn forward_ok(name: &'static str, calls: Arc<AtomicU32>) -> StepAction<TestData> {
    Box::new(move |_token, data| {
        let calls = calls.clone();
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            data.log.push(name.to_string());
            Ok(())
        })
    })
}

fn forward_err(name: &'static str, calls: Arc<AtomicU32>) -> StepAction<TestData> {
    Box::new(move |_token, _data| {
        let calls = calls.clone();
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StepError::from(format!("{name} forward failed")))
        })
    })
}

fn inverse_ok(name: &'static str, calls: Arc<AtomicU32>, order: CallOrder) -> StepAction<TestData> {
    inverse_fail_times(name, calls, order, 0)
}

/// Inverse action that fails the first `failures` calls, then succeeds.
/// Pass `u32::MAX` for an action that never recovers.
fn inverse_fail_times(
    name: &'static str,
    calls: Arc<AtomicU32>,
    order: CallOrder,
    failures: u32,
) -> StepAction<TestData> {
    Box::new(move |_token, _data| {
        let calls = calls.clone();
        let order = order.clone();
        Box::pin(async move {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            if attempt < failures {
                Err(StepError::from(format!("{name} inverse failed")))
            } else {
                order.lock().unwrap().push(name);
                Ok(())
            }
        })
    })
}

struct Counters {
    forward: Arc<AtomicU32>,
    inverse: Arc<AtomicU32>,
}

impl Counters {
    fn new() -> Self {
        Self {
            forward: Arc::new(AtomicU32::new(0)),
            inverse: Arc::new(AtomicU32::new(0)),
        }
    }

    fn forward_count(&self) -> u32 {
        self.forward.load(Ordering::SeqCst)
    }

    fn inverse_count(&self) -> u32 {
        self.inverse.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_happy_path() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let (a, b, c) = (Counters::new(), Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
        .add_step(
            "A",
            forward_ok("A", a.forward.clone()),
            inverse_ok("A", a.inverse.clone(), order.clone()),
        )
        .add_step(
            "B",
            forward_ok("B", b.forward.clone()),
            inverse_ok("B", b.inverse.clone(), order.clone()),
        )
        .add_step(
            "C",
            forward_ok("C", c.forward.clone()),
            inverse_ok("C", c.inverse.clone(), order.clone()),
        );

    let token = CancellationToken::new();
    saga.execute(&token).await.unwrap();

    assert_eq!(saga.state().status, SagaStatus::Complete);
    assert_eq!(saga.state().total_steps, 3);
    assert_eq!(saga.state().current_step, 3);
    assert!(saga.state().failed_step.is_none());
    assert!(saga.state().compensated_steps.is_empty());
    assert_eq!(saga.payload().log, vec!["A", "B", "C"]);

    // Forward actions ran exactly once each, in order; no inverse ran.
    assert_eq!(a.forward_count(), 1);
    assert_eq!(b.forward_count(), 1);
    assert_eq!(c.forward_count(), 1);
    assert_eq!(a.inverse_count(), 0);
    assert_eq!(b.inverse_count(), 0);
    assert_eq!(c.inverse_count(), 0);

    let record = store.get(saga_id).await.unwrap();
    assert_eq!(record.status, SagaStatus::Complete);
    assert!(store.was_marked_complete(saga_id).await);
}

#[tokio::test]
async fn test_first_step_failure_compensation_is_noop() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let (a, b) = (Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
        .add_step(
            "A",
            forward_err("A", a.forward.clone()),
            inverse_ok("A", a.inverse.clone(), order.clone()),
        )
        .add_step(
            "B",
            forward_ok("B", b.forward.clone()),
            inverse_ok("B", b.inverse.clone(), order.clone()),
        );

    let token = CancellationToken::new();
    let err = saga.execute(&token).await.unwrap_err();
    assert!(matches!(err, SagaError::StepFailed { index: 0, .. }));

    assert_eq!(saga.state().status, SagaStatus::Failed);
    assert_eq!(saga.state().failed_step, Some(0));
    assert_eq!(b.forward_count(), 0);

    // Nothing to undo: the failed step itself is never compensated.
    saga.compensate(&token).await.unwrap();
    assert_eq!(a.inverse_count(), 0);
    assert_eq!(b.inverse_count(), 0);
    assert_eq!(
        saga.state().compensated_status,
        Some(CompensationStatus::Complete)
    );

    let record = store.get(saga_id).await.unwrap();
    assert_eq!(record.status, SagaStatus::Failed);
    assert_eq!(record.compensated_status, Some(CompensationStatus::Complete));
}

#[tokio::test]
async fn test_middle_step_failure_fail_fast_rollback() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let (a, b, c) = (Counters::new(), Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));
    let logger = MemoryLogger::new();

    let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
        .with_strategy(FailFastStrategy::new())
        .with_logger(logger.clone())
        .add_step(
            "A",
            forward_ok("A", a.forward.clone()),
            inverse_ok("A", a.inverse.clone(), order.clone()),
        )
        .add_step(
            "B",
            forward_err("B", b.forward.clone()),
            inverse_ok("B", b.inverse.clone(), order.clone()),
        )
        .add_step(
            "C",
            forward_ok("C", c.forward.clone()),
            inverse_ok("C", c.inverse.clone(), order.clone()),
        );

    let token = CancellationToken::new();
    let err = saga.execute(&token).await.unwrap_err();
    assert!(matches!(err, SagaError::StepFailed { index: 1, .. }));
    assert_eq!(saga.state().failed_step, Some(1));

    saga.compensate(&token).await.unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["A"]);
    assert_eq!(a.inverse_count(), 1);
    assert_eq!(b.inverse_count(), 0);
    assert_eq!(c.inverse_count(), 0);
    assert_eq!(c.forward_count(), 0);
    assert_eq!(saga.state().compensated_steps, vec![0]);
    assert_eq!(
        saga.state().compensated_status,
        Some(CompensationStatus::Complete)
    );

    assert!(logger.contains(LogLevel::Info, "Executed: 0 - A"));
    assert!(logger.contains(LogLevel::Error, "Step B failed"));
    assert!(logger.contains(LogLevel::Info, "Compensated: A"));
}

#[tokio::test(start_paused = true)]
async fn test_retry_strategy_recovers_after_transient_failures() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let (a, b, c) = (Counters::new(), Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    let config = RetryConfig {
        max_retries: 3,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_secs(30),
        backoff_multiple: 2.0,
    };

    let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
        .with_strategy(RetryStrategy::new(config))
        .add_step(
            "A",
            forward_ok("A", a.forward.clone()),
            inverse_ok("A", a.inverse.clone(), order.clone()),
        )
        .add_step(
            "B",
            forward_ok("B", b.forward.clone()),
            // Recovers on the third attempt.
            inverse_fail_times("B", b.inverse.clone(), order.clone(), 2),
        )
        .add_step(
            "C",
            forward_err("C", c.forward.clone()),
            inverse_ok("C", c.inverse.clone(), order.clone()),
        );

    let token = CancellationToken::new();
    saga.execute(&token).await.unwrap_err();

    let started = tokio::time::Instant::now();
    saga.compensate(&token).await.unwrap();

    // Two failed attempts for B cost one 10ms and one 20ms backoff.
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(30), "waited {waited:?}");
    assert!(waited < Duration::from_millis(60), "waited {waited:?}");

    assert_eq!(b.inverse_count(), 3);
    assert_eq!(a.inverse_count(), 1);
    assert_eq!(c.inverse_count(), 0);
    assert_eq!(*order.lock().unwrap(), vec!["B", "A"]);
    assert_eq!(saga.state().compensated_steps, vec![1, 0]);
    assert_eq!(
        saga.state().compensated_status,
        Some(CompensationStatus::Complete)
    );
}

#[tokio::test(start_paused = true)]
async fn test_continue_all_collects_permanent_failures() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let (a, b, c) = (Counters::new(), Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    let config = RetryConfig {
        max_retries: 3,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_secs(30),
        backoff_multiple: 2.0,
    };

    let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
        .with_strategy(ContinueAllStrategy::new(config))
        .add_step(
            "A",
            forward_ok("A", a.forward.clone()),
            inverse_ok("A", a.inverse.clone(), order.clone()),
        )
        .add_step(
            "B",
            forward_ok("B", b.forward.clone()),
            inverse_fail_times("B", b.inverse.clone(), order.clone(), u32::MAX),
        )
        .add_step(
            "C",
            forward_err("C", c.forward.clone()),
            inverse_ok("C", c.inverse.clone(), order.clone()),
        );

    let token = CancellationToken::new();
    saga.execute(&token).await.unwrap_err();

    let started = tokio::time::Instant::now();
    let err = saga.compensate(&token).await.unwrap_err();

    // B exhausts all four attempts with 10 + 20 + 40 ms of backoff between
    // them, then the pass continues to A.
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(70), "waited {waited:?}");
    assert!(waited < Duration::from_millis(120), "waited {waited:?}");

    let report = err.as_compensation_error().expect("compensation error");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].step, "B");
    assert_eq!(report.failures[0].attempts, 4);

    assert_eq!(b.inverse_count(), 4);
    assert_eq!(a.inverse_count(), 1);
    assert_eq!(*order.lock().unwrap(), vec!["A"]);
    assert_eq!(saga.state().compensated_steps, vec![0]);
    assert_eq!(
        saga.state().compensated_status,
        Some(CompensationStatus::Failed)
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_retry_backoff() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let (a, b, c) = (Counters::new(), Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    let config = RetryConfig {
        max_retries: 3,
        initial_backoff: Duration::from_secs(10),
        max_backoff: Duration::from_secs(30),
        backoff_multiple: 2.0,
    };

    let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
        .with_strategy(ContinueAllStrategy::new(config))
        .add_step(
            "A",
            forward_ok("A", a.forward.clone()),
            inverse_fail_times("A", a.inverse.clone(), order.clone(), u32::MAX),
        )
        .add_step(
            "B",
            forward_ok("B", b.forward.clone()),
            inverse_ok("B", b.inverse.clone(), order.clone()),
        )
        .add_step(
            "C",
            forward_err("C", c.forward.clone()),
            inverse_ok("C", c.inverse.clone(), order.clone()),
        );

    let token = CancellationToken::new();
    saga.execute(&token).await.unwrap_err();

    // Cancel midway through A's first 10s backoff; B compensates first and
    // must stay recorded.
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });

    let err = saga.compensate(&token).await.unwrap_err();
    assert!(err.is_cancelled());

    assert_eq!(b.inverse_count(), 1);
    assert_eq!(a.inverse_count(), 1);
    assert_eq!(saga.state().compensated_steps, vec![1]);

    // The cancellation boundary was persisted; only B is durably recorded.
    let record = store.get(saga_id).await.unwrap();
    assert_eq!(record.compensated_steps, vec![1]);
    assert_eq!(
        record.compensated_status,
        Some(CompensationStatus::Compensating)
    );
}

#[tokio::test(start_paused = true)]
async fn test_compensation_resumes_after_cancellation_without_repeating() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let (a, b, c) = (Counters::new(), Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    let config = RetryConfig {
        max_retries: 3,
        initial_backoff: Duration::from_secs(10),
        max_backoff: Duration::from_secs(30),
        backoff_multiple: 2.0,
    };

    let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
        .with_strategy(ContinueAllStrategy::new(config))
        .add_step(
            "A",
            forward_ok("A", a.forward.clone()),
            // Recovers on the third attempt, spread across two passes.
            inverse_fail_times("A", a.inverse.clone(), order.clone(), 2),
        )
        .add_step(
            "B",
            forward_ok("B", b.forward.clone()),
            inverse_ok("B", b.inverse.clone(), order.clone()),
        )
        .add_step(
            "C",
            forward_err("C", c.forward.clone()),
            inverse_ok("C", c.inverse.clone(), order.clone()),
        );

    let token = CancellationToken::new();
    saga.execute(&token).await.unwrap_err();

    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });

    let err = saga.compensate(&token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(saga.state().compensated_steps, vec![1]);
    assert_eq!(b.inverse_count(), 1);
    assert_eq!(a.inverse_count(), 1);

    // A second pass skips the recorded step and finishes the rest.
    let fresh_token = CancellationToken::new();
    saga.compensate(&fresh_token).await.unwrap();

    assert_eq!(b.inverse_count(), 1);
    assert_eq!(a.inverse_count(), 3);
    assert_eq!(saga.state().compensated_steps, vec![1, 0]);
    assert_eq!(
        saga.state().compensated_status,
        Some(CompensationStatus::Complete)
    );
}

#[tokio::test]
async fn test_cancellation_between_forward_steps() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let (a, b) = (Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    let token = CancellationToken::new();
    let cancel = token.clone();

    // Step A cancels the context while it runs; B must never start.
    let a_forward: StepAction<TestData> = Box::new(move |_token, data| {
        let cancel = cancel.clone();
        let calls = a.forward.clone();
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            data.log.push("A".to_string());
            cancel.cancel();
            Ok(())
        })
    });

    let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
        .add_step(
            "A",
            a_forward,
            inverse_ok("A", Arc::new(AtomicU32::new(0)), order.clone()),
        )
        .add_step(
            "B",
            forward_ok("B", b.forward.clone()),
            inverse_ok("B", b.inverse.clone(), order.clone()),
        );

    let err = saga.execute(&token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(b.forward_count(), 0);

    // The step that never ran is the failure point, so A gets compensated.
    assert_eq!(saga.state().status, SagaStatus::Failed);
    assert_eq!(saga.state().failed_step, Some(1));

    saga.compensate(&token).await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["A"]);
}

#[tokio::test]
async fn test_execute_requires_created_status() {
    let store = Arc::new(InMemoryStateStore::new());
    let mut saga = Saga::new(store, SagaId::new(), TestData::default());

    let token = CancellationToken::new();
    saga.execute(&token).await.unwrap();

    let err = saga.execute(&token).await.unwrap_err();
    assert!(matches!(err, SagaError::InvalidState { .. }));
}

#[tokio::test]
async fn test_compensate_requires_failed_status() {
    let store = Arc::new(InMemoryStateStore::new());
    let mut saga = Saga::new(store, SagaId::new(), TestData::default());

    let token = CancellationToken::new();
    let err = saga.compensate(&token).await.unwrap_err();
    assert!(matches!(err, SagaError::InvalidState { .. }));

    saga.execute(&token).await.unwrap();
    let err = saga.compensate(&token).await.unwrap_err();
    assert!(matches!(err, SagaError::InvalidState { .. }));
}

/// Store whose saves start failing after a configured number of writes.
#[derive(Clone)]
struct FlakyStateStore {
    inner: InMemoryStateStore,
    saves_left: Arc<AtomicU32>,
}

#[async_trait]
impl SagaStateStore for FlakyStateStore {
    async fn save(&self, state: &SagaState) -> Result<(), StateStoreError> {
        if self.saves_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
        {
            return Err(StateStoreError::Serialization(serde_json::Error::io(
                std::io::Error::other("store unavailable"),
            )));
        }
        self.inner.save(state).await
    }

    async fn load(&self, saga_id: SagaId) -> Result<SagaState, StateStoreError> {
        self.inner.load(saga_id).await
    }

    async fn mark_complete(&self, saga_id: SagaId) -> Result<(), StateStoreError> {
        self.inner.mark_complete(saga_id).await
    }
}

#[tokio::test]
async fn test_checkpoint_failure_aborts_forward_pass() {
    let (a, b) = (Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    // The initial save succeeds; the checkpoint after step A fails.
    let store = FlakyStateStore {
        inner: InMemoryStateStore::new(),
        saves_left: Arc::new(AtomicU32::new(1)),
    };

    let mut saga = Saga::new(Arc::new(store), SagaId::new(), TestData::default())
        .add_step(
            "A",
            forward_ok("A", a.forward.clone()),
            inverse_ok("A", a.inverse.clone(), order.clone()),
        )
        .add_step(
            "B",
            forward_ok("B", b.forward.clone()),
            inverse_ok("B", b.inverse.clone(), order.clone()),
        );

    let token = CancellationToken::new();
    let err = saga.execute(&token).await.unwrap_err();
    assert!(matches!(err, SagaError::Store(_)));
    assert_eq!(a.forward_count(), 1);
    assert_eq!(b.forward_count(), 0);
}

/// Store that records every saved state for sequence assertions.
#[derive(Clone, Default)]
struct RecordingStateStore {
    inner: InMemoryStateStore,
    saves: Arc<Mutex<Vec<SagaState>>>,
}

#[async_trait]
impl SagaStateStore for RecordingStateStore {
    async fn save(&self, state: &SagaState) -> Result<(), StateStoreError> {
        self.saves.lock().unwrap().push(state.clone());
        self.inner.save(state).await
    }

    async fn load(&self, saga_id: SagaId) -> Result<SagaState, StateStoreError> {
        self.inner.load(saga_id).await
    }

    async fn mark_complete(&self, saga_id: SagaId) -> Result<(), StateStoreError> {
        self.inner.mark_complete(saga_id).await
    }
}

#[tokio::test]
async fn test_checkpoint_sequence_and_updated_at_monotonicity() {
    let store = RecordingStateStore::default();
    let saves = store.saves.clone();
    let (a, b) = (Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    let mut saga = Saga::new(Arc::new(store), SagaId::new(), TestData::default())
        .add_step(
            "A",
            forward_ok("A", a.forward.clone()),
            inverse_ok("A", a.inverse.clone(), order.clone()),
        )
        .add_step(
            "B",
            forward_err("B", b.forward.clone()),
            inverse_ok("B", b.inverse.clone(), order.clone()),
        );

    let token = CancellationToken::new();
    saga.execute(&token).await.unwrap_err();
    saga.compensate(&token).await.unwrap();

    let saves = saves.lock().unwrap();
    assert!(saves.len() >= 4);

    // First checkpoint makes the run visible before any step effect.
    assert_eq!(saves[0].status, SagaStatus::Executing);
    assert_eq!(saves[0].current_step, 0);

    // Last checkpoint is the terminal compensation outcome.
    let last = saves.last().unwrap();
    assert_eq!(last.status, SagaStatus::Failed);
    assert_eq!(last.compensated_status, Some(CompensationStatus::Complete));

    for pair in saves.windows(2) {
        assert!(pair[1].updated_at >= pair[0].updated_at);
    }
}

#[tokio::test]
async fn test_payload_checkpoint_matches_compensation_view() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let observed: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let observed_in_inverse = observed.clone();
    let a_inverse: StepAction<TestData> = Box::new(move |_token, data| {
        let observed = observed_in_inverse.clone();
        Box::pin(async move {
            observed.lock().unwrap().clone_from(&data.log);
            Ok(())
        })
    });

    let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
        .add_step(
            "A",
            forward_ok("A", Arc::new(AtomicU32::new(0))),
            a_inverse,
        )
        .add_step(
            "B",
            forward_err("B", Arc::new(AtomicU32::new(0))),
            Box::new(|_token, _data| Box::pin(async move { Ok(()) })),
        );

    let token = CancellationToken::new();
    saga.execute(&token).await.unwrap_err();

    // The durable record holds the payload as of A's checkpoint.
    let record = store.get(saga_id).await.unwrap();
    let saved: TestData = serde_json::from_value(record.data).unwrap();
    assert_eq!(saved.log, vec!["A"]);

    // Compensation observes exactly that payload.
    saga.compensate(&token).await.unwrap();
    assert_eq!(*observed.lock().unwrap(), vec!["A"]);
}

#[tokio::test]
async fn test_resume_compensation_from_loaded_state() {
    let store = Arc::new(InMemoryStateStore::new());
    let saga_id = SagaId::new();
    let (a, b) = (Counters::new(), Counters::new());
    let order: CallOrder = Arc::new(Mutex::new(Vec::new()));

    let token = CancellationToken::new();
    {
        let mut saga = Saga::new(store.clone(), saga_id, TestData::default())
            .add_step(
                "A",
                forward_ok("A", a.forward.clone()),
                inverse_ok("A", a.inverse.clone(), order.clone()),
            )
            .add_step(
                "B",
                forward_err("B", b.forward.clone()),
                inverse_ok("B", b.inverse.clone(), order.clone()),
            );
        saga.execute(&token).await.unwrap_err();
        // Saga dropped here without compensating, as after a crash.
    }

    let resumed: Saga<TestData> = Saga::load(store.clone(), saga_id).await.unwrap();
    assert_eq!(resumed.state().status, SagaStatus::Failed);
    assert_eq!(resumed.state().failed_step, Some(1));
    assert_eq!(resumed.payload().log, vec!["A"]);

    // Step actions are not persisted; re-attach them before compensating.
    let mut resumed = resumed
        .add_step(
            "A",
            forward_ok("A", a.forward.clone()),
            inverse_ok("A", a.inverse.clone(), order.clone()),
        )
        .add_step(
            "B",
            forward_err("B", b.forward.clone()),
            inverse_ok("B", b.inverse.clone(), order.clone()),
        );

    resumed.compensate(&token).await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["A"]);
    assert_eq!(resumed.state().compensated_steps, vec![0]);
    assert_eq!(
        resumed.state().compensated_status,
        Some(CompensationStatus::Complete)
    );
}

#[tokio::test]
async fn test_load_missing_saga_fails() {
    let store = Arc::new(InMemoryStateStore::new());
    let result: Result<Saga<TestData>, _> = Saga::load(store, SagaId::new()).await;
    assert!(matches!(result, Err(SagaError::Store(StateStoreError::NotFound(_)))));
}
