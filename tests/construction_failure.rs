#![allow(missing_docs)]

mod common;

use common::some_methods::{SomeMethods, SomeMethodsApi, SomeMethodsHandle};
use common::init_test;
use defcon::{assert_with_log, test_complete};
use defcon::{ConstructionState, Fault, FaultKind, Outcome, create_handle};
use futures_lite::future::block_on;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

#[derive(Debug, thiserror::Error)]
#[error("connection refused by {host}")]
struct ConnectionRefused {
    host: &'static str,
}

fn failing_handle(builds: &Arc<AtomicUsize>, failure: Fault) -> SomeMethodsHandle {
    let builds = Arc::clone(builds);
    create_handle(move || async move {
        builds.fetch_add(1, Ordering::SeqCst);
        defcon::util::yield_times(2).await;
        Outcome::<SomeMethods>::Err(failure)
    })
}

#[test]
fn failure_is_replayed_to_every_shape() {
    init_test("failure_is_replayed_to_every_shape");
    let builds = Arc::new(AtomicUsize::new(0));
    let cause = Fault::new(ConnectionRefused { host: "db" });
    let handle = failing_handle(&builds, Fault::aggregate([cause.clone()]));

    let faults = [
        block_on(handle.return_async(1)).unwrap_err(),
        block_on(handle.dummy()).unwrap_err(),
        block_on(handle.no_result_async()).unwrap_err(),
        handle.return_value(SystemTime::now()).unwrap_err(),
        handle.no_result().unwrap_err(),
    ];
    for fault in &faults {
        assert_with_log!(
            fault.is_same(&cause),
            "normalized cause is the very same occurrence",
            cause.to_string(),
            fault.to_string()
        );
        let downcast = fault.downcast_ref::<ConnectionRefused>().map(|err| err.host);
        assert_with_log!(downcast == Some("db"), "original error visible", Some("db"), downcast);
    }

    let count = builds.load(Ordering::SeqCst);
    assert_with_log!(count == 1, "factory never retried", 1, count);
    let state = handle.interceptor().state();
    assert_with_log!(
        state == ConstructionState::Failed,
        "attempt is failed",
        ConstructionState::Failed,
        state
    );
    test_complete!("failure_is_replayed_to_every_shape");
}

fn refuse_to_build() -> Outcome<SomeMethods> {
    panic!("schema migration failed")
}

#[test]
fn panicking_factory_fails_every_shape() {
    init_test("panicking_factory_fails_every_shape");
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let handle: SomeMethodsHandle = create_handle(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        defcon::util::yield_times(2).await;
        refuse_to_build()
    });

    let first = block_on(handle.return_async(1)).unwrap_err();
    assert_with_log!(
        first.kind() == FaultKind::Panicked,
        "panic surfaces as a failure",
        FaultKind::Panicked,
        first.kind()
    );
    let message = first.to_string();
    assert_with_log!(
        message.contains("schema migration failed"),
        "panic message is reported",
        "schema migration failed",
        message
    );

    let later = [
        block_on(handle.dummy()).unwrap_err(),
        block_on(handle.no_result_async()).unwrap_err(),
        handle.return_value(SystemTime::now()).unwrap_err(),
        handle.no_result().unwrap_err(),
    ];
    for fault in &later {
        assert_with_log!(
            fault.is_same(&first),
            "every shape replays the same failure",
            first.to_string(),
            fault.to_string()
        );
    }

    let state = handle.interceptor().state();
    assert_with_log!(
        state == ConstructionState::Failed,
        "attempt is failed",
        ConstructionState::Failed,
        state
    );
    let exposed = handle.interceptor().target().is_some();
    assert_with_log!(!exposed, "no target after a panic", false, exposed);
    let rendered = format!("{:?}", handle.interceptor());
    assert_with_log!(
        rendered.contains("Failed"),
        "debug output reports the failed state",
        "Failed",
        rendered
    );
    let count = builds.load(Ordering::SeqCst);
    assert_with_log!(count == 1, "factory never retried", 1, count);
    test_complete!("panicking_factory_fails_every_shape");
}

#[test]
fn multi_cause_failure_keeps_every_cause() {
    init_test("multi_cause_failure_keeps_every_cause");
    let builds = Arc::new(AtomicUsize::new(0));
    let failure = Fault::aggregate([
        Fault::new(ConnectionRefused { host: "primary" }),
        Fault::new(ConnectionRefused { host: "replica" }),
    ]);
    let handle = failing_handle(&builds, failure);
    let fault = handle.no_result().unwrap_err();
    assert_with_log!(
        fault.kind() == FaultKind::Aggregate,
        "aggregate of two is not collapsed",
        FaultKind::Aggregate,
        fault.kind()
    );
    let inner = fault.inner_faults().len();
    assert_with_log!(inner == 2, "both causes kept", 2, inner);
    test_complete!("multi_cause_failure_keeps_every_cause");
}

#[test]
fn failed_target_is_never_exposed() {
    init_test("failed_target_is_never_exposed");
    let builds = Arc::new(AtomicUsize::new(0));
    let handle = failing_handle(&builds, Fault::msg("no target"));
    let _ = block_on(handle.dummy());
    let exposed = handle.interceptor().target().is_some();
    assert_with_log!(!exposed, "no target after failure", false, exposed);
    test_complete!("failed_target_is_never_exposed");
}

#[test]
fn forwarded_failure_is_normalized_for_values() {
    init_test("forwarded_failure_is_normalized_for_values");
    let cause = Fault::new(ConnectionRefused { host: "cache" });
    let raised = cause.clone();
    let interceptor = defcon::CallInterceptor::new(move || async move {
        Outcome::Ok(FailingTarget { failure: raised })
    });
    let fault = block_on(interceptor.call_async::<u32>(READ, defcon::Arguments::new()))
        .unwrap_err();
    assert_with_log!(
        fault.is_same(&cause),
        "single-item aggregate from the target collapses",
        cause.to_string(),
        fault.to_string()
    );
    let state = interceptor.state();
    assert_with_log!(
        state == ConstructionState::Resolved,
        "forwarding failure does not poison construction",
        ConstructionState::Resolved,
        state
    );
    test_complete!("forwarded_failure_is_normalized_for_values");
}

#[test]
fn forwarded_failure_reaches_completion_and_sync_callers() {
    init_test("forwarded_failure_reaches_completion_and_sync_callers");
    let cause = Fault::new(ConnectionRefused { host: "ledger" });
    let raised = cause.clone();
    let interceptor = defcon::CallInterceptor::new(move || async move {
        Outcome::Ok(FailingTarget { failure: raised })
    });

    let written = block_on(interceptor.call_fire_and_forget(WRITE, defcon::Arguments::new()))
        .unwrap_err();
    assert_with_log!(
        written.is_same(&cause),
        "completion failure is the target's own",
        cause.to_string(),
        written.to_string()
    );
    let checked = interceptor
        .call_sync::<u32>(CHECK, defcon::Arguments::new())
        .unwrap_err();
    assert_with_log!(
        checked.is_same(&cause),
        "sync failure is the target's own",
        cause.to_string(),
        checked.to_string()
    );

    let state = interceptor.state();
    assert_with_log!(
        state == ConstructionState::Resolved,
        "forwarding failures leave construction resolved",
        ConstructionState::Resolved,
        state
    );
    test_complete!("forwarded_failure_reaches_completion_and_sync_callers");
}

const READ: defcon::MethodId = defcon::MethodId::new("read");
const WRITE: defcon::MethodId = defcon::MethodId::new("write");
const CHECK: defcon::MethodId = defcon::MethodId::new("check");

struct FailingTarget {
    failure: Fault,
}

impl defcon::Dispatch for FailingTarget {
    fn dispatch(
        &self,
        method: &defcon::MethodId,
        _: defcon::Arguments,
    ) -> Result<defcon::Forwarded<'_>, Fault> {
        match *method {
            READ => Ok(defcon::Forwarded::value(async {
                Outcome::<u32>::Err(Fault::aggregate([self.failure.clone()]))
            })),
            WRITE => Ok(defcon::Forwarded::completion(async {
                defcon::util::yield_now().await;
                Outcome::Err(self.failure.clone())
            })),
            CHECK => Ok(defcon::Forwarded::immediate(Outcome::<u32>::Err(
                self.failure.clone(),
            ))),
            other => Err(Fault::unknown_method(other)),
        }
    }
}
