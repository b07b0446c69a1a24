use std::error::Error;
use std::time::Duration;

use modrun::errors::{ModuleError, ProtocolError};
use modrun::future::{FutureEvent, ModuleFuture, Outcome};
use modrun::types::{ExitStatus, ProcessErrorKind};
use modrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn running_future() -> ModuleFuture {
    let future = ModuleFuture::new();
    future.report_started();
    assert!(future.try_begin_running());
    future.set_progress_range(0, 1002);
    future
}

#[test]
fn cancel_before_running_finishes_immediately() {
    init_tracing();
    let future = ModuleFuture::new();
    future.report_started();

    future.cancel();

    assert!(future.is_canceled());
    assert!(future.is_finished());
    assert!(!future.try_begin_running());
    assert_eq!(future.outcome(), Some(Outcome::Canceled));

    // Must not block.
    future.wait_for_finished();
}

#[test]
fn cancel_is_idempotent() {
    let future = ModuleFuture::new();
    let mut events = future.subscribe();

    future.cancel();
    future.cancel();

    assert_eq!(events.try_recv().ok(), Some(FutureEvent::Canceled));
    assert_eq!(events.try_recv().ok(), Some(FutureEvent::Finished));
    assert!(events.try_recv().is_err());
}

#[test]
fn cancel_while_running_waits_for_the_runner() {
    let future = running_future();

    future.cancel();

    assert!(future.is_canceled());
    assert!(!future.is_finished());
    assert!(!future.wait_for_finished_timeout(Duration::from_millis(20)));

    assert!(future.report_finished());
    assert!(future.is_finished());
    assert_eq!(future.outcome(), Some(Outcome::Canceled));
}

#[test]
fn canceled_result_is_already_finished() {
    let future = ModuleFuture::canceled_result();
    assert!(future.is_canceled());
    assert!(future.is_finished());
    assert!(!future.is_started());
    assert_eq!(future.outcome(), Some(Outcome::Canceled));
}

#[test]
fn progress_value_is_clamped_and_never_moves_back() {
    let future = running_future();

    future.set_progress_value(300);
    future.set_progress_value(200);
    assert_eq!(future.progress_value(), 300);

    future.set_progress_value(5000);
    assert_eq!(future.progress_value(), 1002);

    let future = running_future();
    future.set_progress_value(-5);
    assert_eq!(future.progress_value(), 0);
}

#[test]
fn shrinking_the_range_reclamps_the_value() {
    let future = running_future();
    future.set_progress_value(800);

    future.set_progress_range(0, 1);

    assert_eq!(future.progress_range(), (0, 1));
    assert_eq!(future.progress_value(), 1);

    // An inverted range collapses onto its minimum.
    future.set_progress_range(5, 2);
    assert_eq!(future.progress_range(), (5, 5));
}

#[test]
fn text_is_replaced_even_when_value_does_not_advance() {
    let future = running_future();
    future.set_progress_value_and_text(400, "first");
    future.set_progress_value_and_text(100, "second");

    assert_eq!(future.progress_value(), 400);
    assert_eq!(future.progress_text(), "second");
}

#[test]
fn pending_reads_only_return_new_bytes() {
    let future = running_future();

    future.report_output_bytes(b"abc");
    assert_eq!(future.read_pending_output(), b"abc");
    assert!(future.read_pending_output().is_empty());

    future.report_output_bytes(b"def");
    assert_eq!(future.read_pending_output(), b"def");
    assert_eq!(future.output_data(), b"abcdef");

    future.report_error_bytes(b"oops");
    assert_eq!(future.read_pending_error(), b"oops");
    assert_eq!(future.error_data(), b"oops");
}

#[test]
fn results_keep_arrival_order_and_duplicates() {
    let future = running_future();
    let mut events = future.subscribe();

    future.report_result("area", "1");
    future.report_result("area", "2");

    assert_eq!(future.result_count(), 2);
    assert_eq!(future.result_at(1).map(|r| r.value), Some("2".to_string()));
    assert!(future.result_at(2).is_none());
    assert_eq!(events.try_recv().ok(), Some(FutureEvent::ResultReady(0)));
    assert_eq!(events.try_recv().ok(), Some(FutureEvent::ResultReady(1)));
}

#[test]
fn finished_future_ignores_further_reports() {
    let future = running_future();
    future.set_progress_value(10);
    assert!(future.report_finished());
    assert!(!future.report_finished());

    future.set_progress_value(500);
    future.set_progress_text("late");
    future.report_result("x", "1");
    future.report_output_bytes(b"late");
    future.report_exception(ModuleError::Invocation("late".to_string()));
    future.pause();

    assert_eq!(future.progress_value(), 10);
    assert!(future.progress_text().is_empty());
    assert_eq!(future.result_count(), 0);
    assert!(future.output_data().is_empty());
    assert!(future.error().is_none());
    assert!(!future.is_paused());
    assert_eq!(
        future.outcome(),
        Some(Outcome::Succeeded {
            results: 0,
            protocol_errors: 0
        })
    );
}

#[test]
fn failure_details_are_exposed() {
    let future = running_future();
    future.report_exception(ModuleError::NonZeroExit {
        code: 3,
        stderr: "bad input".to_string(),
    });
    future.report_finished();

    assert_eq!(future.exit_code(), 3);
    assert_eq!(future.exit_status(), ExitStatus::Normal);
    assert_eq!(future.error_kind(), ProcessErrorKind::Other);
    assert!(future.error_string().contains("bad input"));
    assert!(matches!(future.outcome(), Some(Outcome::Failed(_))));
}

#[test]
fn protocol_errors_do_not_fail_the_task() {
    let future = running_future();
    future.report_protocol_error(ProtocolError {
        line: 1,
        column: 1,
        message: "boom".to_string(),
    });
    future.report_finished();

    assert_eq!(future.protocol_errors().len(), 1);
    assert_eq!(
        future.outcome(),
        Some(Outcome::Succeeded {
            results: 0,
            protocol_errors: 1
        })
    );
}

#[test]
fn pause_toggles_and_cancel_clears_it() {
    let future = running_future();
    let mut events = future.subscribe();

    future.toggle_paused();
    assert!(future.is_paused());
    future.pause();
    future.resume();
    assert!(!future.is_paused());
    future.pause();
    future.cancel();
    assert!(!future.is_paused());

    assert_eq!(events.try_recv().ok(), Some(FutureEvent::Paused));
    assert_eq!(events.try_recv().ok(), Some(FutureEvent::Resumed));
    assert_eq!(events.try_recv().ok(), Some(FutureEvent::Paused));
    assert_eq!(events.try_recv().ok(), Some(FutureEvent::Canceled));
}

#[test]
fn clones_share_one_task() {
    let future = ModuleFuture::new();
    let other = future.clone();
    assert!(future.same_task(&other));
    assert!(!future.same_task(&ModuleFuture::new()));

    other.cancel();
    assert!(future.is_canceled());
}

#[tokio::test]
async fn async_waiters_wake_on_finish_and_cancel() -> TestResult {
    init_tracing();
    let future = running_future();

    let waiter = {
        let future = future.clone();
        tokio::spawn(async move {
            future.cancelled().await;
            future.finished().await;
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    future.cancel();
    future.report_finished();

    with_timeout(waiter).await?;
    Ok(())
}

#[test]
fn blocking_wait_wakes_from_another_thread() {
    let future = running_future();
    let reporter = future.clone();

    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        reporter.report_finished();
    });

    assert!(future.wait_for_finished_timeout(Duration::from_secs(5)));
    handle.join().expect("reporter thread panicked");
}
