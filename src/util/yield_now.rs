//! Cooperative yield futures.
//!
//! These model multi-step asynchronous work without committing to a timer or
//! an executor: a factory that awaits `yield_times(n)` needs `n` extra polls
//! before it can settle.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future that yields execution back to the caller a fixed number of times.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct YieldNow {
    remaining: u32,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.remaining == 0 {
            Poll::Ready(())
        } else {
            self.remaining -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Yields once, allowing other work to run.
pub fn yield_now() -> YieldNow {
    yield_times(1)
}

/// Yields `times` times before completing.
pub fn yield_times(times: u32) -> YieldNow {
    YieldNow { remaining: times }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;

    #[derive(Default)]
    struct WakeCounter {
        wakes: AtomicUsize,
    }

    impl Wake for WakeCounter {
        fn wake(self: Arc<Self>) {
            self.wakes.fetch_add(1, Ordering::Relaxed);
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.wakes.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn yield_now_pending_then_ready_with_single_wake() {
        crate::test_utils::init_test_logging();
        crate::test_phase!("yield_now_pending_then_ready_with_single_wake");

        let wake_counter = Arc::new(WakeCounter::default());
        let waker = std::task::Waker::from(Arc::clone(&wake_counter));
        let mut cx = Context::from_waker(&waker);
        let mut fut = Box::pin(yield_now());

        assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Pending));
        assert_eq!(wake_counter.wakes.load(Ordering::Relaxed), 1);

        assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Ready(())));
        assert_eq!(wake_counter.wakes.load(Ordering::Relaxed), 1);
        crate::test_complete!("yield_now_pending_then_ready_with_single_wake");
    }

    #[test]
    fn yield_times_needs_extra_polls() {
        crate::test_utils::init_test_logging();
        crate::test_phase!("yield_times_needs_extra_polls");

        let wake_counter = Arc::new(WakeCounter::default());
        let waker = std::task::Waker::from(Arc::clone(&wake_counter));
        let mut cx = Context::from_waker(&waker);
        let mut fut = Box::pin(yield_times(3));

        for _ in 0..3 {
            assert!(fut.as_mut().poll(&mut cx).is_pending());
        }
        assert!(fut.as_mut().poll(&mut cx).is_ready());
        assert_eq!(wake_counter.wakes.load(Ordering::Relaxed), 3);

        let mut immediate = Box::pin(yield_times(0));
        assert!(immediate.as_mut().poll(&mut cx).is_ready());
        crate::test_complete!("yield_times_needs_extra_polls");
    }
}
