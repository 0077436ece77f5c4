//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod some_methods;

use defcon::test_utils::init_test_logging;

pub fn init_test(test_name: &str) {
    init_test_logging();
    defcon::test_phase!(test_name);
}

/// Append-only event log shared between a test and its target.
#[derive(Debug, Clone, Default)]
pub struct Events {
    inner: std::sync::Arc<parking_lot::Mutex<Vec<String>>>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, event: impl Into<String>) {
        self.inner.lock().push(event.into());
    }

    pub fn contains(&self, event: &str) -> bool {
        self.inner.lock().iter().any(|logged| logged == event)
    }

    pub fn count(&self, event: &str) -> usize {
        self.inner.lock().iter().filter(|logged| *logged == event).count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().clone()
    }
}
