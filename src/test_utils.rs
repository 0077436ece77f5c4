//! Test helpers: logging setup and assertion macros that log what they check.
//!
//! Set `RUST_LOG` (for example `RUST_LOG=defcon=trace`) to see the handle's
//! own events interleaved with the test phases.

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Installs a test-writer subscriber once per process.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Logs the start of a test phase.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        $crate::tracing_compat::info!(phase = %$name, "test phase started");
    };
}

/// Logs the successful end of a test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        $crate::tracing_compat::info!(test = %$name, "test completed");
    };
}

/// Asserts `cond`, logging the expected and actual values either way.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {{
        let passed = $cond;
        if passed {
            $crate::tracing_compat::debug!(
                check = %$msg,
                expected = ?$expected,
                actual = ?$actual,
                "assertion passed"
            );
        } else {
            $crate::tracing_compat::error!(
                check = %$msg,
                expected = ?$expected,
                actual = ?$actual,
                "assertion failed"
            );
        }
        assert!(
            passed,
            "{}: expected {:?}, got {:?}",
            $msg, $expected, $actual
        );
    }};
}
