#![deny(missing_docs)]
//! Shared logging utilities for the storyteller workspace.
//!
//! This crate provides the `monitor_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Messages logged inside
//! [`with_session`] or from a future wrapped by [`in_session`] carry a
//! `[session N]` prefix. Tasks of several sessions share one engine thread, so
//! the session is scoped per poll rather than set once per thread.

use std::cell::Cell;
use std::future::Future;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Thread-local storage for the monitoring session currently being served.
    static ACTIVE_SESSION: Cell<u64> = const { Cell::new(0) };
}

/// Sets the monitoring session served by the current thread.
/// Pass 0 to clear it.
fn set_active_session(session: u64) {
    ACTIVE_SESSION.with(|v| v.set(session));
}

/// Retrieves the monitoring session served by the current thread.
/// Returns 0 if no session is active.
pub fn active_session() -> u64 {
    ACTIVE_SESSION.with(|v| v.get())
}

/// Runs `f` with `session` marked active on the current thread, restoring the
/// previous value afterwards.
pub fn with_session<R>(session: u64, f: impl FnOnce() -> R) -> R {
    let previous = active_session();
    set_active_session(session);
    let result = f();
    set_active_session(previous);
    result
}

/// Drives `future` with `session` marked active during each poll.
///
/// Interleaved tasks on the same thread each log under their own session.
pub async fn in_session<F: Future>(session: u64, future: F) -> F::Output {
    let mut future = std::pin::pin!(future);
    std::future::poll_fn(|cx| with_session(session, || future.as_mut().poll(cx))).await
}

#[doc(hidden)]
#[macro_export]
macro_rules! __monitor_log {
    ($level:expr, $($arg:tt)*) => {{
        match $crate::active_session() {
            0 => $crate::log::log!($level, $($arg)*),
            session => $crate::log::log!(
                $level,
                "[session {}] {}",
                session,
                format_args!($($arg)*)
            ),
        }
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_trace {
    ($($arg:tt)*) => {{
        $crate::__monitor_log!($crate::log::Level::Trace, $($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_info {
    ($($arg:tt)*) => {{
        $crate::__monitor_log!($crate::log::Level::Info, $($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_debug {
    ($($arg:tt)*) => {{
        $crate::__monitor_log!($crate::log::Level::Debug, $($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_warn {
    ($($arg:tt)*) => {{
        $crate::__monitor_log!($crate::log::Level::Warn, $($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_error {
    ($($arg:tt)*) => {{
        $crate::__monitor_log!($crate::log::Level::Error, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_session_restores_previous_value() {
        set_active_session(3);
        let seen = with_session(7, active_session);
        assert_eq!(seen, 7);
        assert_eq!(active_session(), 3);
        set_active_session(0);
    }

    fn poll_once<F: Future>(future: F) -> std::task::Poll<F::Output> {
        use std::sync::Arc;
        use std::task::{Context, Wake, Waker};

        struct Noop;
        impl Wake for Noop {
            fn wake(self: Arc<Self>) {}
        }

        let waker = Waker::from(Arc::new(Noop));
        let mut cx = Context::from_waker(&waker);
        std::pin::pin!(future).poll(&mut cx)
    }

    #[test]
    fn in_session_scopes_each_poll() {
        set_active_session(0);
        let mut polls = 0;
        let pending_once = std::future::poll_fn(|cx| {
            polls += 1;
            if polls == 1 {
                cx.waker().wake_by_ref();
                return std::task::Poll::Pending;
            }
            std::task::Poll::Ready(active_session())
        });
        let mut wrapped = Box::pin(in_session(4, pending_once));

        let first = poll_once(wrapped.as_mut());
        assert!(first.is_pending());
        assert_eq!(active_session(), 0);

        set_active_session(9);
        assert_eq!(poll_once(wrapped.as_mut()), std::task::Poll::Ready(4));
        assert_eq!(active_session(), 9);
        set_active_session(0);
    }

    #[test]
    fn macros_expand_with_and_without_session() {
        initialize_for_tests();
        monitor_info!("no session {}", 1);
        with_session(2, || monitor_debug!("inside session {}", 2));
    }
}
