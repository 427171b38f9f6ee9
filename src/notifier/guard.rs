//! Failure reporting for fallible operations.
//!
//! [`with_error_notification`] runs an operation and, if it fails, sends
//! the error report to Telegram before handing the error back untouched.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures_util::FutureExt;
use tracing::warn;

use super::Notify;

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Longest escaped operation name kept in a notification header.
const MAX_NAME_CHARS: usize = 256;

const TRUNCATION_MARKER: &str = "\n…";

const BACKTRACE_HEADING: &str = "Stack backtrace:";

/// Runs `operation`; on failure, notifies and returns the same error.
///
/// The notification embeds `name` and the error's `Debug` report, which
/// for `anyhow::Error` includes the cause chain and any captured
/// backtrace. Other errors get a backtrace appended when one is enabled
/// through `RUST_BACKTRACE`. Success values pass through unchanged and
/// send nothing.
///
/// A panic inside `operation` is reported the same way and then resumed,
/// so the caller still unwinds.
pub async fn with_error_notification<N, F, Fut, T, E>(
    notifier: &N,
    name: &str,
    operation: F,
) -> Result<T, E>
where
    N: Notify,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Debug,
{
    let outcome = AssertUnwindSafe(async move { operation().await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            warn!("{} failed, sending error notification", name);
            notifier.send_message(&format_error_message(name, &err)).await;
            Err(err)
        }
        Err(payload) => {
            warn!("{} panicked, sending error notification", name);
            notifier
                .send_message(&format_panic_message(name, payload.as_ref()))
                .await;
            panic::resume_unwind(payload)
        }
    }
}

/// Builds the HTML notification for a failed operation.
pub fn format_error_message(name: &str, error: &impl fmt::Debug) -> String {
    let report = with_backtrace(format!("{error:?}"), &Backtrace::capture());
    compose_message(name, &report)
}

/// Builds the HTML notification for an operation that panicked.
fn format_panic_message(name: &str, payload: &(dyn Any + Send)) -> String {
    let report = with_backtrace(
        format!("panicked: {}", panic_message(payload)),
        &Backtrace::capture(),
    );
    compose_message(name, &report)
}

fn compose_message(name: &str, report: &str) -> String {
    let header = format!(
        "<b>❗️ Error in <code>{}</code></b>\n\n",
        escape_html_truncated(name, MAX_NAME_CHARS)
    );

    let budget = MAX_MESSAGE_CHARS
        .saturating_sub(header.chars().count())
        .saturating_sub("<pre></pre>".len());
    let report = escape_html_truncated(report, budget);

    format!("{header}<pre>{report}</pre>")
}

/// Appends `trace` to `report` if it was captured and the report does not
/// already carry one.
fn with_backtrace(mut report: String, trace: &Backtrace) -> String {
    if trace.status() == BacktraceStatus::Captured && !report.contains(BACKTRACE_HEADING) {
        report.push_str("\n\n");
        report.push_str(BACKTRACE_HEADING);
        report.push('\n');
        report.push_str(&trace.to_string());
    }
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "Box<dyn Any>"
    }
}

/// Escapes the three characters Telegram's HTML parse mode reserves.
pub fn escape_html(text: &str) -> String {
    escape_html_truncated(text, usize::MAX)
}

/// Escapes `text`, cutting it so the result fits in `budget` characters.
/// Entities are never split.
fn escape_html_truncated(text: &str, budget: usize) -> String {
    let fits = text.chars().map(escaped_len).sum::<usize>() <= budget;
    let limit = if fits {
        budget
    } else {
        budget.saturating_sub(TRUNCATION_MARKER.chars().count())
    };

    let mut out = String::with_capacity(text.len().min(budget));
    let mut used = 0usize;

    for c in text.chars() {
        let len = escaped_len(c);
        if used + len > limit {
            break;
        }
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
        used += len;
    }

    if !fits {
        out.push_str(TRUNCATION_MARKER);
    }
    out
}

const fn escaped_len(c: char) -> usize {
    match c {
        '&' => 5,
        '<' | '>' => 4,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{Context, anyhow};

    use super::*;

    #[derive(Default)]
    struct SpyNotifier {
        sent: Mutex<Vec<String>>,
    }

    impl Notify for SpyNotifier {
        async fn send_message(&self, text: &str) {
            self.sent.lock().unwrap().push(text.to_owned());
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum SyncError {
        Upstream(u16),
    }

    async fn sync_orders() -> Result<u32, SyncError> {
        Err(SyncError::Upstream(503))
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let spy = SpyNotifier::default();

        let value = with_error_notification(&spy, "compute", || async { Ok::<_, SyncError>(7) })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert!(spy.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_notifies_once_and_returns_same_error() {
        let spy = SpyNotifier::default();

        let err = with_error_notification(&spy, "sync_orders", sync_orders)
            .await
            .unwrap_err();

        assert_eq!(err, SyncError::Upstream(503));
        let sent = spy.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("<code>sync_orders</code>"));
        assert!(sent[0].contains("Upstream(503)"));
    }

    #[tokio::test]
    async fn test_anyhow_report_includes_cause_chain() {
        let spy = SpyNotifier::default();

        let result: anyhow::Result<()> = with_error_notification(&spy, "load_feed", || async {
            Err(anyhow!("connection reset")).context("failed to load feed")
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "failed to load feed");
        assert_eq!(err.root_cause().to_string(), "connection reset");

        let sent = spy.sent.lock().unwrap();
        assert!(sent[0].contains("failed to load feed"));
        assert!(sent[0].contains("Caused by"));
        assert!(sent[0].contains("connection reset"));
    }

    async fn reindex() -> Result<(), SyncError> {
        panic!("index corrupted")
    }

    #[tokio::test]
    async fn test_panic_notifies_once_and_resumes() {
        let spy = SpyNotifier::default();

        let outcome = AssertUnwindSafe(with_error_notification(&spy, "reindex", reindex))
            .catch_unwind()
            .await;

        let payload = outcome.unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "index corrupted");

        let sent = spy.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("<code>reindex</code>"));
        assert!(sent[0].contains("panicked: index corrupted"));
    }

    #[test]
    fn test_captured_backtrace_is_appended_once() {
        let trace = Backtrace::force_capture();

        let report = with_backtrace("Upstream(503)".to_owned(), &trace);
        assert!(report.starts_with("Upstream(503)\n\nStack backtrace:\n"));
        assert!(report.len() > "Upstream(503)\n\nStack backtrace:\n".len());

        let already = "boom\n\nStack backtrace:\n   0: main".to_owned();
        assert_eq!(with_backtrace(already.clone(), &trace), already);

        let disabled = with_backtrace("Upstream(503)".to_owned(), &Backtrace::disabled());
        assert_eq!(disabled, "Upstream(503)");
    }

    #[test]
    fn test_long_name_is_capped() {
        let name = "step&".repeat(2000);
        let message = format_error_message(&name, &"failed");

        assert!(message.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(message.contains("<pre>failed"));
    }

    #[test]
    fn test_message_escapes_html() {
        let message = format_error_message("parse<T>", &"expected `<` & got `>`");
        assert!(message.contains("<code>parse&lt;T&gt;</code>"));
        assert!(message.contains("&lt;` &amp; got `&gt;"));
    }

    #[test]
    fn test_message_fits_telegram_limit() {
        let huge = "<frame>".repeat(2000);
        let message = format_error_message("render", &huge);

        assert!(message.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(message.ends_with("\n…</pre>"));
        // No entity is cut in half.
        let body = message.trim_end_matches("\n…</pre>");
        let last_amp = body.rfind('&').unwrap();
        assert!(body[last_amp..].contains(';'));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_html("plain"), "plain");
    }
}
