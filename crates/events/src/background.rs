//! Fire-and-forget mail delivery.
//!
//! Tasks are spawned on a [`TaskTracker`] so shutdown can wait for them to
//! drain. A panic inside a task is caught and logged; it never reaches the
//! request that scheduled it.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::mailer::Mailer;
use crate::templates::Template;

/// Send one templated message in the background. Failures are logged.
pub fn spawn_mail(
    tracker: &TaskTracker,
    mailer: Mailer,
    recipient: String,
    template: Template,
    payload: Value,
) -> JoinHandle<()> {
    spawn_isolated(tracker, "mail", async move {
        if let Err(e) = mailer.send(&recipient, template, &payload).await {
            tracing::error!(
                to = %recipient,
                template = template.id(),
                error = %e,
                "Failed to deliver email"
            );
        }
    })
}

/// Spawn `task` on `tracker`, converting a panic into an error log.
pub fn spawn_isolated<F>(tracker: &TaskTracker, name: &'static str, task: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracker.spawn(async move {
        if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
            tracing::error!(task = name, panic = %panic_message(&*panic), "Background task panicked");
        }
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn panicking_task_is_contained() {
        let tracker = TaskTracker::new();
        let handle = spawn_isolated(&tracker, "boom", async { panic!("kaboom") });

        tracker.close();
        tracker.wait().await;
        assert!(handle.await.is_ok(), "panic should not escape the wrapper");
    }

    #[tokio::test]
    async fn tracker_waits_for_outstanding_tasks() {
        let tracker = TaskTracker::new();
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();

        spawn_isolated(&tracker, "slow", async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
        });

        tracker.close();
        tracker.wait().await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn spawn_mail_with_disabled_mailer_completes() {
        let tracker = TaskTracker::new();
        spawn_mail(
            &tracker,
            Mailer::disabled(),
            "alice@example.com".to_string(),
            Template::TokenActivation,
            json!({ "activationToken": "ABCDEFGHIJKLMNOPQRSTUVWXYZ" }),
        );

        tracker.close();
        tracker.wait().await;
        assert!(tracker.is_empty());
    }
}
