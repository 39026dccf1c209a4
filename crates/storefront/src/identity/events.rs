//! Session-change notifications.
//!
//! [`AuthEvents`] is a broadcast hub. [`AuthEvents::subscribe`] spawns a task
//! that feeds each event to a callback and returns a [`Subscription`]; dropping
//! the subscription (or calling [`Subscription::unsubscribe`]) stops the task.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use thread_hanger_core::Email;

const CHANNEL_CAPACITY: usize = 64;

/// An admin session started or ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { uid: String, email: Email },
    SignedOut { uid: String, email: Email },
}

/// Broadcast hub for [`SessionEvent`]s.
#[derive(Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }

    /// Call `handler` for every event published after this call.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F>(&self, mut handler: F) -> Subscription
    where
        F: FnMut(SessionEvent) + Send + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => handler(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Session event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Subscription { task: Some(task) }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Teardown handle for one subscription.
#[must_use = "dropping a Subscription ends it immediately"]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// End the subscription and wait for its task to stop.
    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Log every session event; the server keeps this subscription for its lifetime.
pub fn log_session_events(events: &AuthEvents) -> Subscription {
    events.subscribe(|event| match event {
        SessionEvent::SignedIn { uid, email } => {
            tracing::info!(%uid, %email, "Admin signed in");
        }
        SessionEvent::SignedOut { uid, email } => {
            tracing::info!(%uid, %email, "Admin signed out");
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn signed_in() -> SessionEvent {
        SessionEvent::SignedIn {
            uid: "u1".to_owned(),
            email: Email::parse("owner@shop.pk").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let events = AuthEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();

        let subscription = events.subscribe(move |event| {
            sink.lock().unwrap().push(event);
            let _ = done_tx.send(());
        });
        events.publish(signed_in());
        done_rx.recv().await.unwrap();

        assert_eq!(seen.lock().unwrap().as_slice(), &[signed_in()]);
        subscription.unsubscribe().await;
    }

    #[tokio::test]
    async fn test_unsubscribe_releases_receiver() {
        let events = AuthEvents::new();
        let subscription = events.subscribe(|_| {});
        assert_eq!(events.subscriber_count(), 1);

        subscription.unsubscribe().await;
        assert_eq!(events.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_ends_subscription() {
        let events = AuthEvents::new();
        drop(events.subscribe(|_| {}));
        // Abort is processed on a later scheduler turn.
        for _ in 0..100 {
            if events.subscriber_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        AuthEvents::new().publish(signed_in());
    }
}
