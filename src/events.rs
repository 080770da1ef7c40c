// src/events.rs

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

use crate::db::audit;
use crate::db::connection::Database;

/// Broadcast when a user's email of record changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityChanged {
    pub user_id: i64,
    pub old_email: String,
    pub new_email: String,
    pub at: i64,
}

/// Fan-out of identity changes to every live subscriber.
#[derive(Default)]
pub struct IdentityEvents {
    subscribers: Mutex<Vec<Sender<IdentityChanged>>>,
}

impl IdentityEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<IdentityChanged> {
        let (tx, rx) = channel();
        match self.subscribers.lock() {
            Ok(mut subs) => subs.push(tx),
            Err(poisoned) => poisoned.into_inner().push(tx),
        }
        rx
    }

    /// Deliver to all subscribers, pruning ones whose receiver is gone.
    /// Returns the number of subscribers reached.
    pub fn publish(&self, event: IdentityChanged) -> usize {
        let mut subs = match self.subscribers.lock() {
            Ok(subs) => subs,
            Err(poisoned) => poisoned.into_inner(),
        };
        subs.retain(|tx| tx.send(event.clone()).is_ok());
        subs.len()
    }
}

/// Records every identity change in the audit log until the bus is dropped.
pub fn spawn_audit_listener(db: Database, rx: Receiver<IdentityChanged>) -> JoinHandle<()> {
    thread::spawn(move || {
        for event in rx {
            let details = serde_json::json!({
                "oldEmail": event.old_email,
                "newEmail": event.new_email,
            });
            let target = event.user_id.to_string();
            let result = db.with_conn(|conn| {
                audit::record(conn, Some(event.user_id), "email_changed", "user", Some(&target), &details, event.at)
            });
            match result {
                Ok(_) => info!(user_id = event.user_id, "identity change recorded"),
                Err(e) => error!(user_id = event.user_id, error = %e, "failed to record identity change"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> IdentityChanged {
        IdentityChanged {
            user_id: 1,
            old_email: "old@b.com".into(),
            new_email: "new@b.com".into(),
            at: 100,
        }
    }

    #[test]
    fn every_subscriber_receives_the_event() {
        let bus = IdentityEvents::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        assert_eq!(bus.publish(event()), 2);
        assert_eq!(a.try_recv().unwrap(), event());
        assert_eq!(b.try_recv().unwrap(), event());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = IdentityEvents::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        assert_eq!(bus.publish(event()), 1);
        assert!(kept.try_recv().is_ok());
    }
}
