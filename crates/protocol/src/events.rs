//! Domain events emitted after successful mutations.

use serde::Serialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use uuid::Uuid;
use wttp_core::{AccountId, Clock, Method, Role};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    ResourceMutated {
        method: Method,
        path: String,
        status: u16,
        version: u64,
    },
    RoleCreated {
        role: Role,
        admin: Role,
    },
    SiteAdminChanged {
        previous: Role,
        current: Role,
    },
    RoleGranted {
        role: Role,
        account: AccountId,
    },
    RoleRevoked {
        role: Role,
        account: AccountId,
    },
    Blacklisted {
        account: AccountId,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct ProtocolEvent {
    pub id: Uuid,
    pub at: OffsetDateTime,
    pub caller: AccountId,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Fan-out of [`ProtocolEvent`]s to any number of subscribers.
///
/// Slow subscribers observe `RecvError::Lagged` rather than blocking writers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ProtocolEvent>,
    clock: Arc<dyn Clock>,
}

impl EventBus {
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, clock }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProtocolEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, caller: &AccountId, kind: EventKind) {
        let at = OffsetDateTime::from_unix_timestamp(self.clock.now() as i64)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let event = ProtocolEvent {
            id: Uuid::new_v4(),
            at,
            caller: caller.clone(),
            kind,
        };
        tracing::debug!(event_id = %event.id, caller = %event.caller, kind = ?event.kind, "event emitted");
        // No receivers is not an error.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wttp_core::ManualClock;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new(8, Arc::new(ManualClock::new(1_700_000_000)));
        let mut rx = bus.subscribe();
        bus.emit(
            &AccountId::new("alice"),
            EventKind::Blacklisted {
                account: AccountId::new("mallory"),
            },
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.caller, AccountId::new("alice"));
        assert_eq!(event.at.unix_timestamp(), 1_700_000_000);
        assert!(matches!(event.kind, EventKind::Blacklisted { .. }));
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(1, Arc::new(ManualClock::new(0)));
        bus.emit(
            &AccountId::anonymous(),
            EventKind::RoleCreated {
                role: Role::new("editors"),
                admin: Role::site_admin(),
            },
        );
    }
}
