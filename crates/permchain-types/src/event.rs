// NOTIFICATIONS
// Structured events emitted by successful mutating calls
//
// SAFETY INVARIANTS:
// 1. Exactly one event per successful component-level mutation
// 2. Rejected calls emit nothing
// 3. Event order equals execution order

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AclEvent {
    ResourcesAdded {
        permission: Address,
        resources: Vec<Resource>,
    },
    ResourcesDeleted {
        permission: Address,
        resources: Vec<Resource>,
    },
    NameUpdated {
        permission: Address,
        old_name: String,
        new_name: String,
    },
    PermissionClosed {
        permission: Address,
    },
    AuthSet {
        account: Address,
        permission: Address,
    },
    AuthCanceled {
        account: Address,
        permission: Address,
    },
    AuthCleared {
        account: Address,
    },
    PermissionAuthCleared {
        permission: Address,
    },
    NewNode {
        node: Address,
    },
    ApproveNode {
        node: Address,
    },
    DeleteNode {
        node: Address,
    },
    AddAdmin {
        node: Address,
        granted_by: Address,
    },
}

impl AclEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AclEvent::ResourcesAdded { .. } => "resources_added",
            AclEvent::ResourcesDeleted { .. } => "resources_deleted",
            AclEvent::NameUpdated { .. } => "name_updated",
            AclEvent::PermissionClosed { .. } => "permission_closed",
            AclEvent::AuthSet { .. } => "auth_set",
            AclEvent::AuthCanceled { .. } => "auth_canceled",
            AclEvent::AuthCleared { .. } => "auth_cleared",
            AclEvent::PermissionAuthCleared { .. } => "permission_auth_cleared",
            AclEvent::NewNode { .. } => "new_node",
            AclEvent::ApproveNode { .. } => "approve_node",
            AclEvent::DeleteNode { .. } => "delete_node",
            AclEvent::AddAdmin { .. } => "add_admin",
        }
    }
}

/// Destination for emitted events.
pub trait EventSink {
    fn emit(&mut self, event: AclEvent);
}

/// In-memory ordered event buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<AclEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[AclEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&AclEvent> {
        self.events.last()
    }

    /// Move every buffered event into another sink, preserving order.
    pub fn drain_into(&mut self, sink: &mut dyn EventSink) {
        for event in self.events.drain(..) {
            sink.emit(event);
        }
    }

    pub fn into_events(self) -> Vec<AclEvent> {
        self.events
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: AclEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_preserves_order() {
        let mut log = EventLog::new();
        log.emit(AclEvent::NewNode { node: Address::from_low_u64(1) });
        log.emit(AclEvent::ApproveNode { node: Address::from_low_u64(1) });
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].name(), "new_node");
        assert_eq!(log.last().map(AclEvent::name), Some("approve_node"));
    }

    #[test]
    fn test_drain_into() {
        let mut staged = EventLog::new();
        staged.emit(AclEvent::AuthCleared { account: Address::from_low_u64(9) });
        let mut committed = EventLog::new();
        staged.drain_into(&mut committed);
        assert!(staged.is_empty());
        assert_eq!(committed.len(), 1);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = AclEvent::AddAdmin {
            node: Address::from_low_u64(2),
            granted_by: Address::from_low_u64(1),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "add_admin");
        assert_eq!(json["granted_by"], "0x0000000000000000000000000000000000000001");
    }
}
