// CONSENSUS NODE MEMBERSHIP
// Admission and removal of consensus nodes under an admin set
//
// SAFETY INVARIANTS:
// 1. Transitions are strictly Close -> Ready -> Start -> Close
// 2. Approve and delete require an admin caller
// 3. At most one approve/delete per block height; a successful delete
//    re-opens the guard for that height
// 4. The active list keeps approval order; removal preserves the order of the rest
// 5. Admin rights are append-only

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use permchain_types::{AclError, AclEvent, Address, CallContext, EventSink, NodeStatus};

use crate::guard::BlockGuard;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeManager {
    /// Explicit status per known node; absent means Close
    status: BTreeMap<Address, NodeStatus>,

    admins: BTreeSet<Address>,

    /// Active consensus nodes in approval order
    nodes: Vec<Address>,

    guard: BlockGuard,
}

impl NodeManager {
    /// Genesis constructor: every listed node starts as an active member.
    pub fn new(genesis_nodes: &[Address], admins: &[Address]) -> Result<Self, AclError> {
        let mut manager = NodeManager {
            status: BTreeMap::new(),
            admins: admins.iter().copied().collect(),
            nodes: Vec::with_capacity(genesis_nodes.len()),
            guard: BlockGuard::default(),
        };
        for node in genesis_nodes {
            if manager.status.insert(*node, NodeStatus::Start).is_some() {
                return Err(AclError::DuplicateGenesisNode(*node));
            }
            manager.nodes.push(*node);
        }
        info!(
            "Node manager initialized with {} nodes and {} admins",
            manager.nodes.len(),
            manager.admins.len()
        );
        Ok(manager)
    }

    fn ensure_admin(&self, ctx: &CallContext) -> Result<(), AclError> {
        if !self.admins.contains(&ctx.caller) {
            warn!("Node manager call from {} rejected: not an admin", ctx.caller);
            return Err(AclError::NotAdmin(ctx.caller));
        }
        Ok(())
    }

    fn ensure_guard_open(&self, ctx: &CallContext) -> Result<(), AclError> {
        if self.guard.is_used(ctx.height) {
            warn!("Membership already changed at height {}", ctx.height);
            return Err(AclError::BlockGuardUsed(ctx.height));
        }
        Ok(())
    }

    fn ensure_status(&self, node: Address, expected: NodeStatus) -> Result<(), AclError> {
        let found = self.get_status(&node);
        if found != expected {
            return Err(AclError::InvalidNodeStatus {
                node,
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Request admission (Close -> Ready). Anyone may call.
    pub fn new_node(
        &mut self,
        _ctx: &CallContext,
        node: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_status(node, NodeStatus::Close)?;
        self.status.insert(node, NodeStatus::Ready);

        sink.emit(AclEvent::NewNode { node });
        info!("Node {} requested admission", node);
        Ok(true)
    }

    /// Admit a ready node (Ready -> Start).
    pub fn approve_node(
        &mut self,
        ctx: &CallContext,
        node: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_admin(ctx)?;
        self.ensure_guard_open(ctx)?;
        self.ensure_status(node, NodeStatus::Ready)?;

        self.status.insert(node, NodeStatus::Start);
        self.nodes.push(node);
        self.guard.mark(ctx.height);

        sink.emit(AclEvent::ApproveNode { node });
        info!("Node {} approved at height {}", node, ctx.height);
        Ok(true)
    }

    /// Remove an active node (Start -> Close).
    ///
    /// Returns `Ok(false)` without touching state when the node is not in the
    /// active list. A successful delete re-opens the guard for this height.
    pub fn delete_node(
        &mut self,
        ctx: &CallContext,
        node: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_admin(ctx)?;
        self.ensure_guard_open(ctx)?;
        self.ensure_status(node, NodeStatus::Start)?;

        let Some(index) = self.nodes.iter().position(|n| *n == node) else {
            debug!("Node {} is Start but missing from the active list", node);
            return Ok(false);
        };
        self.nodes.remove(index);
        self.status.remove(&node);
        // A delete leaves the block's change slot open for one more change
        self.guard.reset(ctx.height);

        sink.emit(AclEvent::DeleteNode { node });
        info!("Node {} removed at height {}", node, ctx.height);
        Ok(true)
    }

    /// Grant admin rights. There is no revocation.
    pub fn add_admin(
        &mut self,
        ctx: &CallContext,
        node: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_admin(ctx)?;
        self.admins.insert(node);

        sink.emit(AclEvent::AddAdmin {
            node,
            granted_by: ctx.caller,
        });
        info!("Admin rights granted to {} by {}", node, ctx.caller);
        Ok(true)
    }

    pub fn list_node(&self) -> &[Address] {
        &self.nodes
    }

    pub fn get_status(&self, node: &Address) -> NodeStatus {
        self.status.get(node).copied().unwrap_or_default()
    }

    pub fn is_admin(&self, node: &Address) -> bool {
        self.admins.contains(node)
    }

    pub fn admins(&self) -> impl Iterator<Item = &Address> {
        self.admins.iter()
    }
}
