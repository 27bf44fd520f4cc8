// DETERMINISTIC CALL EXECUTOR
// Applies one call at a time against the replicated access-control state
//
// SAFETY INVARIANTS:
// 1. Calls execute strictly one after another in submission order
// 2. Events of a call reach the log only if the whole call succeeded
// 3. A rejected call leaves state and log exactly as before
// 4. The same call sequence yields the same state root on every replica

use log::{info, warn};
use serde::{Deserialize, Serialize};

use permchain_authorization::Authorization;
use permchain_node_manager::NodeManager;
use permchain_permission::{PermissionInfo, PermissionRegistry};
use permchain_types::{
    AclError, AclEvent, Address, CallContext, EventLog, FuncSig, NodeStatus, ResourceList,
};

use crate::management::PermissionManagement;
use crate::state::AclState;

/// A mutating call as submitted in a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    NewPermission {
        name: String,
        resources: ResourceList,
    },
    DeletePermission {
        permission: Address,
    },
    UpdatePermissionName {
        permission: Address,
        name: String,
    },
    AddResources {
        permission: Address,
        resources: ResourceList,
    },
    DeleteResources {
        permission: Address,
        resources: ResourceList,
    },
    SetAuthorization {
        account: Address,
        permission: Address,
    },
    SetAuthorizations {
        account: Address,
        permissions: Vec<Address>,
    },
    CancelAuthorization {
        account: Address,
        permission: Address,
    },
    CancelAuthorizations {
        account: Address,
        permissions: Vec<Address>,
    },
    ClearAuthorization {
        account: Address,
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
    },
}

/// A call together with its verified sender and block height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub caller: Address,
    pub height: u64,
    #[serde(flatten)]
    pub call: Call,
}

impl Transaction {
    pub fn context(&self) -> CallContext {
        CallContext::new(self.caller, self.height)
    }
}

/// Outcome of a call that was not rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// False for not-found no-ops (nothing changed, nothing emitted)
    pub success: bool,

    pub events: Vec<AclEvent>,

    /// Address allocated by `NewPermission`
    pub created: Option<Address>,
}

pub struct AclRuntime {
    management: PermissionManagement,
    state: AclState,
    log: EventLog,
}

impl AclRuntime {
    /// Assemble a runtime. Fails if the components do not trust the façade.
    pub fn new(management: PermissionManagement, state: AclState) -> Result<Self, AclError> {
        for expected_by in [state.permissions.manager(), state.authorization.manager()] {
            if expected_by != management.address() {
                return Err(AclError::NotPermissionManager {
                    caller: management.address(),
                    expected: expected_by,
                });
            }
        }
        Ok(AclRuntime {
            management,
            state,
            log: EventLog::new(),
        })
    }

    pub fn execute(&mut self, ctx: &CallContext, call: Call) -> Result<Receipt, AclError> {
        let mut staged = EventLog::new();
        let mut created = None;

        let outcome = self.dispatch(ctx, call, &mut staged, &mut created);
        match outcome {
            Ok(success) => {
                let events = staged.events().to_vec();
                staged.drain_into(&mut self.log);
                Ok(Receipt {
                    success,
                    events,
                    created,
                })
            }
            Err(e) => {
                warn!("Call from {} at height {} rejected: {}", ctx.caller, ctx.height, e);
                Err(e)
            }
        }
    }

    pub fn execute_transaction(&mut self, tx: &Transaction) -> Result<Receipt, AclError> {
        self.execute(&tx.context(), tx.call.clone())
    }

    fn dispatch(
        &mut self,
        ctx: &CallContext,
        call: Call,
        sink: &mut EventLog,
        created: &mut Option<Address>,
    ) -> Result<bool, AclError> {
        let m = &self.management;
        let state = &mut self.state;
        match call {
            Call::NewPermission { name, resources } => {
                let address = m.new_permission(ctx, state, name, resources, sink)?;
                *created = Some(address);
                Ok(true)
            }
            Call::DeletePermission { permission } => {
                m.delete_permission(ctx, state, permission, sink)
            }
            Call::UpdatePermissionName { permission, name } => {
                m.update_permission_name(ctx, state, permission, name, sink)
            }
            Call::AddResources {
                permission,
                resources,
            } => m.add_resources(ctx, state, permission, &resources, sink),
            Call::DeleteResources {
                permission,
                resources,
            } => m.delete_resources(ctx, state, permission, &resources, sink),
            Call::SetAuthorization {
                account,
                permission,
            } => m.set_authorization(ctx, state, account, permission, sink),
            Call::SetAuthorizations {
                account,
                permissions,
            } => m.set_authorizations(ctx, state, account, &permissions, sink),
            Call::CancelAuthorization {
                account,
                permission,
            } => m.cancel_authorization(ctx, state, account, permission, sink),
            Call::CancelAuthorizations {
                account,
                permissions,
            } => m.cancel_authorizations(ctx, state, account, &permissions, sink),
            Call::ClearAuthorization { account } => {
                m.clear_authorization(ctx, state, account, sink)
            }
            Call::NewNode { node } => state.nodes.new_node(ctx, node, sink),
            Call::ApproveNode { node } => state.nodes.approve_node(ctx, node, sink),
            Call::DeleteNode { node } => state.nodes.delete_node(ctx, node, sink),
            Call::AddAdmin { node } => state.nodes.add_admin(ctx, node, sink),
        }
    }

    /// Apply transactions in order, collecting one result per transaction.
    pub fn replay(&mut self, txs: &[Transaction]) -> Vec<Result<Receipt, AclError>> {
        let results: Vec<_> = txs.iter().map(|tx| self.execute_transaction(tx)).collect();
        let accepted = results.iter().filter(|r| r.is_ok()).count();
        info!("Replayed {} transactions, {} accepted", txs.len(), accepted);
        results
    }

    pub fn management(&self) -> &PermissionManagement {
        &self.management
    }

    pub fn state(&self) -> &AclState {
        &self.state
    }

    pub fn permissions(&self) -> &PermissionRegistry {
        &self.state.permissions
    }

    pub fn authorization(&self) -> &Authorization {
        &self.state.authorization
    }

    pub fn nodes(&self) -> &NodeManager {
        &self.state.nodes
    }

    /// Every event committed so far, in execution order.
    pub fn events(&self) -> &[AclEvent] {
        self.log.events()
    }

    pub fn check_permission(&self, account: &Address, cont: Address, func: FuncSig) -> bool {
        self.state
            .authorization
            .check_permission(account, cont, func, &self.state.permissions)
    }

    pub fn query_permissions(&self, account: &Address) -> Vec<Address> {
        self.state.authorization.query_permissions(account)
    }

    pub fn query_accounts(&self, permission: &Address) -> Vec<Address> {
        self.state.authorization.query_accounts(permission)
    }

    pub fn query_info(&self, permission: &Address) -> Result<PermissionInfo, AclError> {
        self.state.permissions.query_info(permission)
    }

    pub fn list_node(&self) -> &[Address] {
        self.state.nodes.list_node()
    }

    pub fn get_status(&self, node: &Address) -> NodeStatus {
        self.state.nodes.get_status(node)
    }

    pub fn is_admin(&self, node: &Address) -> bool {
        self.state.nodes.is_admin(node)
    }

    pub fn state_root_hex(&self) -> Result<String, bincode::Error> {
        self.state.state_root_hex()
    }
}
