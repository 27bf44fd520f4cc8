use thiserror::Error;

use crate::address::{Address, FuncSig};
use crate::node::NodeStatus;

/// Coarse classification of a rejected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller failed the privileged-caller, admin or permission check
    AuthorizationDenied,
    /// Wrong state or malformed input for the requested transition
    PreconditionFailed,
    /// Call targeted a permission that has been closed
    DestroyedEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclError {
    #[error("caller {caller} is not the permission manager {expected}")]
    NotPermissionManager { caller: Address, expected: Address },

    #[error("caller {0} is not a node manager admin")]
    NotAdmin(Address),

    #[error("caller {caller} has no permission for {func} on {cont}")]
    PermissionDenied {
        caller: Address,
        cont: Address,
        func: FuncSig,
    },

    #[error("node {node} is {found}, expected {expected}")]
    InvalidNodeStatus {
        node: Address,
        expected: NodeStatus,
        found: NodeStatus,
    },

    #[error("node membership already changed at block height {0}")]
    BlockGuardUsed(u64),

    #[error("duplicate genesis node {0}")]
    DuplicateGenesisNode(Address),

    #[error("permission name unchanged: {0}")]
    NameUnchanged(String),

    #[error("invalid permission name: {0}")]
    InvalidName(String),

    #[error("resource list is empty")]
    EmptyResources,

    #[error("resource arrays differ in length: {conts} contracts, {funcs} functions")]
    LengthMismatch { conts: usize, funcs: usize },

    #[error("permission {0} not found")]
    PermissionNotFound(Address),

    #[error("permission {0} has been closed")]
    PermissionClosed(Address),

    #[error("permission {0} already exists")]
    PermissionExists(Address),

    #[error("built-in permission {0} cannot be deleted")]
    BuiltinPermission(Address),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid function selector: {0}")]
    InvalidSelector(String),
}

impl AclError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AclError::NotPermissionManager { .. }
            | AclError::NotAdmin(_)
            | AclError::PermissionDenied { .. } => ErrorKind::AuthorizationDenied,
            AclError::PermissionClosed(_) => ErrorKind::DestroyedEntry,
            _ => ErrorKind::PreconditionFailed,
        }
    }
}
