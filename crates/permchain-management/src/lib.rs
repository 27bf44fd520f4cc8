// Permission management façade, genesis bootstrap and call executor
pub mod genesis;
pub mod management;
pub mod runtime;
pub mod selectors;
pub mod state;

pub use genesis::{
    builtin_resource, GenesisConfig, GenesisError, GenesisPermission, NodeManagerGenesis,
    CANCEL_AUTH_ADDRESS, DELETE_PERMISSION_ADDRESS, NEW_PERMISSION_ADDRESS,
    PERMISSION_CREATOR_ADDRESS, PERMISSION_MANAGEMENT_ADDRESS, SET_AUTH_ADDRESS,
    UPDATE_PERMISSION_ADDRESS,
};
pub use management::PermissionManagement;
pub use runtime::{AclRuntime, Call, Receipt, Transaction};
pub use selectors::ManagementOp;
pub use state::AclState;
