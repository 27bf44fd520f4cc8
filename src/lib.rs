//! Permchain: permission registry, authorization index, consensus node
//! membership and the management façade that ties them together.

pub mod settings;

pub use permchain_authorization as authorization;
pub use permchain_management as management;
pub use permchain_node_manager as node_manager;
pub use permchain_permission as permission;
pub use permchain_types as types;

pub use permchain_management::{AclRuntime, Call, GenesisConfig, Receipt, Transaction};
pub use permchain_types::{AclError, AclEvent, Address, CallContext, FuncSig, NodeStatus};
pub use settings::AdminSettings;
