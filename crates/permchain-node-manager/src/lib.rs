// Consensus node membership for the permchain access-control engine
pub mod guard;
pub mod node_manager;

pub use guard::BlockGuard;
pub use node_manager::NodeManager;
pub use permchain_types::NodeStatus;
