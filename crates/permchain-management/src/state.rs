use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use permchain_authorization::Authorization;
use permchain_node_manager::NodeManager;
use permchain_permission::PermissionRegistry;

/// Complete replicated state of the access-control engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclState {
    pub permissions: PermissionRegistry,
    pub authorization: Authorization,
    pub nodes: NodeManager,
}

impl AclState {
    /// sha256 over the bincode encoding. Identical on every replica that
    /// applied the same calls, since all containers iterate in key order.
    pub fn state_root(&self) -> Result<[u8; 32], bincode::Error> {
        let encoded = bincode::serialize(self)?;
        let mut root = [0u8; 32];
        root.copy_from_slice(&Sha256::digest(&encoded));
        Ok(root)
    }

    pub fn state_root_hex(&self) -> Result<String, bincode::Error> {
        Ok(format!("0x{}", hex::encode(self.state_root()?)))
    }
}
