// GENESIS BOOTSTRAP
// Builds the initial access-control state from injected configuration
//
// SAFETY INVARIANTS:
// 1. System addresses come from configuration, never from globals
// 2. The super admin is bound to every bootstrap permission, which is what
//    lets anyone operate the management façade at all
// 3. Genesis permissions are built-in and cannot be deleted later

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use permchain_authorization::Authorization;
use permchain_node_manager::NodeManager;
use permchain_permission::{PermissionCreator, PermissionRegistry};
use permchain_types::{AclError, Address, FuncSig, Resource, ResourceList};

use crate::management::PermissionManagement;
use crate::runtime::AclRuntime;
use crate::selectors::ManagementOp;
use crate::state::AclState;

pub const PERMISSION_MANAGEMENT_ADDRESS: Address = Address::from_low_u64(0x013241b2);
pub const PERMISSION_CREATOR_ADDRESS: Address = Address::from_low_u64(0x013241b3);
pub const NEW_PERMISSION_ADDRESS: Address = Address::from_low_u64(0x013241b5);
pub const DELETE_PERMISSION_ADDRESS: Address = Address::from_low_u64(0x013241b6);
pub const UPDATE_PERMISSION_ADDRESS: Address = Address::from_low_u64(0x013241b7);
pub const SET_AUTH_ADDRESS: Address = Address::from_low_u64(0x013241b8);
pub const CANCEL_AUTH_ADDRESS: Address = Address::from_low_u64(0x013241b9);

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Failed to read genesis file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed genesis JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid genesis state: {0}")]
    Acl(#[from] AclError),

    #[error("Super admin address must not be zero")]
    ZeroSuperAdmin,
}

/// A permission installed at a fixed address, in transaction-payload form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisPermission {
    pub address: Address,
    pub name: String,
    pub conts: Vec<Address>,
    pub funcs: Vec<FuncSig>,

    /// Bind the super admin to this permission at genesis
    #[serde(default = "default_true")]
    pub bootstrap: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeManagerGenesis {
    pub nodes: Vec<Address>,
    pub admins: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub permission_management: Address,
    pub permission_creator: Address,
    pub super_admin: Address,
    #[serde(default)]
    pub node_manager: NodeManagerGenesis,
    #[serde(default)]
    pub permissions: Vec<GenesisPermission>,
}

impl GenesisConfig {
    /// Standard layout: the five built-in permissions covering every
    /// management operation, all granted to `super_admin`.
    pub fn standard(super_admin: Address, nodes: Vec<Address>, admins: Vec<Address>) -> Self {
        let management = PERMISSION_MANAGEMENT_ADDRESS;
        let builtin = |address: Address, name: &str, ops: &[ManagementOp]| GenesisPermission {
            address,
            name: name.to_string(),
            conts: vec![management; ops.len()],
            funcs: ops.iter().map(|op| op.selector()).collect(),
            bootstrap: true,
        };

        GenesisConfig {
            permission_management: management,
            permission_creator: PERMISSION_CREATOR_ADDRESS,
            super_admin,
            node_manager: NodeManagerGenesis { nodes, admins },
            permissions: vec![
                builtin(
                    NEW_PERMISSION_ADDRESS,
                    "newPermission",
                    &[ManagementOp::NewPermission],
                ),
                builtin(
                    DELETE_PERMISSION_ADDRESS,
                    "deletePermission",
                    &[ManagementOp::DeletePermission],
                ),
                builtin(
                    UPDATE_PERMISSION_ADDRESS,
                    "updatePermission",
                    &[
                        ManagementOp::UpdatePermissionName,
                        ManagementOp::AddResources,
                        ManagementOp::DeleteResources,
                    ],
                ),
                builtin(
                    SET_AUTH_ADDRESS,
                    "setAuth",
                    &[ManagementOp::SetAuthorization, ManagementOp::SetAuthorizations],
                ),
                builtin(
                    CANCEL_AUTH_ADDRESS,
                    "cancelAuth",
                    &[
                        ManagementOp::CancelAuthorization,
                        ManagementOp::CancelAuthorizations,
                        ManagementOp::ClearAuthorization,
                    ],
                ),
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, GenesisError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GenesisError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, GenesisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the initial state and the executor around it.
    pub fn build(&self) -> Result<AclRuntime, GenesisError> {
        if self.super_admin.is_zero() {
            return Err(GenesisError::ZeroSuperAdmin);
        }
        if self.node_manager.admins.is_empty() {
            warn!("Genesis has no node manager admins; membership will be frozen");
        }

        let mut permissions = PermissionRegistry::new(
            self.permission_management,
            PermissionCreator::new(self.permission_creator),
        );
        for entry in &self.permissions {
            let resources = ResourceList::from_parallel(&entry.conts, &entry.funcs)?;
            permissions.install_genesis(entry.address, entry.name.clone(), resources)?;
        }

        let bootstrap: Vec<Address> = self
            .permissions
            .iter()
            .filter(|entry| entry.bootstrap)
            .map(|entry| entry.address)
            .collect();
        let authorization =
            Authorization::new(self.permission_management, self.super_admin, &bootstrap);

        let nodes = NodeManager::new(&self.node_manager.nodes, &self.node_manager.admins)?;

        let management = PermissionManagement::new(
            self.permission_management,
            self.permissions.iter().map(|entry| entry.address),
        );
        let runtime = AclRuntime::new(
            management,
            AclState {
                permissions,
                authorization,
                nodes,
            },
        )?;
        info!(
            "Genesis built: {} permissions, {} consensus nodes",
            self.permissions.len(),
            self.node_manager.nodes.len()
        );
        Ok(runtime)
    }
}

/// Resource a standard built-in permission grants for `op`.
pub fn builtin_resource(op: ManagementOp) -> Resource {
    Resource::new(PERMISSION_MANAGEMENT_ADDRESS, op.selector())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[test]
    fn test_standard_genesis_grants_super_admin_everything() {
        let runtime = GenesisConfig::standard(addr(0xa), vec![addr(1)], vec![addr(0xa)])
            .build()
            .unwrap();
        for op in ManagementOp::ALL {
            let resource = builtin_resource(op);
            assert!(
                runtime.check_permission(&addr(0xa), resource.cont, resource.func),
                "super admin lacks {:?}",
                op
            );
            assert!(!runtime.check_permission(&addr(0xb), resource.cont, resource.func));
        }
        assert_eq!(runtime.list_node(), &[addr(1)]);
        assert!(runtime.management().is_builtin(&NEW_PERMISSION_ADDRESS));
    }

    #[test]
    fn test_genesis_json_roundtrip() {
        let config = GenesisConfig::standard(addr(0xa), vec![addr(1), addr(2)], vec![addr(0xa)]);
        let json = config.to_json_pretty().unwrap();
        assert_eq!(GenesisConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_bootstrap_defaults_to_true() {
        let json = r#"{
            "permission_management": "0x00000000000000000000000000000000013241b2",
            "permission_creator": "0x00000000000000000000000000000000013241b3",
            "super_admin": "0x000000000000000000000000000000000000000a",
            "permissions": [{
                "address": "0x00000000000000000000000000000000013241b5",
                "name": "newPermission",
                "conts": ["0x00000000000000000000000000000000013241b2"],
                "funcs": ["0x01020304"]
            }]
        }"#;
        let config = GenesisConfig::from_json(json).unwrap();
        assert!(config.permissions[0].bootstrap);
        assert!(config.node_manager.nodes.is_empty());
    }

    #[test]
    fn test_mismatched_genesis_arrays_rejected() {
        let mut config = GenesisConfig::standard(addr(0xa), vec![], vec![]);
        config.permissions[0].funcs.clear();
        assert!(matches!(
            config.build(),
            Err(GenesisError::Acl(AclError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn test_zero_super_admin_rejected() {
        let config = GenesisConfig::standard(Address::default(), vec![], vec![]);
        assert!(matches!(config.build(), Err(GenesisError::ZeroSuperAdmin)));
    }
}
