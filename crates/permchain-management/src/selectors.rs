use serde::{Deserialize, Serialize};

use permchain_types::FuncSig;

/// Every entry point of the management façade.
///
/// Callers need a permission containing (management address, selector) to
/// invoke the matching operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagementOp {
    NewPermission,
    DeletePermission,
    UpdatePermissionName,
    AddResources,
    DeleteResources,
    SetAuthorization,
    SetAuthorizations,
    CancelAuthorization,
    CancelAuthorizations,
    ClearAuthorization,
}

impl ManagementOp {
    pub const ALL: [ManagementOp; 10] = [
        ManagementOp::NewPermission,
        ManagementOp::DeletePermission,
        ManagementOp::UpdatePermissionName,
        ManagementOp::AddResources,
        ManagementOp::DeleteResources,
        ManagementOp::SetAuthorization,
        ManagementOp::SetAuthorizations,
        ManagementOp::CancelAuthorization,
        ManagementOp::CancelAuthorizations,
        ManagementOp::ClearAuthorization,
    ];

    /// Canonical ABI signature.
    pub fn signature(&self) -> &'static str {
        match self {
            ManagementOp::NewPermission => "newPermission(bytes32,address[],bytes4[])",
            ManagementOp::DeletePermission => "deletePermission(address)",
            ManagementOp::UpdatePermissionName => "updatePermissionName(address,bytes32)",
            ManagementOp::AddResources => "addResources(address,address[],bytes4[])",
            ManagementOp::DeleteResources => "deleteResources(address,address[],bytes4[])",
            ManagementOp::SetAuthorization => "setAuthorization(address,address)",
            ManagementOp::SetAuthorizations => "setAuthorizations(address,address[])",
            ManagementOp::CancelAuthorization => "cancelAuthorization(address,address)",
            ManagementOp::CancelAuthorizations => "cancelAuthorizations(address,address[])",
            ManagementOp::ClearAuthorization => "clearAuthorization(address)",
        }
    }

    pub fn selector(&self) -> FuncSig {
        FuncSig::from_signature(self.signature())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_selectors_are_distinct() {
        let selectors: HashSet<FuncSig> = ManagementOp::ALL.iter().map(|op| op.selector()).collect();
        assert_eq!(selectors.len(), ManagementOp::ALL.len());
    }

    #[test]
    fn test_selector_matches_signature_hash() {
        assert_eq!(
            ManagementOp::SetAuthorization.selector(),
            FuncSig::from_signature("setAuthorization(address,address)")
        );
    }
}
