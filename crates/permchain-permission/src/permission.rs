// PERMISSION ENTRY
// A named, mutable bundle of authorized (contract, function) resources
//
// SAFETY INVARIANTS:
// 1. The address is fixed at creation and never changes
// 2. Resource order is insertion order; duplicates are allowed
// 3. Deletion removes the first structural match only and keeps relative order
// 4. A rename must change the name

use serde::{Deserialize, Serialize};

use permchain_types::{AclError, Address, FuncSig, Resource, ResourceList};

/// Longest name the ledger can store (a `bytes32` slot).
pub const MAX_NAME_LEN: usize = 32;

/// Check a permission name fits the on-chain slot.
pub fn validate_name(name: &str) -> Result<(), AclError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(AclError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Snapshot returned by `query_info`, in parallel-array form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub name: String,
    pub conts: Vec<Address>,
    pub funcs: Vec<FuncSig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    address: Address,
    name: String,
    resources: Vec<Resource>,
}

impl Permission {
    pub fn new(address: Address, name: String, resources: ResourceList) -> Result<Self, AclError> {
        validate_name(&name)?;
        Ok(Permission {
            address,
            name,
            resources: resources.into(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Append every resource verbatim.
    pub fn add_resources(&mut self, resources: &ResourceList) {
        self.resources.extend(resources.iter().copied());
    }

    /// Remove the first match of each requested resource.
    ///
    /// Misses are skipped. Returns how many entries were actually removed.
    pub fn delete_resources(&mut self, resources: &ResourceList) -> usize {
        let mut removed = 0;
        for target in resources {
            if self.delete_one(target) {
                removed += 1;
            }
        }
        removed
    }

    fn delete_one(&mut self, target: &Resource) -> bool {
        match self.resources.iter().position(|r| r == target) {
            Some(index) => {
                // Vec::remove shifts the tail left by one
                self.resources.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the name, returning the previous one.
    pub fn update_name(&mut self, new_name: String) -> Result<String, AclError> {
        if new_name == self.name {
            return Err(AclError::NameUnchanged(new_name));
        }
        validate_name(&new_name)?;
        Ok(std::mem::replace(&mut self.name, new_name))
    }

    pub fn in_permission(&self, cont: Address, func: FuncSig) -> bool {
        self.contains(&Resource::new(cont, func))
    }

    pub fn contains(&self, resource: &Resource) -> bool {
        self.resources.iter().any(|r| r == resource)
    }

    pub fn query_info(&self) -> PermissionInfo {
        let (conts, funcs) = self.resources.iter().map(|r| (r.cont, r.func)).unzip();
        PermissionInfo {
            name: self.name.clone(),
            conts,
            funcs,
        }
    }
}
