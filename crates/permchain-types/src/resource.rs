// RESOURCES
// A resource is one (contract, function) pair a permission allows
//
// SAFETY INVARIANTS:
// 1. Resource equality is structural: both fields must match
// 2. A ResourceList is never empty and keeps insertion order
// 3. Parallel contract/function arrays are only accepted with equal, non-zero length

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::{Address, FuncSig};
use crate::error::AclError;

/// One callable operation on one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Target contract
    pub cont: Address,

    /// Function selector on that contract
    pub func: FuncSig,
}

impl Resource {
    pub fn new(cont: Address, func: FuncSig) -> Self {
        Resource { cont, func }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cont, self.func)
    }
}

/// Non-empty, ordered sequence of resources used as call input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Resource>", into = "Vec<Resource>")]
pub struct ResourceList(Vec<Resource>);

impl ResourceList {
    pub fn new(resources: Vec<Resource>) -> Result<Self, AclError> {
        if resources.is_empty() {
            return Err(AclError::EmptyResources);
        }
        Ok(ResourceList(resources))
    }

    pub fn single(resource: Resource) -> Self {
        ResourceList(vec![resource])
    }

    /// Build from the parallel-array form used by transaction payloads.
    pub fn from_parallel(conts: &[Address], funcs: &[FuncSig]) -> Result<Self, AclError> {
        if conts.len() != funcs.len() {
            return Err(AclError::LengthMismatch {
                conts: conts.len(),
                funcs: funcs.len(),
            });
        }
        let resources = conts
            .iter()
            .zip(funcs)
            .map(|(cont, func)| Resource::new(*cont, *func))
            .collect();
        Self::new(resources)
    }

    /// Split back into parallel arrays.
    pub fn to_parallel(&self) -> (Vec<Address>, Vec<FuncSig>) {
        self.0.iter().map(|r| (r.cont, r.func)).unzip()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Resource] {
        &self.0
    }
}

impl TryFrom<Vec<Resource>> for ResourceList {
    type Error = AclError;

    fn try_from(resources: Vec<Resource>) -> Result<Self, Self::Error> {
        ResourceList::new(resources)
    }
}

impl From<ResourceList> for Vec<Resource> {
    fn from(list: ResourceList) -> Self {
        list.0
    }
}

impl<'a> IntoIterator for &'a ResourceList {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Read-only view over permission contents, used by the aggregate check.
pub trait ResourceLookup {
    /// True when `permission` is live and contains `resource`.
    fn in_permission(&self, permission: &Address, resource: &Resource) -> bool;
}
