// PERMISSION REGISTRY
// Owns every permission entry by address, including closed ones
//
// SAFETY INVARIANTS:
// 1. Only the configured permission manager may mutate entries
// 2. Closing is irreversible: the slot becomes a tombstone, never reused
// 3. Calls against a tombstone fail with PermissionClosed, not NotFound
// 4. A rejected call changes nothing and emits nothing

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use permchain_types::{
    AclError, AclEvent, Address, CallContext, EventSink, FuncSig, Resource, ResourceList,
    ResourceLookup,
};

use crate::creator::PermissionCreator;
use crate::permission::{validate_name, Permission, PermissionInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionSlot {
    Live(Permission),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRegistry {
    /// Only caller allowed to mutate (the management façade)
    manager: Address,

    creator: PermissionCreator,

    entries: BTreeMap<Address, PermissionSlot>,
}

impl PermissionRegistry {
    pub fn new(manager: Address, creator: PermissionCreator) -> Self {
        PermissionRegistry {
            manager,
            creator,
            entries: BTreeMap::new(),
        }
    }

    /// Install a permission at a fixed genesis address. No event is emitted.
    pub fn install_genesis(
        &mut self,
        address: Address,
        name: String,
        resources: ResourceList,
    ) -> Result<(), AclError> {
        if self.entries.contains_key(&address) {
            return Err(AclError::PermissionExists(address));
        }
        let permission = Permission::new(address, name, resources)?;
        info!("Genesis permission {} ({}) installed", address, permission.name());
        self.entries.insert(address, PermissionSlot::Live(permission));
        Ok(())
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    pub fn creator(&self) -> &PermissionCreator {
        &self.creator
    }

    fn ensure_manager(&self, ctx: &CallContext) -> Result<(), AclError> {
        if ctx.caller != self.manager {
            warn!("Permission call from {} rejected: not the manager", ctx.caller);
            return Err(AclError::NotPermissionManager {
                caller: ctx.caller,
                expected: self.manager,
            });
        }
        Ok(())
    }

    /// Resolve a live entry, distinguishing closed from unknown.
    pub fn get(&self, address: &Address) -> Result<&Permission, AclError> {
        match self.entries.get(address) {
            Some(PermissionSlot::Live(permission)) => Ok(permission),
            Some(PermissionSlot::Closed) => Err(AclError::PermissionClosed(*address)),
            None => Err(AclError::PermissionNotFound(*address)),
        }
    }

    fn get_mut(&mut self, address: &Address) -> Result<&mut Permission, AclError> {
        match self.entries.get_mut(address) {
            Some(PermissionSlot::Live(permission)) => Ok(permission),
            Some(PermissionSlot::Closed) => Err(AclError::PermissionClosed(*address)),
            None => Err(AclError::PermissionNotFound(*address)),
        }
    }

    /// Create a new permission at a freshly allocated address.
    pub fn create(
        &mut self,
        ctx: &CallContext,
        name: String,
        resources: ResourceList,
        sink: &mut dyn EventSink,
    ) -> Result<Address, AclError> {
        self.ensure_manager(ctx)?;
        validate_name(&name)?;

        let entries = &self.entries;
        let address = self.creator.allocate(|candidate| entries.contains_key(candidate));
        let permission = Permission::new(address, name, resources)?;

        sink.emit(AclEvent::ResourcesAdded {
            permission: address,
            resources: permission.resources().to_vec(),
        });
        info!("Permission {} ({}) created", address, permission.name());
        self.entries.insert(address, PermissionSlot::Live(permission));
        Ok(address)
    }

    pub fn add_resources(
        &mut self,
        ctx: &CallContext,
        permission: Address,
        resources: &ResourceList,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_manager(ctx)?;
        let entry = self.get_mut(&permission)?;
        entry.add_resources(resources);

        sink.emit(AclEvent::ResourcesAdded {
            permission,
            resources: resources.as_slice().to_vec(),
        });
        info!("Added {} resources to permission {}", resources.len(), permission);
        Ok(true)
    }

    /// Remove the first match of each resource; misses are silently skipped.
    ///
    /// The event always carries the full request, whatever was found.
    pub fn delete_resources(
        &mut self,
        ctx: &CallContext,
        permission: Address,
        resources: &ResourceList,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_manager(ctx)?;
        let entry = self.get_mut(&permission)?;
        let removed = entry.delete_resources(resources);

        sink.emit(AclEvent::ResourcesDeleted {
            permission,
            resources: resources.as_slice().to_vec(),
        });
        info!(
            "Deleted {}/{} requested resources from permission {}",
            removed,
            resources.len(),
            permission
        );
        Ok(true)
    }

    pub fn update_name(
        &mut self,
        ctx: &CallContext,
        permission: Address,
        new_name: String,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_manager(ctx)?;
        let entry = self.get_mut(&permission)?;
        let old_name = entry.update_name(new_name.clone())?;

        info!("Permission {} renamed {} -> {}", permission, old_name, new_name);
        sink.emit(AclEvent::NameUpdated {
            permission,
            old_name,
            new_name,
        });
        Ok(true)
    }

    /// Irreversibly close a permission, leaving a tombstone.
    pub fn close(
        &mut self,
        ctx: &CallContext,
        permission: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_manager(ctx)?;
        self.get(&permission)?;
        self.entries.insert(permission, PermissionSlot::Closed);

        sink.emit(AclEvent::PermissionClosed { permission });
        info!("Permission {} closed", permission);
        Ok(true)
    }

    pub fn in_permission(
        &self,
        permission: &Address,
        cont: Address,
        func: FuncSig,
    ) -> Result<bool, AclError> {
        Ok(self.get(permission)?.in_permission(cont, func))
    }

    pub fn query_info(&self, permission: &Address) -> Result<PermissionInfo, AclError> {
        Ok(self.get(permission)?.query_info())
    }

    pub fn query_name(&self, permission: &Address) -> Result<String, AclError> {
        Ok(self.get(permission)?.name().to_string())
    }

    pub fn query_resources(&self, permission: &Address) -> Result<Vec<Resource>, AclError> {
        Ok(self.get(permission)?.resources().to_vec())
    }

    /// True for live entries only.
    pub fn exists(&self, permission: &Address) -> bool {
        matches!(self.entries.get(permission), Some(PermissionSlot::Live(_)))
    }

    pub fn is_closed(&self, permission: &Address) -> bool {
        matches!(self.entries.get(permission), Some(PermissionSlot::Closed))
    }

    /// Live permissions in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.entries.values().filter_map(|slot| match slot {
            PermissionSlot::Live(permission) => Some(permission),
            PermissionSlot::Closed => None,
        })
    }

    pub fn live_count(&self) -> usize {
        self.iter().count()
    }
}

impl ResourceLookup for PermissionRegistry {
    fn in_permission(&self, permission: &Address, resource: &Resource) -> bool {
        match self.entries.get(permission) {
            Some(PermissionSlot::Live(entry)) => entry.contains(resource),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permchain_types::EventLog;

    const MANAGER: Address = Address::from_low_u64(0x013241b2);
    const CREATOR: Address = Address::from_low_u64(0x013241b3);

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn res(c: u64, f: u8) -> Resource {
        Resource::new(Address::from_low_u64(c), FuncSig::new([f; 4]))
    }

    fn manager_ctx() -> CallContext {
        CallContext::new(MANAGER, 1)
    }

    fn setup() -> (PermissionRegistry, Address, EventLog) {
        init_logger();
        let mut registry = PermissionRegistry::new(MANAGER, PermissionCreator::new(CREATOR));
        let mut log = EventLog::new();
        let addr = registry
            .create(
                &manager_ctx(),
                "readLog".to_string(),
                ResourceList::single(res(1, 1)),
                &mut log,
            )
            .unwrap();
        (registry, addr, log)
    }

    #[test]
    fn test_create_emits_resources_added() {
        let (registry, addr, log) = setup();
        assert_eq!(
            log.events(),
            &[AclEvent::ResourcesAdded {
                permission: addr,
                resources: vec![res(1, 1)],
            }]
        );
        assert_eq!(registry.query_name(&addr).unwrap(), "readLog");
    }

    #[test]
    fn test_add_resources_scenario() {
        let (mut registry, addr, mut log) = setup();
        let ok = registry
            .add_resources(&manager_ctx(), addr, &ResourceList::single(res(2, 2)), &mut log)
            .unwrap();
        assert!(ok);
        assert!(registry
            .in_permission(&addr, Address::from_low_u64(2), FuncSig::new([2; 4]))
            .unwrap());
        assert_eq!(registry.query_resources(&addr).unwrap(), vec![res(1, 1), res(2, 2)]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_non_manager_rejected_without_event() {
        let (mut registry, addr, mut log) = setup();
        let outsider = CallContext::new(Address::from_low_u64(0xbad), 1);
        let err = registry
            .add_resources(&outsider, addr, &ResourceList::single(res(2, 2)), &mut log)
            .unwrap_err();
        assert!(matches!(err, AclError::NotPermissionManager { .. }));
        assert_eq!(log.len(), 1);
        assert_eq!(registry.query_resources(&addr).unwrap(), vec![res(1, 1)]);
    }

    #[test]
    fn test_delete_event_carries_full_request() {
        let (mut registry, addr, mut log) = setup();
        let request = ResourceList::new(vec![res(1, 1), res(9, 9)]).unwrap();
        registry
            .delete_resources(&manager_ctx(), addr, &request, &mut log)
            .unwrap();
        assert!(registry.query_resources(&addr).unwrap().is_empty());
        assert_eq!(
            log.last(),
            Some(&AclEvent::ResourcesDeleted {
                permission: addr,
                resources: vec![res(1, 1), res(9, 9)],
            })
        );
    }

    #[test]
    fn test_noop_rename_rejected_without_event() {
        let (mut registry, addr, mut log) = setup();
        let err = registry
            .update_name(&manager_ctx(), addr, "readLog".to_string(), &mut log)
            .unwrap_err();
        assert_eq!(err, AclError::NameUnchanged("readLog".to_string()));
        assert_eq!(log.len(), 1);

        registry
            .update_name(&manager_ctx(), addr, "auditLog".to_string(), &mut log)
            .unwrap();
        assert_eq!(
            log.last(),
            Some(&AclEvent::NameUpdated {
                permission: addr,
                old_name: "readLog".to_string(),
                new_name: "auditLog".to_string(),
            })
        );
    }

    #[test]
    fn test_closed_permission_is_tombstoned() {
        let (mut registry, addr, mut log) = setup();
        registry.close(&manager_ctx(), addr, &mut log).unwrap();

        assert!(registry.is_closed(&addr));
        assert!(!registry.exists(&addr));
        assert_eq!(registry.query_info(&addr), Err(AclError::PermissionClosed(addr)));
        assert_eq!(
            registry.close(&manager_ctx(), addr, &mut log),
            Err(AclError::PermissionClosed(addr))
        );
        assert!(!ResourceLookup::in_permission(&registry, &addr, &res(1, 1)));
    }

    #[test]
    fn test_closed_address_never_reallocated() {
        let (mut registry, first, mut log) = setup();
        registry.close(&manager_ctx(), first, &mut log).unwrap();
        let second = registry
            .create(
                &manager_ctx(),
                "other".to_string(),
                ResourceList::single(res(3, 3)),
                &mut log,
            )
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_unknown_permission() {
        let (registry, _, _) = setup();
        let missing = Address::from_low_u64(0xdead);
        assert_eq!(
            registry.query_info(&missing),
            Err(AclError::PermissionNotFound(missing))
        );
    }

    #[test]
    fn test_genesis_install() {
        init_logger();
        let mut registry = PermissionRegistry::new(MANAGER, PermissionCreator::new(CREATOR));
        let fixed = Address::from_low_u64(0x013241b5);
        registry
            .install_genesis(fixed, "newPermission".to_string(), ResourceList::single(res(1, 1)))
            .unwrap();
        assert!(registry.exists(&fixed));
        assert_eq!(
            registry.install_genesis(fixed, "dup".to_string(), ResourceList::single(res(1, 1))),
            Err(AclError::PermissionExists(fixed))
        );
    }
}
