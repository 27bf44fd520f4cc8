// AUTHORIZATION INDEX
// Many-to-many binding of accounts to permissions
//
// SAFETY INVARIANTS:
// 1. account -> permissions and permission -> accounts are exact inverses,
//    occurrence for occurrence (duplicates included)
// 2. Every removal touches both sides together
// 3. Only the configured permission manager may mutate the index
// 4. Missing bindings are a silent no-op, never an error

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use permchain_types::{
    AclError, AclEvent, Address, CallContext, EventSink, FuncSig, Resource, ResourceLookup,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Only caller allowed to mutate (the management façade)
    manager: Address,

    super_admin: Address,

    /// account -> bound permissions, in binding order
    permissions_of: BTreeMap<Address, Vec<Address>>,

    /// permission -> bound accounts, in binding order
    accounts_of: BTreeMap<Address, Vec<Address>>,

    /// Every account ever bound, in first-binding order
    all_accounts: Vec<Address>,
}

impl Authorization {
    /// Seed the super admin with the bootstrap permissions needed to run
    /// the management façade. No events are emitted for genesis bindings.
    pub fn new(manager: Address, super_admin: Address, bootstrap: &[Address]) -> Self {
        let mut auth = Authorization {
            manager,
            super_admin,
            permissions_of: BTreeMap::new(),
            accounts_of: BTreeMap::new(),
            all_accounts: Vec::new(),
        };
        for permission in bootstrap {
            auth.bind(super_admin, *permission);
        }
        info!(
            "Authorization initialized: super admin {} holds {} bootstrap permissions",
            super_admin,
            bootstrap.len()
        );
        auth
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    pub fn super_admin(&self) -> Address {
        self.super_admin
    }

    fn ensure_manager(&self, ctx: &CallContext) -> Result<(), AclError> {
        if ctx.caller != self.manager {
            warn!("Authorization call from {} rejected: not the manager", ctx.caller);
            return Err(AclError::NotPermissionManager {
                caller: ctx.caller,
                expected: self.manager,
            });
        }
        Ok(())
    }

    fn bind(&mut self, account: Address, permission: Address) {
        self.permissions_of.entry(account).or_default().push(permission);
        self.accounts_of.entry(permission).or_default().push(account);
        if !self.all_accounts.contains(&account) {
            self.all_accounts.push(account);
        }
    }

    /// Bind `account` to `permission`. Repeated bindings are kept.
    pub fn set_auth(
        &mut self,
        ctx: &CallContext,
        account: Address,
        permission: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_manager(ctx)?;
        self.bind(account, permission);

        sink.emit(AclEvent::AuthSet { account, permission });
        info!("Account {} granted permission {}", account, permission);
        Ok(true)
    }

    /// Remove one occurrence of the binding from each side.
    ///
    /// Always succeeds; an absent binding leaves the index untouched.
    pub fn cancel_auth(
        &mut self,
        ctx: &CallContext,
        account: Address,
        permission: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_manager(ctx)?;
        let from_permission = remove_first(&mut self.accounts_of, &permission, &account);
        let from_account = remove_first(&mut self.permissions_of, &account, &permission);
        if !from_permission && !from_account {
            debug!("No binding {} -> {} to cancel", account, permission);
        }

        sink.emit(AclEvent::AuthCanceled { account, permission });
        info!("Account {} lost permission {}", account, permission);
        Ok(true)
    }

    /// Drop every permission bound to `account`.
    pub fn clear_auth(
        &mut self,
        ctx: &CallContext,
        account: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_manager(ctx)?;
        // Taking the list out gives a stable snapshot to iterate
        let bound = self.permissions_of.remove(&account).unwrap_or_default();
        for permission in &bound {
            remove_first(&mut self.accounts_of, permission, &account);
        }

        sink.emit(AclEvent::AuthCleared { account });
        info!("Cleared {} bindings of account {}", bound.len(), account);
        Ok(true)
    }

    /// Drop every account bound to `permission`. Used before a permission is closed.
    pub fn clear_auth_of_permission(
        &mut self,
        ctx: &CallContext,
        permission: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        self.ensure_manager(ctx)?;
        let bound = self.accounts_of.remove(&permission).unwrap_or_default();
        for account in &bound {
            remove_first(&mut self.permissions_of, account, &permission);
        }

        sink.emit(AclEvent::PermissionAuthCleared { permission });
        info!("Cleared {} bindings of permission {}", bound.len(), permission);
        Ok(true)
    }

    pub fn query_permissions(&self, account: &Address) -> Vec<Address> {
        self.permissions_of.get(account).cloned().unwrap_or_default()
    }

    pub fn query_accounts(&self, permission: &Address) -> Vec<Address> {
        self.accounts_of.get(permission).cloned().unwrap_or_default()
    }

    pub fn query_all_accounts(&self) -> &[Address] {
        &self.all_accounts
    }

    /// True iff some permission bound to `account` allows (cont, func).
    pub fn check_permission(
        &self,
        account: &Address,
        cont: Address,
        func: FuncSig,
        lookup: &dyn ResourceLookup,
    ) -> bool {
        let resource = Resource::new(cont, func);
        self.permissions_of
            .get(account)
            .map(|bound| bound.iter().any(|p| lookup.in_permission(p, &resource)))
            .unwrap_or(false)
    }

    /// Verify both sides agree occurrence for occurrence.
    pub fn is_consistent(&self) -> bool {
        let forward = self.permissions_of.iter().all(|(account, permissions)| {
            permissions.iter().all(|permission| {
                count(&self.permissions_of, account, permission)
                    == count(&self.accounts_of, permission, account)
            })
        });
        let backward = self.accounts_of.iter().all(|(permission, accounts)| {
            accounts.iter().all(|account| {
                count(&self.accounts_of, permission, account)
                    == count(&self.permissions_of, account, permission)
            })
        });
        forward && backward
    }
}

/// Remove the first `item` under `key`, pruning the key once its list is empty.
fn remove_first(
    index: &mut BTreeMap<Address, Vec<Address>>,
    key: &Address,
    item: &Address,
) -> bool {
    let Some(list) = index.get_mut(key) else {
        return false;
    };
    let Some(position) = list.iter().position(|entry| entry == item) else {
        return false;
    };
    list.remove(position);
    if list.is_empty() {
        index.remove(key);
    }
    true
}

fn count(index: &BTreeMap<Address, Vec<Address>>, key: &Address, item: &Address) -> usize {
    index
        .get(key)
        .map(|list| list.iter().filter(|entry| *entry == item).count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use permchain_permission::{PermissionCreator, PermissionRegistry};
    use permchain_types::{EventLog, ResourceList};
    use proptest::prelude::*;

    const MANAGER: Address = Address::from_low_u64(0x013241b2);
    const ADMIN: Address = Address::from_low_u64(0xa11ce);

    fn ctx() -> CallContext {
        CallContext::new(MANAGER, 1)
    }

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn empty() -> Authorization {
        let _ = env_logger::builder().is_test(true).try_init();
        Authorization::new(MANAGER, ADMIN, &[])
    }

    #[test]
    fn test_bootstrap_binds_super_admin() {
        let auth = Authorization::new(MANAGER, ADMIN, &[addr(0xb5), addr(0xb6)]);
        assert_eq!(auth.query_permissions(&ADMIN), vec![addr(0xb5), addr(0xb6)]);
        assert_eq!(auth.query_accounts(&addr(0xb6)), vec![ADMIN]);
        assert_eq!(auth.query_all_accounts(), &[ADMIN]);
        assert!(auth.is_consistent());
    }

    #[test]
    fn test_duplicate_set_then_single_cancel() {
        let mut auth = empty();
        let mut log = EventLog::new();
        let (a, p) = (addr(1), addr(100));

        auth.set_auth(&ctx(), a, p, &mut log).unwrap();
        auth.set_auth(&ctx(), a, p, &mut log).unwrap();
        assert_eq!(auth.query_permissions(&a), vec![p, p]);

        auth.cancel_auth(&ctx(), a, p, &mut log).unwrap();
        assert_eq!(auth.query_permissions(&a), vec![p]);
        assert_eq!(auth.query_accounts(&p), vec![a]);
        assert_eq!(log.len(), 3);
        assert!(auth.is_consistent());
    }

    #[test]
    fn test_cancel_missing_binding_is_noop() {
        let mut auth = empty();
        let mut log = EventLog::new();
        auth.set_auth(&ctx(), addr(1), addr(100), &mut log).unwrap();

        let ok = auth.cancel_auth(&ctx(), addr(2), addr(100), &mut log).unwrap();
        assert!(ok);
        assert_eq!(auth.query_accounts(&addr(100)), vec![addr(1)]);
        assert_eq!(
            log.last(),
            Some(&AclEvent::AuthCanceled { account: addr(2), permission: addr(100) })
        );
    }

    #[test]
    fn test_clear_auth() {
        let mut auth = empty();
        let mut log = EventLog::new();
        let a = addr(1);
        auth.set_auth(&ctx(), a, addr(100), &mut log).unwrap();
        auth.set_auth(&ctx(), a, addr(200), &mut log).unwrap();
        auth.set_auth(&ctx(), addr(2), addr(100), &mut log).unwrap();

        auth.clear_auth(&ctx(), a, &mut log).unwrap();
        assert!(auth.query_permissions(&a).is_empty());
        assert_eq!(auth.query_accounts(&addr(100)), vec![addr(2)]);
        assert!(auth.query_accounts(&addr(200)).is_empty());
        assert_eq!(log.last(), Some(&AclEvent::AuthCleared { account: a }));
        assert!(auth.is_consistent());
    }

    #[test]
    fn test_clear_auth_of_permission() {
        let mut auth = empty();
        let mut log = EventLog::new();
        let p = addr(100);
        auth.set_auth(&ctx(), addr(1), p, &mut log).unwrap();
        auth.set_auth(&ctx(), addr(2), p, &mut log).unwrap();
        auth.set_auth(&ctx(), addr(2), addr(200), &mut log).unwrap();

        auth.clear_auth_of_permission(&ctx(), p, &mut log).unwrap();
        assert!(auth.query_accounts(&p).is_empty());
        assert!(auth.query_permissions(&addr(1)).is_empty());
        assert_eq!(auth.query_permissions(&addr(2)), vec![addr(200)]);
        // history of bound accounts survives
        assert_eq!(auth.query_all_accounts(), &[addr(1), addr(2)]);
        assert!(auth.is_consistent());
    }

    #[test]
    fn test_non_manager_rejected() {
        let mut auth = empty();
        let mut log = EventLog::new();
        let outsider = CallContext::new(addr(0xbad), 1);
        let err = auth.set_auth(&outsider, addr(1), addr(100), &mut log).unwrap_err();
        assert!(matches!(err, AclError::NotPermissionManager { .. }));
        assert!(log.is_empty());
        assert!(auth.query_permissions(&addr(1)).is_empty());
    }

    #[test]
    fn test_check_permission_against_registry() {
        let mut registry = PermissionRegistry::new(MANAGER, PermissionCreator::new(addr(0xb3)));
        let mut log = EventLog::new();
        let read = Resource::new(addr(0xc1), FuncSig::new([1; 4]));
        let write = Resource::new(addr(0xc2), FuncSig::new([2; 4]));
        let p1 = registry
            .create(&ctx(), "read".into(), ResourceList::single(read), &mut log)
            .unwrap();
        let p2 = registry
            .create(&ctx(), "write".into(), ResourceList::single(write), &mut log)
            .unwrap();

        let mut auth = empty();
        let a = addr(1);
        assert!(!auth.check_permission(&a, read.cont, read.func, &registry));

        auth.set_auth(&ctx(), a, p1, &mut log).unwrap();
        assert!(auth.check_permission(&a, read.cont, read.func, &registry));
        assert!(!auth.check_permission(&a, write.cont, write.func, &registry));

        auth.set_auth(&ctx(), a, p2, &mut log).unwrap();
        assert!(auth.check_permission(&a, write.cont, write.func, &registry));

        registry.close(&ctx(), p2, &mut log).unwrap();
        assert!(!auth.check_permission(&a, write.cont, write.func, &registry));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(u64, u64),
        Cancel(u64, u64),
        Clear(u64),
        ClearPermission(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..4, 0u64..4).prop_map(|(a, p)| Op::Set(a, p)),
            (0u64..4, 0u64..4).prop_map(|(a, p)| Op::Cancel(a, p)),
            (0u64..4).prop_map(Op::Clear),
            (0u64..4).prop_map(Op::ClearPermission),
        ]
    }

    proptest! {
        #[test]
        fn prop_index_stays_bidirectional(ops in proptest::collection::vec(op(), 0..64)) {
            let mut auth = empty();
            let mut log = EventLog::new();
            for op in ops {
                match op {
                    Op::Set(a, p) => auth.set_auth(&ctx(), addr(a), addr(100 + p), &mut log),
                    Op::Cancel(a, p) => auth.cancel_auth(&ctx(), addr(a), addr(100 + p), &mut log),
                    Op::Clear(a) => auth.clear_auth(&ctx(), addr(a), &mut log),
                    Op::ClearPermission(p) => {
                        auth.clear_auth_of_permission(&ctx(), addr(100 + p), &mut log)
                    }
                }
                .unwrap();
                prop_assert!(auth.is_consistent());
            }
            for a in 0..4 {
                for p in 0..4 {
                    let (a, p) = (addr(a), addr(100 + p));
                    prop_assert_eq!(
                        auth.query_permissions(&a).contains(&p),
                        auth.query_accounts(&p).contains(&a)
                    );
                }
            }
        }

        #[test]
        fn prop_check_matches_bound_permissions(
            contents in proptest::collection::vec(proptest::collection::vec(0u8..4, 1..4), 3),
            ops in proptest::collection::vec(op(), 0..48),
        ) {
            let resource = |i: u8| Resource::new(addr(0xc0 + u64::from(i)), FuncSig::new([i; 4]));
            let mut registry = PermissionRegistry::new(MANAGER, PermissionCreator::new(addr(0xb3)));
            let mut log = EventLog::new();
            let mut permissions = Vec::new();
            for (n, content) in contents.iter().enumerate() {
                let resources =
                    ResourceList::new(content.iter().map(|i| resource(*i)).collect()).unwrap();
                permissions.push(registry.create(&ctx(), format!("p{}", n), resources, &mut log).unwrap());
            }

            // index 3 names an address with no registry entry
            let permission = |p: u64| permissions.get(p as usize).copied().unwrap_or(addr(0xdead));
            let mut auth = empty();
            for op in ops {
                match op {
                    Op::Set(a, p) => auth.set_auth(&ctx(), addr(a), permission(p), &mut log),
                    Op::Cancel(a, p) => auth.cancel_auth(&ctx(), addr(a), permission(p), &mut log),
                    Op::Clear(a) => auth.clear_auth(&ctx(), addr(a), &mut log),
                    Op::ClearPermission(p) => {
                        auth.clear_auth_of_permission(&ctx(), permission(p), &mut log)
                    }
                }
                .unwrap();
            }

            for a in 0..4 {
                let account = addr(a);
                for i in 0..4 {
                    let r = resource(i);
                    let expected = auth
                        .query_permissions(&account)
                        .iter()
                        .any(|p| registry.get(p).map(|entry| entry.contains(&r)).unwrap_or(false));
                    prop_assert_eq!(
                        auth.check_permission(&account, r.cont, r.func, &registry),
                        expected
                    );
                }
            }
        }
    }
}
