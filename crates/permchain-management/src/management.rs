// PERMISSION MANAGEMENT FAÇADE
// Sole entry point for permission and authorization mutation
//
// SAFETY INVARIANTS:
// 1. The external caller must hold a permission containing
//    (management address, selector of the operation)
// 2. Downstream calls carry the management address as caller
// 3. Every precondition is checked before the first mutation, so a
//    rejected call leaves state untouched
// 4. Built-in (genesis) permissions cannot be deleted

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use permchain_types::{AclError, Address, CallContext, EventSink, ResourceList};

use crate::selectors::ManagementOp;
use crate::state::AclState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionManagement {
    address: Address,
    builtin: BTreeSet<Address>,
}

impl PermissionManagement {
    pub fn new(address: Address, builtin: impl IntoIterator<Item = Address>) -> Self {
        PermissionManagement {
            address,
            builtin: builtin.into_iter().collect(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_builtin(&self, permission: &Address) -> bool {
        self.builtin.contains(permission)
    }

    /// Check the external caller and return the context to forward downstream.
    fn authorize(
        &self,
        ctx: &CallContext,
        op: ManagementOp,
        state: &AclState,
    ) -> Result<CallContext, AclError> {
        let func = op.selector();
        let allowed = state.authorization.check_permission(
            &ctx.caller,
            self.address,
            func,
            &state.permissions,
        );
        if !allowed {
            warn!("{:?} by {} denied", op, ctx.caller);
            return Err(AclError::PermissionDenied {
                caller: ctx.caller,
                cont: self.address,
                func,
            });
        }
        Ok(ctx.forwarded_by(self.address))
    }

    pub fn new_permission(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        name: String,
        resources: ResourceList,
        sink: &mut dyn EventSink,
    ) -> Result<Address, AclError> {
        let inner = self.authorize(ctx, ManagementOp::NewPermission, state)?;
        state.permissions.create(&inner, name, resources, sink)
    }

    /// Unbind every account from the permission, then close it.
    pub fn delete_permission(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        permission: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        let inner = self.authorize(ctx, ManagementOp::DeletePermission, state)?;
        if self.is_builtin(&permission) {
            return Err(AclError::BuiltinPermission(permission));
        }
        state.permissions.get(&permission)?;

        state
            .authorization
            .clear_auth_of_permission(&inner, permission, sink)?;
        state.permissions.close(&inner, permission, sink)
    }

    pub fn update_permission_name(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        permission: Address,
        name: String,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        let inner = self.authorize(ctx, ManagementOp::UpdatePermissionName, state)?;
        state.permissions.update_name(&inner, permission, name, sink)
    }

    pub fn add_resources(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        permission: Address,
        resources: &ResourceList,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        let inner = self.authorize(ctx, ManagementOp::AddResources, state)?;
        state
            .permissions
            .add_resources(&inner, permission, resources, sink)
    }

    pub fn delete_resources(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        permission: Address,
        resources: &ResourceList,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        let inner = self.authorize(ctx, ManagementOp::DeleteResources, state)?;
        state
            .permissions
            .delete_resources(&inner, permission, resources, sink)
    }

    pub fn set_authorization(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        account: Address,
        permission: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        let inner = self.authorize(ctx, ManagementOp::SetAuthorization, state)?;
        state.permissions.get(&permission)?;
        state
            .authorization
            .set_auth(&inner, account, permission, sink)
    }

    pub fn set_authorizations(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        account: Address,
        permissions: &[Address],
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        let inner = self.authorize(ctx, ManagementOp::SetAuthorizations, state)?;
        ensure_all_live(state, permissions)?;
        for permission in permissions {
            state
                .authorization
                .set_auth(&inner, account, *permission, sink)?;
        }
        Ok(true)
    }

    pub fn cancel_authorization(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        account: Address,
        permission: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        let inner = self.authorize(ctx, ManagementOp::CancelAuthorization, state)?;
        state.permissions.get(&permission)?;
        state
            .authorization
            .cancel_auth(&inner, account, permission, sink)
    }

    pub fn cancel_authorizations(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        account: Address,
        permissions: &[Address],
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        let inner = self.authorize(ctx, ManagementOp::CancelAuthorizations, state)?;
        ensure_all_live(state, permissions)?;
        for permission in permissions {
            state
                .authorization
                .cancel_auth(&inner, account, *permission, sink)?;
        }
        Ok(true)
    }

    pub fn clear_authorization(
        &self,
        ctx: &CallContext,
        state: &mut AclState,
        account: Address,
        sink: &mut dyn EventSink,
    ) -> Result<bool, AclError> {
        let inner = self.authorize(ctx, ManagementOp::ClearAuthorization, state)?;
        state.authorization.clear_auth(&inner, account, sink)
    }
}

fn ensure_all_live(state: &AclState, permissions: &[Address]) -> Result<(), AclError> {
    for permission in permissions {
        state.permissions.get(permission)?;
    }
    Ok(())
}
