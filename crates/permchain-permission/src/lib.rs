// Permission registry for the permchain access-control engine
pub mod creator;
pub mod permission;
pub mod registry;

pub use creator::PermissionCreator;
pub use permission::{validate_name, Permission, PermissionInfo, MAX_NAME_LEN};
pub use registry::{PermissionRegistry, PermissionSlot};
