//! Shared vocabulary for the permchain access-control engine: ledger
//! identities, resources, call context, notifications and errors.

pub mod address;
pub mod context;
pub mod error;
pub mod event;
pub mod node;
pub mod resource;

pub use address::{Address, FuncSig};
pub use context::CallContext;
pub use error::{AclError, ErrorKind};
pub use event::{AclEvent, EventLog, EventSink};
pub use node::NodeStatus;
pub use resource::{Resource, ResourceList, ResourceLookup};
