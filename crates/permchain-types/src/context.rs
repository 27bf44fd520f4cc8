use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Environment-supplied facts about the call being executed.
///
/// The caller is already authenticated by the transaction layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Verified sender of the call
    pub caller: Address,

    /// Height of the block the call executes in
    pub height: u64,
}

impl CallContext {
    pub fn new(caller: Address, height: u64) -> Self {
        CallContext { caller, height }
    }

    /// Same block, different caller. Used when a façade forwards a call.
    pub fn forwarded_by(&self, caller: Address) -> Self {
        CallContext {
            caller,
            height: self.height,
        }
    }
}
