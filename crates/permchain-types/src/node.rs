use serde::{Deserialize, Serialize};
use std::fmt;

/// Consensus membership state of a candidate node.
///
/// Lifecycle: Close -> Ready -> Start -> Close. Unknown nodes are `Close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Not a member and no pending request
    #[default]
    Close,

    /// Admission requested, awaiting admin approval
    Ready,

    /// Active consensus member
    Start,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Close => write!(f, "CLOSE"),
            NodeStatus::Ready => write!(f, "READY"),
            NodeStatus::Start => write!(f, "START"),
        }
    }
}
