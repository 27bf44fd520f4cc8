use serde::{Deserialize, Serialize};

/// Tracks whether membership already changed in the current block.
///
/// Only the latest height matters, so a single (height, used) pair replaces
/// a per-height map. A new height reads as unused without any reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockGuard {
    height: Option<u64>,
    used: bool,
}

impl BlockGuard {
    pub fn is_used(&self, height: u64) -> bool {
        self.height == Some(height) && self.used
    }

    pub fn mark(&mut self, height: u64) {
        self.height = Some(height);
        self.used = true;
    }

    pub fn reset(&mut self, height: u64) {
        self.height = Some(height);
        self.used = false;
    }
}
