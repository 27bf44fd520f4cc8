use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use permchain_types::Address;

/// Factory that hands out fresh permission addresses.
///
/// Address = keccak256(creator || nonce_be)[12..]. The nonce only moves
/// forward, so the same address is never produced twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCreator {
    address: Address,
    nonce: u64,
}

impl PermissionCreator {
    pub fn new(address: Address) -> Self {
        PermissionCreator { address, nonce: 0 }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Allocate the next address not rejected by `taken`.
    pub fn allocate(&mut self, taken: impl Fn(&Address) -> bool) -> Address {
        loop {
            let candidate = self.derive(self.nonce);
            self.nonce += 1;
            if !taken(&candidate) {
                return candidate;
            }
            log::debug!("Permission address {} already in use, skipping", candidate);
        }
    }

    fn derive(&self, nonce: u64) -> Address {
        let mut hasher = Keccak256::new();
        hasher.update(self.address.as_bytes());
        hasher.update(nonce.to_be_bytes());
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Address::from_digest(&digest)
    }
}
