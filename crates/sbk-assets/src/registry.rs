use std::collections::HashSet;
use std::sync::Arc;

use sbk_types::AssetId;

use crate::error::{AssetError, AssetResult};
use crate::store::AssetStore;

/// Read-through access to served assets, plus fork-time identifier minting.
pub struct AssetRegistry {
    store: Arc<dyn AssetStore>,
}

impl AssetRegistry {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Fetch an asset's bytes. Missing assets are a typed [`AssetError::NotFound`].
    pub fn fetch(&self, id: &AssetId) -> AssetResult<Vec<u8>> {
        self.store
            .fetch(id)?
            .ok_or_else(|| AssetError::NotFound(id.clone()))
    }

    /// Store an asset's bytes under its identifier.
    pub fn put(&self, id: &AssetId, bytes: &[u8]) -> AssetResult<()> {
        self.store.put(id, bytes)
    }

    pub fn contains(&self, id: &AssetId) -> AssetResult<bool> {
        self.store.contains(id)
    }
}

/// Mint a replacement identifier for `old`, preserving its extension.
///
/// The hash part is the (truncated) BLAKE3 digest of the old identifier, a
/// random salt, and a counter — same shape as a content hash, vanishingly
/// unlikely to collide, and guaranteed distinct from `old` and everything
/// in `taken` (the counter bumps until it clears both).
pub fn mint_renamed(old: &AssetId, taken: &HashSet<AssetId>) -> AssetId {
    let salt: [u8; 8] = rand::random();
    let mut nonce: u64 = 0;
    loop {
        let mut hasher = blake3::Hasher::new();
        hasher.update(old.file_name().as_bytes());
        hasher.update(&salt);
        hasher.update(&nonce.to_le_bytes());
        let digest = hasher.finalize();
        let hash = hex::encode(&digest.as_bytes()[..16]);

        if let Ok(candidate) = AssetId::from_parts(&hash, old.ext()) {
            if candidate != *old && !taken.contains(&candidate) {
                return candidate;
            }
        }
        nonce += 1;
    }
}
