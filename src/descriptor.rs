//! Resource descriptors and payload handles

use crate::registry::CodecTypeId;
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

/// Shared handle to a decoded asset
///
/// Clients hold `Arc` clones of the cell; reload swaps the boxed contents
/// behind the lock, so every outstanding handle observes the refreshed asset
/// without the handle itself changing.
pub type Payload = Arc<RwLock<Box<dyn Any + Send + Sync>>>;

/// Reverse-index key for a payload: the address of its cell.
///
/// Injective across live descriptors, and an `Arc` clone held anywhere keeps
/// the cell alive, so a live key is never reused.
pub fn payload_key(payload: &Payload) -> usize {
    Arc::as_ptr(payload) as usize
}

/// Per-resource record owned by the factory's primary table
#[derive(Clone)]
pub struct ResourceDescriptor {
    pub(crate) name_hash: u64,
    pub(crate) payload: Payload,
    pub(crate) type_id: CodecTypeId,
    pub(crate) ref_count: u32,
    pub(crate) mtime: u64,
}

impl std::fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("name_hash", &self.name_hash)
            .field("type_id", &self.type_id)
            .field("ref_count", &self.ref_count)
            .field("mtime", &self.mtime)
            .finish()
    }
}

impl ResourceDescriptor {
    /// 64-bit canonical-path hash identifying the resource
    pub fn name_hash(&self) -> u64 {
        self.name_hash
    }

    /// Handle to the decoded asset
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Token of the codec that built the payload
    pub fn type_id(&self) -> CodecTypeId {
        self.type_id
    }

    /// Live references at the time this descriptor was observed
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Last-observed file modification time, whole seconds since the epoch
    pub fn mtime(&self) -> u64 {
        self.mtime
    }
}
