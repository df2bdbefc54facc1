// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reference-counted resource factory
//!
//! Loads named binary assets from a filesystem root, dispatches decoding to
//! extension-registered codecs, shares the decoded payloads among callers via
//! reference counting, and reloads changed assets in place.
//!
//! The factory is single-threaded: every operation runs to completion on the
//! caller's thread and codecs must not reenter the factory from a callback.

use crate::buffer::StreamBuffer;
use crate::codec::{LoadContext, ResourceCodec};
use crate::descriptor::{payload_key, Payload, ResourceDescriptor};
use crate::error::{FactoryError, Result};
use crate::path::{canonical_path, name_hash, RESOURCE_PATH_MAX};
use crate::registry::{CodecRegistry, CodecTypeId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Factory behavior flags
///
/// Combine with `union`; test with `contains`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactoryFlags {
    bits: u32,
}

impl FactoryFlags {
    /// No optional behavior.
    pub const EMPTY: Self = Self { bits: 0 };
    /// Keep the name index and allow `reload_type`.
    pub const RELOAD_SUPPORT: Self = Self { bits: 1 << 0 };

    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    pub const fn bits(&self) -> u32 {
        self.bits
    }

    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl Default for FactoryFlags {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Factory construction parameters
#[derive(Debug, Clone)]
pub struct FactoryParams {
    /// Capacity of the resource tables
    pub max_resources: usize,
    pub flags: FactoryFlags,
    /// Size of the shared file-read buffer in bytes
    pub stream_buffer_size: usize,
}

impl Default for FactoryParams {
    fn default() -> Self {
        Self {
            max_resources: 1024,
            flags: FactoryFlags::EMPTY,
            stream_buffer_size: 4 * 1024 * 1024,
        }
    }
}

/// Factory counters
#[derive(Debug, Clone, Default)]
pub struct FactoryStats {
    /// `get` calls answered from the table
    pub hits: u64,
    /// `get` calls that went to disk
    pub misses: u64,
    /// Successful loads
    pub loads: u64,
    /// Successful in-place reloads
    pub reloads: u64,
    /// Descriptors destroyed when their last reference went away
    pub destroys: u64,
}

/// Reference-counted resource factory
pub struct ResourceFactory {
    registry: CodecRegistry,
    /// Primary index: canonical-path hash -> descriptor
    resources: FxHashMap<u64, ResourceDescriptor>,
    /// Reverse index: payload cell address -> canonical-path hash
    payload_to_hash: FxHashMap<usize, u64>,
    /// Name index: canonical-path hash -> canonical path; reload support only
    hash_to_path: Option<FxHashMap<u64, String>>,
    buffer: StreamBuffer,
    root: String,
    max_resources: usize,
    stats: FactoryStats,
}

impl ResourceFactory {
    pub fn new(params: FactoryParams, resource_path: &str) -> Self {
        let hash_to_path = if params.flags.contains(FactoryFlags::RELOAD_SUPPORT) {
            Some(FxHashMap::with_capacity_and_hasher(
                params.max_resources,
                Default::default(),
            ))
        } else {
            None
        };

        Self {
            registry: CodecRegistry::new(),
            resources: FxHashMap::with_capacity_and_hasher(
                params.max_resources,
                Default::default(),
            ),
            payload_to_hash: FxHashMap::with_capacity_and_hasher(
                params.max_resources,
                Default::default(),
            ),
            hash_to_path,
            buffer: StreamBuffer::new(params.stream_buffer_size),
            root: truncate_root(resource_path),
            max_resources: params.max_resources,
            stats: FactoryStats::default(),
        }
    }

    /// Register `codec` for files with `extension` (without the dot)
    ///
    /// The registry is append-only: the returned token stays valid for the
    /// factory's lifetime.
    pub fn register<C: ResourceCodec + 'static>(
        &mut self,
        extension: &str,
        codec: C,
    ) -> Result<CodecTypeId> {
        self.registry.register(extension, Box::new(codec))
    }

    /// Load the resource `name` relative to the factory root, or share it if
    /// already loaded.
    ///
    /// A hit increments the reference count of the cached descriptor. A miss
    /// reads the file through the stream buffer, decodes it with the codec
    /// registered for the extension of `name`, and inserts the descriptor
    /// with a reference count of one. Every returned handle must eventually
    /// be passed to [`release`](Self::release).
    pub fn get(&mut self, name: &str) -> Result<Payload> {
        let path = canonical_path(&self.root, name)?;
        let hash = name_hash(&path);

        if let Some(descriptor) = self.resources.get_mut(&hash) {
            debug_assert!(self
                .payload_to_hash
                .contains_key(&payload_key(&descriptor.payload)));
            descriptor.ref_count += 1;
            self.stats.hits += 1;
            return Ok(descriptor.payload.clone());
        }
        self.stats.misses += 1;

        // Extension of the caller-supplied name, not of the canonical path
        let extension = match name.rsplit_once('.') {
            Some((_, extension)) => extension,
            None => return Err(FactoryError::MissingFileExtension(name.to_string())),
        };

        let (type_id, codec) = self.registry.find_codec(extension).ok_or_else(|| {
            error!("unknown resource type: {extension}");
            FactoryError::UnknownResourceType(extension.to_string())
        })?;

        if self.resources.len() >= self.max_resources {
            return Err(FactoryError::OutOfResources);
        }

        let (size, mtime) = self.buffer.load(&path)?;

        let value = codec
            .create(LoadContext {
                bytes: self.buffer.contents(size),
                name,
            })
            .map_err(|e| {
                warn!("unable to create resource: {path}");
                codec_failure(e)
            })?;

        let payload: Payload = Arc::new(RwLock::new(value));
        self.payload_to_hash.insert(payload_key(&payload), hash);
        self.resources.insert(
            hash,
            ResourceDescriptor {
                name_hash: hash,
                payload: payload.clone(),
                type_id,
                ref_count: 1,
                mtime,
            },
        );
        if let Some(paths) = &mut self.hash_to_path {
            paths.insert(hash, path);
        }
        self.stats.loads += 1;
        debug!("loaded resource: {name}");

        Ok(payload)
    }

    /// Take an additional reference to an already-loaded payload
    pub fn acquire(&mut self, payload: &Payload) -> Result<()> {
        let hash = self.hash_of(payload)?;
        let descriptor = self
            .resources
            .get_mut(&hash)
            .ok_or_else(|| FactoryError::NotLoaded(format!("{hash:#x}")))?;
        debug_assert!(descriptor.ref_count > 0);
        descriptor.ref_count += 1;
        Ok(())
    }

    /// Give up one reference to `payload`
    ///
    /// When the last reference goes, the codec's destroy hook runs while the
    /// descriptor is still present in every index, and only then is the
    /// resource removed from the factory.
    pub fn release(&mut self, payload: &Payload) -> Result<()> {
        let key = payload_key(payload);
        let hash = self.hash_of(payload)?;
        let descriptor = self
            .resources
            .get_mut(&hash)
            .ok_or_else(|| FactoryError::NotLoaded(format!("{hash:#x}")))?;
        debug_assert!(descriptor.ref_count > 0);
        descriptor.ref_count -= 1;
        if descriptor.ref_count > 0 {
            return Ok(());
        }
        let type_id = descriptor.type_id;

        if let Some(codec) = self.registry.codec(type_id) {
            codec.destroy(payload.write().as_mut());
        }
        self.payload_to_hash.remove(&key);
        self.resources.remove(&hash);
        if let Some(paths) = &mut self.hash_to_path {
            paths.remove(&hash);
        }
        self.stats.destroys += 1;
        Ok(())
    }

    /// Snapshot of the descriptor for `name`
    ///
    /// Returns a copy; reference counts are not affected and the caller's
    /// copy cannot mutate the live one. The copy shares the payload cell, so
    /// content observed through it reflects later reloads.
    pub fn get_descriptor(&self, name: &str) -> Result<ResourceDescriptor> {
        let path = canonical_path(&self.root, name)?;
        let hash = name_hash(&path);
        self.resources
            .get(&hash)
            .cloned()
            .ok_or_else(|| FactoryError::NotLoaded(name.to_string()))
    }

    /// Codec token of a loaded payload
    pub fn get_type(&self, payload: &Payload) -> Result<CodecTypeId> {
        let hash = self.hash_of(payload)?;
        let descriptor = self
            .resources
            .get(&hash)
            .ok_or_else(|| FactoryError::NotLoaded(format!("{hash:#x}")))?;
        debug_assert!(descriptor.ref_count > 0);
        Ok(descriptor.type_id)
    }

    /// Codec token registered for `extension`
    pub fn type_from_extension(&self, extension: &str) -> Result<CodecTypeId> {
        self.registry
            .find(extension)
            .ok_or_else(|| FactoryError::UnknownResourceType(extension.to_string()))
    }

    /// Extension a codec token was registered under
    pub fn extension_from_type(&self, type_id: CodecTypeId) -> Result<&str> {
        self.registry
            .extension_of(type_id)
            .ok_or_else(|| FactoryError::UnknownResourceType(format!("{type_id:?}")))
    }

    /// Reload every loaded resource of one type whose backing file changed.
    ///
    /// Walks the name index; for each resource of the requested type the
    /// backing file is re-read, and if its mtime differs from the recorded
    /// one the codec recreates the payload in place. Payload handles held by
    /// callers stay valid throughout. Returns on the first failure; entries
    /// after it are not processed.
    pub fn reload_type(&mut self, type_id: CodecTypeId) -> Result<()> {
        let paths = match &self.hash_to_path {
            Some(paths) => paths,
            None => return Err(FactoryError::ReloadUnsupported),
        };
        let codec = self
            .registry
            .codec(type_id)
            .ok_or_else(|| FactoryError::UnknownResourceType(format!("{type_id:?}")))?;
        if !codec.supports_reload() {
            return Err(FactoryError::ReloadUnsupported);
        }

        for (&hash, path) in paths {
            let descriptor = match self.resources.get_mut(&hash) {
                Some(descriptor) => descriptor,
                None => continue,
            };
            if descriptor.type_id != type_id {
                continue;
            }

            let (size, mtime) = self.buffer.load(path)?;
            if mtime == descriptor.mtime {
                continue;
            }

            codec
                .recreate(
                    LoadContext {
                        bytes: self.buffer.contents(size),
                        name: path,
                    },
                    descriptor.payload.write().as_mut(),
                )
                .map_err(|e| {
                    warn!("unable to recreate resource: {path}");
                    codec_failure(e)
                })?;
            descriptor.mtime = mtime;
            self.stats.reloads += 1;
            debug!("reloaded resource: {path}");
        }
        Ok(())
    }

    pub fn stats(&self) -> FactoryStats {
        self.stats.clone()
    }

    /// Number of loaded resources
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn reload_supported(&self) -> bool {
        self.hash_to_path.is_some()
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn hash_of(&self, payload: &Payload) -> Result<u64> {
        self.payload_to_hash
            .get(&payload_key(payload))
            .copied()
            .ok_or_else(|| FactoryError::NotLoaded("payload not owned by this factory".to_string()))
    }
}

/// Double-wrapping an already-typed codec failure would stutter the message
fn codec_failure(e: FactoryError) -> FactoryError {
    match e {
        e @ FactoryError::CodecFailure(_) => e,
        other => FactoryError::CodecFailure(other.to_string()),
    }
}

fn truncate_root(root: &str) -> String {
    if root.len() < RESOURCE_PATH_MAX {
        return root.to_string();
    }
    let mut end = RESOURCE_PATH_MAX - 1;
    while !root.is_char_boundary(end) {
        end -= 1;
    }
    root[..end].to_string()
}
