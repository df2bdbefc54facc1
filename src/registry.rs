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

//! Extension-keyed codec registry

use crate::codec::ResourceCodec;
use crate::error::{FactoryError, Result};
use smallvec::SmallVec;

/// Registry capacity; the set is small and built at startup
pub const MAX_RESOURCE_TYPES: usize = 128;

/// Opaque token identifying a registered codec
///
/// The entry's index in the registry: stable width, stable for the lifetime
/// of the factory, equal across all descriptors produced by the same codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodecTypeId(u32);

impl CodecTypeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

struct RegistryEntry {
    extension: String,
    codec: Box<dyn ResourceCodec>,
}

/// Ordered, append-only codec list
///
/// Entries are never removed while the factory lives, so a `CodecTypeId`
/// handed out once stays valid. Linear scan is fine at this size.
pub struct CodecRegistry {
    entries: SmallVec<[RegistryEntry; 8]>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }

    /// Register `codec` for files with `extension` (without the dot)
    pub fn register(
        &mut self,
        extension: &str,
        codec: Box<dyn ResourceCodec>,
    ) -> Result<CodecTypeId> {
        if self.entries.len() == MAX_RESOURCE_TYPES {
            return Err(FactoryError::OutOfResources);
        }

        // Dots not allowed in extension
        if extension.contains('.') {
            return Err(FactoryError::Invalid(format!(
                "extension may not contain '.': {extension}"
            )));
        }

        if self.find(extension).is_some() {
            return Err(FactoryError::AlreadyRegistered(extension.to_string()));
        }

        self.entries.push(RegistryEntry {
            extension: extension.to_string(),
            codec,
        });
        Ok(CodecTypeId::new(self.entries.len() - 1))
    }

    /// Find the codec registered for `extension`
    pub fn find(&self, extension: &str) -> Option<CodecTypeId> {
        self.entries
            .iter()
            .position(|entry| entry.extension == extension)
            .map(CodecTypeId::new)
    }

    /// Find the codec for `extension` together with its token
    pub fn find_codec(&self, extension: &str) -> Option<(CodecTypeId, &dyn ResourceCodec)> {
        self.entries
            .iter()
            .position(|entry| entry.extension == extension)
            .map(|index| (CodecTypeId::new(index), &*self.entries[index].codec))
    }

    pub fn codec(&self, id: CodecTypeId) -> Option<&dyn ResourceCodec> {
        self.entries.get(id.index()).map(|entry| &*entry.codec)
    }

    /// Reverse lookup: the extension a token was registered under
    pub fn extension_of(&self, id: CodecTypeId) -> Option<&str> {
        self.entries.get(id.index()).map(|entry| &*entry.extension)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}
