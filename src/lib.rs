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
//! In-memory cache of decoded game assets: resources are loaded from a
//! filesystem root, decoded by extension-registered codecs, shared among
//! consumers through reference-counted handles, and hot-reloaded in place
//! when their backing files change.

pub mod buffer;
pub mod codec;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod path;
pub mod registry;

// Re-exports for convenience
pub use codec::{BinaryCodec, JsonCodec, LoadContext, ResourceCodec, TextCodec};
pub use descriptor::{payload_key, Payload, ResourceDescriptor};
pub use error::{FactoryError, Result};
pub use factory::{FactoryFlags, FactoryParams, FactoryStats, ResourceFactory};
pub use path::{canonical_path, name_hash, RESOURCE_PATH_MAX};
pub use registry::{CodecTypeId, MAX_RESOURCE_TYPES};
