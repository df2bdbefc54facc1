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

//! Error types

use std::fmt;

/// Factory error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    /// Invalid argument (bad extension, empty codec slot, ...)
    Invalid(String),

    /// Extension already has a registered codec
    AlreadyRegistered(String),

    /// Registry or resource table capacity reached
    OutOfResources,

    /// Backing file does not exist
    ResourceNotFound(String),

    /// I/O failure other than not-found
    Io(String),

    /// Resource name has no file extension
    MissingFileExtension(String),

    /// No codec registered for the extension
    UnknownResourceType(String),

    /// File does not fit in the stream buffer
    StreamBufferTooSmall(String),

    /// Resource is not present in the factory
    NotLoaded(String),

    /// Canonical path exceeds the path bound
    PathTooLong,

    /// Reload requested without reload support or recreate capability
    ReloadUnsupported,

    /// Codec create or recreate failed
    CodecFailure(String),
}

impl fmt::Display for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryError::Invalid(msg) => write!(f, "Invalid argument: {msg}"),
            FactoryError::AlreadyRegistered(ext) => {
                write!(f, "Extension already registered: {ext}")
            }
            FactoryError::OutOfResources => write!(f, "Out of resources"),
            FactoryError::ResourceNotFound(path) => write!(f, "Resource not found: {path}"),
            FactoryError::Io(msg) => write!(f, "I/O error: {msg}"),
            FactoryError::MissingFileExtension(name) => {
                write!(f, "Missing file extension: {name}")
            }
            FactoryError::UnknownResourceType(ext) => {
                write!(f, "Unknown resource type: {ext}")
            }
            FactoryError::StreamBufferTooSmall(path) => {
                write!(f, "Resource too large for stream buffer: {path}")
            }
            FactoryError::NotLoaded(what) => write!(f, "Not loaded: {what}"),
            FactoryError::PathTooLong => write!(f, "Canonical path too long"),
            FactoryError::ReloadUnsupported => write!(f, "Reload not supported"),
            FactoryError::CodecFailure(msg) => write!(f, "Codec failure: {msg}"),
        }
    }
}

impl std::error::Error for FactoryError {}

/// Result type alias
pub type Result<T> = std::result::Result<T, FactoryError>;
