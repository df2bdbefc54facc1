//! Stream buffer: the factory's single reusable file-read buffer

use crate::error::{FactoryError, Result};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::time::UNIX_EPOCH;
use tracing::{error, warn};

/// Fixed-size byte buffer shared by the load and reload paths
///
/// Contents are transient: valid only between a `load` and the codec call
/// that consumes them. Nothing may retain a reference across calls.
pub struct StreamBuffer {
    buf: Vec<u8>,
}

impl StreamBuffer {
    pub fn new(size: usize) -> Self {
        Self { buf: vec![0; size] }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Read the file at `path` into the buffer.
    ///
    /// Returns the content length and the file's modification time in whole
    /// seconds since the epoch. A failed stat, or a path that no longer
    /// denotes a regular file, surfaces `ResourceNotFound` so the reload
    /// mtime gate is never fed a made-up timestamp. The byte after the
    /// content is set to NUL for codecs that expect C-style strings, which
    /// is why a file must fit in `capacity - 1` bytes.
    pub fn load(&mut self, path: &str) -> Result<(usize, u64)> {
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                warn!("resource not found: {path}");
                FactoryError::ResourceNotFound(path.to_string())
            } else {
                FactoryError::Io(format!("{path}: {e}"))
            }
        })?;

        let meta = file
            .metadata()
            .map_err(|_| FactoryError::ResourceNotFound(path.to_string()))?;
        if !meta.is_file() {
            warn!("resource is not a regular file: {path}");
            return Err(FactoryError::ResourceNotFound(path.to_string()));
        }
        let size = meta.len() as usize;

        if size + 1 >= self.buf.len() {
            error!("resource too large for stream buffer: {path}");
            return Err(FactoryError::StreamBufferTooSmall(path.to_string()));
        }

        let mtime = meta
            .modified()
            .map_err(|e| FactoryError::Io(format!("{path}: {e}")))?
            .duration_since(UNIX_EPOCH)
            .map_err(|e| FactoryError::Io(format!("{path}: {e}")))?
            .as_secs();

        file.read_exact(&mut self.buf[..size])
            .map_err(|e| FactoryError::Io(format!("{path}: {e}")))?;
        self.buf[size] = 0;

        Ok((size, mtime))
    }

    /// The first `len` bytes read by the preceding `load`
    pub fn contents(&self, len: usize) -> &[u8] {
        &self.buf[..len]
    }
}
