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

//! Canonical path construction and hashing
//!
//! A resource's identity is the 64-bit hash of its canonical path: the
//! factory root joined with the caller-supplied relative name, with runs of
//! `/` collapsed. Canonicalization is purely lexical so identity is cheap,
//! deterministic, and usable before the file exists.

use crate::error::{FactoryError, Result};
use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Upper bound on any canonical path, in bytes, including room for a
/// terminator. Shared by the factory root and the joined path.
pub const RESOURCE_PATH_MAX: usize = 1024;

/// Join `root` and `relative` and collapse every run of `/` into one.
///
/// No `.` or `..` resolution, no symlink following, no case folding. Two
/// textually distinct paths that denote the same file are two distinct
/// resources.
pub fn canonical_path(root: &str, relative: &str) -> Result<String> {
    let mut out = String::with_capacity(root.len() + relative.len() + 1);

    let mut last = '\0';
    for c in root.chars().chain(['/']).chain(relative.chars()) {
        if c != '/' || last != '/' {
            out.push(c);
        }
        last = c;
    }

    if out.len() > RESOURCE_PATH_MAX - 1 {
        return Err(FactoryError::PathTooLong);
    }
    Ok(out)
}

/// 64-bit identity hash of a canonical path.
///
/// Content-independent string hash; stable for the lifetime of the process,
/// which is all the in-memory tables need.
pub fn name_hash(path: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(path.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_with_single_separator() {
        assert_eq!(canonical_path("a", "b.txt").unwrap(), "a/b.txt");
    }

    #[test]
    fn test_collapses_separator_runs() {
        assert_eq!(canonical_path("a", "b///c").unwrap(), "a/b/c");
        assert_eq!(canonical_path("a/", "/b.txt").unwrap(), "a/b.txt");
        assert_eq!(canonical_path("a//", "//b//c.txt").unwrap(), "a/b/c.txt");
    }

    #[test]
    fn test_no_dot_resolution() {
        // Lexical only: "." and ".." pass through untouched
        assert_eq!(canonical_path("a", "./b.txt").unwrap(), "a/./b.txt");
        assert_eq!(canonical_path("a", "../b.txt").unwrap(), "a/../b.txt");
    }

    #[test]
    fn test_idempotent_modulo_root() {
        let once = canonical_path("r", "x//y.txt").unwrap();
        let stripped = once.strip_prefix("r/").unwrap();
        assert_eq!(canonical_path("r", stripped).unwrap(), once);
    }

    #[test]
    fn test_path_too_long() {
        let long = "x".repeat(RESOURCE_PATH_MAX);
        assert_eq!(
            canonical_path("root", &long).unwrap_err(),
            FactoryError::PathTooLong
        );
    }

    #[test]
    fn test_exactly_at_bound() {
        let relative = "x".repeat(RESOURCE_PATH_MAX - 1 - 2); // "r/" prefix
        assert!(canonical_path("r", &relative).is_ok());
        let relative = "x".repeat(RESOURCE_PATH_MAX - 2);
        assert!(canonical_path("r", &relative).is_err());
    }

    #[test]
    fn test_name_hash_distinguishes_paths() {
        assert_eq!(name_hash("a/b.txt"), name_hash("a/b.txt"));
        assert_ne!(name_hash("a/b.txt"), name_hash("a/c.txt"));
    }
}
