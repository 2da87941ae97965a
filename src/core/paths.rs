//! core::paths
//!
//! Centralized path routing for a store directory.
//!
//! # Storage Layout
//!
//! Every store lives in a single directory:
//! - `data` - The live document
//! - `data.tmp` - Staging file, present only while a commit is in flight
//! - `lock` - Lock sentinel, created on the first acquisition attempt
//!
//! **Hard rule:** No code outside this module joins file names onto a store
//! directory. All paths go through `StorePaths`.
//!
//! # Example
//!
//! ```
//! use coffer::core::paths::StorePaths;
//! use std::path::PathBuf;
//!
//! let paths = StorePaths::absolute("/srv/course").unwrap();
//!
//! assert_eq!(paths.data_path(), PathBuf::from("/srv/course/data"));
//! assert_eq!(paths.lock_path(), PathBuf::from("/srv/course/lock"));
//! ```

use std::path::{Path, PathBuf};

use crate::core::store::StoreError;

/// File name of the live document.
pub const DATA_FILE: &str = "data";

/// File name of the staging file used during commits.
pub const TEMP_FILE: &str = "data.tmp";

/// File name of the lock sentinel.
pub const LOCK_FILE: &str = "lock";

/// Path routing for one store directory.
///
/// # Invariants
///
/// - Paths built with [`StorePaths::absolute`] are absolute, so they keep
///   their meaning if the process changes its working directory between
///   opening and committing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    dir: PathBuf,
}

impl StorePaths {
    /// Create paths for `dir` without checking that it is absolute.
    ///
    /// Only the lock-free read path uses this, since a read completes before
    /// the working directory could change under it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create paths for `dir`, rejecting relative paths.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NeedAbsolutePath`] if `dir` is relative.
    ///
    /// # Example
    ///
    /// ```
    /// use coffer::core::paths::StorePaths;
    /// use coffer::core::store::StoreError;
    ///
    /// let err = StorePaths::absolute("relative/dir").unwrap_err();
    /// assert!(matches!(err, StoreError::NeedAbsolutePath(_)));
    /// ```
    pub fn absolute(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        if !dir.is_absolute() {
            return Err(StoreError::NeedAbsolutePath(dir));
        }
        Ok(Self { dir })
    }

    /// The store directory itself.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the live document.
    pub fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    /// Path of the staging file.
    pub fn temp_path(&self) -> PathBuf {
        self.dir.join(TEMP_FILE)
    }

    /// Path of the lock sentinel.
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }
}
