//! core::lock
//!
//! Exclusive directory lock for store transactions.
//!
//! # Architecture
//!
//! The lock ensures only one transaction can be in flight against a store
//! directory at a time. It is an advisory OS-level lock on the `lock`
//! sentinel file, so it holds across processes sharing the filesystem, and
//! across threads of one process (each acquisition opens its own file
//! handle).
//!
//! # Invariants
//!
//! - The sentinel is created on the first acquisition attempt and never removed
//! - Contention is not an error: exhausting the retry policy yields `Ok(None)`
//! - Lock is automatically released on drop (RAII pattern)
//! - An explicit `release` after a genuine release reports `NotHeld`
//!
//! # Example
//!
//! ```ignore
//! use coffer::core::lock::{DirLock, RetryPolicy};
//!
//! match DirLock::acquire(&paths.lock_path(), &RetryPolicy::default())? {
//!     Some(lock) => {
//!         // Perform the transaction while holding the lock
//!         drop(lock);
//!     }
//!     None => {
//!         // Another transaction is in progress
//!     }
//! }
//! ```

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use thiserror::Error;

/// Default number of acquisition attempts.
pub const DEFAULT_LOCK_ATTEMPTS: u32 = 3;

/// Default delay between acquisition attempts.
///
/// Together with [`DEFAULT_LOCK_ATTEMPTS`] this keeps the worst-case wait
/// below a perceptible pause while outlasting a sibling process's commit.
pub const DEFAULT_LOCK_INTERVAL: Duration = Duration::from_millis(30);

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Failed to create or open the lock sentinel.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock for a reason other than contention.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),

    /// `release` was called on a lock that is no longer held.
    #[error("lock {0} is not held")]
    NotHeld(PathBuf),
}

/// Bounded retry policy for lock acquisition.
///
/// `attempts` counts every attempt including the first; the thread sleeps
/// `interval` between attempts but not after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            interval,
        }
    }

    /// A single attempt with no waiting.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Upper bound on the time spent sleeping between attempts.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.attempts.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_ATTEMPTS, DEFAULT_LOCK_INTERVAL)
    }
}

/// An exclusive lock on a store directory.
///
/// The lock is automatically released when this guard is dropped (RAII pattern).
/// This ensures the lock is always released, even if the transaction panics.
#[derive(Debug)]
pub struct DirLock {
    /// Path to the lock sentinel.
    path: PathBuf,
    /// The open file handle with the lock held.
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl DirLock {
    /// Acquire the lock at `path`, retrying according to `policy`.
    ///
    /// # Errors
    ///
    /// - [`LockError::CreateFailed`] if the sentinel cannot be created or opened
    /// - [`LockError::AcquireFailed`] if the OS lock call fails outright
    ///
    /// Contention that outlasts every attempt is `Ok(None)`.
    pub fn acquire(path: &Path, policy: &RetryPolicy) -> Result<Option<Self>, LockError> {
        let attempts = policy.attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(lock) = Self::try_acquire(path)? {
                tracing::trace!(path = %path.display(), attempt, "lock acquired");
                return Ok(Some(lock));
            }
            tracing::debug!(path = %path.display(), attempt, attempts, "lock contended");
            if attempt < attempts {
                thread::sleep(policy.interval);
            }
        }
        Ok(None)
    }

    /// Make a single non-blocking acquisition attempt.
    ///
    /// Returns `Ok(None)` if another holder has the lock.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, LockError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e)))?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(Self {
                path: path.to_path_buf(),
                file: Some(file),
            })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(LockError::AcquireFailed(format!("{}: {}", path.display(), e))),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock sentinel.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly.
    ///
    /// # Errors
    ///
    /// - [`LockError::ReleaseFailed`] if the OS unlock call fails
    /// - [`LockError::NotHeld`] if the lock was already released
    pub fn release(&mut self) -> Result<(), LockError> {
        let file = self
            .file
            .take()
            .ok_or_else(|| LockError::NotHeld(self.path.clone()))?;
        FileExt::unlock(&file).map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        tracing::trace!(path = %self.path.display(), "lock released");
        Ok(())
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        // Best-effort release on drop - closing the handle drops the lock anyway
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}
