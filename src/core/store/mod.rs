//! core::store
//!
//! Single-writer transactional document store.
//!
//! # Architecture
//!
//! A store is a directory holding one JSON document. A transaction:
//!
//! 1. Acquires the directory lock (bounded retry)
//! 2. Reads and decodes the live document into the caller's type
//! 3. Hands back the value plus a single-use [`Committer`]
//! 4. On commit, writes `data.tmp`, fsyncs it, renames it over `data`,
//!    then releases the lock
//!
//! # Crash Safety Contract
//!
//! The live document is only ever replaced by an atomic rename of a synced
//! file. A reader, locked or not, sees either the old or the new document,
//! never a partial one. A failure anywhere before the rename leaves `data`
//! untouched; `data.tmp` may be left behind for diagnosis.
//!
//! The one exception is the directory sync that follows the rename. Its
//! failure is reported as [`StoreError::NotDurable`]: the new document is
//! already live, but may not survive a crash.
//!
//! # Invariants
//!
//! - Every acquired lock is released exactly once, on every exit path
//! - A `Committer` finishes at most once; `commit` consumes it
//! - Writers are serialized by the lock alone, with no in-process mutex
//!
//! # Example
//!
//! ```no_run
//! use coffer::core::store::Store;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Roster {
//!     students: Vec<String>,
//! }
//!
//! let store = Store::new("/srv/c1")?;
//! let (mut roster, committer) = store.open::<Roster>()?;
//! roster.students.push("u1".to_string());
//! committer.commit(Some(&roster))?;
//! # Ok::<(), coffer::core::store::StoreError>(())
//! ```
//!
//! A committer cannot be used twice:
//!
//! ```compile_fail
//! # use coffer::core::store::Store;
//! let store = Store::new("/srv/c1").unwrap();
//! let (value, committer) = store.open::<Vec<u32>>().unwrap();
//! committer.commit(Some(&value)).unwrap();
//! committer.commit(None).unwrap();
//! ```

pub mod fault_injection;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use self::fault_injection::FaultPoint;
use crate::core::envelope::{Envelope, PayloadOnly, RecordedProvenance};
use crate::core::lock::{DirLock, LockError, RetryPolicy};
use crate::core::paths::StorePaths;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store directory was given as a relative path.
    #[error("need absolute path: {}", .0.display())]
    NeedAbsolutePath(PathBuf),

    /// Another transaction held the lock for every retry attempt.
    #[error("could not acquire lock on {}: another transaction is in progress", .0.display())]
    LockUnavailable(PathBuf),

    /// The lock sentinel could not be created, locked or released.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// A filesystem operation failed.
    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// The stored document could not be decoded.
    #[error("unmarshal from {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The new value could not be encoded.
    #[error("marshal to {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The document was replaced but the directory sync that makes the
    /// rename durable failed. Readers already see the new document.
    #[error("committed {} but could not confirm it is durable: {source}", path.display())]
    NotDurable { path: PathBuf, source: io::Error },
}

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller misused the API; never worth retrying.
    Usage,
    /// A transaction is in progress elsewhere; retry later.
    Contention,
    /// The filesystem refused an operation.
    Io,
    /// A document could not be encoded or decoded.
    Format,
}

impl StoreError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::NeedAbsolutePath(_) => ErrorCategory::Usage,
            StoreError::LockUnavailable(_) => ErrorCategory::Contention,
            StoreError::Lock(_) | StoreError::Io { .. } | StoreError::NotDurable { .. } => {
                ErrorCategory::Io
            }
            StoreError::Decode { .. } | StoreError::Encode { .. } => ErrorCategory::Format,
        }
    }

    /// Whether retrying later could succeed without any other change.
    pub fn is_contention(&self) -> bool {
        self.category() == ErrorCategory::Contention
    }

    /// Whether the live document was replaced despite the error.
    ///
    /// Only [`StoreError::NotDurable`] qualifies; every other commit error
    /// leaves the live document untouched.
    pub fn is_committed(&self) -> bool {
        matches!(self, StoreError::NotDurable { .. })
    }

    fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Handle on a store directory.
#[derive(Debug, Clone)]
pub struct Store {
    paths: StorePaths,
    policy: RetryPolicy,
    record_user: bool,
}

impl Store {
    /// Create a handle for the store in `dir`.
    ///
    /// Nothing is read or created until an operation runs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NeedAbsolutePath`] if `dir` is relative.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            paths: StorePaths::absolute(dir)?,
            policy: RetryPolicy::default(),
            record_user: true,
        })
    }

    /// Use `policy` when acquiring the lock in [`Store::open`].
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether envelopes written by this handle record the acting user.
    pub fn with_record_user(mut self, record_user: bool) -> Self {
        self.record_user = record_user;
        self
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Write the initial document.
    ///
    /// The directory must already exist. An existing document is replaced.
    /// No lock is taken: initialization is expected to happen before any
    /// transaction runs against the directory.
    pub fn init<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        write_document(&self.paths.data_path(), value, self.record_user)?;
        sync_dir(self.paths.dir()).map_err(|e| StoreError::io("sync directory", self.paths.dir(), e))
    }

    /// Read the current payload without taking the lock.
    ///
    /// Safe because the only mutation path is an atomic rename.
    pub fn read<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        load_payload(&self.paths.data_path())
    }

    /// Read the metadata recorded with the current document, without locking.
    pub fn inspect(&self) -> Result<RecordedProvenance, StoreError> {
        let path = self.paths.data_path();
        let bytes = read_document(&path)?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode { path, source })
    }

    /// Start a transaction.
    ///
    /// # Errors
    ///
    /// - [`StoreError::LockUnavailable`] if another transaction holds the lock
    ///   for every attempt of the retry policy
    /// - [`StoreError::Lock`] if the sentinel cannot be created or locked
    /// - [`StoreError::Io`] / [`StoreError::Decode`] if the document cannot be
    ///   loaded; the lock is released before returning
    pub fn open<T>(&self) -> Result<(T, Committer<T>), StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let lock = DirLock::acquire(&self.paths.lock_path(), &self.policy)?
            .ok_or_else(|| StoreError::LockUnavailable(self.paths.dir().to_path_buf()))?;

        let mut committer = Committer {
            paths: self.paths.clone(),
            record_user: self.record_user,
            lock: Some(lock),
            _payload: PhantomData,
        };

        match load_payload(&self.paths.data_path()) {
            Ok(value) => Ok((value, committer)),
            Err(err) => {
                // The load error wins over any release error.
                let _ = committer.finish(None);
                Err(err)
            }
        }
    }
}

/// Single-use capability that finishes an open transaction.
///
/// `commit` consumes the handle, so it cannot be called twice. Dropping the
/// handle without committing abandons the transaction.
#[derive(Debug)]
#[must_use = "dropping a Committer abandons the transaction"]
pub struct Committer<T> {
    paths: StorePaths,
    record_user: bool,
    /// Held until the transaction finishes; `None` afterwards.
    lock: Option<DirLock>,
    _payload: PhantomData<fn(&T)>,
}

impl<T: Serialize> Committer<T> {
    /// Finish the transaction.
    ///
    /// `Some(value)` atomically replaces the document; `None` closes the
    /// transaction without writing. The lock is released either way.
    ///
    /// If both the write and the release succeed this returns `Ok`. A failed
    /// write is reported in preference to a failed release; a release failure
    /// after a successful write is still an error.
    ///
    /// Any error other than [`StoreError::NotDurable`] leaves the live
    /// document as it was. `NotDurable` means the rename already happened and
    /// only the directory sync failed; check [`StoreError::is_committed`].
    pub fn commit(mut self, value: Option<&T>) -> Result<(), StoreError> {
        self.finish(value)
    }

    /// Close the transaction without writing.
    pub fn abandon(self) -> Result<(), StoreError> {
        self.commit(None)
    }

    /// Directory this transaction operates on.
    pub fn dir(&self) -> &Path {
        self.paths.dir()
    }

    fn finish(&mut self, value: Option<&T>) -> Result<(), StoreError> {
        let Some(mut lock) = self.lock.take() else {
            panic!(
                "coffer: committer for {} finished twice",
                self.paths.dir().display()
            );
        };

        let written = match value {
            Some(value) => self.persist(value),
            None => Ok(()),
        };
        let released = lock.release();

        match (written, released) {
            (Err(err), _) => Err(err),
            (Ok(()), Err(err)) => Err(StoreError::Lock(err)),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn persist(&self, value: &T) -> Result<(), StoreError> {
        let temp = self.paths.temp_path();
        let data = self.paths.data_path();

        write_document(&temp, value, self.record_user)?;

        fault_injection::check(FaultPoint::Rename)
            .and_then(|()| fs::rename(&temp, &data))
            .map_err(|e| StoreError::io("atomically update", &data, e))?;
        tracing::debug!(path = %data.display(), "document replaced");

        sync_dir(self.paths.dir()).map_err(|source| StoreError::NotDurable { path: data, source })
    }
}

impl<T> Drop for Committer<T> {
    fn drop(&mut self) {
        if let Some(mut lock) = self.lock.take() {
            let _ = lock.release();
        }
    }
}

/// Start a transaction on the store in `dir` with the default retry policy.
pub fn open<T>(dir: impl AsRef<Path>) -> Result<(T, Committer<T>), StoreError>
where
    T: Serialize + DeserializeOwned,
{
    Store::new(dir.as_ref())?.open()
}

/// Read the payload stored in `dir` without taking the lock.
///
/// Unlike the transactional entry points this accepts a relative `dir`: the
/// read completes before the working directory could change under it.
pub fn read<T: DeserializeOwned>(dir: impl AsRef<Path>) -> Result<T, StoreError> {
    load_payload(&StorePaths::new(dir.as_ref()).data_path())
}

/// Create the document in `dir` with initial contents `value`.
pub fn init<T: Serialize>(value: &T, dir: impl AsRef<Path>) -> Result<(), StoreError> {
    Store::new(dir.as_ref())?.init(value)
}

fn read_document(path: &Path) -> Result<Vec<u8>, StoreError> {
    fault_injection::check(FaultPoint::Read)
        .and_then(|()| fs::read(path))
        .map_err(|e| StoreError::io("read", path, e))
}

fn load_payload<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = read_document(path)?;
    let doc: PayloadOnly<T> =
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(doc.payload)
}

/// Write an envelope around `value` to `path` and sync it to stable storage.
fn write_document<T: Serialize>(path: &Path, value: &T, record_user: bool) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|e| StoreError::io("create", path, e))?;
    let mut writer = BufWriter::new(file);

    fault_injection::check(FaultPoint::Write).map_err(|e| StoreError::io("write", path, e))?;
    serde_json::to_writer(&mut writer, &Envelope::wrap(value, record_user)).map_err(|source| {
        if source.is_io() {
            StoreError::io("write", path, source.into())
        } else {
            StoreError::Encode {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    writer
        .write_all(b"\n")
        .map_err(|e| StoreError::io("write", path, e))?;

    let file = writer
        .into_inner()
        .map_err(|e| StoreError::io("flush", path, e.into_error()))?;
    fault_injection::check(FaultPoint::Sync)
        .and_then(|()| file.sync_all())
        .map_err(|e| StoreError::io("sync", path, e))
}

/// Sync the store directory so a create or rename inside it is durable.
fn sync_dir(dir: &Path) -> io::Result<()> {
    fault_injection::check(FaultPoint::SyncDir)?;
    sync_dir_entries(dir)
}

#[cfg(unix)]
fn sync_dir_entries(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir_entries(_dir: &Path) -> io::Result<()> {
    // NTFS journals metadata updates; directories cannot be fsynced
    Ok(())
}
