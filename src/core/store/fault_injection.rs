//! core::store::fault_injection
//!
//! Simulated I/O failures at fixed points of the store's read and commit
//! paths. Arming a point is only possible under `cfg(test)` or the
//! `fault_injection` feature; otherwise every check passes.

use std::io;

/// A place in the store where a failure can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// Reading the live document.
    Read,
    /// Writing the serialized envelope.
    Write,
    /// Syncing a written document to stable storage.
    Sync,
    /// Renaming the staging file over the live document.
    Rename,
    /// Syncing the store directory after a create or rename.
    SyncDir,
}

#[cfg(any(test, feature = "fault_injection"))]
mod armed {
    use std::cell::Cell;

    use super::FaultPoint;

    // Thread-local so parallel tests cannot trip each other's faults.
    thread_local! {
        static ARMED: Cell<Option<FaultPoint>> = const { Cell::new(None) };
    }

    /// Fail the next time `point` is reached on this thread.
    ///
    /// The fault fires once and then disarms itself.
    pub fn arm(point: FaultPoint) {
        ARMED.with(|c| c.set(Some(point)));
    }

    /// Disarm any pending fault on this thread.
    pub fn reset() {
        ARMED.with(|c| c.set(None));
    }

    pub(super) fn take(point: FaultPoint) -> bool {
        ARMED.with(|c| {
            if c.get() == Some(point) {
                c.set(None);
                true
            } else {
                false
            }
        })
    }
}

#[cfg(any(test, feature = "fault_injection"))]
pub use armed::{arm, reset};

/// Fail with a simulated error if `point` is armed on this thread.
pub(crate) fn check(point: FaultPoint) -> io::Result<()> {
    #[cfg(any(test, feature = "fault_injection"))]
    if armed::take(point) {
        return Err(io::Error::other(format!(
            "simulated {:?} failure for fault injection testing",
            point
        )));
    }

    #[cfg(not(any(test, feature = "fault_injection")))]
    let _ = point;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unarmed_points_pass() {
        reset();
        assert!(check(FaultPoint::Sync).is_ok());
    }

    #[test]
    fn armed_point_fires_once() {
        arm(FaultPoint::Rename);
        assert!(check(FaultPoint::Sync).is_ok());
        assert!(check(FaultPoint::Rename).is_err());
        assert!(check(FaultPoint::Rename).is_ok());
    }
}
