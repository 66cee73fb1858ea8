//! Known-paths catalogue seams.
//!
//! The rewriter never owns the archive inventory. It reads a set of paths known to be
//! (or to become) present, and appends the paths it could not find to an optional,
//! caller-owned sink so they can be scheduled for fetching.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::hash::BuildHasher;

use dashmap::DashSet;

use super::zim_path::ZimPath;

/// Read-only view over the archive paths known to exist.
pub trait ZimPathSet {
    fn contains_path(&self, path: &ZimPath) -> bool;
}

impl<S: BuildHasher> ZimPathSet for HashSet<ZimPath, S> {
    fn contains_path(&self, path: &ZimPath) -> bool {
        self.contains(path)
    }
}

impl ZimPathSet for BTreeSet<ZimPath> {
    fn contains_path(&self, path: &ZimPath) -> bool {
        self.contains(path)
    }
}

impl<S: BuildHasher + Clone> ZimPathSet for DashSet<ZimPath, S> {
    fn contains_path(&self, path: &ZimPath) -> bool {
        self.contains(path)
    }
}

/// Append-only collector of paths referenced but absent from the archive.
///
/// Implementations for shared use across worker threads synchronize internally
/// (`Mutex`, `parking_lot::Mutex`, `DashSet`); `RefCell` covers the single-threaded case.
pub trait MissingZimPaths {
    /// Record `path`; returns `true` when it was not recorded before.
    fn record(&self, path: ZimPath) -> bool;
}

impl<S: BuildHasher> MissingZimPaths for RefCell<HashSet<ZimPath, S>> {
    fn record(&self, path: ZimPath) -> bool {
        self.borrow_mut().insert(path)
    }
}

impl<S: BuildHasher> MissingZimPaths for std::sync::Mutex<HashSet<ZimPath, S>> {
    fn record(&self, path: ZimPath) -> bool {
        // A poisoned set is still a valid set
        let mut guard = self.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.insert(path)
    }
}

impl<S: BuildHasher> MissingZimPaths for parking_lot::Mutex<HashSet<ZimPath, S>> {
    fn record(&self, path: ZimPath) -> bool {
        self.lock().insert(path)
    }
}

impl<S: BuildHasher + Clone> MissingZimPaths for DashSet<ZimPath, S> {
    fn record(&self, path: ZimPath) -> bool {
        self.insert(path)
    }
}
