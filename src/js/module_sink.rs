//! Receivers for the ES modules discovered while rewriting.
//!
//! Modules imported by a module script must themselves be fetched and rewritten as
//! modules, so the JS rewriter reports their archive paths to the caller.

use std::cell::RefCell;
use std::hash::BuildHasher;

use crossbeam_channel::Sender;
use dashmap::DashSet;

use crate::url_rewriting::ZimPath;

/// Told about every module path a script imports.
pub trait ModuleSink {
    fn notify(&self, path: ZimPath);
}

impl ModuleSink for RefCell<Vec<ZimPath>> {
    fn notify(&self, path: ZimPath) {
        self.borrow_mut().push(path);
    }
}

impl ModuleSink for std::sync::Mutex<Vec<ZimPath>> {
    fn notify(&self, path: ZimPath) {
        self.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(path);
    }
}

impl ModuleSink for parking_lot::Mutex<Vec<ZimPath>> {
    fn notify(&self, path: ZimPath) {
        self.lock().push(path);
    }
}

impl<S: BuildHasher + Clone> ModuleSink for DashSet<ZimPath, S> {
    fn notify(&self, path: ZimPath) {
        self.insert(path);
    }
}

/// Queue drained by the component scheduling downloads.
impl ModuleSink for Sender<ZimPath> {
    fn notify(&self, path: ZimPath) {
        if let Err(e) = self.send(path) {
            log::debug!("Module {} not notified, receiver is gone", e.into_inner().value());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(value: &str) -> ZimPath {
        ZimPath::new(value).expect("valid path")
    }

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = crossbeam_channel::unbounded::<ZimPath>();
        tx.notify(path("kiwix.org/a.js"));
        tx.notify(path("kiwix.org/b.js"));
        drop(tx);
        let received: Vec<ZimPath> = rx.iter().collect();
        assert_eq!(received, vec![path("kiwix.org/a.js"), path("kiwix.org/b.js")]);
    }

    #[test]
    fn test_channel_sink_without_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded::<ZimPath>();
        drop(rx);
        tx.notify(path("kiwix.org/a.js"));
    }

    #[test]
    fn test_mutex_sinks_keep_order() {
        let sink: parking_lot::Mutex<Vec<ZimPath>> = parking_lot::Mutex::new(Vec::new());
        sink.notify(path("kiwix.org/b.js"));
        sink.notify(path("kiwix.org/a.js"));
        assert_eq!(*sink.lock(), vec![path("kiwix.org/b.js"), path("kiwix.org/a.js")]);

        let sink: std::sync::Mutex<Vec<ZimPath>> = std::sync::Mutex::new(Vec::new());
        sink.notify(path("kiwix.org/a.js"));
        assert_eq!(sink.lock().expect("not poisoned").len(), 1);
    }
}
