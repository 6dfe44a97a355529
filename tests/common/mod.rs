//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use slint_node_wiring::{ConnectionChange, ConnectionId};
use std::cell::RefCell;
use std::rc::Rc;

/// Tracks controller notifications for testing.
///
/// Each field records calls to the corresponding listener with their arguments.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// (change, added connection id)
    pub commits: Rc<RefCell<Vec<(ConnectionChange, Option<ConnectionId>)>>>,
    /// Connection count observed from inside each commit listener
    pub connection_counts: Rc<RefCell<Vec<usize>>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.borrow().len()
    }

    pub fn last_commit(&self) -> Option<(ConnectionChange, Option<ConnectionId>)> {
        self.commits.borrow().last().cloned()
    }

    /// Clear all recorded callbacks.
    pub fn clear(&self) {
        self.commits.borrow_mut().clear();
        self.connection_counts.borrow_mut().clear();
    }
}
