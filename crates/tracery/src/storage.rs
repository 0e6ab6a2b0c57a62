//! Pass-scoped memoization of node bounds.
//!
//! During a layout pass the bounds of a lifeline are read by every call on it,
//! and the bounds of a call by every later sibling. [`NodeStorage`] remembers
//! each computed rectangle while it is active. Outside a pass it is inactive
//! and every lookup recomputes, so a query right after an edit never sees a
//! stale rectangle.
//!
//! Storage is normally driven by a
//! [`LayoutSession`](crate::render::LayoutSession) rather than by hand.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use log::trace;

use tracery_core::{
    diagram::{ModelError, NodeId},
    geometry::Rectangle,
};

/// Activatable cache from node to bounds.
#[derive(Debug, Default)]
pub struct NodeStorage {
    active: Cell<bool>,
    entries: RefCell<HashMap<NodeId, Rectangle>>,
    computations: Cell<usize>,
}

impl NodeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts caching, with no entries.
    pub fn activate(&self) {
        self.entries.borrow_mut().clear();
        self.active.set(true);
    }

    /// Stops caching and drops every entry.
    pub fn deactivate_and_clear(&self) {
        let dropped = {
            let mut entries = self.entries.borrow_mut();
            let dropped = entries.len();
            entries.clear();
            dropped
        };
        self.active.set(false);
        trace!(dropped = dropped; "Node storage deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Returns the bounds of `node`, computing them with `compute` unless they
    /// are cached.
    ///
    /// While inactive this always calls `compute` and stores nothing. Errors
    /// are never cached.
    pub fn get_or_compute<F>(&self, node: NodeId, compute: F) -> Result<Rectangle, ModelError>
    where
        F: FnOnce() -> Result<Rectangle, ModelError>,
    {
        if let Some(cached) = self.peek(node) {
            return Ok(cached);
        }

        // `compute` may recurse into this storage for other nodes.
        let bounds = compute()?;
        self.computations.set(self.computations.get() + 1);
        if self.is_active() {
            self.entries.borrow_mut().insert(node, bounds);
        }
        Ok(bounds)
    }

    /// Stores bounds computed elsewhere, such as by an earlier layout pass.
    /// Does nothing while inactive.
    pub fn seed(&self, node: NodeId, bounds: Rectangle) {
        if self.is_active() {
            self.entries.borrow_mut().insert(node, bounds);
        }
    }

    /// Cached bounds of `node`, if storage is active and holds them.
    pub fn peek(&self, node: NodeId) -> Option<Rectangle> {
        if !self.is_active() {
            return None;
        }
        self.entries.borrow().get(&node).copied()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of times bounds were actually computed since this storage was created.
    pub fn computations(&self) -> usize {
        self.computations.get()
    }
}
