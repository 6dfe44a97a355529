//! Convenience helpers for feeding live drag/resize previews.
//!
//! This module provides [`PreviewTracker`], a wrapper around [`LivePreview`]
//! that hands out ready-made closures for the node-manipulation callbacks of a
//! Slint UI, so anchors follow a node while it is being moved or resized.
//!
//! # Example
//!
//! ```ignore
//! use slint_node_wiring::PreviewTracker;
//!
//! let tracker = PreviewTracker::new();
//!
//! // Wire up callbacks (one-time setup)
//! window.on_node_drag_moved(tracker.drag_callback());
//! window.on_node_resize_moved(tracker.resize_callback());
//! window.on_node_transform_ended(tracker.transform_ended_callback());
//!
//! // Share the preview with the controller
//! let ctrl = WiringController::with_preview(tracker.preview());
//! ```

use crate::anchor::LivePreview;
use crate::geometry::Size;
use crate::graph::NodeId;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a [`LivePreview`] with callback factories.
#[derive(Clone, Default)]
pub struct PreviewTracker {
    preview: Rc<RefCell<LivePreview>>,
}

impl PreviewTracker {
    /// Create a tracker with an empty preview.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker wrapping an existing preview.
    pub fn with_preview(preview: Rc<RefCell<LivePreview>>) -> Self {
        Self { preview }
    }

    /// Get a clone of the internal preview reference.
    pub fn preview(&self) -> Rc<RefCell<LivePreview>> {
        self.preview.clone()
    }

    /// Callback for drag progress: `(node_id, delta_x, delta_y)` relative to
    /// the committed position.
    pub fn drag_callback(&self) -> impl Fn(NodeId, f32, f32) + Clone {
        let preview = self.preview.clone();
        move |node_id, dx, dy| {
            preview.borrow_mut().set_drag_offset(node_id, dx, dy);
        }
    }

    /// Callback for resize progress: `(node_id, width, height)`.
    pub fn resize_callback(&self) -> impl Fn(NodeId, f32, f32) + Clone {
        let preview = self.preview.clone();
        move |node_id, width, height| {
            preview.borrow_mut().set_resize(node_id, Size::new(width, height));
        }
    }

    /// Callback for the end of a drag or resize: drops the node's preview.
    ///
    /// Commit the final geometry to the graph before or after calling this;
    /// anchors fall back to the committed node either way.
    pub fn transform_ended_callback(&self) -> impl Fn(NodeId) + Clone {
        let preview = self.preview.clone();
        move |node_id| {
            preview.borrow_mut().clear(node_id);
        }
    }
}
