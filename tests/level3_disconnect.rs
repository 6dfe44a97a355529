//! Level 3: Re-drag and Disconnect Tests
//!
//! Grabs one end of a committed link and moves, drops or abandons it.

mod common;

use common::harness::*;
use pretty_assertions::assert_eq;
use slint_node_wiring::{
    ConnectionEnd, ConnectionRequest, GraphRead, Point, PointerEvent, RenderPhase, WiringOutcome,
};

// ============================================================================
// Moving an end
// ============================================================================

#[test]
fn test_move_input_end_to_another_port() {
    let harness = WiringHarness::new();
    let c1 = harness.connect(A_OUT, B_IN);

    let outcome = harness.drag_end_to(c1, ConnectionEnd::To, harness.anchor(C_IN));

    let change = outcome.change().expect("committed");
    assert_eq!(change.remove, vec![c1]);
    assert_eq!(
        change.add,
        Some(ConnectionRequest {
            from: A_OUT,
            to: C_IN
        })
    );
    assert_eq!(harness.edges(), vec![(A_OUT, C_IN)]);
    assert!(harness.ctrl.graph().borrow().connection(c1).is_none());
}

#[test]
fn test_move_output_end_to_another_output() {
    let harness = WiringHarness::new();
    let c1 = harness.connect(A_OUT, B_IN);

    harness.drag_end_to(c1, ConnectionEnd::From, harness.anchor(X_OUT));

    assert_eq!(harness.edges(), vec![(X_OUT, B_IN)]);
}

#[test]
fn test_move_end_onto_occupied_exclusive_port_replaces() {
    let harness = WiringHarness::new();
    let c1 = harness.connect(A_OUT, C_IN);
    let c2 = harness.connect(X_OUT, B_IN);

    let outcome = harness.drag_end_to(c1, ConnectionEnd::To, harness.anchor(B_IN));

    let change = outcome.change().expect("committed");
    assert_eq!(change.remove, vec![c1, c2]);
    assert_eq!(harness.edges(), vec![(A_OUT, B_IN)]);
    assert_eq!(harness.connections_at(B_IN).len(), 1);
    assert!(harness.connections_at(C_IN).is_empty());
}

// ============================================================================
// Dropping
// ============================================================================

#[test]
fn test_drop_on_empty_canvas_detaches() {
    let harness = WiringHarness::new();
    let c1 = harness.connect(A_OUT, B_IN);

    let outcome = harness.drag_end_to(c1, ConnectionEnd::To, empty_canvas());

    let change = outcome.change().expect("committed");
    assert_eq!(change.remove, vec![c1]);
    assert_eq!(change.add, None);
    assert!(harness.edges().is_empty());

    let (_, added) = harness.tracker.last_commit().expect("listener called");
    assert_eq!(added, None);
}

#[test]
fn test_drop_back_on_original_port_is_noop() {
    let harness = WiringHarness::new();
    let c1 = harness.connect(A_OUT, B_IN);
    let before = harness.snapshot();

    let outcome = harness.drag_end_to(c1, ConnectionEnd::To, harness.anchor(B_IN));

    assert_eq!(outcome, WiringOutcome::Discarded);
    assert_eq!(harness.snapshot(), before);
    assert_eq!(harness.tracker.commit_count(), 0);
    assert!(harness.ctrl.graph().borrow().connection(c1).is_some());
}

#[test]
fn test_cancel_redrag_keeps_connection() {
    let harness = WiringHarness::new();
    let c1 = harness.connect(A_OUT, B_IN);
    let before = harness.snapshot();

    harness.press_connection_end(c1, ConnectionEnd::To);
    harness.move_to(Point::new(200.0, 120.0));
    harness.move_to(harness.anchor(C_IN));
    assert!(harness.ctrl.handle_pointer_cancel());

    assert_eq!(harness.snapshot(), before);
    assert_eq!(harness.edges(), vec![(A_OUT, B_IN)]);
}

// ============================================================================
// Preview
// ============================================================================

#[test]
fn test_redrag_preview_replaces_committed_link() {
    let harness = WiringHarness::new();
    let c1 = harness.connect(A_OUT, B_IN);

    harness.press_connection_end(c1, ConnectionEnd::To);
    harness.move_to(Point::new(200.0, 120.0));

    // The link is still committed while it is being dragged
    assert_eq!(harness.connection_count(), 1);

    let contexts = harness.ctrl.render_contexts();
    assert_eq!(contexts.len(), 1);
    let preview = &contexts[0];
    assert_eq!(preview.phase, RenderPhase::Disconnecting);
    assert_eq!(preview.connection_id, Some(c1));
    assert_eq!(preview.from_port, Some(A_OUT));
    assert_eq!(preview.from_position, harness.anchor(A_OUT));
    assert_eq!(preview.to_position, Point::new(200.0, 120.0));
    assert!(preview.is_dragging);

    harness.ctrl.handle_pointer_cancel();
    let contexts = harness.ctrl.render_contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].phase, RenderPhase::Connected);
}

#[test]
fn test_press_on_unknown_connection_rejected() {
    let harness = WiringHarness::new();
    assert!(!harness
        .ctrl
        .handle_connection_end_pointer_down(99, ConnectionEnd::To, &PointerEvent::at(0.0, 0.0)));
    assert!(!harness.ctrl.is_dragging());
}
