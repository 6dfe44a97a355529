//! Level 2: Connecting Tests
//!
//! Drags a new link from a port and checks what gets committed.

mod common;

use common::harness::*;
use pretty_assertions::assert_eq;
use slint_node_wiring::{
    GraphRead, Point, PointerEvent, RenderPhase, WiringConfig, WiringOutcome,
};

#[test]
fn test_drag_to_empty_exclusive_port_appends() {
    let harness = WiringHarness::new();

    let outcome = harness.drag_port_to_port(A_OUT, B_IN);

    assert!(outcome.is_committed());
    assert_eq!(harness.edges(), vec![(A_OUT, B_IN)]);
    let (change, added) = harness.tracker.last_commit().expect("one commit");
    assert!(change.remove.is_empty());
    assert!(added.is_some());
}

#[test]
fn test_drag_to_occupied_exclusive_port_replaces() {
    let harness = WiringHarness::new();
    let c1 = harness.connect(X_OUT, B_IN);

    let outcome = harness.drag_port_to_port(A_OUT, B_IN);

    let change = outcome.change().expect("committed");
    assert_eq!(change.remove, vec![c1]);
    assert_eq!(harness.edges(), vec![(A_OUT, B_IN)]);
    assert_eq!(harness.connection_count(), 1);
    assert!(harness.ctrl.graph().borrow().connection(c1).is_none());
}

#[test]
fn test_replace_is_observed_atomically() {
    let harness = WiringHarness::new();
    harness.connect(X_OUT, B_IN);

    harness.drag_port_to_port(A_OUT, B_IN);

    // The listener runs after the whole change is applied: never zero links at B.in
    assert_eq!(*harness.tracker.connection_counts.borrow(), vec![1]);
    assert_eq!(harness.connections_at(B_IN).len(), 1);
}

#[test]
fn test_release_on_empty_canvas_leaves_graph_unchanged() {
    let harness = WiringHarness::new();
    harness.connect(X_OUT, C_IN);
    let before = harness.snapshot();

    let outcome = harness.drag_port_to(A_OUT, empty_canvas());

    assert_eq!(outcome, WiringOutcome::Discarded);
    assert_eq!(harness.snapshot(), before);
    assert_eq!(harness.tracker.commit_count(), 0);
}

#[test]
fn test_click_without_drag_is_noop() {
    let harness = WiringHarness::new();
    let at = harness.anchor(A_OUT);

    assert!(harness.press_port(A_OUT));
    let outcome = harness.release_at(Point::new(at.x + 1.0, at.y));

    assert_eq!(outcome, WiringOutcome::Discarded);
    assert!(!harness.ctrl.is_dragging());
    assert_eq!(harness.connection_count(), 0);
}

#[test]
fn test_cancel_connecting_is_pure() {
    let harness = WiringHarness::new();
    harness.connect(X_OUT, B_IN);
    let before = harness.snapshot();

    harness.press_port(A_OUT);
    harness.move_to(Point::new(200.0, 120.0));
    harness.move_to(harness.anchor(B_IN));
    assert!(harness.ctrl.handle_pointer_cancel());

    assert_eq!(harness.snapshot(), before);
    assert_eq!(harness.release_at(harness.anchor(B_IN)), WiringOutcome::Inactive);
    assert_eq!(harness.snapshot(), before);
}

#[test]
fn test_drag_from_input_to_output_is_normalized() {
    let harness = WiringHarness::new();

    harness.drag_port_to_port(C_IN, X_OUT);

    assert_eq!(harness.edges(), vec![(X_OUT, C_IN)]);
}

#[test]
fn test_preview_snaps_while_dragging() {
    let harness = WiringHarness::new();

    harness.press_port(A_OUT);
    harness.move_to(Point::new(200.0, 120.0));
    assert!(harness.ctrl.is_dragging());

    let near_b = Point::new(290.0, 30.0);
    harness.move_to(near_b);
    let preview = harness.ctrl.render_contexts().pop().expect("preview");
    assert_eq!(preview.phase, RenderPhase::Connecting);
    assert_eq!(preview.from_port, Some(A_OUT));
    assert_eq!(preview.to_port, Some(B_IN));
    assert_eq!(preview.to_position, harness.anchor(B_IN));

    harness.move_to(Point::new(200.0, 120.0));
    let preview = harness.ctrl.render_contexts().pop().expect("preview");
    assert_eq!(preview.to_port, None);
    assert_eq!(preview.to_position, Point::new(200.0, 120.0));
}

#[test]
fn test_equidistant_candidates_resolve_to_lowest_port() {
    let harness = WiringHarness::with_config(WiringConfig {
        snap_radius: 120.0,
        ..WiringConfig::default()
    });

    // (296, 125) is 100 units from both B.in and C.in
    harness.drag_port_to(X_OUT, Point::new(296.0, 125.0));

    assert_eq!(harness.edges(), vec![(X_OUT, B_IN)]);
}

#[test]
fn test_second_press_during_gesture_rejected() {
    let harness = WiringHarness::new();

    assert!(harness.press_port(A_OUT));
    harness.move_to(Point::new(200.0, 120.0));
    assert!(!harness.press_port(X_OUT));

    harness.release_at(harness.anchor(B_IN));
    assert_eq!(harness.edges(), vec![(A_OUT, B_IN)]);
}

#[test]
fn test_release_far_past_threshold_without_move_commits() {
    let harness = WiringHarness::new();
    let target = harness.anchor(B_IN);

    harness.press_port(A_OUT);
    let outcome = harness
        .ctrl
        .handle_pointer_up(&PointerEvent::at(target.x, target.y));

    assert!(outcome.is_committed());
    assert_eq!(harness.edges(), vec![(A_OUT, B_IN)]);
}
