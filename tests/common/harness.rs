//! Test harness around a [`WiringController`] with a fixed fixture graph.
//!
//! Fixture (all nodes 100x50, default standoff 4):
//!
//! | node | type     | position   | ports                                   |
//! |------|----------|------------|-----------------------------------------|
//! | A=1  | source   | (0, 0)     | out 1 (right), in 2 (left)              |
//! | B=2  | sink     | (300, 0)   | in 1 (left, capacity 1)                 |
//! | C=3  | sink     | (300, 200) | in 1 (left, capacity 2)                 |
//! | X=4  | source   | (0, 200)   | out 1 (right)                           |

#![allow(dead_code)]

use super::CallbackTracker;
use slint_node_wiring::{
    ConnectionEnd, ConnectionId, ConnectionRequest, GraphMutation, GraphRead, GraphStore,
    Node, Point, PointerEvent, Port, PortRef, Size, WiringConfig, WiringController,
    WiringOutcome, AnchorOverrides,
};
use std::sync::Once;

pub const A: i32 = 1;
pub const B: i32 = 2;
pub const C: i32 = 3;
pub const X: i32 = 4;

pub const A_OUT: PortRef = PortRef::new(A, 1);
pub const A_IN: PortRef = PortRef::new(A, 2);
pub const B_IN: PortRef = PortRef::new(B, 1);
pub const C_IN: PortRef = PortRef::new(C, 1);
pub const X_OUT: PortRef = PortRef::new(X, 1);

/// Install a tracing subscriber once per test binary (`RUST_LOG` controls output).
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct WiringHarness {
    pub ctrl: WiringController,
    pub tracker: CallbackTracker,
}

impl WiringHarness {
    pub fn new() -> Self {
        Self::with_config(WiringConfig::default())
    }

    pub fn with_config(config: WiringConfig) -> Self {
        init_tracing();
        let ctrl = WiringController::with_config(config);

        ctrl.add_node(
            Node::new(A, "source", Point::new(0.0, 0.0), Size::new(100.0, 50.0)),
            vec![Port::output(A, 1), Port::input(A, 2)],
        );
        ctrl.add_node(
            Node::new(B, "sink", Point::new(300.0, 0.0), Size::new(100.0, 50.0)),
            vec![Port::input(B, 1).with_max_connections(1)],
        );
        ctrl.add_node(
            Node::new(C, "sink", Point::new(300.0, 200.0), Size::new(100.0, 50.0)),
            vec![Port::input(C, 1).with_max_connections(2)],
        );
        ctrl.add_node(
            Node::new(X, "source", Point::new(0.0, 200.0), Size::new(100.0, 50.0)),
            vec![Port::output(X, 1)],
        );

        let tracker = CallbackTracker::new();
        {
            let commits = tracker.commits.clone();
            let counts = tracker.connection_counts.clone();
            let graph = ctrl.graph();
            ctrl.on_commit(move |change, added| {
                commits.borrow_mut().push((change.clone(), added));
                counts.borrow_mut().push(graph.borrow().connection_len());
            });
        }

        Self { ctrl, tracker }
    }

    /// Commit a connection directly, bypassing gestures.
    pub fn connect(&self, from: PortRef, to: PortRef) -> ConnectionId {
        let id = self
            .ctrl
            .graph()
            .borrow_mut()
            .add_connection(ConnectionRequest { from, to });
        self.ctrl.refresh();
        id
    }

    /// Screen-space connection point of a port, honouring live previews.
    pub fn anchor(&self, port: PortRef) -> Point {
        let graph = self.ctrl.graph();
        let graph = graph.borrow();
        let resolver = self.ctrl.resolver();
        let resolver = resolver.borrow();
        let preview = self.ctrl.preview();
        let preview = preview.borrow();
        let anchor = resolver
            .resolve_port(&*graph, port, &AnchorOverrides::live(), &preview)
            .expect("fixture port resolves");
        self.ctrl.viewport().canvas_to_screen(anchor.connection_point)
    }

    pub fn press_port(&self, port: PortRef) -> bool {
        let at = self.anchor(port);
        self.ctrl
            .handle_port_pointer_down(port, &PointerEvent::at(at.x, at.y))
    }

    pub fn press_connection_end(&self, id: ConnectionId, end: ConnectionEnd) -> bool {
        let port = self
            .ctrl
            .graph()
            .borrow()
            .connection(id)
            .map(|c| c.end(end))
            .expect("fixture connection exists");
        let at = self.anchor(port);
        self.ctrl
            .handle_connection_end_pointer_down(id, end, &PointerEvent::at(at.x, at.y))
    }

    pub fn move_to(&self, at: Point) {
        self.ctrl.handle_pointer_move(&PointerEvent::at(at.x, at.y));
    }

    pub fn release_at(&self, at: Point) -> WiringOutcome {
        self.ctrl.handle_pointer_up(&PointerEvent::at(at.x, at.y))
    }

    /// Full gesture from `from` to a screen position, passing through an
    /// intermediate point well past the drag threshold.
    pub fn drag_port_to(&self, from: PortRef, to: Point) -> WiringOutcome {
        assert!(self.press_port(from), "press on {:?} should be accepted", from);
        self.move_to(Point::new(200.0, 120.0));
        self.move_to(to);
        self.release_at(to)
    }

    pub fn drag_port_to_port(&self, from: PortRef, to: PortRef) -> WiringOutcome {
        let target = self.anchor(to);
        self.drag_port_to(from, target)
    }

    pub fn drag_end_to(&self, id: ConnectionId, end: ConnectionEnd, to: Point) -> WiringOutcome {
        assert!(self.press_connection_end(id, end), "press on connection {} should be accepted", id);
        self.move_to(Point::new(200.0, 120.0));
        self.move_to(to);
        self.release_at(to)
    }

    pub fn snapshot(&self) -> GraphStore {
        self.ctrl.graph().borrow().clone()
    }

    pub fn connection_count(&self) -> usize {
        self.ctrl.graph().borrow().connection_len()
    }

    pub fn connections_at(&self, port: PortRef) -> Vec<ConnectionId> {
        self.ctrl.graph().borrow().connections_at(port, None)
    }

    /// Endpoints of every committed connection, ordered by id.
    pub fn edges(&self) -> Vec<(PortRef, PortRef)> {
        let graph = self.ctrl.graph();
        let graph = graph.borrow();
        let mut connections = graph.connections().to_vec();
        connections.sort_by_key(|c| c.id);
        connections.iter().map(|c| (c.from(), c.to())).collect()
    }
}

/// A point far from every port and link of the fixture.
pub fn empty_canvas() -> Point {
    Point::new(700.0, 600.0)
}
