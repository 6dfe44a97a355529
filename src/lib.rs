//! # Slint Node Wiring
//!
//! The interactive wiring engine behind a Slint graph editor: where port
//! anchors currently are, how links between them are drawn, and what happens
//! when the user drags a link from one port to another.
//!
//! ## Features
//!
//! - **Live Anchors** - Port positions follow nodes while they are dragged or resized
//! - **Directional Bezier Links** - Deterministic curves exiting along each port's side
//! - **Connection Policy** - Roles, data types, capacities, self-loops, cycles and custom validators
//! - **Replace / Append / Ignore** - Dropping on an occupied exclusive port swaps the link atomically
//! - **Gesture State Machine** - Connect, re-drag and disconnect, always cancellable without side effects
//!
//! ## Core Pieces
//!
//! - [`AnchorResolver`] - Resolve port anchors, caching custom layouts
//! - [`ConnectionPolicy`] - Eligibility checks and switching plans
//! - [`WiringStateMachine`] - Pointer-driven gesture state
//! - [`WiringController`] - Shared-state facade handing out Slint callbacks
//! - [`GraphStore`] - In-memory graph implementing [`GraphRead`] and [`GraphMutation`]
//!
//! ## Rust Helpers
//!
//! - [`bezier_path`] - SVG path for a link between two anchors
//! - [`find_port_at`] - Hit-test ports with a deterministic tie-break
//! - [`find_connection_at`] - Hit-test links
//! - [`PreviewTracker`] - Callbacks feeding live node drag/resize previews

pub mod geometry;
pub mod path;
pub mod graph;
pub mod anchor;
pub mod tracking;
pub mod policy;
pub mod render;
pub mod interaction;
pub mod controller;
pub mod config;

pub use geometry::{
    direction_vector, distance, is_near_segment, midpoint, Direction, Point, Side, Size,
};
pub use path::{
    bezier_path, control_point_offset, control_points, distance_to_bezier, CubicBezier,
    DirectionIndicator,
};
pub use graph::{
    Connection, ConnectionChange, ConnectionEnd, ConnectionId, ConnectionRequest, GraphMutation,
    GraphRead, GraphStore, Node, NodeId, Port, PortId, PortRef, PortRole,
};
pub use anchor::{
    AnchorOverrides, AnchorPosition, AnchorResolver, LivePreview, NodeTransform, PortLayout,
    PortPlacement,
};
pub use tracking::PreviewTracker;
pub use policy::{
    CapabilityRegistry, CompositeValidator, ConnectionPlan, ConnectionPolicy, ConnectionValidator,
    DragContext, NoCapabilities, NodeTypeCapabilities, SwitchBehavior, ValidationError,
    ValidationResult,
};
pub use hit_test::{find_connection_at, find_port_at, LinkGeometry, PortGeometry, SimpleLinkGeometry};
pub use render::{RenderContext, RenderModelSync, RenderPhase};
pub use interaction::{
    CanvasTransform, DisconnectState, DragState, GestureOrigin, Modifiers, PointerButton,
    PointerEvent, PointerType, Viewport, WiringContext, WiringOutcome, WiringState,
    WiringStateMachine,
};
pub use controller::WiringController;
pub use config::{ConfigError, WiringConfig};
