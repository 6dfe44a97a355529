//! Pointer-driven wiring state machine.
//!
//! A gesture is `Idle -> Pressed -> Connecting | Disconnecting -> Idle`. The
//! active state is a single enum variant, so a new-link drag and a re-drag of
//! an existing link can never coexist. Nothing here mutates the graph: a
//! release yields a [`WiringOutcome`] whose [`ConnectionChange`] the caller
//! applies in one step through [`GraphMutation::apply_change`].
//!
//! [`GraphMutation::apply_change`]: crate::graph::GraphMutation::apply_change

use crate::anchor::{AnchorOverrides, AnchorPosition, AnchorResolver, LivePreview};
use crate::config::WiringConfig;
use crate::geometry::{distance, Point};
use crate::graph::{
    Connection, ConnectionChange, ConnectionEnd, ConnectionId, GraphRead, Port, PortRef,
};
use crate::hit_test::find_port_at;
use crate::policy::{CapabilityRegistry, ConnectionPolicy, DragContext};
use crate::render::{RenderContext, RenderPhase};

/// Pointer button that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerType {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A normalized pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
    pub button: PointerButton,
    pub pointer_type: PointerType,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Primary-button mouse event at a screen position.
    pub fn at(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            ..Self::default()
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn screen_position(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }
}

/// Maps screen coordinates into canvas (world) coordinates.
pub trait CanvasTransform {
    fn screen_to_canvas(&self, x: f32, y: f32) -> Point;
}

impl<F> CanvasTransform for F
where
    F: Fn(f32, f32) -> Point,
{
    fn screen_to_canvas(&self, x: f32, y: f32) -> Point {
        self(x, y)
    }
}

/// Zoom and pan of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Viewport {
    pub fn new(zoom: f32, pan_x: f32, pan_y: f32) -> Self {
        Self { zoom, pan_x, pan_y }
    }

    fn effective_zoom(&self) -> f32 {
        if self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        }
    }

    /// World -> screen: `world * zoom + pan`.
    pub fn canvas_to_screen(&self, point: Point) -> Point {
        let z = self.effective_zoom();
        Point::new(point.x * z + self.pan_x, point.y * z + self.pan_y)
    }
}

impl CanvasTransform for Viewport {
    fn screen_to_canvas(&self, x: f32, y: f32) -> Point {
        let z = self.effective_zoom();
        Point::new((x - self.pan_x) / z, (y - self.pan_y) / z)
    }
}

/// A new link being drawn from `from_port`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub from_port: PortRef,
    /// Live endpoint: the candidate's connection point, or the pointer.
    pub to_position: Point,
    pub candidate: Option<PortRef>,
}

/// An existing link whose `dragging_end` follows the pointer.
///
/// The connection stays committed until release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisconnectState {
    pub connection_id: ConnectionId,
    pub fixed_port: PortRef,
    pub dragging_end: ConnectionEnd,
    pub dragging_position: Point,
    pub candidate: Option<PortRef>,
}

/// What a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOrigin {
    Port(PortRef),
    ConnectionEnd {
        connection_id: ConnectionId,
        end: ConnectionEnd,
    },
}

/// A press that has not yet travelled past the drag threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingGesture {
    pub origin: GestureOrigin,
    pub press_position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WiringState {
    #[default]
    Idle,
    Pressed(PendingGesture),
    Connecting(DragState),
    Disconnecting(DisconnectState),
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WiringOutcome {
    /// Apply this change to the graph as one transition.
    Committed(ConnectionChange),
    /// The gesture ended without touching the graph.
    Discarded,
    /// No gesture was in progress.
    Inactive,
}

impl WiringOutcome {
    pub fn change(&self) -> Option<&ConnectionChange> {
        match self {
            WiringOutcome::Committed(change) => Some(change),
            _ => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, WiringOutcome::Committed(_))
    }
}

/// Collaborators the state machine reads from during one event.
pub struct WiringContext<'a, G> {
    pub graph: &'a G,
    pub capabilities: &'a dyn CapabilityRegistry,
    pub resolver: &'a AnchorResolver,
    pub preview: &'a LivePreview,
    pub transform: &'a dyn CanvasTransform,
}

/// Current port record for `port`, or `None` (logged) if it vanished.
pub fn resolve_current_port<G: GraphRead>(graph: &G, port: PortRef) -> Option<&Port> {
    let current = graph
        .node(port.node_id)
        .and_then(|_| graph.port(port));
    if current.is_none() {
        tracing::warn!(?port, "port vanished during wiring gesture");
    }
    current
}

/// Render context of a committed connection, resolved with live previews.
pub fn connection_context<G: GraphRead>(
    connection: &Connection,
    graph: &G,
    resolver: &AnchorResolver,
    preview: &LivePreview,
) -> Option<RenderContext> {
    let overrides = AnchorOverrides::live();
    let from = resolver.resolve_port(graph, connection.from(), &overrides, preview)?;
    let to = resolver.resolve_port(graph, connection.to(), &overrides, preview)?;
    Some(RenderContext {
        connection_id: Some(connection.id),
        from_position: from.connection_point,
        to_position: to.connection_point,
        from_port: Some(connection.from()),
        to_port: Some(connection.to()),
        from_side: Some(from.facing_side),
        to_side: Some(to.facing_side),
        phase: RenderPhase::Connected,
        is_dragging: false,
    })
}

/// Wiring gesture state plus the candidate set of the active gesture.
#[derive(Debug, Clone, Default)]
pub struct WiringStateMachine {
    state: WiringState,
    candidates: Vec<PortRef>,
    config: WiringConfig,
    policy: ConnectionPolicy,
}

impl WiringStateMachine {
    pub fn new(config: WiringConfig) -> Self {
        Self {
            policy: ConnectionPolicy::from_config(&config),
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &WiringConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect from the next gesture.
    pub fn set_config(&mut self, config: WiringConfig) {
        self.policy = ConnectionPolicy::from_config(&config);
        self.config = config;
    }

    pub fn policy(&self) -> &ConnectionPolicy {
        &self.policy
    }

    pub fn state(&self) -> &WiringState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, WiringState::Idle)
    }

    /// Whether a link is currently being dragged.
    pub fn is_dragging(&self) -> bool {
        matches!(
            self.state,
            WiringState::Connecting(_) | WiringState::Disconnecting(_)
        )
    }

    /// Eligible targets of the active gesture, ascending.
    pub fn candidates(&self) -> &[PortRef] {
        &self.candidates
    }

    /// The fixed end of the active gesture as seen by the policy.
    pub fn drag_context(&self) -> Option<DragContext> {
        match self.state {
            WiringState::Connecting(drag) => Some(DragContext::new(drag.from_port)),
            WiringState::Disconnecting(d) => Some(DragContext::moving(d.fixed_port, d.connection_id)),
            _ => None,
        }
    }

    /// Press on a port. Returns `false` if the press is not taken.
    pub fn pointer_down_on_port<G: GraphRead>(
        &mut self,
        port: PortRef,
        event: &PointerEvent,
        ctx: &WiringContext<'_, G>,
    ) -> bool {
        if !self.accepts_press(event) || resolve_current_port(ctx.graph, port).is_none() {
            return false;
        }
        self.press(GestureOrigin::Port(port), event)
    }

    /// Press on one end of a committed connection.
    pub fn pointer_down_on_connection_end<G: GraphRead>(
        &mut self,
        connection_id: ConnectionId,
        end: ConnectionEnd,
        event: &PointerEvent,
        ctx: &WiringContext<'_, G>,
    ) -> bool {
        if !self.accepts_press(event) {
            return false;
        }
        if ctx.graph.connection(connection_id).is_none() {
            tracing::warn!(connection_id, "press on unknown connection");
            return false;
        }
        self.press(GestureOrigin::ConnectionEnd { connection_id, end }, event)
    }

    /// Track the pointer. Returns the live preview while a link is dragged.
    pub fn pointer_move<G: GraphRead>(
        &mut self,
        event: &PointerEvent,
        ctx: &WiringContext<'_, G>,
    ) -> Option<RenderContext> {
        if let WiringState::Pressed(pending) = self.state {
            if distance(pending.press_position, event.screen_position()) <= self.config.drag_threshold {
                return None;
            }
            let next = self.begin(pending.origin, ctx);
            self.transition(next);
        }
        if !self.is_dragging() {
            return None;
        }

        let pointer = ctx.transform.screen_to_canvas(event.client_x, event.client_y);
        let (candidate, endpoint) = match self.nearest_candidate(pointer, ctx) {
            Some((port, anchor)) => (Some(port), anchor.connection_point),
            None => (None, pointer),
        };
        tracing::trace!(?candidate, x = endpoint.x, y = endpoint.y, "wiring pointer moved");

        match &mut self.state {
            WiringState::Connecting(drag) => {
                drag.to_position = endpoint;
                drag.candidate = candidate;
            }
            WiringState::Disconnecting(d) => {
                d.dragging_position = endpoint;
                d.candidate = candidate;
            }
            _ => {}
        }
        self.render_context(ctx)
    }

    /// Release the pointer, ending the gesture.
    pub fn pointer_up<G: GraphRead>(
        &mut self,
        event: &PointerEvent,
        ctx: &WiringContext<'_, G>,
    ) -> WiringOutcome {
        self.pointer_move(event, ctx);
        let state = self.state;
        self.transition(WiringState::Idle);

        let outcome = match state {
            WiringState::Idle => WiringOutcome::Inactive,
            WiringState::Pressed(_) => WiringOutcome::Discarded,
            WiringState::Connecting(drag) => self.finish_connect(drag, ctx),
            WiringState::Disconnecting(d) => self.finish_disconnect(d, ctx),
        };
        if let WiringOutcome::Committed(change) = &outcome {
            tracing::debug!(remove = ?change.remove, add = ?change.add, "wiring gesture committed");
        }
        outcome
    }

    /// Abandon the active gesture. Never produces a graph change.
    pub fn cancel(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        self.transition(WiringState::Idle);
        true
    }

    /// Preview of the active gesture, if a link is being dragged.
    pub fn render_context<G: GraphRead>(&self, ctx: &WiringContext<'_, G>) -> Option<RenderContext> {
        let overrides = AnchorOverrides::live();
        let side_of = |port: Option<PortRef>| {
            port.and_then(|p| ctx.resolver.resolve_port(ctx.graph, p, &overrides, ctx.preview))
                .map(|a| a.facing_side)
        };

        match self.state {
            WiringState::Connecting(drag) => {
                let from = ctx
                    .resolver
                    .resolve_port(ctx.graph, drag.from_port, &overrides, ctx.preview)?;
                Some(RenderContext {
                    connection_id: None,
                    from_position: from.connection_point,
                    to_position: drag.to_position,
                    from_port: Some(drag.from_port),
                    to_port: drag.candidate,
                    from_side: Some(from.facing_side),
                    to_side: side_of(drag.candidate),
                    phase: RenderPhase::Connecting,
                    is_dragging: true,
                })
            }
            WiringState::Disconnecting(d) => {
                let fixed = ctx
                    .resolver
                    .resolve_port(ctx.graph, d.fixed_port, &overrides, ctx.preview)?;
                let moving_side = side_of(d.candidate);
                // Keep the link's own orientation: `from` is always its output end.
                let (from_position, from_port, from_side, to_position, to_port, to_side) = match d.dragging_end {
                    ConnectionEnd::To => (
                        fixed.connection_point,
                        Some(d.fixed_port),
                        Some(fixed.facing_side),
                        d.dragging_position,
                        d.candidate,
                        moving_side,
                    ),
                    ConnectionEnd::From => (
                        d.dragging_position,
                        d.candidate,
                        moving_side,
                        fixed.connection_point,
                        Some(d.fixed_port),
                        Some(fixed.facing_side),
                    ),
                };
                Some(RenderContext {
                    connection_id: Some(d.connection_id),
                    from_position,
                    to_position,
                    from_port,
                    to_port,
                    from_side,
                    to_side,
                    phase: RenderPhase::Disconnecting,
                    is_dragging: true,
                })
            }
            _ => None,
        }
    }

    /// Every committed link plus the active preview.
    ///
    /// A link being re-dragged appears once, as its `Disconnecting` preview.
    pub fn render_contexts<G: GraphRead>(&self, ctx: &WiringContext<'_, G>) -> Vec<RenderContext> {
        let grabbed = match self.state {
            WiringState::Disconnecting(d) => Some(d.connection_id),
            _ => None,
        };
        let mut contexts: Vec<RenderContext> = ctx
            .graph
            .connections()
            .iter()
            .filter(|c| Some(c.id) != grabbed)
            .filter_map(|c| connection_context(c, ctx.graph, ctx.resolver, ctx.preview))
            .collect();
        contexts.extend(self.render_context(ctx));
        contexts
    }

    fn accepts_press(&self, event: &PointerEvent) -> bool {
        if event.button != PointerButton::Primary {
            return false;
        }
        if !self.is_idle() {
            tracing::debug!(state = ?self.state, "press ignored, gesture already active");
            return false;
        }
        true
    }

    fn press(&mut self, origin: GestureOrigin, event: &PointerEvent) -> bool {
        self.transition(WiringState::Pressed(PendingGesture {
            origin,
            press_position: event.screen_position(),
        }));
        true
    }

    /// Promote a press to a drag, precomputing the candidate set.
    fn begin<G: GraphRead>(&mut self, origin: GestureOrigin, ctx: &WiringContext<'_, G>) -> WiringState {
        match origin {
            GestureOrigin::Port(port) => {
                if resolve_current_port(ctx.graph, port).is_none() {
                    return WiringState::Idle;
                }
                let drag_ctx = DragContext::new(port);
                self.candidates = self.policy.eligible_candidates(&drag_ctx, ctx.graph, ctx.capabilities);
                WiringState::Connecting(DragState {
                    from_port: port,
                    to_position: Point::ZERO,
                    candidate: None,
                })
            }
            GestureOrigin::ConnectionEnd { connection_id, end } => {
                let Some(connection) = ctx.graph.connection(connection_id) else {
                    tracing::warn!(connection_id, "connection vanished before drag started");
                    return WiringState::Idle;
                };
                let fixed_port = connection.end(end.other());
                let drag_ctx = DragContext::moving(fixed_port, connection_id);
                self.candidates = self.policy.eligible_candidates(&drag_ctx, ctx.graph, ctx.capabilities);
                WiringState::Disconnecting(DisconnectState {
                    connection_id,
                    fixed_port,
                    dragging_end: end,
                    dragging_position: Point::ZERO,
                    candidate: None,
                })
            }
        }
    }

    fn finish_connect<G: GraphRead>(&self, drag: DragState, ctx: &WiringContext<'_, G>) -> WiringOutcome {
        let Some(target) = drag.candidate else {
            return WiringOutcome::Discarded;
        };
        if resolve_current_port(ctx.graph, drag.from_port).is_none() {
            return WiringOutcome::Discarded;
        }
        let plan = self.policy.plan_connection_change(
            &DragContext::new(drag.from_port),
            target,
            ctx.graph,
            ctx.capabilities,
        );
        match plan.connection {
            Some(request) => WiringOutcome::Committed(ConnectionChange {
                remove: plan.connection_ids_to_replace,
                add: Some(request),
            }),
            None => WiringOutcome::Discarded,
        }
    }

    fn finish_disconnect<G: GraphRead>(&self, d: DisconnectState, ctx: &WiringContext<'_, G>) -> WiringOutcome {
        let Some(original) = ctx.graph.connection(d.connection_id) else {
            tracing::warn!(connection_id = d.connection_id, "connection vanished during re-drag");
            return WiringOutcome::Discarded;
        };
        let detach = ConnectionChange {
            remove: vec![d.connection_id],
            add: None,
        };
        let Some(target) = d.candidate else {
            return WiringOutcome::Committed(detach);
        };
        if target == original.end(d.dragging_end) {
            return WiringOutcome::Discarded;
        }

        let plan = self.policy.plan_connection_change(
            &DragContext::moving(d.fixed_port, d.connection_id),
            target,
            ctx.graph,
            ctx.capabilities,
        );
        match plan.connection {
            Some(request) => {
                let mut remove = vec![d.connection_id];
                remove.extend(
                    plan.connection_ids_to_replace
                        .into_iter()
                        .filter(|id| *id != d.connection_id),
                );
                WiringOutcome::Committed(ConnectionChange {
                    remove,
                    add: Some(request),
                })
            }
            None => WiringOutcome::Committed(detach),
        }
    }

    fn nearest_candidate<G: GraphRead>(
        &self,
        pointer: Point,
        ctx: &WiringContext<'_, G>,
    ) -> Option<(PortRef, AnchorPosition)> {
        let overrides = AnchorOverrides::live();
        let anchors: Vec<(PortRef, AnchorPosition)> = self
            .candidates
            .iter()
            .filter_map(|port| {
                ctx.resolver
                    .resolve_port(ctx.graph, *port, &overrides, ctx.preview)
                    .map(|anchor| (*port, anchor))
            })
            .collect();
        let hit = find_port_at(
            pointer,
            anchors.iter().map(|(port, anchor)| (*port, anchor.connection_point)),
            self.config.snap_radius,
        )?;
        anchors.into_iter().find(|(port, _)| *port == hit)
    }

    fn transition(&mut self, next: WiringState) {
        if std::mem::discriminant(&self.state) != std::mem::discriminant(&next) {
            tracing::debug!(from = ?self.state, to = ?next, "wiring state transition");
        }
        if matches!(next, WiringState::Idle) {
            self.candidates.clear();
        }
        self.state = next;
    }
}
