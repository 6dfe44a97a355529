//! High-level controller for wiring gestures in a Slint UI.
//!
//! The [`WiringController`] owns the graph, the anchor resolver, the live
//! preview and the wiring state machine, and hands out callbacks for the UI.
//!
//! # Example
//!
//! ```ignore
//! use slint_node_wiring::{PortRef, WiringController};
//!
//! slint::include_modules!();
//!
//! fn main() {
//!     let window = MainWindow::new().unwrap();
//!     let ctrl = WiringController::new();
//!
//!     // Link paths are pushed into a model the UI iterates over
//!     let links = Rc::new(VecModel::<LinkPath>::default());
//!     ctrl.bind_model(links.clone(), |ctx, path| LinkPath {
//!         id: ctx.connection_id.unwrap_or(-1),
//!         path_commands: path,
//!         dragging: ctx.is_dragging,
//!     });
//!     window.set_link_paths(ModelRc::from(links));
//!
//!     // Pointer input
//!     window.on_port_pointer_down(ctrl.port_pointer_down_callback());
//!     window.on_pointer_moved(ctrl.pointer_move_callback());
//!     window.on_pointer_released(ctrl.pointer_up_callback());
//!     window.on_pointer_cancelled(ctrl.pointer_cancel_callback());
//!
//!     // Viewport
//!     window.on_update_viewport({
//!         let ctrl = ctrl.clone();
//!         move |zoom, pan_x, pan_y| ctrl.set_viewport(zoom, pan_x, pan_y)
//!     });
//!
//!     window.run().unwrap();
//! }
//! ```

use crate::anchor::{AnchorOverrides, AnchorResolver, LivePreview, PortLayout};
use crate::config::{ConfigError, WiringConfig};
use crate::geometry::Point;
use crate::graph::{
    ConnectionChange, ConnectionEnd, ConnectionId, GraphMutation, GraphRead, GraphStore, Node, NodeId, Port,
    PortId, PortRef,
};
use crate::hit_test::{find_connection_at, find_port_at, SimpleLinkGeometry};
use crate::interaction::{
    connection_context, CanvasTransform, PointerEvent, Viewport, WiringContext, WiringOutcome,
    WiringStateMachine,
};
use crate::policy::NodeTypeCapabilities;
use crate::render::{RenderContext, RenderModelSync};
use slint::{SharedString, VecModel};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Controller that manages wiring state and provides callback implementations.
///
/// This provides a high-level API that handles:
/// - The committed graph and atomic application of wiring commits
/// - Anchor resolution under live drag/resize previews
/// - Screen-space pointer input (screen→world conversion done internally)
/// - Link path computation and optional Slint model sync
///
/// Clone this controller to share it across callbacks.
#[derive(Clone)]
pub struct WiringController {
    graph: Rc<RefCell<GraphStore>>,
    resolver: Rc<RefCell<AnchorResolver>>,
    preview: Rc<RefCell<LivePreview>>,
    machine: Rc<RefCell<WiringStateMachine>>,
    viewport: Rc<RefCell<Viewport>>,
    capabilities: Rc<RefCell<HashMap<String, NodeTypeCapabilities>>>,
    sync: Rc<RefCell<RenderModelSync>>,
    commit_listeners: Rc<RefCell<Vec<CommitListener>>>,
}

type CommitListener = Rc<dyn Fn(&ConnectionChange, Option<ConnectionId>)>;

impl Default for WiringController {
    fn default() -> Self {
        Self::new()
    }
}

impl WiringController {
    /// Create a new controller with default settings.
    pub fn new() -> Self {
        Self::with_config(WiringConfig::default())
    }

    /// Create a controller with `config`. An invalid config is logged and
    /// replaced by the defaults.
    pub fn with_config(config: WiringConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                tracing::warn!(%err, "invalid wiring config, using defaults");
                WiringConfig::default()
            }
        };
        Self {
            graph: Rc::new(RefCell::new(GraphStore::new())),
            resolver: Rc::new(RefCell::new(
                AnchorResolver::new().with_standoff(config.port_standoff),
            )),
            preview: Rc::new(RefCell::new(LivePreview::new())),
            machine: Rc::new(RefCell::new(WiringStateMachine::new(config))),
            viewport: Rc::new(RefCell::new(Viewport::default())),
            capabilities: Rc::new(RefCell::new(HashMap::new())),
            sync: Rc::new(RefCell::new(RenderModelSync::new())),
            commit_listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Create a controller sharing an existing live preview, e.g. one owned
    /// by a [`PreviewTracker`](crate::PreviewTracker).
    pub fn with_preview(preview: Rc<RefCell<LivePreview>>) -> Self {
        Self {
            preview,
            ..Self::new()
        }
    }

    // === Accessors ===

    pub fn graph(&self) -> Rc<RefCell<GraphStore>> {
        self.graph.clone()
    }

    pub fn preview(&self) -> Rc<RefCell<LivePreview>> {
        self.preview.clone()
    }

    pub fn resolver(&self) -> Rc<RefCell<AnchorResolver>> {
        self.resolver.clone()
    }

    pub fn config(&self) -> WiringConfig {
        self.machine.borrow().config().clone()
    }

    /// Replace the configuration. An active gesture is cancelled.
    ///
    /// An invalid config is rejected and the current one stays in place.
    pub fn set_config(&self, config: WiringConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.machine.borrow_mut().cancel();
        self.resolver.borrow_mut().set_standoff(config.port_standoff);
        self.machine.borrow_mut().set_config(config);
        self.refresh();
        Ok(())
    }

    /// Set the snap radius for candidate ports (default: 24.0).
    pub fn set_snap_radius(&self, radius: f32) -> Result<(), ConfigError> {
        self.set_config(WiringConfig {
            snap_radius: radius,
            ..self.config()
        })
    }

    /// Set the drag threshold in screen pixels (default: 4.0).
    pub fn set_drag_threshold(&self, threshold: f32) -> Result<(), ConfigError> {
        self.set_config(WiringConfig {
            drag_threshold: threshold,
            ..self.config()
        })
    }

    pub fn viewport(&self) -> Viewport {
        *self.viewport.borrow()
    }

    /// Set viewport state: zoom, pan_x, pan_y.
    pub fn set_viewport(&self, zoom: f32, pan_x: f32, pan_y: f32) {
        *self.viewport.borrow_mut() = Viewport::new(zoom, pan_x, pan_y);
        self.refresh();
    }

    pub fn is_dragging(&self) -> bool {
        self.machine.borrow().is_dragging()
    }

    // === Graph setup ===

    /// Add a node. An empty port list takes the ports registered for the
    /// node's type, if any.
    pub fn add_node(&self, node: Node, ports: Vec<Port>) {
        let id = node.id;
        let ports = if ports.is_empty() {
            self.capabilities
                .borrow()
                .get(&node.node_type)
                .map(|caps| caps.ports.clone())
                .unwrap_or_default()
        } else {
            ports
        };
        self.graph.borrow_mut().add_node(node, ports);
        self.resolver.borrow().invalidate(id);
        self.refresh();
    }

    pub fn remove_node(&self, id: NodeId) -> Option<Node> {
        let removed = self.graph.borrow_mut().remove_node(id);
        self.resolver.borrow().invalidate(id);
        self.preview.borrow_mut().clear(id);
        self.refresh();
        removed
    }

    /// Register the capabilities of a node type, replacing any previous entry.
    pub fn register_node_type(&self, node_type: impl Into<String>, capabilities: NodeTypeCapabilities) {
        self.capabilities
            .borrow_mut()
            .insert(node_type.into(), capabilities);
    }

    pub fn set_port_layout(&self, node_id: NodeId, layout: Rc<dyn PortLayout>) {
        self.resolver.borrow_mut().set_layout(node_id, layout);
        self.refresh();
    }

    /// Write a node's previewed drag/resize into the graph and drop the preview.
    pub fn commit_node_transform(&self, node_id: NodeId) {
        let Some(transform) = self.preview.borrow_mut().take(node_id) else {
            return;
        };
        let mut graph = self.graph.borrow_mut();
        let Some(position) = graph.node(node_id).map(|n| n.position) else {
            tracing::warn!(node_id, "transform ended for unknown node");
            return;
        };
        graph.set_node_position(node_id, position.translate(transform.dx, transform.dy));
        if let Some(size) = transform.size {
            graph.set_node_size(node_id, size);
        }
        drop(graph);
        self.refresh();
    }

    /// Register a listener called after each commit has been applied, with the
    /// change and the id of the added connection.
    ///
    /// Listeners may read the graph and register further listeners, which
    /// take effect from the next commit.
    pub fn on_commit(&self, listener: impl Fn(&ConnectionChange, Option<ConnectionId>) + 'static) {
        self.commit_listeners.borrow_mut().push(Rc::new(listener));
    }

    // === Pointer handlers ===

    /// Handle a press on a port. Returns `true` if a gesture started, in which
    /// case the UI must not also start a node drag.
    pub fn handle_port_pointer_down(&self, port: PortRef, event: &PointerEvent) -> bool {
        self.with_context(|machine, ctx| machine.pointer_down_on_port(port, event, ctx))
    }

    /// Handle a press on one end of a committed connection.
    pub fn handle_connection_end_pointer_down(
        &self,
        connection_id: ConnectionId,
        end: ConnectionEnd,
        event: &PointerEvent,
    ) -> bool {
        self.with_context(|machine, ctx| {
            machine.pointer_down_on_connection_end(connection_id, end, event, ctx)
        })
    }

    /// Handle pointer movement; returns the live preview in world space.
    pub fn handle_pointer_move(&self, event: &PointerEvent) -> Option<RenderContext> {
        let preview = self.with_context(|machine, ctx| machine.pointer_move(event, ctx));
        if preview.is_some() {
            self.refresh();
        }
        preview
    }

    /// Handle pointer release, applying any commit to the graph in one step.
    pub fn handle_pointer_up(&self, event: &PointerEvent) -> WiringOutcome {
        let outcome = self.with_context(|machine, ctx| machine.pointer_up(event, ctx));
        if let WiringOutcome::Committed(change) = &outcome {
            let added = self.graph.borrow_mut().apply_change(change);
            let listeners: Vec<CommitListener> = self.commit_listeners.borrow().clone();
            for listener in listeners {
                listener(change, added);
            }
        }
        self.refresh();
        outcome
    }

    /// Handle loss of pointer capture or an explicit abort.
    pub fn handle_pointer_cancel(&self) -> bool {
        let cancelled = self.machine.borrow_mut().cancel();
        if cancelled {
            self.refresh();
        }
        cancelled
    }

    // === Callback factories ===

    /// Returns a callback for `port-pointer-down(node-id, port-id, x, y) -> bool`.
    pub fn port_pointer_down_callback(&self) -> impl Fn(i32, i32, f32, f32) -> bool + Clone {
        let ctrl = self.clone();
        move |node_id, port_id, x, y| {
            ctrl.handle_port_pointer_down(PortRef::new(node_id, port_id), &PointerEvent::at(x, y))
        }
    }

    /// Returns a callback for `pointer-moved(x, y)`.
    pub fn pointer_move_callback(&self) -> impl Fn(f32, f32) + Clone {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.handle_pointer_move(&PointerEvent::at(x, y));
        }
    }

    /// Returns a callback for `pointer-released(x, y)`.
    pub fn pointer_up_callback(&self) -> impl Fn(f32, f32) + Clone {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.handle_pointer_up(&PointerEvent::at(x, y));
        }
    }

    /// Returns a callback for `pointer-cancelled()`.
    pub fn pointer_cancel_callback(&self) -> impl Fn() + Clone {
        let ctrl = self.clone();
        move || {
            ctrl.handle_pointer_cancel();
        }
    }

    /// Returns a callback for `compute-link-path(connection-id)`.
    pub fn compute_link_path_callback(&self) -> impl Fn(i32) -> SharedString + Clone {
        let ctrl = self.clone();
        move |connection_id| ctrl.compute_link_path(connection_id)
    }

    // === Rendering ===

    /// Every committed link plus the active preview, in world space.
    pub fn render_contexts(&self) -> Vec<RenderContext> {
        self.with_context(|machine, ctx| machine.render_contexts(ctx))
    }

    /// Same as [`render_contexts`](Self::render_contexts), mapped to screen space.
    pub fn screen_render_contexts(&self) -> Vec<RenderContext> {
        let viewport = self.viewport();
        self.render_contexts()
            .into_iter()
            .map(|ctx| to_screen(ctx, &viewport))
            .collect()
    }

    /// Screen-space path of a committed connection, empty if it cannot be resolved.
    pub fn compute_link_path(&self, connection_id: ConnectionId) -> SharedString {
        let viewport = self.viewport();
        let graph = self.graph.borrow();
        let Some(connection) = graph.connection(connection_id) else {
            return SharedString::default();
        };
        connection_context(connection, &*graph, &self.resolver.borrow(), &self.preview.borrow())
            .map(|ctx| to_screen(ctx, &viewport).path_commands())
            .unwrap_or_default()
            .into()
    }

    /// Bind a Slint model that receives screen-space link paths on every change.
    pub fn bind_model<P, F>(&self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(&RenderContext, SharedString) -> P + 'static,
    {
        self.sync.borrow_mut().bind_model(model, constructor);
        self.refresh();
    }

    /// Re-sync the bound model, e.g. after the graph was edited directly.
    pub fn refresh(&self) {
        if !self.sync.borrow().is_bound() {
            return;
        }
        let contexts = self.screen_render_contexts();
        self.sync.borrow().sync(&contexts);
    }

    // === Screen-space hit-testing facades ===

    /// Find the connection under a screen-space position.
    pub fn find_connection_at_screen(&self, x: f32, y: f32) -> Option<ConnectionId> {
        let viewport = self.viewport();
        let config = self.config();
        let point = viewport.screen_to_canvas(x, y);
        let links: Vec<SimpleLinkGeometry> = self
            .render_contexts()
            .into_iter()
            .filter_map(|ctx| {
                Some(SimpleLinkGeometry {
                    id: ctx.connection_id?,
                    curve: ctx.curve(),
                })
            })
            .collect();
        find_connection_at(point, links, config.hover_tolerance, config.hit_samples)
    }

    /// Find the port of a visible node under a screen-space position.
    pub fn find_port_at_screen(&self, x: f32, y: f32) -> Option<PortRef> {
        let viewport = self.viewport();
        let point = viewport.screen_to_canvas(x, y);
        let radius = self.config().snap_radius;
        let graph = self.graph.borrow();
        let resolver = self.resolver.borrow();
        let preview = self.preview.borrow();
        let overrides = AnchorOverrides::live();

        let ports: Vec<(PortRef, Point)> = graph
            .node_ids()
            .into_iter()
            .filter(|id| graph.node(*id).is_some_and(|n| n.visible))
            .flat_map(|id| graph.ports_for_node(id).iter().map(Port::port_ref))
            .filter_map(|port| {
                resolver
                    .resolve_port(&*graph, port, &overrides, &preview)
                    .map(|anchor| (port, anchor.connection_point))
            })
            .collect();
        find_port_at(point, ports, radius)
    }

    /// Port ids of a node, in declaration order.
    pub fn port_ids(&self, node_id: NodeId) -> Vec<PortId> {
        self.graph
            .borrow()
            .ports_for_node(node_id)
            .iter()
            .map(|p| p.id)
            .collect()
    }

    fn with_context<R>(
        &self,
        f: impl FnOnce(&mut WiringStateMachine, &WiringContext<'_, GraphStore>) -> R,
    ) -> R {
        let graph = self.graph.borrow();
        let resolver = self.resolver.borrow();
        let preview = self.preview.borrow();
        let capabilities = self.capabilities.borrow();
        let viewport = self.viewport();
        let ctx = WiringContext {
            graph: &*graph,
            capabilities: &*capabilities,
            resolver: &*resolver,
            preview: &*preview,
            transform: &viewport,
        };
        f(&mut self.machine.borrow_mut(), &ctx)
    }
}

fn to_screen(ctx: RenderContext, viewport: &Viewport) -> RenderContext {
    RenderContext {
        from_position: viewport.canvas_to_screen(ctx.from_position),
        to_position: viewport.canvas_to_screen(ctx.to_position),
        ..ctx
    }
}
