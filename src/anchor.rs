//! Port anchor resolution.
//!
//! An anchor is where a port's connection line terminates. It is derived from
//! the node's effective position and size, which may be previewed while the
//! node is being dragged or resized, and is never stored on the graph.
//!
//! Nodes may register a custom [`PortLayout`]. Its output is cached per
//! `(node id, width, height, sorted port ids)`; when only the node's position
//! changes the cached anchors are translated instead of recomputed, so an
//! expensive layout runs once per drag rather than once per pointer-move.

use crate::geometry::{Point, Side, Size};
use crate::graph::{GraphRead, Node, NodeId, Port, PortId, PortRef};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Default outward clearance between the node boundary and a connection point.
pub const DEFAULT_PORT_STANDOFF: f32 = 4.0;

/// Resolved placement of a port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPosition {
    /// Where the port handle is drawn, relative to the node's top-left corner.
    pub render_position: Point,
    /// Where links terminate, in world space.
    pub connection_point: Point,
    pub facing_side: Side,
}

/// Per-call overrides of a node's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorOverrides {
    pub position: Option<Point>,
    pub size: Option<Size>,
    /// Honour the node's live drag/resize preview, if any.
    pub apply_live_preview: bool,
}

impl AnchorOverrides {
    /// Resolve against committed geometry only.
    pub fn committed() -> Self {
        Self::default()
    }

    /// Resolve against the live preview where one exists.
    pub fn live() -> Self {
        Self {
            apply_live_preview: true,
            ..Self::default()
        }
    }
}

/// Transient transform of a node that is mid-drag or mid-resize.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeTransform {
    pub dx: f32,
    pub dy: f32,
    pub size: Option<Size>,
}

/// Live previews supplied by the node-manipulation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LivePreview {
    transforms: HashMap<NodeId, NodeTransform>,
}

impl LivePreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the drag offset of a node relative to its committed position.
    pub fn set_drag_offset(&mut self, node_id: NodeId, dx: f32, dy: f32) {
        let transform = self.transforms.entry(node_id).or_default();
        transform.dx = dx;
        transform.dy = dy;
    }

    /// Set the previewed size of a node being resized.
    pub fn set_resize(&mut self, node_id: NodeId, size: Size) {
        self.transforms.entry(node_id).or_default().size = Some(size);
    }

    pub fn clear(&mut self, node_id: NodeId) {
        self.transforms.remove(&node_id);
    }

    /// Remove and return a node's preview, e.g. to commit it.
    pub fn take(&mut self, node_id: NodeId) -> Option<NodeTransform> {
        self.transforms.remove(&node_id)
    }

    pub fn clear_all(&mut self) {
        self.transforms.clear();
    }

    pub fn transform(&self, node_id: NodeId) -> Option<&NodeTransform> {
        self.transforms.get(&node_id)
    }

    pub fn is_transforming(&self, node_id: NodeId) -> bool {
        self.transforms.contains_key(&node_id)
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Node-relative placement of one port, produced by a [`PortLayout`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortPlacement {
    pub port_id: PortId,
    pub position: Point,
    pub side: Side,
}

/// Custom port placement for a node.
///
/// Ports missing from the result fall back to the default side placement.
pub trait PortLayout {
    fn layout(&self, node: &Node, size: Size, ports: &[Port]) -> Vec<PortPlacement>;
}

impl<F> PortLayout for F
where
    F: Fn(&Node, Size, &[Port]) -> Vec<PortPlacement>,
{
    fn layout(&self, node: &Node, size: Size, ports: &[Port]) -> Vec<PortPlacement> {
        self(node, size, ports)
    }
}

/// Default placement: ports spread evenly along their declared side, in
/// declaration order. A lone port sits at the side's midpoint.
pub fn default_placement(size: Size, ports: &[Port], port_id: PortId) -> Option<PortPlacement> {
    let port = ports.iter().find(|p| p.id == port_id)?;
    let mut count = 0usize;
    let mut index = 0usize;
    for p in ports.iter().filter(|p| p.side == port.side) {
        if p.id == port_id {
            index = count;
        }
        count += 1;
    }
    let fraction = (index + 1) as f32 / (count + 1) as f32;
    Some(PortPlacement {
        port_id,
        position: point_on_side(size, port.side, fraction),
        side: port.side,
    })
}

fn point_on_side(size: Size, side: Side, fraction: f32) -> Point {
    match side {
        Side::Left => Point::new(0.0, size.height * fraction),
        Side::Right => Point::new(size.width, size.height * fraction),
        Side::Top => Point::new(size.width * fraction, 0.0),
        Side::Bottom => Point::new(size.width * fraction, size.height),
    }
}

/// Effective node position: override, then live preview, then committed.
pub fn effective_position(node: &Node, overrides: &AnchorOverrides, preview: &LivePreview) -> Point {
    if let Some(position) = overrides.position {
        return position;
    }
    if overrides.apply_live_preview {
        if let Some(t) = preview.transform(node.id) {
            return node.position.translate(t.dx, t.dy);
        }
    }
    node.position
}

/// Effective node size: override, then live preview, then committed.
pub fn effective_size(node: &Node, overrides: &AnchorOverrides, preview: &LivePreview) -> Size {
    if let Some(size) = overrides.size {
        return size;
    }
    if overrides.apply_live_preview {
        if let Some(size) = preview.transform(node.id).and_then(|t| t.size) {
            return size;
        }
    }
    node.size
}

#[derive(Debug, Clone, PartialEq)]
struct LayoutKey {
    width_bits: u32,
    height_bits: u32,
    port_ids: Vec<PortId>,
}

impl LayoutKey {
    fn new(size: Size, ports: &[Port]) -> Self {
        let mut port_ids: Vec<PortId> = ports.iter().map(|p| p.id).collect();
        port_ids.sort_unstable();
        Self {
            width_bits: size.width.to_bits(),
            height_bits: size.height.to_bits(),
            port_ids,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedLayout {
    key: LayoutKey,
    base_position: Point,
    anchors: HashMap<PortId, AnchorPosition>,
}

/// Resolves port anchors, caching custom layouts per node.
pub struct AnchorResolver {
    standoff: f32,
    layouts: HashMap<NodeId, Rc<dyn PortLayout>>,
    cache: RefCell<HashMap<NodeId, CachedLayout>>,
}

impl Default for AnchorResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorResolver {
    pub fn new() -> Self {
        Self {
            standoff: DEFAULT_PORT_STANDOFF,
            layouts: HashMap::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_standoff(mut self, standoff: f32) -> Self {
        self.set_standoff(standoff);
        self
    }

    pub fn set_standoff(&mut self, standoff: f32) {
        self.standoff = standoff;
        self.cache.borrow_mut().clear();
    }

    pub fn standoff(&self) -> f32 {
        self.standoff
    }

    /// Register a custom layout for one node, replacing any previous one.
    pub fn set_layout(&mut self, node_id: NodeId, layout: Rc<dyn PortLayout>) {
        self.layouts.insert(node_id, layout);
        self.invalidate(node_id);
    }

    pub fn remove_layout(&mut self, node_id: NodeId) {
        self.layouts.remove(&node_id);
        self.invalidate(node_id);
    }

    /// Drop the cached layout of a node.
    pub fn invalidate(&self, node_id: NodeId) {
        self.cache.borrow_mut().remove(&node_id);
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Whether a custom layout result is currently cached for the node.
    pub fn is_cached(&self, node_id: NodeId) -> bool {
        self.cache.borrow().contains_key(&node_id)
    }

    /// Resolve the anchor of `port_id` on `node`.
    ///
    /// Returns `None` if the port is not in `ports`.
    pub fn resolve(
        &self,
        node: &Node,
        ports: &[Port],
        port_id: PortId,
        overrides: &AnchorOverrides,
        preview: &LivePreview,
    ) -> Option<AnchorPosition> {
        let position = effective_position(node, overrides, preview);
        let size = effective_size(node, overrides, preview);

        match self.layouts.get(&node.id) {
            Some(layout) => self.resolve_custom(node, ports, port_id, position, size, layout.as_ref()),
            None => {
                let placement = default_placement(size, ports, port_id)?;
                Some(self.anchor_at(position, placement))
            }
        }
    }

    /// Look up node and ports in `graph` and resolve the anchor of `port`.
    pub fn resolve_port<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        port: PortRef,
        overrides: &AnchorOverrides,
        preview: &LivePreview,
    ) -> Option<AnchorPosition> {
        let node = graph.node(port.node_id)?;
        self.resolve(node, graph.ports_for_node(port.node_id), port.port_id, overrides, preview)
    }

    fn anchor_at(&self, node_position: Point, placement: PortPlacement) -> AnchorPosition {
        let world = node_position.translate(placement.position.x, placement.position.y);
        AnchorPosition {
            render_position: placement.position,
            connection_point: world.project(placement.side, self.standoff),
            facing_side: placement.side,
        }
    }

    fn resolve_custom(
        &self,
        node: &Node,
        ports: &[Port],
        port_id: PortId,
        position: Point,
        size: Size,
        layout: &dyn PortLayout,
    ) -> Option<AnchorPosition> {
        if !ports.iter().any(|p| p.id == port_id) {
            return None;
        }
        let key = LayoutKey::new(size, ports);

        if let Some(cached) = self.cache.borrow().get(&node.id) {
            if cached.key == key {
                tracing::trace!(node_id = node.id, "anchor cache hit");
                let dx = position.x - cached.base_position.x;
                let dy = position.y - cached.base_position.y;
                return cached.anchors.get(&port_id).map(|anchor| AnchorPosition {
                    connection_point: anchor.connection_point.translate(dx, dy),
                    ..*anchor
                });
            }
        }

        tracing::trace!(node_id = node.id, "anchor cache miss, running custom layout");
        let placements = layout.layout(node, size, ports);
        let anchors: HashMap<PortId, AnchorPosition> = ports
            .iter()
            .filter_map(|port| {
                let placement = placements
                    .iter()
                    .find(|p| p.port_id == port.id)
                    .copied()
                    .or_else(|| default_placement(size, ports, port.id))?;
                Some((port.id, self.anchor_at(position, placement)))
            })
            .collect();

        let result = anchors.get(&port_id).copied();
        self.cache.borrow_mut().insert(
            node.id,
            CachedLayout {
                key,
                base_position: position,
                anchors,
            },
        );
        result
    }
}
