//! Graph data model and the narrow read/mutation interfaces the wiring core uses.
//!
//! The core never assumes a storage layout beyond id lookups: it talks to the
//! graph through [`GraphRead`] and commits through [`GraphMutation`].
//! [`GraphStore`] is a plain in-memory implementation of both.

use crate::geometry::{Point, Side, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type NodeId = i32;
pub type PortId = i32;
pub type ConnectionId = i32;

/// Identity of a port: `(node_id, port_id)`.
///
/// Ordered by node then port; this order is the tie-break whenever two
/// candidates are otherwise indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortRef {
    pub node_id: NodeId,
    pub port_id: PortId,
}

impl PortRef {
    pub const fn new(node_id: NodeId, port_id: PortId) -> Self {
        Self { node_id, port_id }
    }
}

/// Whether a port emits or receives connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortRole {
    Input,
    Output,
}

/// A typed attachment point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    pub node_id: NodeId,
    pub role: PortRole,
    pub side: Side,
    /// Untyped ports connect to any data type.
    pub data_type: Option<String>,
    /// `None` means unlimited, `Some(1)` exclusive.
    pub max_connections: Option<usize>,
    pub allowed_peer_node_types: Option<Vec<String>>,
    pub allowed_peer_port_types: Option<Vec<String>>,
}

impl Port {
    pub fn new(node_id: NodeId, id: PortId, role: PortRole, side: Side) -> Self {
        Self {
            id,
            node_id,
            role,
            side,
            data_type: None,
            max_connections: None,
            allowed_peer_node_types: None,
            allowed_peer_port_types: None,
        }
    }

    /// Input port on the left side.
    pub fn input(node_id: NodeId, id: PortId) -> Self {
        Self::new(node_id, id, PortRole::Input, Side::Left)
    }

    /// Output port on the right side.
    pub fn output(node_id: NodeId, id: PortId) -> Self {
        Self::new(node_id, id, PortRole::Output, Side::Right)
    }

    pub fn on_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    pub fn with_allowed_peer_node_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_peer_node_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_allowed_peer_port_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_peer_port_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn port_ref(&self) -> PortRef {
        PortRef::new(self.node_id, self.id)
    }
}

/// The geometry-relevant slice of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: String,
    pub position: Point,
    pub size: Size,
    pub visible: bool,
    pub locked: bool,
    pub parent_id: Option<NodeId>,
}

impl Node {
    pub fn new(id: NodeId, node_type: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            position,
            size,
            visible: true,
            locked: false,
            parent_id: None,
        }
    }
}

/// Which end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionEnd {
    From,
    To,
}

impl ConnectionEnd {
    pub fn other(self) -> ConnectionEnd {
        match self {
            ConnectionEnd::From => ConnectionEnd::To,
            ConnectionEnd::To => ConnectionEnd::From,
        }
    }
}

/// A committed edge, always stored as output port -> input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from_node_id: NodeId,
    pub from_port_id: PortId,
    pub to_node_id: NodeId,
    pub to_port_id: PortId,
}

impl Connection {
    pub fn new(id: ConnectionId, from: PortRef, to: PortRef) -> Self {
        Self {
            id,
            from_node_id: from.node_id,
            from_port_id: from.port_id,
            to_node_id: to.node_id,
            to_port_id: to.port_id,
        }
    }

    pub fn from(&self) -> PortRef {
        PortRef::new(self.from_node_id, self.from_port_id)
    }

    pub fn to(&self) -> PortRef {
        PortRef::new(self.to_node_id, self.to_port_id)
    }

    pub fn end(&self, end: ConnectionEnd) -> PortRef {
        match end {
            ConnectionEnd::From => self.from(),
            ConnectionEnd::To => self.to(),
        }
    }

    pub fn touches(&self, port: PortRef) -> bool {
        self.from() == port || self.to() == port
    }

    pub fn touches_node(&self, node_id: NodeId) -> bool {
        self.from_node_id == node_id || self.to_node_id == node_id
    }
}

/// A connection that has been admitted but not yet assigned an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionRequest {
    pub from: PortRef,
    pub to: PortRef,
}

/// One atomic graph mutation: remove the listed connections, then add one.
///
/// Applied through [`GraphMutation::apply_change`] as a single transition so
/// a replace never exposes an intermediate state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionChange {
    pub remove: Vec<ConnectionId>,
    pub add: Option<ConnectionRequest>,
}

impl ConnectionChange {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_none()
    }
}

/// Read-only snapshot access to the committed graph.
pub trait GraphRead {
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// All node ids in ascending order.
    fn node_ids(&self) -> Vec<NodeId>;

    /// Ports of a node in declaration order; empty for unknown nodes.
    fn ports_for_node(&self, id: NodeId) -> &[Port];

    fn connections(&self) -> &[Connection];

    fn port(&self, port: PortRef) -> Option<&Port> {
        self.ports_for_node(port.node_id)
            .iter()
            .find(|p| p.id == port.port_id)
    }

    fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections().iter().find(|c| c.id == id)
    }

    /// Number of connections attached to `port`, not counting `ignore`.
    fn connection_count(&self, port: PortRef, ignore: Option<ConnectionId>) -> usize {
        self.connections()
            .iter()
            .filter(|c| Some(c.id) != ignore && c.touches(port))
            .count()
    }

    /// Ids of connections attached to `port`, not counting `ignore`.
    fn connections_at(&self, port: PortRef, ignore: Option<ConnectionId>) -> Vec<ConnectionId> {
        self.connections()
            .iter()
            .filter(|c| Some(c.id) != ignore && c.touches(port))
            .map(|c| c.id)
            .collect()
    }
}

/// Mutation interface used to commit admitted connection changes.
pub trait GraphMutation {
    /// Insert a connection with the given endpoints, returning its new id.
    fn add_connection(&mut self, request: ConnectionRequest) -> ConnectionId;

    fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection>;

    /// Apply removals and the addition as one transition.
    ///
    /// Returns the id of the added connection, if any.
    fn apply_change(&mut self, change: &ConnectionChange) -> Option<ConnectionId> {
        for id in &change.remove {
            self.remove_connection(*id);
        }
        change.add.map(|request| self.add_connection(request))
    }
}

/// In-memory normalized graph: nodes, their ports and committed connections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphStore {
    nodes: HashMap<NodeId, Node>,
    ports: HashMap<NodeId, Vec<Port>>,
    connections: Vec<Connection>,
    /// Position of each connection in `connections`.
    connection_index: HashMap<ConnectionId, usize>,
    next_connection_id: ConnectionId,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            next_connection_id: 1,
            ..Default::default()
        }
    }

    /// Insert or replace a node together with its port list.
    ///
    /// Replacing a node prunes connections to ports it no longer has.
    pub fn add_node(&mut self, node: Node, ports: Vec<Port>) {
        let id = node.id;
        self.nodes.insert(id, node);
        self.set_ports(id, ports);
    }

    /// Remove a node and every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        self.ports.remove(&id);
        self.connections.retain(|c| !c.touches_node(id));
        self.reindex();
        Some(node)
    }

    /// Replace a node's ports, pruning connections to ports that disappeared.
    pub fn set_ports(&mut self, node_id: NodeId, ports: Vec<Port>) {
        let ports: Vec<Port> = ports
            .into_iter()
            .map(|mut p| {
                p.node_id = node_id;
                p
            })
            .collect();
        self.ports.insert(node_id, ports);
        self.prune_orphans();
    }

    pub fn set_node_position(&mut self, id: NodeId, position: Point) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_node_size(&mut self, id: NodeId, size: Size) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.size = size;
                true
            }
            None => false,
        }
    }

    pub fn set_node_visible(&mut self, id: NodeId, visible: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_len(&self) -> usize {
        self.connections.len()
    }

    fn prune_orphans(&mut self) {
        let nodes = &self.nodes;
        let ports = &self.ports;
        let exists = |port: PortRef| {
            nodes.contains_key(&port.node_id)
                && ports
                    .get(&port.node_id)
                    .is_some_and(|list| list.iter().any(|p| p.id == port.port_id))
        };
        self.connections.retain(|c| exists(c.from()) && exists(c.to()));
        self.reindex();
    }

    fn reindex(&mut self) {
        self.connection_index = self
            .connections
            .iter()
            .enumerate()
            .map(|(index, c)| (c.id, index))
            .collect();
    }
}

impl GraphRead for GraphStore {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn ports_for_node(&self, id: NodeId) -> &[Port] {
        self.ports.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn connections(&self) -> &[Connection] {
        &self.connections
    }

    fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connection_index
            .get(&id)
            .and_then(|index| self.connections.get(*index))
    }
}

impl GraphMutation for GraphStore {
    fn add_connection(&mut self, request: ConnectionRequest) -> ConnectionId {
        let id = self.next_connection_id.max(1);
        self.next_connection_id = id + 1;
        self.connection_index.insert(id, self.connections.len());
        self.connections.push(Connection::new(id, request.from, request.to));
        id
    }

    fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let index = self.connection_index.remove(&id)?;
        let removed = self.connections.remove(index);
        for (offset, later) in self.connections[index..].iter().enumerate() {
            self.connection_index.insert(later.id, index + offset);
        }
        Some(removed)
    }
}
