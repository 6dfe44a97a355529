//! Connectivity policy: which ports may be joined, and what happens to the
//! connections already sitting on the port a link is dropped onto.
//!
//! Everything here is pure. Rejections are values ([`ValidationError`]),
//! never panics, and a rejected drop plans as [`SwitchBehavior::Ignore`].

use crate::config::WiringConfig;
use crate::graph::{
    ConnectionId, ConnectionRequest, GraphRead, Node, NodeId, Port, PortRef, PortRole,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use thiserror::Error;

/// Reasons why a connection was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("port {}:{} not found", .0.node_id, .0.port_id)]
    PortNotFound(PortRef),
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("node {0} is hidden")]
    NodeHidden(NodeId),
    #[error("cannot connect a port to itself")]
    SamePort,
    #[error("cannot connect ports on the same node")]
    SelfLoop,
    #[error("must connect an output to an input")]
    IncompatibleRole,
    #[error("type mismatch: expected {expected}, found {found}")]
    DataTypeMismatch { expected: String, found: String },
    #[error("port {}:{} does not accept nodes of type {node_type}", .port.node_id, .port.port_id)]
    PeerNodeTypeNotAllowed { port: PortRef, node_type: String },
    #[error("port {}:{} does not accept data type {data_type}", .port.node_id, .port.port_id)]
    PeerPortTypeNotAllowed { port: PortRef, data_type: String },
    #[error("connection already exists")]
    DuplicateConnection,
    #[error("port {}:{} has reached max {max} connections", .port.node_id, .port.port_id)]
    CapacityExceeded { port: PortRef, max: usize },
    #[error("connection would create a cycle")]
    CreatesCycle,
    #[error("{0}")]
    Custom(String),
}

pub type ValidationResult = Result<(), ValidationError>;

/// Custom validation hook, typically supplied per node type.
///
/// Receives the normalized `output -> input` request and read access to the graph.
pub trait ConnectionValidator {
    fn validate(&self, request: &ConnectionRequest, graph: &dyn GraphRead) -> ValidationResult;
}

impl<F> ConnectionValidator for F
where
    F: Fn(&ConnectionRequest, &dyn GraphRead) -> ValidationResult,
{
    fn validate(&self, request: &ConnectionRequest, graph: &dyn GraphRead) -> ValidationResult {
        self(request, graph)
    }
}

/// Composite validator that combines multiple validators
///
/// All validators must accept. Returns the first error encountered.
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn ConnectionValidator>>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator to the composite
    ///
    /// Validators are checked in the order they were added.
    pub fn add<V: ConnectionValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl ConnectionValidator for CompositeValidator {
    fn validate(&self, request: &ConnectionRequest, graph: &dyn GraphRead) -> ValidationResult {
        self.validators
            .iter()
            .try_for_each(|v| v.validate(request, graph))
    }
}

/// What a node type declares about itself.
#[derive(Clone, Default)]
pub struct NodeTypeCapabilities {
    pub ports: Vec<Port>,
    pub validator: Option<Rc<dyn ConnectionValidator>>,
}

/// Lookup of node type capabilities.
///
/// Unknown types return `None` and only structural checks apply.
pub trait CapabilityRegistry {
    fn capabilities(&self, node_type: &str) -> Option<&NodeTypeCapabilities>;
}

/// Registry that knows no node types.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapabilities;

impl CapabilityRegistry for NoCapabilities {
    fn capabilities(&self, _node_type: &str) -> Option<&NodeTypeCapabilities> {
        None
    }
}

impl CapabilityRegistry for HashMap<String, NodeTypeCapabilities> {
    fn capabilities(&self, node_type: &str) -> Option<&NodeTypeCapabilities> {
        self.get(node_type)
    }
}

/// The fixed end of an in-progress gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragContext {
    /// Port the drag started from (or the anchored end of a re-dragged link).
    pub origin: PortRef,
    /// Connection being re-dragged; excluded from every count and duplicate check.
    pub moving_connection: Option<ConnectionId>,
}

impl DragContext {
    pub fn new(origin: PortRef) -> Self {
        Self {
            origin,
            moving_connection: None,
        }
    }

    pub fn moving(origin: PortRef, connection: ConnectionId) -> Self {
        Self {
            origin,
            moving_connection: Some(connection),
        }
    }
}

/// Outcome class of dropping a link on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchBehavior {
    /// Not admissible; nothing changes.
    Ignore,
    /// Exclusive target already occupied; its connections are swapped out.
    Replace,
    /// Target has room; the new connection is added alongside existing ones.
    Append,
}

/// Decision for a drop, ready to be turned into a graph mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPlan {
    pub behavior: SwitchBehavior,
    pub connection: Option<ConnectionRequest>,
    pub connection_ids_to_replace: Vec<ConnectionId>,
    pub rejection: Option<ValidationError>,
}

impl ConnectionPlan {
    fn ignore(reason: ValidationError) -> Self {
        Self {
            behavior: SwitchBehavior::Ignore,
            connection: None,
            connection_ids_to_replace: Vec::new(),
            rejection: Some(reason),
        }
    }

    pub fn is_admitted(&self) -> bool {
        self.behavior != SwitchBehavior::Ignore
    }
}

/// Structural connection rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionPolicy {
    pub allow_self_loops: bool,
    pub forbid_cycles: bool,
    pub allow_duplicate_connections: bool,
}

impl ConnectionPolicy {
    pub fn from_config(config: &WiringConfig) -> Self {
        Self {
            allow_self_loops: config.allow_self_loops,
            forbid_cycles: config.forbid_cycles,
            allow_duplicate_connections: config.allow_duplicate_connections,
        }
    }

    /// Check whether `candidate` may receive the drag described by `ctx`.
    pub fn validate<G: GraphRead>(
        &self,
        candidate: PortRef,
        ctx: &DragContext,
        graph: &G,
        capabilities: &dyn CapabilityRegistry,
    ) -> ValidationResult {
        self.admit(candidate, ctx, graph, capabilities).map(|_| ())
    }

    pub fn is_connectable<G: GraphRead>(
        &self,
        candidate: PortRef,
        ctx: &DragContext,
        graph: &G,
        capabilities: &dyn CapabilityRegistry,
    ) -> bool {
        self.admit(candidate, ctx, graph, capabilities).is_ok()
    }

    /// Decide what dropping the drag on `target` does.
    ///
    /// The target (the port the pointer was released over) governs replace
    /// versus append; the origin's capacity was already checked in [`Self::validate`].
    pub fn plan_connection_change<G: GraphRead>(
        &self,
        ctx: &DragContext,
        target: PortRef,
        graph: &G,
        capabilities: &dyn CapabilityRegistry,
    ) -> ConnectionPlan {
        let request = match self.admit(target, ctx, graph, capabilities) {
            Ok(request) => request,
            Err(reason) => {
                tracing::debug!(?target, %reason, "connection rejected");
                return ConnectionPlan::ignore(reason);
            }
        };

        let exclusive = graph
            .port(target)
            .is_some_and(|port| port.max_connections == Some(1));
        let existing = graph.connections_at(target, ctx.moving_connection);

        let behavior = if exclusive && !existing.is_empty() {
            SwitchBehavior::Replace
        } else {
            SwitchBehavior::Append
        };

        ConnectionPlan {
            behavior,
            connection: Some(request),
            connection_ids_to_replace: if behavior == SwitchBehavior::Replace {
                existing
            } else {
                Vec::new()
            },
            rejection: None,
        }
    }

    /// Every port that may receive the drag, in ascending [`PortRef`] order.
    pub fn eligible_candidates<G: GraphRead>(
        &self,
        ctx: &DragContext,
        graph: &G,
        capabilities: &dyn CapabilityRegistry,
    ) -> Vec<PortRef> {
        let mut candidates: Vec<PortRef> = graph
            .node_ids()
            .into_iter()
            .flat_map(|node_id| graph.ports_for_node(node_id).iter().map(Port::port_ref))
            .filter(|port| self.is_connectable(*port, ctx, graph, capabilities))
            .collect();
        candidates.sort_unstable();
        candidates
    }

    fn admit<G: GraphRead>(
        &self,
        candidate: PortRef,
        ctx: &DragContext,
        graph: &G,
        capabilities: &dyn CapabilityRegistry,
    ) -> Result<ConnectionRequest, ValidationError> {
        if candidate == ctx.origin {
            return Err(ValidationError::SamePort);
        }

        let origin_port = graph
            .port(ctx.origin)
            .ok_or(ValidationError::PortNotFound(ctx.origin))?;
        let candidate_port = graph
            .port(candidate)
            .ok_or(ValidationError::PortNotFound(candidate))?;
        let origin_node = graph
            .node(ctx.origin.node_id)
            .ok_or(ValidationError::NodeNotFound(ctx.origin.node_id))?;
        let candidate_node = graph
            .node(candidate.node_id)
            .ok_or(ValidationError::NodeNotFound(candidate.node_id))?;

        if !candidate_node.visible {
            return Err(ValidationError::NodeHidden(candidate_node.id));
        }
        if candidate.node_id == ctx.origin.node_id && !self.allow_self_loops {
            return Err(ValidationError::SelfLoop);
        }
        if origin_port.role == candidate_port.role {
            return Err(ValidationError::IncompatibleRole);
        }

        let (output, input) = if origin_port.role == PortRole::Output {
            (origin_port, candidate_port)
        } else {
            (candidate_port, origin_port)
        };

        if let (Some(found), Some(expected)) = (&output.data_type, &input.data_type) {
            if found != expected {
                return Err(ValidationError::DataTypeMismatch {
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }

        check_peer(origin_port, candidate_node, candidate_port)?;
        check_peer(candidate_port, origin_node, origin_port)?;

        let request = ConnectionRequest {
            from: output.port_ref(),
            to: input.port_ref(),
        };

        if !self.allow_duplicate_connections
            && graph.connections().iter().any(|c| {
                Some(c.id) != ctx.moving_connection && c.from() == request.from && c.to() == request.to
            })
        {
            return Err(ValidationError::DuplicateConnection);
        }

        if let Some(max) = origin_port.max_connections {
            if graph.connection_count(ctx.origin, ctx.moving_connection) >= max {
                return Err(ValidationError::CapacityExceeded {
                    port: ctx.origin,
                    max,
                });
            }
        }

        // An exclusive port that is already occupied is resolved by replacement.
        if let Some(max) = candidate_port.max_connections {
            let count = graph.connection_count(candidate, ctx.moving_connection);
            if count >= max && max != 1 {
                return Err(ValidationError::CapacityExceeded {
                    port: candidate,
                    max,
                });
            }
        }

        if self.forbid_cycles
            && reaches(graph, request.to.node_id, request.from.node_id, ctx.moving_connection)
        {
            return Err(ValidationError::CreatesCycle);
        }

        let graph_dyn: &dyn GraphRead = graph;
        for node in [origin_node, candidate_node] {
            if let Some(validator) = capabilities
                .capabilities(&node.node_type)
                .and_then(|caps| caps.validator.as_ref())
            {
                validator.validate(&request, graph_dyn)?;
            }
        }

        Ok(request)
    }
}

/// Check `port`'s restrictions against the peer it would be joined to.
fn check_peer(port: &Port, peer_node: &Node, peer_port: &Port) -> ValidationResult {
    if let Some(allowed) = &port.allowed_peer_node_types {
        if !allowed.iter().any(|t| *t == peer_node.node_type) {
            return Err(ValidationError::PeerNodeTypeNotAllowed {
                port: port.port_ref(),
                node_type: peer_node.node_type.clone(),
            });
        }
    }
    if let (Some(allowed), Some(data_type)) = (&port.allowed_peer_port_types, &peer_port.data_type) {
        if !allowed.iter().any(|t| t == data_type) {
            return Err(ValidationError::PeerPortTypeNotAllowed {
                port: port.port_ref(),
                data_type: data_type.clone(),
            });
        }
    }
    Ok(())
}

/// Whether `target` is reachable from `start` along committed connections.
fn reaches<G: GraphRead>(graph: &G, start: NodeId, target: NodeId, ignore: Option<ConnectionId>) -> bool {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        if node == target {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        queue.extend(
            graph
                .connections()
                .iter()
                .filter(|c| Some(c.id) != ignore && c.from_node_id == node)
                .map(|c| c.to_node_id),
        );
    }
    false
}
