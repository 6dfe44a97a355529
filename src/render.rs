//! The contract toward the presentational layer.
//!
//! Each preview tick or commit yields [`RenderContext`] values: two endpoints,
//! the ports they belong to, and the phase of the link. Styling never crosses
//! this boundary. [`RenderModelSync`] pushes contexts into a Slint `VecModel`
//! so a `for` loop in the UI can draw them.

use crate::geometry::{Point, Side};
use crate::graph::{ConnectionId, PortRef};
use crate::path::CubicBezier;
use slint::{Model, SharedString, VecModel};
use std::rc::Rc;

/// Lifecycle phase of a rendered link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    /// A new link following the pointer.
    Connecting,
    /// An existing link whose grabbed end follows the pointer.
    Disconnecting,
    /// A committed link at rest.
    Connected,
}

/// Everything needed to draw one link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    /// Committed connection this link draws, if any.
    pub connection_id: Option<ConnectionId>,
    pub from_position: Point,
    pub to_position: Point,
    pub from_port: Option<PortRef>,
    /// `None` while the free end is not over a candidate.
    pub to_port: Option<PortRef>,
    pub from_side: Option<Side>,
    pub to_side: Option<Side>,
    pub phase: RenderPhase,
    pub is_dragging: bool,
}

impl RenderContext {
    /// Bezier between the two endpoints, exiting along their sides.
    pub fn curve(&self) -> CubicBezier {
        CubicBezier::between(self.from_position, self.to_position, self.from_side, self.to_side)
    }

    /// SVG path commands for the curve.
    pub fn path_commands(&self) -> String {
        self.curve().to_path_commands()
    }
}

trait ModelSyncer {
    fn sync(&self, contexts: &[RenderContext]);
}

struct ConcreteModelSyncer<P, F> {
    model: Rc<VecModel<P>>,
    constructor: F,
}

impl<P, F> ModelSyncer for ConcreteModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(&RenderContext, SharedString) -> P,
{
    fn sync(&self, contexts: &[RenderContext]) {
        // Update existing rows or add new ones
        for (i, ctx) in contexts.iter().enumerate() {
            let item = (self.constructor)(ctx, SharedString::from(ctx.path_commands().as_str()));
            if i < self.model.row_count() {
                self.model.set_row_data(i, item);
            } else {
                self.model.push(item);
            }
        }
        // Remove excess rows
        while self.model.row_count() > contexts.len() {
            self.model.remove(self.model.row_count() - 1);
        }
    }
}

/// Optional binding of render contexts to a Slint model.
///
/// ```ignore
/// let model = Rc::new(VecModel::<LinkPath>::default());
/// sync.bind_model(model.clone(), |ctx, path| LinkPath {
///     id: ctx.connection_id.unwrap_or(-1),
///     path_commands: path,
///     dragging: ctx.is_dragging,
/// });
/// window.set_link_paths(ModelRc::from(model));
/// ```
#[derive(Default)]
pub struct RenderModelSync {
    syncer: Option<Box<dyn ModelSyncer>>,
}

impl RenderModelSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to a Slint model. Rows are updated in place on every [`sync`](Self::sync).
    pub fn bind_model<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(&RenderContext, SharedString) -> P + 'static,
    {
        self.syncer = Some(Box::new(ConcreteModelSyncer { model, constructor }));
    }

    pub fn unbind(&mut self) {
        self.syncer = None;
    }

    pub fn is_bound(&self) -> bool {
        self.syncer.is_some()
    }

    /// Push `contexts` into the bound model, if any.
    pub fn sync(&self, contexts: &[RenderContext]) {
        if let Some(syncer) = &self.syncer {
            syncer.sync(contexts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(id: ConnectionId, to_x: f32) -> RenderContext {
        RenderContext {
            connection_id: Some(id),
            from_position: Point::new(0.0, 0.0),
            to_position: Point::new(to_x, 0.0),
            from_port: Some(PortRef::new(1, 1)),
            to_port: Some(PortRef::new(2, 1)),
            from_side: Some(Side::Right),
            to_side: Some(Side::Left),
            phase: RenderPhase::Connected,
            is_dragging: false,
        }
    }

    #[test]
    fn test_path_commands_start_at_from_position() {
        let ctx = context(1, 100.0);
        let path = ctx.path_commands();
        assert!(path.starts_with("M 0 0 C"));
        assert!(path.ends_with("100 0"));
    }

    #[test]
    fn test_unbound_sync_is_noop() {
        let sync = RenderModelSync::new();
        assert!(!sync.is_bound());
        sync.sync(&[context(1, 100.0)]);
    }

    #[test]
    fn test_sync_updates_rows_in_place_and_trims() {
        let model = Rc::new(VecModel::<(i32, SharedString)>::default());
        let mut sync = RenderModelSync::new();
        sync.bind_model(model.clone(), |ctx, path| (ctx.connection_id.unwrap_or(-1), path));

        sync.sync(&[context(1, 100.0), context(2, 200.0), context(3, 300.0)]);
        assert_eq!(model.row_count(), 3);

        sync.sync(&[context(7, 50.0)]);
        assert_eq!(model.row_count(), 1);
        let (id, path) = model.row_data(0).unwrap();
        assert_eq!(id, 7);
        assert!(path.as_str().ends_with("50 0"));
    }

    #[test]
    fn test_unbind_stops_syncing() {
        let model = Rc::new(VecModel::<(i32, SharedString)>::default());
        let mut sync = RenderModelSync::new();
        sync.bind_model(model.clone(), |ctx, path| (ctx.connection_id.unwrap_or(-1), path));
        sync.unbind();
        sync.sync(&[context(1, 100.0)]);
        assert_eq!(model.row_count(), 0);
    }
}
