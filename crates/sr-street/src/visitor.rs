//! Observer hooks for the street search.

use sr_core::{EdgeId, StateId, VertexId};

use crate::router::State;

/// Callbacks invoked synchronously by
/// [`StreetRouter::route_observed`](crate::StreetRouter::route_observed), in
/// expansion order.
///
/// Both methods default to no-ops.  Visitors only observe: nothing they do
/// can change the search order or its results.
pub trait RoutingVisitor {
    /// A state was recorded as the best known label of its vertex and pushed
    /// onto the queue.
    fn on_frontier(&mut self, _id: StateId, _state: &State) {}

    /// A state was popped and its vertex settled.
    fn on_settled(&mut self, _id: StateId, _state: &State) {}
}

impl<V: RoutingVisitor + ?Sized> RoutingVisitor for &mut V {
    fn on_frontier(&mut self, id: StateId, state: &State) {
        (**self).on_frontier(id, state);
    }

    fn on_settled(&mut self, id: StateId, state: &State) {
        (**self).on_settled(id, state);
    }
}

/// A [`RoutingVisitor`] that does nothing.
pub struct NoopVisitor;

impl RoutingVisitor for NoopVisitor {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceKind {
    Frontier,
    Settled,
}

/// One recorded search transition.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TraceEvent {
    pub kind:      TraceKind,
    pub state:     StateId,
    pub vertex:    VertexId,
    pub back_edge: Option<EdgeId>,
    pub weight:    f64,
    pub time_ms:   i64,
}

/// Records every transition of a search, for exploration dumps.
#[derive(Default)]
pub struct TraceVisitor {
    events: Vec<TraceEvent>,
}

impl TraceVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    /// Settle events only, in settle order.
    pub fn settled(&self) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter().filter(|e| e.kind == TraceKind::Settled)
    }

    fn record(&mut self, kind: TraceKind, id: StateId, state: &State) {
        self.events.push(TraceEvent {
            kind,
            state:     id,
            vertex:    state.vertex,
            back_edge: state.back_edge,
            weight:    state.weight,
            time_ms:   state.time_ms,
        });
    }
}

impl RoutingVisitor for TraceVisitor {
    fn on_frontier(&mut self, id: StateId, state: &State) {
        self.record(TraceKind::Frontier, id, state);
    }

    fn on_settled(&mut self, id: StateId, state: &State) {
        self.record(TraceKind::Settled, id, state);
    }
}
