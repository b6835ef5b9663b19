//! Label-setting (Dijkstra) street search with mid-edge origins and
//! destinations.
//!
//! # Per-query state
//!
//! A [`StreetRouter`] borrows the immutable [`StreetLayer`] and owns
//! everything it mutates: the priority queue, the best-label table, the
//! settled set and an arena of [`State`]s.  Predecessor links are
//! [`StateId`]s into that arena, so a whole search tree is dropped at once
//! with the router and nothing is shared between concurrent queries.
//!
//! # Vertex lifecycle
//!
//! `UNVISITED → FRONTIER → SETTLED`.  A vertex enters the frontier when a
//! state with a strictly lower weight than its current label is pushed, and
//! is settled the first time one of its states is popped.  Queue entries for
//! vertices that are already settled are skipped (lazy deletion).  Equal
//! weights pop in insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;

use sr_core::{EdgeId, Mode, StateId, VertexId};

use crate::cost::CostModel;
use crate::edge::Edge;
use crate::layer::StreetLayer;
use crate::split::Split;
use crate::visitor::{NoopVisitor, RoutingVisitor};
use crate::{RouterError, StreetResult};

/// Default search radius for snapping coordinates to edges, in metres.
pub const DEFAULT_RADIUS_M: f64 = 200.0;

// ── State ─────────────────────────────────────────────────────────────────────

/// One label of the search tree.
///
/// Vertex states sit on `vertex`.  The states returned by
/// [`StreetRouter::get_state`] lie mid-edge at a split; for those, `vertex`
/// is the from-vertex of the partially traversed `back_edge`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct State {
    pub vertex:     VertexId,
    /// Cumulative generalized cost, in seconds.
    pub weight:     f64,
    /// Arrival time in milliseconds (query start time + travel time).
    pub time_ms:    i64,
    pub back_edge:  Option<EdgeId>,
    pub back_state: Option<StateId>,
}

// ── Limits & outcome ──────────────────────────────────────────────────────────

/// Caller-supplied bounds on search work.  `None` means unbounded.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchLimits {
    /// Stop after this many vertices have been settled.
    pub max_settled: Option<usize>,
    /// Never record states heavier than this.
    pub max_weight:  Option<f64>,
}

/// Why a search stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    /// The queue ran empty: a full shortest-path tree was computed.
    Exhausted,
    /// Both endpoints of the destination split were settled.
    ReachedDestination,
    /// `max_settled` was hit with an unsettled vertex still queued.
    SettledLimit,
    /// The queue ran empty but some vertex was only reachable above
    /// `max_weight`.
    WeightLimit,
}

impl SearchStatus {
    /// `true` when every reported label is final and no reachable vertex
    /// was cut off.
    pub fn is_complete(self) -> bool {
        matches!(self, SearchStatus::Exhausted | SearchStatus::ReachedDestination)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchSummary {
    pub status:  SearchStatus,
    pub settled: usize,
    pub states:  usize,
}

// ── Queue entry ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct QueueEntry {
    weight: f64,
    seq:    u64,
    state:  StateId,
}

impl Ord for QueueEntry {
    /// Reversed so `BinaryHeap` (a max-heap) pops the lowest weight first,
    /// then the earliest insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

#[derive(Copy, Clone, Debug)]
enum Origin {
    Split(Split),
    Vertex(VertexId),
}

#[inline]
fn secs_to_ms(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

// ── StreetRouter ──────────────────────────────────────────────────────────────

/// A single street search.  Create one per query.
///
/// ```
/// use sr_core::{GeoPoint, Mode};
/// use sr_street::{EdgeAttrs, PermissionFlags, Street, StreetLayerBuilder, StreetRouter};
///
/// let mut b = StreetLayerBuilder::new();
/// let a = b.add_vertex(GeoPoint::new(45.0, 7.0));
/// let c = b.add_vertex(GeoPoint::new(45.0, 7.01));
/// b.add_street(Street::new(a, c, EdgeAttrs::new(PermissionFlags::PEDESTRIAN, 1.4))).unwrap();
/// let layer = b.build();
///
/// let mut router = StreetRouter::new(&layer, Mode::Walk);
/// assert!(router.set_origin(45.0, 7.002));
/// let dest = layer.find_split(45.0, 7.008, 200.0, Mode::Walk).unwrap();
/// router.route().unwrap();
/// let state = router.get_state(&dest).unwrap();
/// assert!(state.weight > 0.0);
/// ```
pub struct StreetRouter<'a> {
    layer:         &'a StreetLayer,
    mode:          Mode,
    cost:          CostModel,
    limits:        SearchLimits,
    radius_m:      f64,
    start_time_ms: i64,

    origin:      Option<Origin>,
    destination: Option<Split>,

    // ── Per-search state (reset by every route call) ──────────────────────
    states:        Vec<State>,
    /// Best state recorded for each vertex; `StateId::INVALID` if unvisited.
    best:          Vec<StateId>,
    settled:       Vec<bool>,
    queue:         BinaryHeap<QueueEntry>,
    seq:           u64,
    settled_count: usize,
    /// Vertices that had a candidate dropped by `max_weight`.
    pruned:        Vec<VertexId>,
}

impl<'a> StreetRouter<'a> {
    pub fn new(layer: &'a StreetLayer, mode: Mode) -> Self {
        Self {
            layer,
            mode,
            cost:          CostModel::default(),
            limits:        SearchLimits::default(),
            radius_m:      DEFAULT_RADIUS_M,
            start_time_ms: 0,
            origin:        None,
            destination:   None,
            states:        Vec::new(),
            best:          Vec::new(),
            settled:       Vec::new(),
            queue:         BinaryHeap::new(),
            seq:           0,
            settled_count: 0,
            pruned:        Vec::new(),
        }
    }

    pub fn with_cost(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Radius used by [`set_origin`](Self::set_origin) to find an edge.
    pub fn with_radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_start_time_ms(mut self, start_time_ms: i64) -> Self {
        self.start_time_ms = start_time_ms;
        self
    }

    // ── Origin / destination ──────────────────────────────────────────────

    /// Snap `(lat, lon)` to the nearest edge usable in this router's mode.
    ///
    /// Returns `false` when no such edge lies within the radius; the origin
    /// is then cleared and [`route`](Self::route) fails with
    /// [`RouterError::OriginNotSet`].
    pub fn set_origin(&mut self, lat: f64, lon: f64) -> bool {
        let split = self.layer.find_split(lat, lon, self.radius_m, self.mode);
        self.origin = split.map(Origin::Split);
        self.origin.is_some()
    }

    pub fn set_origin_split(&mut self, split: Split) {
        self.origin = Some(Origin::Split(split));
    }

    /// Start the search from a single vertex at zero cost.
    pub fn set_origin_vertex(&mut self, vertex: VertexId) -> StreetResult<()> {
        self.layer.vertex(vertex)?;
        self.origin = Some(Origin::Vertex(vertex));
        Ok(())
    }

    /// Stop as soon as `split` can be reached optimally instead of
    /// exhausting the queue.
    pub fn set_destination(&mut self, split: Split) {
        self.destination = Some(split);
    }

    /// The split the search was seeded from, if it started mid-edge.
    pub fn origin_split(&self) -> Option<&Split> {
        match &self.origin {
            Some(Origin::Split(split)) => Some(split),
            _ => None,
        }
    }

    // ── Search ────────────────────────────────────────────────────────────

    pub fn route(&mut self) -> Result<SearchSummary, RouterError> {
        self.route_observed(&mut NoopVisitor)
    }

    /// Run the search, reporting every frontier push and settle to
    /// `visitor`.
    pub fn route_observed<V: RoutingVisitor + ?Sized>(
        &mut self,
        visitor: &mut V,
    ) -> Result<SearchSummary, RouterError> {
        let origin = self.origin.ok_or(RouterError::OriginNotSet)?;
        self.reset();

        match origin {
            Origin::Vertex(v) => self.offer(v, 0.0, self.start_time_ms, None, None, visitor),
            Origin::Split(split) => self.seed_split(&split, visitor),
        }

        let status = loop {
            self.discard_stale();
            if self.limits.max_settled.is_some_and(|max| self.settled_count >= max)
                && !self.queue.is_empty()
            {
                break SearchStatus::SettledLimit;
            }
            let Some(entry) = self.queue.pop() else {
                break if self.cut_by_weight() {
                    SearchStatus::WeightLimit
                } else {
                    SearchStatus::Exhausted
                };
            };

            let id = entry.state;
            let state = self.states[id.index()];
            if self.settled[state.vertex.index()] {
                continue;
            }
            self.settled[state.vertex.index()] = true;
            self.settled_count += 1;
            visitor.on_settled(id, &state);

            if self.destination_reached() {
                break SearchStatus::ReachedDestination;
            }
            self.relax(id, &state, visitor);
        };

        debug!(
            "{} search settled {} vertices ({} states): {:?}",
            self.mode, self.settled_count, self.states.len(), status
        );

        Ok(SearchSummary { status, settled: self.settled_count, states: self.states.len() })
    }

    fn reset(&mut self) {
        let n = self.layer.vertex_count();
        self.states.clear();
        self.best.clear();
        self.best.resize(n, StateId::INVALID);
        self.settled.clear();
        self.settled.resize(n, false);
        self.queue.clear();
        self.seq = 0;
        self.settled_count = 0;
        self.pruned.clear();
    }

    /// Two provisional states, one per endpoint, each costing only the part
    /// of the edge between the split point and that endpoint.
    fn seed_split<V: RoutingVisitor + ?Sized>(&mut self, split: &Split, visitor: &mut V) {
        let layer = self.layer;
        let Ok(forward) = layer.edge(split.edge.forward()) else {
            return;
        };
        self.seed_partial(&forward, split.distance1_mm, visitor);
        self.seed_partial(&forward.partner(), split.distance0_mm, visitor);
    }

    fn seed_partial<V: RoutingVisitor + ?Sized>(
        &mut self,
        edge:      &Edge<'_>,
        length_mm: u32,
        visitor:   &mut V,
    ) {
        if !edge.allows(self.mode) {
            return;
        }
        let Some(t) = self.cost.traverse(edge, self.mode, length_mm) else {
            return;
        };
        let to = edge.to_vertex();
        let delay = self.cost.vertex_delay_secs(&self.layer.vertex_unchecked(to), self.mode);
        self.offer(
            to,
            t.weight + delay,
            self.start_time_ms + t.duration_ms + secs_to_ms(delay),
            Some(edge.id()),
            None,
            visitor,
        );
    }

    fn relax<V: RoutingVisitor + ?Sized>(&mut self, id: StateId, state: &State, visitor: &mut V) {
        let layer = self.layer;
        for &e in layer.out_edges_unchecked(state.vertex) {
            let edge = layer.edge_unchecked(e);
            if !edge.allows(self.mode) {
                continue;
            }
            let to = edge.to_vertex();
            if self.settled[to.index()] {
                continue;
            }
            let Some(t) = self.cost.traverse(&edge, self.mode, edge.length_mm()) else {
                continue;
            };
            let delay = self.cost.vertex_delay_secs(&layer.vertex_unchecked(to), self.mode);
            self.offer(
                to,
                state.weight + t.weight + delay,
                state.time_ms + t.duration_ms + secs_to_ms(delay),
                Some(e),
                Some(id),
                visitor,
            );
        }
    }

    /// Record a candidate label for `vertex` if it beats the current one.
    #[allow(clippy::too_many_arguments)]
    fn offer<V: RoutingVisitor + ?Sized>(
        &mut self,
        vertex:     VertexId,
        weight:     f64,
        time_ms:    i64,
        back_edge:  Option<EdgeId>,
        back_state: Option<StateId>,
        visitor:    &mut V,
    ) {
        if self.settled[vertex.index()] {
            return;
        }
        let current = self.best[vertex.index()];
        if current != StateId::INVALID && self.states[current.index()].weight <= weight {
            return;
        }
        if self.limits.max_weight.is_some_and(|max| weight > max) {
            self.pruned.push(vertex);
            return;
        }

        let id = StateId(self.states.len() as u32);
        let state = State { vertex, weight, time_ms, back_edge, back_state };
        self.states.push(state);
        self.best[vertex.index()] = id;
        self.queue.push(QueueEntry { weight, seq: self.seq, state: id });
        self.seq += 1;
        visitor.on_frontier(id, &state);
    }

    /// Pop queue entries whose vertex is already settled.
    fn discard_stale(&mut self) {
        while let Some(top) = self.queue.peek() {
            let vertex = self.states[top.state.index()].vertex;
            if !self.settled[vertex.index()] {
                break;
            }
            self.queue.pop();
        }
    }

    /// A pruned vertex that never got a label within `max_weight`.
    fn cut_by_weight(&self) -> bool {
        self.pruned.iter().any(|v| self.best[v.index()] == StateId::INVALID)
    }

    /// Endpoint 0 finishes along the forward edge, endpoint 1 along the
    /// backward edge; an endpoint whose finishing direction is closed to the
    /// mode cannot contribute and counts as done.
    fn destination_reached(&self) -> bool {
        let Some(dest) = &self.destination else {
            return false;
        };
        let Ok(forward) = self.layer.edge(dest.edge.forward()) else {
            return false;
        };
        let done = |vertex: VertexId, finishing: &Edge<'_>| {
            !finishing.allows(self.mode) || self.settled[vertex.index()]
        };
        done(forward.from_vertex(), &forward) && done(forward.to_vertex(), &forward.partner())
    }

    // ── Results ───────────────────────────────────────────────────────────

    /// Lowest-weight state at `split`, finishing the partial edge from
    /// whichever endpoint is cheaper.  `None` if neither endpoint (nor the
    /// origin's own edge) reaches it.
    pub fn get_state(&self, split: &Split) -> Option<State> {
        let forward = self.layer.edge(split.edge.forward()).ok()?;
        let backward = forward.partner();

        let mut best: Option<State> = None;
        let mut consider = |candidate: Option<State>| {
            if let Some(c) = candidate {
                if best.is_none_or(|b| c.weight < b.weight) {
                    best = Some(c);
                }
            }
        };

        for direct in self.direct_states(split) {
            consider(Some(direct));
        }
        consider(self.finish_from(&forward, split.distance0_mm));
        consider(self.finish_from(&backward, split.distance1_mm));
        best
    }

    /// Complete `edge` from the label of its from-vertex over `length_mm`.
    fn finish_from(&self, edge: &Edge<'_>, length_mm: u32) -> Option<State> {
        if !edge.allows(self.mode) {
            return None;
        }
        let vertex = edge.from_vertex();
        let id = *self.best.get(vertex.index())?;
        let from = self.states.get(id.index())?;
        let t = self.cost.traverse(edge, self.mode, length_mm)?;
        Some(State {
            vertex,
            weight:     from.weight + t.weight,
            time_ms:    from.time_ms + t.duration_ms,
            back_edge:  Some(edge.id()),
            back_state: Some(id),
        })
    }

    /// Travel straight along the edge when origin and destination share it.
    fn direct_states(&self, split: &Split) -> Vec<State> {
        let Some(Origin::Split(origin)) = &self.origin else {
            return Vec::new();
        };
        if origin.edge.forward() != split.edge.forward() {
            return Vec::new();
        }
        let Ok(forward) = self.layer.edge(split.edge.forward()) else {
            return Vec::new();
        };

        let mut legs = Vec::with_capacity(2);
        if split.distance0_mm >= origin.distance0_mm {
            legs.push((forward, split.distance0_mm - origin.distance0_mm));
        }
        if split.distance0_mm <= origin.distance0_mm {
            legs.push((forward.partner(), origin.distance0_mm - split.distance0_mm));
        }

        legs.into_iter()
            .filter(|(edge, _)| edge.allows(self.mode))
            .filter_map(|(edge, length_mm)| {
                let t = self.cost.traverse(&edge, self.mode, length_mm)?;
                Some(State {
                    vertex:     edge.from_vertex(),
                    weight:     t.weight,
                    time_ms:    self.start_time_ms + t.duration_ms,
                    back_edge:  Some(edge.id()),
                    back_state: None,
                })
            })
            .collect()
    }

    /// `terminal` and its predecessors, origin first.
    pub fn chain(&self, terminal: &State) -> Vec<State> {
        let mut chain = vec![*terminal];
        let mut cur = terminal.back_state;
        while let Some(id) = cur {
            let Some(state) = self.states.get(id.index()) else {
                break;
            };
            chain.push(*state);
            cur = state.back_state;
        }
        chain.reverse();
        chain
    }

    /// Edges traversed to reach `terminal`, in travel order.  The first and
    /// last entries may be partially traversed origin/destination edges.
    pub fn path(&self, terminal: &State) -> Vec<EdgeId> {
        self.chain(terminal).iter().filter_map(|s| s.back_edge).collect()
    }

    /// Best label recorded at `vertex` (final once the vertex is settled).
    pub fn best_state(&self, vertex: VertexId) -> Option<&State> {
        let id = *self.best.get(vertex.index())?;
        self.states.get(id.index())
    }

    pub fn is_settled(&self, vertex: VertexId) -> bool {
        self.settled.get(vertex.index()).copied().unwrap_or(false)
    }

    pub fn settled_count(&self) -> usize {
        self.settled_count
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Settled vertices in id order.
    pub fn settled_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.settled
            .iter()
            .enumerate()
            .filter(|(_, s)| **s)
            .map(|(i, _)| VertexId(i as u32))
    }
}
