//! The street layer: stores, outgoing-edge adjacency, and spatial index.
//!
//! # Adjacency
//!
//! Edges never move once allocated (pairs must stay adjacent), so instead of
//! sorting the edge arrays the layer keeps a separate **CSR** list of edge
//! ids.  The outgoing edges of vertex `v` are:
//!
//! ```text
//! out_edges[ out_start[v] .. out_start[v+1] ]
//! ```
//!
//! Both the adjacency and the R-tree are derived from the edge store and are
//! rebuilt whenever a layer is assembled, whether from a builder or from
//! deserialized stores.

use log::warn;

use sr_core::{EdgeId, Envelope, FixedPoint, GeoPoint, Mode, VertexId};

use crate::edge::{Edge, EdgeAttrs, EdgeStore};
use crate::flags::VertexFlags;
use crate::spatial::EdgeIndex;
use crate::split::{Split, find_split};
use crate::vertex::{Vertex, VertexStore};
use crate::{StreetError, StreetResult};

// ── StreetLayer ───────────────────────────────────────────────────────────────

/// Immutable street graph.  Build with [`StreetLayerBuilder`] or
/// [`StreetLayer::from_stores`].
pub struct StreetLayer {
    vertices:  VertexStore,
    edges:     EdgeStore,
    /// CSR row pointer.  Length = `vertex_count + 1`.
    out_start: Vec<u32>,
    out_edges: Vec<EdgeId>,
    index:     EdgeIndex,
}

impl StreetLayer {
    /// A layer with no vertices or edges.
    pub fn empty() -> Self {
        StreetLayerBuilder::new().build()
    }

    /// Assemble a layer from stores, validating that every edge endpoint
    /// exists, then derive the adjacency and spatial index.
    pub fn from_stores(vertices: VertexStore, edges: EdgeStore) -> StreetResult<Self> {
        for edge in edges.forward_edges() {
            for v in [edge.from_vertex(), edge.to_vertex()] {
                if !vertices.contains(v) {
                    return Err(StreetError::VertexOutOfRange { id: v, count: vertices.count() });
                }
            }
        }
        Ok(Self::assemble(vertices, edges))
    }

    fn assemble(vertices: VertexStore, edges: EdgeStore) -> Self {
        let vertex_count = vertices.count();

        let mut out_start = vec![0u32; vertex_count + 1];
        for e in edges.iter() {
            out_start[e.from_vertex().index() + 1] += 1;
        }
        for i in 1..=vertex_count {
            out_start[i] += out_start[i - 1];
        }
        debug_assert_eq!(out_start[vertex_count] as usize, edges.count());

        // Fill in id order so each vertex's slice is ascending.
        let mut cursor: Vec<u32> = out_start[..vertex_count].to_vec();
        let mut out_edges = vec![EdgeId::INVALID; edges.count()];
        for e in edges.iter() {
            let slot = &mut cursor[e.from_vertex().index()];
            out_edges[*slot as usize] = e.id();
            *slot += 1;
        }

        let index = EdgeIndex::build(&edges);

        StreetLayer { vertices, edges, out_start, out_edges, index }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertices.count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.count()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    // ── Store access ──────────────────────────────────────────────────────

    pub fn vertex_store(&self) -> &VertexStore {
        &self.vertices
    }

    pub fn edge_store(&self) -> &EdgeStore {
        &self.edges
    }

    pub fn spatial_index(&self) -> &EdgeIndex {
        &self.index
    }

    pub fn vertex(&self, id: VertexId) -> StreetResult<Vertex> {
        self.vertices.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> StreetResult<Edge<'_>> {
        self.edges.get(id)
    }

    #[inline]
    pub(crate) fn vertex_unchecked(&self, id: VertexId) -> Vertex {
        self.vertices.get_unchecked(id)
    }

    #[inline]
    pub(crate) fn edge_unchecked(&self, id: EdgeId) -> Edge<'_> {
        self.edges.get_unchecked(id)
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Outgoing edge ids of `vertex`, ascending.
    pub fn outgoing_edges(&self, vertex: VertexId) -> StreetResult<&[EdgeId]> {
        if !self.vertices.contains(vertex) {
            return Err(StreetError::VertexOutOfRange { id: vertex, count: self.vertex_count() });
        }
        Ok(self.out_edges_unchecked(vertex))
    }

    #[inline]
    pub(crate) fn out_edges_unchecked(&self, vertex: VertexId) -> &[EdgeId] {
        let start = self.out_start[vertex.index()] as usize;
        let end   = self.out_start[vertex.index() + 1] as usize;
        &self.out_edges[start..end]
    }

    pub fn out_degree(&self, vertex: VertexId) -> StreetResult<usize> {
        Ok(self.outgoing_edges(vertex)?.len())
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Forward edges whose bbox intersects `envelope`, refusing the query
    /// with [`StreetError::ResultTooLarge`] when more than `cap` match.
    pub fn edges_in_envelope(&self, envelope: &Envelope, cap: usize) -> StreetResult<Vec<EdgeId>> {
        let ids = self.index.query(envelope);
        if ids.len() > cap {
            warn!("refusing to return {} edges, more than the cap of {cap}", ids.len());
            return Err(StreetError::ResultTooLarge { count: ids.len(), cap });
        }
        Ok(ids)
    }

    /// Project `(lat, lon)` onto the nearest edge `mode` may use within
    /// `radius_m` metres.  `None` is a normal outcome.
    pub fn find_split(&self, lat: f64, lon: f64, radius_m: f64, mode: Mode) -> Option<Split> {
        find_split(self, GeoPoint::new(lat, lon), radius_m, mode)
    }

    /// Bounding envelope of all vertices, or `None` for an empty layer.
    pub fn envelope(&self) -> Option<Envelope> {
        let mut iter = self.vertices.iter();
        let mut env = Envelope::of_point(iter.next()?.point);
        for v in iter {
            env.expand_to_include(v.point);
        }
        Some(env)
    }
}

// ── Street ────────────────────────────────────────────────────────────────────

/// Description of one physical street segment for [`StreetLayerBuilder`].
///
/// ```
/// use sr_core::GeoPoint;
/// use sr_street::{EdgeAttrs, PermissionFlags, Street, StreetLayerBuilder};
///
/// let mut b = StreetLayerBuilder::new();
/// let a = b.add_vertex(GeoPoint::new(45.0, 7.0));
/// let c = b.add_vertex(GeoPoint::new(45.001, 7.0));
/// let walk = EdgeAttrs::new(PermissionFlags::PEDESTRIAN, 1.4);
/// let fwd = b.add_street(Street::new(a, c, walk)).unwrap();
/// let layer = b.build();
/// assert_eq!(fwd.0, 0);
/// assert_eq!(layer.edge_count(), 2); // forward + backward
/// ```
#[derive(Clone, Debug)]
pub struct Street {
    pub from:      VertexId,
    pub to:        VertexId,
    /// `None` derives the length from the geometry.
    pub length_mm: Option<u32>,
    /// Intermediate shape points between `from` and `to`.
    pub via:       Vec<GeoPoint>,
    pub forward:   EdgeAttrs,
    pub backward:  EdgeAttrs,
}

impl Street {
    /// A two-way street with the same attributes in both directions.
    pub fn new(from: VertexId, to: VertexId, attrs: EdgeAttrs) -> Self {
        Self { from, to, length_mm: None, via: Vec::new(), forward: attrs, backward: attrs }
    }

    /// Close the backward direction to every mode.
    pub fn one_way(mut self) -> Self {
        self.backward = EdgeAttrs::closed();
        self
    }

    pub fn backward(mut self, attrs: EdgeAttrs) -> Self {
        self.backward = attrs;
        self
    }

    pub fn length_mm(mut self, length_mm: u32) -> Self {
        self.length_mm = Some(length_mm);
        self
    }

    pub fn via(mut self, points: impl IntoIterator<Item = GeoPoint>) -> Self {
        self.via = points.into_iter().collect();
        self
    }
}

// ── StreetLayerBuilder ────────────────────────────────────────────────────────

/// Construct a [`StreetLayer`] incrementally, then call [`build`](Self::build).
pub struct StreetLayerBuilder {
    vertices: VertexStore,
    edges:    EdgeStore,
}

impl StreetLayerBuilder {
    pub fn new() -> Self {
        Self { vertices: VertexStore::new(), edges: EdgeStore::new() }
    }

    /// Pre-allocate for the expected number of vertices and street segments.
    pub fn with_capacity(vertices: usize, streets: usize) -> Self {
        Self {
            vertices: VertexStore::with_capacity(vertices),
            edges:    EdgeStore::with_capacity(streets),
        }
    }

    /// Add a vertex and return its `VertexId` (sequential from 0).
    pub fn add_vertex(&mut self, pos: GeoPoint) -> VertexId {
        self.vertices.push_floating(pos)
    }

    pub fn add_vertex_with_flags(&mut self, pos: GeoPoint, flags: VertexFlags) -> VertexId {
        self.vertices.push(pos.to_fixed(), flags)
    }

    pub fn set_vertex_flags(&mut self, id: VertexId, flags: VertexFlags) -> StreetResult<()> {
        self.vertices.set_flags(id, flags)
    }

    /// Add a street as a forward/backward edge pair; returns the forward id.
    pub fn add_street(&mut self, street: Street) -> StreetResult<EdgeId> {
        let from = self.vertices.get(street.from)?.point;
        let to   = self.vertices.get(street.to)?.point;

        let mut geometry: Vec<FixedPoint> = Vec::with_capacity(street.via.len() + 2);
        geometry.push(from);
        geometry.extend(street.via.iter().map(|p| p.to_fixed()));
        geometry.push(to);

        let length_mm = street.length_mm.unwrap_or_else(|| polyline_length_mm(&geometry));

        self.edges.push_pair(
            street.from,
            street.to,
            length_mm,
            &geometry,
            street.forward,
            street.backward,
        )
    }

    pub fn vertex_count(&self) -> usize { self.vertices.count() }
    pub fn edge_count(&self) -> usize { self.edges.count() }

    /// Consume the builder and produce a [`StreetLayer`].
    ///
    /// Time complexity: O(V + E) for the adjacency + O(E log E) for the
    /// R-tree bulk load.
    pub fn build(self) -> StreetLayer {
        // Endpoints were validated in add_street.
        StreetLayer::assemble(self.vertices, self.edges)
    }
}

impl Default for StreetLayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Haversine length of a fixed-point polyline, in millimetres.
pub fn polyline_length_mm(points: &[FixedPoint]) -> u32 {
    let metres: f64 = points.windows(2).map(|w| w[0].distance_m(w[1])).sum();
    (metres * 1000.0).round() as u32
}
