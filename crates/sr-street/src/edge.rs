//! Edge store: directed street edges allocated in forward/backward pairs.
//!
//! # Data layout
//!
//! Pair-level columns (endpoints, length, geometry) are stored once per
//! physical segment and indexed by `edge.0 / 2`.  Direction-level columns
//! (speed, permissions, flags) are stored once per directed edge and indexed
//! by `EdgeId`, since one-way streets and per-direction speeds differ between
//! the two halves of a pair.
//!
//! Geometry lives in one flat coordinate arena.  Pair `p` owns
//! `coords[geometry_start[p] .. geometry_start[p + 1]]`, first point at the
//! forward edge's from-vertex, last point at its to-vertex.  The backward
//! edge reads the same slice reversed.

use sr_core::{EdgeId, Envelope, FixedPoint, Mode, VertexId};

use crate::flags::{EdgeFlags, PermissionFlags};
use crate::{StreetError, StreetResult};

/// Convert a speed in m/s to the stored centimetres-per-second encoding,
/// saturating at `u16::MAX` cm/s (~655 m/s).
#[inline]
pub fn speed_ms_to_cm_s(speed_ms: f64) -> u16 {
    (speed_ms * 100.0).round().clamp(0.0, u16::MAX as f64) as u16
}

// ── EdgeAttrs ─────────────────────────────────────────────────────────────────

/// Attributes of one direction of a street segment.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeAttrs {
    pub permissions: PermissionFlags,
    pub flags:       EdgeFlags,
    pub speed_cm_s:  u16,
}

impl EdgeAttrs {
    pub fn new(permissions: PermissionFlags, speed_ms: f64) -> Self {
        Self { permissions, flags: EdgeFlags::empty(), speed_cm_s: speed_ms_to_cm_s(speed_ms) }
    }

    /// A direction nothing may traverse (the back half of a one-way street).
    pub fn closed() -> Self {
        Self::default()
    }

    pub fn with_flags(mut self, flags: EdgeFlags) -> Self {
        self.flags = flags;
        self
    }
}

// ── Edge view ─────────────────────────────────────────────────────────────────

/// Borrowed view of one directed edge.  Cheap to copy; never outlives the
/// store it reads from.
#[derive(Copy, Clone)]
pub struct Edge<'a> {
    store: &'a EdgeStore,
    id:    EdgeId,
}

impl<'a> Edge<'a> {
    #[inline]
    pub fn id(&self) -> EdgeId {
        self.id
    }

    #[inline]
    fn pair(&self) -> usize {
        self.id.index() >> 1
    }

    #[inline]
    pub fn is_forward(&self) -> bool {
        self.id.is_forward()
    }

    /// The other half of this edge's pair.
    #[inline]
    pub fn partner(&self) -> Edge<'a> {
        Edge { store: self.store, id: self.id.partner() }
    }

    #[inline]
    pub fn from_vertex(&self) -> VertexId {
        if self.is_forward() {
            self.store.pair_from[self.pair()]
        } else {
            self.store.pair_to[self.pair()]
        }
    }

    #[inline]
    pub fn to_vertex(&self) -> VertexId {
        if self.is_forward() {
            self.store.pair_to[self.pair()]
        } else {
            self.store.pair_from[self.pair()]
        }
    }

    #[inline]
    pub fn length_mm(&self) -> u32 {
        self.store.pair_length_mm[self.pair()]
    }

    #[inline]
    pub fn length_m(&self) -> f64 {
        self.length_mm() as f64 / 1000.0
    }

    #[inline]
    pub fn speed_cm_s(&self) -> u16 {
        self.store.speed_cm_s[self.id.index()]
    }

    #[inline]
    pub fn speed_ms(&self) -> f64 {
        self.speed_cm_s() as f64 / 100.0
    }

    #[inline]
    pub fn permissions(&self) -> PermissionFlags {
        self.store.permissions[self.id.index()]
    }

    #[inline]
    pub fn flags(&self) -> EdgeFlags {
        self.store.flags[self.id.index()]
    }

    #[inline]
    pub fn allows(&self, mode: Mode) -> bool {
        self.permissions().allows(mode)
    }

    #[inline]
    pub fn has(&self, flag: EdgeFlags) -> bool {
        self.flags().has(flag)
    }

    /// The pair's shared geometry in forward order, whichever half this is.
    #[inline]
    pub fn forward_geometry(&self) -> &'a [FixedPoint] {
        self.store.pair_geometry(self.pair())
    }

    /// Polyline in this edge's direction of travel.
    pub fn geometry(&self) -> Vec<FixedPoint> {
        let coords = self.forward_geometry();
        if self.is_forward() {
            coords.to_vec()
        } else {
            coords.iter().rev().copied().collect()
        }
    }

    pub fn envelope(&self) -> Envelope {
        self.store.pair_envelope(self.pair())
    }

    pub fn permissions_string(&self) -> String {
        self.permissions().names()
    }

    pub fn flags_string(&self) -> String {
        self.flags().names()
    }
}

impl std::fmt::Debug for Edge<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Edge")
            .field("id", &self.id)
            .field("from", &self.from_vertex())
            .field("to", &self.to_vertex())
            .field("length_mm", &self.length_mm())
            .field("permissions", &self.permissions())
            .finish()
    }
}

// ── EdgeStore ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct EdgeStore {
    // ── Pair columns (indexed by edge / 2) ────────────────────────────────
    pair_from:      Vec<VertexId>,
    pair_to:        Vec<VertexId>,
    pair_length_mm: Vec<u32>,
    /// Row pointer into `coords`.  Length = `pair_count + 1`.
    geometry_start: Vec<u32>,
    coords:         Vec<FixedPoint>,

    // ── Direction columns (indexed by EdgeId) ─────────────────────────────
    speed_cm_s:  Vec<u16>,
    permissions: Vec<PermissionFlags>,
    flags:       Vec<EdgeFlags>,
}

impl Default for EdgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeStore {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-allocate for `pairs` street segments.
    pub fn with_capacity(pairs: usize) -> Self {
        let mut geometry_start = Vec::with_capacity(pairs + 1);
        geometry_start.push(0);
        Self {
            pair_from:      Vec::with_capacity(pairs),
            pair_to:        Vec::with_capacity(pairs),
            pair_length_mm: Vec::with_capacity(pairs),
            geometry_start,
            coords:         Vec::with_capacity(pairs * 2),
            speed_cm_s:     Vec::with_capacity(pairs * 2),
            permissions:    Vec::with_capacity(pairs * 2),
            flags:          Vec::with_capacity(pairs * 2),
        }
    }

    /// Append a forward/backward pair and return the forward (even) id.
    ///
    /// `geometry` is the full forward polyline, endpoints included; it must
    /// hold at least two points.
    pub fn push_pair(
        &mut self,
        from:      VertexId,
        to:        VertexId,
        length_mm: u32,
        geometry:  &[FixedPoint],
        forward:   EdgeAttrs,
        backward:  EdgeAttrs,
    ) -> StreetResult<EdgeId> {
        let id = EdgeId(self.count() as u32);
        if geometry.len() < 2 {
            return Err(StreetError::InvalidGeometry {
                edge:   id,
                reason: format!("{} point(s), need at least 2", geometry.len()),
            });
        }

        self.pair_from.push(from);
        self.pair_to.push(to);
        self.pair_length_mm.push(length_mm);
        self.coords.extend_from_slice(geometry);
        self.geometry_start.push(self.coords.len() as u32);

        for attrs in [forward, backward] {
            self.speed_cm_s.push(attrs.speed_cm_s);
            self.permissions.push(attrs.permissions);
            self.flags.push(attrs.flags);
        }
        Ok(id)
    }

    /// Number of directed edges (always even).
    pub fn count(&self) -> usize {
        self.speed_cm_s.len()
    }

    pub fn pair_count(&self) -> usize {
        self.pair_from.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pair_from.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: EdgeId) -> bool {
        id.index() < self.count()
    }

    pub fn get(&self, id: EdgeId) -> StreetResult<Edge<'_>> {
        if !self.contains(id) {
            return Err(StreetError::EdgeOutOfRange { id, count: self.count() });
        }
        Ok(Edge { store: self, id })
    }

    /// Like [`get`](Self::get) for ids the caller has already validated.
    #[inline]
    pub(crate) fn get_unchecked(&self, id: EdgeId) -> Edge<'_> {
        Edge { store: self, id }
    }

    pub fn geometry(&self, id: EdgeId) -> StreetResult<Vec<FixedPoint>> {
        self.get(id).map(|e| e.geometry())
    }

    /// All directed edges in id order.
    pub fn iter(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        (0..self.count()).map(|i| Edge { store: self, id: EdgeId(i as u32) })
    }

    /// Forward (even) edges only, one per physical segment.
    pub fn forward_edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        (0..self.count())
            .step_by(2)
            .map(|i| Edge { store: self, id: EdgeId(i as u32) })
    }

    #[inline]
    fn pair_geometry(&self, pair: usize) -> &[FixedPoint] {
        let start = self.geometry_start[pair] as usize;
        let end   = self.geometry_start[pair + 1] as usize;
        &self.coords[start..end]
    }

    fn pair_envelope(&self, pair: usize) -> Envelope {
        let coords = self.pair_geometry(pair);
        // push_pair guarantees at least two points.
        let mut env = Envelope::of_point(coords[0]);
        for p in &coords[1..] {
            env.expand_to_include(*p);
        }
        env
    }
}
