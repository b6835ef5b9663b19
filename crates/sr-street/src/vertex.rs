//! Vertex store: one fixed-point coordinate and flag set per street vertex.

use sr_core::{FixedPoint, GeoPoint, VertexId};

use crate::flags::VertexFlags;
use crate::{StreetError, StreetResult};

/// Value view of one vertex, copied out of the store.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Vertex {
    pub id:    VertexId,
    pub point: FixedPoint,
    pub flags: VertexFlags,
}

impl Vertex {
    #[inline]
    pub fn lat(&self) -> f64 {
        self.point.to_floating().lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.point.to_floating().lon
    }

    #[inline]
    pub fn has(&self, flag: VertexFlags) -> bool {
        self.flags.has(flag)
    }
}

/// Dense columns indexed by `VertexId`.
#[derive(Clone, Debug, Default)]
pub struct VertexStore {
    lat:   Vec<i32>,
    lon:   Vec<i32>,
    flags: Vec<VertexFlags>,
}

impl VertexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            lat:   Vec::with_capacity(n),
            lon:   Vec::with_capacity(n),
            flags: Vec::with_capacity(n),
        }
    }

    /// Append a vertex and return its id (sequential from 0).
    pub fn push(&mut self, point: FixedPoint, flags: VertexFlags) -> VertexId {
        let id = VertexId(self.lat.len() as u32);
        self.lat.push(point.lat);
        self.lon.push(point.lon);
        self.flags.push(flags);
        id
    }

    /// Append a vertex given in floating degrees.
    pub fn push_floating(&mut self, pos: GeoPoint) -> VertexId {
        self.push(pos.to_fixed(), VertexFlags::empty())
    }

    pub fn count(&self) -> usize {
        self.lat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: VertexId) -> bool {
        id.index() < self.lat.len()
    }

    pub fn get(&self, id: VertexId) -> StreetResult<Vertex> {
        if !self.contains(id) {
            return Err(StreetError::VertexOutOfRange { id, count: self.count() });
        }
        Ok(self.get_unchecked(id))
    }

    /// Like [`get`](Self::get) for ids the caller has already validated.
    #[inline]
    pub(crate) fn get_unchecked(&self, id: VertexId) -> Vertex {
        let i = id.index();
        Vertex {
            id,
            point: FixedPoint::new(self.lat[i], self.lon[i]),
            flags: self.flags[i],
        }
    }

    pub fn set_flags(&mut self, id: VertexId, flags: VertexFlags) -> StreetResult<()> {
        if !self.contains(id) {
            return Err(StreetError::VertexOutOfRange { id, count: self.count() });
        }
        self.flags[id.index()] = flags;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = Vertex> + '_ {
        (0..self.count()).map(|i| self.get_unchecked(VertexId(i as u32)))
    }
}
