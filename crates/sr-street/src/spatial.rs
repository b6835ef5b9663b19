//! R-tree over edge bounding boxes.
//!
//! Only forward edges are indexed: both halves of a pair share a geometry,
//! so one entry per physical segment is enough and callers reach the
//! backward half through [`EdgeId::partner`].
//!
//! Coordinates are fixed-point degrees widened to `f64`.  Keeping the tree
//! in `f64` avoids `i32` overflow in the area and margin products `rstar`
//! computes during bulk loading.

use rstar::{RTree, RTreeObject, AABB};

use sr_core::{EdgeId, Envelope};

use crate::edge::EdgeStore;

/// Entry stored in the R-tree: the bbox of one forward edge.
#[derive(Clone, Debug)]
struct EdgeEntry {
    bbox: AABB<[f64; 2]>, // [lon, lat], fixed-point units
    edge: EdgeId,
}

impl RTreeObject for EdgeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.bbox
    }
}

#[inline]
fn to_aabb(env: &Envelope) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [env.min_lon as f64, env.min_lat as f64],
        [env.max_lon as f64, env.max_lat as f64],
    )
}

/// Read-only after construction; safe to query from many threads at once.
pub struct EdgeIndex {
    tree: RTree<EdgeEntry>,
}

impl EdgeIndex {
    /// Bulk-load the index from every forward edge in `edges`.
    ///
    /// Time complexity: O(E log E).
    pub fn build(edges: &EdgeStore) -> Self {
        let entries: Vec<EdgeEntry> = edges
            .forward_edges()
            .map(|e| EdgeEntry { bbox: to_aabb(&e.envelope()), edge: e.id() })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    /// Forward edge ids whose bbox intersects `envelope`, ascending.
    pub fn query(&self, envelope: &Envelope) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self
            .tree
            .locate_in_envelope_intersecting(&to_aabb(envelope))
            .map(|entry| entry.edge)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of indexed (forward) edges.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
