//! Projection of an arbitrary coordinate onto the nearest usable edge.
//!
//! Candidates come from the R-tree.  Distances are measured in a local
//! equirectangular frame centred on the query point (metres east, metres
//! north), which is accurate to well under a millimetre per metre at the
//! radii used for snapping.

use sr_core::{EdgeId, Envelope, FixedPoint, GeoPoint, Mode, VertexId};
use sr_core::geo::{METERS_PER_DEGREE_LAT, fixed_to_floating, meters_per_degree_lon};

use crate::layer::StreetLayer;

/// A point projected onto an edge pair.
///
/// `edge` is always the forward (even) edge of the pair; `vertex0` is its
/// from-vertex and `vertex1` its to-vertex.  `distance0_mm` runs along the
/// edge from `vertex0` to the split point, `distance1_mm` from the split
/// point to `vertex1`, and the two always sum to the edge's `length_mm`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Split {
    pub edge:         EdgeId,
    pub vertex0:      VertexId,
    pub vertex1:      VertexId,
    pub fixed_lat:    i32,
    pub fixed_lon:    i32,
    pub distance0_mm: u32,
    pub distance1_mm: u32,
}

impl Split {
    pub fn point(&self) -> FixedPoint {
        FixedPoint::new(self.fixed_lat, self.fixed_lon)
    }

    pub fn length_mm(&self) -> u32 {
        self.distance0_mm + self.distance1_mm
    }
}

/// Local metric frame around a reference point.
struct LocalFrame {
    lat0: f64,
    lon0: f64,
    m_per_deg_lon: f64,
}

impl LocalFrame {
    fn new(origin: GeoPoint) -> Self {
        Self { lat0: origin.lat, lon0: origin.lon, m_per_deg_lon: meters_per_degree_lon(origin.lat) }
    }

    /// `(east_m, north_m)` of `p` relative to the frame origin.
    #[inline]
    fn project(&self, p: FixedPoint) -> (f64, f64) {
        (
            (fixed_to_floating(p.lon) - self.lon0) * self.m_per_deg_lon,
            (fixed_to_floating(p.lat) - self.lat0) * METERS_PER_DEGREE_LAT,
        )
    }
}

/// Closest point to the frame origin on one edge's polyline.
struct Projection {
    dist2:   f64,
    segment: usize,
    /// Position along `segment`, in `[0, 1]`.
    t:       f64,
}

fn project_onto(frame: &LocalFrame, coords: &[FixedPoint]) -> Option<Projection> {
    let mut best: Option<Projection> = None;
    for (segment, w) in coords.windows(2).enumerate() {
        let (ax, ay) = frame.project(w[0]);
        let (bx, by) = frame.project(w[1]);
        let (dx, dy) = (bx - ax, by - ay);
        let len2 = dx * dx + dy * dy;
        let t = if len2 > 0.0 { (-(ax * dx + ay * dy) / len2).clamp(0.0, 1.0) } else { 0.0 };
        let (px, py) = (ax + t * dx, ay + t * dy);
        let dist2 = px * px + py * py;
        if best.as_ref().is_none_or(|b| dist2 < b.dist2) {
            best = Some(Projection { dist2, segment, t });
        }
    }
    best
}

/// Find the split for `point` on the nearest edge pair `mode` may use in at
/// least one direction, within `radius_m` metres.
///
/// Ties are broken by the lowest edge id.  Per-direction permissions are
/// left to the router, which only seeds or finishes along directions the
/// mode is allowed on.
pub fn find_split(layer: &StreetLayer, point: GeoPoint, radius_m: f64, mode: Mode) -> Option<Split> {
    if radius_m.is_nan() || radius_m < 0.0 {
        return None;
    }
    if !(point.lat.is_finite() && point.lon.is_finite()) {
        return None;
    }
    let envelope = Envelope::around(point, radius_m);
    let frame = LocalFrame::new(point);

    let mut best: Option<(EdgeId, Projection)> = None;
    // Ascending ids, so strict `<` keeps the lowest id on ties.
    for id in layer.spatial_index().query(&envelope) {
        let edge = layer.edge_unchecked(id);
        if !edge.allows(mode) && !edge.partner().allows(mode) {
            continue;
        }
        let Some(proj) = project_onto(&frame, edge.forward_geometry()) else {
            continue;
        };
        if best.as_ref().is_none_or(|(_, b)| proj.dist2 < b.dist2) {
            best = Some((id, proj));
        }
    }

    let (id, proj) = best?;
    if proj.dist2.sqrt() > radius_m {
        return None;
    }

    let edge = layer.edge_unchecked(id);
    let coords = edge.forward_geometry();

    // Fraction of the geometric length lying before the split point.
    let seg_len = |w: &[FixedPoint]| {
        let (ax, ay) = frame.project(w[0]);
        let (bx, by) = frame.project(w[1]);
        ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
    };
    let lengths: Vec<f64> = coords.windows(2).map(seg_len).collect();
    let total: f64 = lengths.iter().sum();
    let before: f64 = lengths[..proj.segment].iter().sum::<f64>() + proj.t * lengths[proj.segment];
    let fraction = if total > 0.0 { (before / total).clamp(0.0, 1.0) } else { 0.0 };

    let length_mm = edge.length_mm();
    let distance0_mm = ((fraction * length_mm as f64).round() as u32).min(length_mm);

    let (a, b) = (coords[proj.segment], coords[proj.segment + 1]);
    let lerp = |from: i32, to: i32| from + ((to as i64 - from as i64) as f64 * proj.t).round() as i32;

    Some(Split {
        edge:         id,
        vertex0:      edge.from_vertex(),
        vertex1:      edge.to_vertex(),
        fixed_lat:    lerp(a.lat, b.lat),
        fixed_lon:    lerp(a.lon, b.lon),
        distance0_mm,
        distance1_mm: length_mm - distance0_mm,
    })
}
