//! Edge traversal cost.
//!
//! # Cost units
//!
//! Weight is a generalized cost in **seconds**.  Travel time is tracked
//! separately in milliseconds so that reluctance factors (stairs) can make a
//! path less attractive without changing when the traveller arrives.
//!
//! | Mode | Speed                         |
//! |------|-------------------------------|
//! | Walk | `walk_speed_ms` (1.4 m/s)     |
//! | Bike | `bike_speed_ms` (4.2 m/s)     |
//! | Car  | edge speed                    |

use sr_core::Mode;

use crate::edge::Edge;
use crate::flags::{EdgeFlags, VertexFlags};
use crate::vertex::Vertex;

/// Tunable parameters of the traversal cost function.  Every output is
/// non-negative, as label-setting search requires.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CostModel {
    pub walk_speed_ms: f64,
    pub bike_speed_ms: f64,
    /// Weight multiplier for walking or cycling over `STAIRS` edges.
    pub stairs_reluctance: f64,
    /// Delay added when a car or bike enters a `TRAFFIC_SIGNAL` vertex.
    pub traffic_signal_delay_secs: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            walk_speed_ms:             1.4,
            bike_speed_ms:             4.2,
            stairs_reluctance:         3.0,
            traffic_signal_delay_secs: 0.0,
        }
    }
}

/// Cost of one (possibly partial) edge traversal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Traversal {
    pub weight:      f64,
    pub duration_ms: i64,
}

impl CostModel {
    /// Speed used for `edge` in `mode`, in m/s.
    #[inline]
    pub fn speed_ms(&self, edge: &Edge<'_>, mode: Mode) -> f64 {
        match mode {
            Mode::Walk => self.walk_speed_ms,
            Mode::Bike => self.bike_speed_ms,
            Mode::Car  => edge.speed_ms(),
        }
    }

    /// Cost of travelling `length_mm` millimetres along `edge`.
    ///
    /// Returns `None` when the edge cannot be traversed at a positive speed.
    /// Permissions are the caller's concern.
    pub fn traverse(&self, edge: &Edge<'_>, mode: Mode, length_mm: u32) -> Option<Traversal> {
        let speed = self.speed_ms(edge, mode);
        if !(speed > 0.0 && speed.is_finite()) {
            return None;
        }
        let secs = length_mm as f64 / 1000.0 / speed;
        let reluctance = if mode != Mode::Car && edge.has(EdgeFlags::STAIRS) {
            self.stairs_reluctance.max(1.0)
        } else {
            1.0
        };
        Some(Traversal {
            weight:      secs * reluctance,
            duration_ms: (secs * 1000.0).round() as i64,
        })
    }

    /// Extra seconds for arriving at `vertex` in `mode`.
    #[inline]
    pub fn vertex_delay_secs(&self, vertex: &Vertex, mode: Mode) -> f64 {
        if mode != Mode::Walk && vertex.has(VertexFlags::TRAFFIC_SIGNAL) {
            self.traffic_signal_delay_secs.max(0.0)
        } else {
            0.0
        }
    }
}
