//! Per-planner query configuration.

use sr_street::{CostModel, DEFAULT_RADIUS_M, SearchLimits};

/// Cap on the number of edges an envelope query may return.
pub const DEFAULT_MAX_RESULT_EDGES: usize = 100_000;

/// Settings shared by every query a [`Planner`](crate::Planner) answers.
///
/// Typically loaded from a JSON file by the application and passed to the
/// planner; nothing here is global.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueryConfig {
    /// How far from a query coordinate to look for an edge.  Default: 200 m.
    pub radius_meters: f64,

    /// Envelope queries matching more forward edges than this are refused.
    pub max_result_edges: usize,

    /// Departure time added to every arrival time, in milliseconds.
    pub start_time_ms: i64,

    pub limits: SearchLimits,

    pub cost: CostModel,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            radius_meters:    DEFAULT_RADIUS_M,
            max_result_edges: DEFAULT_MAX_RESULT_EDGES,
            start_time_ms:    0,
            limits:           SearchLimits::default(),
            cost:             CostModel::default(),
        }
    }
}
