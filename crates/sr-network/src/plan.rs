//! Point-to-point query planning on top of the street router.
//!
//! A [`Planner`] owns the query configuration and borrows the immutable
//! network; every [`plan`](Planner::plan) call builds its own
//! [`StreetRouter`], so one planner serves any number of threads.
//!
//! # Query flow
//!
//! ```text
//! destination split ── none ──► DestinationNotFound
//!        │
//! origin split ─────── none ──► OriginNotFound
//!        │
//! route (early exit at the destination, or exhaustive with a full trace)
//!        │
//! get_state(destination) ── none ──► Unreachable(origin diagnostics)
//!        │
//!      Found(path)
//! ```

use log::debug;

use sr_core::{EdgeId, Envelope, GeoPoint, Mode, VertexId};
use sr_street::{
    SearchSummary, Split, State, StreetLayer, StreetResult, StreetRouter, TraceEvent, TraceVisitor,
};

use crate::config::QueryConfig;
use crate::diagnostics::{self, EdgeReport, FlagUsage, SpeedHistogram, StreetEdgesReport};
use crate::network::TransportNetwork;
use crate::NetworkResult;

// ── Request ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanRequest {
    pub mode:       Mode,
    pub from:       GeoPoint,
    pub to:         GeoPoint,
    /// Record every frontier push and settle of an exhaustive search.
    pub full_trace: bool,
}

impl PlanRequest {
    pub fn new(mode: Mode, from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> Self {
        Self {
            mode,
            from:       GeoPoint::new(from_lat, from_lon),
            to:         GeoPoint::new(to_lat, to_lon),
            full_trace: false,
        }
    }

    pub fn with_full_trace(mut self) -> Self {
        self.full_trace = true;
        self
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// One traversed edge of a path.  Weight and time are cumulative at the end
/// of the step; the first and last steps may cover only part of their edge.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PathStep {
    pub edge:     EdgeId,
    pub from:     VertexId,
    pub to:       VertexId,
    pub weight:   f64,
    pub time_ms:  i64,
    /// Full edge polyline in the direction of travel.
    pub geometry: Vec<GeoPoint>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlannedPath {
    pub origin:          Split,
    pub destination:     Split,
    pub weight:          f64,
    pub duration_ms:     i64,
    pub arrival_time_ms: i64,
    pub steps:           Vec<PathStep>,
    /// Vertices settled by the search that produced this path.
    pub settled:         usize,
}

/// One endpoint of the origin's edge, with everything leaving it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SplitEndpoint {
    pub vertex:      VertexId,
    pub point:       GeoPoint,
    /// Distance along the edge from the split point to this vertex.
    pub distance_mm: u32,
    pub outgoing:    Vec<EdgeReport>,
}

/// What the search started from, returned when the destination could not
/// be reached so a client can see why.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OriginDiagnostics {
    pub split:   Split,
    pub point:   GeoPoint,
    pub vertex0: SplitEndpoint,
    pub vertex1: SplitEndpoint,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlanOutcome {
    Found {
        path:  PlannedPath,
        trace: Option<Vec<TraceEvent>>,
    },
    Unreachable {
        origin: OriginDiagnostics,
        trace:  Option<Vec<TraceEvent>>,
    },
    OriginNotFound,
    DestinationNotFound,
}

impl PlanOutcome {
    pub fn path(&self) -> Option<&PlannedPath> {
        match self {
            PlanOutcome::Found { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn trace(&self) -> Option<&[TraceEvent]> {
        match self {
            PlanOutcome::Found { trace, .. } | PlanOutcome::Unreachable { trace, .. } => {
                trace.as_deref()
            }
            _ => None,
        }
    }
}

// ── Planner ───────────────────────────────────────────────────────────────────

pub struct Planner<'a> {
    network: &'a TransportNetwork,
    config:  QueryConfig,
}

impl<'a> Planner<'a> {
    pub fn new(network: &'a TransportNetwork, config: QueryConfig) -> Self {
        Self { network, config }
    }

    pub fn network(&self) -> &'a TransportNetwork {
        self.network
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// A fresh router for `mode` carrying this planner's configuration.
    pub fn router(&self, mode: Mode) -> StreetRouter<'a> {
        StreetRouter::new(self.network.streets(), mode)
            .with_cost(self.config.cost.clone())
            .with_limits(self.config.limits.clone())
            .with_radius_m(self.config.radius_meters)
            .with_start_time_ms(self.config.start_time_ms)
    }

    /// Answer one point-to-point query.
    pub fn plan(&self, request: &PlanRequest) -> NetworkResult<PlanOutcome> {
        let layer = self.network.streets();
        let (from, to) = (request.from, request.to);

        let Some(destination) = layer.find_split(to.lat, to.lon, self.config.radius_meters, request.mode)
        else {
            debug!("no {} edge within {} m of destination {to}", request.mode, self.config.radius_meters);
            return Ok(PlanOutcome::DestinationNotFound);
        };

        let mut router = self.router(request.mode);
        if !router.set_origin(from.lat, from.lon) {
            debug!("no {} edge within {} m of origin {from}", request.mode, self.config.radius_meters);
            return Ok(PlanOutcome::OriginNotFound);
        }
        let Some(origin) = router.origin_split().copied() else {
            return Ok(PlanOutcome::OriginNotFound);
        };
        // A full trace covers the whole exploration, so no early exit.
        if !request.full_trace {
            router.set_destination(destination);
        }

        let (summary, trace) = if request.full_trace {
            let mut visitor = TraceVisitor::new();
            let summary = router.route_observed(&mut visitor)?;
            (summary, Some(visitor.into_events()))
        } else {
            (router.route()?, None)
        };

        match router.get_state(&destination) {
            Some(state) => {
                let path = self.assemble(&router, &state, origin, destination, &summary)?;
                Ok(PlanOutcome::Found { path, trace })
            }
            None => {
                let origin = origin_diagnostics(layer, &origin)?;
                Ok(PlanOutcome::Unreachable { origin, trace })
            }
        }
    }

    /// Answer independent queries, in request order.  Runs on Rayon's
    /// thread pool with the `parallel` feature; results are identical either
    /// way.
    pub fn plan_batch(&self, requests: &[PlanRequest]) -> Vec<NetworkResult<PlanOutcome>> {
        #[cfg(not(feature = "parallel"))]
        {
            requests.iter().map(|r| self.plan(r)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            requests.par_iter().map(|r| self.plan(r)).collect()
        }
    }

    fn assemble(
        &self,
        router:      &StreetRouter<'_>,
        terminal:    &State,
        origin:      Split,
        destination: Split,
        summary:     &SearchSummary,
    ) -> NetworkResult<PlannedPath> {
        let layer = self.network.streets();
        let steps = router
            .chain(terminal)
            .iter()
            .filter_map(|s| s.back_edge.map(|e| (e, s)))
            .map(|(e, s)| {
                let edge = layer.edge(e)?;
                Ok(PathStep {
                    edge:     e,
                    from:     edge.from_vertex(),
                    to:       edge.to_vertex(),
                    weight:   s.weight,
                    time_ms:  s.time_ms,
                    geometry: edge.geometry().into_iter().map(|p| p.to_floating()).collect(),
                })
            })
            .collect::<StreetResult<Vec<_>>>()?;

        Ok(PlannedPath {
            origin,
            destination,
            weight:          terminal.weight,
            duration_ms:     terminal.time_ms - self.config.start_time_ms,
            arrival_time_ms: terminal.time_ms,
            steps,
            settled:         summary.settled,
        })
    }

    // ── Diagnostics with this planner's result cap ────────────────────────

    pub fn street_edges(&self, envelope: &Envelope, both: bool) -> NetworkResult<StreetEdgesReport> {
        let layer = self.network.streets();
        Ok(diagnostics::street_edges(layer, envelope, both, self.config.max_result_edges)?)
    }

    pub fn flag_usage(&self, envelope: Option<&Envelope>) -> NetworkResult<FlagUsage> {
        let layer = self.network.streets();
        Ok(diagnostics::flag_usage(layer, envelope, self.config.max_result_edges)?)
    }

    pub fn speed_histogram(&self, envelope: Option<&Envelope>) -> NetworkResult<SpeedHistogram> {
        let layer = self.network.streets();
        Ok(diagnostics::speed_histogram(layer, envelope, self.config.max_result_edges)?)
    }
}

fn origin_diagnostics(layer: &StreetLayer, split: &Split) -> StreetResult<OriginDiagnostics> {
    let endpoint = |vertex: VertexId, distance_mm: u32| -> StreetResult<SplitEndpoint> {
        Ok(SplitEndpoint {
            vertex,
            point: layer.vertex(vertex)?.point.to_floating(),
            distance_mm,
            outgoing: diagnostics::outgoing_edges(layer, vertex)?,
        })
    };
    Ok(OriginDiagnostics {
        split:   *split,
        point:   split.point().to_floating(),
        vertex0: endpoint(split.vertex0, split.distance0_mm)?,
        vertex1: endpoint(split.vertex1, split.distance1_mm)?,
    })
}
