//! Read-only inspection of a loaded network: edges and flagged vertices in
//! an area, attribute usage counts, speed histograms, single-edge lookups
//! and network metadata.
//!
//! Area queries go through the spatial index and are refused with
//! [`ResultTooLarge`](sr_street::StreetError::ResultTooLarge) when more
//! forward edges match than the caller's cap allows.  Whole-network statistics (`envelope = None`) walk
//! every forward edge and are never capped.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use sr_core::{EdgeId, Envelope, GeoPoint, VertexId};
use sr_street::{Edge, StreetLayer, StreetResult, VertexFlags};

use crate::network::TransportNetwork;

// ── Reports ───────────────────────────────────────────────────────────────────

/// One directed edge as shown to a debugging client.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EdgeReport {
    pub edge:        EdgeId,
    pub from:        VertexId,
    pub to:          VertexId,
    /// Polyline in the edge's direction of travel.
    pub geometry:    Vec<GeoPoint>,
    pub length_mm:   u32,
    pub speed_ms:    f64,
    /// `|`-joined permission names, e.g. `"PEDESTRIAN|BIKE"`.
    pub permissions: String,
    /// `|`-joined edge flag names.
    pub flags:       String,
    /// Set on a forward edge whose backward partner has different
    /// permissions.  Only reported when backward edges are not listed
    /// separately.
    pub one_way:     bool,
}

impl EdgeReport {
    pub fn of(edge: &Edge<'_>) -> Self {
        Self {
            edge:        edge.id(),
            from:        edge.from_vertex(),
            to:          edge.to_vertex(),
            geometry:    edge.geometry().into_iter().map(|p| p.to_floating()).collect(),
            length_mm:   edge.length_mm(),
            speed_ms:    edge.speed_ms(),
            permissions: edge.permissions_string(),
            flags:       edge.flags_string(),
            one_way:     false,
        }
    }
}

/// A vertex carrying at least one flag.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexReport {
    pub vertex: VertexId,
    pub point:  GeoPoint,
    pub flags:  String,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StreetEdgesReport {
    pub edges:    Vec<EdgeReport>,
    /// Flagged endpoints of the listed edges, ascending id, each once.
    pub vertices: Vec<VertexReport>,
}

/// How many forward edges carry each permission and flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FlagUsage {
    pub edges:  usize,
    pub counts: BTreeMap<&'static str, usize>,
}

/// Forward-edge counts per stored speed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpeedHistogram {
    /// `(speed_cm_s, edge count)`, ascending by speed.
    pub counts:   Vec<(u16, usize)>,
    pub min_cm_s: Option<u16>,
    pub max_cm_s: Option<u16>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EdgeGeometry {
    pub edge:     EdgeId,
    pub geometry: Vec<GeoPoint>,
    pub envelope: Envelope,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NetworkMetadata {
    pub envelope:     Option<Envelope>,
    pub time_zone:    Option<String>,
    pub vertex_count: usize,
    pub edge_count:   usize,
}

// ── Queries ───────────────────────────────────────────────────────────────────

/// Forward edges inside `envelope` (capped), or every forward edge.
fn forward_edges(
    layer:    &StreetLayer,
    envelope: Option<&Envelope>,
    cap:      usize,
) -> StreetResult<Vec<EdgeId>> {
    match envelope {
        Some(env) => layer.edges_in_envelope(env, cap),
        None => Ok(layer.edge_store().forward_edges().map(|e| e.id()).collect()),
    }
}

/// Edges intersecting `envelope` with their attributes.
///
/// With `both`, each backward edge follows its forward edge in the listing;
/// otherwise only forward edges are listed and marked `one_way` when the two
/// directions' permissions differ.
pub fn street_edges(
    layer:    &StreetLayer,
    envelope: &Envelope,
    both:     bool,
    cap:      usize,
) -> StreetResult<StreetEdgesReport> {
    let ids = layer.edges_in_envelope(envelope, cap)?;
    let mut edges = Vec::with_capacity(if both { ids.len() * 2 } else { ids.len() });
    let mut flagged = BTreeSet::new();

    for id in ids {
        let edge = layer.edge(id)?;
        let mut report = EdgeReport::of(&edge);
        if !both {
            report.one_way = edge.permissions() != edge.partner().permissions();
        }
        edges.push(report);
        if both {
            edges.push(EdgeReport::of(&edge.partner()));
        }

        for v in [edge.from_vertex(), edge.to_vertex()] {
            if layer.vertex(v)?.flags != VertexFlags::empty() {
                flagged.insert(v);
            }
        }
    }

    let vertices = flagged
        .into_iter()
        .map(|v| {
            let vertex = layer.vertex(v)?;
            Ok(VertexReport { vertex: v, point: vertex.point.to_floating(), flags: vertex.flags.names() })
        })
        .collect::<StreetResult<Vec<_>>>()?;

    Ok(StreetEdgesReport { edges, vertices })
}

/// Count permission and flag usage over forward edges.
pub fn flag_usage(
    layer:    &StreetLayer,
    envelope: Option<&Envelope>,
    cap:      usize,
) -> StreetResult<FlagUsage> {
    let ids = forward_edges(layer, envelope, cap)?;
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for &id in &ids {
        let edge = layer.edge(id)?;
        let names = edge
            .permissions()
            .iter_names()
            .map(|(name, _)| name)
            .chain(edge.flags().iter_names().map(|(name, _)| name));
        for name in names {
            *counts.entry(name).or_insert(0) += 1;
        }
    }
    Ok(FlagUsage { edges: ids.len(), counts })
}

/// Histogram of stored forward-edge speeds with their extremes.
pub fn speed_histogram(
    layer:    &StreetLayer,
    envelope: Option<&Envelope>,
    cap:      usize,
) -> StreetResult<SpeedHistogram> {
    let ids = forward_edges(layer, envelope, cap)?;
    let mut usage: FxHashMap<u16, usize> = FxHashMap::default();
    for id in ids {
        *usage.entry(layer.edge(id)?.speed_cm_s()).or_insert(0) += 1;
    }

    let mut counts: Vec<(u16, usize)> = usage.into_iter().collect();
    counts.sort_unstable();
    Ok(SpeedHistogram {
        min_cm_s: counts.first().map(|&(speed, _)| speed),
        max_cm_s: counts.last().map(|&(speed, _)| speed),
        counts,
    })
}

/// Geometry and bounding envelope of one edge.
pub fn edge_geometry(layer: &StreetLayer, id: EdgeId) -> StreetResult<EdgeGeometry> {
    let edge = layer.edge(id)?;
    Ok(EdgeGeometry {
        edge:     id,
        geometry: edge.geometry().into_iter().map(|p| p.to_floating()).collect(),
        envelope: edge.envelope(),
    })
}

/// Outgoing edges of `vertex` as reports, ascending id.
pub fn outgoing_edges(layer: &StreetLayer, vertex: VertexId) -> StreetResult<Vec<EdgeReport>> {
    layer
        .outgoing_edges(vertex)?
        .iter()
        .map(|&e| layer.edge(e).map(|edge| EdgeReport::of(&edge)))
        .collect()
}

pub fn metadata(network: &TransportNetwork) -> NetworkMetadata {
    NetworkMetadata {
        envelope:     network.envelope(),
        time_zone:    network.time_zone().map(str::to_owned),
        vertex_count: network.streets().vertex_count(),
        edge_count:   network.streets().edge_count(),
    }
}
