//! 20×20 synthetic street grid over central Turin.
//!
//! ```text
//!  row 19  ─────────────────────────  (north)
//!          │ ┊ │ ┊ │ ┊ │ ┊ │ ┊ │ ┊ …
//!  row 0   ─────────────────────────  (south)
//!         col 0                col 19
//! ```
//!
//! Rows are two-way streets open to every mode.  Even columns are avenues
//! open to every mode; odd columns are pedestrian and cycle lanes (`┊`).
//! Every fourth row is a one-way eastbound car arterial instead, and every
//! fifth intersection has a traffic signal.  One flight of stairs links the
//! two southernmost rows in column 1.

use sr_core::{GeoPoint, VertexId};
use sr_street::{
    EdgeAttrs, EdgeFlags, PermissionFlags, Street, StreetLayer, StreetLayerBuilder, StreetResult,
    VertexFlags,
};

pub const ROWS: usize = 20;
pub const COLS: usize = 20;

/// South-west corner of the grid.
const LAT_MIN: f64 = 45.06;
const LON_MIN: f64 = 7.66;

/// Block size in metres.
const SPACING_M: f64 = 120.0;

/// ~50 km/h and ~30 km/h in m/s.
const ARTERIAL_MS: f64 = 13.89;
const STREET_MS:   f64 = 8.33;

pub fn build_network() -> StreetResult<(StreetLayer, Vec<VertexId>)> {
    let sw = GeoPoint::new(LAT_MIN, LON_MIN);
    let mut b = StreetLayerBuilder::with_capacity(ROWS * COLS, 2 * ROWS * COLS);
    let mut vertices = Vec::with_capacity(ROWS * COLS);

    for row in 0..ROWS {
        for col in 0..COLS {
            let pos = sw.offset_m(row as f64 * SPACING_M, col as f64 * SPACING_M);
            let flags = if (row * COLS + col) % 5 == 0 {
                VertexFlags::TRAFFIC_SIGNAL
            } else {
                VertexFlags::empty()
            };
            vertices.push(b.add_vertex_with_flags(pos, flags));
        }
    }
    let at = |row: usize, col: usize| vertices[row * COLS + col];

    let all = PermissionFlags::PEDESTRIAN | PermissionFlags::BIKE | PermissionFlags::CAR;
    let street = EdgeAttrs::new(all, STREET_MS);
    let arterial = EdgeAttrs::new(PermissionFlags::CAR, ARTERIAL_MS);
    let lane = EdgeAttrs::new(PermissionFlags::PEDESTRIAN | PermissionFlags::BIKE, STREET_MS)
        .with_flags(EdgeFlags::BIKE_PATH | EdgeFlags::SIDEWALK);
    let stairs = EdgeAttrs::new(PermissionFlags::PEDESTRIAN, 1.4).with_flags(EdgeFlags::STAIRS);

    for row in 0..ROWS {
        for col in 0..COLS - 1 {
            let s = if row % 4 == 3 {
                Street::new(at(row, col), at(row, col + 1), arterial).one_way()
            } else {
                Street::new(at(row, col), at(row, col + 1), street)
            };
            b.add_street(s)?;
        }
    }

    for row in 0..ROWS - 1 {
        for col in 0..COLS {
            let attrs = match (row, col) {
                (0, 1) => stairs,
                (_, c) if c % 2 == 1 => lane,
                _ => street,
            };
            b.add_street(Street::new(at(row, col), at(row + 1, col), attrs))?;
        }
    }

    Ok((b.build(), vertices))
}
