//! CSV loader for benchmark query sets.
//!
//! # CSV format
//!
//! One row per query.  `full_trace` is optional and defaults to `false`.
//!
//! ```csv
//! mode,from_lat,from_lon,to_lat,to_lon,full_trace
//! walk,45.0001,7.0004,45.0009,7.0011,false
//! car,45.0001,7.0004,45.0009,7.0011,
//! bicycle,45.0001,7.0004,45.0009,7.0011,true
//! ```
//!
//! `mode` accepts the names [`Mode`]'s `FromStr` does, case-insensitively.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use sr_core::{GeoPoint, Mode};

use crate::plan::PlanRequest;
use crate::{NetworkError, NetworkResult};

#[derive(Deserialize)]
struct QueryRecord {
    mode:       String,
    from_lat:   f64,
    from_lon:   f64,
    to_lat:     f64,
    to_lon:     f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    full_trace: Option<bool>,
}

/// Load plan requests from a CSV file.
pub fn load_requests_csv(path: &Path) -> NetworkResult<Vec<PlanRequest>> {
    let file = std::fs::File::open(path)?;
    load_requests_reader(file)
}

/// Like [`load_requests_csv`] but accepts any `Read` source.
pub fn load_requests_reader<R: Read>(reader: R) -> NetworkResult<Vec<PlanRequest>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut requests = Vec::new();

    for (row, result) in csv_reader.deserialize::<QueryRecord>().enumerate() {
        let rec = result.map_err(|e| NetworkError::Parse(e.to_string()))?;
        let mode: Mode = rec
            .mode
            .parse()
            .map_err(|e| NetworkError::Parse(format!("row {}: {e}", row + 1)))?;
        let from = GeoPoint::checked(rec.from_lat, rec.from_lon)?;
        let to = GeoPoint::checked(rec.to_lat, rec.to_lon)?;
        requests.push(PlanRequest { mode, from, to, full_trace: rec.full_trace.unwrap_or(false) });
    }

    Ok(requests)
}
