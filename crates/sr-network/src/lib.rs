//! `sr-network` — the loaded transport network and the query surface over it.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                 |
//! |-----------------|----------------------------------------------------------|
//! | [`network`]     | `TransportNetwork`, `TransitInfo`                        |
//! | [`codec`]       | binary format: `write_network`, `read_network`           |
//! | [`diagnostics`] | edges/vertices in an area, flag usage, speed histogram   |
//! | [`config`]      | `QueryConfig`                                            |
//! | [`plan`]        | `Planner`, `PlanRequest`, `PlanOutcome`                  |
//! | [`queries`]     | CSV loader for benchmark query sets                      |
//! | [`error`]       | `NetworkError`, `DecodeError`                            |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `serde`    | Derives serde traits on config, requests and reports.    |
//! | `parallel` | Runs `Planner::plan_batch` on Rayon's thread pool.       |

pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod network;
pub mod plan;
pub mod queries;


pub use config::{DEFAULT_MAX_RESULT_EDGES, QueryConfig};
pub use error::{DecodeError, NetworkError, NetworkResult};
pub use network::{TransitInfo, TransportNetwork};
pub use plan::{
    OriginDiagnostics, PathStep, PlanOutcome, PlanRequest, PlannedPath, Planner, SplitEndpoint,
};
pub use queries::{load_requests_csv, load_requests_reader};
