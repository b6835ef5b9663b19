//! `sr-core` — foundational types for the street routing engine.
//!
//! This crate is a dependency of every other `sr-*` crate.  It has no `sr-*`
//! dependencies and a single external one (`thiserror`, plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                                   |
//! |-----------|------------------------------------------------------------|
//! | [`ids`]   | `VertexId`, `EdgeId`, `StateId`                            |
//! | [`geo`]   | fixed-point codec, `GeoPoint`, `FixedPoint`, `Envelope`    |
//! | [`mode`]  | `Mode` (walk / bike / car)                                 |
//! | [`error`] | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod mode;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{
    Envelope, FIXED_FACTOR, FixedPoint, GeoPoint, fixed_to_floating, floating_to_fixed,
};
pub use ids::{EdgeId, StateId, VertexId};
pub use mode::Mode;
