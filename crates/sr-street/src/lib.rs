//! `sr-street` — street graph stores, spatial index, and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`flags`]   | `PermissionFlags`, `EdgeFlags`, `VertexFlags`               |
//! | [`vertex`]  | `VertexStore`, `Vertex`                                     |
//! | [`edge`]    | `EdgeStore` (paired directed edges), `Edge`, `EdgeAttrs`    |
//! | [`spatial`] | `EdgeIndex` (R-tree over forward-edge bboxes)               |
//! | [`layer`]   | `StreetLayer` (stores + CSR adjacency), `StreetLayerBuilder`|
//! | [`split`]   | `Split`, `find_split`                                       |
//! | [`cost`]    | `CostModel`, `Traversal`                                    |
//! | [`router`]  | `StreetRouter`, `State`, `SearchLimits`, `SearchStatus`     |
//! | [`visitor`] | `RoutingVisitor`, `TraceVisitor`                            |
//! | [`error`]   | `StreetError`, `RouterError`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on splits, limits and costs.|

pub mod cost;
pub mod edge;
pub mod error;
pub mod flags;
pub mod layer;
pub mod router;
pub mod spatial;
pub mod split;
pub mod vertex;
pub mod visitor;

#[cfg(test)]
mod tests;

pub use cost::{CostModel, Traversal};
pub use edge::{Edge, EdgeAttrs, EdgeStore};
pub use error::{RouterError, StreetError, StreetResult};
pub use flags::{EdgeFlags, PermissionFlags, VertexFlags};
pub use layer::{Street, StreetLayer, StreetLayerBuilder, polyline_length_mm};
pub use router::{DEFAULT_RADIUS_M, SearchLimits, SearchStatus, SearchSummary, State, StreetRouter};
pub use spatial::EdgeIndex;
pub use split::{Split, find_split};
pub use vertex::{Vertex, VertexStore};
pub use visitor::{NoopVisitor, RoutingVisitor, TraceEvent, TraceKind, TraceVisitor};
