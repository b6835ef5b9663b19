//! The loaded transport network: one street layer plus transit metadata.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::info;

use sr_core::Envelope;
use sr_street::StreetLayer;

use crate::codec;
use crate::NetworkResult;

/// Transit-side metadata carried alongside the streets.  Schedules are not
/// part of this workspace; only what the street queries report survives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitInfo {
    /// IANA zone name the network's timetables were built in, if known.
    pub time_zone: Option<String>,
}

/// Immutable, shareable network.  Build once, then query from any number of
/// threads through `&TransportNetwork` or `Arc<TransportNetwork>`.
pub struct TransportNetwork {
    streets: StreetLayer,
    transit: TransitInfo,
}

impl TransportNetwork {
    pub fn new(streets: StreetLayer) -> Self {
        Self { streets, transit: TransitInfo::default() }
    }

    pub fn from_parts(streets: StreetLayer, transit: TransitInfo) -> Self {
        Self { streets, transit }
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.transit.time_zone = Some(time_zone.into());
        self
    }

    pub fn streets(&self) -> &StreetLayer {
        &self.streets
    }

    pub fn transit(&self) -> &TransitInfo {
        &self.transit
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.transit.time_zone.as_deref()
    }

    /// Bounding envelope of every street vertex.
    pub fn envelope(&self) -> Option<Envelope> {
        self.streets.envelope()
    }

    // ── Persistence ───────────────────────────────────────────────────────

    /// Serialize into `sink` (see [`codec`] for the layout).
    pub fn write<W: Write>(&self, sink: W) -> NetworkResult<()> {
        codec::write_network(self, sink)
    }

    /// Deserialize from `source`, rebuilding adjacency and the spatial index.
    pub fn read<R: Read>(source: R) -> NetworkResult<Self> {
        codec::read_network(source)
    }

    pub fn write_to_path(&self, path: &Path) -> NetworkResult<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))?;
        info!("wrote network to {}", path.display());
        Ok(())
    }

    pub fn read_from_path(path: &Path) -> NetworkResult<Self> {
        let file = File::open(path)?;
        let network = Self::read(BufReader::new(file))?;
        info!("loaded network from {}", path.display());
        Ok(network)
    }
}
