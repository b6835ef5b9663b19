//! Binary network format.
//!
//! # Layout (all integers little endian)
//!
//! ```text
//! magic        8 bytes   "SRNET\0\0\0"
//! version      u16
//! vertices     u32 count, then per vertex:
//!                i32 lat, i32 lon (fixed point), u8 flags
//! edges        u32 directed-edge count (even), then per forward/backward pair:
//!                u32 from, u32 to, u32 length_mm,
//!                u32 point count, (i32 lat, i32 lon) × count,
//!                forward:  u16 speed_cm_s, u8 permissions, u32 flags
//!                backward: u16 speed_cm_s, u8 permissions, u32 flags
//! transit      u8 has_time_zone, then u32 length + UTF-8 bytes if set
//! crc64        u64 CRC-64/GO-ISO over every preceding byte
//! ```
//!
//! Adjacency and the spatial index are derived data and are not stored;
//! [`read_network`] rebuilds both.

use std::io::{self, Read, Write};

use crc::{CRC_64_GO_ISO, Crc};
use log::info;

use sr_core::{FixedPoint, VertexId};
use sr_street::{
    EdgeAttrs, EdgeFlags, EdgeStore, PermissionFlags, StreetLayer, VertexFlags, VertexStore,
};

use crate::network::{TransitInfo, TransportNetwork};
use crate::{DecodeError, NetworkResult};

pub const MAGIC: &[u8; 8] = b"SRNET\0\0\0";
pub const VERSION: u16 = 1;

static CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);

/// Bytes per vertex record.
const VERTEX_BYTES: usize = 9;
/// Smallest possible pair record: header, two points, two attribute blocks.
const MIN_PAIR_BYTES: usize = 16 + 2 * 8 + 2 * 7;

// ── Writing ───────────────────────────────────────────────────────────────────

/// Forwards every byte to `inner` and into the running checksum.
struct ChecksumWriter<W> {
    inner:   W,
    digest:  crc::Digest<'static, u64>,
    written: usize,
}

impl<W: Write> ChecksumWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, digest: CRC64.digest(), written: 0 }
    }

    fn bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.digest.update(bytes);
        self.written += bytes.len();
        Ok(())
    }

    fn u8(&mut self, v: u8) -> io::Result<()> {
        self.bytes(&[v])
    }

    fn u16(&mut self, v: u16) -> io::Result<()> {
        self.bytes(&v.to_le_bytes())
    }

    fn u32(&mut self, v: u32) -> io::Result<()> {
        self.bytes(&v.to_le_bytes())
    }

    fn i32(&mut self, v: i32) -> io::Result<()> {
        self.bytes(&v.to_le_bytes())
    }

    fn point(&mut self, p: FixedPoint) -> io::Result<()> {
        self.i32(p.lat)?;
        self.i32(p.lon)
    }

    fn attrs(&mut self, speed_cm_s: u16, permissions: PermissionFlags, flags: EdgeFlags) -> io::Result<()> {
        self.u16(speed_cm_s)?;
        self.u8(permissions.bits())?;
        self.u32(flags.bits())
    }

    /// Append the checksum footer and flush.  Returns the total byte count.
    fn finish(mut self) -> io::Result<usize> {
        let crc = self.digest.finalize();
        self.inner.write_all(&crc.to_le_bytes())?;
        self.inner.flush()?;
        Ok(self.written + 8)
    }
}

pub fn write_network<W: Write>(network: &TransportNetwork, sink: W) -> NetworkResult<()> {
    let layer = network.streets();
    let mut w = ChecksumWriter::new(sink);

    w.bytes(MAGIC)?;
    w.u16(VERSION)?;

    let vertices = layer.vertex_store();
    w.u32(vertices.count() as u32)?;
    for v in vertices.iter() {
        w.point(v.point)?;
        w.u8(v.flags.bits())?;
    }

    let edges = layer.edge_store();
    w.u32(edges.count() as u32)?;
    for e in edges.forward_edges() {
        w.u32(e.from_vertex().0)?;
        w.u32(e.to_vertex().0)?;
        w.u32(e.length_mm())?;
        let coords = e.forward_geometry();
        w.u32(coords.len() as u32)?;
        for &p in coords {
            w.point(p)?;
        }
        for dir in [e, e.partner()] {
            w.attrs(dir.speed_cm_s(), dir.permissions(), dir.flags())?;
        }
    }

    match &network.transit().time_zone {
        Some(tz) => {
            w.u8(1)?;
            w.u32(tz.len() as u32)?;
            w.bytes(tz.as_bytes())?;
        }
        None => w.u8(0)?,
    }

    let total = w.finish()?;
    info!(
        "wrote network: {} vertices, {} edges, {} bytes",
        vertices.count(),
        edges.count(),
        total
    );
    Ok(())
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Bounds-checked cursor over the input.
struct ByteReader<'a> {
    data: &'a [u8],
    pos:  usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated { offset: self.pos, needed: n - self.remaining() });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        self.array().map(u32::from_le_bytes)
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        self.array().map(i32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, DecodeError> {
        self.array().map(u64::from_le_bytes)
    }

    fn point(&mut self) -> Result<FixedPoint, DecodeError> {
        Ok(FixedPoint::new(self.i32()?, self.i32()?))
    }
}

pub fn read_network<R: Read>(mut source: R) -> NetworkResult<TransportNetwork> {
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    let mut r = ByteReader::new(&data);

    let magic = r.take(MAGIC.len())?;
    if magic != MAGIC {
        return Err(DecodeError::BadMagic { found: magic.to_vec() }.into());
    }
    let version = r.u16()?;
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version, expected: VERSION }.into());
    }

    let vertices = read_vertices(&mut r)?;
    let edges = read_edges(&mut r)?;
    let transit = read_transit(&mut r)?;

    let body_len = r.pos;
    let stored = r.u64()?;
    let computed = CRC64.checksum(&data[..body_len]);
    if stored != computed {
        return Err(DecodeError::ChecksumMismatch { stored, computed }.into());
    }
    if r.remaining() != 0 {
        return Err(DecodeError::Invalid(format!("{} trailing byte(s)", r.remaining())).into());
    }

    let streets = StreetLayer::from_stores(vertices, edges)
        .map_err(|e| DecodeError::Invalid(e.to_string()))?;
    info!(
        "loaded network: {} vertices, {} edges, {} bytes",
        streets.vertex_count(),
        streets.edge_count(),
        data.len()
    );
    Ok(TransportNetwork::from_parts(streets, transit))
}

fn read_vertices(r: &mut ByteReader<'_>) -> Result<VertexStore, DecodeError> {
    let count = r.u32()? as usize;
    let mut store = VertexStore::with_capacity(count.min(r.remaining() / VERTEX_BYTES));
    for i in 0..count {
        let point = r.point()?;
        let bits = r.u8()?;
        let flags = VertexFlags::from_bits(bits).ok_or_else(|| {
            DecodeError::Invalid(format!("vertex {i}: unknown flag bits {bits:#04x}"))
        })?;
        store.push(point, flags);
    }
    Ok(store)
}

fn read_attrs(r: &mut ByteReader<'_>, pair: usize) -> Result<EdgeAttrs, DecodeError> {
    let speed_cm_s = r.u16()?;
    let perm_bits = r.u8()?;
    let flag_bits = r.u32()?;
    let permissions = PermissionFlags::from_bits(perm_bits).ok_or_else(|| {
        DecodeError::Invalid(format!("pair {pair}: unknown permission bits {perm_bits:#04x}"))
    })?;
    let flags = EdgeFlags::from_bits(flag_bits).ok_or_else(|| {
        DecodeError::Invalid(format!("pair {pair}: unknown edge flag bits {flag_bits:#010x}"))
    })?;
    Ok(EdgeAttrs { permissions, flags, speed_cm_s })
}

fn read_edges(r: &mut ByteReader<'_>) -> Result<EdgeStore, DecodeError> {
    let count = r.u32()? as usize;
    if count % 2 != 0 {
        return Err(DecodeError::Invalid(format!("odd directed edge count {count}")));
    }
    let pairs = count / 2;
    let mut store = EdgeStore::with_capacity(pairs.min(r.remaining() / MIN_PAIR_BYTES));
    let mut coords: Vec<FixedPoint> = Vec::new();

    for pair in 0..pairs {
        let from = VertexId(r.u32()?);
        let to = VertexId(r.u32()?);
        let length_mm = r.u32()?;
        let points = r.u32()? as usize;
        if points < 2 {
            return Err(DecodeError::Invalid(format!("pair {pair}: {points} geometry point(s)")));
        }
        coords.clear();
        coords.reserve(points.min(r.remaining() / 8));
        for _ in 0..points {
            coords.push(r.point()?);
        }
        let forward = read_attrs(r, pair)?;
        let backward = read_attrs(r, pair)?;
        store
            .push_pair(from, to, length_mm, &coords, forward, backward)
            .map_err(|e| DecodeError::Invalid(e.to_string()))?;
    }
    Ok(store)
}

fn read_transit(r: &mut ByteReader<'_>) -> Result<TransitInfo, DecodeError> {
    let time_zone = match r.u8()? {
        0 => None,
        1 => {
            let len = r.u32()? as usize;
            let bytes = r.take(len)?;
            let tz = String::from_utf8(bytes.to_vec())
                .map_err(|e| DecodeError::Invalid(format!("time zone: {e}")))?;
            Some(tz)
        }
        tag => return Err(DecodeError::Invalid(format!("unknown transit tag {tag}"))),
    };
    Ok(TransitInfo { time_zone })
}
