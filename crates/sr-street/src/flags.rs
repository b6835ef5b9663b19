//! Typed bitsets for vertex and edge attributes.
//!
//! Each set is a `bitflags` type backed by a fixed-width integer, so the
//! stores keep one compact column per attribute and callers test members by
//! name instead of by bit position.

use bitflags::bitflags;

use sr_core::Mode;

bitflags! {
    /// Which travel modes may traverse a directed edge.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PermissionFlags: u8 {
        const PEDESTRIAN = 1 << 0;
        const BIKE       = 1 << 1;
        const CAR        = 1 << 2;
        const WHEELCHAIR = 1 << 3;
    }
}

impl PermissionFlags {
    /// The permission a search in `mode` needs.
    #[inline]
    pub fn for_mode(mode: Mode) -> PermissionFlags {
        match mode {
            Mode::Walk => PermissionFlags::PEDESTRIAN,
            Mode::Bike => PermissionFlags::BIKE,
            Mode::Car  => PermissionFlags::CAR,
        }
    }

    #[inline]
    pub fn allows(self, mode: Mode) -> bool {
        self.contains(PermissionFlags::for_mode(mode))
    }

    /// Member names joined with `|`, e.g. `"PEDESTRIAN|BIKE"`.
    pub fn names(self) -> String {
        join_names(self.iter_names().map(|(name, _)| name))
    }
}

bitflags! {
    /// Descriptive attributes of a directed edge.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EdgeFlags: u32 {
        const BIKE_PATH                  = 1 << 0;
        const SIDEWALK                   = 1 << 1;
        const CROSSING                   = 1 << 2;
        const ROUNDABOUT                 = 1 << 3;
        const ELEVATOR                   = 1 << 4;
        const STAIRS                     = 1 << 5;
        const PLATFORM                   = 1 << 6;
        const BOGUS_NAME                 = 1 << 7;
        const NO_THRU_TRAFFIC            = 1 << 8;
        const NO_THRU_TRAFFIC_PEDESTRIAN = 1 << 9;
        const NO_THRU_TRAFFIC_BIKE       = 1 << 10;
        const NO_THRU_TRAFFIC_CAR        = 1 << 11;
        const SLOPE_OVERRIDE             = 1 << 12;
        const TRANSIT_LINK               = 1 << 13;
        const LINK                       = 1 << 14;
        const LIMITED_WHEELCHAIR         = 1 << 15;
    }
}

impl EdgeFlags {
    #[inline]
    pub fn has(self, flag: EdgeFlags) -> bool {
        self.contains(flag)
    }

    pub fn names(self) -> String {
        join_names(self.iter_names().map(|(name, _)| name))
    }
}

bitflags! {
    /// Attributes of a street vertex.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct VertexFlags: u8 {
        const TRAFFIC_SIGNAL = 1 << 0;
        const PARK_AND_RIDE  = 1 << 1;
        const BIKE_SHARING   = 1 << 2;
    }
}

impl VertexFlags {
    #[inline]
    pub fn has(self, flag: VertexFlags) -> bool {
        self.contains(flag)
    }

    pub fn names(self) -> String {
        join_names(self.iter_names().map(|(name, _)| name))
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join("|")
}
