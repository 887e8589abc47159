use std::fmt::{self, Display, Formatter};

use bytemuck::{Pod, Zeroable};

/// Index of one logical point in a point cloud. Point indices are dense and start at 0.
///
/// `PointIndex` and [AttributeValueIndex] are deliberately distinct types: both are plain
/// integers, but mixing them up silently breaks the point-to-value mapping, so neither
/// converts into the other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct PointIndex(u32);

impl PointIndex {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for PointIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl Display for PointIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of one stored, unique attribute value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct AttributeValueIndex(u32);

impl AttributeValueIndex {
    /// Sentinel for an entry of an explicit mapping table that has not been assigned yet.
    /// The sentinel must never survive past mapping initialization into user-visible reads.
    pub const INVALID: Self = Self(u32::MAX);

    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Returns this index shifted by `offset` values. Used when reading from a source
    /// buffer that packs multiple logical attributes one after another.
    pub fn offset_by(self, offset: AttributeValueIndex) -> Self {
        Self(self.0 + offset.0)
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl From<u32> for AttributeValueIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl Display for AttributeValueIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
