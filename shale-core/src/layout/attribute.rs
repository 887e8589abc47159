use std::fmt::{self, Display, Formatter};

use nalgebra::Vector3;
use static_assertions::const_assert;

use crate::util::hash_combine;

/// Possible data types for a single component of an attribute value
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ComponentDataType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Bool,
}

impl ComponentDataType {
    /// Returns the size in bytes of a single component of this data type
    /// ```
    /// # use shale_core::layout::*;
    /// assert_eq!(4, ComponentDataType::F32.size());
    /// assert_eq!(1, ComponentDataType::Bool.size());
    /// ```
    pub fn size(&self) -> usize {
        match self {
            ComponentDataType::I8 => 1,
            ComponentDataType::U8 => 1,
            ComponentDataType::I16 => 2,
            ComponentDataType::U16 => 2,
            ComponentDataType::I32 => 4,
            ComponentDataType::U32 => 4,
            ComponentDataType::I64 => 8,
            ComponentDataType::U64 => 8,
            ComponentDataType::F32 => 4,
            ComponentDataType::F64 => 8,
            ComponentDataType::Bool => 1,
        }
    }
}

impl Display for ComponentDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ComponentDataType::I8 => write!(f, "I8"),
            ComponentDataType::U8 => write!(f, "U8"),
            ComponentDataType::I16 => write!(f, "I16"),
            ComponentDataType::U16 => write!(f, "U16"),
            ComponentDataType::I32 => write!(f, "I32"),
            ComponentDataType::U32 => write!(f, "U32"),
            ComponentDataType::I64 => write!(f, "I64"),
            ComponentDataType::U64 => write!(f, "U64"),
            ComponentDataType::F32 => write!(f, "F32"),
            ComponentDataType::F64 => write!(f, "F64"),
            ComponentDataType::Bool => write!(f, "Bool"),
        }
    }
}

/// Semantic classification of an attribute. Encoders use this to pick prediction schemes;
/// within shale-core it only contributes to the structural fingerprint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttributeType {
    Position,
    Normal,
    Color,
    TexCoord,
    /// Any attribute without special compression semantics
    Generic,
}

/// Marker trait for all types that can be used as strongly typed attribute values
pub trait ValueType: bytemuck::Pod {}

impl ValueType for u8 {}
impl ValueType for u16 {}
impl ValueType for u32 {}
impl ValueType for u64 {}
impl ValueType for i8 {}
impl ValueType for i16 {}
impl ValueType for i32 {}
impl ValueType for i64 {}
impl ValueType for f32 {}
impl ValueType for f64 {}
impl ValueType for Vector3<u8> {}
impl ValueType for Vector3<u16> {}
impl ValueType for Vector3<f32> {}
impl ValueType for Vector3<f64> {}

// Assert sizes of vector types are as we expect. Primitive types always are the same size,
// but we don't know what nalgebra does with the Vector3 types on the target machine...
const_assert!(std::mem::size_of::<Vector3<u8>>() == 3);
const_assert!(std::mem::size_of::<Vector3<u16>>() == 6);
const_assert!(std::mem::size_of::<Vector3<f32>>() == 12);
const_assert!(std::mem::size_of::<Vector3<f64>>() == 24);

/// Describes one attribute of a point cloud: its semantic type, the data type of a single
/// component and how many components make up one value. The descriptor is fixed for the
/// lifetime of the storage that uses it; every stored value is a byte-exact record of
/// `component_count * component size` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    attribute_type: AttributeType,
    data_type: ComponentDataType,
    component_count: u8,
    normalized: bool,
}

impl AttributeDescriptor {
    /// Creates a new descriptor. Panics if `component_count` is zero.
    /// ```
    /// # use shale_core::layout::*;
    /// let descriptor = AttributeDescriptor::new(
    ///     AttributeType::Generic,
    ///     ComponentDataType::U16,
    ///     2,
    ///     false,
    /// );
    /// assert_eq!(4, descriptor.byte_stride());
    /// ```
    pub fn new(
        attribute_type: AttributeType,
        data_type: ComponentDataType,
        component_count: u8,
        normalized: bool,
    ) -> Self {
        assert!(
            component_count > 0,
            "An attribute must have at least one component"
        );
        Self {
            attribute_type,
            data_type,
            component_count,
            normalized,
        }
    }

    /// Descriptor for a 3D position stored as three `f32` components
    pub fn position() -> Self {
        Self::new(AttributeType::Position, ComponentDataType::F32, 3, false)
    }

    /// Descriptor for a unit normal stored as three `f32` components
    pub fn normal() -> Self {
        Self::new(AttributeType::Normal, ComponentDataType::F32, 3, false)
    }

    /// Descriptor for a normalized color with `component_count` `u8` channels (3 for RGB, 4 for RGBA)
    pub fn color(component_count: u8) -> Self {
        Self::new(AttributeType::Color, ComponentDataType::U8, component_count, true)
    }

    /// Descriptor for a 2D texture coordinate stored as two `f32` components
    pub fn tex_coord() -> Self {
        Self::new(AttributeType::TexCoord, ComponentDataType::F32, 2, false)
    }

    /// Returns the semantic type of this attribute
    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    /// Returns the data type of a single component of this attribute
    pub fn data_type(&self) -> ComponentDataType {
        self.data_type
    }

    /// Returns the number of components of a single value of this attribute
    pub fn component_count(&self) -> u8 {
        self.component_count
    }

    /// Returns whether integer values of this attribute represent normalized `[0, 1]` data
    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// Returns the size in bytes of a single value of this attribute
    /// ```
    /// # use shale_core::layout::*;
    /// assert_eq!(12, AttributeDescriptor::position().byte_stride());
    /// assert_eq!(3, AttributeDescriptor::color(3).byte_stride());
    /// ```
    pub fn byte_stride(&self) -> usize {
        self.component_count as usize * self.data_type.size()
    }

    /// Returns a deterministic hash over all descriptor fields. Two descriptors hash equal
    /// exactly if they compare equal.
    pub fn fingerprint(&self) -> u64 {
        let mut hash = hash_combine(self.attribute_type as u64, 0);
        hash = hash_combine(self.data_type as u64, hash);
        hash = hash_combine(self.component_count as u64, hash);
        hash = hash_combine(self.normalized as u64, hash);
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_stride_is_component_count_times_component_size() {
        let descriptor = AttributeDescriptor::new(
            AttributeType::Generic,
            ComponentDataType::I64,
            5,
            false,
        );
        assert_eq!(40, descriptor.byte_stride());
        assert_eq!(24, AttributeDescriptor::normal().byte_stride());
        assert_eq!(4, AttributeDescriptor::color(4).byte_stride());
        assert_eq!(8, AttributeDescriptor::tex_coord().byte_stride());
    }

    #[test]
    fn fingerprint_is_sensitive_to_every_field() {
        let base = AttributeDescriptor::new(
            AttributeType::Generic,
            ComponentDataType::U16,
            3,
            false,
        );
        let variants = [
            AttributeDescriptor::new(AttributeType::Color, ComponentDataType::U16, 3, false),
            AttributeDescriptor::new(AttributeType::Generic, ComponentDataType::I16, 3, false),
            AttributeDescriptor::new(AttributeType::Generic, ComponentDataType::U16, 4, false),
            AttributeDescriptor::new(AttributeType::Generic, ComponentDataType::U16, 3, true),
        ];
        for variant in &variants {
            assert_ne!(base.fingerprint(), variant.fingerprint());
        }
        assert_eq!(base.fingerprint(), base.clone().fingerprint());
    }

    #[test]
    #[should_panic]
    fn zero_components_are_rejected() {
        AttributeDescriptor::new(AttributeType::Generic, ComponentDataType::U8, 0, false);
    }
}
