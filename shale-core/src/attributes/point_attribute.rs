use std::ops::Range;

use crate::containers::DataBuffer;
use crate::layout::{AttributeDescriptor, ValueType};
use crate::util::{fingerprint_bytes, hash_combine};

use super::{AttributeValueIndex, PointIndex};

/// Storage for the per-point data of a single attribute. Multiple points can share the same
/// attribute value, so `PointAttribute` keeps every distinct value once in a raw byte buffer
/// and maintains the mapping between point indices and value indices.
///
/// The mapping operates in one of two modes: *identity*, where point `i` uses value `i` and
/// no table is stored, and *explicit*, where a per-point lookup table holds the value index
/// of every point. Freshly reset storage is in identity mode; deduplication always leaves
/// the storage in explicit mode.
///
/// ```
/// # use shale_core::attributes::*;
/// # use shale_core::layout::*;
/// let mut attribute = PointAttribute::new(AttributeDescriptor::color(3));
/// attribute.reset(2);
/// attribute.set_attribute_value(AttributeValueIndex::new(0), &[255, 0, 0]);
/// attribute.set_attribute_value(AttributeValueIndex::new(1), &[0, 255, 0]);
///
/// let mut value = [0; 3];
/// attribute.get_mapped_value(PointIndex::new(1), &mut value);
/// assert_eq!([0, 255, 0], value);
/// ```
#[derive(Debug, Clone)]
pub struct PointAttribute {
    descriptor: AttributeDescriptor,
    buffer: DataBuffer,
    // Mapping between point indices and value indices. Empty while the mapping is identity.
    indices_map: Vec<AttributeValueIndex>,
    num_unique_entries: usize,
    identity_mapping: bool,
}

impl PointAttribute {
    /// Creates empty storage for an attribute described by `descriptor`. The descriptor is
    /// fixed for the lifetime of this storage; changing component type or count requires
    /// creating a new `PointAttribute`.
    pub fn new(descriptor: AttributeDescriptor) -> Self {
        Self {
            descriptor,
            buffer: DataBuffer::new(),
            indices_map: Vec::new(),
            num_unique_entries: 0,
            identity_mapping: true,
        }
    }

    /// Prepares this storage for `num_values` attribute values. The buffer is reallocated
    /// to hold `num_values` zeroed records, any explicit mapping is discarded and the
    /// mapping reverts to identity. Any previously stored data is invalidated.
    pub fn reset(&mut self, num_values: usize) {
        self.buffer.resize(num_values * self.descriptor.byte_stride());
        self.indices_map.clear();
        self.identity_mapping = true;
        self.num_unique_entries = num_values;
    }

    /// Sets the number of unique values without touching buffer capacity or mapping
    /// contents. The caller is responsible for the new count being consistent with the
    /// actually occupied records, e.g. after an out-of-band compaction.
    pub fn resize(&mut self, new_num_unique_entries: usize) {
        self.num_unique_entries = new_num_unique_entries;
    }

    /// The number of unique values currently stored
    pub fn len(&self) -> usize {
        self.num_unique_entries
    }

    /// Does this storage hold no values?
    pub fn is_empty(&self) -> bool {
        self.num_unique_entries == 0
    }

    /// The number of points covered by the current mapping
    pub fn num_points(&self) -> usize {
        if self.identity_mapping {
            self.num_unique_entries
        } else {
            self.indices_map.len()
        }
    }

    /// Returns the descriptor of this attribute
    pub fn descriptor(&self) -> &AttributeDescriptor {
        &self.descriptor
    }

    /// Returns the underlying value buffer
    pub fn buffer(&self) -> &DataBuffer {
        &self.buffer
    }

    /// Is the current mapping the identity? Encoders use this to omit the mapping table
    /// from the compressed output entirely.
    pub fn is_mapping_identity(&self) -> bool {
        self.identity_mapping
    }

    /// Switches to identity mapping, discarding any explicit table irrecoverably
    pub fn set_identity_mapping(&mut self) {
        self.identity_mapping = true;
        self.indices_map.clear();
    }

    /// Switches to an explicit mapping over `num_points` points. Every table entry starts
    /// out unassigned; the caller must assign all of them via
    /// [set_point_map_entry](Self::set_point_map_entry) before the mapping is read.
    pub fn set_explicit_mapping(&mut self, num_points: usize) {
        self.identity_mapping = false;
        self.indices_map.clear();
        self.indices_map
            .resize(num_points, AttributeValueIndex::INVALID);
    }

    /// Sets the value index of `point_index`. Requires an explicit mapping.
    pub fn set_point_map_entry(&mut self, point_index: PointIndex, entry_index: AttributeValueIndex) {
        debug_assert!(!self.identity_mapping);
        self.indices_map[point_index.value() as usize] = entry_index;
    }

    /// Returns the value index of `point_index`
    pub fn mapped_index(&self, point_index: PointIndex) -> AttributeValueIndex {
        if self.identity_mapping {
            return AttributeValueIndex::new(point_index.value());
        }
        self.indices_map[point_index.value() as usize]
    }

    /// Sets the value record at `entry_index`. `value` must hold exactly
    /// [byte_stride](AttributeDescriptor::byte_stride) bytes and the buffer must have
    /// capacity for the record.
    pub fn set_attribute_value(&mut self, entry_index: AttributeValueIndex, value: &[u8]) {
        assert_eq!(
            self.descriptor.byte_stride(),
            value.len(),
            "Value must cover all components of a single attribute entry"
        );
        let byte_pos = entry_index.value() as usize * self.descriptor.byte_stride();
        self.buffer.write(byte_pos, value);
    }

    /// Copies the value record at `entry_index` into `out`
    pub fn get_value(&self, entry_index: AttributeValueIndex, out: &mut [u8]) {
        out.copy_from_slice(self.value_bytes(entry_index));
    }

    /// Resolves `point_index` through the mapping and copies the referenced value into `out`
    pub fn get_mapped_value(&self, point_index: PointIndex, out: &mut [u8]) {
        self.get_value(self.mapped_index(point_index), out)
    }

    /// Returns the raw bytes of the value record at `entry_index`
    pub fn value_bytes(&self, entry_index: AttributeValueIndex) -> &[u8] {
        &self.buffer.data()[self.byte_range_of_value(entry_index)]
    }

    /// Returns the raw bytes of the value referenced by `point_index`
    pub fn mapped_value_bytes(&self, point_index: PointIndex) -> &[u8] {
        self.value_bytes(self.mapped_index(point_index))
    }

    /// Sets the value record at `entry_index` from a strongly typed value whose size must
    /// equal the byte stride of this attribute
    /// ```
    /// # use shale_core::attributes::*;
    /// # use shale_core::layout::*;
    /// # use nalgebra::Vector3;
    /// let mut attribute = PointAttribute::new(AttributeDescriptor::normal());
    /// attribute.reset(1);
    /// attribute.set_typed_value(AttributeValueIndex::new(0), &Vector3::new(0.0_f32, 1.0, 0.0));
    /// let normal: Vector3<f32> = attribute.get_typed_value(AttributeValueIndex::new(0));
    /// assert_eq!(Vector3::new(0.0, 1.0, 0.0), normal);
    /// ```
    pub fn set_typed_value<T: ValueType>(&mut self, entry_index: AttributeValueIndex, value: &T) {
        assert_eq!(self.descriptor.byte_stride(), std::mem::size_of::<T>());
        self.set_attribute_value(entry_index, bytemuck::bytes_of(value));
    }

    /// Reads the value record at `entry_index` as a strongly typed value whose size must
    /// equal the byte stride of this attribute
    pub fn get_typed_value<T: ValueType>(&self, entry_index: AttributeValueIndex) -> T {
        assert_eq!(self.descriptor.byte_stride(), std::mem::size_of::<T>());
        bytemuck::pod_read_unaligned(self.value_bytes(entry_index))
    }

    /// Computes a deterministic hash over the full observable state of this attribute:
    /// descriptor, mapping mode, unique entry count, mapping table contents and occupied
    /// buffer contents. Two attributes with identical state hash equal; hash equality does
    /// not guarantee full equality, so callers use this as a fast pre-filter before a full
    /// comparison.
    pub fn structural_fingerprint(&self) -> u64 {
        let mut hash = self.descriptor.fingerprint();
        hash = hash_combine(self.identity_mapping as u64, hash);
        hash = hash_combine(self.num_unique_entries as u64, hash);
        hash = hash_combine(self.indices_map.len() as u64, hash);
        if !self.indices_map.is_empty() {
            let indices_hash = fingerprint_bytes(bytemuck::cast_slice(&self.indices_map));
            hash = hash_combine(indices_hash, hash);
        }
        let occupied_bytes = self.num_unique_entries * self.descriptor.byte_stride();
        if occupied_bytes > 0 {
            let buffer_hash = fingerprint_bytes(&self.buffer.data()[..occupied_bytes]);
            hash = hash_combine(buffer_hash, hash);
        }
        hash
    }

    pub(super) fn commit_unique_values(
        &mut self,
        unique_values: Vec<u8>,
        mapping: Vec<AttributeValueIndex>,
    ) -> usize {
        debug_assert_eq!(0, unique_values.len() % self.descriptor.byte_stride());
        if self.buffer.len() < unique_values.len() {
            self.buffer.resize(unique_values.len());
        }
        self.buffer.write(0, &unique_values);
        self.num_unique_entries = unique_values.len() / self.descriptor.byte_stride();
        self.identity_mapping = false;
        self.indices_map = mapping;
        self.num_unique_entries
    }

    fn byte_range_of_value(&self, entry_index: AttributeValueIndex) -> Range<usize> {
        let stride = self.descriptor.byte_stride();
        let start = entry_index.value() as usize * stride;
        start..start + stride
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{AttributeType, ComponentDataType};
    use nalgebra::Vector3;

    #[test]
    fn fresh_reset_storage_maps_points_to_themselves() {
        let mut attribute = PointAttribute::new(AttributeDescriptor::position());
        attribute.reset(17);

        assert!(attribute.is_mapping_identity());
        assert_eq!(17, attribute.len());
        assert_eq!(17, attribute.num_points());
        for point in 0..17 {
            assert_eq!(
                AttributeValueIndex::new(point),
                attribute.mapped_index(PointIndex::new(point))
            );
        }
    }

    #[test]
    fn reset_discards_explicit_mapping_and_old_data() {
        let mut attribute = PointAttribute::new(AttributeDescriptor::color(3));
        attribute.reset(2);
        attribute.set_attribute_value(AttributeValueIndex::new(0), &[1, 2, 3]);
        attribute.set_explicit_mapping(4);
        attribute.set_point_map_entry(PointIndex::new(3), AttributeValueIndex::new(0));

        attribute.reset(3);
        assert!(attribute.is_mapping_identity());
        assert_eq!(3, attribute.len());
        assert_eq!(&[0; 9], attribute.buffer().data());
    }

    #[test]
    fn fully_assigned_explicit_mapping_has_no_unassigned_entries() {
        let mut attribute = PointAttribute::new(AttributeDescriptor::tex_coord());
        attribute.reset(3);
        attribute.set_explicit_mapping(6);
        assert!(!attribute.is_mapping_identity());
        assert_eq!(6, attribute.num_points());

        for point in 0..6 {
            attribute.set_point_map_entry(
                PointIndex::new(point),
                AttributeValueIndex::new(point % 3),
            );
        }
        for point in 0..6 {
            let mapped = attribute.mapped_index(PointIndex::new(point));
            assert!(mapped.is_valid());
            assert_eq!(point % 3, mapped.value());
        }
    }

    #[test]
    fn typed_and_raw_value_access_agree() {
        let mut attribute = PointAttribute::new(AttributeDescriptor::new(
            AttributeType::Generic,
            ComponentDataType::U16,
            1,
            false,
        ));
        attribute.reset(2);
        attribute.set_typed_value(AttributeValueIndex::new(0), &512_u16);
        attribute.set_attribute_value(AttributeValueIndex::new(1), &513_u16.to_ne_bytes());

        assert_eq!(512_u16, attribute.get_typed_value(AttributeValueIndex::new(0)));
        assert_eq!(513_u16, attribute.get_typed_value(AttributeValueIndex::new(1)));
        assert_eq!(&512_u16.to_ne_bytes(), attribute.value_bytes(AttributeValueIndex::new(0)));
    }

    #[test]
    fn mapped_value_resolves_through_explicit_table() {
        let mut attribute = PointAttribute::new(AttributeDescriptor::normal());
        attribute.reset(2);
        attribute.set_typed_value(AttributeValueIndex::new(0), &Vector3::new(1.0_f32, 0.0, 0.0));
        attribute.set_typed_value(AttributeValueIndex::new(1), &Vector3::new(0.0_f32, 0.0, 1.0));
        attribute.set_explicit_mapping(3);
        attribute.set_point_map_entry(PointIndex::new(0), AttributeValueIndex::new(1));
        attribute.set_point_map_entry(PointIndex::new(1), AttributeValueIndex::new(0));
        attribute.set_point_map_entry(PointIndex::new(2), AttributeValueIndex::new(1));

        let mut value = [0_u8; 12];
        attribute.get_mapped_value(PointIndex::new(2), &mut value);
        assert_eq!(
            bytemuck::bytes_of(&Vector3::new(0.0_f32, 0.0, 1.0)),
            &value
        );
        assert_eq!(
            attribute.mapped_value_bytes(PointIndex::new(1)),
            attribute.value_bytes(AttributeValueIndex::new(0))
        );
    }

    #[test]
    fn identical_construction_yields_identical_fingerprints() {
        let build = || {
            let mut attribute = PointAttribute::new(AttributeDescriptor::color(4));
            attribute.reset(2);
            attribute.set_attribute_value(AttributeValueIndex::new(0), &[1, 2, 3, 4]);
            attribute.set_attribute_value(AttributeValueIndex::new(1), &[5, 6, 7, 8]);
            attribute.set_explicit_mapping(3);
            attribute.set_point_map_entry(PointIndex::new(0), AttributeValueIndex::new(0));
            attribute.set_point_map_entry(PointIndex::new(1), AttributeValueIndex::new(1));
            attribute.set_point_map_entry(PointIndex::new(2), AttributeValueIndex::new(0));
            attribute
        };
        assert_eq!(
            build().structural_fingerprint(),
            build().structural_fingerprint()
        );
    }

    #[test]
    fn fingerprint_reacts_to_buffer_and_mapping_changes() {
        let mut attribute = PointAttribute::new(AttributeDescriptor::color(4));
        attribute.reset(2);
        attribute.set_attribute_value(AttributeValueIndex::new(0), &[1, 2, 3, 4]);
        attribute.set_attribute_value(AttributeValueIndex::new(1), &[5, 6, 7, 8]);
        let baseline = attribute.structural_fingerprint();

        attribute.set_attribute_value(AttributeValueIndex::new(1), &[5, 6, 7, 9]);
        let after_value_change = attribute.structural_fingerprint();
        assert_ne!(baseline, after_value_change);

        attribute.set_explicit_mapping(2);
        attribute.set_point_map_entry(PointIndex::new(0), AttributeValueIndex::new(0));
        attribute.set_point_map_entry(PointIndex::new(1), AttributeValueIndex::new(1));
        let with_explicit_mapping = attribute.structural_fingerprint();
        assert_ne!(after_value_change, with_explicit_mapping);

        attribute.set_point_map_entry(PointIndex::new(1), AttributeValueIndex::new(0));
        assert_ne!(with_explicit_mapping, attribute.structural_fingerprint());
    }

    #[test]
    fn fingerprint_differs_between_descriptors() {
        let mut color = PointAttribute::new(AttributeDescriptor::color(3));
        let mut generic = PointAttribute::new(AttributeDescriptor::new(
            AttributeType::Generic,
            ComponentDataType::U8,
            3,
            true,
        ));
        color.reset(1);
        generic.reset(1);
        color.set_attribute_value(AttributeValueIndex::new(0), &[1, 2, 3]);
        generic.set_attribute_value(AttributeValueIndex::new(0), &[1, 2, 3]);
        assert_ne!(
            color.structural_fingerprint(),
            generic.structural_fingerprint()
        );
    }

    #[test]
    fn resize_only_changes_the_entry_count() {
        let mut attribute = PointAttribute::new(AttributeDescriptor::color(3));
        attribute.reset(4);
        attribute.set_attribute_value(AttributeValueIndex::new(3), &[7, 7, 7]);

        attribute.resize(2);
        assert_eq!(2, attribute.len());
        // Buffer capacity and contents beyond the new count stay untouched
        assert_eq!(12, attribute.buffer().len());
        assert_eq!(&[7, 7, 7], attribute.value_bytes(AttributeValueIndex::new(3)));
    }
}
