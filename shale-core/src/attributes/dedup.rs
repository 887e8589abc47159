//! Value deduplication for [PointAttribute]
//!
//! Deduplication walks all points of a source attribute in order, keeps the first
//! occurrence of every distinct value and rewrites the point mapping so that points with
//! equal values share one entry. The work happens in two phases: a planning pass borrows
//! the source read-only and collects the unique values plus the new mapping into staging
//! storage, then the result is committed into the destination in one step. Deduplicating
//! an attribute against itself therefore never reads a record that was already overwritten,
//! and a failed deduplication leaves the destination untouched.

use std::collections::hash_map::Entry;
use std::hash::Hash;

use anyhow::{bail, Result};
use bytemuck::Pod;
use rustc_hash::FxHashMap;

use crate::layout::ComponentDataType;

use super::{AttributeValueIndex, PointAttribute, PointIndex};

impl PointAttribute {
    /// Deduplicates the values of this attribute in place. Values are kept in
    /// first-occurrence order and the mapping is rewritten to an explicit table, even if
    /// every value turned out to be unique. Returns the new number of unique values.
    ///
    /// ```
    /// # use shale_core::attributes::*;
    /// # use shale_core::layout::*;
    /// let mut attribute = PointAttribute::new(AttributeDescriptor::color(3));
    /// attribute.reset(3);
    /// attribute.set_attribute_value(AttributeValueIndex::new(0), &[255, 0, 0]);
    /// attribute.set_attribute_value(AttributeValueIndex::new(1), &[0, 255, 0]);
    /// attribute.set_attribute_value(AttributeValueIndex::new(2), &[255, 0, 0]);
    ///
    /// assert_eq!(2, attribute.deduplicate_values().unwrap());
    /// assert_eq!(
    ///     attribute.mapped_index(PointIndex::new(0)),
    ///     attribute.mapped_index(PointIndex::new(2))
    /// );
    /// ```
    pub fn deduplicate_values(&mut self) -> Result<usize> {
        let plan = build_dedup_plan(self, AttributeValueIndex::new(0));
        Ok(self.commit_unique_values(plan.unique_values, plan.mapping))
    }

    /// Deduplicates the values read from `in_att` into this attribute. `in_att` must store
    /// values of the same component data type and component count as this attribute,
    /// otherwise an error is returned and this attribute stays unmodified.
    pub fn deduplicate_values_from(&mut self, in_att: &PointAttribute) -> Result<usize> {
        self.deduplicate_values_from_offset(in_att, AttributeValueIndex::new(0))
    }

    /// Same as [deduplicate_values_from](Self::deduplicate_values_from), but every value
    /// is read `in_att_offset` records past the index the source mapping resolves to. Used
    /// when the source buffer packs multiple logical attributes one after another.
    pub fn deduplicate_values_from_offset(
        &mut self,
        in_att: &PointAttribute,
        in_att_offset: AttributeValueIndex,
    ) -> Result<usize> {
        if self.descriptor().data_type() != in_att.descriptor().data_type()
            || self.descriptor().component_count() != in_att.descriptor().component_count()
        {
            bail!(
                "Cannot deduplicate {} x{} values into an attribute storing {} x{} values",
                in_att.descriptor().data_type(),
                in_att.descriptor().component_count(),
                self.descriptor().data_type(),
                self.descriptor().component_count()
            );
        }
        let plan = build_dedup_plan(in_att, in_att_offset);
        Ok(self.commit_unique_values(plan.unique_values, plan.mapping))
    }
}

/// Staging result of the planning pass: the unique values in first-occurrence order and
/// the value index for every source point
struct DedupPlan {
    unique_values: Vec<u8>,
    mapping: Vec<AttributeValueIndex>,
}

/// Component types understood by the typed deduplication path. `Key` is the hashable
/// stand-in for one component: integers key on themselves, floats key on canonical bit
/// patterns. Both signed zeros collapse to one key, NaNs keep their exact payload bits.
trait DedupComponent: Pod {
    type Key: Hash + Eq + Copy;

    fn dedup_key(self) -> Self::Key;
}

macro_rules! impl_integer_dedup_component {
    ($($t:ty),+) => {
        $(impl DedupComponent for $t {
            type Key = $t;

            fn dedup_key(self) -> $t {
                self
            }
        })+
    };
}

impl_integer_dedup_component!(u8, i8, u16, i16, u32, i32, u64, i64);

impl DedupComponent for f32 {
    type Key = u32;

    fn dedup_key(self) -> u32 {
        if self == 0.0 {
            0
        } else {
            self.to_bits()
        }
    }
}

impl DedupComponent for f64 {
    type Key = u64;

    fn dedup_key(self) -> u64 {
        if self == 0.0 {
            0
        } else {
            self.to_bits()
        }
    }
}

fn build_dedup_plan(in_att: &PointAttribute, offset: AttributeValueIndex) -> DedupPlan {
    match in_att.descriptor().data_type() {
        ComponentDataType::I8 => plan_typed::<i8>(in_att, offset),
        ComponentDataType::U8 | ComponentDataType::Bool => plan_typed::<u8>(in_att, offset),
        ComponentDataType::I16 => plan_typed::<i16>(in_att, offset),
        ComponentDataType::U16 => plan_typed::<u16>(in_att, offset),
        ComponentDataType::I32 => plan_typed::<i32>(in_att, offset),
        ComponentDataType::U32 => plan_typed::<u32>(in_att, offset),
        ComponentDataType::I64 => plan_typed::<i64>(in_att, offset),
        ComponentDataType::U64 => plan_typed::<u64>(in_att, offset),
        ComponentDataType::F32 => plan_typed::<f32>(in_att, offset),
        ComponentDataType::F64 => plan_typed::<f64>(in_att, offset),
    }
}

fn plan_typed<T: DedupComponent>(in_att: &PointAttribute, offset: AttributeValueIndex) -> DedupPlan {
    match in_att.descriptor().component_count() {
        1 => plan_formatted::<T, 1>(in_att, offset),
        2 => plan_formatted::<T, 2>(in_att, offset),
        3 => plan_formatted::<T, 3>(in_att, offset),
        4 => plan_formatted::<T, 4>(in_att, offset),
        // No typed fast path for larger component counts; exact byte equality applies
        _ => plan_generic(in_att, offset),
    }
}

fn plan_formatted<T: DedupComponent, const N: usize>(
    in_att: &PointAttribute,
    offset: AttributeValueIndex,
) -> DedupPlan {
    let component_size = std::mem::size_of::<T>();
    let stride = in_att.descriptor().byte_stride();
    let num_points = in_att.num_points();

    let mut seen: FxHashMap<[T::Key; N], AttributeValueIndex> = FxHashMap::default();
    let mut unique_values = Vec::new();
    let mut mapping = Vec::with_capacity(num_points);

    for point in 0..num_points as u32 {
        let source_index = in_att.mapped_index(PointIndex::new(point)).offset_by(offset);
        let value = in_att.value_bytes(source_index);
        let key: [T::Key; N] = std::array::from_fn(|component| {
            let begin = component * component_size;
            bytemuck::pod_read_unaligned::<T>(&value[begin..begin + component_size]).dedup_key()
        });
        match seen.entry(key) {
            Entry::Occupied(existing) => mapping.push(*existing.get()),
            Entry::Vacant(vacant) => {
                let next_index = AttributeValueIndex::new((unique_values.len() / stride) as u32);
                vacant.insert(next_index);
                unique_values.extend_from_slice(value);
                mapping.push(next_index);
            }
        }
    }

    DedupPlan {
        unique_values,
        mapping,
    }
}

fn plan_generic(in_att: &PointAttribute, offset: AttributeValueIndex) -> DedupPlan {
    let stride = in_att.descriptor().byte_stride();
    let num_points = in_att.num_points();

    let mut seen: FxHashMap<Vec<u8>, AttributeValueIndex> = FxHashMap::default();
    let mut unique_values = Vec::new();
    let mut mapping = Vec::with_capacity(num_points);

    for point in 0..num_points as u32 {
        let source_index = in_att.mapped_index(PointIndex::new(point)).offset_by(offset);
        let value = in_att.value_bytes(source_index);
        if let Some(&existing) = seen.get(value) {
            mapping.push(existing);
        } else {
            let next_index = AttributeValueIndex::new((unique_values.len() / stride) as u32);
            seen.insert(value.to_vec(), next_index);
            unique_values.extend_from_slice(value);
            mapping.push(next_index);
        }
    }

    DedupPlan {
        unique_values,
        mapping,
    }
}
