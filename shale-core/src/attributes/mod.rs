//! Storage for per-point attribute data
//!
//! A [PointAttribute] owns the raw value records of one attribute together with the mapping
//! from point indices to value indices. The mapping starts out as the identity (point `i`
//! uses value `i`) and becomes an explicit lookup table once values are shared between
//! points, typically as the result of [value deduplication](PointAttribute::deduplicate_values).

mod indices;
pub use self::indices::*;

mod point_attribute;
pub use self::point_attribute::*;

mod dedup;
