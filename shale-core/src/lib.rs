#![warn(clippy::all)]

//! Per-point attribute storage for the shale geometry compression toolkit
//!
//! A point cloud or mesh carries one or more attributes (position, color, normal, ...) and
//! many points typically share identical attribute values, e.g. adjacent mesh vertices
//! sharing a normal. shale-core stores every distinct value exactly once and keeps a compact
//! mapping from each point to the index of its value, so the encoding and decoding stages
//! operate on a deduplicated value set instead of a fully expanded per-point array.
//!
//! The best way to get started is the [PointAttribute](crate::attributes::PointAttribute)
//! type together with the descriptors in the [layout](crate::layout) module.

pub extern crate nalgebra;

/// Per-point attribute storage, index mapping and value deduplication
pub mod attributes;
/// Raw byte storage for fixed-size attribute records
pub mod containers;
/// Defines attribute descriptors and component data types
pub mod layout;
/// Utilities
pub mod util;
