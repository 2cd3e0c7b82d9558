//! Strongly-typed descriptors for decoded BUFR values.
//!
//! `TypeInfo` carries the wire-level numeric descriptor of a leaf (reference,
//! bit width, decimal scale, unit) and is merged across message frames;
//! `DataType` is the dense output element type the reshape pipeline resolves
//! from the merged descriptor or from a caller override.

pub mod data_type;
pub mod type_info;

pub use data_type::DataType;
pub use type_info::TypeInfo;
