//! Query-and-reshape engine for decoded BUFR observation records.
//!
//! A [`QuerySet`] declares named queries over the repetition tree of a BUFR
//! message family; a decoder collaborator appends one [`DataFrame`] per
//! message to a [`ResultSet`]; [`ResultSet::get`] reshapes the accumulated
//! ragged values into a dense, typed [`DataObject`] with a missing-value
//! mask. The `python` feature adds the numpy-facing bindings.

//==================================================================================
// 0. Constants
//==================================================================================

/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The in-band sentinel for absent data in staging buffers and float output.
/// Consumers should use the derived mask rather than compare against it.
pub const MISSING_VALUE: f64 = 10e10;

//==================================================================================
// 1. Module declarations
//==================================================================================

#[macro_use]
pub mod observability;

pub mod config;
pub mod data_object;
pub mod error;
pub mod export;
pub mod frame;
pub mod query;
pub mod query_set;
pub mod result_set;
pub mod types;

#[cfg(feature = "python")]
mod ffi;

pub use data_object::{DataObject, TypedBuffer};
pub use error::BufrqError;
pub use frame::{DataField, DataFrame, SeqCounts, Target};
pub use query::{Query, SubsetFilter};
pub use query_set::QuerySet;
pub use result_set::ResultSet;
pub use types::{DataType, TypeInfo};

//==================================================================================
// 2. Python module definition
//==================================================================================

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `bufrq` Python module.
#[cfg(feature = "python")]
#[pymodule]
fn bufrq(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<ffi::PyQuerySet>()?;
    m.add_class::<ffi::PyResultSet>()?;
    m.add_function(wrap_pyfunction!(ffi::enable_verbose_logging_py, m)?)?;

    m.add("MISSING_VALUE", MISSING_VALUE)?;
    m.add("__version__", VERSION)?;

    Ok(())
}
