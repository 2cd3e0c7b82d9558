//! The single, unified error type for the bufrq library.
//!
//! Every fallible operation in the crate surfaces a `BufrqError`; there is no
//! internal recovery. The `python` feature adds the `PyErr` conversions needed
//! at the FFI boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BufrqError {
    // =========================================================================
    // === Semantic errors raised by the query/reshape engine
    // =========================================================================
    #[error("This ResultSet is empty (doesn't contain any data)")]
    EmptyResultSet,

    #[error("This ResultSet does not contain a field named {0}")]
    NoSuchField(String),

    #[error(
        "The group-by and target fields do not share a common path \
         (group-by: {group_by}, target: {target})"
    )]
    PathMismatch { group_by: String, target: String },

    #[error(
        "Conversions between numbers and strings are not supported; \
         see the export definition for \"{0}\""
    )]
    UnsupportedConversion(String),

    #[error("Unknown or unsupported type \"{0}\"")]
    UnknownType(String),

    #[error("Value {value} for field \"{field}\" does not fit the {data_type} output range")]
    OutOfRange {
        field: String,
        value: f64,
        data_type: crate::types::DataType,
    },

    #[error("No queries have been added under the name \"{0}\"")]
    UnknownName(String),

    #[error("Invalid query path \"{0}\": {1}")]
    InvalidQueryPath(String, String),

    #[error("Mismatched shapes: {0}")]
    ShapeMismatch(String),

    /// Inflation-math invariants (counts inconsistent with data length) are
    /// programming errors in the decoder collaborator; they surface here in
    /// release builds and assert in debug builds.
    #[error("Internal logic error (this is a bug): {0}")]
    Internal(String),

    // =========================================================================
    // === External error wrappers
    // =========================================================================
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "python")]
impl From<BufrqError> for pyo3::PyErr {
    fn from(err: BufrqError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
