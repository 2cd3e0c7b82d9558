//! The Python-facing layer.
//!
//! Everything here is a thin veneer over the pure core: pyclass wrappers for
//! [`QuerySet`](crate::query_set::QuerySet) and
//! [`ResultSet`](crate::result_set::ResultSet), numpy masked-array export,
//! and the logging switch. No reshape logic lives on this side of the
//! boundary.

pub mod python;

pub use python::{enable_verbose_logging_py, PyQuerySet, PyResultSet};
