use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;
use numpy::IntoPyArray;
use pyo3::prelude::*;
use pyo3::types::PyList;

use crate::config::QuerySetConfig;
use crate::data_object::{DataObject, TypedBuffer};
use crate::export::datetime_seconds;
use crate::query_set::QuerySet;
use crate::result_set::ResultSet;

//==================================================================================
// I. Query catalog
//==================================================================================

#[pyclass(name = "QuerySet", module = "bufrq")]
pub struct PyQuerySet {
    pub(crate) inner: QuerySet,
}

#[pymethods]
impl PyQuerySet {
    /// Creates a query set, optionally limited to the given subset tags.
    #[new]
    #[pyo3(signature = (subsets = None))]
    fn new(subsets: Option<Vec<String>>) -> Self {
        let inner = match subsets {
            Some(subsets) => QuerySet::with_subsets(subsets),
            None => QuerySet::new(),
        };
        PyQuerySet { inner }
    }

    /// Builds a query set from a JSON catalog document.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let inner = QuerySetConfig::from_json_str(json)?.into_query_set()?;
        Ok(PyQuerySet { inner })
    }

    fn add(&mut self, name: &str, query_str: &str) -> PyResult<()> {
        self.inner.add(name, query_str)?;
        Ok(())
    }

    fn includes_subset(&self, subset: &str) -> bool {
        self.inner.includes_subset(subset)
    }

    fn names(&self) -> Vec<String> {
        self.inner.names()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}

//==================================================================================
// II. Result sets and numpy export
//==================================================================================

/// The accumulated decode results. Frames are populated by the embedding
/// decoder; from Python the class is read-only.
#[pyclass(name = "ResultSet", module = "bufrq")]
pub struct PyResultSet {
    pub(crate) inner: ResultSet,
}

#[pymethods]
impl PyResultSet {
    #[new]
    fn new(query_set: &PyQuerySet) -> Self {
        PyResultSet {
            inner: ResultSet::from_query_set(&query_set.inner),
        }
    }

    fn num_frames(&self) -> usize {
        self.inner.num_frames()
    }

    fn unit(&self, field_name: &str) -> PyResult<String> {
        Ok(self.inner.unit(field_name)?)
    }

    /// Reshapes a field into a numpy masked array (mask = missing).
    #[pyo3(signature = (field_name, group_by = None, override_type = None))]
    fn get_numpy_array(
        &self,
        py: Python,
        field_name: &str,
        group_by: Option<&str>,
        override_type: Option<&str>,
    ) -> PyResult<PyObject> {
        let object = self.inner.get(field_name, group_by, override_type)?;
        data_object_to_numpy(py, &object)
    }

    /// Composes six date/time fields into a `datetime64[s]` masked array.
    /// The mask is the logical or of the components' missingness.
    #[pyo3(signature = (year, month, day, hour, minute = None, second = None, group_by = None))]
    #[allow(clippy::too_many_arguments)]
    fn get_numpy_datetime_array(
        &self,
        py: Python,
        year: &str,
        month: &str,
        day: &str,
        hour: &str,
        minute: Option<&str>,
        second: Option<&str>,
        group_by: Option<&str>,
    ) -> PyResult<PyObject> {
        let year_obj = self.inner.get(year, group_by, None)?;
        let month_obj = self.inner.get(month, group_by, None)?;
        let day_obj = self.inner.get(day, group_by, None)?;
        let hour_obj = self.inner.get(hour, group_by, None)?;
        let minute_obj = minute
            .map(|name| self.inner.get(name, group_by, None))
            .transpose()?;
        let second_obj = second
            .map(|name| self.inner.get(name, group_by, None))
            .transpose()?;

        let (seconds, mask) = datetime_seconds(
            &year_obj,
            &month_obj,
            &day_obj,
            &hour_obj,
            minute_obj.as_ref(),
            second_obj.as_ref(),
        )?;

        let dims = year_obj.dims().to_vec();
        let stamps = seconds.into_pyarray(py).reshape(dims.clone())?;
        let datetimes = stamps.call_method1("astype", ("datetime64[s]",))?;
        let mask = mask.into_pyarray(py).reshape(dims)?;

        let ma = py.import("numpy")?.getattr("ma")?;
        let masked = ma.call_method1("masked_array", (datetimes, mask))?;
        ma.call_method1("set_fill_value", (masked, 0))?;

        Ok(masked.to_object(py))
    }
}

/// Converts a [`DataObject`] into a numpy masked array of its resolved dtype.
fn data_object_to_numpy(py: Python, object: &DataObject) -> PyResult<PyObject> {
    let dims = object.dims().to_vec();

    let array: PyObject = match object.buffer() {
        TypedBuffer::String(values) => {
            // Character results go through numpy's own str dtype inference.
            let list = PyList::new(py, values);
            py.import("numpy")?
                .call_method1("array", (list,))?
                .call_method1("reshape", (dims.clone(),))?
                .to_object(py)
        }
        TypedBuffer::Int32(values) => values
            .clone()
            .into_pyarray(py)
            .reshape(dims.clone())?
            .to_object(py),
        TypedBuffer::Int64(values) => values
            .clone()
            .into_pyarray(py)
            .reshape(dims.clone())?
            .to_object(py),
        TypedBuffer::UInt32(values) => values
            .clone()
            .into_pyarray(py)
            .reshape(dims.clone())?
            .to_object(py),
        TypedBuffer::UInt64(values) => values
            .clone()
            .into_pyarray(py)
            .reshape(dims.clone())?
            .to_object(py),
        TypedBuffer::Float32(values) => values
            .clone()
            .into_pyarray(py)
            .reshape(dims.clone())?
            .to_object(py),
        TypedBuffer::Float64(values) => values
            .clone()
            .into_pyarray(py)
            .reshape(dims.clone())?
            .to_object(py),
    };

    let mask = object
        .missing_mask()
        .to_vec()
        .into_pyarray(py)
        .reshape(dims)?;

    let ma = py.import("numpy")?.getattr("ma")?;
    let masked = ma.call_method1("masked_array", (array, mask))?;
    Ok(masked.to_object(py))
}

//==================================================================================
// III. Logging switch
//==================================================================================

static INIT_LOGGER: Once = Once::new();

/// Turns on engine logging, optionally appending to a file instead of stderr.
#[pyfunction]
#[pyo3(name = "enable_verbose_logging")]
#[pyo3(signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    let mut result = Ok(());

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(LevelFilter::Debug);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(filename) = log_file {
            match OpenOptions::new().append(true).create(true).open(&filename) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(err) => {
                    result = Err(pyo3::exceptions::PyIOError::new_err(format!(
                        "could not open log file {}: {}",
                        filename, err
                    )));
                    return;
                }
            }
        }

        let _ = builder.try_init();
    });

    result
}
