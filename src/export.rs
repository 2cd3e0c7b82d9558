//! Scientific-array adapters over [`DataObject`].
//!
//! The engine's own output is a flat row-major buffer; consumers usually want
//! a shaped array plus a mask they can trust without comparing floats against
//! the missing sentinel. This module provides the Rust-native view (`ndarray`)
//! and the combined date/time composition the Python bindings re-export.

use chrono::{TimeZone, Utc};
use ndarray::{ArrayD, IxDyn};

use crate::data_object::DataObject;
use crate::error::BufrqError;
use crate::MISSING_VALUE;

impl DataObject {
    /// The result as a shaped `f64` array. Masked slots carry the
    /// [`MISSING_VALUE`] sentinel; pair with [`DataObject::mask_ndarray`] for
    /// a masked view. String results cannot be widened and are rejected.
    pub fn to_ndarray(&self) -> Result<ArrayD<f64>, BufrqError> {
        if self.data_type().is_string() {
            return Err(BufrqError::UnsupportedConversion(
                self.field_name().to_string(),
            ));
        }

        let values: Vec<f64> = (0..self.len())
            .map(|idx| self.get_as_f64(idx).unwrap_or(MISSING_VALUE))
            .collect();

        ArrayD::from_shape_vec(IxDyn(self.dims()), values)
            .map_err(|err| BufrqError::ShapeMismatch(err.to_string()))
    }

    /// The missing mask shaped like [`DataObject::to_ndarray`].
    pub fn mask_ndarray(&self) -> Result<ArrayD<bool>, BufrqError> {
        ArrayD::from_shape_vec(IxDyn(self.dims()), self.missing_mask().to_vec())
            .map_err(|err| BufrqError::ShapeMismatch(err.to_string()))
    }
}

/// Composes six per-element date/time components into seconds since the Unix
/// epoch (UTC).
///
/// `minute` and `second` default to zero when absent. The returned mask is
/// the logical or of every component's missingness; elements whose components
/// form no valid calendar date are masked rather than rejected.
pub fn datetime_seconds(
    year: &DataObject,
    month: &DataObject,
    day: &DataObject,
    hour: &DataObject,
    minute: Option<&DataObject>,
    second: Option<&DataObject>,
) -> Result<(Vec<i64>, Vec<bool>), BufrqError> {
    let len = year.len();
    let components: [Option<&DataObject>; 6] = [
        Some(year),
        Some(month),
        Some(day),
        Some(hour),
        minute,
        second,
    ];
    for component in components.into_iter().flatten() {
        if component.len() != len {
            return Err(BufrqError::ShapeMismatch(format!(
                "date/time component {} has {} elements, expected {}",
                component.field_name(),
                component.len(),
                len
            )));
        }
    }

    let mut seconds = vec![0i64; len];
    let mut mask = vec![false; len];

    for idx in 0..len {
        let value = epoch_seconds_at(idx, year, month, day, hour, minute, second);
        match value {
            Some(stamp) => seconds[idx] = stamp,
            None => mask[idx] = true,
        }
    }

    Ok((seconds, mask))
}

fn epoch_seconds_at(
    idx: usize,
    year: &DataObject,
    month: &DataObject,
    day: &DataObject,
    hour: &DataObject,
    minute: Option<&DataObject>,
    second: Option<&DataObject>,
) -> Option<i64> {
    let year = i32::try_from(year.get_as_int(idx)?).ok()?;
    let month = u32::try_from(month.get_as_int(idx)?).ok()?;
    let day = u32::try_from(day.get_as_int(idx)?).ok()?;
    let hour = u32::try_from(hour.get_as_int(idx)?).ok()?;
    let minute = match minute {
        Some(object) => u32::try_from(object.get_as_int(idx)?).ok()?,
        None => 0,
    };
    let second = match second {
        Some(object) => u32::try_from(object.get_as_int(idx)?).ok()?,
        None => 0,
    };

    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .map(|stamp| stamp.timestamp())
}
