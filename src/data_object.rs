//! The dense, typed result carrier produced by `ResultSet::get`.
//!
//! The reshape pipeline stages everything as `f64` with the in-band
//! [`MISSING_VALUE`](crate::MISSING_VALUE) sentinel; a `DataObject` is the
//! typed materialization of that staging buffer, with the missing mask
//! derived exactly once at this boundary so consumers never compare floats
//! against the sentinel themselves.

use num_traits::{Bounded, NumCast};

use crate::error::BufrqError;
use crate::query::Query;
use crate::types::DataType;
use crate::MISSING_VALUE;

/// The typed dense buffer variants a query result can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedBuffer {
    String(Vec<String>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl TypedBuffer {
    pub fn len(&self) -> usize {
        match self {
            TypedBuffer::String(buf) => buf.len(),
            TypedBuffer::Int32(buf) => buf.len(),
            TypedBuffer::Int64(buf) => buf.len(),
            TypedBuffer::UInt32(buf) => buf.len(),
            TypedBuffer::UInt64(buf) => buf.len(),
            TypedBuffer::Float32(buf) => buf.len(),
            TypedBuffer::Float64(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            TypedBuffer::String(_) => DataType::String,
            TypedBuffer::Int32(_) => DataType::Int32,
            TypedBuffer::Int64(_) => DataType::Int64,
            TypedBuffer::UInt32(_) => DataType::UInt32,
            TypedBuffer::UInt64(_) => DataType::UInt64,
            TypedBuffer::Float32(_) => DataType::Float32,
            TypedBuffer::Float64(_) => DataType::Float64,
        }
    }
}

/// A dense row-major array with dims, source names, dim paths, and a
/// missing-value mask.
#[derive(Debug, Clone)]
pub struct DataObject {
    buffer: TypedBuffer,
    dims: Vec<usize>,
    field_name: String,
    group_by_field_name: Option<String>,
    dim_paths: Vec<Query>,
    missing_mask: Vec<bool>,
}

impl DataObject {
    /// Materializes the staging buffer into the requested element type.
    ///
    /// Masked slots keep the sentinel in float buffers, saturate to the type
    /// maximum in integer buffers, and decode to the empty string in string
    /// buffers; the mask is authoritative either way. A non-missing value
    /// that does not fit the requested integer type is an error, never a
    /// silent clamp.
    pub(crate) fn build(
        data_type: DataType,
        staging: Vec<f64>,
        dims: Vec<usize>,
        field_name: String,
        group_by_field_name: Option<String>,
        dim_paths: Vec<Query>,
    ) -> Result<Self, BufrqError> {
        let missing_mask: Vec<bool> = staging.iter().map(|&v| v == MISSING_VALUE).collect();

        let buffer = match data_type {
            DataType::String => TypedBuffer::String(
                staging
                    .iter()
                    .zip(&missing_mask)
                    .map(|(&v, &missing)| {
                        if missing {
                            String::new()
                        } else {
                            unpack_string(v)
                        }
                    })
                    .collect(),
            ),
            DataType::Int32 => TypedBuffer::Int32(cast_buffer(
                &staging,
                &missing_mask,
                &field_name,
                data_type,
            )?),
            DataType::Int64 => TypedBuffer::Int64(cast_buffer(
                &staging,
                &missing_mask,
                &field_name,
                data_type,
            )?),
            DataType::UInt32 => TypedBuffer::UInt32(cast_buffer(
                &staging,
                &missing_mask,
                &field_name,
                data_type,
            )?),
            DataType::UInt64 => TypedBuffer::UInt64(cast_buffer(
                &staging,
                &missing_mask,
                &field_name,
                data_type,
            )?),
            DataType::Float32 => TypedBuffer::Float32(
                staging.iter().map(|&v| v as f32).collect(),
            ),
            DataType::Float64 => TypedBuffer::Float64(staging),
        };

        Ok(DataObject {
            buffer,
            dims,
            field_name,
            group_by_field_name,
            dim_paths,
            missing_mask,
        })
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn data_type(&self) -> DataType {
        self.buffer.data_type()
    }

    pub fn buffer(&self) -> &TypedBuffer {
        &self.buffer
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn group_by_field_name(&self) -> Option<&str> {
        self.group_by_field_name.as_deref()
    }

    pub fn dim_paths(&self) -> &[Query] {
        &self.dim_paths
    }

    pub fn is_missing(&self, idx: usize) -> bool {
        self.missing_mask[idx]
    }

    pub fn missing_mask(&self) -> &[bool] {
        &self.missing_mask
    }

    /// The element at `idx` widened to `f64`; `None` for masked slots and
    /// string buffers.
    pub fn get_as_f64(&self, idx: usize) -> Option<f64> {
        if self.missing_mask[idx] {
            return None;
        }

        match &self.buffer {
            TypedBuffer::String(_) => None,
            TypedBuffer::Int32(buf) => Some(buf[idx] as f64),
            TypedBuffer::Int64(buf) => Some(buf[idx] as f64),
            TypedBuffer::UInt32(buf) => Some(buf[idx] as f64),
            TypedBuffer::UInt64(buf) => Some(buf[idx] as f64),
            TypedBuffer::Float32(buf) => Some(buf[idx] as f64),
            TypedBuffer::Float64(buf) => Some(buf[idx]),
        }
    }

    /// The element at `idx` truncated to `i64`; `None` for masked slots and
    /// string buffers. Date/time composition reads components through this.
    pub fn get_as_int(&self, idx: usize) -> Option<i64> {
        match &self.buffer {
            TypedBuffer::Float32(_) | TypedBuffer::Float64(_) => {
                self.get_as_f64(idx).map(|v| v as i64)
            }
            TypedBuffer::Int32(buf) if !self.missing_mask[idx] => Some(buf[idx] as i64),
            TypedBuffer::Int64(buf) if !self.missing_mask[idx] => Some(buf[idx]),
            TypedBuffer::UInt32(buf) if !self.missing_mask[idx] => Some(buf[idx] as i64),
            TypedBuffer::UInt64(buf) if !self.missing_mask[idx] => Some(buf[idx] as i64),
            _ => None,
        }
    }
}

fn cast_buffer<T>(
    staging: &[f64],
    missing_mask: &[bool],
    field_name: &str,
    data_type: DataType,
) -> Result<Vec<T>, BufrqError>
where
    T: NumCast + Bounded + Copy,
{
    staging
        .iter()
        .zip(missing_mask)
        .map(|(&v, &missing)| {
            if missing {
                Ok(T::max_value())
            } else {
                NumCast::from(v).ok_or_else(|| BufrqError::OutOfRange {
                    field: field_name.to_string(),
                    value: v,
                    data_type,
                })
            }
        })
        .collect()
}

/// Packs up to eight ASCII bytes into an `f64` slot, first character in the
/// most significant byte. This is the staging representation decoders use for
/// BUFR character fields.
pub fn pack_string(value: &str) -> f64 {
    let mut bytes = [0u8; 8];
    for (slot, byte) in bytes.iter_mut().zip(value.bytes()) {
        *slot = byte;
    }
    f64::from_bits(u64::from_be_bytes(bytes))
}

/// Inverse of [`pack_string`]: decodes the byte pattern of a staged value,
/// trimming trailing NUL and space padding.
pub fn unpack_string(value: f64) -> String {
    let bytes = value.to_bits().to_be_bytes();
    let trimmed: &[u8] = {
        let mut end = bytes.len();
        while end > 0 && (bytes[end - 1] == 0 || bytes[end - 1] == b' ') {
            end -= 1;
        }
        &bytes[..end]
    };
    String::from_utf8_lossy(trimmed).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn build(data_type: DataType, staging: Vec<f64>) -> DataObject {
        DataObject::build(
            data_type,
            staging,
            vec![3],
            "T".to_string(),
            None,
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_mask_derived_from_sentinel() {
        let object = build(DataType::Float64, vec![1.0, MISSING_VALUE, 3.0]);
        assert_eq!(object.missing_mask(), &[false, true, false]);
        assert!(object.is_missing(1));
        assert_eq!(object.get_as_f64(1), None);
        assert_eq!(object.get_as_f64(2), Some(3.0));
    }

    #[test]
    fn test_integer_buffer_saturates_masked_slots() {
        let object = build(DataType::Int32, vec![250.0, MISSING_VALUE, -4.0]);
        match object.buffer() {
            TypedBuffer::Int32(buf) => assert_eq!(buf, &[250, i32::MAX, -4]),
            other => panic!("unexpected buffer {:?}", other),
        }
        assert_eq!(object.get_as_int(0), Some(250));
        assert_eq!(object.get_as_int(1), None);
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        // 3e9 exceeds i32::MAX and is not missing, so the cast must fail
        // rather than clamp.
        let result = DataObject::build(
            DataType::Int32,
            vec![3.0e9],
            vec![1],
            "T".to_string(),
            None,
            Vec::new(),
        );
        assert!(matches!(result, Err(BufrqError::OutOfRange { .. })));
    }

    #[test]
    fn test_float_buffer_keeps_sentinel() {
        let object = build(DataType::Float32, vec![1.5, MISSING_VALUE, -2.5]);
        match object.buffer() {
            TypedBuffer::Float32(buf) => {
                assert_eq!(buf[0], 1.5);
                assert_eq!(buf[1], MISSING_VALUE as f32);
            }
            other => panic!("unexpected buffer {:?}", other),
        }
    }

    #[test]
    fn test_string_pack_roundtrip() {
        assert_eq!(unpack_string(pack_string("KJFK")), "KJFK");
        assert_eq!(unpack_string(pack_string("METAR123")), "METAR123");
        // Space padding is trimmed like NUL padding.
        assert_eq!(unpack_string(pack_string("AB  ")), "AB");
    }

    #[test]
    fn test_string_buffer_masks_to_empty() {
        let object = build(
            DataType::String,
            vec![pack_string("KJFK"), MISSING_VALUE, pack_string("EGLL")],
        );
        match object.buffer() {
            TypedBuffer::String(buf) => {
                assert_eq!(buf, &["KJFK".to_string(), String::new(), "EGLL".to_string()]);
            }
            other => panic!("unexpected buffer {:?}", other),
        }
        assert!(object.is_missing(1));
        assert_eq!(object.get_as_int(0), None);
    }
}
