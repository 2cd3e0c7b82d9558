//! The canonical element type of a dense query result.
//!
//! This enum replaces the string-based type dispatch of earlier tooling with a
//! compile-time checked representation. It is resolved either from the merged
//! [`TypeInfo`](crate::types::TypeInfo) or from a caller-supplied override
//! string.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BufrqError;
use crate::types::TypeInfo;

/// The element type a [`DataObject`](crate::data_object::DataObject) carries.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    String,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl DataType {
    /// Resolves the output type from a merged descriptor: character data maps
    /// to `String`; integral data to signed/unsigned 32/64-bit by reference
    /// sign and bit width; everything else to a float sized by bit width.
    pub fn from_type_info(info: &TypeInfo) -> Self {
        if info.is_string() {
            DataType::String
        } else if info.is_integer() {
            match (info.is_signed(), info.is_64bit()) {
                (true, true) => DataType::Int64,
                (true, false) => DataType::Int32,
                (false, true) => DataType::UInt64,
                (false, false) => DataType::UInt32,
            }
        } else if info.is_64bit() {
            DataType::Float64
        } else {
            DataType::Float32
        }
    }

    /// Parses an override-type string from the export configuration.
    pub fn parse_override(override_type: &str) -> Result<Self, BufrqError> {
        match override_type {
            "int" | "int32" => Ok(DataType::Int32),
            "int64" => Ok(DataType::Int64),
            "uint" | "uint32" => Ok(DataType::UInt32),
            "uint64" => Ok(DataType::UInt64),
            "float" | "float32" => Ok(DataType::Float32),
            "double" | "float64" => Ok(DataType::Float64),
            "string" => Ok(DataType::String),
            other => Err(BufrqError::UnknownType(other.to_string())),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, DataType::String)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_info(reference: i64, bits: i32) -> TypeInfo {
        TypeInfo {
            reference,
            bits,
            ..TypeInfo::default()
        }
    }

    #[test]
    fn test_integer_type_selection() {
        assert_eq!(DataType::from_type_info(&int_info(0, 16)), DataType::UInt32);
        assert_eq!(DataType::from_type_info(&int_info(0, 40)), DataType::UInt64);
        assert_eq!(DataType::from_type_info(&int_info(-5, 16)), DataType::Int32);
        assert_eq!(DataType::from_type_info(&int_info(-5, 40)), DataType::Int64);
    }

    #[test]
    fn test_float_and_string_selection() {
        let scaled = TypeInfo {
            scale: 2,
            bits: 16,
            ..TypeInfo::default()
        };
        assert_eq!(DataType::from_type_info(&scaled), DataType::Float32);

        let wide = TypeInfo {
            scale: 2,
            bits: 48,
            ..TypeInfo::default()
        };
        assert_eq!(DataType::from_type_info(&wide), DataType::Float64);

        let chars = TypeInfo {
            string_flag: true,
            ..TypeInfo::default()
        };
        assert_eq!(DataType::from_type_info(&chars), DataType::String);
    }

    #[test]
    fn test_override_vocabulary() {
        assert_eq!(DataType::parse_override("int").unwrap(), DataType::Int32);
        assert_eq!(DataType::parse_override("uint").unwrap(), DataType::UInt32);
        assert_eq!(
            DataType::parse_override("float64").unwrap(),
            DataType::Float64
        );
        assert_eq!(
            DataType::parse_override("string").unwrap(),
            DataType::String
        );
        assert!(matches!(
            DataType::parse_override("complex128"),
            Err(BufrqError::UnknownType(_))
        ));
    }
}
