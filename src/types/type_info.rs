//! The per-leaf numeric descriptor taken from BUFR table metadata.

use serde::{Deserialize, Serialize};

/// Wire-level type description of one leaf field.
///
/// One `TypeInfo` per frame arrives attached to the field's target; the
/// reshape pipeline folds them together with [`TypeInfo::merge`] so the output
/// element type covers every frame's value range.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeInfo {
    /// The BUFR reference value. Negative references mean the decoded range
    /// extends below zero.
    pub reference: i64,
    /// Bit width of the packed value.
    pub bits: i32,
    /// Decimal scale factor; zero means the value is integral.
    pub scale: i32,
    /// Unit string from the BUFR tables, e.g. `DEGREES` or `CCITT IA5`.
    pub unit: String,
    /// Set when the leaf holds character data.
    pub string_flag: bool,
}

impl TypeInfo {
    /// Folds another frame's descriptor into this one.
    ///
    /// `reference` takes the minimum, `bits` the maximum, `scale` the value
    /// with the larger magnitude (absolute values compared on both sides),
    /// `unit` the first non-empty string, and `string_flag` the logical or.
    pub fn merge(&mut self, other: &TypeInfo) {
        self.reference = self.reference.min(other.reference);
        self.bits = self.bits.max(other.bits);

        if other.scale.abs() > self.scale.abs() {
            self.scale = other.scale;
        }

        if self.unit.is_empty() {
            self.unit = other.unit.clone();
        }

        self.string_flag |= other.string_flag;
    }

    pub fn is_string(&self) -> bool {
        self.string_flag
    }

    pub fn is_integer(&self) -> bool {
        self.scale == 0 && !self.is_string()
    }

    pub fn is_signed(&self) -> bool {
        self.reference < 0
    }

    pub fn is_64bit(&self) -> bool {
        self.bits > 32
    }
}
