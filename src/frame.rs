//! Per-message decoded data: fields, ragged sequence counts, and frames.
//!
//! A decoder produces one [`DataFrame`] per BUFR message. Each frame has one
//! slot per query name, and each slot is a [`DataField`] holding the leaf's
//! flat values plus the per-level repetition counts the reshape pipeline needs
//! to rebuild the rectangular layout.

use std::sync::Arc;

use crate::error::BufrqError;
use crate::query::Query;
use crate::types::TypeInfo;

/// Ragged per-level repetition counts for one field.
///
/// Level `L` holds one count per parent occurrence at level `L-1`. The levels
/// are stored as one flat vector with per-level offsets so the inflation loop
/// walks contiguous memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqCounts {
    counts: Vec<usize>,
    level_offsets: Vec<usize>,
}

impl Default for SeqCounts {
    fn default() -> Self {
        SeqCounts {
            counts: Vec::new(),
            level_offsets: vec![0],
        }
    }
}

impl SeqCounts {
    pub fn new() -> Self {
        SeqCounts::default()
    }

    /// Builds the table from nested per-level vectors, shallowest first.
    pub fn from_levels<I, L>(levels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = usize>,
    {
        let mut table = SeqCounts::new();
        for level in levels {
            table.push_level(level);
        }
        table
    }

    /// Appends the next (deeper) repetition level.
    pub fn push_level<L: IntoIterator<Item = usize>>(&mut self, level: L) {
        self.counts.extend(level);
        self.level_offsets.push(self.counts.len());
    }

    pub fn num_levels(&self) -> usize {
        self.level_offsets.len() - 1
    }

    /// The counts at repetition level `level`, one per parent occurrence.
    pub fn level(&self, level: usize) -> &[usize] {
        &self.counts[self.level_offsets[level]..self.level_offsets[level + 1]]
    }

    /// The largest count at `level`, or `None` when the level is empty.
    pub fn max_at(&self, level: usize) -> Option<usize> {
        self.level(level).iter().copied().max()
    }
}

/// The resolved schema position of a leaf, shared by every frame that decoded
/// the same node. Treat as immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Target {
    /// Paths of the repetition sequences enclosing the leaf, shallowest first.
    pub dim_paths: Vec<Query>,
    /// Indices (strictly increasing) of the dims retained in exported output.
    pub export_dim_idxs: Vec<usize>,
    pub type_info: TypeInfo,
    pub unit: String,
}

/// One leaf's decoded contents for one frame.
///
/// `data` is laid out in document order under the ragged counts; missing
/// values carry the [`MISSING_VALUE`](crate::MISSING_VALUE) sentinel.
#[derive(Debug, Clone, Default)]
pub struct DataField {
    pub name: String,
    pub data: Vec<f64>,
    pub seq_counts: SeqCounts,
    pub target: Arc<Target>,
}

impl DataField {
    pub fn new(name: impl Into<String>) -> Self {
        DataField {
            name: name.into(),
            ..DataField::default()
        }
    }
}

/// All fields of one decoded message, with slots ordered to match the owning
/// `QuerySet`'s names.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    fields: Vec<DataField>,
}

impl DataFrame {
    pub(crate) fn new(names: &[String]) -> Self {
        DataFrame {
            fields: names.iter().map(DataField::new).collect(),
        }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_index_for_node_named(&self, name: &str) -> Result<usize, BufrqError> {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .ok_or_else(|| BufrqError::NoSuchField(name.to_string()))
    }

    pub fn has_field_named(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }

    pub fn field_at_idx(&self, idx: usize) -> &DataField {
        &self.fields[idx]
    }

    pub fn field_at_idx_mut(&mut self, idx: usize) -> &mut DataField {
        &mut self.fields[idx]
    }

    /// Decoder convenience: the mutable slot for `name`.
    pub fn field_named_mut(&mut self, name: &str) -> Result<&mut DataField, BufrqError> {
        let idx = self.field_index_for_node_named(name)?;
        Ok(&mut self.fields[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_counts_levels() {
        let counts = SeqCounts::from_levels(vec![vec![2], vec![3, 2]]);
        assert_eq!(counts.num_levels(), 2);
        assert_eq!(counts.level(0), &[2]);
        assert_eq!(counts.level(1), &[3, 2]);
        assert_eq!(counts.max_at(1), Some(3));
    }

    #[test]
    fn test_seq_counts_empty_level() {
        let counts = SeqCounts::from_levels(vec![vec![1], vec![]]);
        assert_eq!(counts.num_levels(), 2);
        assert!(counts.level(1).is_empty());
        assert_eq!(counts.max_at(1), None);
    }

    #[test]
    fn test_frame_slot_lookup() {
        let names = vec!["latitude".to_string(), "longitude".to_string()];
        let mut frame = DataFrame::new(&names);

        assert_eq!(frame.num_fields(), 2);
        assert_eq!(frame.field_index_for_node_named("longitude").unwrap(), 1);
        assert!(frame.has_field_named("latitude"));
        assert!(!frame.has_field_named("temperature"));
        assert!(matches!(
            frame.field_index_for_node_named("temperature"),
            Err(BufrqError::NoSuchField(_))
        ));

        frame.field_named_mut("latitude").unwrap().data = vec![42.5];
        assert_eq!(frame.field_at_idx(0).data, vec![42.5]);
    }
}
