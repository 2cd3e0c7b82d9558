//! Accumulation of decoded frames and the `get` reshape pipeline.
//!
//! A `ResultSet` is append-only while a decoder feeds it, one [`DataFrame`]
//! per message, and read-only afterwards. `get` is pure over the accumulated
//! frames: it resolves the rectangular envelope across frames, inflates each
//! frame's ragged values into it, applies the group-by reprojection, and
//! materializes a typed [`DataObject`].

mod reshape;


use log::debug;

use crate::data_object::DataObject;
use crate::error::BufrqError;
use crate::frame::DataFrame;
use crate::query::{split_path, Query};
use crate::query_set::QuerySet;
use crate::types::{DataType, TypeInfo};
use crate::MISSING_VALUE;

use reshape::{product, resolve_dims, rows_for_field, slice_dims};

/// Accumulates one [`DataFrame`] per decoded message and reshapes them into
/// dense arrays on demand.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    names: Vec<String>,
    frames: Vec<DataFrame>,
}

impl ResultSet {
    pub fn new(names: Vec<String>) -> Self {
        ResultSet {
            names,
            frames: Vec::new(),
        }
    }

    /// A result set whose frame slots follow the query set's names.
    pub fn from_query_set(query_set: &QuerySet) -> Self {
        ResultSet::new(query_set.names())
    }

    /// Appends an empty frame and returns it for the decoder to populate.
    /// Append order is preserved through all downstream reshaping.
    pub fn next_data_frame(&mut self) -> &mut DataFrame {
        self.frames.push(DataFrame::new(&self.names));
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The unit string of a field's target, from the first frame.
    pub fn unit(&self, field_name: &str) -> Result<String, BufrqError> {
        let frame = self.frames.first().ok_or(BufrqError::EmptyResultSet)?;
        let field_idx = frame.field_index_for_node_named(field_name)?;
        Ok(frame.field_at_idx(field_idx).target.unit.clone())
    }

    /// Reshapes the accumulated frames for `field_name` into a typed dense
    /// array.
    ///
    /// `group_by` reprojects the output so its leading dimension follows the
    /// named field's repetition depth; `override_type` forces the element
    /// type instead of inferring it from the merged [`TypeInfo`].
    pub fn get(
        &self,
        field_name: &str,
        group_by: Option<&str>,
        override_type: Option<&str>,
    ) -> Result<DataObject, BufrqError> {
        let group_by = group_by.filter(|name| !name.is_empty());

        let first_frame = self.frames.first().ok_or(BufrqError::EmptyResultSet)?;

        if !first_frame.has_field_named(field_name) {
            return Err(BufrqError::NoSuchField(field_name.to_string()));
        }
        if let Some(group_name) = group_by {
            if !first_frame.has_field_named(group_name) {
                return Err(BufrqError::NoSuchField(group_name.to_string()));
            }
        }

        let (data, dims, dim_paths, type_info) = self.raw_values(field_name, group_by)?;

        let data_type = resolve_data_type(&type_info, override_type, field_name)?;

        log_metric!(
            "event" = "get",
            "field" = field_name,
            "rows" = &data.len(),
            "dtype" = &data_type
        );

        DataObject::build(
            data_type,
            data,
            dims,
            field_name.to_string(),
            group_by.map(str::to_string),
            dim_paths,
        )
    }

    /// The staging half of `get`: envelope resolution, per-frame inflation,
    /// and assembly of the dense row-major buffer.
    fn raw_values(
        &self,
        field_name: &str,
        group_by: Option<&str>,
    ) -> Result<(Vec<f64>, Vec<usize>, Vec<Query>, TypeInfo), BufrqError> {
        let first_frame = &self.frames[0];
        let target_idx = first_frame.field_index_for_node_named(field_name)?;

        let group_by_idx = match group_by {
            Some(group_name) => {
                let idx = first_frame.field_index_for_node_named(group_name)?;
                self.validate_group_by_path(target_idx, idx)?;
                Some(idx)
            }
            None => None,
        };

        let resolved = resolve_dims(&self.frames, target_idx, group_by_idx);

        let total_rows = resolved.dims[0] * self.frames.len();
        let row_length = product(&resolved.dims[1..]);

        debug!(
            "assembling {} ({} frames, dims {:?}, {} rows)",
            field_name,
            self.frames.len(),
            resolved.dims,
            total_rows
        );

        let mut data = vec![MISSING_VALUE; total_rows * row_length];
        for (frame_idx, frame) in self.frames.iter().enumerate() {
            let target_field = frame.field_at_idx(target_idx);
            if target_field.data.is_empty() {
                continue;
            }

            let frame_rows =
                rows_for_field(target_field, &resolved.all_dims, resolved.groupby_idx)?;

            let data_row_idx = resolved.dims[0] * frame_idx;
            for (row_idx, row) in frame_rows.iter().enumerate() {
                for (col_idx, &value) in row.iter().enumerate() {
                    let flat = data_row_idx * row_length + row_idx * row.len() + col_idx;
                    // Broadcast rows wider than the collapsed row length may
                    // overhang the last frame's block; those cells hold only
                    // missing filler and are dropped.
                    if let Some(slot) = data.get_mut(flat) {
                        *slot = value;
                    }
                }
            }
        }

        // Per-frame dims become dims for all collected data, then drop the
        // dimensions not retained for export.
        let mut dims = resolved.dims;
        dims[0] = total_rows;
        let dims = slice_dims(&dims, &resolved.export_dims);

        Ok((data, dims, resolved.dim_paths, resolved.type_info))
    }

    /// The group-by field must sit on the target's path: every component
    /// after the subset root has to match up to the shorter depth.
    fn validate_group_by_path(
        &self,
        target_idx: usize,
        group_by_idx: usize,
    ) -> Result<(), BufrqError> {
        let frame = &self.frames[0];
        let group_path = frame.field_at_idx(group_by_idx).target.dim_paths.last();
        let target_path = frame.field_at_idx(target_idx).target.dim_paths.last();

        let (Some(group_path), Some(target_path)) = (group_path, target_path) else {
            return Ok(());
        };

        let group_str = group_path.to_string();
        let target_str = target_path.to_string();
        let group_comps = split_path(&group_str);
        let target_comps = split_path(&target_str);

        for comp_idx in 1..group_comps.len().min(target_comps.len()) {
            if group_comps[comp_idx] != target_comps[comp_idx] {
                return Err(BufrqError::PathMismatch {
                    group_by: group_str,
                    target: target_str,
                });
            }
        }

        Ok(())
    }
}

/// Chooses the output element type: override string if given (string/numeric
/// crossings rejected), otherwise inferred from the merged descriptor.
fn resolve_data_type(
    type_info: &TypeInfo,
    override_type: Option<&str>,
    field_name: &str,
) -> Result<DataType, BufrqError> {
    match override_type {
        None => Ok(DataType::from_type_info(type_info)),
        Some(type_str) => {
            let data_type = DataType::parse_override(type_str)?;
            if data_type.is_string() != type_info.is_string() {
                return Err(BufrqError::UnsupportedConversion(field_name.to_string()));
            }
            Ok(data_type)
        }
    }
}
