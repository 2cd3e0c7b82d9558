//! Dimension resolution and ragged-to-rectangular inflation.
//!
//! These are the pure kernels behind `ResultSet::get`: walk every frame to
//! find the tight rectangular envelope, inflate each frame's document-ordered
//! values into that envelope with missing-value filler, and partition the
//! inflated block by the group-by depth.

use log::trace;

use crate::error::BufrqError;
use crate::frame::{DataField, DataFrame};
use crate::query::Query;
use crate::types::TypeInfo;
use crate::MISSING_VALUE;

/// Product of a dimension slice; the empty product is 1.
pub(crate) fn product(dims: &[usize]) -> usize {
    dims.iter().product()
}

/// Keeps only the dimensions selected by `export_dims`, in order.
pub(crate) fn slice_dims(dims: &[usize], export_dims: &[usize]) -> Vec<usize> {
    export_dims
        .iter()
        .filter_map(|&idx| dims.get(idx).copied())
        .collect()
}

/// Everything the assembly step needs, computed in one pass over the frames.
pub(crate) struct ResolvedDims {
    /// The lifted per-level envelope each frame inflates into. In the
    /// deeper-group-by case this is the flat group-by shape instead.
    pub all_dims: Vec<usize>,
    /// Output dims per frame, leading entry already collapsed for group-by.
    pub dims: Vec<usize>,
    /// Indices into `dims` retained in the exported shape.
    pub export_dims: Vec<usize>,
    pub dim_paths: Vec<Query>,
    pub type_info: TypeInfo,
    /// Repetition depth of the group-by field; zero means no group-by.
    pub groupby_idx: usize,
}

/// Walks every frame to compute the rectangular envelope, the deepest dim
/// paths, the merged type descriptor, and the group-by bookkeeping.
pub(crate) fn resolve_dims(
    frames: &[DataFrame],
    target_idx: usize,
    group_by_idx: Option<usize>,
) -> ResolvedDims {
    let first_target = &frames[0].field_at_idx(target_idx).target;

    let mut dims_list: Vec<usize> = Vec::new();
    let mut dim_paths = first_target.dim_paths.clone();
    let mut export_dims: Vec<i64> = first_target
        .export_dim_idxs
        .iter()
        .map(|&idx| idx as i64)
        .collect();
    let mut type_info = TypeInfo::default();
    let mut groupby_idx = 0usize;
    let mut total_groupby_elements = 0usize;

    for frame in frames {
        let target_field = frame.field_at_idx(target_idx);
        let target = &target_field.target;

        // A later frame may expose a deeper repetition path for the same
        // node; the deepest one wins.
        if !target.dim_paths.is_empty() && dim_paths.len() < target.dim_paths.len() {
            dim_paths = target.dim_paths.clone();
            export_dims = target.export_dim_idxs.iter().map(|&idx| idx as i64).collect();
        }

        let depth = target_field.seq_counts.num_levels();
        if dims_list.len() < depth {
            dims_list.resize(depth, 0);
        }

        for level in 0..depth {
            if let Some(level_max) = target_field.seq_counts.max_at(level) {
                dims_list[level] = dims_list[level].max(level_max);
            }
        }

        type_info.merge(&target.type_info);

        if let Some(gb_idx) = group_by_idx {
            let group_field = frame.field_at_idx(gb_idx);
            groupby_idx = groupby_idx.max(group_field.seq_counts.num_levels());

            if groupby_idx > dims_list.len() {
                // The group-by repeats deeper than the target; the output is
                // shaped by the group-by lattice alone.
                dim_paths = group_field.target.dim_paths.last().cloned().into_iter().collect();

                let mut elements_for_frame = 1usize;
                for level in 0..group_field.seq_counts.num_levels() {
                    if let Some(level_max) = group_field.seq_counts.max_at(level) {
                        elements_for_frame *= level_max;
                    }
                }
                total_groupby_elements = total_groupby_elements.max(elements_for_frame);
            } else {
                let target_paths = &target.dim_paths;
                dim_paths = match group_field.target.export_dim_idxs.len().checked_sub(1) {
                    Some(start) if start < target_paths.len() => target_paths[start..].to_vec(),
                    _ => Vec::new(),
                };
            }
        }
    }

    // A field with no data at all would produce zero-sized dimensions; lift
    // them to one so the missing value has somewhere to live.
    let mut all_dims = dims_list.clone();
    for dim in &mut all_dims {
        if *dim == 0 {
            *dim = 1;
        }
    }

    let dims: Vec<usize>;
    let export_dims_out: Vec<usize>;

    if groupby_idx > 0 {
        if groupby_idx > dims_list.len() {
            dims = vec![total_groupby_elements];
            export_dims_out = vec![0];
            all_dims = dims.clone();
        } else {
            // Collapse the levels above the group-by depth into the leading
            // dimension, keep the rest as-is.
            let mut collapsed = vec![1usize; dims_list.len() - groupby_idx + 1];
            for dim_idx in 0..groupby_idx {
                collapsed[0] *= all_dims[dim_idx];
            }
            for dim_idx in groupby_idx..all_dims.len() {
                collapsed[dim_idx - groupby_idx + 1] = all_dims[dim_idx];
            }
            dims = collapsed;

            let shift = (groupby_idx - 1) as i64;
            let mut filtered: Vec<usize> = export_dims
                .iter()
                .map(|&dim| dim - shift)
                .filter(|&dim| dim >= 0)
                .map(|dim| dim as usize)
                .collect();
            if filtered.first() != Some(&0) {
                filtered.insert(0, 0);
            }
            export_dims_out = filtered;
        }
    } else {
        dims = all_dims.clone();
        export_dims_out = export_dims.iter().map(|&dim| dim as usize).collect();
    }

    // A target with no repetition levels at all (never populated by the
    // decoder) still yields a one-slot missing result.
    let (dims, export_dims_out, all_dims) = if dims.is_empty() {
        (vec![1], vec![0], vec![1])
    } else {
        (dims, export_dims_out, all_dims)
    };

    trace!(
        "resolved dims {:?} (envelope {:?}, groupby depth {})",
        dims,
        all_dims,
        groupby_idx
    );

    ResolvedDims {
        all_dims,
        dims,
        export_dims: export_dims_out,
        dim_paths,
        type_info,
        groupby_idx,
    }
}

/// Inflates one frame's document-ordered values into the rectangular
/// `envelope` and partitions the result by group-by depth.
///
/// The inflation computes, per repetition level and parent occurrence, how
/// many filler cells the ragged counts leave open, then shifts every data
/// index past the corresponding split point so a single scatter pass lands
/// each value in its row-major slot.
pub(crate) fn rows_for_field(
    field: &DataField,
    envelope: &[usize],
    groupby_idx: usize,
) -> Result<Vec<Vec<f64>>, BufrqError> {
    let mut idxs: Vec<usize> = (0..field.data.len()).collect();

    let max_counts = (0..field.seq_counts.num_levels())
        .map(|level| field.seq_counts.level(level).len())
        .max()
        .unwrap_or(0);

    // Per-parent filler counts at each level covered by both the envelope
    // and this frame's counts.
    let mut inserts: Vec<Vec<usize>> = vec![vec![0]; envelope.len()];
    for rep_idx in 0..envelope.len().min(field.seq_counts.num_levels()) {
        let tail = product(&envelope[rep_idx..]);
        let tail_next = product(&envelope[rep_idx + 1..]);

        let mut level_inserts = Vec::with_capacity(field.seq_counts.level(rep_idx).len());
        for &count in field.seq_counts.level(rep_idx) {
            let filled = count * tail_next;
            if filled > tail {
                return Err(BufrqError::Internal(format!(
                    "sequence count {} at level {} exceeds the resolved envelope",
                    count, rep_idx
                )));
            }
            level_inserts.push(tail - filled);
        }
        inserts[rep_idx] = level_inserts;
    }

    // Deepest level first: shift indices above each split point to make room
    // for that parent's filler cells.
    for dim_idx in (0..envelope.len()).rev() {
        let tail = product(&envelope[dim_idx..]) as i64;
        for (insert_idx, &num_inserts) in inserts[dim_idx].iter().enumerate() {
            if num_inserts > 0 {
                let split = tail * insert_idx as i64 + tail - num_inserts as i64 - 1;
                for idx in idxs.iter_mut() {
                    if *idx as i64 > split {
                        *idx += num_inserts;
                    }
                }
            }
        }
    }

    let mut output = vec![MISSING_VALUE; product(envelope)];
    for (data_idx, &out_idx) in idxs.iter().enumerate() {
        let slot = output.get_mut(out_idx).ok_or_else(|| {
            BufrqError::Internal("sequence counts inconsistent with data length".to_string())
        })?;
        *slot = field.data[data_idx];
    }

    if groupby_idx == 0 {
        return Ok(vec![output]);
    }

    let rows = if groupby_idx > field.seq_counts.num_levels() {
        // The group-by lattice is finer than the target: broadcast the scalar
        // into column 0 of every row, missing elsewhere.
        let num_rows = product(envelope);
        let width = max_counts.max(1);
        let scalar = output.first().copied().unwrap_or(MISSING_VALUE);
        (0..num_rows)
            .map(|_| {
                let mut row = vec![MISSING_VALUE; width];
                row[0] = scalar;
                row
            })
            .collect()
    } else {
        let num_rows = product(&envelope[..groupby_idx]);
        let width = product(&envelope[groupby_idx..]);
        (0..num_rows)
            .map(|row_idx| output[row_idx * width..(row_idx + 1) * width].to_vec())
            .collect()
    };

    Ok(rows)
}
