//! Resolution of a plot request into a concrete slice specification.
//!
//! Given the axis registry and a `PlotSelection`, produce one half-open
//! `(start, stop)` pair per dataset dimension plus the list of dimensions to
//! reduce by averaging. All validation happens here, before any file I/O.

use itertools::Itertools;
use tracing::debug;

use crate::error::{DataViewError, Result};
use crate::registry::AxisRegistry;
use crate::selection::{FilterMode, PlotSelection};

/// A resolved multi-dimensional slice: half-open index ranges in registry
/// order plus the positions to be reduced by averaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceSpec {
    ranges: Vec<(usize, usize)>,
    averaged: Vec<usize>,
}

impl SliceSpec {
    /// Resolve `selection` against `registry`.
    ///
    /// Per axis, in registry order:
    /// - active axes contribute their stored inclusive pair normalized to a
    ///   half-open span `(lo, hi + 1)` and must cover at least two indices;
    /// - non-active axes flagged for averaging contribute their full
    ///   inclusive span and are recorded as reduction dimensions;
    /// - every other axis is held at a single index as a length-1 span that
    ///   collapses on extraction.
    ///
    /// # Errors
    /// Fails closed with `SliceRange` when the selection is unusable:
    /// positions out of bounds or duplicated, a 2D plot over one axis, an
    /// active axis that is flagged for averaging or spans fewer than two
    /// indices, or a non-positive filter sigma.
    pub fn resolve(registry: &AxisRegistry, selection: &PlotSelection) -> Result<Self> {
        validate(registry, selection)?;

        let mut ranges = Vec::with_capacity(registry.len());
        let mut averaged = Vec::new();
        for (position, axis) in registry.axes().enumerate() {
            let (lo, hi) = axis.index_range();
            if hi < lo || hi >= axis.len() {
                return Err(DataViewError::slice_range(format!(
                    "axis '{}' holds an invalid index range ({lo}, {hi})",
                    axis.name()
                )));
            }
            if selection.active_axes.contains(&position) {
                ranges.push((lo, hi + 1));
            } else if axis.is_averaged() {
                ranges.push((lo, hi + 1));
                averaged.push(position);
            } else {
                ranges.push((lo, lo + 1));
            }
        }

        debug!(?ranges, ?averaged, "resolved slice");
        Ok(Self { ranges, averaged })
    }

    /// Half-open `(start, stop)` pairs, one per dataset dimension.
    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    /// Dimensions to reduce by arithmetic mean, in registry order.
    pub fn averaged(&self) -> &[usize] {
        &self.averaged
    }

    /// The half-open span of one dimension.
    pub fn span(&self, position: usize) -> (usize, usize) {
        self.ranges[position]
    }

    /// Number of selected indices along one dimension.
    pub fn span_len(&self, position: usize) -> usize {
        let (start, stop) = self.ranges[position];
        stop - start
    }
}

fn validate(registry: &AxisRegistry, selection: &PlotSelection) -> Result<()> {
    let expected = selection.kind.dimensionality();
    if selection.active_axes.len() != expected {
        return Err(DataViewError::slice_range(format!(
            "{} plot needs {expected} active axes, got {}",
            selection.kind,
            selection.active_axes.len()
        )));
    }
    if !selection.active_axes.iter().all_unique() {
        return Err(DataViewError::slice_range(
            "active axes need to be different",
        ));
    }
    if selection.filter != FilterMode::None && !(selection.filter_sigma > 0.0) {
        return Err(DataViewError::slice_range(format!(
            "filter sigma must be positive, got {}",
            selection.filter_sigma
        )));
    }

    for &position in &selection.active_axes {
        let axis = registry.axis(position).ok_or_else(|| {
            DataViewError::slice_range(format!(
                "active axis position {position} is out of bounds ({} axes)",
                registry.len()
            ))
        })?;
        if axis.len() < 2 {
            return Err(DataViewError::slice_range(format!(
                "axis '{}' must have length > 1",
                axis.name()
            )));
        }
        if axis.is_averaged() {
            return Err(DataViewError::slice_range(format!(
                "axis '{}' is flagged for averaging and cannot be plotted",
                axis.name()
            )));
        }
        let (lo, hi) = axis.index_range();
        if hi <= lo {
            return Err(DataViewError::slice_range(format!(
                "selected range on axis '{}' is empty",
                axis.name()
            )));
        }
    }
    Ok(())
}
