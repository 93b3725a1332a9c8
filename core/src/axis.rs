//! Per-dimension axis model.
//!
//! One `AxisModel` exists for every dimension of the loaded dataset. It owns
//! the raw coordinate array, the unit pair (immutable native, mutable
//! display), and the user's selection for that dimension.
//!
//! The index pair is the single authoritative selection state. Display
//! values are always derived on demand as `coordinates[i] * unit_factor`,
//! never cached on a second mutable field, so a display-unit change rescales
//! the selected values with no re-snapping and no drift. `mode` only records
//! which representation the user is currently driving.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{DataViewError, Result};
use crate::units::UnitConverter;

/// Which representation the user is editing for this axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase")]
pub enum AxisSelectionMode {
    Index,
    #[default]
    Value,
}

/// One labeled dataset dimension with its coordinates, units, and selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisModel {
    name: String,
    coordinates: Array1<f64>,
    native_unit: String,
    display_unit: String,
    unit_factor: f64,
    index_range: (usize, usize),
    mode: AxisSelectionMode,
    average: bool,
}

impl AxisModel {
    /// Build a fresh axis from dataset metadata.
    ///
    /// The initial selection spans the whole axis in value mode with no
    /// averaging, and the display unit starts out equal to the native unit.
    ///
    /// # Errors
    /// Returns `DatasetShape` for an empty coordinate array.
    pub fn new(
        name: impl Into<String>,
        coordinates: Array1<f64>,
        native_unit: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if coordinates.is_empty() {
            return Err(DataViewError::dataset_shape(format!(
                "axis '{name}' has no coordinates"
            )));
        }
        let native_unit = native_unit.into();
        let last = coordinates.len() - 1;
        Ok(Self {
            name,
            coordinates,
            display_unit: native_unit.clone(),
            native_unit,
            unit_factor: 1.0,
            index_range: (0, last),
            mode: AxisSelectionMode::default(),
            average: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn coordinates(&self) -> &Array1<f64> {
        &self.coordinates
    }

    pub fn native_unit(&self) -> &str {
        &self.native_unit
    }

    pub fn display_unit(&self) -> &str {
        &self.display_unit
    }

    pub fn unit_factor(&self) -> f64 {
        self.unit_factor
    }

    /// Inclusive index pair, `lo <= hi`, both within `[0, len - 1]`.
    pub fn index_range(&self) -> (usize, usize) {
        self.index_range
    }

    pub fn mode(&self) -> AxisSelectionMode {
        self.mode
    }

    pub fn is_averaged(&self) -> bool {
        self.average
    }

    /// Coordinate at `index`, expressed in the display unit.
    pub fn display_value_at(&self, index: usize) -> f64 {
        self.coordinates[index.min(self.len() - 1)] * self.unit_factor
    }

    /// The selected bounds expressed in the display unit, derived from the
    /// authoritative index pair.
    pub fn display_value_range(&self) -> (f64, f64) {
        (
            self.display_value_at(self.index_range.0),
            self.display_value_at(self.index_range.1),
        )
    }

    /// Positional bounds of the axis in the display unit: first and last
    /// coordinate, not `min`/`max` (the axis may be monotonically
    /// decreasing).
    pub fn display_extent(&self) -> (f64, f64) {
        (self.display_value_at(0), self.display_value_at(self.len() - 1))
    }

    /// Index of the coordinate whose display-unit value is closest to
    /// `display_value`. Ties resolve to the lower index, which makes the
    /// index -> value -> index round trip a fixed point.
    pub fn nearest_index(&self, display_value: f64) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, &coord) in self.coordinates.iter().enumerate() {
            let dist = (coord * self.unit_factor - display_value).abs();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best
    }

    /// Drive the selection by physical value.
    ///
    /// Each endpoint snaps to the nearest coordinate (no interpolation), so
    /// the stored selection may differ slightly from the request; callers
    /// should re-read the snapped bounds rather than assume the requested
    /// values were preserved.
    pub fn set_value_range(&mut self, val_a: f64, val_b: f64) {
        self.mode = AxisSelectionMode::Value;
        let a = self.nearest_index(val_a);
        let b = self.nearest_index(val_b);
        self.index_range = (a.min(b), a.max(b));
    }

    /// Drive the selection by index. Endpoints are clamped into
    /// `[0, len - 1]` and stored in ascending order.
    pub fn set_index_range(&mut self, idx_a: usize, idx_b: usize) {
        self.mode = AxisSelectionMode::Index;
        let last = self.len() - 1;
        let a = idx_a.min(last);
        let b = idx_b.min(last);
        self.index_range = (a.min(b), a.max(b));
    }

    /// Hold the axis at a single index.
    pub fn set_index(&mut self, index: usize) {
        self.set_index_range(index, index);
    }

    /// Switch the display unit, recomputing the factor against the native
    /// unit. The selected value bounds rescale implicitly since they are
    /// derived from the index pair.
    ///
    /// # Errors
    /// Returns a unit error and leaves the previous unit and factor in place
    /// when the new unit does not parse or is not commensurable with the
    /// native unit.
    pub fn set_display_unit(
        &mut self,
        unit: impl Into<String>,
        converter: &mut UnitConverter,
    ) -> Result<()> {
        let unit = unit.into();
        let factor = converter.factor(&self.native_unit, &unit)?;
        self.display_unit = unit;
        self.unit_factor = factor;
        Ok(())
    }

    /// Flag or unflag this axis for averaging. An averaged axis contributes
    /// its full selected span to the slice and is reduced by arithmetic mean
    /// instead of being plotted; the resolver refuses selections that list an
    /// averaged axis as active.
    pub fn set_average(&mut self, average: bool) {
        self.average = average;
    }

    /// Axis label in the form the plot layer expects, e.g. `x (cm)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.display_unit)
    }

    /// Carry a previous file's configuration over to this axis (same name,
    /// freshly loaded file). Units are copied only when the native unit still
    /// matches; the selection is re-derived best-effort against the new
    /// coordinates and clamped to the new bounds.
    pub fn adopt_settings(&mut self, old: &AxisModel) {
        if old.native_unit == self.native_unit {
            self.display_unit = old.display_unit.clone();
            self.unit_factor = old.unit_factor;
        }
        self.average = old.average;
        match old.mode {
            AxisSelectionMode::Index => {
                let (lo, hi) = old.index_range;
                self.set_index_range(lo, hi);
            }
            AxisSelectionMode::Value => {
                let (lo, hi) = old.display_value_range();
                self.set_value_range(lo, hi);
            }
        }
        self.mode = old.mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn axis() -> AxisModel {
        AxisModel::new("x", array![0.0, 1.0, 2.0, 3.0, 4.0], "cm").unwrap()
    }

    #[test]
    fn test_defaults_span_full_axis() {
        let ax = axis();
        assert_eq!(ax.index_range(), (0, 4));
        assert_eq!(ax.mode(), AxisSelectionMode::Value);
        assert!(!ax.is_averaged());
        assert_eq!(ax.unit_factor(), 1.0);
        assert_eq!(ax.display_unit(), "cm");
    }

    #[test]
    fn test_empty_axis_rejected() {
        let err = AxisModel::new("x", Array1::<f64>::zeros(0), "cm").unwrap_err();
        assert!(matches!(err, DataViewError::DatasetShape { .. }));
    }

    #[test]
    fn test_index_range_clamps_and_orders() {
        let mut ax = axis();
        ax.set_index_range(7, 1);
        assert_eq!(ax.index_range(), (1, 4));
        assert_eq!(ax.mode(), AxisSelectionMode::Index);
    }

    #[test]
    fn test_value_range_snaps_to_nearest() {
        let mut ax = axis();
        ax.set_value_range(0.9, 3.2);
        assert_eq!(ax.index_range(), (1, 3));
        // the snapped values are re-readable and exact
        assert_eq!(ax.display_value_range(), (1.0, 3.0));
    }

    #[test]
    fn test_tie_breaks_to_lower_index() {
        let mut ax = axis();
        // 0.5 is equidistant from coordinates 0.0 and 1.0
        ax.set_value_range(0.5, 0.5);
        assert_eq!(ax.index_range(), (0, 0));
    }

    #[test]
    fn test_index_value_round_trip_is_fixed_point() {
        let mut ax = axis();
        for i in 0..ax.len() {
            ax.set_index_range(i, i);
            let (v, _) = ax.display_value_range();
            ax.set_value_range(v, v);
            assert_eq!(ax.index_range(), (i, i));
        }
    }

    #[test]
    fn test_display_unit_rescales_derived_values() {
        let mut converter = UnitConverter::new();
        let mut ax = axis();
        ax.set_index_range(1, 3);
        ax.set_display_unit("mm", &mut converter).unwrap();
        assert_eq!(ax.display_unit(), "mm");
        let (lo, hi) = ax.display_value_range();
        assert!((lo - 10.0).abs() < 1e-12);
        assert!((hi - 30.0).abs() < 1e-12);
        // the selection itself did not move
        assert_eq!(ax.index_range(), (1, 3));
    }

    #[test]
    fn test_invalid_unit_keeps_previous_state() {
        let mut converter = UnitConverter::new();
        let mut ax = axis();
        ax.set_display_unit("mm", &mut converter).unwrap();
        let err = ax.set_display_unit("kg", &mut converter).unwrap_err();
        assert!(err.is_unit_error());
        assert_eq!(ax.display_unit(), "mm");
        assert!((ax.unit_factor() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_survives_unit_change() {
        let mut converter = UnitConverter::new();
        let mut ax = axis();
        ax.set_display_unit("mm", &mut converter).unwrap();
        ax.set_index_range(2, 2);
        let (v, _) = ax.display_value_range();
        ax.set_value_range(v, v);
        assert_eq!(ax.index_range(), (2, 2));
    }

    #[test]
    fn test_descending_axis_extent_is_positional() {
        let ax = AxisModel::new("t", array![5.0, 3.0, 1.0], "s").unwrap();
        assert_eq!(ax.display_extent(), (5.0, 1.0));
    }

    #[test]
    fn test_adopt_settings_clamps_to_new_bounds() {
        let mut converter = UnitConverter::new();
        let mut old = AxisModel::new("x", Array1::linspace(0.0, 9.0, 10), "cm").unwrap();
        old.set_display_unit("mm", &mut converter).unwrap();
        old.set_index_range(4, 9);
        old.set_average(true);

        let mut fresh = AxisModel::new("x", Array1::linspace(0.0, 4.0, 5), "cm").unwrap();
        fresh.adopt_settings(&old);
        assert_eq!(fresh.display_unit(), "mm");
        assert!(fresh.is_averaged());
        assert_eq!(fresh.index_range(), (4, 4));
        assert_eq!(fresh.mode(), AxisSelectionMode::Index);
    }

    #[test]
    fn test_adopt_settings_value_mode_resnaps() {
        let mut old = AxisModel::new("x", Array1::linspace(0.0, 9.0, 10), "cm").unwrap();
        old.set_value_range(2.0, 6.0);

        // new file has twice the resolution over the same range
        let mut fresh = AxisModel::new("x", Array1::linspace(0.0, 9.0, 19), "cm").unwrap();
        fresh.adopt_settings(&old);
        let (lo, hi) = fresh.display_value_range();
        assert!((lo - 2.0).abs() < 1e-12);
        assert!((hi - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_adopt_settings_ignores_units_when_native_changed() {
        let mut converter = UnitConverter::new();
        let mut old = AxisModel::new("x", array![0.0, 1.0], "cm").unwrap();
        old.set_display_unit("mm", &mut converter).unwrap();

        let mut fresh = AxisModel::new("x", array![0.0, 1.0], "s").unwrap();
        fresh.adopt_settings(&old);
        assert_eq!(fresh.display_unit(), "s");
        assert_eq!(fresh.unit_factor(), 1.0);
    }
}
