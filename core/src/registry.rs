//! The ordered collection of axes for the currently loaded dataset.
//!
//! Axes are addressed by their integer position (the dataset's dimension
//! order); name lookup exists for the selection-preserving reload path. The
//! dataset's own unit state lives here too and follows the same
//! native/display/factor invariant as a per-axis unit.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::axis::AxisModel;
use crate::error::Result;
use crate::source::DatasetLayout;
use crate::units::UnitConverter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AxisRegistry {
    axes: Vec<AxisModel>,
    data_native_unit: String,
    data_display_unit: String,
    data_unit_factor: f64,
}

impl AxisRegistry {
    /// Build a fresh registry from a probed file layout.
    pub fn from_layout(layout: DatasetLayout) -> Result<Self> {
        let mut axes = Vec::with_capacity(layout.axis_names.len());
        for ((name, unit), coordinates) in layout
            .axis_names
            .into_iter()
            .zip(layout.axis_units)
            .zip(layout.axis_coordinates)
        {
            axes.push(AxisModel::new(name, coordinates, unit)?);
        }
        Ok(Self {
            axes,
            data_display_unit: layout.data_unit.clone(),
            data_native_unit: layout.data_unit,
            data_unit_factor: 1.0,
        })
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn axis(&self, position: usize) -> Option<&AxisModel> {
        self.axes.get(position)
    }

    pub fn axis_mut(&mut self, position: usize) -> Option<&mut AxisModel> {
        self.axes.get_mut(position)
    }

    pub fn axes(&self) -> impl Iterator<Item = &AxisModel> {
        self.axes.iter()
    }

    pub fn axis_by_name(&self, name: &str) -> Option<&AxisModel> {
        self.axes.iter().find(|ax| ax.name() == name)
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|ax| ax.name() == name)
    }

    pub fn data_native_unit(&self) -> &str {
        &self.data_native_unit
    }

    pub fn data_display_unit(&self) -> &str {
        &self.data_display_unit
    }

    pub fn data_unit_factor(&self) -> f64 {
        self.data_unit_factor
    }

    /// Data unit label for the plot layer, e.g. `(mV)`.
    pub fn data_unit_label(&self) -> String {
        format!("({})", self.data_display_unit)
    }

    /// Switch the display unit of the data values themselves.
    ///
    /// # Errors
    /// Returns a unit error and keeps the previous unit and factor when the
    /// new unit does not parse or is not commensurable with the native unit.
    pub fn set_data_display_unit(
        &mut self,
        unit: impl Into<String>,
        converter: &mut UnitConverter,
    ) -> Result<()> {
        let unit = unit.into();
        let factor = converter.factor(&self.data_native_unit, &unit)?;
        self.data_display_unit = unit;
        self.data_unit_factor = factor;
        Ok(())
    }

    /// Selection-preserving reload: carry the previous registry's
    /// configuration over to this one wherever axis names match, and keep
    /// the previous data display unit when it is still commensurable with
    /// the new file's native data unit.
    pub fn migrate_from(&mut self, old: &AxisRegistry, converter: &mut UnitConverter) {
        let mut carried = 0usize;
        for axis in &mut self.axes {
            if let Some(prev) = old.axis_by_name(axis.name()) {
                axis.adopt_settings(prev);
                carried += 1;
            }
        }
        if old.data_display_unit != self.data_display_unit {
            if let Ok(factor) = converter.factor(&self.data_native_unit, &old.data_display_unit) {
                self.data_display_unit = old.data_display_unit.clone();
                self.data_unit_factor = factor;
            }
        }
        debug!(carried, total = self.axes.len(), "migrated axis settings");
    }
}
