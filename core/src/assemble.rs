//! Plot assembly: from a selection to plot-ready arrays.
//!
//! `assemble_plot` runs the full synchronous pipeline (resolve, extract,
//! reduce, scale, filter, coordinate extraction, range computation) and is
//! deliberately pure: identical inputs produce bit-identical bundles.
//!
//! `PlotSession` is the stateful object the GUI layer drives. It owns the
//! loaded source, the registry, and the last-good plot, and it is the single
//! place where recoverable engine errors are downgraded to user-visible
//! warnings.

use std::path::Path;

use itertools::Itertools;
use ndarray::{Array1, ArrayD};
use tracing::{info, warn};

use crate::error::{DataViewError, Result};
use crate::reduce::{apply_filter, mean_over, scale, squeeze};
use crate::registry::AxisRegistry;
use crate::resolve::SliceSpec;
use crate::selection::{DisplayRange, PlotKind, PlotSelection};
use crate::source::HdfSource;
use crate::units::UnitConverter;

/// Plot-ready arrays and labels, consumed by the (external) renderer.
///
/// For a 2D plot the block's first dimension always corresponds to whichever
/// active axis holds the lower registry position, i.e. the dataset's own
/// dimension order; the renderer orients the image from the coordinate
/// arrays, not from the block layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotBundle {
    /// Coordinates of the horizontal axis, in its display unit.
    pub x: Array1<f64>,
    /// Coordinates of the vertical axis (2D plots only).
    pub y: Option<Array1<f64>>,
    /// Reduced, unit-scaled, filtered data block.
    pub data: ArrayD<f64>,
    /// Displayed value range `(min, max)`.
    pub data_range: (f64, f64),
    /// Horizontal axis label, e.g. `x (cm)`.
    pub x_label: String,
    /// Vertical axis label (2D plots only).
    pub y_label: Option<String>,
    /// Data unit label, e.g. `(mV)`.
    pub data_unit_label: String,
    /// Render as filled contours instead of an image (2D plots only).
    pub use_contour: bool,
}

/// Run the full pipeline for one plot request.
///
/// # Errors
/// Propagates `SliceRange` from resolution or extraction, and `Hdf5` from
/// the underlying reads. No state is mutated on failure.
pub fn assemble_plot(
    source: &HdfSource,
    registry: &AxisRegistry,
    selection: &PlotSelection,
) -> Result<PlotBundle> {
    let spec = SliceSpec::resolve(registry, selection)?;

    let block = source.read_block(&spec)?;
    let block = mean_over(block, spec.averaged());
    let block = squeeze(block);
    let block = scale(block, registry.data_unit_factor());
    let block = apply_filter(block, selection.filter, selection.filter_sigma);

    // Active axis coordinates, each scaled into its own display unit.
    let mut coords = Vec::with_capacity(selection.active_axes.len());
    for &position in &selection.active_axes {
        // Positions were validated during resolution.
        let axis = registry.axis(position).ok_or_else(|| {
            DataViewError::slice_range(format!("axis position {position} vanished"))
        })?;
        let segment = source.read_axis_segment(axis.name(), spec.span(position))?;
        coords.push((segment.mapv_into(|v| v * axis.unit_factor()), axis.label()));
    }

    let data_range = display_range(&block, selection.display_range);
    let mut coords = coords.into_iter();
    let (x, x_label) = coords.next().ok_or_else(|| {
        DataViewError::slice_range("selection has no active axes")
    })?;
    let (y, y_label) = match coords.next() {
        Some((y, label)) => (Some(y), Some(label)),
        None => (None, None),
    };

    Ok(PlotBundle {
        x,
        y,
        data: block,
        data_range,
        x_label,
        y_label,
        data_unit_label: registry.data_unit_label(),
        use_contour: selection.kind == PlotKind::Image && selection.use_contour,
    })
}

fn display_range(block: &ArrayD<f64>, policy: DisplayRange) -> (f64, f64) {
    match policy {
        DisplayRange::Explicit { min, max } => (min, max),
        DisplayRange::CenterZero => {
            let magnitude = block.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
            (-magnitude, magnitude)
        }
        DisplayRange::Auto => {
            let min = block.iter().copied().fold(f64::INFINITY, f64::min);
            let max = block.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (min, max)
        }
    }
}

/// Number formatting used for titles and labels: integers plain, values far
/// from unity in scientific notation, everything else with two decimals.
pub fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else if n > 100.0 || n < 0.01 {
        format!("{n:.2E}")
    } else {
        format!("{n:.2}")
    }
}

/// The stateful engine boundary the GUI layer talks to.
///
/// Holds the loaded file, the axis registry, the unit converter, and the
/// last successfully assembled plot. Recoverable errors (bad unit, unusable
/// slice) are downgraded here into a warning string while the previous plot
/// stays available; only a failed file load aborts, and even then the
/// previously loaded dataset is retained unchanged.
#[derive(Debug, Default)]
pub struct PlotSession {
    source: Option<HdfSource>,
    registry: AxisRegistry,
    converter: UnitConverter,
    last_plot: Option<PlotBundle>,
    warning: Option<String>,
}

impl PlotSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or reload) a file, building a fresh registry. Axis settings
    /// carry over from the previous registry wherever names match.
    ///
    /// # Errors
    /// Returns the probe failure; the previously loaded source and registry
    /// are left untouched.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let candidate = HdfSource::new(path);
        let layout = candidate.probe_layout()?;
        let mut registry = AxisRegistry::from_layout(layout)?;
        registry.migrate_from(&self.registry, &mut self.converter);
        info!(path = %candidate.path().display(), axes = registry.len(), "loaded file");
        self.source = Some(candidate);
        self.registry = registry;
        Ok(())
    }

    pub fn has_file(&self) -> bool {
        self.source.is_some()
    }

    pub fn source(&self) -> Option<&HdfSource> {
        self.source.as_ref()
    }

    pub fn registry(&self) -> &AxisRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AxisRegistry {
        &mut self.registry
    }

    /// The most recent warning, cleared by the next successful operation.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// The most recently assembled plot, if any.
    pub fn last_plot(&self) -> Option<&PlotBundle> {
        self.last_plot.as_ref()
    }

    /// Change one axis's display unit; a unit failure becomes a warning and
    /// the axis keeps its previous unit.
    pub fn set_axis_display_unit(&mut self, position: usize, unit: &str) -> bool {
        self.warning = None;
        let Some(axis) = self.registry.axis_mut(position) else {
            self.warning = Some(format!("no axis at position {position}"));
            return false;
        };
        match axis.set_display_unit(unit, &mut self.converter) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, position, unit, "rejected axis display unit");
                self.warning = Some(err.to_string());
                false
            }
        }
    }

    /// Change the data display unit; a unit failure becomes a warning and
    /// the previous unit is kept.
    pub fn set_data_display_unit(&mut self, unit: &str) -> bool {
        self.warning = None;
        match self
            .registry
            .set_data_display_unit(unit, &mut self.converter)
        {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, unit, "rejected data display unit");
                self.warning = Some(err.to_string());
                false
            }
        }
    }

    /// Recompute the plot for `selection`.
    ///
    /// On success the new bundle replaces the last one. On a recoverable
    /// failure the error is downgraded to a warning and the previous bundle
    /// remains in place (callers may still blank their canvas if they
    /// prefer). Returns the bundle to display, if any.
    pub fn refresh(&mut self, selection: &PlotSelection) -> Option<&PlotBundle> {
        self.warning = None;
        let Some(source) = &self.source else {
            self.warning = Some("no file loaded".to_string());
            return self.last_plot.as_ref();
        };
        match assemble_plot(source, &self.registry, selection) {
            Ok(bundle) => {
                self.last_plot = Some(bundle);
            }
            Err(err) => {
                warn!(%err, recoverable = err.is_recoverable(), "plot refresh failed");
                self.warning = Some(err.to_string());
            }
        }
        self.last_plot.as_ref()
    }

    /// Multi-line plot title in the acquisition tool's format: file name,
    /// then the active ranges, then the held or averaged axes.
    pub fn plot_title(&self, selection: &PlotSelection) -> String {
        let file_name = self
            .source
            .as_ref()
            .map(|s| s.file_name())
            .unwrap_or_default();

        let mut active = Vec::new();
        let mut others = Vec::new();
        for (position, axis) in self.registry.axes().enumerate() {
            let (lo, hi) = axis.display_value_range();
            if selection.active_axes.contains(&position) {
                active.push(format!(
                    "{}=[{},{}] {}",
                    axis.name(),
                    format_number(lo),
                    format_number(hi),
                    axis.display_unit()
                ));
            } else if axis.is_averaged() {
                others.push(format!("{}= avg", axis.name()));
            } else {
                others.push(format!(
                    "{}={} {}",
                    axis.name(),
                    format_number(lo),
                    axis.display_unit()
                ));
            }
        }

        [file_name, active.iter().join(", "), others.iter().join(", ")]
            .iter()
            .filter(|line| !line.is_empty())
            .join("\n")
    }
}
