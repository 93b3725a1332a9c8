//! The plot request handed over by the GUI layer.
//!
//! A `PlotSelection` is transient: the embedding application rebuilds (or
//! mutates) one from its widget state every time a plot is requested, and the
//! engine never stores it. Axis-level state (ranges, units, averaging) lives
//! in the registry; this type only carries the per-request choices.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Line plot over one axis, or image/contour plot over two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[strum(serialize_all = "lowercase")]
pub enum PlotKind {
    #[default]
    Line,
    Image,
}

impl PlotKind {
    /// Number of active (plotted) axes for this kind.
    pub fn dimensionality(&self) -> usize {
        match self {
            PlotKind::Line => 1,
            PlotKind::Image => 2,
        }
    }
}

/// How the displayed value range is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum DisplayRange {
    /// Min/max of the reduced block.
    #[default]
    Auto,
    /// Symmetric about zero: `(-max|v|, max|v|)`.
    CenterZero,
    /// Used verbatim.
    Explicit { min: f64, max: f64 },
}

/// Optional smoothing applied to the reduced, unit-scaled block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase")]
pub enum FilterMode {
    #[default]
    None,
    Lowpass,
    Highpass,
}

/// Everything the GUI decides per plot request.
///
/// # Example
///
/// ```rust
/// use dataview_core::PlotSelection;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let selection = PlotSelection::new()
///     .image(0, 2)
///     .use_contour(true)
///     .build()?;
/// assert_eq!(selection.active_axes, vec![0, 2]);
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(setter(into), default)]
pub struct PlotSelection {
    /// 1D line or 2D image/contour.
    pub kind: PlotKind,

    /// Registry positions of the active axes, horizontal first. One entry
    /// for a line plot, two distinct entries for an image plot.
    #[builder(default = "vec![0]")]
    pub active_axes: Vec<usize>,

    /// Render a 2D plot as filled contours instead of an image (carried for
    /// the renderer, ignored for line plots).
    pub use_contour: bool,

    /// Displayed value range policy.
    pub display_range: DisplayRange,

    /// Smoothing filter applied after reduction and unit scaling.
    pub filter: FilterMode,

    /// Kernel standard deviation in index units; only meaningful when
    /// `filter` is not `None`.
    #[builder(default = "1.0")]
    pub filter_sigma: f64,
}

impl Default for PlotSelection {
    fn default() -> Self {
        Self {
            kind: PlotKind::Line,
            active_axes: vec![0],
            use_contour: false,
            display_range: DisplayRange::Auto,
            filter: FilterMode::None,
            filter_sigma: 1.0,
        }
    }
}

impl PlotSelection {
    /// Create a new builder for PlotSelection
    pub fn new() -> PlotSelectionBuilder {
        PlotSelectionBuilder::default()
    }

    /// A 1D line plot over a single axis, default options otherwise.
    pub fn line(axis: usize) -> Self {
        Self {
            kind: PlotKind::Line,
            active_axes: vec![axis],
            ..Self::default()
        }
    }

    /// A 2D image plot over `(horizontal, vertical)` axes.
    pub fn image(horizontal: usize, vertical: usize) -> Self {
        Self {
            kind: PlotKind::Image,
            active_axes: vec![horizontal, vertical],
            ..Self::default()
        }
    }

    pub fn horizontal_axis(&self) -> usize {
        self.active_axes[0]
    }

    pub fn vertical_axis(&self) -> Option<usize> {
        self.active_axes.get(1).copied()
    }
}

impl PlotSelectionBuilder {
    /// Shorthand for a line plot over `axis`.
    pub fn line(&mut self, axis: usize) -> &mut Self {
        self.kind(PlotKind::Line).active_axes(vec![axis])
    }

    /// Shorthand for an image plot over `(horizontal, vertical)`.
    pub fn image(&mut self, horizontal: usize, vertical: usize) -> &mut Self {
        self.kind(PlotKind::Image)
            .active_axes(vec![horizontal, vertical])
    }
}
