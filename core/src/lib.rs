//! Axis/slice resolution and data reduction engine for N-dimensional HDF5
//! datasets.
//!
//! This crate is the core of a desktop dataset viewer: it models the labeled
//! axes of a loaded file, resolves the user's selection (active axes,
//! averaged axes, pinned indices, display units) into a concrete slice, reads
//! and reduces the matching sub-block, and hands back plot-ready arrays. The
//! GUI shell around it only forwards selections in and draws bundles out.
//!
//! # Quick Start
//!
//! ```no_run
//! use dataview_core::{PlotSelection, PlotSession};
//!
//! let mut session = PlotSession::new();
//! session.load_file("run_042.hdf5")?;
//!
//! // hold axis 2 at one index, average nothing, image plot over axes 0 and 1
//! session.registry_mut().axis_mut(2).unwrap().set_index(4);
//! let selection = PlotSelection::image(0, 1);
//!
//! if let Some(bundle) = session.refresh(&selection) {
//!     println!(
//!         "{} x {} block, range {:?}",
//!         bundle.x.len(),
//!         bundle.y.as_ref().map(|y| y.len()).unwrap_or(1),
//!         bundle.data_range
//!     );
//! }
//! # Ok::<(), dataview_core::DataViewError>(())
//! ```

pub use assemble::{PlotBundle, PlotSession, assemble_plot, format_number};
pub use axis::{AxisModel, AxisSelectionMode};
pub use error::{DataViewError, Result};
pub use registry::AxisRegistry;
pub use resolve::SliceSpec;
pub use selection::{DisplayRange, FilterMode, PlotKind, PlotSelection, PlotSelectionBuilder};
pub use source::{DatasetLayout, HdfSource};
pub use units::{Dimension, ParsedUnit, UnitConverter};

pub mod assemble;
pub mod axis;
pub mod error;
pub mod reduce;
pub mod registry;
pub mod resolve;
pub mod selection;
pub mod source;
pub mod units;
