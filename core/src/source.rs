//! HDF5-backed dataset access.
//!
//! The expected file layout matches the acquisition format: a `data` dataset
//! whose attributes carry `dimensions` (ordered axis names) and `unit`, plus
//! one 1D coordinate dataset per axis name, each with its own `unit`
//! attribute.
//!
//! The file is opened, read, and closed within the scope of every call; no
//! handle outlives a request. Reopening on each plot refresh is deliberate:
//! it keeps the single-threaded request/response model free of shared-handle
//! state at the cost of an open per refresh.

use std::path::{Path, PathBuf};

use hdf5::types::{VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, File};
use ndarray::{Array1, ArrayD, IxDyn, SliceInfo, SliceInfoElem, s};
use tracing::info;

use crate::error::{DataViewError, Result};
use crate::resolve::SliceSpec;

/// Axis and unit metadata probed from a file, used to build the registry.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    pub axis_names: Vec<String>,
    pub axis_units: Vec<String>,
    pub axis_coordinates: Vec<Array1<f64>>,
    pub data_unit: String,
    pub shape: Vec<usize>,
}

/// A path-addressed HDF5 data source.
#[derive(Debug, Clone)]
pub struct HdfSource {
    path: PathBuf,
}

impl HdfSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display purposes, e.g. in the plot title.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Read the dataset's structural metadata and coordinate arrays.
    ///
    /// # Errors
    /// Returns `DatasetShape` when the `data` entry or an axis dataset is
    /// missing or malformed, or when `data`'s shape does not equal the named
    /// axes' lengths in matching order. I/O failures surface as `Hdf5`.
    pub fn probe_layout(&self) -> Result<DatasetLayout> {
        let file = File::open(&self.path)?;
        let data = file
            .dataset("data")
            .map_err(|_| DataViewError::dataset_shape("file has no 'data' entry"))?;
        let shape = data.shape();

        let axis_names = read_string_list_attr(&data, "dimensions")?;
        let data_unit = read_string_attr(&data, "unit")?;
        if axis_names.len() != shape.len() {
            return Err(DataViewError::dataset_shape(format!(
                "'data' is {}-dimensional but lists {} dimension names",
                shape.len(),
                axis_names.len()
            )));
        }

        let mut axis_units = Vec::with_capacity(axis_names.len());
        let mut axis_coordinates = Vec::with_capacity(axis_names.len());
        for (name, &len) in axis_names.iter().zip(&shape) {
            let axis = file.dataset(name).map_err(|_| {
                DataViewError::dataset_shape(format!("missing coordinate dataset '{name}'"))
            })?;
            if axis.ndim() != 1 {
                return Err(DataViewError::dataset_shape(format!(
                    "coordinate dataset '{name}' is not one-dimensional"
                )));
            }
            let coordinates = axis.read_1d::<f64>()?;
            if coordinates.len() != len {
                return Err(DataViewError::dataset_shape(format!(
                    "axis '{name}' has {} coordinates but 'data' extends {len} along it",
                    coordinates.len()
                )));
            }
            axis_units.push(read_string_attr(&axis, "unit")?);
            axis_coordinates.push(coordinates);
        }

        info!(
            path = %self.path.display(),
            shape = ?shape,
            axes = ?axis_names,
            "probed dataset layout"
        );
        Ok(DatasetLayout {
            axis_names,
            axis_units,
            axis_coordinates,
            data_unit,
            shape,
        })
    }

    /// Read exactly the sub-block described by `spec` from the `data` entry.
    ///
    /// # Errors
    /// Returns `SliceRange` when the spec does not match the dataset's
    /// extent (wrong rank, empty span, or stop beyond the edge), before any
    /// data is read.
    pub fn read_block(&self, spec: &SliceSpec) -> Result<ArrayD<f64>> {
        let file = File::open(&self.path)?;
        let data = file.dataset("data")?;
        let shape = data.shape();
        if spec.ranges().len() != shape.len() {
            return Err(DataViewError::slice_range(format!(
                "slice has {} dimensions but 'data' has {}",
                spec.ranges().len(),
                shape.len()
            )));
        }
        for (dim, (&(start, stop), &extent)) in spec.ranges().iter().zip(&shape).enumerate() {
            if start >= stop || stop > extent {
                return Err(DataViewError::slice_range(format!(
                    "span ({start}, {stop}) is outside dimension {dim} of extent {extent}"
                )));
            }
        }

        let block = data.read_slice::<f64, _, IxDyn>(dyn_slice(spec.ranges()))?;
        Ok(block)
    }

    /// Read the coordinate segment of one axis over a half-open range.
    pub fn read_axis_segment(&self, name: &str, range: (usize, usize)) -> Result<Array1<f64>> {
        let (start, stop) = range;
        let file = File::open(&self.path)?;
        let axis = file.dataset(name)?;
        let len = axis.shape().first().copied().unwrap_or(0);
        if start >= stop || stop > len {
            return Err(DataViewError::slice_range(format!(
                "span ({start}, {stop}) is outside axis '{name}' of length {len}"
            )));
        }
        let segment = axis.read_slice_1d::<f64, _>(s![start..stop])?;
        Ok(segment)
    }
}

/// Build a runtime-rank hyperslab selection from half-open ranges.
fn dyn_slice(ranges: &[(usize, usize)]) -> SliceInfo<Vec<SliceInfoElem>, IxDyn, IxDyn> {
    let elems: Vec<SliceInfoElem> = ranges
        .iter()
        .map(|&(start, stop)| SliceInfoElem::Slice {
            start: start as isize,
            end: Some(stop as isize),
            step: 1,
        })
        .collect();
    // Infallible: every element is a slice, so input and output ranks agree.
    SliceInfo::try_from(elems).unwrap_or_else(|_| unreachable!())
}

fn read_string_attr(dataset: &Dataset, name: &str) -> Result<String> {
    let attr = dataset.attr(name).map_err(|_| {
        DataViewError::dataset_shape(format!(
            "dataset '{}' is missing the '{name}' attribute",
            dataset.name()
        ))
    })?;
    if let Ok(value) = attr.read_scalar::<VarLenUnicode>() {
        return Ok(value.to_string());
    }
    let value = attr.read_scalar::<VarLenAscii>()?;
    Ok(value.to_string())
}

fn read_string_list_attr(dataset: &Dataset, name: &str) -> Result<Vec<String>> {
    let attr = dataset.attr(name).map_err(|_| {
        DataViewError::dataset_shape(format!(
            "dataset '{}' is missing the '{name}' attribute",
            dataset.name()
        ))
    })?;
    if let Ok(values) = attr.read_raw::<VarLenUnicode>() {
        return Ok(values.into_iter().map(|v| v.to_string()).collect());
    }
    let values = attr.read_raw::<VarLenAscii>()?;
    Ok(values.into_iter().map(|v| v.to_string()).collect())
}
