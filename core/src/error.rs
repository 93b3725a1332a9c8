//! Error types for the dataview engine.
//!
//! Every engine operation validates its own preconditions and fails fast with
//! one of these kinds. Unit and slice errors are recoverable at the call
//! boundary; shape and I/O errors abort only the operation that raised them,
//! leaving previously loaded state untouched.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataViewError {
    /// The unit string could not be parsed by the unit system.
    #[error("Unrecognized unit '{unit}'")]
    InvalidUnit { unit: String },

    /// Both unit strings parse, but their physical dimensions differ.
    #[error("Units are not commensurable: '{from}' cannot be converted to '{to}'")]
    IncommensurableUnits { from: String, to: String },

    /// The resolved slice is empty, out of bounds, or otherwise unusable.
    #[error("Slice range error: {message}")]
    SliceRange { message: String },

    /// The file's dimension metadata is inconsistent with the data array.
    #[error("Dataset shape error: {message}")]
    DatasetShape { message: String },

    /// Underlying HDF5 I/O failure.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

impl DataViewError {
    /// Create a SliceRange error with a message
    pub fn slice_range(message: impl Into<String>) -> Self {
        Self::SliceRange {
            message: message.into(),
        }
    }

    /// Create a DatasetShape error with a message
    pub fn dataset_shape(message: impl Into<String>) -> Self {
        Self::DatasetShape {
            message: message.into(),
        }
    }

    /// Whether this error came from the unit system (either kind).
    pub fn is_unit_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUnit { .. } | Self::IncommensurableUnits { .. }
        )
    }

    /// Whether the caller is expected to downgrade this to a warning and
    /// keep its last-good state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidUnit { .. }
                | Self::IncommensurableUnits { .. }
                | Self::SliceRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DataViewError>;
