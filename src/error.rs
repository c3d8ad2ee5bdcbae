use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while turning a scalar grid into an STL file.
///
/// Every variant is terminal for the current run. Nothing is retried and no
/// fallback grid is ever substituted.
#[derive(Error, Debug)]
pub enum HeightmeshError {
    /// The grid has no magnitude to normalize against.
    #[error("grid is degenerate: largest positive value is {max}, largest magnitude is {max_abs}")]
    DegenerateGrid { max: f32, max_abs: f32 },

    /// The grid is too small for an interior to exist.
    #[error("grid of {rows}x{cols} has no interior, need at least 3x3")]
    InsufficientGridSize { rows: usize, cols: usize },

    /// A cell holds NaN or an infinity.
    #[error("grid value {value} at row {row}, column {col} is not finite")]
    InvalidGrid { row: usize, col: usize, value: f32 },

    /// Row lengths differ when building a grid from nested rows.
    #[error("grid row {row} has {found} columns, expected {expected}")]
    RaggedGrid { row: usize, expected: usize, found: usize },

    /// The flat value buffer does not match the requested shape.
    #[error("{len} values cannot fill a {rows}x{cols} grid")]
    ShapeMismatch { rows: usize, cols: usize, len: usize },

    #[error("maximum elevation must be finite and positive, got {0}")]
    InvalidElevation(f32),

    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),

    /// The destination could not be created, written or moved into place.
    #[error("failed to write {}: {source}", .path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode image {}: {message}", .path.display())]
    ImageDecode { path: PathBuf, message: String },
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, HeightmeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_failure() {
        let err = HeightmeshError::InsufficientGridSize { rows: 2, cols: 5 };
        assert!(err.to_string().contains("2x5"));

        let err = HeightmeshError::InvalidGrid { row: 1, col: 4, value: f32::NAN };
        let msg = err.to_string();
        assert!(msg.contains("row 1"));
        assert!(msg.contains("column 4"));
        assert!(msg.contains("NaN"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = HeightmeshError::IoWrite {
            path: PathBuf::from("out/relief.stl"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("relief.stl"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HeightmeshError>();
    }
}
