use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{HeightmeshError, Result};

/// Default peak elevation of a normalized grid
pub const DEFAULT_MAX_ELEVATION: f32 = 100.0;

/// A rectangular, row-major grid of finite intensity values.
///
/// Once built the grid is never mutated; normalization returns a new grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl ScalarGrid {
    /// Build a grid from a flat row-major buffer.
    pub fn new(rows: usize, cols: usize, values: Vec<f32>) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(HeightmeshError::ShapeMismatch { rows, cols, len: values.len() });
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(HeightmeshError::InvalidGrid {
                row: index / cols,
                col: index % cols,
                value: values[index],
            });
        }

        Ok(Self { rows, cols, values })
    }

    /// Build a grid from nested rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let row_count = rows.len();
        let mut values = Vec::with_capacity(row_count * cols);

        for (row, data) in rows.into_iter().enumerate() {
            if data.len() != cols {
                return Err(HeightmeshError::RaggedGrid { row, expected: cols, found: data.len() });
            }
            values.extend(data);
        }

        Self::new(row_count, cols, values)
    }

    /// A grid where every cell holds `value`.
    pub fn filled(rows: usize, cols: usize, value: f32) -> Result<Self> {
        Self::new(rows, cols, vec![value; rows * cols])
    }

    /// A grid of uniform noise in `[0, 1)`, reproducible from `seed`.
    pub fn random(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let values = (0..rows * cols).map(|_| rng.gen::<f32>()).collect();
        Self { rows, cols, values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at `(row, col)`. Panics when out of bounds, like slice indexing.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(row < self.rows && col < self.cols, "grid index ({row}, {col}) out of bounds");
        self.values[row * self.cols + col]
    }

    /// Row-major view of all values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Smallest and largest value, or `None` for an empty grid.
    pub fn range(&self) -> Option<(f32, f32)> {
        if self.values.is_empty() {
            return None;
        }
        let min = self.values.par_iter().copied().reduce(|| f32::MAX, f32::min);
        let max = self.values.par_iter().copied().reduce(|| f32::MIN, f32::max);
        Some((min, max))
    }
}

/// Rescales raw intensities into `[0, max_elevation]`.
///
/// Intensities are treated as unsigned: negative cells are clamped to zero
/// and the largest positive cell maps to exactly `max_elevation`. For
/// non-negative input this equals dividing by the largest magnitude and then
/// rescaling so the peak lands on `max_elevation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridNormalizer {
    max_elevation: f32,
}

impl Default for GridNormalizer {
    fn default() -> Self {
        Self { max_elevation: DEFAULT_MAX_ELEVATION }
    }
}

impl GridNormalizer {
    pub fn new(max_elevation: f32) -> Result<Self> {
        if !max_elevation.is_finite() || max_elevation <= 0.0 {
            return Err(HeightmeshError::InvalidElevation(max_elevation));
        }
        Ok(Self { max_elevation })
    }

    pub fn max_elevation(&self) -> f32 {
        self.max_elevation
    }

    /// Produce a new grid of the same shape scaled into `[0, max_elevation]`.
    pub fn normalize(&self, grid: &ScalarGrid) -> Result<ScalarGrid> {
        let max_abs = grid.values.par_iter().map(|v| v.abs()).reduce(|| 0.0, f32::max);
        let max = grid.values.par_iter().copied().reduce(|| 0.0, f32::max);

        // An all-zero grid, or one without any positive peak, has nothing to scale to
        if max_abs == 0.0 || max <= 0.0 {
            return Err(HeightmeshError::DegenerateGrid { max, max_abs });
        }

        let scale = self.max_elevation / max;
        let values = grid
            .values
            .par_iter()
            .map(|&v| if v == max { self.max_elevation } else { v.max(0.0) * scale })
            .collect();

        Ok(ScalarGrid { rows: grid.rows, cols: grid.cols, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_non_finite_values() {
        let err = ScalarGrid::new(2, 2, vec![0.0, 1.0, f32::INFINITY, 0.5]).unwrap_err();
        match err {
            HeightmeshError::InvalidGrid { row, col, value } => {
                assert_eq!((row, col), (1, 0));
                assert!(value.is_infinite());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = ScalarGrid::from_rows(vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(
            err,
            HeightmeshError::RaggedGrid { row: 1, expected: 3, found: 2 }
        ));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let err = ScalarGrid::new(3, 3, vec![1.0; 8]).unwrap_err();
        assert!(matches!(err, HeightmeshError::ShapeMismatch { rows: 3, cols: 3, len: 8 }));
    }

    #[test]
    fn test_uniform_grid_normalizes_to_peak() {
        let grid = ScalarGrid::filled(4, 4, 50.0).unwrap();
        let normalized = GridNormalizer::default().normalize(&grid).unwrap();

        assert_eq!(normalized.rows(), 4);
        assert_eq!(normalized.cols(), 4);
        assert!(normalized.values().iter().all(|&z| z == 100.0));
    }

    #[test]
    fn test_scales_relative_to_peak() {
        let grid = ScalarGrid::from_rows(vec![
            vec![0.0, 0.25, 0.5],
            vec![0.1, 1.0, 0.2],
            vec![0.0, 0.75, 0.0],
        ])
        .unwrap();
        let normalized = GridNormalizer::new(10.0).unwrap().normalize(&grid).unwrap();

        assert_relative_eq!(normalized.get(0, 1), 2.5, epsilon = 1e-5);
        assert_relative_eq!(normalized.get(1, 0), 1.0, epsilon = 1e-5);
        assert_eq!(normalized.get(1, 1), 10.0);
        assert_relative_eq!(normalized.get(2, 1), 7.5, epsilon = 1e-5);
    }

    #[test]
    fn test_negative_values_clamp_to_zero() {
        let grid = ScalarGrid::from_rows(vec![
            vec![-4.0, 0.0, 1.0],
            vec![0.0, 2.0, -0.5],
            vec![1.0, 0.0, 0.0],
        ])
        .unwrap();
        let normalized = GridNormalizer::default().normalize(&grid).unwrap();

        assert_eq!(normalized.get(0, 0), 0.0);
        assert_eq!(normalized.get(1, 2), 0.0);
        assert_eq!(normalized.get(1, 1), 100.0);
        assert_relative_eq!(normalized.get(0, 2), 50.0, epsilon = 1e-4);
        let (min, max) = normalized.range().unwrap();
        assert!(min >= 0.0 && max <= 100.0);
    }

    #[test]
    fn test_all_zero_grid_is_degenerate() {
        let grid = ScalarGrid::filled(3, 3, 0.0).unwrap();
        let err = GridNormalizer::default().normalize(&grid).unwrap_err();
        assert!(matches!(err, HeightmeshError::DegenerateGrid { .. }));
    }

    #[test]
    fn test_all_negative_grid_is_degenerate() {
        let grid = ScalarGrid::filled(3, 3, -2.0).unwrap();
        let err = GridNormalizer::default().normalize(&grid).unwrap_err();
        assert!(matches!(err, HeightmeshError::DegenerateGrid { .. }));
    }

    #[test]
    fn test_invalid_max_elevation() {
        assert!(GridNormalizer::new(0.0).is_err());
        assert!(GridNormalizer::new(-1.0).is_err());
        assert!(GridNormalizer::new(f32::NAN).is_err());
        assert!(GridNormalizer::new(1.5).is_ok());
    }

    #[test]
    fn test_input_grid_is_left_untouched() {
        let grid = ScalarGrid::random(5, 7, 42);
        let before = grid.clone();
        let _ = GridNormalizer::default().normalize(&grid).unwrap();
        assert_eq!(grid, before);
    }

    #[test]
    fn test_random_grid_is_reproducible() {
        let a = ScalarGrid::random(8, 8, 7);
        let b = ScalarGrid::random(8, 8, 7);
        assert_eq!(a, b);
        assert!(a.values().iter().all(|&v| (0.0..1.0).contains(&v)));
    }
}
