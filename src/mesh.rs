use glam::Vec3;
use rayon::prelude::*;

use crate::error::{HeightmeshError, Result};
use crate::grid::{ScalarGrid, DEFAULT_MAX_ELEVATION};

/// Smallest grid dimension that still leaves an interior cell
pub const MIN_GRID_DIMENSION: usize = 3;

/// Vertex order used for each emitted facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacetWinding {
    /// Emit cell and base triangles in their listed order:
    /// `[(r,c), (r+1,c), (r+1,c+1)]` and `[(r,c), (r,c+1), (r+1,c+1)]`.
    /// The second triangle of each pair faces down.
    #[default]
    Listed,
    /// Same vertices and diagonal, reordered so the relief faces +z and the
    /// base cap faces -z.
    Outward,
}

/// Parameters controlling height-field mesh generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightfieldParams {
    pub max_elevation: f32, // Peak z after normalization
    pub cell_size: f32,     // Spacing between lattice vertices in x and y
    pub winding: FacetWinding,
}

impl Default for HeightfieldParams {
    fn default() -> Self {
        Self {
            max_elevation: DEFAULT_MAX_ELEVATION,
            cell_size: 1.0,
            winding: FacetWinding::Listed,
        }
    }
}

/// A facet stored as its own three corner positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { vertices: [a, b, c] }
    }

    /// Unit normal from the winding order, or zero for a collinear facet.
    pub fn normal(&self) -> Vec3 {
        let [v0, v1, v2] = self.vertices;
        (v1 - v0).cross(v2 - v0).normalize_or_zero()
    }
}

/// An M×N array of vertices, one per grid cell, with a zero-height border.
#[derive(Debug, Clone)]
pub struct VertexLattice {
    rows: usize,
    cols: usize,
    vertices: Vec<Vec3>,
}

impl VertexLattice {
    /// Lay out a vertex per cell. Border rows and columns form the skirt at
    /// z = 0, interior vertices take their height from `grid`.
    pub fn from_grid(grid: &ScalarGrid, cell_size: f32) -> Self {
        let (rows, cols) = (grid.rows(), grid.cols());

        let vertices: Vec<Vec3> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                (0..cols)
                    .map(move |col| {
                        let on_border = row == 0 || col == 0 || row == rows - 1 || col == cols - 1;
                        let z = if on_border { 0.0 } else { grid.get(row, col) };
                        Vec3::new(row as f32 * cell_size, col as f32 * cell_size, z)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Self { rows, cols, vertices }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Vec3 {
        self.vertices[row * self.cols + col]
    }

    pub fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row == self.rows - 1 || col == self.cols - 1
    }
}

/// Ordered triangle soup: cells in row-major order, base cap last.
#[derive(Debug, Clone, Default)]
pub struct TriangleSet {
    pub triangles: Vec<Triangle>,
}

impl TriangleSet {
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Triangle> {
        self.triangles.iter()
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.triangles.iter().flat_map(|t| t.vertices);
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

impl<'a> IntoIterator for &'a TriangleSet {
    type Item = &'a Triangle;
    type IntoIter = std::slice::Iter<'a, Triangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.triangles.iter()
    }
}

/// Turns a normalized grid into a closed relief: skirted lattice, two
/// triangles per cell on a fixed diagonal, and a two-triangle base cap.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshBuilder {
    params: HeightfieldParams,
}

impl MeshBuilder {
    pub fn new(params: HeightfieldParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HeightfieldParams {
        &self.params
    }

    /// Number of triangles produced for a `rows`×`cols` grid.
    ///
    /// Only meaningful for grids [`build`](Self::build) accepts; an empty
    /// dimension counts as zero cells.
    pub fn triangle_count(rows: usize, cols: usize) -> usize {
        2 * rows.saturating_sub(1) * cols.saturating_sub(1) + 2
    }

    /// Build the triangle set for an already normalized grid.
    pub fn build(&self, grid: &ScalarGrid) -> Result<TriangleSet> {
        let cell_size = self.params.cell_size;
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(HeightmeshError::InvalidCellSize(cell_size));
        }

        let (rows, cols) = (grid.rows(), grid.cols());
        if rows < MIN_GRID_DIMENSION || cols < MIN_GRID_DIMENSION {
            return Err(HeightmeshError::InsufficientGridSize { rows, cols });
        }

        let lattice = VertexLattice::from_grid(grid, cell_size);
        let winding = self.params.winding;

        let mut triangles: Vec<Triangle> = (0..rows - 1)
            .into_par_iter()
            .flat_map(|r| {
                let lattice = &lattice;
                (0..cols - 1)
                    .flat_map(move |c| {
                        let a = lattice.get(r, c);
                        let b = lattice.get(r + 1, c);
                        let d = lattice.get(r, c + 1);
                        let e = lattice.get(r + 1, c + 1);
                        cell_pair(a, b, d, e, winding)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        // Base cap over the four true corners
        let a = lattice.get(0, 0);
        let b = lattice.get(rows - 1, 0);
        let d = lattice.get(0, cols - 1);
        let e = lattice.get(rows - 1, cols - 1);
        triangles.extend(base_pair(a, b, d, e, winding));

        debug_assert_eq!(triangles.len(), Self::triangle_count(rows, cols));
        Ok(TriangleSet { triangles })
    }
}

/// Split the quad `a=(r,c) b=(r+1,c) d=(r,c+1) e=(r+1,c+1)` along `a`-`e`.
fn cell_pair(a: Vec3, b: Vec3, d: Vec3, e: Vec3, winding: FacetWinding) -> [Triangle; 2] {
    match winding {
        FacetWinding::Listed => [Triangle::new(a, b, e), Triangle::new(a, d, e)],
        FacetWinding::Outward => [Triangle::new(a, b, e), Triangle::new(a, e, d)],
    }
}

fn base_pair(a: Vec3, b: Vec3, d: Vec3, e: Vec3, winding: FacetWinding) -> [Triangle; 2] {
    match winding {
        FacetWinding::Listed => [Triangle::new(a, b, e), Triangle::new(a, d, e)],
        FacetWinding::Outward => [Triangle::new(a, e, b), Triangle::new(a, d, e)],
    }
}
