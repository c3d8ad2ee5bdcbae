// Export main modules
pub mod error;
pub mod grid;
mod mesh;
mod export;
pub mod source;

// Re-export everything for public use
pub use error::{HeightmeshError, Result};
pub use grid::{GridNormalizer, ScalarGrid, DEFAULT_MAX_ELEVATION};
pub use mesh::{FacetWinding, HeightfieldParams, MeshBuilder, Triangle, TriangleSet, VertexLattice, MIN_GRID_DIMENSION};
pub use export::{
    binary_stl_len, derive_output_path, export_mesh, read_binary_stl_header, save_stl, write_ascii_stl,
    write_binary_stl, StlFormat, StlHeader, STL_EXTENSION, STL_FACET_LEN, STL_HEADER_LEN,
};
pub use source::{Channel, GridSource, ImageSource};

/// Normalize a raw grid and triangulate it into a closed relief.
pub fn build_heightfield(grid: &ScalarGrid, params: &HeightfieldParams) -> Result<TriangleSet> {
    let normalized = GridNormalizer::new(params.max_elevation)?.normalize(grid)?;
    MeshBuilder::new(*params).build(&normalized)
}

/// Load a grid from `source`, build the relief and save it to `output`.
///
/// Returns the number of triangles written.
pub fn convert<S, P>(source: &S, params: &HeightfieldParams, output: P, format: StlFormat) -> Result<usize>
where
    S: GridSource + ?Sized,
    P: AsRef<std::path::Path>,
{
    let grid = source.load()?;
    let mesh = build_heightfield(&grid, params)?;
    save_stl(output, &mesh, format)?;
    Ok(mesh.len())
}

pub mod prelude {
    pub use crate::grid::{GridNormalizer, ScalarGrid};
    pub use crate::mesh::{FacetWinding, HeightfieldParams, MeshBuilder, Triangle, TriangleSet};
    pub use crate::export::{derive_output_path, export_mesh, save_stl, StlFormat};
    pub use crate::source::{Channel, GridSource, ImageSource};
    pub use crate::{build_heightfield, convert};
}
