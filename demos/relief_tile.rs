use std::path::PathBuf;

use heightmesh::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Generating synthetic relief tile...");

    // A 64x64 grid of noise stands in for a decoded image
    let grid = ScalarGrid::random(64, 64, 123);

    let params = HeightfieldParams {
        max_elevation: 12.0,
        cell_size: 0.5,
        winding: FacetWinding::Outward,
    };

    let output_dir = PathBuf::from("./relief_output");
    std::fs::create_dir_all(&output_dir)?;

    // The grid doubles as its own source
    let binary_path = output_dir.join("tile.stl");
    let count = convert(&grid, &params, &binary_path, StlFormat::Binary)?;
    println!("Wrote {} triangles to {}", count, binary_path.display());

    let ascii_path = output_dir.join("tile_ascii.stl");
    convert(&grid, &params, &ascii_path, StlFormat::Ascii)?;
    println!("Wrote ASCII copy to {}", ascii_path.display());

    Ok(())
}
