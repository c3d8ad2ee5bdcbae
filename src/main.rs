use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use heightmesh::prelude::*;
use heightmesh::DEFAULT_MAX_ELEVATION;

/// Command-line tool to turn a grayscale image into a height-field STL model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input image whose intensities become elevations
    input: PathBuf,

    /// Output file path (default: input with the suffix replaced by .stl)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Literal suffix removed from the input name when deriving the output path
    #[arg(long, default_value = ".png")]
    suffix: String,

    /// Peak elevation of the relief
    #[arg(short, long, default_value_t = DEFAULT_MAX_ELEVATION)]
    max_elevation: f32,

    /// Spacing between neighbouring vertices
    #[arg(long, default_value_t = 1.0)]
    cell_size: f32,

    /// Image channel read as intensity (red, green, blue, alpha, luma)
    #[arg(short, long, default_value = "red")]
    channel: Channel,

    /// STL flavour to write (binary or ascii)
    #[arg(short, long, default_value = "binary")]
    format: StlFormat,

    /// Orient every relief facet up and the base cap down
    #[arg(long)]
    outward: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| derive_output_path(&args.input, &args.suffix));

    let params = HeightfieldParams {
        max_elevation: args.max_elevation,
        cell_size: args.cell_size,
        winding: if args.outward { FacetWinding::Outward } else { FacetWinding::Listed },
    };

    println!("Reading {} ({:?} channel)...", args.input.display(), args.channel);
    let grid = ImageSource::new(&args.input, args.channel)
        .load()
        .with_context(|| format!("Failed to load intensity grid from {}", args.input.display()))?;

    println!("Grid dimensions: {}x{}", grid.rows(), grid.cols());
    if let Some((min, max)) = grid.range() {
        println!("Intensity range: min = {:.4}, max = {:.4}", min, max);
    }

    println!("Creating mesh...");
    let mesh = build_heightfield(&grid, &params).context("Failed to build height-field mesh")?;

    if let Some((min, max)) = mesh.bounds() {
        println!(
            "Mesh: {} triangles, footprint {:.2}x{:.2}, elevation {:.2}..{:.2}",
            mesh.len(),
            max.x - min.x,
            max.y - min.y,
            min.z,
            max.z
        );
    }

    println!("Exporting to {}...", output.display());
    save_stl(&output, &mesh, args.format)
        .with_context(|| format!("Failed to export {}", output.display()))?;

    println!("Done!");
    Ok(())
}
