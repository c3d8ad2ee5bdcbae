use std::time::Instant;
use heightmesh::prelude::*;

fn main() {
    println!("Running Heightmesh Benchmarks");
    println!("=============================");

    // Grid sizes roughly matching common image resolutions
    let resolutions = [
        (120, 160),   // thumbnail
        (480, 640),   // VGA
        (720, 1280),  // HD
    ];

    for &(rows, cols) in &resolutions {
        println!("\nGrid size: {}x{} ({} triangles)",
            rows,
            cols,
            MeshBuilder::triangle_count(rows, cols)
        );

        let grid = ScalarGrid::random(rows, cols, 42);

        // Benchmark normalization
        let start = Instant::now();
        let normalized = GridNormalizer::default().normalize(&grid).unwrap();
        let elapsed = start.elapsed();
        println!("  Normalization: {:.2?}", elapsed);

        // Benchmark triangulation
        let start = Instant::now();
        let mesh = MeshBuilder::default().build(&normalized).unwrap();
        let elapsed = start.elapsed();
        println!("  Mesh generation: {:.2?}", elapsed);

        // Benchmark binary export into memory
        let start = Instant::now();
        let mut buffer = Vec::new();
        export_mesh(&mesh, StlFormat::Binary, "benchmark", &mut buffer).unwrap();
        let elapsed = start.elapsed();
        println!("  STL export: {:.2?} ({}MB)", elapsed, buffer.len() / (1024 * 1024));
    }
}
