use std::ffi::OsStr;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::{Builder, NamedTempFile};

use crate::error::{HeightmeshError, Result};
use crate::mesh::TriangleSet;

/// Size of the free-form binary STL header
pub const STL_HEADER_LEN: usize = 80;
/// Bytes per binary facet record: normal, three vertices, attribute count
pub const STL_FACET_LEN: usize = 50;

/// Extension given to every derived output path
pub const STL_EXTENSION: &str = ".stl";

/// STL flavours supported for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

impl FromStr for StlFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binary" | "bin" => Ok(StlFormat::Binary),
            "ascii" | "text" => Ok(StlFormat::Ascii),
            _ => Err(format!("Unknown STL format: {}, expected binary or ascii", s)),
        }
    }
}

/// Write `mesh` to `writer` in the requested format.
pub fn export_mesh<W: Write>(mesh: &TriangleSet, format: StlFormat, name: &str, writer: &mut W) -> io::Result<()> {
    match format {
        StlFormat::Binary => write_binary_stl(writer, mesh, name),
        StlFormat::Ascii => write_ascii_stl(writer, mesh, name),
    }
}

/// Write a little-endian binary STL.
///
/// `label` fills the 80-byte header, truncated and zero padded. A label
/// starting with `solid` is prefixed so readers do not mistake the file for
/// ASCII.
pub fn write_binary_stl<W: Write>(writer: &mut W, mesh: &TriangleSet, label: &str) -> io::Result<()> {
    let count = u32::try_from(mesh.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("{} triangles exceed the STL count field", mesh.len()))
    })?;

    writer.write_all(&binary_header(label))?;
    writer.write_all(&count.to_le_bytes())?;

    let mut record = [0u8; STL_FACET_LEN];
    for triangle in mesh {
        let normal = triangle.normal();
        let floats = std::iter::once(normal).chain(triangle.vertices).flat_map(|v| v.to_array());
        for (slot, value) in record.chunks_exact_mut(4).zip(floats) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        // Attribute byte count stays zero
        record[48..].copy_from_slice(&0u16.to_le_bytes());
        writer.write_all(&record)?;
    }

    writer.flush()
}

fn binary_header(label: &str) -> [u8; STL_HEADER_LEN] {
    let mut header = [0u8; STL_HEADER_LEN];
    let text = if label.trim_start().starts_with("solid") {
        format!("heightmesh {}", label)
    } else {
        label.to_string()
    };
    let bytes = text.as_bytes();
    let len = bytes.len().min(STL_HEADER_LEN);
    header[..len].copy_from_slice(&bytes[..len]);
    header
}

/// Write an ASCII STL with one `facet` block per triangle.
pub fn write_ascii_stl<W: Write>(writer: &mut W, mesh: &TriangleSet, name: &str) -> io::Result<()> {
    let name: String = name.split_whitespace().collect::<Vec<_>>().join("_");

    writeln!(writer, "solid {}", name)?;
    for triangle in mesh {
        let n = triangle.normal();
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in triangle.vertices {
            writeln!(writer, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {}", name)?;

    writer.flush()
}

/// Header label and triangle count of a binary STL stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StlHeader {
    pub label: String,
    pub triangle_count: u32,
}

/// Read the 84-byte preamble of a binary STL.
pub fn read_binary_stl_header<R: Read>(reader: &mut R) -> io::Result<StlHeader> {
    let mut header = [0u8; STL_HEADER_LEN];
    reader.read_exact(&mut header)?;

    let mut count = [0u8; 4];
    reader.read_exact(&mut count)?;

    let end = header.iter().position(|&b| b == 0).unwrap_or(STL_HEADER_LEN);
    Ok(StlHeader {
        label: String::from_utf8_lossy(&header[..end]).into_owned(),
        triangle_count: u32::from_le_bytes(count),
    })
}

/// Save `mesh` to `path`.
///
/// Data goes to a temporary file beside the destination, which is renamed
/// into place only after every byte was written. A failed run leaves any
/// existing file at `path` untouched. The saved file gets the permissions of
/// the file it replaces, or those of a freshly created file otherwise.
pub fn save_stl<P: AsRef<Path>>(path: P, mesh: &TriangleSet, format: StlFormat) -> Result<()> {
    let path = path.as_ref();
    let io_err = |source: io::Error| HeightmeshError::IoWrite { path: path.to_path_buf(), source };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();

    let temp = create_temp_in(dir).map_err(io_err)?;
    if let Ok(existing) = fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions()).map_err(io_err)?;
    }
    {
        let mut writer = BufWriter::new(temp.as_file());
        export_mesh(mesh, format, &name, &mut writer).map_err(io_err)?;
    }
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}

// Temporary files default to 0600; ask for 0666 so the umask decides, as with File::create
#[cfg(unix)]
fn create_temp_in(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    Builder::new()
        .prefix(".heightmesh")
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn create_temp_in(dir: &Path) -> io::Result<NamedTempFile> {
    Builder::new().prefix(".heightmesh").tempfile_in(dir)
}

/// Derive the output path for `input` by removing the literal trailing
/// `suffix` and appending `.stl`.
///
/// When `input` does not end with `suffix` nothing is removed, so
/// `relief.tiff` with suffix `.png` becomes `relief.tiff.stl`. Path bytes
/// that are not UTF-8 are carried over unchanged.
pub fn derive_output_path<P: AsRef<Path>>(input: P, suffix: &str) -> PathBuf {
    let input = input.as_ref().as_os_str();
    let bytes = input.as_encoded_bytes();

    let mut output = if !suffix.is_empty() && bytes.ends_with(suffix.as_bytes()) {
        let base = &bytes[..bytes.len() - suffix.len()];
        // SAFETY: `base` comes from `as_encoded_bytes` and is cut immediately
        // before the non-empty UTF-8 string `suffix`, a permitted split point.
        unsafe { OsStr::from_encoded_bytes_unchecked(base) }.to_os_string()
    } else {
        input.to_os_string()
    };
    output.push(STL_EXTENSION);
    PathBuf::from(output)
}

/// Number of bytes a binary STL with `triangles` facets occupies
pub fn binary_stl_len(triangles: usize) -> u64 {
    (STL_HEADER_LEN + 4) as u64 + (STL_FACET_LEN * triangles) as u64
}
