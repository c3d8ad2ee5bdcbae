use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{HeightmeshError, Result};
use crate::grid::ScalarGrid;

/// Anything that can hand over a raw intensity grid.
pub trait GridSource {
    fn load(&self) -> Result<ScalarGrid>;
}

impl GridSource for ScalarGrid {
    fn load(&self) -> Result<ScalarGrid> {
        Ok(self.clone())
    }
}

/// Image channel used as intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    #[default]
    Red,
    Green,
    Blue,
    Alpha,
    /// Perceptual luminance of the RGB channels
    Luma,
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" | "r" => Ok(Channel::Red),
            "green" | "g" => Ok(Channel::Green),
            "blue" | "b" => Ok(Channel::Blue),
            "alpha" | "a" => Ok(Channel::Alpha),
            "luma" | "gray" | "grey" => Ok(Channel::Luma),
            _ => Err(format!("Unknown channel: {}, expected red, green, blue, alpha or luma", s)),
        }
    }
}

/// Decodes an image file and reads one channel as floats in `[0, 1]`.
///
/// Image rows become grid rows and image columns become grid columns.
#[derive(Debug, Clone)]
pub struct ImageSource {
    path: PathBuf,
    channel: Channel,
}

impl ImageSource {
    pub fn new<P: AsRef<Path>>(path: P, channel: Channel) -> Self {
        Self { path: path.as_ref().to_path_buf(), channel }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GridSource for ImageSource {
    fn load(&self) -> Result<ScalarGrid> {
        let image = image::open(&self.path).map_err(|e| HeightmeshError::ImageDecode {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        grid_from_image(&image, self.channel)
    }
}

/// Extract `channel` of a decoded image as a scalar grid.
pub fn grid_from_image(image: &image::DynamicImage, channel: Channel) -> Result<ScalarGrid> {
    let (cols, rows) = (image.width() as usize, image.height() as usize);

    let values: Vec<f32> = match channel {
        Channel::Luma => image.to_luma32f().into_raw(),
        _ => {
            let offset = match channel {
                Channel::Red => 0,
                Channel::Green => 1,
                Channel::Blue => 2,
                _ => 3,
            };
            image.to_rgba32f().pixels().map(|p| p.0[offset]).collect()
        }
    };

    ScalarGrid::new(rows, cols, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{DynamicImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([(x * 50) as u8, (y * 50) as u8, 255, 255]))
    }

    #[test]
    fn test_channel_parsing() {
        assert_eq!("R".parse::<Channel>().unwrap(), Channel::Red);
        assert_eq!("grey".parse::<Channel>().unwrap(), Channel::Luma);
        assert!("cyan".parse::<Channel>().is_err());
    }

    #[test]
    fn test_rows_follow_image_height() {
        let image = DynamicImage::ImageRgba8(gradient(5, 3));
        let grid = grid_from_image(&image, Channel::Red).unwrap();

        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 5);
        assert_relative_eq!(grid.get(2, 4), 200.0 / 255.0, epsilon = 1e-6);

        let green = grid_from_image(&image, Channel::Green).unwrap();
        assert_relative_eq!(green.get(2, 0), 100.0 / 255.0, epsilon = 1e-6);

        let blue = grid_from_image(&image, Channel::Blue).unwrap();
        assert!(blue.values().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_loads_png_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gradient.png");
        gradient(4, 6).save(&path).unwrap();

        let grid = ImageSource::new(&path, Channel::Red).load().unwrap();
        assert_eq!((grid.rows(), grid.cols()), (6, 4));
        assert_eq!(grid.get(0, 0), 0.0);
    }

    #[test]
    fn test_missing_image_reports_path() {
        let err = ImageSource::new("does/not/exist.png", Channel::Red).load().unwrap_err();
        match err {
            HeightmeshError::ImageDecode { path, .. } => {
                assert_eq!(path, PathBuf::from("does/not/exist.png"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
