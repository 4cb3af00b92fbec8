//! 8-bit RGBA rasters
//!
//! Image decoding and encoding is delegated to the `image` crate; only
//! 8-bit RGBA images are accepted as migration input.

use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, RgbaImage};

/// Number of channels per pixel
pub const CHANNELS: usize = 4;

#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    #[error("expected an 8-bit RGBA image, found {0:?}")]
    Format(ColorType),
    #[error("{len} bytes do not make a {width}x{height} RGBA raster")]
    Length {
        width: usize,
        height: usize,
        len: usize,
    },
    #[error("empty raster ({0}x{1})")]
    Empty(usize, usize),
    #[error("Failed to read or write the image")]
    Image(#[from] image::ImageError),
}
type Result<T> = std::result::Result<T, RasterError>;

/// Row-major RGBA raster, row 0 at the top
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}
impl Raster {
    /// Wraps `width x height` RGBA pixels
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::Empty(width, height));
        }
        if data.len() != width * height * CHANNELS {
            return Err(RasterError::Length {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
    /// Accepts 8-bit RGBA images only
    pub fn from_image(image: DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageRgba8(image) => {
                let (width, height) = image.dimensions();
                Self::from_rgba(width as usize, height as usize, image.into_raw())
            }
            other => Err(RasterError::Format(other.color())),
        }
    }
    /// Decodes an image file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading {:?}...", path.as_ref());
        Self::from_image(image::open(path)?)
    }
    /// Encodes the raster, the format follows the file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_image().save(path.as_ref())?;
        log::info!("Saved {:?}", path.as_ref());
        Ok(())
    }
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |col, row| {
            image::Rgba(self.pixel(row as usize, col as usize))
        })
    }
    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }
    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
    pub fn pixel(&self, row: usize, col: usize) -> [u8; CHANNELS] {
        let k = (row * self.width + col) * CHANNELS;
        [
            self.data[k],
            self.data[k + 1],
            self.data[k + 2],
            self.data[k + 3],
        ]
    }
    /// Iterates down the pixels of column `col`
    pub fn column(&self, col: usize) -> impl Iterator<Item = [u8; CHANNELS]> + '_ {
        (0..self.height).map(move |row| self.pixel(row, col))
    }
}

/// Receiver of the migrated raster
pub trait RasterSink {
    fn accept(&mut self, raster: &Raster) -> Result<()>;
}
impl<F> RasterSink for F
where
    F: FnMut(&Raster) -> Result<()>,
{
    fn accept(&mut self, raster: &Raster) -> Result<()> {
        self(raster)
    }
}

/// Writes the raster to an image file
pub struct PngSink {
    path: PathBuf,
}
impl PngSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
    /// Targets `<stem>_depth.png` in the folder of `image`
    pub fn next_to<P: AsRef<Path>>(image: P) -> Self {
        let image = image.as_ref();
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: image.with_file_name(format!("{stem}_depth.png")),
        }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}
impl RasterSink for PngSink {
    fn accept(&mut self, raster: &Raster) -> Result<()> {
        raster.save(&self.path)
    }
}
