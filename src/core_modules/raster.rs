// THEORY:
// The `Raster` is the engine's read-only view of one image: a width, a
// height, and a flat RGBA byte buffer in row-major order, the same layout the
// frame buffers of the scanning layer expect. It is constructed once per
// comparison and never mutated; resizing produces a new `Raster`. The buffer
// length invariant (`width * height * 4`) is enforced at every constructor,
// so pixel access inside the bounds can index the buffer directly.

use crate::core_modules::pixel::pixel::Pixel;
use crate::error::DiffError;
use image::RgbaImage;

const BYTES_PER_PIXEL: usize = 4;

/// An immutable 2-D grid of RGBA pixels.
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Wraps a row-major RGBA byte buffer. Fails when the buffer length does
    /// not match the stated dimensions.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DiffError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(DiffError::BufferMismatch {
                width,
                height,
                len: data.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A raster filled with a single color, mainly useful for tests and
    /// synthetic inputs.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&[pixel.red, pixel.green, pixel.blue, pixel.alpha]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when the raster covers no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The pixel at (x, y). Coordinates must lie inside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        let index = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        Pixel::from(&self.data[index..index + BYTES_PER_PIXEL])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<RgbaImage> for Raster {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Raster;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::DiffError;

    #[test]
    fn rejects_short_buffer() {
        let result = Raster::from_rgba8(4, 4, vec![0u8; 10]);
        assert!(matches!(result, Err(DiffError::BufferMismatch { .. })));
    }

    #[test]
    fn pixel_access_is_row_major() {
        let mut data = vec![0u8; 2 * 2 * 4];
        // Second row, first column gets a red pixel.
        data[8] = 255;
        data[11] = 255;
        let raster = Raster::from_rgba8(2, 2, data).unwrap();
        assert_eq!(raster.pixel(0, 1), Pixel::new(255, 0, 0, 255));
        assert_eq!(raster.pixel(1, 0), Pixel::new(0, 0, 0, 0));
    }

    #[test]
    fn filled_raster_repeats_the_color() {
        let raster = Raster::filled(3, 2, Pixel::new(1, 2, 3, 4));
        assert_eq!(raster.as_bytes().len(), 3 * 2 * 4);
        assert_eq!(raster.pixel(2, 1), Pixel::new(1, 2, 3, 4));
    }

    #[test]
    fn zero_area_is_empty() {
        assert!(Raster::from_rgba8(0, 5, Vec::new()).unwrap().is_empty());
        assert!(Raster::from_rgba8(5, 0, Vec::new()).unwrap().is_empty());
        assert!(!Raster::filled(1, 1, Pixel::default()).is_empty());
    }
}
