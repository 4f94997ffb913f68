pub mod image_helper {
    use crate::core_modules::raster::Raster;
    use crate::core_modules::rect::Rect;
    use crate::error::DiffError;
    use image::imageops::FilterType;
    use image::{Rgba, RgbaImage};
    use std::path::Path;

    /// Highlight color used by the demo runner: opaque yellow.
    pub const HIGHLIGHT_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);

    /// Stroke width of the highlight outlines, in pixels.
    pub const HIGHLIGHT_STROKE: u32 = 4;

    /// Loads any image format supported by the `image` crate into a raster.
    pub fn load(path: &Path) -> Result<Raster, DiffError> {
        let img = image::open(path)?.to_rgba8();
        Ok(Raster::from(img))
    }

    /// Writes a raster to disk; the format follows the file extension.
    pub fn save(raster: &Raster, path: &Path) -> Result<(), DiffError> {
        to_image(raster)?.save(path)?;
        Ok(())
    }

    pub fn to_image(raster: &Raster) -> Result<RgbaImage, DiffError> {
        let expected = raster.width() as usize * raster.height() as usize * 4;
        RgbaImage::from_raw(raster.width(), raster.height(), raster.as_bytes().to_vec()).ok_or(
            DiffError::BufferMismatch {
                width: raster.width(),
                height: raster.height(),
                len: raster.as_bytes().len(),
                expected,
            },
        )
    }

    /// Resamples a raster to the target size with a bicubic filter.
    /// Lossy in both directions; never a crop.
    pub fn resize(raster: &Raster, width: u32, height: u32) -> Result<Raster, DiffError> {
        let scaled = image::imageops::resize(&to_image(raster)?, width, height, FilterType::CatmullRom);
        Ok(Raster::from(scaled))
    }

    /// Draws rectangle outlines over a copy of `base`, one per region,
    /// clipped to the image bounds. Rendering style is a caller concern; this
    /// is the style the demo runner uses.
    pub fn draw_highlights(
        base: &Raster,
        regions: &[Rect],
        stroke: u32,
        color: Rgba<u8>,
    ) -> Result<RgbaImage, DiffError> {
        let mut canvas = to_image(base)?;
        for region in regions {
            draw_outline(&mut canvas, region, stroke, color);
        }
        Ok(canvas)
    }

    fn draw_outline(canvas: &mut RgbaImage, region: &Rect, stroke: u32, color: Rgba<u8>) {
        let (width, height) = canvas.dimensions();
        let left = region.left.min(width);
        let top = region.top.min(height);
        let right = region.right().min(width);
        let bottom = region.bottom().min(height);
        if left >= right || top >= bottom {
            return;
        }

        // Four edge bands; the corners overlap, which is harmless.
        let band = stroke.max(1);
        fill(canvas, left, top, right, (top + band).min(bottom), color);
        fill(canvas, left, bottom.saturating_sub(band).max(top), right, bottom, color);
        fill(canvas, left, top, (left + band).min(right), bottom, color);
        fill(canvas, right.saturating_sub(band).max(left), top, right, bottom, color);
    }

    fn fill(canvas: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
        for y in y0..y1 {
            for x in x0..x1 {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}
