// THEORY:
// The `MarkerScanner` is the engine of the pixel classification layer. It
// walks two equally sized rasters coordinate by coordinate and plants a
// `DiffMarker` wherever the color distance crosses the caller's threshold.
//
// Algorithm steps:
// 1.  **Dimension check**: the scan only makes sense over rasters of the same
//     size; the pipeline resamples mismatched inputs before calling in, and
//     a direct caller that skips that step gets `DimensionMismatch` back.
// 2.  **Row-major walk**: y ascending, then x ascending. Marker order is not
//     meaningful to the merger, but a canonical order keeps cluster output
//     reproducible when gap distances tie.
// 3.  **Channel-sum test**: the distance is the Manhattan sum over R, G and B
//     (alpha ignored), compared strictly against the threshold.
//
// The scanner is a stateless utility: a pure function of its two inputs with
// O(W*H) time and no allocation beyond the marker list itself.

use crate::core_modules::marker::DiffMarker;
use crate::core_modules::raster::Raster;
use crate::error::DiffError;

pub mod marker_scanner {
    use super::*; // Make structs from parent module available.

    /// Side length of the square footprint planted at each differing pixel.
    /// Fixed, never derived from the magnitude of the difference.
    pub const MARKER_FOOTPRINT: u32 = 2;

    /// The main function of the pixel classification layer.
    /// Emits one marker per coordinate whose channel-sum difference exceeds
    /// `threshold`, in row-major order.
    pub fn scan_markers(
        a: &Raster,
        b: &Raster,
        threshold: u32,
    ) -> Result<Vec<DiffMarker>, DiffError> {
        if a.width() != b.width() || a.height() != b.height() {
            return Err(DiffError::DimensionMismatch {
                expected_width: a.width(),
                expected_height: a.height(),
                actual_width: b.width(),
                actual_height: b.height(),
            });
        }

        let markers = scan_marker_rows(a, b, threshold, 0, a.height());
        log::trace!(
            "scanned {}x{} pixels, {} markers over threshold {}",
            a.width(),
            a.height(),
            markers.len(),
            threshold
        );
        Ok(markers)
    }

    /// The scan restricted to rows `[row_start, row_end)`, the unit of work
    /// handed to each parallel worker. Callers own the dimension check.
    pub fn scan_marker_rows(
        a: &Raster,
        b: &Raster,
        threshold: u32,
        row_start: u32,
        row_end: u32,
    ) -> Vec<DiffMarker> {
        let mut markers = Vec::new();
        for y in row_start..row_end {
            for x in 0..a.width() {
                let diff = a.pixel(x, y).channel_distance(&b.pixel(x, y));
                if diff > threshold {
                    markers.push(DiffMarker::new(x, y, MARKER_FOOTPRINT));
                }
            }
        }
        markers
    }
}
