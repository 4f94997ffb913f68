// THEORY:
// The per-pixel classification test has no cross-pixel dependency, so the
// scan parallelizes cleanly: the image is split into horizontal row bands,
// one blocking task per band, and the band results are concatenated in band
// order, which restores the canonical row-major marker order the merge
// stage's tie-breaking determinism depends on. The fixed-point merge itself
// has global dependencies (any marker can end up in any cluster), so it runs
// single-threaded on the reassembled list, exactly as in `DiffPipeline`.

use std::sync::Arc;

use futures::future::join_all;

use crate::core_modules::marker::DiffMarker;
use crate::core_modules::marker_scanner::marker_scanner;
use crate::core_modules::raster::Raster;
use crate::core_modules::rect::Rect;
use crate::error::DiffError;
use crate::pipeline::{DiffConfig, DiffPipeline, DiffReport};

/// Row-banded variant of the diff engine. Produces region lists identical to
/// `DiffPipeline` on the same inputs and configuration.
pub struct ParallelDiffPipeline {
    inner: DiffPipeline,
    workers: usize,
}

impl ParallelDiffPipeline {
    /// One worker per available CPU.
    pub fn new(config: DiffConfig) -> Self {
        Self::with_workers(config, num_cpus::get())
    }

    pub fn with_workers(config: DiffConfig, workers: usize) -> Self {
        Self {
            inner: DiffPipeline::new(config),
            workers: workers.max(1),
        }
    }

    pub async fn compare(&self, a: &Raster, b: &Raster) -> Result<Vec<Rect>, DiffError> {
        let report = self.generate_report(a, b).await?;
        Ok(match report {
            DiffReport::Identical => Vec::new(),
            DiffReport::Divergent(summary) => summary.regions,
        })
    }

    pub async fn generate_report(&self, a: &Raster, b: &Raster) -> Result<DiffReport, DiffError> {
        DiffPipeline::validate(a, b)?;

        // Stage 1: Size Normalization
        let (a, b) = match DiffPipeline::normalize(a, b)? {
            Some((scaled_a, scaled_b)) => (Arc::new(scaled_a), Arc::new(scaled_b)),
            None => (Arc::new(a.clone()), Arc::new(b.clone())),
        };

        // Stage 2: Banded Pixel Classification
        let markers = self
            .scan_banded(Arc::clone(&a), Arc::clone(&b), self.inner.config().threshold)
            .await?;

        // Stage 3: Spatial Grouping & Padding
        self.inner.assemble_report(markers, a.width(), a.height())
    }

    async fn scan_banded(
        &self,
        a: Arc<Raster>,
        b: Arc<Raster>,
        threshold: u32,
    ) -> Result<Vec<DiffMarker>, DiffError> {
        let height = a.height();
        let bands = (self.workers as u32).min(height).max(1);
        let rows_per_band = height.div_ceil(bands);

        let mut tasks = Vec::with_capacity(bands as usize);
        for band in 0..bands {
            let row_start = band * rows_per_band;
            let row_end = (row_start + rows_per_band).min(height);
            if row_start >= row_end {
                break;
            }

            let a = Arc::clone(&a);
            let b = Arc::clone(&b);
            tasks.push(tokio::task::spawn_blocking(move || {
                marker_scanner::scan_marker_rows(&a, &b, threshold, row_start, row_end)
            }));
        }

        let mut markers = Vec::new();
        for band_result in join_all(tasks).await {
            let band_markers =
                band_result.map_err(|join_error| DiffError::Worker(join_error.to_string()))?;
            markers.extend(band_markers);
        }
        Ok(markers)
    }
}

#[cfg(test)]
mod tests {
    use super::ParallelDiffPipeline;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::raster::Raster;
    use crate::pipeline::{DiffConfig, DiffPipeline};

    /// A raster with a deterministic per-pixel pattern and a few planted
    /// divergence sites.
    fn patterned(width: u32, height: u32, plant: &[(u32, u32)]) -> Raster {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let shade = ((x * 7 + y * 13) % 251) as u8;
                let planted = plant.contains(&(x, y));
                let red = if planted { shade.wrapping_add(120) } else { shade };
                data.extend_from_slice(&[red, shade, shade, 255]);
            }
        }
        Raster::from_rgba8(width, height, data).unwrap()
    }

    #[tokio::test]
    async fn banded_scan_matches_the_serial_pipeline() {
        let a = patterned(64, 48, &[]);
        let b = patterned(64, 48, &[(3, 2), (40, 30), (63, 47), (10, 45)]);

        let config = DiffConfig::default();
        let serial = DiffPipeline::new(config.clone()).compare(&a, &b).unwrap();

        for workers in [1, 2, 3, 8, 64] {
            let parallel = ParallelDiffPipeline::with_workers(config.clone(), workers)
                .compare(&a, &b)
                .await
                .unwrap();
            assert_eq!(parallel, serial, "with {workers} workers");
        }
    }

    #[tokio::test]
    async fn more_workers_than_rows_still_covers_every_row() {
        let a = patterned(16, 3, &[]);
        let b = patterned(16, 3, &[(0, 0), (15, 2)]);

        let parallel = ParallelDiffPipeline::with_workers(DiffConfig::default(), 32);
        let serial = DiffPipeline::new(DiffConfig::default());
        assert_eq!(
            parallel.compare(&a, &b).await.unwrap(),
            serial.compare(&a, &b).unwrap()
        );
    }

    #[tokio::test]
    async fn identical_rasters_are_identical_in_parallel_too() {
        let raster = Raster::filled(32, 32, Pixel::new(9, 9, 9, 255));
        let pipeline = ParallelDiffPipeline::new(DiffConfig::default());
        assert!(pipeline.compare(&raster, &raster).await.unwrap().is_empty());
    }
}
