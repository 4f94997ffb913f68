// THEORY:
// The `pipeline` module is the top-level API for the diff engine. It
// encapsulates the full stack (size normalization, pixel classification,
// spatial grouping, padding) behind a single entry point that takes two
// rasters and hands back the highlight regions. Rendering those regions onto
// an output image is deliberately left to the caller; the pipeline's output
// is the region list itself.

use crate::core_modules::marker_scanner::marker_scanner::scan_markers;
use crate::core_modules::region_merger::region_merger::merge_markers;
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::DiffError;
use serde::{Deserialize, Serialize};

// Re-export key data structures for the public API.
pub use crate::core_modules::marker::DiffMarker;
pub use crate::core_modules::raster::Raster;
pub use crate::core_modules::rect::Rect;

/// Configuration for the DiffPipeline, allowing for tunable behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Per-pixel channel-sum cutoff; a coordinate differing by more than this
    /// produces a marker.
    pub threshold: u32,
    /// Markers with a gap distance under this merge into one region.
    pub cluster_distance: u32,
    /// Margin added to every final region on all four sides, clamped so the
    /// top-left never goes negative.
    pub padding: u32,
    /// Upper bound on the marker list. Scans past this fail with
    /// `ResourceExhausted` before the clustering stage can blow up on them.
    pub max_markers: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            threshold: 25,
            cluster_distance: 15,
            padding: 10,
            max_markers: 1_000_000,
        }
    }
}

/// The detailed data package for a divergent comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Padded highlight regions in discovery order.
    pub regions: Vec<Rect>,
    /// How many individual pixels crossed the threshold.
    pub marker_count: usize,
    /// The width both inputs were compared at.
    pub compared_width: u32,
    /// The height both inputs were compared at.
    pub compared_height: u32,
}

/// The primary output of the diff pipeline for a pair of rasters.
#[derive(Debug, Clone)]
pub enum DiffReport {
    Identical,
    Divergent(DiffSummary),
}

/// The main, top-level struct for the diff engine.
pub struct DiffPipeline {
    config: DiffConfig,
}

impl DiffPipeline {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// True when the two rasters differ anywhere past the threshold.
    pub fn differs(&self, a: &Raster, b: &Raster) -> Result<bool, DiffError> {
        let report = self.generate_report(a, b)?;
        Ok(matches!(report, DiffReport::Divergent(_)))
    }

    /// Compares two rasters and returns the padded highlight regions.
    /// Inputs of unequal size are first resampled down to their shared
    /// intersection; zero-area inputs are rejected.
    pub fn compare(&self, a: &Raster, b: &Raster) -> Result<Vec<Rect>, DiffError> {
        let report = self.generate_report(a, b)?;
        Ok(match report {
            DiffReport::Identical => Vec::new(),
            DiffReport::Divergent(summary) => summary.regions,
        })
    }

    pub fn generate_report(&self, a: &Raster, b: &Raster) -> Result<DiffReport, DiffError> {
        Self::validate(a, b)?;

        // Stage 1: Size Normalization
        let normalized = Self::normalize(a, b)?;
        let (a, b) = match &normalized {
            Some((scaled_a, scaled_b)) => (scaled_a, scaled_b),
            None => (a, b),
        };

        // Stage 2: Pixel Classification
        let markers = scan_markers(a, b, self.config.threshold)?;

        // Stage 3: Spatial Grouping & Padding
        self.assemble_report(markers, a.width(), a.height())
    }

    pub(crate) fn validate(a: &Raster, b: &Raster) -> Result<(), DiffError> {
        for raster in [a, b] {
            if raster.is_empty() {
                return Err(DiffError::InvalidInput {
                    width: raster.width(),
                    height: raster.height(),
                });
            }
        }
        Ok(())
    }

    /// Resamples both rasters down to their shared intersection when their
    /// sizes differ. Returns `None` when they already match.
    pub(crate) fn normalize(a: &Raster, b: &Raster) -> Result<Option<(Raster, Raster)>, DiffError> {
        if a.width() == b.width() && a.height() == b.height() {
            return Ok(None);
        }

        let width = a.width().min(b.width());
        let height = a.height().min(b.height());
        log::debug!(
            "input sizes differ ({}x{} vs {}x{}), resampling both to {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height(),
            width,
            height
        );
        Ok(Some((
            image_helper::resize(a, width, height)?,
            image_helper::resize(b, width, height)?,
        )))
    }

    /// The shared back half of the pipeline: marker guard, fixed-point merge,
    /// padding, report assembly.
    pub(crate) fn assemble_report(
        &self,
        markers: Vec<DiffMarker>,
        width: u32,
        height: u32,
    ) -> Result<DiffReport, DiffError> {
        if markers.len() > self.config.max_markers {
            return Err(DiffError::ResourceExhausted {
                markers: markers.len(),
                limit: self.config.max_markers,
            });
        }
        if markers.is_empty() {
            return Ok(DiffReport::Identical);
        }

        let clusters = merge_markers(&markers, self.config.cluster_distance);
        let regions: Vec<Rect> = clusters
            .iter()
            .map(|cluster| cluster.padded(self.config.padding))
            .collect();
        log::debug!(
            "{} markers merged into {} regions",
            markers.len(),
            regions.len()
        );

        Ok(DiffReport::Divergent(DiffSummary {
            regions,
            marker_count: markers.len(),
            compared_width: width,
            compared_height: height,
        }))
    }
}
