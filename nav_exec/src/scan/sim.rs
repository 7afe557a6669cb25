//! Synthetic scan source for running without a camera.
//!
//! Distances are drawn from a 2D Perlin noise field, one axis across the field of view and the
//! other along time, so obstacles drift smoothly from cycle to cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use noise::{NoiseFn, Perlin, Seedable};
use serde::{Deserialize, Serialize};

use super::{ScanError, ScanInput, ScanSample, ScanSource};
use util::maths::{clamp, linspace};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimScanParams {
    /// Number of samples per scan
    pub num_samples: usize,

    /// Field of view covered by the scan in degrees
    pub fov_deg: f64,

    /// Noise field coordinate step between adjacent samples
    pub angle_scale: f64,

    /// Noise field coordinate step between cycles
    pub time_scale: f64,

    /// Distance of a sample when the noise value is zero
    pub base_distance: f64,

    /// Seed of the noise field
    pub seed: u32,

    /// Number of scans to produce, unlimited if `None`
    pub num_scans: Option<u64>,
}

pub struct SimScanSource {
    params: SimScanParams,
    perlin: Perlin,
    angles_rad: Vec<f64>,
    num_produced: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimScanParams {
    fn default() -> Self {
        Self {
            num_samples: 640,
            fov_deg: 60.0,
            angle_scale: 0.013,
            time_scale: 0.05,
            base_distance: 0.7,
            seed: 0,
            num_scans: None,
        }
    }
}

impl SimScanSource {
    pub fn new(params: SimScanParams) -> Result<Self, ScanError> {
        if !params.fov_deg.is_finite() || params.fov_deg <= 0.0 {
            return Err(ScanError::InvalidFov(params.fov_deg));
        }

        let half_fov_rad = params.fov_deg.to_radians() / 2.0;
        let angles_rad = linspace(-half_fov_rad, half_fov_rad, params.num_samples);

        Ok(Self {
            perlin: Perlin::new().set_seed(params.seed),
            params,
            angles_rad,
            num_produced: 0,
        })
    }

    /// Generate the scan for the given cycle without advancing the source.
    pub fn scan_at(&self, cycle: u64) -> Vec<ScanSample> {
        // Offset so that no sample lands on the integer lattice, where Perlin noise is always 0
        let t = cycle as f64 * self.params.time_scale + 0.5;

        self.angles_rad
            .iter()
            .enumerate()
            .map(|(i, &angle_rad)| {
                let n = self
                    .perlin
                    .get([i as f64 * self.params.angle_scale + 0.25, t]);
                let distance = clamp(&(self.params.base_distance + n), &0.0, &1.0);

                ScanSample::new(angle_rad, distance)
            })
            .collect()
    }
}

impl ScanSource for SimScanSource {
    fn next_scan(&mut self) -> Result<ScanInput, ScanError> {
        if let Some(max) = self.params.num_scans {
            if self.num_produced >= max {
                return Err(ScanError::EndOfStream);
            }
        }

        let scan = self.scan_at(self.num_produced);
        self.num_produced += 1;

        Ok(ScanInput { frame: None, scan })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
