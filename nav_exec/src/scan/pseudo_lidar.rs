//! Pseudo-lidar: derives a scan from a single row of a greyscale camera frame.
//!
//! The brightness of each pixel along the scan row is taken as a proxy for proximity, with
//! bright pixels being near and dark pixels being far.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::GrayImage;
use log::trace;
use serde::{Deserialize, Serialize};

use super::{ScanError, ScanSample};
use util::maths::{clamp, linspace};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// 5-tap binomial smoothing kernel, sums to 16.
const SMOOTHING_KERNEL: [f64; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
const SMOOTHING_NORM: f64 = 16.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PseudoLidarParams {
    /// Position of the scan row as a fraction of the image height from the top
    pub scan_line_ratio: f64,

    /// Horizontal field of view of the camera in degrees
    pub fov_deg: f64,
}

#[derive(Debug, Clone)]
pub struct PseudoLidar {
    params: PseudoLidarParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PseudoLidarParams {
    fn default() -> Self {
        Self {
            scan_line_ratio: 0.6,
            fov_deg: 60.0,
        }
    }
}

impl PseudoLidar {
    pub fn new(params: PseudoLidarParams) -> Result<Self, ScanError> {
        if !(0.0..1.0).contains(&params.scan_line_ratio) {
            return Err(ScanError::InvalidScanLine(params.scan_line_ratio));
        }
        if !params.fov_deg.is_finite() || params.fov_deg <= 0.0 {
            return Err(ScanError::InvalidFov(params.fov_deg));
        }

        Ok(Self { params })
    }

    /// Produce a scan with one sample per image column.
    pub fn scan(&self, frame: &GrayImage) -> Result<Vec<ScanSample>, ScanError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::EmptyImage);
        }

        let row = ((height as f64 * self.params.scan_line_ratio).floor() as u32).min(height - 1);

        let brightness: Vec<f64> = (0..width)
            .map(|x| frame.get_pixel(x, row)[0] as f64)
            .collect();
        let smoothed = smooth(&brightness);

        let half_fov_rad = self.params.fov_deg.to_radians() / 2.0;
        let angles = linspace(-half_fov_rad, half_fov_rad, width as usize);

        trace!("Scanned row {} of {}x{} frame", row, width, height);

        Ok(angles
            .into_iter()
            .zip(smoothed.into_iter())
            .map(|(angle_rad, b)| ScanSample::new(angle_rad, clamp(&(1.0 - b / 255.0), &0.0, &1.0)))
            .collect())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convolve with the binomial kernel, reflecting about the end samples (`dcb|abcd|cba`).
fn smooth(values: &[f64]) -> Vec<f64> {
    let n = values.len() as isize;
    let half = (SMOOTHING_KERNEL.len() / 2) as isize;

    (0..n)
        .map(|i| {
            SMOOTHING_KERNEL
                .iter()
                .enumerate()
                .map(|(k, w)| w * values[reflect_101(i + k as isize - half, n)])
                .sum::<f64>()
                / SMOOTHING_NORM
        })
        .collect()
}

/// Map an out of range index back into `[0, n)` by reflecting without repeating the edge.
fn reflect_101(mut i: isize, n: isize) -> usize {
    if n == 1 {
        return 0;
    }

    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * (n - 1) - i;
        }
    }

    i as usize
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Luma;

    #[test]
    fn test_reflect() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(-2, 2), 0);
        assert_eq!(reflect_101(3, 2), 1);
        assert_eq!(reflect_101(-2, 1), 0);
    }

    #[test]
    fn test_smooth() {
        // Constant in, constant out
        assert_eq!(smooth(&[7.0; 9]), vec![7.0; 9]);

        // Impulse response is the kernel
        let mut impulse = vec![0.0; 9];
        impulse[4] = 16.0;
        assert_eq!(
            smooth(&impulse),
            vec![0.0, 0.0, 1.0, 4.0, 6.0, 4.0, 1.0, 0.0, 0.0]
        );

        // Edge reflection, x[-1] = x[1] and x[-2] = x[2]
        let s = smooth(&[16.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(s[0], 6.0);
        assert_eq!(s[1], 4.0);

        assert!(smooth(&[]).is_empty());
        assert_eq!(smooth(&[3.0]), vec![3.0]);
    }

    #[test]
    fn test_scan_uses_scan_row() {
        // Bright only in the scan row (row 6 of 10) and only on the left half
        let img = GrayImage::from_fn(40, 10, |x, y| {
            if y == 6 && x < 20 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        let lidar = PseudoLidar::new(PseudoLidarParams::default()).unwrap();

        let scan = lidar.scan(&img).unwrap();

        assert_eq!(scan.len(), 40);
        assert!((scan[0].angle_rad + 30f64.to_radians()).abs() < 1e-12);
        assert!((scan[39].angle_rad - 30f64.to_radians()).abs() < 1e-12);
        assert!(scan.windows(2).all(|w| w[0].angle_rad < w[1].angle_rad));

        // Near on the left, far on the right, blended at the boundary
        assert_eq!(scan[0].distance, 0.0);
        assert_eq!(scan[39].distance, 1.0);
        assert!(scan[19].distance > 0.0 && scan[19].distance < 1.0);
        assert!(scan.iter().all(|s| (0.0..=1.0).contains(&s.distance)));
    }

    #[test]
    fn test_bad_params() {
        assert!(PseudoLidar::new(PseudoLidarParams {
            scan_line_ratio: 1.0,
            ..Default::default()
        })
        .is_err());
        assert!(PseudoLidar::new(PseudoLidarParams {
            fov_deg: 0.0,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_empty_image() {
        let lidar = PseudoLidar::new(PseudoLidarParams::default()).unwrap();
        assert!(matches!(
            lidar.scan(&GrayImage::new(0, 0)),
            Err(ScanError::EmptyImage)
        ));
    }
}
