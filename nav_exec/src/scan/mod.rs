//! # Scan
//!
//! A scan is a set of polar samples, each an angle across the field of view and a normalised
//! distance, where 0 is touching the user and 1 is the limit of the sensor's range.
//!
//! Scans are produced by a [`ScanSource`], either from camera frames through a [`PseudoLidar`],
//! or synthetically by a [`SimScanSource`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod pseudo_lidar;
mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::frame_source::{Frame, FrameSource, FrameSourceError};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use pseudo_lidar::{PseudoLidar, PseudoLidarParams};
pub use sim::{SimScanParams, SimScanSource};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Exclusive lower bound on a usable normalised distance. Anything closer is sensor noise.
pub const MIN_VALID_DISTANCE: f64 = 0.01;

/// Inclusive upper bound on a usable normalised distance.
pub const MAX_VALID_DISTANCE: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single polar sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanSample {
    /// Angle across the field of view in radians, negative to the left, 0 straight ahead
    pub angle_rad: f64,

    /// Normalised distance
    pub distance: f64,
}

/// One cycle's worth of input: a scan and, if the scan came from a camera, the frame it was
/// taken from.
#[derive(Debug, Clone)]
pub struct ScanInput {
    pub frame: Option<Frame>,
    pub scan: Vec<ScanSample>,
}

/// Produces scans from camera frames.
pub struct CamScanSource<F: FrameSource> {
    frames: F,
    lidar: PseudoLidar,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Could not acquire a frame: {0}")]
    FrameError(FrameSourceError),

    #[error("The scan source has no more scans")]
    EndOfStream,

    #[error("Cannot scan an empty image")]
    EmptyImage,

    #[error("Scan line ratio must be in [0, 1) (got {0})")]
    InvalidScanLine(f64),

    #[error("Field of view must be a positive finite number of degrees (got {0})")]
    InvalidFov(f64),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of scans, one per cycle.
pub trait ScanSource {
    /// Acquire the next scan.
    ///
    /// Returns [`ScanError::EndOfStream`] once the source is exhausted.
    fn next_scan(&mut self) -> Result<ScanInput, ScanError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScanSample {
    pub fn new(angle_rad: f64, distance: f64) -> Self {
        Self {
            angle_rad,
            distance,
        }
    }

    /// True if the sample can be placed into a grid.
    ///
    /// The angle must be finite and the distance must lie in
    /// `(MIN_VALID_DISTANCE, MAX_VALID_DISTANCE]`.
    pub fn is_valid(&self) -> bool {
        self.angle_rad.is_finite()
            && self.distance > MIN_VALID_DISTANCE
            && self.distance <= MAX_VALID_DISTANCE
    }
}

impl<F: FrameSource> CamScanSource<F> {
    pub fn new(frames: F, lidar: PseudoLidar) -> Self {
        Self { frames, lidar }
    }
}

impl<F: FrameSource> ScanSource for CamScanSource<F> {
    fn next_scan(&mut self) -> Result<ScanInput, ScanError> {
        let frame = match self.frames.next_frame() {
            Ok(f) => f,
            Err(FrameSourceError::EndOfStream) => return Err(ScanError::EndOfStream),
            Err(e) => return Err(ScanError::FrameError(e)),
        };

        let scan = self.lidar.scan(&frame.image.to_luma8())?;

        Ok(ScanInput {
            frame: Some(frame),
            scan,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    #[test]
    fn test_validity() {
        assert!(ScanSample::new(0.0, 0.5).is_valid());
        assert!(ScanSample::new(0.0, 1.0).is_valid());
        assert!(!ScanSample::new(0.0, 0.01).is_valid());
        assert!(!ScanSample::new(0.0, 0.0).is_valid());
        assert!(!ScanSample::new(0.0, 1.0001).is_valid());
        assert!(!ScanSample::new(std::f64::INFINITY, 0.5).is_valid());
        assert!(!ScanSample::new(0.0, std::f64::NAN).is_valid());
    }

    /// Frame source which yields a fixed number of uniform frames
    struct Uniform {
        remaining: usize,
        brightness: u8,
    }

    impl FrameSource for Uniform {
        fn next_frame(&mut self) -> Result<Frame, FrameSourceError> {
            if self.remaining == 0 {
                return Err(FrameSourceError::EndOfStream);
            }
            self.remaining -= 1;

            Ok(Frame::now(DynamicImage::ImageLuma8(GrayImage::from_pixel(
                32,
                10,
                Luma([self.brightness]),
            ))))
        }
    }

    #[test]
    fn test_cam_scan_source() {
        let frames = Uniform {
            remaining: 2,
            brightness: 51,
        };
        let lidar = PseudoLidar::new(PseudoLidarParams::default()).unwrap();
        let mut source = CamScanSource::new(frames, lidar);

        for _ in 0..2 {
            let input = source.next_scan().unwrap();
            assert!(input.frame.is_some());
            assert_eq!(input.scan.len(), 32);
            assert!(input.scan.iter().all(|s| (s.distance - 0.8).abs() < 1e-9));
        }

        assert!(matches!(source.next_scan(), Err(ScanError::EndOfStream)));
    }
}
