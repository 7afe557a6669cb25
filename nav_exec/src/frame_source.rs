//! # Frame Source
//!
//! Frame sources provide camera images to the scan source. The only source currently provided
//! replays a directory of image files, which stands in for a live camera.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{imageops::FilterType, DynamicImage};
use log::{debug, info};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// File extensions which are treated as frames.
const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single captured frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: DynamicImage,
}

/// Replays image files from a directory in name order.
pub struct DirFrameSource {
    paths: Vec<PathBuf>,
    next: usize,
    width: u32,
    height: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FrameSourceError {
    #[error("Could not read the frame directory {0:?}: {1}")]
    ReadDirError(PathBuf, std::io::Error),

    #[error("No frames found in {0:?}")]
    NoFrames(PathBuf),

    #[error("Could not load frame {0:?}: {1}")]
    ImageError(PathBuf, image::ImageError),

    #[error("Frame size must be non-zero (got {0}x{1})")]
    ZeroSize(u32, u32),

    #[error("No more frames are available")]
    EndOfStream,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of camera frames.
pub trait FrameSource {
    /// Acquire the next frame.
    ///
    /// Returns [`FrameSourceError::EndOfStream`] once the source is exhausted.
    fn next_frame(&mut self) -> Result<Frame, FrameSourceError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Frame {
    /// Create a frame stamped with the current time.
    pub fn now(image: DynamicImage) -> Self {
        Self {
            timestamp: Utc::now(),
            image,
        }
    }
}

impl DirFrameSource {
    /// Open a directory of frames, which will be resized to `width` by `height` as they are read.
    pub fn new<P: AsRef<Path>>(dir: P, width: u32, height: u32) -> Result<Self, FrameSourceError> {
        if width == 0 || height == 0 {
            return Err(FrameSourceError::ZeroSize(width, height));
        }

        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| FrameSourceError::ReadDirError(dir.to_path_buf(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| FrameSourceError::ReadDirError(dir.to_path_buf(), e))?
                .path();

            if is_frame_file(&path) {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            return Err(FrameSourceError::NoFrames(dir.to_path_buf()));
        }

        paths.sort();

        info!("Replaying {} frames from {:?}", paths.len(), dir);

        Ok(Self {
            paths,
            next: 0,
            width,
            height,
        })
    }

    /// Number of frames which haven't been read yet.
    pub fn remaining(&self) -> usize {
        self.paths.len() - self.next
    }
}

impl FrameSource for DirFrameSource {
    fn next_frame(&mut self) -> Result<Frame, FrameSourceError> {
        let path = match self.paths.get(self.next) {
            Some(p) => p,
            None => return Err(FrameSourceError::EndOfStream),
        };
        self.next += 1;

        debug!("Loading frame {:?}", path);

        let image = image::open(path)
            .map_err(|e| FrameSourceError::ImageError(path.clone(), e))?
            .resize_exact(self.width, self.height, FilterType::Triangle);

        Ok(Frame::now(image))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| FRAME_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
