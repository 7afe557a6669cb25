//! # Rendering
//!
//! Produces images of the navigation state for a sighted observer: the bird's-eye grid with the
//! planned path drawn on, a colour mapped view of the grid, and the camera frame with detections
//! boxed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::{Path as FsPath, PathBuf};

use image::{imageops::FilterType, DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use log::debug;
use ndarray::ArrayView2;

use crate::auto::{
    map::{BinaryMap, GridCell},
    path::Path,
};
use crate::detect::Detection;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

/// Line thickness of detection boxes in pixels.
const BOX_THICKNESS: u32 = 2;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Periodically saves rendered images into a directory.
pub struct SessionRenderer {
    out_dir: PathBuf,
    interval_cycles: u64,
    display_width: u32,
    display_height: u32,
}

/// The things to draw for a single cycle.
pub struct RenderInput<'a> {
    pub intensities: ArrayView2<'a, u8>,
    pub map: &'a BinaryMap,
    pub path: &'a Path,
    pub frame: Option<&'a DynamicImage>,
    pub detections: &'a [Detection],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Display size must be non-zero (got {0}x{1})")]
    ZeroSize(u32, u32),

    #[error("Could not create the render directory {0:?}: {1}")]
    CreateDirError(PathBuf, std::io::Error),

    #[error("Could not save the image {0:?}: {1}")]
    SaveError(PathBuf, image::ImageError),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Draw the map at one pixel per cell, free cells white and obstacles black, with the path's cells
/// drawn as green dots.
pub fn draw_path_on_bev(map: &BinaryMap, path: &Path) -> RgbImage {
    let mut img = RgbImage::from_fn(map.width() as u32, map.height() as u32, |x, y| {
        if map.is_free(GridCell::new(y as usize, x as usize)) {
            WHITE
        } else {
            BLACK
        }
    });

    for cell in path.cells.iter() {
        draw_dot(&mut img, cell.col as i64, cell.row as i64);
    }

    img
}

/// Resize a grid to the display size with nearest neighbour sampling and apply the jet colour map.
///
/// Binary data (no value above 1) is stretched to the full intensity range first.
pub fn colour_bev(data: ArrayView2<u8>, width: u32, height: u32) -> Result<RgbImage, RenderError> {
    if width == 0 || height == 0 || data.is_empty() {
        return Err(RenderError::ZeroSize(width, height));
    }

    let scale = match data.iter().max() {
        Some(&m) if m <= 1 => 255,
        _ => 1,
    };

    let grey = GrayImage::from_fn(data.ncols() as u32, data.nrows() as u32, |x, y| {
        Luma([data[[y as usize, x as usize]].saturating_mul(scale)])
    });
    let resized = image::imageops::resize(&grey, width, height, FilterType::Nearest);

    Ok(RgbImage::from_fn(width, height, |x, y| {
        jet(resized.get_pixel(x, y)[0])
    }))
}

/// Draw green boxes around each detection on a copy of the frame.
pub fn draw_detections(frame: &DynamicImage, detections: &[Detection]) -> RgbImage {
    let mut img = frame.to_rgb8();

    for det in detections {
        draw_box(
            &mut img,
            det.bbox.x1.round() as i64,
            det.bbox.y1.round() as i64,
            det.bbox.x2.round() as i64,
            det.bbox.y2.round() as i64,
        );
    }

    img
}

/// The jet colour map: blue at 0 through cyan, yellow, to red at 255.
pub fn jet(value: u8) -> Rgb<u8> {
    let v = value as f64 / 255.0;
    let channel = |centre: f64| {
        let c = (1.5 - (4.0 * v - centre).abs()).max(0.0).min(1.0);
        (c * 255.0).round() as u8
    };

    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Draw a filled dot of radius 1, which covers the centre pixel and its four edge neighbours.
fn draw_dot(img: &mut RgbImage, x: i64, y: i64) {
    for (dx, dy) in &[(0, 0), (0, -1), (0, 1), (-1, 0), (1, 0)] {
        put_pixel(img, x + dx, y + dy, GREEN);
    }
}

fn draw_box(img: &mut RgbImage, x1: i64, y1: i64, x2: i64, y2: i64) {
    let t = BOX_THICKNESS as i64;

    for x in x1..=x2 {
        for o in 0..t {
            put_pixel(img, x, y1 + o, GREEN);
            put_pixel(img, x, y2 - o, GREEN);
        }
    }
    for y in y1..=y2 {
        for o in 0..t {
            put_pixel(img, x1 + o, y, GREEN);
            put_pixel(img, x2 - o, y, GREEN);
        }
    }
}

/// Set a pixel, ignoring coordinates outside the image.
fn put_pixel(img: &mut RgbImage, x: i64, y: i64, colour: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, colour);
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SessionRenderer {
    /// Create a renderer saving into `out_dir` every `interval_cycles` cycles. An interval of 0
    /// disables rendering.
    pub fn new<P: AsRef<FsPath>>(
        out_dir: P,
        interval_cycles: u64,
        display_width: u32,
        display_height: u32,
    ) -> Result<Self, RenderError> {
        if display_width == 0 || display_height == 0 {
            return Err(RenderError::ZeroSize(display_width, display_height));
        }

        let out_dir = out_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&out_dir)
            .map_err(|e| RenderError::CreateDirError(out_dir.clone(), e))?;

        Ok(Self {
            out_dir,
            interval_cycles,
            display_width,
            display_height,
        })
    }

    /// Render the cycle if it falls on the render interval, returning true if anything was saved.
    pub fn render(&self, cycle: u64, input: &RenderInput) -> Result<bool, RenderError> {
        if self.interval_cycles == 0 || cycle % self.interval_cycles != 0 {
            return Ok(false);
        }

        self.save(
            format!("path_{:06}.png", cycle),
            draw_path_on_bev(input.map, input.path),
        )?;
        self.save(
            format!("bev_{:06}.png", cycle),
            colour_bev(input.intensities, self.display_width, self.display_height)?,
        )?;

        if let Some(frame) = input.frame {
            self.save(
                format!("detections_{:06}.png", cycle),
                draw_detections(frame, input.detections),
            )?;
        }

        debug!("Rendered cycle {} into {:?}", cycle, self.out_dir);

        Ok(true)
    }

    fn save(&self, name: String, img: RgbImage) -> Result<(), RenderError> {
        let path = self.out_dir.join(name);
        img.save(&path).map_err(|e| RenderError::SaveError(path, e))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
