//! # Object Detection
//!
//! Detections of people, vehicles and buildings in the camera frame are shown alongside the
//! navigation output. They do not feed into planning.
//!
//! The detector itself is behind the [`Detector`] trait. [`filter_detections`] reduces a raw
//! detector output to the classes of interest.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};

use crate::frame_source::Frame;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An axis aligned box in pixel coordinates, `(x1, y1)` top left and `(x2, y2)` bottom right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// A detection straight from a detector, labelled by class id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: BBox,
}

/// A detection of a class of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BBox,
}

/// A class of interest and the label to report it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetClass {
    pub id: u32,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Minimum confidence of a kept detection
    pub conf_threshold: f32,

    /// Classes to keep
    pub classes: Vec<TargetClass>,
}

/// Detector which never detects anything, used when no model is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDetector;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("The detector failed to process the frame: {0}")]
    InferenceFailed(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait Detector {
    /// Run the detector over a frame, returning every raw detection.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, DetectError>;
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Keep only detections of the target classes with at least the threshold confidence.
pub fn filter_detections(raw: &[RawDetection], params: &DetectionParams) -> Vec<Detection> {
    raw.iter()
        .filter(|d| d.confidence >= params.conf_threshold)
        .filter_map(|d| {
            params
                .classes
                .iter()
                .find(|c| c.id == d.class_id)
                .map(|c| Detection {
                    label: c.label.clone(),
                    confidence: d.confidence,
                    bbox: d.bbox,
                })
        })
        .collect()
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            conf_threshold: 0.4,
            classes: vec![
                TargetClass::new(0, "person"),
                TargetClass::new(2, "car"),
                TargetClass::new(14, "building"),
            ],
        }
    }
}

impl TargetClass {
    pub fn new(id: u32, label: &str) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl Detector for NullDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<RawDetection>, DetectError> {
        trace!("Null detector, no detections");
        Ok(Vec::new())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
