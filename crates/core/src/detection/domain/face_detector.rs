use thiserror::Error;

use crate::detection::domain::face_record::FaceRecord;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectionError {
    /// Model session could not be constructed. Fatal at startup,
    /// never recovered mid-run.
    #[error("face detection model not loaded: {0}")]
    ModelNotLoaded(String),
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("face detection inference failed: {0}")]
    Inference(String),
}

/// Domain interface for face detection.
///
/// Returns zero or more [`FaceRecord`]s in whatever order the backing model
/// produces them; callers must not assume that order is stable across frames.
/// An empty result means "no face found" and is not an error.
///
/// Implementations hold mutable inference state, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRecord>, DetectionError>;
}
