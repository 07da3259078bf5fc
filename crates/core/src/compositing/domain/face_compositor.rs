use thiserror::Error;

use crate::detection::domain::face_record::FaceRecord;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CompositeError {
    /// Model session could not be constructed. Fatal at startup.
    #[error("face swap model not loaded: {0}")]
    ModelNotLoaded(String),
    /// Target bbox has no overlap with the frame after clamping.
    #[error("target face region is empty after clamping")]
    EmptyTargetRegion,
    #[error("face swap inference failed: {0}")]
    Inference(String),
}

/// Domain interface for face swap compositing.
///
/// Renders a copy of `frame` with `target`'s face region replaced by the
/// identity carried in `source`'s embedding. The output has identical
/// dimensions to the input and pixels outside the target region are
/// best-effort unchanged (blending quality is owned by the backing model).
///
/// Replacing several faces in one frame means chaining calls: each call's
/// output is the next call's target. The chain is a data dependency, not a
/// concurrency opportunity.
pub trait FaceCompositor: Send {
    fn composite(
        &mut self,
        frame: &Frame,
        target: &FaceRecord,
        source: &FaceRecord,
    ) -> Result<Frame, CompositeError>;
}
