use crate::compositing::domain::face_compositor::FaceCompositor;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::face_record::FaceRecord;
use crate::pipeline::face_selector::{select_source, select_targets, TargetSelection};
use crate::pipeline::SwapError;
use crate::shared::frame::Frame;

/// Per-frame swap orchestration: detect → select → composite each selected
/// face → done.
///
/// The source face is resolved once at construction and reused for every
/// frame. Target faces are re-detected independently per frame; there is no
/// identity tracking across frames.
pub struct FrameSwapEngine {
    detector: Box<dyn FaceDetector>,
    compositor: Box<dyn FaceCompositor>,
    selection: TargetSelection,
    source: FaceRecord,
}

impl FrameSwapEngine {
    /// Detects faces in the reference frame, picks the source face at
    /// `source_index`, and returns an engine ready for per-frame swapping.
    ///
    /// Fails before any video I/O when the reference image has no usable
    /// source face, so callers can fail fast without creating output files.
    pub fn from_reference(
        mut detector: Box<dyn FaceDetector>,
        compositor: Box<dyn FaceCompositor>,
        reference: &Frame,
        source_index: usize,
        selection: TargetSelection,
    ) -> Result<Self, SwapError> {
        let faces = detector.detect(reference)?;
        let source = select_source(&faces, source_index)?.clone();
        log::info!(
            "source face resolved: index {source_index} of {}, score {:.2}",
            faces.len(),
            source.detection_score()
        );
        Ok(Self {
            detector,
            compositor,
            selection,
            source,
        })
    }

    pub fn source(&self) -> &FaceRecord {
        &self.source
    }

    /// Processes one frame. Every input frame yields exactly one output
    /// frame:
    /// - zero detected faces, or a `Single` index this frame doesn't have,
    ///   returns the input unchanged;
    /// - N selected faces means N sequential composite calls, each feeding
    ///   the previous call's output;
    /// - one face's composite failure keeps that face's original pixels and
    ///   continues with the rest.
    pub fn swap(&mut self, frame: Frame) -> Result<Frame, DetectionError> {
        let faces = self.detector.detect(&frame)?;
        if faces.is_empty() {
            return Ok(frame);
        }

        let targets = select_targets(&faces, self.selection);
        let mut current = frame;
        for target in targets {
            match self.compositor.composite(&current, target, &self.source) {
                Ok(rendered) => current = rendered,
                Err(e) => {
                    log::warn!(
                        "composite failed on frame {} (face at {:?}), keeping original pixels: {e}",
                        current.index(),
                        target.bbox()
                    );
                }
            }
        }
        Ok(current)
    }
}
