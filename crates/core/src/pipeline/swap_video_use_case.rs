use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::compositing::domain::face_compositor::FaceCompositor;
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::face_selector::TargetSelection;
use crate::pipeline::frame_swap_engine::FrameSwapEngine;
use crate::pipeline::SwapError;
use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Orchestrates the full video swap: resolve the source face, open input,
/// open output with identical stream properties, then read → swap → write
/// sequentially until the input ends.
///
/// Single-use struct: `execute` consumes the detector and compositor, so a
/// second call fails with `AlreadyExecuted`. Frames are processed one at a
/// time, bounding peak memory to one frame in flight; cancellation and
/// progress hooks fire at frame boundaries only.
pub struct SwapVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    detector: Option<Box<dyn FaceDetector>>,
    compositor: Option<Box<dyn FaceCompositor>>,
    source_index: usize,
    selection: TargetSelection,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl SwapVideoUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn FaceDetector>,
        compositor: Box<dyn FaceCompositor>,
        source_index: usize,
        selection: TargetSelection,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader,
            writer,
            detector: Some(detector),
            compositor: Some(compositor),
            source_index,
            selection,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    /// Runs the pipeline. `reference` is the decoded reference image holding
    /// the source face.
    ///
    /// The source face check happens before the input or output is opened:
    /// a reference image without faces never creates an output file. On any
    /// fatal error after the output has been opened, both handles are closed
    /// and the partial output file is removed.
    pub fn execute(
        &mut self,
        reference: &Frame,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<(), SwapError> {
        let detector = self.detector.take().ok_or(SwapError::AlreadyExecuted)?;
        let compositor = self.compositor.take().ok_or(SwapError::AlreadyExecuted)?;

        let mut engine = FrameSwapEngine::from_reference(
            detector,
            compositor,
            reference,
            self.source_index,
            self.selection,
        )?;

        let metadata = self.reader.open(input_path)?;
        log::info!(
            "input opened: {}x{} @ {:.2} fps, {} frame(s)",
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames
        );
        if let Err(e) = self.writer.open(output_path, &metadata) {
            self.reader.close();
            return Err(e.into());
        }

        let result = self.process_frames(&mut engine, metadata.total_frames);

        self.reader.close();
        let closed = self.writer.close();

        let result = match (result, closed) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(e)) => Err(SwapError::from(e)),
            (Err(e), _) => Err(e),
        };

        if result.is_err() {
            let _ = fs::remove_file(output_path);
        }
        result
    }

    fn process_frames(
        &mut self,
        engine: &mut FrameSwapEngine,
        total: usize,
    ) -> Result<(), SwapError> {
        let mut processed = 0usize;
        for next in self.reader.frames() {
            if self.cancelled.load(Ordering::Relaxed) {
                log::info!("cancelled at frame boundary after {processed} frame(s)");
                break;
            }

            let frame = next?;
            let rendered = engine.swap(frame)?;
            self.writer.write(&rendered)?;
            processed += 1;

            if let Some(on_progress) = &self.on_progress {
                if !on_progress(processed, total) {
                    return Err(SwapError::Cancelled);
                }
            }
        }
        Ok(())
    }
}
