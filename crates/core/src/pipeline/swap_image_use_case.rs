use std::path::Path;

use crate::compositing::domain::face_compositor::FaceCompositor;
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::face_selector::TargetSelection;
use crate::pipeline::frame_swap_engine::FrameSwapEngine;
use crate::pipeline::SwapError;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Single-image swap: read → detect → select → composite → write.
///
/// A target image with zero detected faces still produces an output file,
/// identical to the input.
pub struct SwapImageUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    detector: Option<Box<dyn FaceDetector>>,
    compositor: Option<Box<dyn FaceCompositor>>,
    source_index: usize,
    selection: TargetSelection,
}

impl SwapImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        detector: Box<dyn FaceDetector>,
        compositor: Box<dyn FaceCompositor>,
        source_index: usize,
        selection: TargetSelection,
    ) -> Self {
        Self {
            reader,
            image_writer,
            detector: Some(detector),
            compositor: Some(compositor),
            source_index,
            selection,
        }
    }

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

        self.reader.open(input_path)?;
        let frame = self.reader.frames().next().ok_or(SwapError::EmptyInput)??;
        self.reader.close();

        let rendered = engine.swap(frame)?;
        self.image_writer.write(output_path, &rendered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositing::domain::face_compositor::CompositeError;
    use crate::detection::domain::face_detector::DetectionError;
    use crate::detection::domain::face_record::{BoundingBox, FaceEmbedding, FaceRecord};
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::media_error::MediaError;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    const REFERENCE_INDEX: usize = usize::MAX;

    struct StubImageReader {
        frame: Option<Frame>,
    }

    impl VideoReader for StubImageReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, MediaError> {
            let frame = self.frame.as_ref().unwrap();
            Ok(VideoMetadata::still_image(
                frame.width(),
                frame.height(),
                Some(path.to_path_buf()),
            ))
        }

        fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, MediaError>> + '_> {
            Box::new(self.frame.take().into_iter().map(Ok))
        }

        fn close(&mut self) {
            self.frame = None;
        }
    }

    struct StubImageWriter {
        written: Arc<Mutex<Vec<(PathBuf, Frame)>>>,
    }

    impl StubImageWriter {
        fn new() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, frame: &Frame) -> Result<(), MediaError> {
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), frame.clone()));
            Ok(())
        }
    }

    struct StubDetector {
        results: HashMap<usize, Vec<FaceRecord>>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRecord>, DetectionError> {
            Ok(self
                .results
                .get(&frame.index())
                .cloned()
                .unwrap_or_default())
        }
    }

    struct MarkingCompositor;

    impl FaceCompositor for MarkingCompositor {
        fn composite(
            &mut self,
            frame: &Frame,
            _target: &FaceRecord,
            _source: &FaceRecord,
        ) -> Result<Frame, CompositeError> {
            let mut out = frame.clone();
            let marked = out.pixel(0, 0)[0].saturating_add(1);
            out.put_pixel(0, 0, [marked, 0, 0]);
            Ok(out)
        }
    }

    fn face_at(x1: f32) -> FaceRecord {
        FaceRecord::new(
            BoundingBox::new(x1, 0.0, x1 + 10.0, 10.0),
            None,
            0.9,
            None,
            None,
            FaceEmbedding::new(vec![x1]),
        )
    }

    fn make_frame(index: usize, width: u32, height: u32) -> Frame {
        Frame::new(vec![0; (width * height * 3) as usize], width, height, index)
    }

    fn use_case(
        target_faces: Vec<FaceRecord>,
        target: Frame,
    ) -> (SwapImageUseCase, Arc<Mutex<Vec<(PathBuf, Frame)>>>) {
        let mut results = HashMap::new();
        results.insert(REFERENCE_INDEX, vec![face_at(0.0)]);
        results.insert(target.index(), target_faces);

        let writer = StubImageWriter::new();
        let written = writer.written.clone();
        let uc = SwapImageUseCase::new(
            Box::new(StubImageReader { frame: Some(target) }),
            Box::new(writer),
            Box::new(StubDetector { results }),
            Box::new(MarkingCompositor),
            0,
            TargetSelection::All,
        );
        (uc, written)
    }

    #[test]
    fn test_swaps_each_detected_face() {
        let target = make_frame(0, 30, 30);
        let (mut uc, written) = use_case(vec![face_at(0.0), face_at(15.0)], target);

        uc.execute(
            &make_frame(REFERENCE_INDEX, 30, 30),
            Path::new("in.png"),
            Path::new("out.png"),
        )
        .unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        // Two chained composites
        assert_eq!(written[0].1.pixel(0, 0)[0], 2);
    }

    #[test]
    fn test_no_target_faces_writes_input_unchanged() {
        let target = make_frame(0, 30, 30);
        let expected = target.clone();
        let (mut uc, written) = use_case(vec![], target);

        uc.execute(
            &make_frame(REFERENCE_INDEX, 30, 30),
            Path::new("in.png"),
            Path::new("out.png"),
        )
        .unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written[0].1, expected);
    }

    #[test]
    fn test_no_source_face_fails_without_writing() {
        let target = make_frame(0, 30, 30);
        let writer = StubImageWriter::new();
        let written = writer.written.clone();
        let mut results = HashMap::new();
        results.insert(0, vec![face_at(0.0)]);

        let mut uc = SwapImageUseCase::new(
            Box::new(StubImageReader { frame: Some(target) }),
            Box::new(writer),
            Box::new(StubDetector { results }),
            Box::new(MarkingCompositor),
            0,
            TargetSelection::All,
        );

        let result = uc.execute(
            &make_frame(REFERENCE_INDEX, 30, 30),
            Path::new("in.png"),
            Path::new("out.png"),
        );

        assert!(matches!(result, Err(SwapError::Selection(_))));
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_output_dimensions_preserved() {
        let target = make_frame(0, 64, 48);
        let (mut uc, written) = use_case(vec![face_at(0.0)], target);

        uc.execute(
            &make_frame(REFERENCE_INDEX, 30, 30),
            Path::new("in.png"),
            Path::new("out.png"),
        )
        .unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written[0].1.width(), 64);
        assert_eq!(written[0].1.height(), 48);
    }
}
