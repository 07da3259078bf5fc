use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::diagnostics::annotator;
use crate::diagnostics::face_info::{self, FaceInfo};
use crate::pipeline::SwapError;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Detection-only inspection of a single image: returns face metadata rows
/// and optionally writes an annotated copy showing what the detector saw.
///
/// Shares the detection output with the swap path but never touches the
/// compositor.
pub struct InspectFacesUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn FaceDetector>,
    image_writer: Box<dyn ImageWriter>,
}

impl InspectFacesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn FaceDetector>,
        image_writer: Box<dyn ImageWriter>,
    ) -> Self {
        Self {
            reader,
            detector,
            image_writer,
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        annotated_path: Option<&Path>,
    ) -> Result<Vec<FaceInfo>, SwapError> {
        self.reader.open(input_path)?;
        let frame = self.reader.frames().next().ok_or(SwapError::EmptyInput)??;
        self.reader.close();

        let faces = self.detector.detect(&frame)?;
        log::info!("{} face(s) detected in {}", faces.len(), input_path.display());

        if let Some(path) = annotated_path {
            let annotated = annotator::annotate(&frame, &faces);
            self.image_writer.write(path, &annotated)?;
        }

        Ok(face_info::report(&faces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::DetectionError;
    use crate::detection::domain::face_record::{BoundingBox, FaceEmbedding, FaceRecord};
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::media_error::MediaError;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

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

    struct StubDetector {
        faces: Vec<FaceRecord>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceRecord>, DetectionError> {
            Ok(self.faces.clone())
        }
    }

    struct StubImageWriter {
        written: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), MediaError> {
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn face_at(x1: f32, score: f32) -> FaceRecord {
        FaceRecord::new(
            BoundingBox::new(x1, 0.0, x1 + 10.0, 10.0),
            None,
            score,
            None,
            None,
            FaceEmbedding::new(vec![]),
        )
    }

    fn make_frame() -> Frame {
        Frame::new(vec![0; 30 * 30 * 3], 30, 30, 0)
    }

    #[test]
    fn test_reports_detected_faces() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut uc = InspectFacesUseCase::new(
            Box::new(StubImageReader {
                frame: Some(make_frame()),
            }),
            Box::new(StubDetector {
                faces: vec![face_at(0.0, 0.9), face_at(15.0, 0.7)],
            }),
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
        );

        let infos = uc.execute(Path::new("in.png"), None).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].index, 1);
        // No annotated output requested
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_writes_annotated_copy_when_requested() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut uc = InspectFacesUseCase::new(
            Box::new(StubImageReader {
                frame: Some(make_frame()),
            }),
            Box::new(StubDetector {
                faces: vec![face_at(5.0, 0.9)],
            }),
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
        );

        uc.execute(Path::new("in.png"), Some(Path::new("annotated.png")))
            .unwrap();
        assert_eq!(
            *written.lock().unwrap(),
            vec![PathBuf::from("annotated.png")]
        );
    }

    #[test]
    fn test_zero_faces_is_empty_report_not_error() {
        let mut uc = InspectFacesUseCase::new(
            Box::new(StubImageReader {
                frame: Some(make_frame()),
            }),
            Box::new(StubDetector { faces: vec![] }),
            Box::new(StubImageWriter {
                written: Arc::new(Mutex::new(Vec::new())),
            }),
        );

        let infos = uc.execute(Path::new("in.png"), None).unwrap();
        assert!(infos.is_empty());
    }
}
