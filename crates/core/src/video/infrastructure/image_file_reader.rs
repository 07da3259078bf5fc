use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::media_error::MediaError;
use crate::video::domain::video_reader::VideoReader;

/// Adapts a still image file to the [`VideoReader`] interface.
///
/// The image becomes a one-frame stream with `fps = 0`, so the pipeline
/// processes images and videos through the same code path. Decoding uses the
/// `image` crate and converts to RGB8 regardless of the on-disk format.
pub struct ImageFileReader {
    frame: Option<Frame>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, MediaError> {
        let img = image::open(path)
            .map_err(|e| MediaError::Open {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .to_rgb8();

        let (width, height) = img.dimensions();
        self.frame = Some(Frame::new(img.into_raw(), width, height, 0));

        Ok(VideoMetadata::still_image(
            width,
            height,
            Some(path.to_path_buf()),
        ))
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, MediaError>> + '_> {
        if self.frame.is_none() {
            return Box::new(std::iter::once(Err(MediaError::NotOpen)));
        }
        Box::new(self.frame.take().into_iter().map(Ok))
    }

    fn close(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("test.png");
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([40, 90, 180]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_returns_still_image_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 120, 90);
        let mut reader = ImageFileReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!(meta.width, 120);
        assert_eq!(meta.height, 90);
        assert_eq!(meta.fps, 0.0);
        assert_eq!(meta.total_frames, 1);
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let mut reader = ImageFileReader::new();
        let result = reader.open(Path::new("/nonexistent/test.png"));
        assert!(matches!(result, Err(MediaError::Open { .. })));
    }

    #[test]
    fn test_frames_yields_single_rgb_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 50, 40);
        let mut reader = ImageFileReader::new();
        reader.open(&path).unwrap();

        let frames: Vec<_> = reader.frames().collect();
        assert_eq!(frames.len(), 1);
        let frame = frames.into_iter().next().unwrap().unwrap();
        assert_eq!(frame.index(), 0);
        assert_eq!(frame.width(), 50);
        assert_eq!(frame.height(), 40);
        assert_eq!(frame.pixel(0, 0), [40, 90, 180]);
    }

    #[test]
    fn test_frames_without_open_yields_not_open() {
        let mut reader = ImageFileReader::new();
        let first = reader.frames().next().unwrap();
        assert!(matches!(first, Err(MediaError::NotOpen)));
    }

    #[test]
    fn test_frames_exhausted_after_first_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 10, 10);
        let mut reader = ImageFileReader::new();
        reader.open(&path).unwrap();

        assert_eq!(reader.frames().count(), 1);
        // The single frame was consumed; a new iterator reports not-open
        assert!(reader.frames().next().unwrap().is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 10, 10);
        let mut reader = ImageFileReader::new();
        reader.open(&path).unwrap();
        reader.close();
        reader.close();
    }
}
