use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::media_error::MediaError;

/// Writes frames to an output video stream.
///
/// `open` must be given the input's metadata so the output stream carries
/// identical width, height, and frame rate. `close` flushes the encoder and
/// finalizes the container; skipping it leaves a corrupt file.
pub trait VideoWriter: Send {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), MediaError>;

    fn write(&mut self, frame: &Frame) -> Result<(), MediaError>;

    fn close(&mut self) -> Result<(), MediaError>;
}
