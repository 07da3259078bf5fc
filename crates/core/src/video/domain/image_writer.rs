use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::media_error::MediaError;

/// Writes a single frame to an image file.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), MediaError>;
}
