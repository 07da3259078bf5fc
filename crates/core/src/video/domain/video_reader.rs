use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::media_error::MediaError;

/// Reads frames from a video or image source.
///
/// Implementations own the I/O details (container, codec, pixel format); the
/// pipeline only sees [`Frame`]s and [`VideoMetadata`]. Still images are
/// served as one-frame streams so images and videos flow through the same
/// orchestration code.
pub trait VideoReader: Send {
    /// Opens the source and captures its stream properties.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, MediaError>;

    /// Iterator over frames in decode order. The stream ending is signalled
    /// by the iterator finishing, not by an error.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, MediaError>> + '_>;

    /// Releases the input handle. Safe to call more than once.
    fn close(&mut self);
}
