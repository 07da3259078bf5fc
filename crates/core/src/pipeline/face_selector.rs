use thiserror::Error;

use crate::detection::domain::face_record::FaceRecord;

#[derive(Error, Debug)]
pub enum SelectionError {
    /// The reference image has zero detected faces. Fatal for the whole
    /// run: nothing can be swapped without a source identity.
    #[error("no face detected in the reference image")]
    NoSourceFace,
    #[error("source face index {index} out of range ({available} face(s) detected)")]
    SourceIndexOutOfRange { index: usize, available: usize },
}

/// Which faces in a frame get replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetSelection {
    /// Every detected face, in detector-returned order.
    All,
    /// The face at this index. A frame with fewer faces is passed through
    /// unmodified; the condition is per-frame recoverable, never fatal.
    Single(usize),
}

/// Picks the source face from the reference image's detections.
///
/// Checked once per run, before any video I/O. Both failure modes are
/// run-fatal.
pub fn select_source(faces: &[FaceRecord], index: usize) -> Result<&FaceRecord, SelectionError> {
    if faces.is_empty() {
        return Err(SelectionError::NoSourceFace);
    }
    faces.get(index).ok_or(SelectionError::SourceIndexOutOfRange {
        index,
        available: faces.len(),
    })
}

/// Picks the target faces for the current frame.
///
/// Face counts legitimately vary frame to frame (people entering and leaving
/// view), so an out-of-range `Single` index yields an empty selection rather
/// than an error.
pub fn select_targets(faces: &[FaceRecord], selection: TargetSelection) -> Vec<&FaceRecord> {
    match selection {
        TargetSelection::All => faces.iter().collect(),
        TargetSelection::Single(index) => faces.get(index).into_iter().collect(),
    }
}
