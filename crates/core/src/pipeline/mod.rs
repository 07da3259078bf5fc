pub mod face_selector;
pub mod frame_swap_engine;
pub mod inspect_faces_use_case;
pub mod swap_image_use_case;
pub mod swap_video_use_case;

use thiserror::Error;

use crate::detection::domain::face_detector::DetectionError;
use crate::pipeline::face_selector::SelectionError;
use crate::video::domain::media_error::MediaError;

/// Run-fatal pipeline failures. Per-face composite failures are not
/// represented here: they are tolerated inside the frame loop and never
/// abort a run.
#[derive(Error, Debug)]
pub enum SwapError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("input contains no frames")]
    EmptyInput,
    #[error("run cancelled")]
    Cancelled,
    #[error("pipeline already executed")]
    AlreadyExecuted,
}
