pub mod annotator;
pub mod face_info;
