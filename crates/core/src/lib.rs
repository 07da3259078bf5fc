//! Core library for swapping a reference face onto faces detected in
//! images and videos.
//!
//! Layout follows bounded contexts: `detection` and `compositing` wrap the
//! external ONNX models behind domain traits, `video` owns media I/O,
//! `pipeline` holds the per-frame engine and the use cases that wire
//! everything together, and `diagnostics` renders detection output for
//! humans.

pub mod compositing;
pub mod detection;
pub mod diagnostics;
pub mod pipeline;
pub mod shared;
pub mod video;
