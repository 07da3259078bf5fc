//! ONNX-backed face swap compositor.
//!
//! The model takes a normalized crop of the target face plus the source
//! identity embedding and returns the re-rendered face. This wrapper owns
//! the crop/resize/paste-back choreography; blending quality is the model's
//! concern.
use std::path::Path;

use crate::compositing::domain::face_compositor::{CompositeError, FaceCompositor};
use crate::detection::domain::face_record::{FaceRecord, PixelRect};
use crate::shared::frame::Frame;

/// Swap model input resolution (square face crop).
const SWAP_INPUT_SIZE: u32 = 128;

pub struct OnnxInswapper {
    session: ort::session::Session,
}

impl OnnxInswapper {
    /// Loads the swap model session. Failure is a fatal startup error.
    pub fn new(model_path: &Path) -> Result<Self, CompositeError> {
        let session = ort::session::Session::builder()
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| {
                CompositeError::ModelNotLoaded(format!("{}: {e}", model_path.display()))
            })?;
        Ok(Self { session })
    }

    fn run_swap(
        &mut self,
        target_chip: ndarray::Array4<f32>,
        source_embedding: ndarray::Array2<f32>,
    ) -> Result<Vec<f32>, CompositeError> {
        let target_tensor = ort::value::Tensor::from_array(target_chip)
            .map_err(|e| CompositeError::Inference(e.to_string()))?;
        let source_tensor = ort::value::Tensor::from_array(source_embedding)
            .map_err(|e| CompositeError::Inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs!["target" => target_tensor, "source" => source_tensor])
            .map_err(|e| CompositeError::Inference(e.to_string()))?;

        let tensor = outputs["output"]
            .try_extract_array::<f32>()
            .map_err(|e| CompositeError::Inference(e.to_string()))?;
        if tensor.len() != (3 * SWAP_INPUT_SIZE * SWAP_INPUT_SIZE) as usize {
            return Err(CompositeError::Inference(format!(
                "unexpected swap output shape {:?}",
                tensor.shape()
            )));
        }
        Ok(tensor.iter().copied().collect())
    }
}

impl FaceCompositor for OnnxInswapper {
    fn composite(
        &mut self,
        frame: &Frame,
        target: &FaceRecord,
        source: &FaceRecord,
    ) -> Result<Frame, CompositeError> {
        let rect = target
            .bbox()
            .clamped(frame.width(), frame.height())
            .ok_or(CompositeError::EmptyTargetRegion)?;

        let chip = crop_chip(frame, rect);
        let target_input = chip_to_nchw(&chip);

        let embedding = source.embedding().as_slice();
        let source_input =
            ndarray::Array2::from_shape_vec((1, embedding.len()), embedding.to_vec())
                .map_err(|e| CompositeError::Inference(e.to_string()))?;

        let output = self.run_swap(target_input, source_input)?;
        let rendered = nchw_to_chip(&output, SWAP_INPUT_SIZE);

        Ok(paste_chip(frame, rect, &rendered))
    }
}

/// Crops the clamped face region and resizes it to the model input size.
fn crop_chip(frame: &Frame, rect: PixelRect) -> image::RgbImage {
    let mut crop = image::RgbImage::new(rect.width, rect.height);
    for dy in 0..rect.height {
        for dx in 0..rect.width {
            crop.put_pixel(dx, dy, image::Rgb(frame.pixel(rect.x + dx, rect.y + dy)));
        }
    }
    image::imageops::resize(
        &crop,
        SWAP_INPUT_SIZE,
        SWAP_INPUT_SIZE,
        image::imageops::FilterType::Triangle,
    )
}

/// NCHW float input in `[0, 1]`.
fn chip_to_nchw(chip: &image::RgbImage) -> ndarray::Array4<f32> {
    let size = SWAP_INPUT_SIZE as usize;
    let mut input = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in chip.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] = pixel.0[c] as f32 / 255.0;
        }
    }
    input
}

/// Converts model output back to an image, denormalizing against the
/// output's own dynamic range so slight over/undershoot doesn't clip
/// to gray.
fn nchw_to_chip(data: &[f32], size: u32) -> image::RgbImage {
    let min = data.iter().copied().fold(f32::INFINITY, f32::min);
    let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = if (max - min).abs() < 1e-6 { 1.0 } else { max - min };

    let s = size as usize;
    let mut img = image::RgbImage::new(size, size);
    for y in 0..s {
        for x in 0..s {
            let mut rgb = [0u8; 3];
            for (c, channel) in rgb.iter_mut().enumerate() {
                let v = data[c * s * s + y * s + x];
                *channel = (((v - min) / range) * 255.0).round().clamp(0.0, 255.0) as u8;
            }
            img.put_pixel(x as u32, y as u32, image::Rgb(rgb));
        }
    }
    img
}

/// Resizes the rendered chip back to the face region and writes it into a
/// copy of the frame. Pixels outside the region are untouched.
fn paste_chip(frame: &Frame, rect: PixelRect, chip: &image::RgbImage) -> Frame {
    let resized = image::imageops::resize(
        chip,
        rect.width,
        rect.height,
        image::imageops::FilterType::Triangle,
    );

    let mut out = frame.clone();
    for (dx, dy, pixel) in resized.enumerate_pixels() {
        out.put_pixel(rect.x + dx, rect.y + dy, pixel.0);
    }
    out
}
