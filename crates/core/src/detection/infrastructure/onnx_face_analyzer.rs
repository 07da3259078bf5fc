//! ONNX-backed face analyzer: detection, identity embedding, and optional
//! age/gender attributes.
//!
//! Handles letterbox preprocessing, inference, NMS post-processing, and
//! per-face embedding extraction; the domain layer only ever sees
//! [`FaceRecord`]s.
use std::path::Path;

use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::face_record::{
    BoundingBox, FaceEmbedding, FaceRecord, Gender, PixelRect,
};
use crate::shared::frame::Frame;

/// Fallback detection input resolution when the model doesn't specify one.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Recognition head input resolution (square face chip).
const RECOGNITION_INPUT_SIZE: u32 = 112;

/// Attribute head input resolution.
const ATTRIBUTE_INPUT_SIZE: u32 = 96;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.4;

/// Detection row layout: bbox corners, score, then five landmark points.
const ROW_FEATURES: usize = 15;

/// Face analyzer backed by ONNX Runtime sessions.
///
/// The detection head emits bounding boxes with 5-point landmarks; the
/// recognition head turns each face chip into the identity embedding the
/// compositor consumes. The attribute head is diagnostics-only and optional.
pub struct OnnxFaceAnalyzer {
    detection: ort::session::Session,
    recognition: ort::session::Session,
    attributes: Option<ort::session::Session>,
    confidence: f32,
    input_size: u32,
}

impl OnnxFaceAnalyzer {
    /// Loads all sessions up front. Any failure here is a fatal startup
    /// error; nothing is loaded lazily mid-pipeline.
    pub fn new(
        detection_model: &Path,
        recognition_model: &Path,
        attribute_model: Option<&Path>,
        confidence: f32,
    ) -> Result<Self, DetectionError> {
        let detection = load_session(detection_model)?;
        let recognition = load_session(recognition_model)?;
        let attributes = attribute_model.map(load_session).transpose()?;

        // Read the detection input size from the model's NCHW shape,
        // falling back when it is dynamic.
        let input_size = detection
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            detection,
            recognition,
            attributes,
            confidence,
            input_size,
        })
    }

    fn embed(&mut self, frame: &Frame, rect: PixelRect) -> Result<FaceEmbedding, DetectionError> {
        let chip = crop_to_image(frame, rect);
        let input = to_nchw(&chip, RECOGNITION_INPUT_SIZE, 127.5, 127.5);
        let input_value = ort::value::Tensor::from_array(input)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let outputs = self
            .recognition
            .run(ort::inputs![input_value])
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let mut values: Vec<f32> = tensor.iter().copied().collect();
        l2_normalize(&mut values);
        Ok(FaceEmbedding::new(values))
    }

    fn infer_attributes(
        &mut self,
        frame: &Frame,
        rect: PixelRect,
    ) -> Result<(Option<u32>, Option<Gender>), DetectionError> {
        let Some(session) = self.attributes.as_mut() else {
            return Ok((None, None));
        };

        let chip = crop_to_image(frame, rect);
        let input = to_nchw(&chip, ATTRIBUTE_INPUT_SIZE, 0.0, 1.0);
        let input_value = ort::value::Tensor::from_array(input)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        // Output layout: [female_logit, male_logit, age / 100]
        let values: Vec<f32> = tensor.iter().copied().collect();
        if values.len() < 3 {
            return Ok((None, None));
        }
        let gender = if values[1] > values[0] {
            Gender::Male
        } else {
            Gender::Female
        };
        let age = (values[2] * 100.0).round().clamp(0.0, 150.0) as u32;
        Ok((Some(age), Some(gender)))
    }
}

impl FaceDetector for OnnxFaceAnalyzer {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRecord>, DetectionError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectionError::InvalidImage("empty frame".into()));
        }

        // 1. Preprocess: letterbox + normalize → NCHW float32
        let (input, scale, pad_x, pad_y) = letterbox(frame, self.input_size);
        let input_value = ort::value::Tensor::from_array(input)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        // 2. Inference. The outputs borrow the session, so copy them out
        // before the recognition head runs.
        let (shape, data) = {
            let outputs = self
                .detection
                .run(ort::inputs![input_value])
                .map_err(|e| DetectionError::Inference(e.to_string()))?;
            if outputs.len() == 0 {
                return Err(DetectionError::Inference(
                    "detection model produced no outputs".into(),
                ));
            }
            let tensor = outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| DetectionError::Inference(e.to_string()))?;
            (
                tensor.shape().to_vec(),
                tensor.iter().copied().collect::<Vec<f32>>(),
            )
        };

        // 3. Parse rows back into frame coordinates
        let rows = detection_rows(&shape, &data)
            .ok_or_else(|| DetectionError::Inference(format!("unexpected output shape {shape:?}")))?;
        let mut raw: Vec<RawDetection> = rows
            .filter_map(|row| parse_row(&row, self.confidence, scale, pad_x, pad_y))
            .collect();

        // 4. NMS
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        // 5. Per-face embedding + attributes
        let mut records = Vec::with_capacity(kept.len());
        for det in kept {
            let bbox = BoundingBox::new(det.x1, det.y1, det.x2, det.y2);
            let Some(rect) = bbox.clamped(frame.width(), frame.height()) else {
                continue;
            };
            let embedding = self.embed(frame, rect)?;
            let (age, gender) = self.infer_attributes(frame, rect)?;
            records.push(FaceRecord::new(
                bbox,
                Some(det.landmarks.to_vec()),
                det.score,
                age,
                gender,
                embedding,
            ));
        }

        Ok(records)
    }
}

fn load_session(path: &Path) -> Result<ort::session::Session, DetectionError> {
    ort::session::Session::builder()
        .and_then(|mut b| b.commit_from_file(path))
        .map_err(|e| {
            DetectionError::ModelNotLoaded(format!("{}: {e}", path.display()))
        })
}

struct RawDetection {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    landmarks: [(f32, f32); 5],
}

/// Letterbox the frame into a square `size` x `size` canvas, preserving
/// aspect ratio, and normalize to the detection model's expected range.
///
/// Returns `(input, scale, pad_x, pad_y)`; detections map back to frame
/// coordinates via `(v - pad) / scale`.
fn letterbox(frame: &Frame, size: u32) -> (ndarray::Array4<f32>, f32, f32, f32) {
    let scale = (size as f32 / frame.width() as f32).min(size as f32 / frame.height() as f32);
    let scaled_w = ((frame.width() as f32 * scale).round() as u32).clamp(1, size);
    let scaled_h = ((frame.height() as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = ((size - scaled_w) / 2) as f32;
    let pad_y = ((size - scaled_h) / 2) as f32;

    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .expect("Frame data length must match dimensions");
    let resized =
        image::imageops::resize(&img, scaled_w, scaled_h, image::imageops::FilterType::Triangle);

    let mut input = ndarray::Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let cx = x as usize + pad_x as usize;
        let cy = y as usize + pad_y as usize;
        for c in 0..3 {
            input[[0, c, cy, cx]] = (pixel.0[c] as f32 - 127.5) / 128.0;
        }
    }
    (input, scale, pad_x, pad_y)
}

/// Iterates detection rows regardless of whether the output tensor is
/// `[1, N, F]` or the transposed `[1, F, N]`.
fn detection_rows<'a>(
    shape: &[usize],
    data: &'a [f32],
) -> Option<Box<dyn Iterator<Item = Vec<f32>> + 'a>> {
    if shape.len() != 3 {
        return None;
    }
    let (num_dets, num_feats, transposed) = if shape[1] < shape[2] {
        (shape[2], shape[1], true)
    } else {
        (shape[1], shape[2], false)
    };

    let iter = (0..num_dets).map(move |i| {
        if transposed {
            (0..num_feats).map(|f| data[f * num_dets + i]).collect()
        } else {
            data[i * num_feats..(i + 1) * num_feats].to_vec()
        }
    });
    Some(Box::new(iter))
}

/// Parses one detection row `[x1, y1, x2, y2, score, 5 x (kx, ky)]` from
/// letterbox space back to frame coordinates. Rows below the confidence
/// threshold or with degenerate geometry are dropped.
fn parse_row(
    row: &[f32],
    confidence: f32,
    scale: f32,
    pad_x: f32,
    pad_y: f32,
) -> Option<RawDetection> {
    if row.len() < ROW_FEATURES {
        return None;
    }
    let score = row[4];
    if score < confidence {
        return None;
    }

    let x1 = (row[0] - pad_x) / scale;
    let y1 = (row[1] - pad_y) / scale;
    let x2 = (row[2] - pad_x) / scale;
    let y2 = (row[3] - pad_y) / scale;
    if x1 >= x2 || y1 >= y2 {
        return None;
    }

    let mut landmarks = [(0.0f32, 0.0f32); 5];
    for (k, point) in landmarks.iter_mut().enumerate() {
        let kx = row[5 + k * 2];
        let ky = row[5 + k * 2 + 1];
        *point = ((kx - pad_x) / scale, (ky - pad_y) / scale);
    }

    Some(RawDetection {
        x1,
        y1,
        x2,
        y2,
        score,
        landmarks,
    })
}

/// Greedy NMS: sort by score descending, keep a detection only if its IoU
/// with every previously kept one stays at or below the threshold.
fn nms(detections: &mut Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<RawDetection> = Vec::with_capacity(detections.len());
    for det in detections.drain(..) {
        let dominated = kept.iter().any(|k| iou(k, &det) > iou_threshold);
        if !dominated {
            kept.push(det);
        }
    }
    kept
}

fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);

    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

fn crop_to_image(frame: &Frame, rect: PixelRect) -> image::RgbImage {
    let mut out = image::RgbImage::new(rect.width, rect.height);
    for dy in 0..rect.height {
        for dx in 0..rect.width {
            let rgb = frame.pixel(rect.x + dx, rect.y + dy);
            out.put_pixel(dx, dy, image::Rgb(rgb));
        }
    }
    out
}

/// Resizes a chip to `size` x `size` and converts to normalized NCHW:
/// `(v - mean) / std`.
fn to_nchw(chip: &image::RgbImage, size: u32, mean: f32, std: f32) -> ndarray::Array4<f32> {
    let resized = image::imageops::resize(chip, size, size, image::imageops::FilterType::Triangle);
    let mut input = ndarray::Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] = (pixel.0[c] as f32 - mean) / std;
        }
    }
    input
}

fn l2_normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in values.iter_mut() {
            *v /= norm;
        }
    }
}
