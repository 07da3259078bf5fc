use std::sync::Arc;

/// Face bounding box as `(x1, y1, x2, y2)` pixel coordinates.
///
/// Invariant: `x1 < x2` and `y1 < y2`. Coordinates may be negative or exceed
/// frame bounds when the detector extrapolates; callers must go through
/// [`BoundingBox::clamped`] before touching pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Bounding box clamped to a frame, in whole pixels. Guaranteed non-empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        debug_assert!(x1 < x2 && y1 < y2, "bounding box must have positive area");
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Intersection of the box with a `frame_width` x `frame_height` frame,
    /// or `None` when the box lies entirely outside it.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
        let x1 = self.x1.floor().max(0.0) as u32;
        let y1 = self.y1.floor().max(0.0) as u32;
        let x2 = (self.x2.ceil().max(0.0) as u32).min(frame_width);
        let y2 = (self.y2.ceil().max(0.0) as u32).min(frame_height);
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(PixelRect {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        })
    }
}

/// Opaque identity handle produced by the detector's recognition head and
/// consumed read-only by the compositor. Cloning shares the underlying
/// vector; the contents are never mutated after detection.
#[derive(Clone, Debug)]
pub struct FaceEmbedding(Arc<[f32]>);

impl FaceEmbedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values.into())
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// One detected face, tied to the coordinate space of the frame it was
/// detected in. A record from frame N is invalid input for frame N+1.
///
/// Records are immutable value objects created fresh per detection call and
/// discarded once the frame's compositing is done; nothing caches them across
/// frames.
#[derive(Clone, Debug)]
pub struct FaceRecord {
    bbox: BoundingBox,
    landmarks: Option<Vec<(f32, f32)>>,
    detection_score: f32,
    age: Option<u32>,
    gender: Option<Gender>,
    embedding: FaceEmbedding,
}

impl FaceRecord {
    pub fn new(
        bbox: BoundingBox,
        landmarks: Option<Vec<(f32, f32)>>,
        detection_score: f32,
        age: Option<u32>,
        gender: Option<Gender>,
        embedding: FaceEmbedding,
    ) -> Self {
        Self {
            bbox,
            landmarks,
            detection_score,
            age,
            gender,
            embedding,
        }
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn landmarks(&self) -> Option<&[(f32, f32)]> {
        self.landmarks.as_deref()
    }

    pub fn detection_score(&self) -> f32 {
        self.detection_score
    }

    pub fn age(&self) -> Option<u32> {
        self.age
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn embedding(&self) -> &FaceEmbedding {
        &self.embedding
    }
}
