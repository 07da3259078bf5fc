/// File extensions treated as still images rather than videos.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Face detection model (bounding boxes + 5-point landmarks).
pub const DETECTION_MODEL_NAME: &str = "scrfd_10g_bnkps.onnx";
pub const DETECTION_MODEL_URL: &str =
    "https://huggingface.co/facefusion/models/resolve/main/scrfd_10g_bnkps.onnx";

/// Face recognition model producing the 512-dim identity embedding.
pub const RECOGNITION_MODEL_NAME: &str = "arcface_w600k_r50.onnx";
pub const RECOGNITION_MODEL_URL: &str =
    "https://huggingface.co/facefusion/models/resolve/main/arcface_w600k_r50.onnx";

/// Age/gender attribute model. Optional: diagnostics only.
pub const ATTRIBUTE_MODEL_NAME: &str = "genderage.onnx";
pub const ATTRIBUTE_MODEL_URL: &str =
    "https://huggingface.co/facefusion/models/resolve/main/genderage.onnx";

/// Face swap compositing model.
pub const SWAPPER_MODEL_NAME: &str = "inswapper_128.onnx";
pub const SWAPPER_MODEL_URL: &str =
    "https://huggingface.co/facefusion/models/resolve/main/inswapper_128.onnx";

/// Default detection confidence threshold.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;
