pub mod onnx_inswapper;
