use bytes::Bytes;

/// Where the serialized model comes from.
#[derive(Clone, Debug)]
pub enum ModelArtifact {
    /// In-memory ONNX graph, e.g. an embedded resource.
    OnnxBytes(Bytes),
    /// ONNX file on disk.
    OnnxPath(std::path::PathBuf),
}
