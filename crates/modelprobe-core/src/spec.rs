use crate::DType;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IoName(pub String);

impl IoName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for IoName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declared type and shape of one model input or output.
#[derive(Clone, Debug)]
pub struct TensorSpec {
    pub name: IoName,
    pub dtype: DType,
    pub dims: Vec<Option<usize>>, // None = dynamic
}

impl TensorSpec {
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Concrete per-run shape: dynamic dimensions collapse to 1.
    pub fn resolved_dims(&self) -> Vec<usize> {
        self.dims.iter().map(|d| d.unwrap_or(1)).collect()
    }
}

/// Ordered input/output metadata as the engine declares it.
#[derive(Clone, Debug)]
pub struct ModelSpec {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}

impl ModelSpec {
    pub fn input_names(&self) -> Vec<IoName> {
        self.inputs.iter().map(|spec| spec.name.clone()).collect()
    }

    pub fn output_names(&self) -> Vec<IoName> {
        self.outputs.iter().map(|spec| spec.name.clone()).collect()
    }
}
