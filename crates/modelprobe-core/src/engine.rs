use anyhow::Result;

use crate::{IoName, ModelArtifact, ModelSpec, SessionConfig, Tensor};

/// Client seam to the external inference engine.
///
/// The engine owns graph execution, operator kernels, and memory planning;
/// this crate only describes what crosses the boundary.
pub trait Engine: Send + Sync + 'static {
    type Session: EngineSession;

    fn name(&self) -> &'static str;
    fn load(&self, artifact: &ModelArtifact, config: &SessionConfig) -> Result<Self::Session>;
}

pub trait EngineSession: Send + 'static {
    fn spec(&self) -> &ModelSpec;

    /// Run the graph once. Outputs come back in `output_names` order; a
    /// requested name the engine did not produce is an error.
    fn run(
        &mut self,
        inputs: Vec<(IoName, Tensor)>,
        output_names: &[IoName],
    ) -> Result<Vec<(IoName, Tensor)>>;
}
