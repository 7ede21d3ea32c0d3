use std::io::Write;

use anyhow::{ensure, Context, Result};
use bytes::Bytes;
use modelprobe_backend_ort::{OrtEngine, OrtSession};
use modelprobe_core::{
    text, DType, Engine, EngineSession, IoName, ModelArtifact, PinnedBuffer, SessionConfig, Shape,
    Tensor,
};
use tracing::{debug, info};

use crate::assets;

/// The end-to-end sample: load → configure → run → print → release.
///
/// Holds the model bytes for the process lifetime, the pinned input buffer,
/// one view per declared model input, and the engine session. Everything is
/// released in reverse-acquisition order by [`SampleRunner::dispose`].
pub struct SampleRunner {
    model: Bytes,
    pinned: Option<PinnedBuffer>,
    session: Option<OrtSession>,
    inputs: Vec<(IoName, Tensor)>,
    output_names: Vec<IoName>,
    disposed: bool,
}

impl SampleRunner {
    /// Load the packaged model and sample input, pin the input buffer, build
    /// a default session, and bind one view per declared input.
    pub fn initialize() -> Result<Self> {
        Self::with_artifacts(assets::packaged_model(), assets::packaged_input()?, None)
    }

    /// Same as [`SampleRunner::initialize`], over caller-supplied artifacts.
    pub fn with_artifacts(
        model: Bytes,
        input_values: Vec<f32>,
        config: Option<SessionConfig>,
    ) -> Result<Self> {
        info!(
            model_bytes = model.len(),
            input_elements = input_values.len(),
            "sample artifacts loaded"
        );

        let mut runner = Self {
            model,
            pinned: Some(PinnedBuffer::from_f32s(&input_values)),
            session: None,
            inputs: Vec::new(),
            output_names: Vec::new(),
            disposed: false,
        };
        runner.create_session(config)?;
        runner.bind_inputs()?;
        Ok(runner)
    }

    /// (Re)build the session over the loaded model bytes. Construction is
    /// the expensive step; the session may be run any number of times.
    pub fn create_session(&mut self, config: Option<SessionConfig>) -> Result<()> {
        ensure!(!self.disposed, "runner already disposed");
        let config = config.unwrap_or_default();
        let session = OrtEngine::new().load(&ModelArtifact::OnnxBytes(self.model.clone()), &config)?;
        self.output_names = session.spec().output_names();
        self.session = Some(session);
        Ok(())
    }

    // One view per declared input, sized by the session metadata. A shape
    // wider than the packaged buffer is a packaging bug and fails here.
    fn bind_inputs(&mut self) -> Result<()> {
        let session = self.session.as_ref().context("session not created")?;
        let pinned = self.pinned.as_ref().context("input buffer released")?;

        let mut inputs = Vec::with_capacity(session.spec().inputs.len());
        for spec in &session.spec().inputs {
            ensure!(
                spec.dtype == DType::F32,
                "sample input buffer is f32 but model input `{}` wants {}",
                spec.name,
                spec.dtype
            );
            let shape = Shape::from_slice(&spec.resolved_dims());
            let view = pinned.view(shape)?;
            debug!(input = %spec.name, elements = view.numel(), "bound input view");
            inputs.push((spec.name.clone(), view));
        }
        self.inputs = inputs;
        Ok(())
    }

    /// Run once, returning one output per declared output name, in declared
    /// order.
    pub fn run_once(&mut self) -> Result<Vec<(IoName, Tensor)>> {
        ensure!(!self.disposed, "runner already disposed");
        let session = self.session.as_mut().context("session not created")?;
        let output_names = self.output_names.clone();
        session.run(self.inputs.clone(), &output_names)
    }

    /// Run once and print every output as dimension-shaped text.
    pub fn execute(&mut self) -> Result<()> {
        let stdout = std::io::stdout();
        self.execute_into(&mut stdout.lock())
    }

    /// The output collection is scoped to this call; it is released even
    /// when writing fails midway.
    pub fn execute_into(&mut self, out: &mut dyn Write) -> Result<()> {
        let outputs = self.run_once()?;
        for (name, tensor) in &outputs {
            writeln!(out, "Output for {name}")?;
            writeln!(out, "{}", text::shaped_string(tensor)?)?;
        }
        Ok(())
    }

    pub fn model_bytes(&self) -> &Bytes {
        &self.model
    }

    pub fn input_views(&self) -> &[(IoName, Tensor)] {
        &self.inputs
    }

    pub fn output_names(&self) -> &[IoName] {
        &self.output_names
    }

    /// Release the session, the input views, and the pinned buffer, in
    /// reverse acquisition order. A second call is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.inputs.clear();
        self.session = None;
        self.pinned = None;
        self.disposed = true;
        debug!("sample runner disposed");
    }
}

impl Drop for SampleRunner {
    fn drop(&mut self) {
        self.dispose();
    }
}
