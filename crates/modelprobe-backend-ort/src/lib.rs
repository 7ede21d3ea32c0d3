use std::sync::OnceLock;

use anyhow::{bail, ensure, Context, Result};
use bytes::Bytes;
use modelprobe_core::{
    f32s_to_le_bytes, i32s_to_le_bytes, i64s_to_le_bytes, DType, Device, Engine, EngineSession,
    IoName, ModelArtifact, ModelSpec, SessionConfig, Shape, Tensor, TensorSpec,
};
use ort::{
    session::{builder::SessionBuilder, Session, SessionInputValue},
    tensor::TensorElementType,
    value::{DynValue, ValueType},
};
use tracing::debug;

pub struct OrtEngine;

impl OrtEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrtEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A loaded, execution-ready model. Construction is the expensive step;
/// `run` may be called repeatedly on the same session.
pub struct OrtSession {
    spec: ModelSpec,
    session: Session,
}

impl Engine for OrtEngine {
    type Session = OrtSession;

    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn load(&self, artifact: &ModelArtifact, config: &SessionConfig) -> Result<Self::Session> {
        init_environment(&config.log_id)?;

        let builder = Session::builder()
            .context("failed to create ORT session builder")?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .context("failed to configure ORT session builder")?;

        let builder = register_providers(builder, &config.providers)?;

        let session = match artifact {
            ModelArtifact::OnnxBytes(bytes) => builder
                .commit_from_memory(bytes)
                .context("failed to load ONNX model from memory")?,
            ModelArtifact::OnnxPath(path) => builder
                .commit_from_file(path)
                .with_context(|| format!("failed to load ONNX model from {}", path.display()))?,
        };

        let spec = model_spec(&session)?;
        debug!(
            inputs = spec.inputs.len(),
            outputs = spec.outputs.len(),
            "ORT session ready"
        );

        Ok(OrtSession { spec, session })
    }
}

impl EngineSession for OrtSession {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn run(
        &mut self,
        inputs: Vec<(IoName, Tensor)>,
        output_names: &[IoName],
    ) -> Result<Vec<(IoName, Tensor)>> {
        ensure!(
            inputs.len() == self.spec.inputs.len(),
            "expected {} inputs, got {}",
            self.spec.inputs.len(),
            inputs.len()
        );

        let mut ort_inputs = Vec::with_capacity(inputs.len());
        for (name, tensor) in inputs {
            let value = tensor_to_value(&tensor)
                .with_context(|| format!("failed to bind input `{name}`"))?;
            ort_inputs.push((name.0, SessionInputValue::from(value)));
        }

        let results = self.session.run(ort_inputs)?;

        let mut produced = Vec::with_capacity(results.len());
        for (name, value) in results.iter() {
            produced.push((name.to_string(), value_to_tensor(&value)?));
        }

        let mut ordered = Vec::with_capacity(output_names.len());
        for wanted in output_names {
            let pos = produced
                .iter()
                .position(|(name, _)| name == &wanted.0)
                .with_context(|| format!("engine produced no output named `{wanted}`"))?;
            let (_, tensor) = produced.swap_remove(pos);
            ordered.push((wanted.clone(), tensor));
        }

        Ok(ordered)
    }
}

// The engine keeps one process-wide environment; the first session's
// diagnostic id names it.
fn init_environment(log_id: &str) -> Result<()> {
    static ENV: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    ENV.get_or_init(|| {
        ort::init()
            .with_name(log_id)
            .commit()
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
    .as_ref()
    .map_err(|e| anyhow::anyhow!("failed to initialize ORT environment: {e}"))?;
    Ok(())
}

fn register_providers(mut builder: SessionBuilder, providers: &[Device]) -> Result<SessionBuilder> {
    for device in providers {
        builder = match device {
            // CPU is registered by the engine itself.
            Device::Cpu => builder,
            Device::Cuda { device_id } => register_cuda(builder, *device_id)?,
        };
    }
    Ok(builder)
}

fn register_cuda(builder: SessionBuilder, device_id: u32) -> Result<SessionBuilder> {
    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::cuda::CUDAExecutionProvider;
        let ep = CUDAExecutionProvider::default()
            .with_device_id(device_id as i32)
            .build();
        builder
            .with_execution_providers([ep])
            .context("failed to enable ORT CUDA execution provider")
    }
    #[cfg(not(feature = "cuda"))]
    {
        let _ = (builder, device_id);
        bail!("CUDA requested but modelprobe-backend-ort was built without the `cuda` feature")
    }
}

fn model_spec(session: &Session) -> Result<ModelSpec> {
    let inputs = session
        .inputs
        .iter()
        .map(|input| tensor_spec(&input.name, &input.input_type))
        .collect::<Result<Vec<_>>>()?;

    let outputs = session
        .outputs
        .iter()
        .map(|output| tensor_spec(&output.name, &output.output_type))
        .collect::<Result<Vec<_>>>()?;

    Ok(ModelSpec { inputs, outputs })
}

fn tensor_spec(name: &str, value_type: &ValueType) -> Result<TensorSpec> {
    let ValueType::Tensor { ty, shape, .. } = value_type else {
        bail!("unsupported non-tensor IO value type for `{name}`");
    };

    let dtype = element_to_dtype(*ty)?;
    let dims = shape
        .iter()
        .map(|d| if *d < 0 { None } else { Some(*d as usize) })
        .collect();

    Ok(TensorSpec {
        name: IoName::new(name),
        dtype,
        dims,
    })
}

fn element_to_dtype(ty: TensorElementType) -> Result<DType> {
    match ty {
        TensorElementType::Float32 => Ok(DType::F32),
        TensorElementType::Int64 => Ok(DType::I64),
        TensorElementType::Int32 => Ok(DType::I32),
        TensorElementType::Uint8 => Ok(DType::U8),
        _ => bail!("unsupported tensor element type: {ty}"),
    }
}

fn tensor_to_value(tensor: &Tensor) -> Result<DynValue> {
    let expected = tensor.numel() * tensor.dtype.byte_size();
    ensure!(
        tensor.data.len() == expected,
        "input byte size mismatch: got {}, expected {}",
        tensor.data.len(),
        expected
    );

    let shape: Vec<usize> = tensor.shape.0.iter().copied().collect();
    let value = match tensor.dtype {
        DType::F32 => ort::value::Tensor::from_array((shape, tensor.as_f32s()?))?.into_dyn(),
        DType::I64 => ort::value::Tensor::from_array((shape, tensor.as_i64s()?))?.into_dyn(),
        DType::I32 => ort::value::Tensor::from_array((shape, tensor.as_i32s()?))?.into_dyn(),
        DType::U8 => ort::value::Tensor::from_array((shape, tensor.as_u8s()?))?.into_dyn(),
    };

    Ok(value)
}

fn value_to_tensor(value: &ort::value::ValueRef<'_>) -> Result<Tensor> {
    let ValueType::Tensor { ty, shape, .. } = value.dtype() else {
        bail!("non-tensor outputs are not supported");
    };

    let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
    let shape = Shape::from_slice(&dims);

    let (dtype, data) = match *ty {
        TensorElementType::Float32 => {
            let array = value.try_extract_array::<f32>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            (DType::F32, f32s_to_le_bytes(slice))
        }
        TensorElementType::Int64 => {
            let array = value.try_extract_array::<i64>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            (DType::I64, i64s_to_le_bytes(slice))
        }
        TensorElementType::Int32 => {
            let array = value.try_extract_array::<i32>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            (DType::I32, i32s_to_le_bytes(slice))
        }
        TensorElementType::Uint8 => {
            let array = value.try_extract_array::<u8>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            (DType::U8, Bytes::copy_from_slice(slice))
        }
        _ => bail!("unsupported output tensor element type: {ty}"),
    };

    Tensor::from_bytes(dtype, shape, data)
}
