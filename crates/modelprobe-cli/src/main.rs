use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use modelprobe_backend_ort::OrtEngine;
use modelprobe_cli::cli::{Cli, Command};
use modelprobe_cli::{assets, runner::SampleRunner};
use modelprobe_core::{Device, Engine, EngineSession, ModelArtifact, SessionConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            model,
            input,
            log,
            device,
            log_id,
        } => {
            init_logging(&log);
            let config = session_config(&device, &log_id)?;
            run(model, input, config)
        }
        Command::Inspect {
            model,
            log,
            device,
            log_id,
        } => {
            init_logging(&log);
            let config = session_config(&device, &log_id)?;
            inspect(model, config)
        }
    }
}

fn run(model: Option<PathBuf>, input: Option<PathBuf>, config: SessionConfig) -> Result<()> {
    let model_bytes = match model {
        Some(path) => Bytes::from(
            std::fs::read(&path)
                .with_context(|| format!("failed to read model {}", path.display()))?,
        ),
        None => assets::packaged_model(),
    };

    let input_values = match input {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read input {}", path.display()))?;
            assets::parse_tensor_text(&text)?
        }
        None => assets::packaged_input()?,
    };

    let mut runner = SampleRunner::with_artifacts(model_bytes, input_values, Some(config))?;
    runner.execute()?;
    runner.dispose();
    Ok(())
}

fn inspect(model: Option<PathBuf>, config: SessionConfig) -> Result<()> {
    let artifact = match model {
        Some(path) => ModelArtifact::OnnxPath(path),
        None => ModelArtifact::OnnxBytes(assets::packaged_model()),
    };

    let session = OrtEngine::new().load(&artifact, &config)?;
    let spec = session.spec();
    for s in &spec.inputs {
        println!("input   {}  {}  {}", s.name, s.dtype, format_dims(&s.dims));
    }
    for s in &spec.outputs {
        println!("output  {}  {}  {}", s.name, s.dtype, format_dims(&s.dims));
    }
    Ok(())
}

fn format_dims(dims: &[Option<usize>]) -> String {
    let parts: Vec<String> = dims
        .iter()
        .map(|d| match d {
            Some(v) => v.to_string(),
            None => "dyn".to_string(),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}

fn init_logging(log: &str) {
    std::env::set_var("RUST_LOG", log);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

fn session_config(device: &str, log_id: &str) -> Result<SessionConfig> {
    let device = parse_device(device)?;
    Ok(SessionConfig::default()
        .with_log_id(log_id)
        .with_providers(vec![device]))
}

fn parse_device(raw: &str) -> Result<Device> {
    if raw.eq_ignore_ascii_case("cpu") {
        return Ok(Device::Cpu);
    }

    if let Some(rest) = raw.strip_prefix("cuda:") {
        let device_id: u32 = rest.parse().context("invalid cuda device id")?;
        return Ok(Device::Cuda { device_id });
    }

    anyhow::bail!("unsupported device: {raw} (expected cpu or cuda:N)");
}
