use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "modelprobe", version, about = "Inference engine client API sample")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a model, run it once over the sample input, print the outputs
    Run {
        /// Path to an ONNX model (defaults to the packaged identity model)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Path to a tensor text file: label line, then comma-delimited floats
        #[arg(long)]
        input: Option<PathBuf>,

        /// Log level (RUST_LOG)
        #[arg(long, default_value = "info")]
        log: String,

        /// Device for inference (cpu or cuda:N)
        #[arg(long, default_value = "cpu")]
        device: String,

        /// Diagnostic id attached to engine logs
        #[arg(long, default_value = "sample")]
        log_id: String,
    },

    /// Print the declared inputs and outputs of a model
    Inspect {
        /// Path to an ONNX model (defaults to the packaged identity model)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Log level (RUST_LOG)
        #[arg(long, default_value = "info")]
        log: String,

        /// Device for inference (cpu or cuda:N)
        #[arg(long, default_value = "cpu")]
        device: String,

        /// Diagnostic id attached to engine logs
        #[arg(long, default_value = "sample")]
        log_id: String,
    },
}
