//! Packaged sample artifacts, compiled into the binary.

use anyhow::{ensure, Context, Result};
use bytes::Bytes;

const MODEL: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../models/identity.onnx"
));

const SAMPLE_INPUT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../models/bench.in"
));

pub fn packaged_model() -> Bytes {
    Bytes::from_static(MODEL)
}

pub fn packaged_input() -> Result<Vec<f32>> {
    parse_tensor_text(SAMPLE_INPUT).context("packaged sample input is malformed")
}

/// Parse a tensor text artifact: line 1 is a label, line 2 holds the values
/// delimited by commas and optional brackets.
pub fn parse_tensor_text(text: &str) -> Result<Vec<f32>> {
    let mut lines = text.lines();
    lines
        .next()
        .context("tensor text is empty, expected a label line")?;
    let data = lines.next().context("tensor text has no data line")?;

    let mut values = Vec::new();
    for piece in data.split([',', '[', ']']) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        values.push(
            piece
                .parse::<f32>()
                .with_context(|| format!("invalid tensor value `{piece}`"))?,
        );
    }
    ensure!(!values.is_empty(), "tensor text holds no values");
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_line_is_skipped() {
        let values = parse_tensor_text("data\n1.0, 2.5, -3.0\n").unwrap();
        assert_eq!(values, vec![1.0, 2.5, -3.0]);
    }

    #[test]
    fn brackets_are_delimiters() {
        let values = parse_tensor_text("data\n[[1.0, 2.0], [3.0, 4.0]]\n").unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = parse_tensor_text("data\n1.0, oops\n").unwrap_err();
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn missing_data_line_is_rejected() {
        assert!(parse_tensor_text("data\n").is_err());
        assert!(parse_tensor_text("").is_err());
    }

    #[test]
    fn packaged_artifacts_parse() {
        let values = packaged_input().unwrap();
        assert_eq!(values.len(), 768);
        assert!(!packaged_model().is_empty());
    }
}
