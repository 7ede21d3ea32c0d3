use anyhow::Result;

use crate::{Shape, Tensor};

/// Render a tensor as nested-bracket text, one innermost row per line.
pub fn shaped_string(tensor: &Tensor) -> Result<String> {
    let values = tensor.display_values()?;
    Ok(format_shaped(&values, &tensor.shape))
}

pub fn format_shaped(values: &[String], shape: &Shape) -> String {
    let mut out = String::new();
    write_level(&mut out, values, &shape.0, 0);
    out
}

fn write_level(out: &mut String, values: &[String], dims: &[usize], depth: usize) {
    match dims {
        [] => out.push_str(values.first().map(String::as_str).unwrap_or("")),
        [_] => {
            out.push('[');
            out.push_str(&values.join(", "));
            out.push(']');
        }
        [_, rest @ ..] => {
            let stride = rest.iter().product::<usize>().max(1);
            out.push('[');
            for (i, chunk) in values.chunks(stride).enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                    for _ in 0..=depth {
                        out.push(' ');
                    }
                }
                write_level(out, chunk, rest, depth + 1);
            }
            out.push(']');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[i32]) -> Vec<String> {
        values.iter().map(i32::to_string).collect()
    }

    #[test]
    fn rank_one_is_a_flat_row() {
        let s = format_shaped(&strings(&[1, 2, 3]), &Shape::from_slice(&[3]));
        assert_eq!(s, "[1, 2, 3]");
    }

    #[test]
    fn rank_two_breaks_rows() {
        let s = format_shaped(&strings(&[1, 2, 3, 4]), &Shape::from_slice(&[2, 2]));
        assert_eq!(s, "[[1, 2],\n [3, 4]]");
    }

    #[test]
    fn rank_three_nests_and_indents() {
        let s = format_shaped(
            &strings(&[1, 2, 3, 4, 5, 6, 7, 8]),
            &Shape::from_slice(&[2, 2, 2]),
        );
        assert_eq!(s, "[[[1, 2],\n  [3, 4]],\n [[5, 6],\n  [7, 8]]]");
    }

    #[test]
    fn scalar_has_no_brackets() {
        let s = format_shaped(&strings(&[42]), &Shape::from_slice(&[]));
        assert_eq!(s, "42");
    }
}
