use anyhow::{bail, ensure, Result};
use bytes::Bytes;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    I64,
    I32,
    U8,
}

impl DType {
    pub fn byte_size(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::I64 => 8,
            DType::U8 => 1,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DType::F32 => "f32",
            DType::I64 => "i64",
            DType::I32 => "i32",
            DType::U8 => "u8",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(dims: &[usize]) -> Self {
        Self(dims.iter().copied().collect())
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Element count; a rank-0 shape holds one scalar.
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }
}

/// Exclusively-owned input storage with a stable backing address.
///
/// The engine holds views over this buffer for the duration of a run, so the
/// backing allocation must never move. `Bytes` keeps the heap block alive and
/// in place until the buffer and every view built over it are dropped.
pub struct PinnedBuffer {
    bytes: Bytes,
}

impl PinnedBuffer {
    pub fn from_f32s(values: &[f32]) -> Self {
        Self {
            bytes: f32s_to_le_bytes(values),
        }
    }

    pub fn element_count(&self) -> usize {
        self.bytes.len() / DType::F32.byte_size()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Build a view of `shape` over the front of this buffer.
    ///
    /// The shape may cover fewer elements than the buffer holds, never more.
    pub fn view(&self, shape: Shape) -> Result<Tensor> {
        let numel = shape.numel();
        ensure!(
            numel <= self.element_count(),
            "view shape {:?} needs {} elements but the pinned buffer holds {}",
            shape.0,
            numel,
            self.element_count()
        );
        let byte_len = numel * DType::F32.byte_size();
        Ok(Tensor {
            dtype: DType::F32,
            shape,
            data: self.bytes.slice(0..byte_len),
        })
    }
}

/// A typed, shaped reference over a contiguous host buffer.
///
/// Input views alias the pinned buffer without copying; output tensors own a
/// host-visible copy of the engine's result. Data is little-endian.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub dtype: DType,
    pub shape: Shape,
    pub data: Bytes,
}

impl Tensor {
    /// Wrap an exact-sized buffer. The byte length must match the shape.
    pub fn from_bytes(dtype: DType, shape: Shape, data: Bytes) -> Result<Self> {
        let expected = shape.numel() * dtype.byte_size();
        ensure!(
            data.len() == expected,
            "tensor byte length mismatch: got {}, expected {} for shape {:?}",
            data.len(),
            expected,
            shape.0
        );
        Ok(Self { dtype, shape, data })
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn as_f32s(&self) -> Result<Vec<f32>> {
        ensure!(self.dtype == DType::F32, "tensor is {}, not f32", self.dtype);
        le_bytes_to_f32s(&self.data)
    }

    pub fn as_i64s(&self) -> Result<Vec<i64>> {
        ensure!(self.dtype == DType::I64, "tensor is {}, not i64", self.dtype);
        Ok(self
            .data
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect())
    }

    pub fn as_i32s(&self) -> Result<Vec<i32>> {
        ensure!(self.dtype == DType::I32, "tensor is {}, not i32", self.dtype);
        Ok(self
            .data
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    pub fn as_u8s(&self) -> Result<Vec<u8>> {
        ensure!(self.dtype == DType::U8, "tensor is {}, not u8", self.dtype);
        Ok(self.data.to_vec())
    }

    /// Element data rendered as decimal text, in storage order.
    pub fn display_values(&self) -> Result<Vec<String>> {
        match self.dtype {
            DType::F32 => Ok(self.as_f32s()?.iter().map(f32::to_string).collect()),
            DType::I64 => Ok(self.as_i64s()?.iter().map(i64::to_string).collect()),
            DType::I32 => Ok(self.as_i32s()?.iter().map(i32::to_string).collect()),
            DType::U8 => Ok(self.as_u8s()?.iter().map(u8::to_string).collect()),
        }
    }
}

pub fn f32s_to_le_bytes(values: &[f32]) -> Bytes {
    let mut raw = Vec::with_capacity(values.len() * 4);
    for v in values {
        raw.extend_from_slice(&v.to_le_bytes());
    }
    Bytes::from(raw)
}

pub fn i64s_to_le_bytes(values: &[i64]) -> Bytes {
    let mut raw = Vec::with_capacity(values.len() * 8);
    for v in values {
        raw.extend_from_slice(&v.to_le_bytes());
    }
    Bytes::from(raw)
}

pub fn i32s_to_le_bytes(values: &[i32]) -> Bytes {
    let mut raw = Vec::with_capacity(values.len() * 4);
    for v in values {
        raw.extend_from_slice(&v.to_le_bytes());
    }
    Bytes::from(raw)
}

/// Decode a little-endian f32 buffer, rejecting ragged lengths.
pub fn le_bytes_to_f32s(bytes: &Bytes) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        bail!("f32 buffer has invalid byte length {}", bytes.len());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_numel_counts_elements() {
        assert_eq!(Shape::from_slice(&[1, 3, 16, 16]).numel(), 768);
        assert_eq!(Shape::from_slice(&[]).numel(), 1);
    }

    #[test]
    fn view_shares_the_pinned_allocation() {
        let pinned = PinnedBuffer::from_f32s(&[1.0, 2.0, 3.0, 4.0]);
        let view = pinned.view(Shape::from_slice(&[2, 2])).unwrap();
        assert_eq!(view.data.as_ptr(), pinned.bytes().as_ptr());
        assert_eq!(view.as_f32s().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn view_may_cover_a_prefix() {
        let pinned = PinnedBuffer::from_f32s(&[1.0, 2.0, 3.0, 4.0]);
        let view = pinned.view(Shape::from_slice(&[3])).unwrap();
        assert_eq!(view.as_f32s().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn oversized_view_is_rejected() {
        let pinned = PinnedBuffer::from_f32s(&[1.0, 2.0]);
        let err = pinned.view(Shape::from_slice(&[1, 3])).unwrap_err();
        assert!(err.to_string().contains("pinned buffer"));
    }

    #[test]
    fn exact_length_is_enforced_for_owned_tensors() {
        let data = f32s_to_le_bytes(&[1.0, 2.0, 3.0]);
        assert!(Tensor::from_bytes(DType::F32, Shape::from_slice(&[3]), data.clone()).is_ok());
        assert!(Tensor::from_bytes(DType::F32, Shape::from_slice(&[4]), data).is_err());
    }

    #[test]
    fn f32_round_trip() {
        let values = vec![0.5, -1.25, 3.75];
        let tensor = Tensor::from_bytes(
            DType::F32,
            Shape::from_slice(&[3]),
            f32s_to_le_bytes(&values),
        )
        .unwrap();
        assert_eq!(tensor.as_f32s().unwrap(), values);
        assert!(tensor.as_i64s().is_err());
    }
}
