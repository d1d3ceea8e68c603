use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A dense embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self { data: vec![0.0; dim] }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        norm(&self.data)
    }

    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> Result<f32> {
        cosine_similarity(&self.data, &other.data)
    }

    /// Scale to unit length; a zero vector is left untouched.
    #[inline]
    pub fn normalize(&mut self) {
        let n = self.norm();
        if n > f32::EPSILON {
            let inv = 1.0 / n;
            for x in &mut self.data {
                *x *= inv;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }

    /// Elementwise `self + delta`, where a shorter `delta` covers only its
    /// leading positions and the rest is treated as zero.
    ///
    /// Fails with [`Error::DimensionMismatch`] if `delta` is longer than `self`.
    pub fn compose(&self, delta: &[f32]) -> Result<Vector> {
        if delta.len() > self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                actual: delta.len(),
            });
        }
        let mut out = self.data.clone();
        for (o, d) in out.iter_mut().zip(delta) {
            *o += d;
        }
        Ok(Vector::new(out))
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

/// Dot product; lengths must agree.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(crate::simd::dot_kernel(a, b))
}

/// L2 norm. The zero vector has norm 0.
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    crate::simd::norm_squared_kernel(v).sqrt()
}

/// Cosine similarity in `[-1, 1]`.
///
/// Returns exactly `0.0` when either input has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let d = dot(a, b)?;
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return Ok(0.0);
    }
    // rounding can push |cos| a hair past 1
    Ok((d / (na * nb)).clamp(-1.0, 1.0))
}
