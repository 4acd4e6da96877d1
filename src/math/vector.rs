use crate::error::{NetError, Result};

/// Arithmetic mean. Errors on an empty slice rather than returning NaN.
pub fn average(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(NetError::InvalidArgument("cannot average an empty slice".into()));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn vector_add(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    if a.len() != b.len() {
        return Err(NetError::shape("vector_add", a.len(), b.len()));
    }
    Ok(a.iter().zip(b).map(|(x, y)| x + y).collect())
}

pub fn vector_sub(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    if a.len() != b.len() {
        return Err(NetError::shape("vector_sub", a.len(), b.len()));
    }
    Ok(a.iter().zip(b).map(|(x, y)| x - y).collect())
}

/// Index of the largest entry. Ties go to the first maximum and NaN entries
/// never win. Returns 0 for an empty slice.
pub fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate() {
        if x > v[best] || v[best].is_nan() {
            best = i;
        }
    }
    best
}

/// Rounds `x` down to a multiple of `1 / place`.
pub fn floor_to_decimal(x: f64, place: f64) -> f64 {
    (x * place).floor() / place
}
