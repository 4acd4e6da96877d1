use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{parse_finite, NetError, Result};
use crate::math::vector::argmax;

/// One training or evaluation sample: an input vector and its target.
///
/// `label` is the index of the largest entry in `y`. It assumes a one-hot or
/// peaked target; on ties the first maximum wins.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    values: Vec<f64>,
    y: Vec<f64>,
    label: usize,
}

impl DataPoint {
    pub fn new(values: Vec<f64>, y: Vec<f64>) -> Result<DataPoint> {
        if y.is_empty() {
            return Err(NetError::InvalidArgument("data point target must not be empty".into()));
        }
        if let Some(bad) = values.iter().chain(y.iter()).find(|x| !x.is_finite()) {
            return Err(NetError::MalformedRecord(format!("data point value {bad} is not finite")));
        }
        let label = argmax(&y);
        Ok(DataPoint { values, y, label })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn label(&self) -> usize {
        self.label
    }

    /// Keys in tabular form: `y0..` for the target, then `v0..` for the inputs.
    pub fn keys(&self) -> Vec<String> {
        (0..self.y.len()).map(|i| format!("y{i}"))
            .chain((0..self.values.len()).map(|i| format!("v{i}")))
            .collect()
    }

    pub fn to_row(&self) -> Vec<(String, f64)> {
        self.keys().into_iter()
            .zip(self.y.iter().chain(self.values.iter()).copied())
            .collect()
    }

    /// Rebuilds a point from `(key, value)` cells. Keys may come in any order
    /// but each prefix's indices must cover `0..n` exactly once.
    pub fn from_row<I, K>(cells: I) -> Result<DataPoint>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut y = BTreeMap::new();
        let mut values = BTreeMap::new();

        for (key, value) in cells {
            let key = key.as_ref().trim();
            let mut chars = key.chars();
            let target = match chars.next() {
                Some('y') => &mut y,
                Some('v') => &mut values,
                _ => return Err(NetError::UnrecognizedKey(key.to_string())),
            };
            let index = chars.as_str();
            let index: usize = index.parse()
                .map_err(|_| NetError::MalformedRecord(format!("key '{key}' has no numeric index")))?;
            if !value.is_finite() {
                return Err(NetError::MalformedRecord(format!("{key}: value {value} is not finite")));
            }
            if target.insert(index, value).is_some() {
                return Err(NetError::MalformedRecord(format!("key '{key}' appears twice")));
            }
        }

        DataPoint::new(dense(values, 'v')?, dense(y, 'y')?)
    }
}

fn dense(map: BTreeMap<usize, f64>, prefix: char) -> Result<Vec<f64>> {
    for (expected, &index) in map.keys().enumerate() {
        if expected != index {
            return Err(NetError::MalformedRecord(format!("missing key '{prefix}{expected}'")));
        }
    }
    Ok(map.into_values().collect())
}

fn join(v: &[f64]) -> String {
    v.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(",")
}

fn split(part: &str, what: &str) -> Result<Vec<f64>> {
    if part.trim().is_empty() {
        return Ok(Vec::new());
    }
    part.split(',').map(|cell| parse_finite(cell, what)).collect()
}

/// `y1,y2,...;v1,v2,...`
impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", join(&self.y), join(&self.values))
    }
}

impl FromStr for DataPoint {
    type Err = NetError;

    fn from_str(s: &str) -> Result<DataPoint> {
        let (y, values) = s.split_once(';')
            .ok_or_else(|| NetError::MalformedRecord(format!("'{s}' has no ';' separator")))?;
        DataPoint::new(split(values, "input")?, split(y, "target")?)
    }
}
