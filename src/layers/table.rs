//! Tabular layer format: one column per node after a leading `key` column,
//! a `bias` row, then one `weight{k}` row per input `k`.

use std::collections::BTreeMap;
use std::io;

use csv::{ReaderBuilder, Writer};

use crate::error::{parse_finite, NetError, Result};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;

const KEY: &str = "key";
const BIAS: &str = "bias";
const WEIGHT: &str = "weight";

impl Layer {
    pub fn write_table<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut out = Writer::from_writer(writer);

        let header = std::iter::once(KEY.to_string())
            .chain((0..self.size()).map(|n| format!("n{n}")));
        out.write_record(header)?;

        let bias_row = std::iter::once(BIAS.to_string())
            .chain(self.biases().iter().map(|b| b.to_string()));
        out.write_record(bias_row)?;

        for k in 0..self.input_size() {
            let row = std::iter::once(format!("{WEIGHT}{k}"))
                .chain(self.weights().column(k).into_iter().map(|w| w.to_string()));
            out.write_record(row)?;
        }

        out.flush()?;
        Ok(())
    }

    pub fn read_table<R: io::Read>(reader: R) -> Result<Layer> {
        let mut input = ReaderBuilder::new().flexible(true).from_reader(reader);
        let nodes = input.headers()?.len().saturating_sub(1);
        if nodes == 0 {
            return Err(NetError::MalformedRecord("layer table has no node columns".into()));
        }

        let mut biases: Option<Vec<f64>> = None;
        let mut columns: BTreeMap<usize, Vec<f64>> = BTreeMap::new();

        for (line, record) in input.records().enumerate() {
            let record = record?;
            if record.len() != nodes + 1 {
                return Err(NetError::MalformedRecord(format!(
                    "layer table row {} has {} cells, expected {}",
                    line + 1, record.len(), nodes + 1
                )));
            }
            let label = record.get(0).unwrap_or_default().trim();
            let values = record.iter().skip(1)
                .map(|cell| parse_finite(cell, label))
                .collect::<Result<Vec<f64>>>()?;

            if label.starts_with(BIAS) {
                if biases.replace(values).is_some() {
                    return Err(NetError::MalformedRecord("layer table has two bias rows".into()));
                }
            } else if let Some(suffix) = label.strip_prefix(WEIGHT) {
                // A bare `weight` label takes the next free input index.
                let k = if suffix.is_empty() {
                    columns.len()
                } else {
                    suffix.parse().map_err(|_| {
                        NetError::MalformedRecord(format!("weight row '{label}' has no numeric input index"))
                    })?
                };
                if columns.insert(k, values).is_some() {
                    return Err(NetError::MalformedRecord(format!("layer table has two rows for input {k}")));
                }
            } else {
                return Err(NetError::UnrecognizedKey(label.to_string()));
            }
        }

        let biases = biases.ok_or_else(|| NetError::MalformedRecord("layer table has no bias row".into()))?;
        if columns.is_empty() {
            return Err(NetError::MalformedRecord("layer table has no weight rows".into()));
        }
        for (expected, &k) in columns.keys().enumerate() {
            if expected != k {
                return Err(NetError::MalformedRecord(format!("layer table has no row for input {expected}")));
            }
        }
        let columns: Vec<Vec<f64>> = columns.into_values().collect();

        // Stored input-major; the layer keeps one row per node.
        let weights = (0..nodes)
            .map(|n| columns.iter().map(|col| col[n]).collect())
            .collect();
        Layer::from_parts(biases, Matrix::from_rows(weights)?)
    }
}
