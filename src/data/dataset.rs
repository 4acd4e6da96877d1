//! Dataset files: one data point per CSV row, columns keyed `y0..`, `v0..`.

use std::fs::File;
use std::path::Path;

use csv::{Reader, Writer};
use tracing::debug;

use crate::data::data_point::DataPoint;
use crate::error::{parse_finite, NetError, Result};

pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<DataPoint>> {
    let file = File::open(path.as_ref())?;
    let mut reader = Reader::from_reader(file);
    let headers = reader.headers()?.clone();

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(NetError::shape(format!("dataset row {}", row + 1), headers.len(), record.len()));
        }
        let cells = headers.iter().zip(record.iter())
            .map(|(key, cell)| parse_finite(cell, key).map(|v| (key, v)))
            .collect::<Result<Vec<_>>>()?;
        points.push(DataPoint::from_row(cells)?);
    }

    debug!(path = %path.as_ref().display(), points = points.len(), "read dataset");
    Ok(points)
}

/// Writes `points` with the header taken from the first point. Every point
/// must share that point's input and target widths.
pub fn write_csv(path: impl AsRef<Path>, points: &[DataPoint]) -> Result<()> {
    if let Some(first) = points.first() {
        for (i, dp) in points.iter().enumerate() {
            if dp.y().len() != first.y().len() {
                return Err(NetError::shape(format!("dataset point {i} target"), first.y().len(), dp.y().len()));
            }
            if dp.values().len() != first.values().len() {
                return Err(NetError::shape(format!("dataset point {i} input"), first.values().len(), dp.values().len()));
            }
        }
    }

    let file = File::create(path.as_ref())?;
    let mut writer = Writer::from_writer(file);

    if let Some(first) = points.first() {
        writer.write_record(first.keys())?;
        for dp in points {
            writer.write_record(dp.to_row().iter().map(|(_, v)| v.to_string()))?;
        }
    }

    writer.flush()?;
    Ok(())
}
