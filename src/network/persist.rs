use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{NetError, Result};
use crate::layers::dense::Layer;
use crate::network::network::Network;

/// Turns backslashes into `/` and collapses repeated separators.
pub fn normalize_path(path: &str) -> PathBuf {
    let mut out = String::with_capacity(path.len());
    for c in path.chars().map(|c| if c == '\\' { '/' } else { c }) {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    PathBuf::from(out)
}

fn layer_file_name(index: usize) -> String {
    format!("layer_{index:03}.csv")
}

impl Network {
    /// Writes one table per layer into `dir`. Anything already in `dir` is
    /// deleted first. A network holding non-finite parameters could not be
    /// loaded back, so it is refused before `dir` is touched.
    pub fn save_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        if let Some(i) = self.layers().iter().position(|l| !l.is_finite()) {
            return Err(NetError::MalformedRecord(format!("layer {i} holds non-finite parameters")));
        }
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;

        for (i, layer) in self.layers().iter().enumerate() {
            let file = File::create(dir.join(layer_file_name(i)))?;
            layer.write_table(BufWriter::new(file))?;
        }

        info!(dir = %dir.display(), shape = ?self.shape(), "saved network");
        Ok(())
    }

    /// Restores a network written by `save_dir`. Every regular file in `dir`
    /// is read as one layer, in file-name order.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Network> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        if files.is_empty() {
            return Err(NetError::InvalidArgument(format!("{} holds no layer files", dir.display())));
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let layers = files.iter()
            .map(|path| Layer::read_table(BufReader::new(File::open(path)?)))
            .collect::<Result<Vec<_>>>()?;
        let network = Network::from_layers(layers)?;

        info!(dir = %dir.display(), shape = ?network.shape(), "loaded network");
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;

    #[test]
    fn normalize_path_unifies_separators() {
        assert_eq!(normalize_path("models\\\\mnist//run_1\\"), PathBuf::from("models/mnist/run_1/"));
        assert_eq!(normalize_path("plain/path"), PathBuf::from("plain/path"));
    }

    #[test]
    fn layer_files_sort_by_index() {
        assert!(layer_file_name(2) < layer_file_name(10));
        assert_eq!(layer_file_name(0), "layer_000.csv");
    }

    #[test]
    fn non_finite_network_is_not_saved_over_an_existing_model() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("model");
        let layer = Layer::from_parts(vec![0.0], Matrix::from_rows(vec![vec![1.0, -1.0]]).unwrap()).unwrap();
        let good = Network::from_layers(vec![layer.clone()]).unwrap();
        good.save_dir(&dir).unwrap();

        let mut broken = layer;
        broken.set_weight(0, 1, f64::INFINITY);
        let bad = Network::from_layers(vec![broken]).unwrap();
        assert!(matches!(bad.save_dir(&dir), Err(NetError::MalformedRecord(_))));

        let reloaded = Network::load_dir(&dir).unwrap();
        assert_eq!(reloaded.layers()[0].weights().row(0), &[1.0, -1.0]);
    }
}
