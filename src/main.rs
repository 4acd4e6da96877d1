use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use perceptron_nn::data::read_csv;
use perceptron_nn::math::vector::argmax;
use perceptron_nn::network::normalize_path;
use perceptron_nn::{Network, NetworkSpec, Result, ShapePolicy};

#[derive(Parser)]
#[command(name = "perceptron-nn", about = "Dense feed-forward network: build, step and query a saved model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a freshly initialized network from a spec and save it.
    Init {
        #[arg(long)]
        spec: String,
        #[arg(long)]
        out: String,
    },
    /// Run one mini-batch step over a dataset file and save the result.
    Learn {
        #[arg(long)]
        spec: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        data: String,
        /// Resize the network to the dataset's input width instead of failing.
        #[arg(long)]
        adjust: bool,
    },
    /// Print the network's output for every point in a dataset file.
    Predict {
        #[arg(long)]
        spec: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        data: String,
    },
}

#[derive(Serialize)]
struct Prediction {
    index: usize,
    label: usize,
    choice: usize,
    outputs: Vec<f64>,
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init { spec, out } => {
            let spec = NetworkSpec::load_json(&spec)?;
            let network = spec.build()?;
            info!(name = %spec.name, shape = ?network.shape(), parameters = network.size(), "built network");
            network.save_dir(normalize_path(&out))?;
        }
        Command::Learn { spec, model, data, adjust } => {
            let spec = NetworkSpec::load_json(&spec)?;
            let dir = normalize_path(&model);
            let mut network = Network::load_dir(&dir)?;
            let points = read_csv(normalize_path(&data))?;
            let policy = if adjust { ShapePolicy::Adjust } else { ShapePolicy::Strict };
            spec.check_matches(&network, policy)?;

            let report = network.learn(&points, spec.activation, spec.learn_rate, policy)?;
            network.save_dir(&dir)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Predict { spec, model, data } => {
            let spec = NetworkSpec::load_json(&spec)?;
            let mut network = Network::load_dir(normalize_path(&model))?;
            spec.check_matches(&network, ShapePolicy::Strict)?;
            let points = read_csv(normalize_path(&data))?;

            let mut correct = 0;
            for (index, dp) in points.iter().enumerate() {
                let outputs = network.calculate(dp, spec.activation, ShapePolicy::Strict)?;
                let choice = argmax(&outputs);
                if choice == dp.label() {
                    correct += 1;
                }
                let line = Prediction { index, label: dp.label(), choice, outputs };
                println!("{}", serde_json::to_string(&line)?);
            }
            if !points.is_empty() {
                info!(accuracy = correct as f64 / points.len() as f64, points = points.len(), "prediction finished");
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
