use serde::{Deserialize, Serialize};

/// Outcome of one `Network::learn` mini-batch step.
///
/// The three distributions are indexed by output node:
/// - `expected_distribution[c]` counts points whose label is `c`
/// - `chosen_distribution[c]` counts points the network assigned to `c`
/// - `correct_distribution[c]` counts points assigned to `c` whose label is `c`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnReport {
    /// Mean over the batch of each point's per-node-averaged squared error.
    pub avg_cost: f64,
    /// Fraction of the batch classified correctly, in [0, 1].
    pub accuracy: f64,
    pub expected_distribution: Vec<usize>,
    pub chosen_distribution: Vec<usize>,
    pub correct_distribution: Vec<usize>,
}

impl LearnReport {
    pub(crate) fn empty(outputs: usize) -> LearnReport {
        LearnReport {
            avg_cost: 0.0,
            accuracy: 0.0,
            expected_distribution: vec![0; outputs],
            chosen_distribution: vec![0; outputs],
            correct_distribution: vec![0; outputs],
        }
    }

    pub(crate) fn record(&mut self, label: usize, choice: usize) {
        self.expected_distribution[label] += 1;
        self.chosen_distribution[choice] += 1;
        if choice == label {
            self.correct_distribution[choice] += 1;
        }
    }

    pub(crate) fn finish(&mut self, total_cost: f64, batch_size: usize) {
        self.avg_cost = total_cost / batch_size as f64;
        self.accuracy = self.correct_distribution.iter().sum::<usize>() as f64 / batch_size as f64;
    }

    /// Number of points the report covers.
    pub fn batch_size(&self) -> usize {
        self.expected_distribution.iter().sum()
    }
}
