//! Experiment settings from TOML (`[experiment]` and `[disclosure]` sections)
//!
//! Strategy selectors are kept as strings here and parsed when the file
//! configuration is converted into an `ExperimentConfig`.
//!
//! ```toml
//! [experiment]
//! individual_rounds = 4
//! max_rounds = 10
//! payout_ratio = 0.0001
//! memory = "decomposed:3"
//! consensus = "threshold:0.8"
//! speaking_order = "random"
//! public_context = "summarized"
//! summarizer = "gpt-4o-mini"
//! seed = 7
//!
//! [disclosure]
//! style = "motivational"
//! checkpoints = ["after_round:2", "experiment_end"]
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExperimentConfig {
    pub individual_rounds: u32,
    pub max_rounds: u32,
    pub payout_ratio: f64,
    /// `recent_window:K` or `decomposed:K`
    pub memory: String,
    /// `exact`, `threshold:θ` or `semantic`
    pub consensus: String,
    /// `random`, `sequential` or `hierarchical:K`
    pub speaking_order: String,
    /// `full` or `summarized`
    pub public_context: String,
    pub summarizer: Option<String>,
    pub detailed_examples: bool,
    pub max_concurrent_calls: usize,
    pub seed: Option<u64>,
}

impl Default for FileExperimentConfig {
    fn default() -> Self {
        Self {
            individual_rounds: 4,
            max_rounds: 10,
            payout_ratio: 0.0001,
            memory: "recent_window:3".to_string(),
            consensus: "exact".to_string(),
            speaking_order: "random".to_string(),
            public_context: "full".to_string(),
            summarizer: None,
            detailed_examples: true,
            max_concurrent_calls: 4,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDisclosureConfig {
    /// `minimal`, `standard`, `motivational` or `detailed`
    pub style: String,
    /// `after_round:N`, `end_of_individual_phase`, `after_group_settlement`, `experiment_end`
    pub checkpoints: Vec<String>,
}

impl Default for FileDisclosureConfig {
    fn default() -> Self {
        Self {
            style: "standard".to_string(),
            checkpoints: vec![
                "end_of_individual_phase".to_string(),
                "experiment_end".to_string(),
            ],
        }
    }
}
