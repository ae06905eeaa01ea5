//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the application's
//! [`ExperimentConfig`] by [`FileConfig::to_experiment_config`].

mod experiment;
mod gateway;
mod roster;

pub use experiment::{FileDisclosureConfig, FileExperimentConfig};
pub use gateway::FileGatewayConfig;
pub use roster::{FileDistributionConfig, FileParticipantConfig};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use veil_application::{ConfigError, ExperimentConfig, ParticipantConfig, PublicContextMode};
use veil_domain::{
    ClassWeights, ConsensusStrategy, DisclosureCheckpoint, DisclosureConfig, DisclosureStyle,
    IncomeClass, IncomeDistribution, MemoryStrategyKind, SpeakingOrderPattern,
};

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("{field}: {message}")]
    InvalidSelector {
        field: &'static str,
        message: String,
    },

    #[error("participant #{index} has an empty {field}")]
    EmptyParticipantField { index: usize, field: &'static str },

    #[error("distribution '{distribution}': {message}")]
    InvalidDistribution {
        distribution: String,
        message: String,
    },

    #[error("gateway.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error(transparent)]
    Experiment(#[from] ConfigError),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub experiment: FileExperimentConfig,
    pub disclosure: FileDisclosureConfig,
    pub gateway: FileGatewayConfig,
    pub participants: Vec<FileParticipantConfig>,
    /// Empty means the built-in four-distribution set
    pub distributions: Vec<FileDistributionConfig>,
    /// Income class name to relative weight; empty means uniform
    pub class_weights: BTreeMap<String, f64>,
}

impl FileConfig {
    /// Convert into a validated [`ExperimentConfig`]
    pub fn to_experiment_config(&self) -> Result<ExperimentConfig, ConfigValidationError> {
        if self.gateway.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        let exp = &self.experiment;
        let mut config = ExperimentConfig::new(self.participants()?)
            .with_individual_rounds(exp.individual_rounds)
            .with_max_rounds(exp.max_rounds)
            .with_payout_ratio(exp.payout_ratio)
            .with_memory(parse_selector::<MemoryStrategyKind>("experiment.memory", &exp.memory)?)
            .with_consensus(parse_selector::<ConsensusStrategy>(
                "experiment.consensus",
                &exp.consensus,
            )?)
            .with_speaking_order(parse_selector::<SpeakingOrderPattern>(
                "experiment.speaking_order",
                &exp.speaking_order,
            )?)
            .with_public_context(parse_selector::<PublicContextMode>(
                "experiment.public_context",
                &exp.public_context,
            )?)
            .with_detailed_examples(exp.detailed_examples)
            .with_disclosure(self.disclosure()?)
            .with_max_concurrent_calls(exp.max_concurrent_calls);

        if !self.distributions.is_empty() {
            config = config.with_distributions(self.distributions()?);
        }
        if !self.class_weights.is_empty() {
            config = config.with_class_weights(self.class_weights()?);
        }
        if let Some(summarizer) = &exp.summarizer {
            config = config.with_summarizer(summarizer);
        }
        if let Some(seed) = exp.seed {
            config = config.with_seed(seed);
        }

        config.validate()?;
        Ok(config)
    }

    fn participants(&self) -> Result<Vec<ParticipantConfig>, ConfigValidationError> {
        self.participants
            .iter()
            .enumerate()
            .map(|(index, p)| {
                if p.name.trim().is_empty() {
                    return Err(ConfigValidationError::EmptyParticipantField {
                        index,
                        field: "name",
                    });
                }
                if p.model.trim().is_empty() {
                    return Err(ConfigValidationError::EmptyParticipantField {
                        index,
                        field: "model",
                    });
                }
                let participant = ParticipantConfig::new(&p.name, &p.persona, &p.model);
                Ok(match p.temperature {
                    Some(t) => participant.with_temperature(t),
                    None => participant,
                })
            })
            .collect()
    }

    fn distributions(&self) -> Result<Vec<IncomeDistribution>, ConfigValidationError> {
        self.distributions
            .iter()
            .map(|d| {
                let name = d.name.clone().unwrap_or_else(|| d.id.clone());
                let mut distribution = IncomeDistribution::new(&d.id, name);
                for (class, amount) in &d.incomes {
                    let class = class
                        .parse::<IncomeClass>()
                        .map_err(|message| ConfigValidationError::InvalidDistribution {
                            distribution: d.id.clone(),
                            message,
                        })?;
                    if *amount < 0 {
                        return Err(ConfigValidationError::InvalidDistribution {
                            distribution: d.id.clone(),
                            message: format!("negative income {} for {}", amount, class),
                        });
                    }
                    distribution = distribution.with_income(class, *amount);
                }
                Ok(distribution)
            })
            .collect()
    }

    fn class_weights(&self) -> Result<ClassWeights, ConfigValidationError> {
        self.class_weights
            .iter()
            .try_fold(ClassWeights::default(), |weights, (class, weight)| {
                let class = parse_selector::<IncomeClass>("class_weights", class)?;
                Ok(weights.with_weight(class, *weight))
            })
    }

    fn disclosure(&self) -> Result<DisclosureConfig, ConfigValidationError> {
        let style = parse_selector::<DisclosureStyle>("disclosure.style", &self.disclosure.style)?;
        self.disclosure.checkpoints.iter().try_fold(
            DisclosureConfig::disabled().with_style(style),
            |config, checkpoint| {
                let checkpoint =
                    parse_selector::<DisclosureCheckpoint>("disclosure.checkpoints", checkpoint)?;
                Ok(config.with_checkpoint(checkpoint))
            },
        )
    }
}

fn parse_selector<T>(field: &'static str, value: &str) -> Result<T, ConfigValidationError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigValidationError::InvalidSelector {
            field,
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[experiment]
individual_rounds = 2
max_rounds = 5
memory = "decomposed:4"
consensus = "threshold:0.75"
speaking_order = "hierarchical:1"
public_context = "summarized"
summarizer = "summary-model"
seed = 11

[disclosure]
style = "detailed"
checkpoints = ["after_round:1", "after_group_settlement"]

[gateway]
base_url = "http://localhost:8000/v1"
timeout_seconds = 30

[[participants]]
name = "Alice"
persona = "A nurse."
model = "model-a"
temperature = 0.4

[[participants]]
name = "Bob"
model = "model-b"

[[distributions]]
id = "d1"
name = "Flat"
incomes = { high = 20000, low = 18000 }

[class_weights]
high = 1.0
low = 3.0
"#;

    #[test]
    fn test_deserialize_full_config() {
        let file: FileConfig = toml::from_str(FULL).unwrap();
        assert_eq!(file.participants.len(), 2);
        assert_eq!(file.gateway.base_url, "http://localhost:8000/v1");
        assert_eq!(file.gateway.api_key_env, "OPENAI_API_KEY");

        let config = file.to_experiment_config().unwrap();
        assert_eq!(config.individual_rounds, 2);
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.memory, MemoryStrategyKind::Decomposed { window: 4 });
        assert_eq!(config.consensus, ConsensusStrategy::Threshold(0.75));
        assert_eq!(
            config.speaking_order,
            SpeakingOrderPattern::Hierarchical { leaders: 1 }
        );
        assert_eq!(config.public_context, PublicContextMode::Summarized);
        assert_eq!(config.summarizer.as_deref(), Some("summary-model"));
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.participants[0].temperature, Some(0.4));
        assert_eq!(config.participants[1].persona, "");
        assert_eq!(config.distributions.len(), 1);
        assert_eq!(config.distributions[0].floor(), 18000);
        assert_eq!(
            config.disclosure.checkpoints,
            vec![
                DisclosureCheckpoint::AfterRound(1),
                DisclosureCheckpoint::AfterGroupSettlement,
            ]
        );
        assert_eq!(config.disclosure.style, DisclosureStyle::Detailed);
        let weights = config.class_weights.unwrap();
        assert_eq!(weights.weight(IncomeClass::Low), 3.0);
    }

    #[test]
    fn test_defaults_keep_builtin_distributions() {
        let file: FileConfig = toml::from_str(
            r#"
[[participants]]
name = "Alice"
model = "model-a"
"#,
        )
        .unwrap();

        let config = file.to_experiment_config().unwrap();
        assert_eq!(
            config.distributions,
            ExperimentConfig::default_distributions()
        );
        assert!(config.class_weights.is_none());
        assert_eq!(config.disclosure, DisclosureConfig::default());
    }

    #[test]
    fn test_unknown_selector_names_the_field() {
        let mut file: FileConfig = toml::from_str(FULL).unwrap();
        file.experiment.consensus = "majority-ish".to_string();

        let err = file.to_experiment_config().unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::InvalidSelector {
                field: "experiment.consensus",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_income_class_is_rejected() {
        let mut file: FileConfig = toml::from_str(FULL).unwrap();
        file.distributions[0].incomes.insert("upper".to_string(), 1);

        let err = file.to_experiment_config().unwrap_err();
        assert!(err.to_string().starts_with("distribution 'd1'"));
    }

    #[test]
    fn test_empty_roster_fails_experiment_validation() {
        let file = FileConfig::default();
        let err = file.to_experiment_config().unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::Experiment(ConfigError::NoParticipants)
        ));
    }

    #[test]
    fn test_blank_model_is_rejected() {
        let mut file: FileConfig = toml::from_str(FULL).unwrap();
        file.participants[1].model = " ".to_string();

        let err = file.to_experiment_config().unwrap_err();
        assert_eq!(err.to_string(), "participant #1 has an empty model");
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut file: FileConfig = toml::from_str(FULL).unwrap();
        file.gateway.timeout_seconds = 0;
        assert!(matches!(
            file.to_experiment_config(),
            Err(ConfigValidationError::InvalidTimeout)
        ));
    }
}
