//! Experiment configuration value object.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use veil_domain::{
    ClassWeights, ConsensusStrategy, DisclosureConfig, IncomeClass, IncomeDistribution,
    MemoryStrategyKind, ModelSpec, Participant, ParticipantId, SpeakingOrderPattern,
};

/// A configuration combination that cannot run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No participants configured")]
    NoParticipants,

    #[error("max_rounds must be at least 1")]
    NoDeliberationRounds,

    #[error("max_concurrent_calls must be at least 1")]
    NoConcurrency,

    #[error("No income distributions configured")]
    NoDistributions,

    #[error("Payout ratio must be a non-negative number, got {0}")]
    InvalidPayoutRatio(f64),

    #[error("Participant '{name}' has temperature {temperature}, expected 0.0-2.0")]
    InvalidTemperature { name: String, temperature: f32 },

    #[error("Consensus threshold must be within 0.0-1.0, got {0}")]
    InvalidThreshold(f64),

    #[error("Hierarchical order has {leaders} leaders but only {participants} participants")]
    TooManyLeaders { leaders: usize, participants: usize },

    #[error("Memory window must be at least 1")]
    EmptyMemoryWindow,
}

/// One configured participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantConfig {
    pub name: String,
    pub persona: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ParticipantConfig {
    pub fn new(
        name: impl Into<String>,
        persona: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            persona: persona.into(),
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model_spec(&self) -> ModelSpec {
        let spec = ModelSpec::new(&self.model);
        match self.temperature {
            Some(t) => spec.with_temperature(t),
            None => spec,
        }
    }
}

/// What public context a speaker sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicContextMode {
    /// The whole prior transcript
    #[default]
    FullTranscript,
    /// Earlier round summaries plus the current round so far
    Summarized,
}

impl std::fmt::Display for PublicContextMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicContextMode::FullTranscript => write!(f, "full"),
            PublicContextMode::Summarized => write!(f, "summarized"),
        }
    }
}

impl std::str::FromStr for PublicContextMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" | "full_transcript" | "transcript" => Ok(PublicContextMode::FullTranscript),
            "summarized" | "summary" => Ok(PublicContextMode::Summarized),
            _ => Err(format!(
                "Unknown public context mode: {}. Valid: full, summarized",
                s
            )),
        }
    }
}

/// Complete description of one experiment
///
/// Built once, validated, then shared read-only (behind an `Arc`) with the
/// orchestrator and all services.
///
/// # Example
///
/// ```
/// use veil_application::{ExperimentConfig, ParticipantConfig};
/// use veil_domain::ConsensusStrategy;
///
/// let config = ExperimentConfig::new(vec![
///     ParticipantConfig::new("Alice", "A pragmatic nurse.", "gpt-4o-mini"),
///     ParticipantConfig::new("Bob", "A libertarian economist.", "gpt-4o-mini"),
/// ])
/// .with_max_rounds(5)
/// .with_consensus(ConsensusStrategy::Threshold(0.6))
/// .with_seed(7);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub participants: Vec<ParticipantConfig>,
    pub individual_rounds: u32,
    pub max_rounds: u32,
    pub distributions: Vec<IncomeDistribution>,
    pub payout_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_weights: Option<ClassWeights>,
    pub memory: MemoryStrategyKind,
    pub consensus: ConsensusStrategy,
    pub speaking_order: SpeakingOrderPattern,
    pub public_context: PublicContextMode,
    /// Model for round summaries (defaults to the first participant's model)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarizer: Option<String>,
    pub detailed_examples: bool,
    pub disclosure: DisclosureConfig,
    pub max_concurrent_calls: usize,
    /// Seed for the run's random generator (random when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            participants: Vec::new(),
            individual_rounds: 4,
            max_rounds: 10,
            distributions: Self::default_distributions(),
            payout_ratio: 0.0001,
            class_weights: None,
            memory: MemoryStrategyKind::default(),
            consensus: ConsensusStrategy::default(),
            speaking_order: SpeakingOrderPattern::default(),
            public_context: PublicContextMode::default(),
            summarizer: None,
            detailed_examples: true,
            disclosure: DisclosureConfig::default(),
            max_concurrent_calls: 4,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    pub fn new(participants: Vec<ParticipantConfig>) -> Self {
        Self {
            participants,
            ..Default::default()
        }
    }

    /// Four classic five-class distributions
    pub fn default_distributions() -> Vec<IncomeDistribution> {
        let table: [(&str, [i64; 5]); 4] = [
            ("Distribution 1", [32_000, 27_000, 24_000, 13_000, 12_000]),
            ("Distribution 2", [28_000, 22_000, 20_000, 17_000, 13_000]),
            ("Distribution 3", [31_000, 24_000, 21_000, 16_000, 14_000]),
            ("Distribution 4", [21_000, 20_000, 19_000, 16_000, 15_000]),
        ];
        table
            .iter()
            .enumerate()
            .map(|(i, (name, amounts))| {
                IncomeClass::ALL.iter().zip(amounts.iter()).fold(
                    IncomeDistribution::new(format!("d{}", i + 1), *name),
                    |d, (class, amount)| d.with_income(*class, *amount),
                )
            })
            .collect()
    }

    // ==================== Builder Methods ====================

    pub fn with_individual_rounds(mut self, rounds: u32) -> Self {
        self.individual_rounds = rounds;
        self
    }

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_distributions(mut self, distributions: Vec<IncomeDistribution>) -> Self {
        self.distributions = distributions;
        self
    }

    pub fn with_payout_ratio(mut self, ratio: f64) -> Self {
        self.payout_ratio = ratio;
        self
    }

    pub fn with_class_weights(mut self, weights: ClassWeights) -> Self {
        self.class_weights = Some(weights);
        self
    }

    pub fn with_memory(mut self, memory: MemoryStrategyKind) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_consensus(mut self, consensus: ConsensusStrategy) -> Self {
        self.consensus = consensus;
        self
    }

    pub fn with_speaking_order(mut self, pattern: SpeakingOrderPattern) -> Self {
        self.speaking_order = pattern;
        self
    }

    pub fn with_public_context(mut self, mode: PublicContextMode) -> Self {
        self.public_context = mode;
        self
    }

    pub fn with_summarizer(mut self, model: impl Into<String>) -> Self {
        self.summarizer = Some(model.into());
        self
    }

    pub fn with_detailed_examples(mut self, enabled: bool) -> Self {
        self.detailed_examples = enabled;
        self
    }

    pub fn with_disclosure(mut self, disclosure: DisclosureConfig) -> Self {
        self.disclosure = disclosure;
        self
    }

    pub fn with_max_concurrent_calls(mut self, limit: usize) -> Self {
        self.max_concurrent_calls = limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    // ==================== Derived Values ====================

    /// Participants with ids `agent_1..agent_n`, in roster order
    pub fn build_participants(&self) -> Vec<Participant> {
        self.participants
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Participant::new(
                    ParticipantId::from_index(i),
                    &p.name,
                    &p.persona,
                    p.model_spec(),
                )
            })
            .collect()
    }

    pub fn summarizer_model(&self) -> Option<ModelSpec> {
        self.summarizer
            .as_ref()
            .map(ModelSpec::new)
            .or_else(|| self.participants.first().map(|p| ModelSpec::new(&p.model)))
    }

    // ==================== Validation ====================

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participants.is_empty() {
            return Err(ConfigError::NoParticipants);
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::NoDeliberationRounds);
        }
        if self.max_concurrent_calls == 0 {
            return Err(ConfigError::NoConcurrency);
        }
        if self.distributions.is_empty() {
            return Err(ConfigError::NoDistributions);
        }
        if !self.payout_ratio.is_finite() || self.payout_ratio < 0.0 {
            return Err(ConfigError::InvalidPayoutRatio(self.payout_ratio));
        }
        if let Some(p) = self
            .participants
            .iter()
            .find(|p| p.temperature.is_some_and(|t| !(0.0..=2.0).contains(&t)))
        {
            return Err(ConfigError::InvalidTemperature {
                name: p.name.clone(),
                temperature: p.temperature.unwrap_or_default(),
            });
        }
        if let ConsensusStrategy::Threshold(theta) = self.consensus
            && !(0.0..=1.0).contains(&theta)
        {
            return Err(ConfigError::InvalidThreshold(theta));
        }
        if let SpeakingOrderPattern::Hierarchical { leaders } = self.speaking_order
            && leaders > self.participants.len()
        {
            return Err(ConfigError::TooManyLeaders {
                leaders,
                participants: self.participants.len(),
            });
        }
        if self.memory.window() == 0 {
            return Err(ConfigError::EmptyMemoryWindow);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: usize) -> Vec<ParticipantConfig> {
        (0..n)
            .map(|i| ParticipantConfig::new(format!("P{}", i), "persona", "model-a"))
            .collect()
    }

    #[test]
    fn test_defaults_validate_with_participants() {
        let config = ExperimentConfig::new(roster(3));
        assert!(config.validate().is_ok());
        assert_eq!(config.distributions.len(), 4);
        assert_eq!(config.distributions[0].average(), 21_600.0);
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            ExperimentConfig::default().validate(),
            Err(ConfigError::NoParticipants)
        );
        assert_eq!(
            ExperimentConfig::new(roster(2))
                .with_max_rounds(0)
                .validate(),
            Err(ConfigError::NoDeliberationRounds)
        );
        assert_eq!(
            ExperimentConfig::new(roster(2))
                .with_max_concurrent_calls(0)
                .validate(),
            Err(ConfigError::NoConcurrency)
        );
        assert_eq!(
            ExperimentConfig::new(roster(2))
                .with_speaking_order(SpeakingOrderPattern::Hierarchical { leaders: 3 })
                .validate(),
            Err(ConfigError::TooManyLeaders {
                leaders: 3,
                participants: 2,
            })
        );
        let hot = ParticipantConfig::new("Hot", "", "m").with_temperature(3.5);
        assert!(matches!(
            ExperimentConfig::new(vec![hot]).validate(),
            Err(ConfigError::InvalidTemperature { .. })
        ));
        assert_eq!(
            ExperimentConfig::new(roster(2))
                .with_consensus(ConsensusStrategy::Threshold(1.2))
                .validate(),
            Err(ConfigError::InvalidThreshold(1.2))
        );
    }

    #[test]
    fn test_build_participants_assigns_ids() {
        let config = ExperimentConfig::new(vec![
            ParticipantConfig::new("Alice", "nurse", "m1").with_temperature(0.3),
            ParticipantConfig::new("Bob", "economist", "m2"),
        ]);
        let participants = config.build_participants();

        assert_eq!(participants[0].id.as_str(), "agent_1");
        assert_eq!(participants[1].id.as_str(), "agent_2");
        assert_eq!(participants[0].model.temperature, Some(0.3));
        assert_eq!(participants[1].name, "Bob");
    }

    #[test]
    fn test_summarizer_defaults_to_first_model() {
        let config = ExperimentConfig::new(roster(2));
        assert_eq!(
            config.summarizer_model().map(|m| m.name),
            Some("model-a".to_string())
        );

        let config = config.with_summarizer("summary-model");
        assert_eq!(
            config.summarizer_model().map(|m| m.name),
            Some("summary-model".to_string())
        );
    }

    #[test]
    fn test_public_context_parse() {
        assert_eq!(
            "summarized".parse::<PublicContextMode>().ok(),
            Some(PublicContextMode::Summarized)
        );
        assert_eq!(
            "full".parse::<PublicContextMode>().ok(),
            Some(PublicContextMode::FullTranscript)
        );
        assert!("partial".parse::<PublicContextMode>().is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = ExperimentConfig::new(roster(2)).with_seed(11);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ExperimentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
