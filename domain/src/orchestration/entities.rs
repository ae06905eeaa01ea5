//! Orchestration domain entities

use serde::{Deserialize, Serialize};

/// Phase of an experiment run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    /// Round 0: every participant states a private first choice
    InitialAssessment,
    /// Optional worked examples of each principle (no model calls)
    DetailedExamples,
    /// Private choices with individual payouts
    IndividualRounds,
    /// Turn-taking discussion, rounds 1..=max_rounds
    GroupDeliberation,
    /// Private vote when deliberation ended without unanimity
    SecretBallot,
    EconomicSettlement,
    FinalAssessment,
    Terminate,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Init => "init",
            Phase::InitialAssessment => "initial_assessment",
            Phase::DetailedExamples => "detailed_examples",
            Phase::IndividualRounds => "individual_rounds",
            Phase::GroupDeliberation => "group_deliberation",
            Phase::SecretBallot => "secret_ballot",
            Phase::EconomicSettlement => "economic_settlement",
            Phase::FinalAssessment => "final_assessment",
            Phase::Terminate => "terminate",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::Init => "Initialization",
            Phase::InitialAssessment => "Initial Assessment",
            Phase::DetailedExamples => "Detailed Examples",
            Phase::IndividualRounds => "Individual Rounds",
            Phase::GroupDeliberation => "Group Deliberation",
            Phase::SecretBallot => "Secret Ballot",
            Phase::EconomicSettlement => "Economic Settlement",
            Phase::FinalAssessment => "Final Assessment",
            Phase::Terminate => "Terminate",
        }
    }

}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
