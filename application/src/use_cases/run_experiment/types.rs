//! Type definitions for the RunExperiment use case.

use crate::config::ConfigError;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::use_cases::conversation::ConversationService;
use crate::use_cases::fan_out::FanOutError;
use crate::use_cases::memory::MemoryService;
use rand::rngs::StdRng;
use thiserror::Error;
use veil_domain::{
    BallotEntry, ConsensusResult, ConsensusService, DomainError, EarningsTrackingService,
    EconomicOutcome, EconomicsService, FinalAssessment, GroupOutcome, IndividualChoice,
    Participant, Phase, PhaseTiming, SuspicionReason, Transcript, WorkedExample,
};

/// Errors that abort an experiment run
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("No participants configured")]
    NoParticipants,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Fan-out error: {0}")]
    FanOut(#[from] FanOutError),

    #[error("{phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<OrchestrationError>,
    },
}

impl OrchestrationError {
    /// Attach the phase in which the error happened (idempotent)
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            OrchestrationError::Phase { .. } => self,
            other => OrchestrationError::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The phase the run failed in, if known
    pub fn phase(&self) -> Option<Phase> {
        match self {
            OrchestrationError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

/// Everything one run owns, mutated only by the orchestrator's control flow
pub(super) struct RunState<G: LlmGateway + 'static> {
    pub experiment_id: String,
    pub seed: u64,
    pub rng: StdRng,
    pub participants: Vec<Participant>,
    pub transcript: Transcript,
    pub economics: EconomicsService,
    pub earnings: EarningsTrackingService,
    pub memory: MemoryService<G>,
    pub conversation: ConversationService<G>,
    pub consensus: ConsensusService,
    /// One result per deliberation round, in order
    pub consensus_history: Vec<ConsensusResult>,
    pub consensus_findings: Vec<SuspicionReason>,
    pub worked_examples: Vec<WorkedExample>,
    pub individual_choices: Vec<IndividualChoice>,
    pub economic_outcomes: Vec<EconomicOutcome>,
    pub secret_ballot: Vec<BallotEntry>,
    pub group_outcome: Option<GroupOutcome>,
    pub final_assessments: Vec<FinalAssessment>,
    pub phase_timings: Vec<PhaseTiming>,
}

impl<G: LlmGateway + 'static> RunState<G> {
    /// The latest consensus check, if any round was held
    pub fn consensus_result(&self) -> Option<&ConsensusResult> {
        self.consensus_history.last()
    }

    /// Deliberation rounds held so far
    pub fn rounds_held(&self) -> u32 {
        self.conversation.speaking_order_history().len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_phase_wraps_once() {
        let error = OrchestrationError::NoParticipants
            .in_phase(Phase::SecretBallot)
            .in_phase(Phase::FinalAssessment);

        assert_eq!(error.phase(), Some(Phase::SecretBallot));
        assert_eq!(
            error.to_string(),
            "Secret Ballot failed: No participants configured"
        );
    }

    #[test]
    fn test_gateway_error_converts() {
        let error: OrchestrationError = GatewayError::Timeout.into();
        assert!(matches!(error, OrchestrationError::Gateway(_)));
        assert_eq!(error.phase(), None);
    }
}
