//! Run Experiment use case
//!
//! The top-level phase machine. Phases run strictly in order on one control
//! flow; a phase may fan out independent model calls internally but never
//! advances until all of its work has completed:
//!
//! | Phase                  | Work                                    | Model calls        |
//! |------------------------|-----------------------------------------|--------------------|
//! | 1. Init                | services, ledgers, seeded RNG           | none               |
//! | 2. Initial Assessment  | private round-0 choice per participant  | fan-out            |
//! | 3. Detailed Examples   | worked examples into private notes      | none (optional)    |
//! | 4. Individual Rounds   | private choice, payout, disclosures     | fan-out per round  |
//! | 5. Group Deliberation  | rounds 1..max, consensus after each     | sequential turns   |
//! | 6. Secret Ballot       | only without unanimity                  | fan-out            |
//! | 7. Economic Settlement | group distribution, one payout each     | none               |
//! | 8. Final Assessment    | closing choice per participant          | fan-out            |
//!
//! Any error aborts the whole run: the error counter is incremented and the
//! error is returned with the failing phase attached. There is no partial
//! result.

mod assessment;
mod deliberation;
mod settlement;
mod types;

pub use types::OrchestrationError;

use types::RunState;

use crate::config::ExperimentConfig;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::conversation::ConversationService;
use crate::use_cases::memory::MemoryService;
use crate::use_cases::shared::ChoiceExtractor;
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{error, info};
use veil_domain::{
    ChoiceDecoder, ConsensusResult, ConsensusService, DomainError, EarningsTrackingService,
    EconomicsService, ExperimentResult, GroupOutcome, ParticipantSummary, Phase, PhaseTiming,
    RunTiming, Transcript,
};

/// Use case for running one complete experiment
pub struct RunExperimentUseCase<G: LlmGateway + 'static> {
    pub(super) gateway: Arc<G>,
    pub(super) config: Arc<ExperimentConfig>,
    pub(super) extractor: ChoiceExtractor,
    pub(super) logger: Arc<dyn ConversationLogger>,
    error_count: AtomicU64,
}

/// A phase that has started but not yet completed
struct PhaseClock {
    phase: Phase,
    started_at: DateTime<Utc>,
    instant: Instant,
}

impl<G: LlmGateway + 'static> RunExperimentUseCase<G> {
    pub fn new(gateway: Arc<G>, config: Arc<ExperimentConfig>) -> Self {
        Self {
            gateway,
            config,
            extractor: ChoiceExtractor::default(),
            logger: Arc::new(NoConversationLogger),
            error_count: AtomicU64::new(0),
        }
    }

    /// Set a structured logger for the deliberation record
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the digit-scan decoder used on extractor replies
    pub fn with_decoder(mut self, decoder: Arc<dyn ChoiceDecoder>) -> Self {
        self.extractor = ChoiceExtractor::new(decoder);
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Number of runs this use case has aborted
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub async fn execute(&self) -> Result<ExperimentResult, OrchestrationError> {
        self.execute_with_progress(&NoProgress).await
    }

    pub async fn execute_with_progress(
        &self,
        progress: &dyn ProgressNotifier,
    ) -> Result<ExperimentResult, OrchestrationError> {
        match self.run(progress).await {
            Ok(result) => Ok(result),
            Err(e) => {
                let failures = self.error_count.fetch_add(1, Ordering::Relaxed) + 1;
                error!(failures, "Experiment aborted: {}", e);
                let payload = json!({ "phase": e.phase(), "error": e.to_string() });
                self.logger.log(ConversationEvent::new("run_failed", payload));
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        progress: &dyn ProgressNotifier,
    ) -> Result<ExperimentResult, OrchestrationError> {
        let config = self.config.as_ref();
        if config.participants.is_empty() {
            return Err(OrchestrationError::NoParticipants);
        }
        config.validate()?;

        let started_at = Utc::now();
        let run_clock = Instant::now();
        let seed = config.seed.unwrap_or_else(rand::random);
        let experiment_id = format!("exp-{}-{:016x}", started_at.format("%Y%m%d%H%M%S"), seed);
        info!(
            experiment = %experiment_id,
            seed,
            participants = config.participants.len(),
            "Starting experiment"
        );

        let clock = self.begin_phase(Phase::Init, 0, progress);
        let mut state = self
            .init_state(experiment_id, seed)
            .map_err(|e| e.in_phase(Phase::Init))?;
        self.end_phase(&mut state, clock, progress);

        let n = state.participants.len();

        let clock = self.begin_phase(Phase::InitialAssessment, n, progress);
        self.initial_assessment(&mut state, progress)
            .await
            .map_err(|e| e.in_phase(Phase::InitialAssessment))?;
        self.end_phase(&mut state, clock, progress);

        if config.detailed_examples {
            let clock = self.begin_phase(Phase::DetailedExamples, 0, progress);
            self.detailed_examples(&mut state);
            self.end_phase(&mut state, clock, progress);
        }

        let clock = self.begin_phase(
            Phase::IndividualRounds,
            n * config.individual_rounds as usize,
            progress,
        );
        self.individual_rounds(&mut state, progress)
            .await
            .map_err(|e| e.in_phase(Phase::IndividualRounds))?;
        self.end_phase(&mut state, clock, progress);

        let clock = self.begin_phase(
            Phase::GroupDeliberation,
            n * config.max_rounds as usize,
            progress,
        );
        self.group_deliberation(&mut state, progress)
            .await
            .map_err(|e| e.in_phase(Phase::GroupDeliberation))?;
        self.end_phase(&mut state, clock, progress);

        let deliberated = state
            .consensus_result()
            .filter(|c| c.unanimous)
            .and_then(|c| c.agreed_choice.clone());
        let (agreed, via_ballot) = match deliberated {
            Some(choice) => (Some(choice), false),
            None => {
                let clock = self.begin_phase(Phase::SecretBallot, n, progress);
                let ballot = self
                    .secret_ballot(&mut state, progress)
                    .await
                    .map_err(|e| e.in_phase(Phase::SecretBallot))?;
                self.end_phase(&mut state, clock, progress);
                (ballot, true)
            }
        };

        let clock = self.begin_phase(Phase::EconomicSettlement, n, progress);
        self.settle(&mut state, agreed, via_ballot)
            .map_err(|e| e.in_phase(Phase::EconomicSettlement))?;
        self.end_phase(&mut state, clock, progress);

        let clock = self.begin_phase(Phase::FinalAssessment, n, progress);
        self.final_assessment(&mut state, progress)
            .await
            .map_err(|e| e.in_phase(Phase::FinalAssessment))?;
        self.end_phase(&mut state, clock, progress);

        let clock = self.begin_phase(Phase::Terminate, 0, progress);
        let result = self
            .assemble(state, clock, started_at, run_clock, progress)
            .map_err(|e| e.in_phase(Phase::Terminate))?;

        info!(
            experiment = %result.experiment_id,
            rounds = result.deliberation_rounds(),
            agreed = result.group_outcome.reached_agreement(),
            duration_ms = result.timing.total_duration_ms,
            "Experiment complete"
        );
        Ok(result)
    }

    fn init_state(
        &self,
        experiment_id: String,
        seed: u64,
    ) -> Result<RunState<G>, OrchestrationError> {
        let config = self.config.as_ref();
        let participants = config.build_participants();
        let ids: Vec<_> = participants.iter().map(|p| p.id.clone()).collect();

        let economics = EconomicsService::new(
            config.distributions.clone(),
            config.payout_ratio,
            config.class_weights.clone(),
        )?;
        let mut earnings = EarningsTrackingService::new(config.disclosure.clone());
        for id in &ids {
            earnings.register(id);
        }

        let memory = MemoryService::new(Arc::clone(&self.gateway), config.memory, &ids);
        let conversation = ConversationService::new(
            Arc::clone(&self.gateway),
            self.extractor.clone(),
            config.speaking_order,
            config.public_context,
            config.summarizer_model(),
            Arc::clone(&self.logger),
        );

        info!(
            memory = %config.memory,
            consensus = %config.consensus,
            speaking_order = %config.speaking_order,
            "Services ready"
        );

        Ok(RunState {
            experiment_id,
            seed,
            rng: StdRng::seed_from_u64(seed),
            participants,
            transcript: Transcript::new(),
            economics,
            earnings,
            memory,
            conversation,
            consensus: ConsensusService::new(config.consensus),
            consensus_history: Vec::new(),
            consensus_findings: Vec::new(),
            worked_examples: Vec::new(),
            individual_choices: Vec::new(),
            economic_outcomes: Vec::new(),
            secret_ballot: Vec::new(),
            group_outcome: None,
            final_assessments: Vec::new(),
            phase_timings: Vec::new(),
        })
    }

    fn begin_phase(
        &self,
        phase: Phase,
        total_tasks: usize,
        progress: &dyn ProgressNotifier,
    ) -> PhaseClock {
        info!("=== Phase: {} ===", phase);
        progress.on_phase_start(&phase, total_tasks);
        PhaseClock {
            phase,
            started_at: Utc::now(),
            instant: Instant::now(),
        }
    }

    fn end_phase(
        &self,
        state: &mut RunState<G>,
        clock: PhaseClock,
        progress: &dyn ProgressNotifier,
    ) {
        let timing = PhaseTiming {
            phase: clock.phase,
            started_at: clock.started_at,
            duration_ms: clock.instant.elapsed().as_millis() as u64,
        };
        self.logger
            .log(ConversationEvent::from_record("phase", &timing));
        state.phase_timings.push(timing);
        progress.on_phase_complete(&clock.phase);
    }

    /// Fold the run state into the result record
    fn assemble(
        &self,
        mut state: RunState<G>,
        clock: PhaseClock,
        started_at: DateTime<Utc>,
        run_clock: Instant,
        progress: &dyn ProgressNotifier,
    ) -> Result<ExperimentResult, OrchestrationError> {
        let mut participants = Vec::with_capacity(state.participants.len());
        for p in &state.participants {
            participants.push(ParticipantSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                model: p.model.name.clone(),
                final_choice: p.current_choice().cloned(),
                total_earnings: state.earnings.total(&p.id),
                percentile: state.earnings.percentile(&p.id)?,
                notes: p.notes().to_vec(),
            });
        }

        let consensus = state
            .consensus_result()
            .cloned()
            .unwrap_or_else(|| ConsensusResult::empty(state.transcript.len()));
        let group_outcome = state.group_outcome.take().ok_or_else(|| {
            DomainError::InvalidConfiguration(
                "group settlement did not record an outcome".to_string(),
            )
        })?;
        let earnings = state.earnings.ledgers().clone();
        let disclosures = state.earnings.disclosures().clone();

        self.end_phase(&mut state, clock, progress);
        let finished_at = Utc::now();

        let RunState {
            experiment_id,
            seed,
            transcript,
            memory,
            conversation,
            consensus_findings,
            worked_examples,
            individual_choices,
            economic_outcomes,
            secret_ballot,
            final_assessments,
            phase_timings,
            ..
        } = state;
        let (speaking_orders, round_summaries) = conversation.into_parts();

        Ok(ExperimentResult {
            experiment_id,
            seed,
            participants,
            worked_examples,
            individual_choices,
            transcript: transcript.into_entries(),
            memory: memory.into_ledgers(),
            speaking_orders,
            round_summaries,
            consensus,
            consensus_findings,
            secret_ballot,
            group_outcome,
            economic_outcomes,
            earnings,
            disclosures,
            final_assessments,
            timing: RunTiming {
                started_at,
                finished_at,
                total_duration_ms: run_clock.elapsed().as_millis() as u64,
                phases: phase_timings,
            },
        })
    }
}

/// Outcome of a settled group, for prompts and notes
pub(super) fn describe_outcome(outcome: &GroupOutcome, distribution_name: &str) -> String {
    match (&outcome.agreed_choice, outcome.via_secret_ballot) {
        (Some(choice), false) => format!(
            "The group agreed on {} in discussion, which selected {}.",
            choice.label(),
            distribution_name
        ),
        (Some(choice), true) => format!(
            "The group agreed on {} by secret ballot, which selected {}.",
            choice.label(),
            distribution_name
        ),
        (None, _) => format!(
            "The group did not agree, so {} was assigned at random.",
            distribution_name
        ),
    }
}
