//! Run Batch use case
//!
//! Runs many independent experiments against one gateway. Each run owns its
//! complete state; the only thing shared is the gateway and a semaphore that
//! bounds how many runs are in flight at once.

use crate::config::ExperimentConfig;
use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::run_experiment::{OrchestrationError, RunExperimentUseCase};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use veil_domain::ExperimentResult;

pub struct RunBatchUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    max_concurrent_experiments: usize,
    logger: Arc<dyn ConversationLogger>,
}

impl<G: LlmGateway + 'static> RunBatchUseCase<G> {
    /// A limit of 0 is treated as 1
    pub fn new(gateway: Arc<G>, max_concurrent_experiments: usize) -> Self {
        Self {
            gateway,
            max_concurrent_experiments: max_concurrent_experiments.max(1),
            logger: Arc::new(NoConversationLogger),
        }
    }

    /// Share one structured logger across every run in the batch
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn max_concurrent_experiments(&self) -> usize {
        self.max_concurrent_experiments
    }

    /// Run every configuration; results come back in input order
    ///
    /// A failed run does not stop the others.
    pub async fn execute(
        &self,
        configs: Vec<ExperimentConfig>,
        progress: &dyn ProgressNotifier,
    ) -> Vec<Result<ExperimentResult, OrchestrationError>> {
        let total = configs.len();
        info!(
            experiments = total,
            concurrency = self.max_concurrent_experiments,
            "Starting batch"
        );

        let gate = Arc::new(Semaphore::new(self.max_concurrent_experiments));
        let runs = configs.into_iter().enumerate().map(|(index, config)| {
            let gate = Arc::clone(&gate);
            let use_case = RunExperimentUseCase::new(Arc::clone(&self.gateway), Arc::new(config))
                .with_conversation_logger(Arc::clone(&self.logger));
            async move {
                let _permit = gate.acquire_owned().await.ok();
                let result = use_case.execute_with_progress(progress).await;
                match &result {
                    Ok(r) => info!(
                        run = index + 1,
                        total,
                        experiment = r.experiment_id.as_str(),
                        "Run finished"
                    ),
                    Err(e) => warn!(run = index + 1, total, "Run failed: {}", e),
                }
                result
            }
        });

        let results = join_all(runs).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(experiments = total, failed, "Batch complete");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParticipantConfig;
    use crate::ports::progress::NoProgress;
    use crate::testing::ScriptedGateway;

    fn config(seed: u64) -> ExperimentConfig {
        ExperimentConfig::new(vec![
            ParticipantConfig::new("Ann", "persona", "test-model"),
            ParticipantConfig::new("Ben", "persona", "test-model"),
        ])
        .with_individual_rounds(1)
        .with_max_rounds(2)
        .with_seed(seed)
    }

    #[tokio::test]
    async fn test_batch_returns_results_in_input_order() {
        let gateway = Arc::new(ScriptedGateway::voting(&[("Ann", 2), ("Ben", 2)]));
        let batch = RunBatchUseCase::new(gateway, 2);

        let results = batch
            .execute(vec![config(1), config(2), config(3)], &NoProgress)
            .await;

        let seeds: Vec<u64> = results.iter().map(|r| r.as_ref().unwrap().seed).collect();
        assert_eq!(seeds, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failed_run_does_not_stop_the_batch() {
        let gateway = Arc::new(ScriptedGateway::voting(&[("Ann", 2), ("Ben", 2)]));
        let batch = RunBatchUseCase::new(gateway, 1);

        let results = batch
            .execute(
                vec![config(1), ExperimentConfig::default(), config(3)],
                &NoProgress,
            )
            .await;

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(OrchestrationError::NoParticipants)));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let batch = RunBatchUseCase::new(Arc::new(ScriptedGateway::echo()), 0);
        assert_eq!(batch.max_concurrent_experiments(), 1);
    }
}
