//! CLI entrypoint for veil-council
//!
//! Wires the configuration loader, the OpenAI-compatible gateway and the
//! experiment use cases together, then prints the results.

mod args;
mod progress;

use anyhow::{Context, Result, bail};
use args::{Cli, OutputFormat};
use clap::Parser;
use progress::LogProgress;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use veil_application::{
    ConversationLogger, ExperimentConfig, NoProgress, ProgressNotifier, RunBatchUseCase,
    RunExperimentUseCase,
};
use veil_domain::ExperimentResult;
use veil_infrastructure::{ConfigLoader, JsonlConversationLogger, OpenAiGateway};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Phase progress is logged at info, so keep it visible unless --quiet
    let filter = match (cli.verbose, cli.quiet) {
        (0, true) => EnvFilter::new("warn"),
        (0 | 1, _) => EnvFilter::new("info"),
        (2, _) => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        if let Some(path) = &cli.config
            && !path.exists()
        {
            bail!("Config file not found: {}", path.display());
        }
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    let mut config = file_config
        .to_experiment_config()
        .context("Invalid experiment configuration")?;
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    info!(
        participants = config.participants.len(),
        max_rounds = config.max_rounds,
        consensus = %config.consensus,
        "Starting veil-council"
    );

    // === Dependency Injection ===
    let gateway = Arc::new(OpenAiGateway::from_config(&file_config.gateway)?);

    let logger: Option<Arc<dyn ConversationLogger>> = match &cli.conversation_log {
        Some(path) => {
            let logger = JsonlConversationLogger::new(path)
                .with_context(|| format!("Could not open conversation log {}", path.display()))?;
            Some(Arc::new(logger))
        }
        None => None,
    };

    let progress: Box<dyn ProgressNotifier> = if cli.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(LogProgress::new())
    };

    let results = if cli.repeat > 1 {
        let configs = repeat_configs(&config, cli.repeat);
        let mut batch = RunBatchUseCase::new(gateway, cli.max_concurrent_experiments);
        if let Some(logger) = logger {
            batch = batch.with_conversation_logger(logger);
        }

        let mut results = Vec::with_capacity(configs.len());
        for (index, result) in batch
            .execute(configs, progress.as_ref())
            .await
            .into_iter()
            .enumerate()
        {
            match result {
                Ok(r) => results.push(r),
                Err(e) => tracing::error!("Run {} failed: {}", index + 1, e),
            }
        }
        if results.is_empty() {
            bail!("All {} runs failed", cli.repeat);
        }
        results
    } else {
        let mut use_case = RunExperimentUseCase::new(gateway, Arc::new(config));
        if let Some(logger) = logger {
            use_case = use_case.with_conversation_logger(logger);
        }
        vec![use_case.execute_with_progress(progress.as_ref()).await?]
    };

    let rendered = match cli.output {
        OutputFormat::Json if results.len() == 1 => serde_json::to_string_pretty(&results[0])?,
        OutputFormat::Json => serde_json::to_string_pretty(&results)?,
        OutputFormat::Summary => results.iter().map(summarize).collect::<Vec<_>>().join("\n"),
    };

    match &cli.output_file {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote results to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// One config per run; with a fixed seed, run `i` uses `seed + i`
fn repeat_configs(config: &ExperimentConfig, repeat: u32) -> Vec<ExperimentConfig> {
    (0..u64::from(repeat))
        .map(|i| match config.seed {
            Some(seed) => config.clone().with_seed(seed.wrapping_add(i)),
            None => config.clone(),
        })
        .collect()
}

fn summarize(result: &ExperimentResult) -> String {
    let outcome = &result.group_outcome;
    let agreement = match &outcome.agreed_choice {
        Some(choice) if outcome.via_secret_ballot => {
            format!("agreed on {} by secret ballot", choice.principle_id)
        }
        Some(choice) => format!(
            "agreed on {} after {} round(s)",
            choice.principle_id,
            result.deliberation_rounds()
        ),
        None => "no agreement, distribution drawn at random".to_string(),
    };

    let mut lines = vec![
        format!("{} (seed {})", result.experiment_id, result.seed),
        format!("  {}; paid by {}", agreement, outcome.distribution_id),
    ];
    if !result.consensus_trusted() {
        lines.push(format!(
            "  consensus flagged: {} finding(s)",
            result.consensus_findings.len()
        ));
    }
    for p in &result.participants {
        lines.push(format!(
            "  {:<16} ${:>10.2}  (percentile {:.2})",
            p.name, p.total_earnings, p.percentile
        ));
    }
    lines.push(format!("  total paid out ${:.2}", result.total_payout()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_application::ParticipantConfig;

    #[test]
    fn test_repeat_configs_offsets_seed() {
        let config =
            ExperimentConfig::new(vec![ParticipantConfig::new("Ann", "", "m")]).with_seed(10);
        let seeds: Vec<_> = repeat_configs(&config, 3).iter().map(|c| c.seed).collect();
        assert_eq!(seeds, vec![Some(10), Some(11), Some(12)]);
    }

    #[test]
    fn test_repeat_configs_without_seed_stays_unseeded() {
        let config = ExperimentConfig::new(vec![ParticipantConfig::new("Ann", "", "m")]);
        assert!(repeat_configs(&config, 2).iter().all(|c| c.seed.is_none()));
    }
}
