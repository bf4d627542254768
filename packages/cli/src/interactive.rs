//! Menu-driven stage selection for running without a subcommand.

use dialoguer::{Confirm, MultiSelect};
use eclipse_map_cli_utils::{IndicatifProgress, MultiProgress};
use eclipse_map_pipeline::progress::ProgressCallback;
use eclipse_map_pipeline::{Pipeline, PipelineConfig};

use crate::{Commands, run_command};

/// Prompts for the stages to run and whether to rebuild cached results,
/// then runs the selected stages in menu order.
///
/// # Errors
///
/// Returns an error if a prompt fails or any selected stage fails.
pub async fn run(
    config: PipelineConfig,
    force: bool,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Eclipse Tweet Map");
    println!();
    println!("Resources: {}", config.resources_dir.display());
    println!("Tweets:    {}", config.tweets_path.display());
    println!();

    let labels: Vec<&str> = Commands::ALL.iter().map(|c| c.label()).collect();
    let mut defaults = vec![false; labels.len()];
    defaults[0] = true;

    let selected = MultiSelect::new()
        .with_prompt("Stages to run (space=toggle, enter=confirm)")
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    if selected.is_empty() {
        println!("No stages selected.");
        return Ok(());
    }

    let force = force
        || Confirm::new()
            .with_prompt("Rebuild cached results?")
            .default(false)
            .interact()?;

    let pipeline = Pipeline::new(config, force)?;

    #[allow(clippy::cast_possible_truncation)]
    let steps = IndicatifProgress::steps_bar(multi, "Stages", selected.len() as u64);

    for idx in selected {
        let command = Commands::ALL[idx];
        steps.set_message(command.label().to_string());
        run_command(&pipeline, command, multi).await?;
        steps.inc(1);
    }

    steps.finish("All selected stages complete".to_string());
    Ok(())
}
