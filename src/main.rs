use clap::Parser;
use mealprep::core::consumption::now_local;
use mealprep::utils::{logger, validation::Validate};
use mealprep::{
    CliConfig, Dataset, InMemoryStore, MealComposer, MealSlot, PrepScheduler, UniformSelector,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting mealprep");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }

    // With no explicit slot, behave like the cron entry point: map the wall
    // clock to a trigger window, and do nothing outside every window.
    let slot = match &config.slot {
        Some(raw) => raw.parse::<MealSlot>()?,
        None => match MealSlot::for_trigger_time(now_local().time()) {
            Some(slot) => slot,
            None => {
                tracing::info!("Outside of meal prep trigger window. No action taken.");
                return Ok(());
            }
        },
    };

    let dataset = Dataset::load(&config.dataset)?;
    let store = Arc::new(InMemoryStore::from_dataset(dataset)?);
    let mut scheduler = PrepScheduler::new(store, MealComposer::new(UniformSelector));

    let result = scheduler.run(slot).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if config.history {
        let executions = scheduler.executions(None, config.limit).await?;
        println!("{}", serde_json::to_string_pretty(&executions)?);
    }

    Ok(())
}
