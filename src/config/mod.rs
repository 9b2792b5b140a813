pub mod dataset;

use crate::core::scheduler::DEFAULT_HISTORY_LIMIT;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_meal_slot, validate_path, validate_positive_number, Validate,
};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "mealprep")]
#[command(about = "Automated meal ordering for patients on calorie-bounded diets")]
pub struct CliConfig {
    /// TOML dataset seeding the store
    #[arg(long, default_value = "./dataset.toml")]
    pub dataset: String,

    /// Meal slot to prep (breakfast, lunch, dinner); derived from the cron
    /// trigger window when omitted
    #[arg(long)]
    pub slot: Option<String>,

    /// Print recent prep executions after the run
    #[arg(long)]
    pub history: bool,

    /// Number of execution records shown with --history
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON logs for cron capture")]
    pub log_json: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("dataset", &self.dataset)?;
        validate_positive_number("limit", self.limit, 1)?;
        if let Some(slot) = &self.slot {
            validate_meal_slot("slot", slot)?;
        }
        Ok(())
    }
}
