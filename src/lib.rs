pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::memory::InMemoryStore;
pub use config::{dataset::Dataset, CliConfig};
pub use core::composer::{MealComposer, UniformSelector};
pub use core::scheduler::PrepScheduler;
pub use domain::model::{ExecutionResult, MealSlot};
pub use utils::error::{PrepError, Result};
