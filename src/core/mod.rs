pub mod budget;
pub mod composer;
pub mod consumption;
pub mod scheduler;

pub use crate::domain::model::{ExecutionResult, MealSlot, PrepExecution, Recipe, RecipePools};
pub use crate::domain::ports::{ExecutionLog, OrderStore, PatientDirectory, PrepStore, Selector};
pub use crate::utils::error::Result;
