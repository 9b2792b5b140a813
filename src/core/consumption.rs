use crate::domain::ports::OrderStore;
use crate::utils::error::Result;
use chrono::{Local, NaiveDate, NaiveDateTime};

/// Start of the serving day. 00:01, not midnight: overnight housekeeping
/// jobs stamp records into the first minute of the day and those must not
/// count against any patient.
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 1, 0)
        .expect("valid wall-clock time")
}

/// End of the serving day, 23:59:59.999.
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .expect("valid wall-clock time")
}

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Window of already-served meals for `date`: from the start of the day up
/// to whichever of `now` / end-of-day comes first. `None` when the date is
/// strictly in the future — nothing can have been served yet.
pub fn served_window(date: NaiveDate, now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = day_start(date);
    let end = now.min(day_end(date));
    (start <= end).then_some((start, end))
}

/// Sums calories a patient has already been served on a given day, across
/// every tray order whose scheduled time has passed.
pub struct ConsumptionAccumulator<'a, S: OrderStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: OrderStore + ?Sized> ConsumptionAccumulator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn consumed_calories(&self, patient_id: &str, date: NaiveDate) -> Result<i64> {
        let Some((start, end)) = served_window(date, now_local()) else {
            return Ok(0);
        };

        let orders = self.store.tray_orders_between(patient_id, start, end).await?;
        Ok(orders
            .iter()
            .flat_map(|order| order.recipes.iter())
            .map(|recipe| recipe.calories)
            .sum())
    }
}
