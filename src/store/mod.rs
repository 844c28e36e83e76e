mod local;

use std::sync::Arc;

use thiserror::Error;

use crate::core::{ForecastScenarios, ForecastSnapshot, ForecastSummary, NetWorthSnapshot};

pub use local::{LocalStore, UserHistory};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

pub trait SnapshotRepository {
    fn load_history(&self, user_id: &str) -> Result<Vec<NetWorthSnapshot>, StoreError>;
    fn load_avg_monthly_expenses(&self, user_id: &str) -> Result<f64, StoreError>;
}

pub trait ForecastPersister {
    /// Stores one complete forecast. Implementations must write all of it or none of it.
    fn save(
        &self,
        user_id: &str,
        horizon_months: u32,
        scenarios: &ForecastScenarios,
        summary: &ForecastSummary,
    ) -> Result<(), StoreError>;

    fn latest(&self, user_id: &str, horizon_months: u32)
    -> Result<Option<ForecastSnapshot>, StoreError>;
}

impl<T: SnapshotRepository + ?Sized> SnapshotRepository for Arc<T> {
    fn load_history(&self, user_id: &str) -> Result<Vec<NetWorthSnapshot>, StoreError> {
        (**self).load_history(user_id)
    }

    fn load_avg_monthly_expenses(&self, user_id: &str) -> Result<f64, StoreError> {
        (**self).load_avg_monthly_expenses(user_id)
    }
}

impl<T: ForecastPersister + ?Sized> ForecastPersister for Arc<T> {
    fn save(
        &self,
        user_id: &str,
        horizon_months: u32,
        scenarios: &ForecastScenarios,
        summary: &ForecastSummary,
    ) -> Result<(), StoreError> {
        (**self).save(user_id, horizon_months, scenarios, summary)
    }

    fn latest(
        &self,
        user_id: &str,
        horizon_months: u32,
    ) -> Result<Option<ForecastSnapshot>, StoreError> {
        (**self).latest(user_id, horizon_months)
    }
}

impl<T: SnapshotRepository + ?Sized> SnapshotRepository for &T {
    fn load_history(&self, user_id: &str) -> Result<Vec<NetWorthSnapshot>, StoreError> {
        (**self).load_history(user_id)
    }

    fn load_avg_monthly_expenses(&self, user_id: &str) -> Result<f64, StoreError> {
        (**self).load_avg_monthly_expenses(user_id)
    }
}

impl<T: ForecastPersister + ?Sized> ForecastPersister for &T {
    fn save(
        &self,
        user_id: &str,
        horizon_months: u32,
        scenarios: &ForecastScenarios,
        summary: &ForecastSummary,
    ) -> Result<(), StoreError> {
        (**self).save(user_id, horizon_months, scenarios, summary)
    }

    fn latest(
        &self,
        user_id: &str,
        horizon_months: u32,
    ) -> Result<Option<ForecastSnapshot>, StoreError> {
        (**self).latest(user_id, horizon_months)
    }
}
