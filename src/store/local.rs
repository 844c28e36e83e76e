use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ForecastPersister, SnapshotRepository, StoreError};
use crate::core::{ForecastScenarios, ForecastSnapshot, ForecastSummary, NetWorthSnapshot};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserHistory {
    pub snapshots: Vec<NetWorthSnapshot>,
    pub avg_monthly_expenses: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoreState {
    histories: BTreeMap<String, UserHistory>,
    forecasts: BTreeMap<String, Vec<ForecastSnapshot>>,
}

#[derive(Debug, Default)]
pub struct LocalStore {
    path: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = if path.exists() {
            let raw = fs::read(&path)?;
            serde_json::from_slice::<StoreState>(&raw)?
        } else {
            StoreState::default()
        };
        info!(
            path = %path.display(),
            users = state.histories.len(),
            "opened forecast store"
        );

        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    pub fn record_history(&self, user_id: &str, mut history: UserHistory) -> Result<(), StoreError> {
        history.snapshots.sort_by_key(|s| s.date);
        let mut state = self.write()?;
        let previous = state.histories.insert(user_id.to_string(), history);
        if let Err(e) = self.persist(&state) {
            match previous {
                Some(prev) => state.histories.insert(user_id.to_string(), prev),
                None => state.histories.remove(user_id),
            };
            return Err(e);
        }
        Ok(())
    }

    pub fn history(&self, user_id: &str, horizon_months: u32) -> Result<Vec<ForecastSnapshot>, StoreError> {
        let state = self.read()?;
        Ok(state
            .forecasts
            .get(user_id)
            .map(|all| {
                all.iter()
                    .filter(|f| f.horizon_months == horizon_months)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(state)?;
        write_atomically(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "persisted forecast store");
        Ok(())
    }
}

/// Writes to a sibling temp file first so readers never observe a partial file.
fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

impl SnapshotRepository for LocalStore {
    fn load_history(&self, user_id: &str) -> Result<Vec<NetWorthSnapshot>, StoreError> {
        let state = self.read()?;
        Ok(state
            .histories
            .get(user_id)
            .map(|h| h.snapshots.clone())
            .unwrap_or_default())
    }

    fn load_avg_monthly_expenses(&self, user_id: &str) -> Result<f64, StoreError> {
        let state = self.read()?;
        Ok(state
            .histories
            .get(user_id)
            .map(|h| h.avg_monthly_expenses)
            .unwrap_or(0.0))
    }
}

impl ForecastPersister for LocalStore {
    fn save(
        &self,
        user_id: &str,
        horizon_months: u32,
        scenarios: &ForecastScenarios,
        summary: &ForecastSummary,
    ) -> Result<(), StoreError> {
        let snapshot = ForecastSnapshot {
            horizon_months,
            scenarios: scenarios.clone(),
            summary: summary.clone(),
            created_at: Utc::now(),
        };

        let mut state = self.write()?;
        state
            .forecasts
            .entry(user_id.to_string())
            .or_default()
            .push(snapshot);
        if let Err(e) = self.persist(&state) {
            if let Some(all) = state.forecasts.get_mut(user_id) {
                all.pop();
            }
            return Err(e);
        }
        Ok(())
    }

    fn latest(
        &self,
        user_id: &str,
        horizon_months: u32,
    ) -> Result<Option<ForecastSnapshot>, StoreError> {
        let state = self.read()?;
        Ok(state.forecasts.get(user_id).and_then(|all| {
            all.iter()
                .rev()
                .find(|f| f.horizon_months == horizon_months)
                .cloned()
        }))
    }
}
