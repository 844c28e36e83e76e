use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WITHDRAWAL_RATE: f64 = 0.04;
pub const MIN_SNAPSHOTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthSnapshot {
    pub date: NaiveDate,
    pub net_worth: f64,
    /// Real estate, vehicles and other holdings that cannot fund withdrawals.
    #[serde(default)]
    pub illiquid_assets: f64,
}

impl NetWorthSnapshot {
    pub fn new(date: NaiveDate, net_worth: f64) -> Self {
        Self {
            date,
            net_worth,
            illiquid_assets: 0.0,
        }
    }

    pub fn liquid_net_worth(&self) -> f64 {
        self.net_worth - self.illiquid_assets
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendModel {
    pub slope_per_month: f64,
    pub intercept: f64,
    pub residual_std_dev_per_month: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthPoint {
    pub month: u32,
    pub net_worth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub base: Vec<MonthPoint>,
    pub optimistic: Vec<MonthPoint>,
    pub pessimistic: Vec<MonthPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloBands {
    pub p10: Vec<MonthPoint>,
    pub p25: Vec<MonthPoint>,
    pub p50: Vec<MonthPoint>,
    pub p75: Vec<MonthPoint>,
    pub p90: Vec<MonthPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastScenarios {
    #[serde(flatten)]
    pub scenarios: ScenarioSet,
    pub monte_carlo: MonteCarloBands,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSummary {
    pub fire_number: f64,
    pub months_to_fire: Option<u32>,
    pub avg_monthly_savings: f64,
    pub monthly_volatility: f64,
    pub withdrawal_rate: f64,
    pub liquid_net_worth: f64,
    pub illiquid_net_worth: f64,
    #[serde(rename = "mc_fireProbability")]
    pub mc_fire_probability: u32,
    #[serde(rename = "mc_monthsToFire_p10")]
    pub mc_months_to_fire_p10: Option<u32>,
    #[serde(rename = "mc_monthsToFire_p50")]
    pub mc_months_to_fire_p50: Option<u32>,
    #[serde(rename = "mc_monthsToFire_p90")]
    pub mc_months_to_fire_p90: Option<u32>,
    #[serde(rename = "mc_sustainabilityRate")]
    pub mc_sustainability_rate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSnapshot {
    pub horizon_months: u32,
    pub scenarios: ForecastScenarios,
    pub summary: ForecastSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WhatIfAdjustments {
    pub income_change_pct: f64,
    pub expense_change_pct: f64,
    pub extra_monthly_savings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhatIfBaseline {
    pub current_net_worth: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfAssumptions {
    pub adjusted_monthly_income: f64,
    pub adjusted_monthly_expenses: f64,
    pub adjusted_monthly_savings: f64,
    pub monthly_improvement_vs_baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfResult {
    pub baseline: Vec<MonthPoint>,
    pub what_if: Vec<MonthPoint>,
    pub assumptions: WhatIfAssumptions,
}
