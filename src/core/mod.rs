mod error;
mod fire;
mod monte_carlo;
mod scenarios;
mod stats;
mod trend;
mod types;
mod what_if;

pub use error::ForecastError;
pub use fire::{MAX_MONTHS_TO_FIRE, fire_number, months_to_fire, validate_withdrawal_rate};
pub use monte_carlo::{
    DEFAULT_TRIALS, MonteCarloConfig, MonteCarloOutcome, WITHDRAWAL_PHASE_MONTHS, simulate,
};
pub use scenarios::{project_line, project_scenarios};
pub use stats::percentile;
pub use trend::estimate_trend;
pub use types::{
    DEFAULT_WITHDRAWAL_RATE, ForecastScenarios, ForecastSnapshot, ForecastSummary, MIN_SNAPSHOTS,
    MonteCarloBands, MonthPoint, NetWorthSnapshot, ScenarioSet, TrendModel, WhatIfAdjustments,
    WhatIfAssumptions, WhatIfBaseline, WhatIfResult,
};
pub use what_if::{run_what_if, validate_adjustments};

#[cfg(test)]
pub(crate) use trend::tests::monthly_series;
