use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::{
    DEFAULT_TRIALS, DEFAULT_WITHDRAWAL_RATE, ForecastError, ForecastScenarios, ForecastSnapshot,
    ForecastSummary, MIN_SNAPSHOTS, MonteCarloConfig, WhatIfAdjustments, WhatIfBaseline,
    WhatIfResult, estimate_trend, fire_number, months_to_fire, project_scenarios, run_what_if,
    simulate, validate_withdrawal_rate,
};
use crate::store::{ForecastPersister, SnapshotRepository};

pub const DEFAULT_MAX_HORIZON_MONTHS: u32 = 1_200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    pub trials: u32,
    pub seed: Option<u64>,
    pub max_horizon_months: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: None,
            max_horizon_months: DEFAULT_MAX_HORIZON_MONTHS,
        }
    }
}

impl ForecastSettings {
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.trials == 0 {
            return Err(ForecastError::invalid("trials must be > 0"));
        }
        if self.max_horizon_months == 0 {
            return Err(ForecastError::invalid("max horizon must be > 0 months"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub horizon_months: u32,
    #[serde(default)]
    pub withdrawal_rate: Option<f64>,
    // Nominal outputs only; deflating is left to the caller.
    #[serde(default)]
    pub inflation_rate: Option<f64>,
}

impl GenerateRequest {
    pub fn new(horizon_months: u32) -> Self {
        Self {
            horizon_months,
            withdrawal_rate: None,
            inflation_rate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    Generated(ForecastSummary),
    InsufficientData { found: usize },
}

#[derive(Debug)]
pub struct ForecastService<R, P> {
    repository: R,
    persister: P,
    settings: ForecastSettings,
}

impl<R, P> ForecastService<R, P>
where
    R: SnapshotRepository,
    P: ForecastPersister,
{
    pub fn new(repository: R, persister: P, settings: ForecastSettings) -> Result<Self, ForecastError> {
        settings.validate()?;
        Ok(Self {
            repository,
            persister,
            settings,
        })
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn generate(&self, user_id: &str, request: &GenerateRequest) -> Result<GenerateOutcome, ForecastError> {
        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.generate_with_rng(user_id, request, &mut rng)
    }

    pub fn generate_with_rng<G: RngCore + ?Sized>(
        &self,
        user_id: &str,
        request: &GenerateRequest,
        rng: &mut G,
    ) -> Result<GenerateOutcome, ForecastError> {
        let history = self.repository.load_history(user_id)?;
        if history.len() < MIN_SNAPSHOTS {
            warn!(
                user_id,
                found = history.len(),
                required = MIN_SNAPSHOTS,
                "skipping forecast generation: not enough net worth history"
            );
            return Ok(GenerateOutcome::InsufficientData {
                found: history.len(),
            });
        }

        self.validate_horizon(request.horizon_months)?;
        let withdrawal_rate = request.withdrawal_rate.unwrap_or(DEFAULT_WITHDRAWAL_RATE);
        validate_withdrawal_rate(withdrawal_rate)?;
        if let Some(inflation) = request.inflation_rate {
            debug!(user_id, inflation, "inflation rate left to presentation layer");
        }

        let avg_monthly_expenses = self.repository.load_avg_monthly_expenses(user_id)?;
        let trend = estimate_trend(&history)?;
        let Some(latest) = history.last() else {
            return Ok(GenerateOutcome::InsufficientData { found: 0 });
        };
        let current_net_worth = latest.net_worth;
        let liquid_net_worth = latest.liquid_net_worth();
        debug!(
            user_id,
            slope = trend.slope_per_month,
            sigma = trend.residual_std_dev_per_month,
            samples = trend.sample_count,
            "fitted net worth trend"
        );

        let target = fire_number(avg_monthly_expenses, withdrawal_rate)?;
        let scenarios = project_scenarios(&trend, current_net_worth, request.horizon_months);
        let monte_carlo = simulate(
            &trend,
            liquid_net_worth,
            target,
            &MonteCarloConfig {
                trials: self.settings.trials,
                horizon_months: request.horizon_months,
                withdrawal_rate,
            },
            rng,
        )?;

        let summary = ForecastSummary {
            fire_number: target,
            months_to_fire: months_to_fire(liquid_net_worth, target, trend.slope_per_month),
            avg_monthly_savings: trend.slope_per_month,
            monthly_volatility: trend.residual_std_dev_per_month,
            withdrawal_rate,
            liquid_net_worth,
            illiquid_net_worth: latest.illiquid_assets,
            mc_fire_probability: monte_carlo.fire_probability,
            mc_months_to_fire_p10: monte_carlo.months_to_fire_p10,
            mc_months_to_fire_p50: monte_carlo.months_to_fire_p50,
            mc_months_to_fire_p90: monte_carlo.months_to_fire_p90,
            mc_sustainability_rate: monte_carlo.sustainability_rate,
        };
        let scenarios = ForecastScenarios {
            scenarios,
            monte_carlo: monte_carlo.bands,
        };

        self.persister
            .save(user_id, request.horizon_months, &scenarios, &summary)?;
        info!(
            user_id,
            horizon_months = request.horizon_months,
            fire_number = summary.fire_number,
            months_to_fire = ?summary.months_to_fire,
            fire_probability = summary.mc_fire_probability,
            "generated forecast"
        );
        Ok(GenerateOutcome::Generated(summary))
    }

    pub fn latest(&self, user_id: &str, horizon_months: u32) -> Result<Option<ForecastSnapshot>, ForecastError> {
        Ok(self.persister.latest(user_id, horizon_months)?)
    }

    pub fn what_if(
        &self,
        user_id: &str,
        adjustments: &WhatIfAdjustments,
        horizon_months: u32,
    ) -> Result<WhatIfResult, ForecastError> {
        self.validate_horizon(horizon_months)?;
        let history = self.repository.load_history(user_id)?;
        let trend = estimate_trend(&history)?;
        let avg_monthly_expenses = self.repository.load_avg_monthly_expenses(user_id)?;
        let Some(latest) = history.last() else {
            return Err(ForecastError::InsufficientData {
                found: 0,
                required: MIN_SNAPSHOTS,
            });
        };

        let baseline = WhatIfBaseline {
            current_net_worth: latest.net_worth,
            monthly_income: avg_monthly_expenses + trend.slope_per_month,
            monthly_expenses: avg_monthly_expenses,
        };
        let result = run_what_if(&baseline, adjustments, horizon_months)?;
        debug!(
            user_id,
            horizon_months,
            improvement = result.assumptions.monthly_improvement_vs_baseline,
            "computed what-if projection"
        );
        Ok(result)
    }

    fn validate_horizon(&self, horizon_months: u32) -> Result<(), ForecastError> {
        if horizon_months == 0 || horizon_months > self.settings.max_horizon_months {
            return Err(ForecastError::invalid(format!(
                "horizonMonths must be between 1 and {}, got {horizon_months}",
                self.settings.max_horizon_months
            )));
        }
        Ok(())
    }
}
