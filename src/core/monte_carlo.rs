use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};

use super::error::ForecastError;
use super::fire::validate_withdrawal_rate;
use super::stats::{percentile, percentile_sorted};
use super::types::{MonteCarloBands, MonthPoint, TrendModel};

pub const DEFAULT_TRIALS: u32 = 1_000;
pub const WITHDRAWAL_PHASE_MONTHS: u32 = 360;

#[derive(Debug, Clone, Copy)]
pub struct MonteCarloConfig {
    pub trials: u32,
    pub horizon_months: u32,
    pub withdrawal_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloOutcome {
    pub bands: MonteCarloBands,
    pub fire_probability: u32,
    pub months_to_fire_p10: Option<u32>,
    pub months_to_fire_p50: Option<u32>,
    pub months_to_fire_p90: Option<u32>,
    pub sustainability_rate: Option<u32>,
}

#[derive(Debug)]
struct TrialPath {
    balances: Vec<f64>,
    reached_month: Option<u32>,
}

/// `rng` only seeds the trials: one seed per trial is drawn up front and each
/// trial owns its generator, so a trial's path does not depend on the horizon
/// or on any other trial.
pub fn simulate<R: RngCore + ?Sized>(
    trend: &TrendModel,
    liquid_net_worth: f64,
    fire_number: f64,
    config: &MonteCarloConfig,
    rng: &mut R,
) -> Result<MonteCarloOutcome, ForecastError> {
    if config.trials == 0 {
        return Err(ForecastError::invalid("Monte Carlo trial count must be > 0"));
    }
    if config.horizon_months == 0 {
        return Err(ForecastError::invalid("Monte Carlo horizon must be > 0 months"));
    }
    validate_withdrawal_rate(config.withdrawal_rate)?;
    if !liquid_net_worth.is_finite() || !fire_number.is_finite() {
        return Err(ForecastError::invalid("starting net worth and target must be finite"));
    }

    let monthly_change = Normal::new(
        trend.slope_per_month,
        trend.residual_std_dev_per_month.max(0.0),
    )
    .map_err(|e| ForecastError::invalid(format!("invalid savings distribution: {e}")))?;

    let seeds = (0..config.trials).map(|_| rng.next_u64()).collect::<Vec<_>>();
    let paths = seeds
        .into_iter()
        .map(|seed| {
            run_trial(
                &monthly_change,
                liquid_net_worth,
                fire_number,
                config.horizon_months,
                seed,
            )
        })
        .collect::<Vec<_>>();

    let mut reached_months = paths
        .iter()
        .filter_map(|p| p.reached_month.map(f64::from))
        .collect::<Vec<_>>();
    let reached = reached_months.len();
    let months_at = |values: &mut [f64], p: f64| percentile(values, p).map(|m| m.round() as u32);

    let monthly_withdrawal = fire_number.max(0.0) * config.withdrawal_rate / 12.0;
    // Every reaching trial retires on exactly the target amount, so they share one outcome.
    let sustainability_rate = (reached > 0).then(|| {
        let survivors = if survives_withdrawal_phase(fire_number.max(0.0), monthly_withdrawal) {
            reached
        } else {
            0
        };
        whole_percent(survivors, reached)
    });

    Ok(MonteCarloOutcome {
        bands: net_worth_bands(&paths, config.horizon_months),
        fire_probability: whole_percent(reached, paths.len()),
        months_to_fire_p10: months_at(reached_months.as_mut_slice(), 10.0),
        months_to_fire_p50: months_at(reached_months.as_mut_slice(), 50.0),
        months_to_fire_p90: months_at(reached_months.as_mut_slice(), 90.0),
        sustainability_rate,
    })
}

fn run_trial(
    monthly_change: &Normal<f64>,
    start: f64,
    fire_number: f64,
    horizon_months: u32,
    seed: u64,
) -> TrialPath {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut balances = Vec::with_capacity(horizon_months as usize);
    let mut reached_month = None;
    let mut balance = start;

    for month in 0..horizon_months {
        if month > 0 {
            balance += monthly_change.sample(&mut rng);
        }
        balances.push(balance);
        if reached_month.is_none() && balance >= fire_number {
            reached_month = Some(month);
        }
    }

    TrialPath {
        balances,
        reached_month,
    }
}

fn survives_withdrawal_phase(start: f64, monthly_withdrawal: f64) -> bool {
    let mut balance = start;
    for _ in 0..WITHDRAWAL_PHASE_MONTHS {
        balance -= monthly_withdrawal;
        if balance < 0.0 {
            return false;
        }
    }
    true
}

fn net_worth_bands(paths: &[TrialPath], horizon_months: u32) -> MonteCarloBands {
    let mut bands = MonteCarloBands {
        p10: Vec::with_capacity(horizon_months as usize),
        p25: Vec::with_capacity(horizon_months as usize),
        p50: Vec::with_capacity(horizon_months as usize),
        p75: Vec::with_capacity(horizon_months as usize),
        p90: Vec::with_capacity(horizon_months as usize),
    };

    let mut column = Vec::with_capacity(paths.len());
    for month in 0..horizon_months {
        column.clear();
        column.extend(paths.iter().map(|p| p.balances[month as usize]));
        column.sort_by(|a, b| a.total_cmp(b));

        let point = |p: f64| MonthPoint {
            month,
            net_worth: percentile_sorted(&column, p),
        };
        bands.p10.push(point(10.0));
        bands.p25.push(point(25.0));
        bands.p50.push(point(50.0));
        bands.p75.push(point(75.0));
        bands.p90.push(point(90.0));
    }
    bands
}

fn whole_percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * count as f64 / total as f64).round() as u32
}
