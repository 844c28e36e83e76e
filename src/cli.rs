use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::{DEFAULT_TRIALS, DEFAULT_WITHDRAWAL_RATE};
use crate::service::{ForecastSettings, GenerateRequest};

#[derive(Parser, Debug)]
#[command(
    name = "fire-forecast",
    about = "Net worth trend, scenario and Monte Carlo FIRE forecaster"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the forecast HTTP API.
    Serve(ServeArgs),
    /// Forecast a single history file and print the result as JSON.
    Project(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimulationArgs {
    #[arg(long, default_value_t = DEFAULT_TRIALS, help = "Monte Carlo trials per forecast")]
    pub trials: u32,
    #[arg(long, help = "Fixed Monte Carlo seed; random when omitted")]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        help = "JSON file mirroring histories and forecasts; in-memory when omitted"
    )]
    pub data_file: Option<PathBuf>,
    #[command(flatten)]
    pub simulation: SimulationArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(
        long,
        help = "JSON file with { \"snapshots\": [...], \"avgMonthlyExpenses\": n }"
    )]
    pub input: PathBuf,
    #[arg(long, default_value_t = 24, help = "Forecast horizon in months")]
    pub horizon: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_WITHDRAWAL_RATE * 100.0,
        help = "Annual withdrawal rate in percent, e.g. 4"
    )]
    pub withdrawal_rate: f64,
    #[command(flatten)]
    pub simulation: SimulationArgs,
}

impl SimulationArgs {
    pub fn settings(&self) -> Result<ForecastSettings, String> {
        if self.trials == 0 {
            return Err("--trials must be > 0".to_string());
        }
        Ok(ForecastSettings {
            trials: self.trials,
            seed: self.seed,
            ..ForecastSettings::default()
        })
    }
}

impl ProjectArgs {
    pub fn request(&self) -> Result<GenerateRequest, String> {
        if self.horizon == 0 {
            return Err("--horizon must be > 0".to_string());
        }
        if !self.withdrawal_rate.is_finite()
            || self.withdrawal_rate <= 0.0
            || self.withdrawal_rate > 100.0
        {
            return Err("--withdrawal-rate must be between 0 (exclusive) and 100".to_string());
        }
        Ok(GenerateRequest {
            horizon_months: self.horizon,
            withdrawal_rate: Some(self.withdrawal_rate / 100.0),
            inflation_rate: None,
        })
    }
}
