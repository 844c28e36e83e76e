use super::error::ForecastError;

/// Deterministic estimates beyond this many months are reported as unreachable.
pub const MAX_MONTHS_TO_FIRE: u32 = 1_200;

pub fn validate_withdrawal_rate(withdrawal_rate: f64) -> Result<(), ForecastError> {
    if !withdrawal_rate.is_finite() || withdrawal_rate <= 0.0 || withdrawal_rate > 1.0 {
        return Err(ForecastError::invalid(format!(
            "withdrawal rate must be in (0, 1], got {withdrawal_rate}"
        )));
    }
    Ok(())
}

pub fn fire_number(avg_monthly_expenses: f64, withdrawal_rate: f64) -> Result<f64, ForecastError> {
    validate_withdrawal_rate(withdrawal_rate)?;
    if !avg_monthly_expenses.is_finite() || avg_monthly_expenses < 0.0 {
        return Err(ForecastError::invalid(format!(
            "average monthly expenses must be >= 0, got {avg_monthly_expenses}"
        )));
    }

    Ok((avg_monthly_expenses * 12.0 / withdrawal_rate).round())
}

pub fn months_to_fire(current_net_worth: f64, fire_number: f64, slope_per_month: f64) -> Option<u32> {
    if fire_number <= 0.0 {
        return None;
    }

    let gap = fire_number - current_net_worth;
    if gap <= 0.0 || slope_per_month.is_nan() || slope_per_month <= 0.0 {
        return None;
    }

    let months = (gap / slope_per_month).ceil();
    if months > MAX_MONTHS_TO_FIRE as f64 {
        return None;
    }
    Some(months.max(1.0) as u32)
}
