use super::error::ForecastError;
use super::scenarios::project_line;
use super::types::{WhatIfAdjustments, WhatIfAssumptions, WhatIfBaseline, WhatIfResult};

pub fn validate_adjustments(adjustments: &WhatIfAdjustments) -> Result<(), ForecastError> {
    for (name, pct) in [
        ("incomeChangePct", adjustments.income_change_pct),
        ("expenseChangePct", adjustments.expense_change_pct),
    ] {
        if !pct.is_finite() || pct < -100.0 {
            return Err(ForecastError::invalid(format!("{name} must be >= -100, got {pct}")));
        }
    }
    if !adjustments.extra_monthly_savings.is_finite() {
        return Err(ForecastError::invalid("extraMonthlySavings must be finite"));
    }
    Ok(())
}

pub fn run_what_if(
    baseline: &WhatIfBaseline,
    adjustments: &WhatIfAdjustments,
    horizon_months: u32,
) -> Result<WhatIfResult, ForecastError> {
    validate_adjustments(adjustments)?;

    let adjusted_income = baseline.monthly_income * (1.0 + adjustments.income_change_pct / 100.0);
    let adjusted_expenses =
        baseline.monthly_expenses * (1.0 + adjustments.expense_change_pct / 100.0);

    let baseline_savings = baseline.monthly_income - baseline.monthly_expenses;
    let adjusted_savings = (adjusted_income - adjusted_expenses) + adjustments.extra_monthly_savings;
    let improvement = adjusted_savings - baseline_savings;

    Ok(WhatIfResult {
        baseline: project_line(baseline.current_net_worth, baseline_savings, horizon_months),
        what_if: project_line(baseline.current_net_worth, adjusted_savings, horizon_months),
        assumptions: WhatIfAssumptions {
            adjusted_monthly_income: adjusted_income,
            adjusted_monthly_expenses: adjusted_expenses,
            adjusted_monthly_savings: adjusted_savings,
            monthly_improvement_vs_baseline: improvement,
        },
    })
}
