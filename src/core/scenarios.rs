use super::types::{MonthPoint, ScenarioSet, TrendModel};

pub fn project_line(start: f64, slope_per_month: f64, horizon_months: u32) -> Vec<MonthPoint> {
    (0..horizon_months)
        .map(|month| MonthPoint {
            month,
            net_worth: start + slope_per_month * month as f64,
        })
        .collect()
}

pub fn project_scenarios(trend: &TrendModel, current_net_worth: f64, horizon_months: u32) -> ScenarioSet {
    let base = project_line(current_net_worth, trend.slope_per_month, horizon_months);
    let sigma = trend.residual_std_dev_per_month.max(0.0);

    let offset = |sign: f64| {
        base.iter()
            .map(|point| MonthPoint {
                month: point.month,
                net_worth: point.net_worth + sign * sigma * point.month as f64,
            })
            .collect::<Vec<_>>()
    };
    let optimistic = offset(1.0);
    let pessimistic = offset(-1.0);

    ScenarioSet {
        base,
        optimistic,
        pessimistic,
    }
}
