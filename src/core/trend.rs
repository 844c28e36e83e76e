use super::error::ForecastError;
use super::stats::mean;
use super::types::{MIN_SNAPSHOTS, NetWorthSnapshot, TrendModel};

const DAYS_PER_MONTH: f64 = 365.25 / 12.0;

pub fn estimate_trend(snapshots: &[NetWorthSnapshot]) -> Result<TrendModel, ForecastError> {
    if snapshots.len() < MIN_SNAPSHOTS {
        return Err(ForecastError::InsufficientData {
            found: snapshots.len(),
            required: MIN_SNAPSHOTS,
        });
    }
    if let Some(bad) = snapshots.iter().find(|s| !s.net_worth.is_finite()) {
        return Err(ForecastError::invalid(format!(
            "snapshot on {} has a non-finite net worth",
            bad.date
        )));
    }

    let xs = month_offsets(snapshots);
    let ys = snapshots.iter().map(|s| s.net_worth).collect::<Vec<_>>();
    let (slope, intercept) = least_squares(&xs, &ys);

    let residuals = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| y - (intercept + slope * x))
        .collect::<Vec<_>>();
    let residual_mean = mean(&residuals);
    let variance = residuals
        .iter()
        .map(|r| (r - residual_mean).powi(2))
        .sum::<f64>()
        / residuals.len() as f64;

    Ok(TrendModel {
        slope_per_month: slope,
        intercept,
        residual_std_dev_per_month: variance.max(0.0).sqrt(),
        sample_count: snapshots.len(),
    })
}

fn month_offsets(snapshots: &[NetWorthSnapshot]) -> Vec<f64> {
    let origin = snapshots[0].date;
    snapshots
        .iter()
        .map(|s| (s.date - origin).num_days() as f64 / DAYS_PER_MONTH)
        .collect()
}

fn least_squares(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let x_mean = mean(xs);
    let y_mean = mean(ys);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        sxx += dx * dx;
        sxy += dx * (y - y_mean);
    }

    // All observations on the same date: no measurable trend.
    if sxx <= f64::EPSILON {
        return (0.0, y_mean);
    }

    let slope = sxy / sxx;
    (slope, y_mean - slope * x_mean)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Months, NaiveDate};
    use proptest::prelude::{prop_assert, proptest};

    pub(crate) fn monthly_series(values: &[f64]) -> Vec<NetWorthSnapshot> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let date = start
                    .checked_add_months(Months::new(i as u32))
                    .expect("valid date");
                NetWorthSnapshot::new(date, *v)
            })
            .collect()
    }

    #[test]
    fn rejects_fewer_than_five_snapshots() {
        let series = monthly_series(&[1.0, 2.0, 3.0, 4.0]);
        match estimate_trend(&series) {
            Err(ForecastError::InsufficientData { found, required }) => {
                assert_eq!(found, 4);
                assert_eq!(required, 5);
            }
            other => panic!("expected insufficient data, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_finite_net_worth() {
        let series = monthly_series(&[1.0, 2.0, f64::NAN, 4.0, 5.0]);
        assert!(matches!(
            estimate_trend(&series),
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[test]
    fn reference_series_slope_is_about_one_thousand() {
        let series = monthly_series(&[100_000.0, 101_200.0, 101_800.0, 103_100.0, 104_300.0, 105_000.0]);
        let trend = estimate_trend(&series).expect("enough data");
        assert!(
            trend.slope_per_month > 800.0 && trend.slope_per_month < 1_200.0,
            "slope {}",
            trend.slope_per_month
        );
        assert!(trend.residual_std_dev_per_month > 0.0);
        assert_eq!(trend.sample_count, 6);
    }

    #[test]
    fn exact_line_has_zero_residual_deviation() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        let series = (0..8)
            .map(|i| {
                let date = start + chrono::Duration::days(i * 30);
                let months = (i * 30) as f64 / DAYS_PER_MONTH;
                NetWorthSnapshot::new(date, 50_000.0 + 250.0 * months)
            })
            .collect::<Vec<_>>();

        let trend = estimate_trend(&series).expect("enough data");
        assert!((trend.slope_per_month - 250.0).abs() < 1e-6);
        assert!((trend.intercept - 50_000.0).abs() < 1e-6);
        assert!(trend.residual_std_dev_per_month < 1e-6);
    }

    #[test]
    fn same_day_snapshots_yield_flat_trend() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let series = [10.0, 20.0, 30.0, 40.0, 50.0]
            .iter()
            .map(|v| NetWorthSnapshot::new(date, *v))
            .collect::<Vec<_>>();

        let trend = estimate_trend(&series).expect("enough data");
        assert_eq!(trend.slope_per_month, 0.0);
        assert!((trend.intercept - 30.0).abs() < 1e-9);
        assert!(trend.residual_std_dev_per_month.is_finite());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_slope_sign_follows_monotone_series(
            start in 0u32..1_000_000,
            step in 1u32..5_000,
            len in 5usize..36,
            rising in proptest::bool::ANY
        ) {
            let values = (0..len)
                .map(|i| {
                    let delta = step as f64 * i as f64;
                    if rising { start as f64 + delta } else { start as f64 - delta }
                })
                .collect::<Vec<_>>();
            let trend = estimate_trend(&monthly_series(&values)).expect("enough data");

            prop_assert!(trend.residual_std_dev_per_month >= 0.0);
            if rising {
                prop_assert!(trend.slope_per_month > 0.0);
            } else {
                prop_assert!(trend.slope_per_month < 0.0);
            }
        }
    }
}
