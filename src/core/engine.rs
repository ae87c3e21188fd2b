use tracing::warn;

use super::types::{
    Appreciation, InputError, ProgressTier, Projection, TrackerInputs, TrackerReport,
};

/// Safety cap on simulated years; a target that is never reached stops here.
pub const MAX_PROJECTION_YEARS: u32 = 100;

/// Nest egg needed to fund `expenses` per year at `withdrawal_rate`.
///
/// The rate is checked before dividing: zero, negative, above 100% or
/// non-finite rates are rejected rather than producing an infinite or
/// negative target.
pub fn fire_target(expenses: f64, withdrawal_rate: f64) -> Result<f64, InputError> {
    if !withdrawal_rate.is_finite() || withdrawal_rate <= 0.0 || withdrawal_rate > 1.0 {
        return Err(InputError::WithdrawalRate(withdrawal_rate));
    }
    if !expenses.is_finite() || expenses < 0.0 {
        return Err(InputError::Expenses(expenses));
    }
    Ok(expenses / withdrawal_rate)
}

pub fn project_net_worth(
    start: f64,
    annual_contribution: f64,
    annual_return: f64,
    target: f64,
) -> Projection {
    project_net_worth_capped(
        start,
        annual_contribution,
        annual_return,
        target,
        MAX_PROJECTION_YEARS,
    )
}

/// Compounds `start` one year at a time until it reaches `target` or
/// `max_years` have elapsed.
///
/// Each year the contribution is added first and the return is applied to
/// the sum. The trajectory always begins with `start` (year 0), so it holds
/// `years + 1` entries. Running out of years is reported through
/// `reached == false` with `years == max_years`.
pub fn project_net_worth_capped(
    start: f64,
    annual_contribution: f64,
    annual_return: f64,
    target: f64,
    max_years: u32,
) -> Projection {
    let mut balance = start;
    let mut years = 0;
    let mut trajectory = Vec::with_capacity(16);
    trajectory.push(balance);

    while balance < target && years < max_years {
        balance = (balance + annual_contribution) * (1.0 + annual_return);
        trajectory.push(balance);
        years += 1;
    }

    Projection {
        years,
        final_balance: balance,
        trajectory,
        reached: balance >= target,
    }
}

/// Annual expenses after netting off recurring real-estate cash flow.
pub fn adjusted_expenses(target_expenses: f64, net_cashflow: f64, include: bool) -> f64 {
    if include {
        (target_expenses - net_cashflow).max(0.0)
    } else {
        target_expenses
    }
}

pub fn appreciate(property_value: f64, rate: f64, years: u32) -> Appreciation {
    let future_value = property_value * (1.0 + rate).powf(years as f64);
    Appreciation {
        property_value,
        rate,
        years,
        future_value,
        gain: future_value - property_value,
    }
}

/// Share of the goal already covered, clamped to `0.0..=1.0`.
pub fn progress_fraction(net_worth: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 1.0;
    }
    (net_worth / goal).clamp(0.0, 1.0)
}

pub fn run_tracker(inputs: &TrackerInputs) -> Result<TrackerReport, InputError> {
    let net_cashflow = inputs.real_estate.net();
    let expenses = adjusted_expenses(
        inputs.target_expenses,
        net_cashflow,
        inputs.include_real_estate,
    );
    let goal = fire_target(expenses, inputs.withdrawal_rate)?;

    let net_worth = inputs.net_worth;
    let start = net_worth.projected();
    let projection = project_net_worth(start, inputs.annual_savings, inputs.annual_return, goal);
    if !projection.reached {
        warn!(
            goal,
            start,
            cap = MAX_PROJECTION_YEARS,
            "FIRE goal not reached within projection cap"
        );
    }

    let progress = progress_fraction(start, goal);
    let appreciation = appreciate(
        inputs.property_value,
        inputs.appreciation_rate,
        inputs.appreciation_years,
    );

    Ok(TrackerReport {
        fire_goal: goal,
        target_expenses: inputs.target_expenses,
        adjusted_expenses: expenses,
        net_real_estate_cashflow: net_cashflow,
        real_estate_included: inputs.include_real_estate,
        liquid_assets: net_worth.liquid,
        illiquid_assets: net_worth.illiquid,
        illiquid_included: net_worth.include_illiquid,
        projected_net_worth: start,
        total_net_worth: net_worth.total(),
        years_to_fi: projection.years,
        reached: projection.reached,
        final_net_worth: projection.final_balance,
        trajectory: projection.trajectory,
        progress,
        progress_tier: ProgressTier::from_fraction(progress),
        appreciation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NetWorth, RealEstateCashflow};
    use proptest::prelude::{prop_assert, prop_assert_eq, prop_assume, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> TrackerInputs {
        TrackerInputs {
            net_worth: NetWorth {
                liquid: 100_000.0,
                illiquid: 0.0,
                include_illiquid: false,
            },
            annual_savings: 30_000.0,
            target_expenses: 50_000.0,
            withdrawal_rate: 0.04,
            annual_return: 0.07,
            real_estate: RealEstateCashflow::default(),
            include_real_estate: false,
            property_value: 0.0,
            appreciation_rate: 0.03,
            appreciation_years: 10,
        }
    }

    #[test]
    fn fire_target_divides_expenses_by_rate() {
        assert_approx(fire_target(50_000.0, 0.04).expect("valid"), 1_250_000.0);
        assert_approx(fire_target(40_000.0, 0.035).expect("valid"), 1_142_857.142857143);
        assert_approx(fire_target(0.0, 0.04).expect("valid"), 0.0);
        assert_approx(fire_target(12_000.0, 1.0).expect("valid"), 12_000.0);
    }

    #[test]
    fn fire_target_rejects_non_positive_withdrawal_rate() {
        for rate in [0.0, -0.04, 1.5, f64::NAN, f64::INFINITY] {
            let err = fire_target(50_000.0, rate).expect_err("must reject rate");
            assert!(matches!(err, InputError::WithdrawalRate(_)), "{err}");
        }
    }

    #[test]
    fn fire_target_rejects_negative_expenses() {
        let err = fire_target(-1.0, 0.04).expect_err("must reject expenses");
        assert_eq!(err, InputError::Expenses(-1.0));
    }

    #[test]
    fn oracle_projection_contributes_then_grows() {
        // Hand table: balance = (balance + 30_000) * 1.07
        // y1 139_100, y2 180_937, y3 225_702.59, y4 273_601.7713, y5 324_853.895291
        let projection = project_net_worth(100_000.0, 30_000.0, 0.07, 1_250_000.0);
        let t = &projection.trajectory;
        assert_approx(t[0], 100_000.0);
        assert_approx(t[1], 139_100.0);
        assert_approx(t[2], 180_937.0);
        assert_approx(t[3], 225_702.59);
        assert_approx(t[4], 273_601.7713);
        assert_approx(t[5], 324_853.895291);

        assert!(projection.reached);
        assert_eq!(projection.years, 17);
        assert_eq!(t.len(), 18);
        assert!(t[16] < 1_250_000.0);
        assert_approx(projection.final_balance, 1_305_852.496410443);
        assert_approx(*t.last().expect("non-empty"), projection.final_balance);
    }

    #[test]
    fn projection_already_at_target_returns_single_entry() {
        let projection = project_net_worth(2_000_000.0, 30_000.0, 0.07, 1_250_000.0);
        assert_eq!(projection.years, 0);
        assert_eq!(projection.trajectory, vec![2_000_000.0]);
        assert_approx(projection.final_balance, 2_000_000.0);
        assert!(projection.reached);
    }

    #[test]
    fn projection_exactly_at_target_counts_as_reached() {
        let projection = project_net_worth(500.0, 0.0, 0.0, 500.0);
        assert_eq!(projection.years, 0);
        assert!(projection.reached);
    }

    #[test]
    fn projection_without_growth_hits_cap() {
        let projection = project_net_worth(100_000.0, 0.0, 0.0, 1_250_000.0);
        assert!(!projection.reached);
        assert_eq!(projection.years, MAX_PROJECTION_YEARS);
        assert_eq!(projection.trajectory.len(), MAX_PROJECTION_YEARS as usize + 1);
        assert!(projection.trajectory.iter().all(|&b| b == 100_000.0));
        assert_approx(projection.final_balance, 100_000.0);
    }

    #[test]
    fn projection_with_total_loss_stays_at_zero() {
        let projection = project_net_worth_capped(100_000.0, 10_000.0, -1.0, 1_000_000.0, 5);
        assert!(!projection.reached);
        assert_eq!(projection.years, 5);
        assert_eq!(projection.trajectory.len(), 6);
        assert!(projection.trajectory[1..].iter().all(|&b| b == 0.0));
    }

    #[test]
    fn projection_with_zero_cap_reports_start_only() {
        let projection = project_net_worth_capped(10.0, 10.0, 0.1, 100.0, 0);
        assert_eq!(projection.years, 0);
        assert_eq!(projection.trajectory, vec![10.0]);
        assert!(!projection.reached);
    }

    #[test]
    fn projection_is_idempotent() {
        let a = project_net_worth(42_000.0, 12_500.0, 0.055, 900_000.0);
        let b = project_net_worth(42_000.0, 12_500.0, 0.055, 900_000.0);
        assert_eq!(a, b);
    }

    #[test]
    fn adjusted_expenses_nets_cashflow_and_floors_at_zero() {
        assert_approx(adjusted_expenses(50_000.0, 15_000.0, true), 35_000.0);
        assert_approx(adjusted_expenses(50_000.0, 15_000.0, false), 50_000.0);
        assert_approx(adjusted_expenses(10_000.0, 15_000.0, true), 0.0);
        assert_approx(adjusted_expenses(50_000.0, -5_000.0, true), 55_000.0);
    }

    #[test]
    fn appreciation_compounds_annually() {
        let appreciation = appreciate(100_000.0, 0.03, 10);
        assert_approx(appreciation.future_value, 134_391.63793441218);
        assert_approx(appreciation.gain, 34_391.63793441218);

        let flat = appreciate(250_000.0, 0.03, 0);
        assert_approx(flat.future_value, 250_000.0);
        assert_approx(flat.gain, 0.0);
    }

    #[test]
    fn progress_fraction_clamps_and_guards_zero_goal() {
        assert_approx(progress_fraction(100_000.0, 1_250_000.0), 0.08);
        assert_approx(progress_fraction(2_000_000.0, 1_250_000.0), 1.0);
        assert_approx(progress_fraction(0.0, 0.0), 1.0);
        assert_approx(progress_fraction(-10.0, 100.0), 0.0);
    }

    #[test]
    fn progress_tiers_follow_thresholds() {
        assert_eq!(ProgressTier::from_fraction(0.0), ProgressTier::Starting);
        assert_eq!(ProgressTier::from_fraction(0.2499), ProgressTier::Starting);
        assert_eq!(ProgressTier::from_fraction(0.25), ProgressTier::Underway);
        assert_eq!(ProgressTier::from_fraction(0.5), ProgressTier::Halfway);
        assert_eq!(ProgressTier::from_fraction(0.75), ProgressTier::Close);
        assert_eq!(ProgressTier::from_fraction(1.0), ProgressTier::Reached);
    }

    #[test]
    fn run_tracker_default_scenario() {
        let report = run_tracker(&sample_inputs()).expect("valid inputs");
        assert_approx(report.fire_goal, 1_250_000.0);
        assert_approx(report.adjusted_expenses, 50_000.0);
        assert_eq!(report.years_to_fi, 17);
        assert!(report.reached);
        assert_approx(report.final_net_worth, 1_305_852.496410443);
        assert_eq!(report.trajectory.len(), 18);
        assert_approx(report.progress, 0.08);
        assert_eq!(report.progress_tier, ProgressTier::Starting);
    }

    #[test]
    fn run_tracker_applies_real_estate_and_illiquid_assets() {
        let mut inputs = sample_inputs();
        inputs.net_worth.illiquid = 50_000.0;
        inputs.net_worth.include_illiquid = true;
        inputs.real_estate = RealEstateCashflow {
            rental_income: 30_000.0,
            mortgage: 10_000.0,
            maintenance: 2_000.0,
            tax_insurance: 3_000.0,
        };
        inputs.include_real_estate = true;
        inputs.property_value = 100_000.0;

        let report = run_tracker(&inputs).expect("valid inputs");
        assert_approx(report.net_real_estate_cashflow, 15_000.0);
        assert_approx(report.adjusted_expenses, 35_000.0);
        assert_approx(report.fire_goal, 875_000.0);
        assert_approx(report.projected_net_worth, 150_000.0);
        assert_approx(report.total_net_worth, 150_000.0);
        assert_approx(report.trajectory[0], 150_000.0);
        assert_approx(report.trajectory[1], 192_600.0);
        assert_approx(report.appreciation.future_value, 134_391.63793441218);
    }

    #[test]
    fn run_tracker_excluding_illiquid_keeps_total_net_worth() {
        let mut inputs = sample_inputs();
        inputs.net_worth.illiquid = 400_000.0;

        let report = run_tracker(&inputs).expect("valid inputs");
        assert_approx(report.projected_net_worth, 100_000.0);
        assert_approx(report.total_net_worth, 500_000.0);
    }

    #[test]
    fn run_tracker_rejects_zero_withdrawal_rate() {
        let mut inputs = sample_inputs();
        inputs.withdrawal_rate = 0.0;
        let err = run_tracker(&inputs).expect_err("must reject");
        assert_eq!(err, InputError::WithdrawalRate(0.0));
    }

    #[test]
    fn run_tracker_with_rental_covering_expenses_is_already_reached() {
        let mut inputs = sample_inputs();
        inputs.real_estate.rental_income = 80_000.0;
        inputs.include_real_estate = true;

        let report = run_tracker(&inputs).expect("valid inputs");
        assert_approx(report.fire_goal, 0.0);
        assert_eq!(report.years_to_fi, 0);
        assert_eq!(report.trajectory.len(), 1);
        assert_eq!(report.progress_tier, ProgressTier::Reached);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_fire_target_matches_division(
            expenses in 0u32..1_000_000,
            rate_bp in 1u32..10_001
        ) {
            let expenses = expenses as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let target = fire_target(expenses, rate).expect("valid inputs");
            prop_assert_eq!(target, expenses / rate);
        }

        #[test]
        fn prop_trajectory_is_monotonic_for_non_negative_flows(
            start in 0u32..5_000_000,
            contribution in 0u32..200_000,
            return_bp in 0u32..2_000,
            target in 0u32..20_000_000
        ) {
            let projection = project_net_worth(
                start as f64,
                contribution as f64,
                return_bp as f64 / 10_000.0,
                target as f64,
            );
            for pair in projection.trajectory.windows(2) {
                prop_assert!(pair[1] >= pair[0], "trajectory decreased: {:?}", pair);
            }
        }

        #[test]
        fn prop_trajectory_shape_matches_reported_years(
            start in 0u32..2_000_000,
            contribution in 0u32..100_000,
            return_bp in -500i32..1_500,
            target in 1u32..5_000_000
        ) {
            let projection = project_net_worth(
                start as f64,
                contribution as f64,
                return_bp as f64 / 10_000.0,
                target as f64,
            );
            prop_assert_eq!(projection.trajectory.len(), projection.years as usize + 1);
            prop_assert_eq!(projection.trajectory[0], start as f64);
            let last = *projection.trajectory.last().expect("non-empty");
            prop_assert_eq!(last, projection.final_balance);
            prop_assert!(projection.years <= MAX_PROJECTION_YEARS);
            if projection.reached {
                prop_assert!(projection.final_balance >= target as f64);
                for &balance in &projection.trajectory[..projection.years as usize] {
                    prop_assert!(balance < target as f64);
                }
            } else {
                prop_assert_eq!(projection.years, MAX_PROJECTION_YEARS);
            }
        }

        #[test]
        fn prop_zero_flow_never_reaches_higher_target(
            start in 0u32..1_000_000,
            gap in 1u32..1_000_000
        ) {
            let start = start as f64;
            let target = start + gap as f64;
            prop_assume!(target > start);
            let projection = project_net_worth(start, 0.0, 0.0, target);
            prop_assert!(!projection.reached);
            prop_assert_eq!(projection.years, MAX_PROJECTION_YEARS);
        }
    }
}
