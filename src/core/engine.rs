use tracing::debug;

use super::compounding::{
    Pool, annuity_factor, future_value, inflation_adjust, monthly_equivalent_rate, monthly_rate,
};
use super::solver::{MonthProjection, months_for_lump_sum, settle_month, solve_months_to_target};
use super::types::{
    CalculationMode, CalculationResults, FinancialInputs, MAX_SEARCH_MONTHS, TimeToGoal,
};

/// Share of any combined monthly contribution placed in the savings pool.
pub const SAVINGS_SHARE: f64 = 0.3;
/// Share of any combined monthly contribution placed in the investment pool.
pub const INVESTMENT_SHARE: f64 = 0.7;

pub fn calculate(inputs: &FinancialInputs, mode: CalculationMode) -> CalculationResults {
    let results = match mode {
        CalculationMode::GoalBased => run_goal_based(inputs),
        CalculationMode::TimeBased => run_time_based(inputs),
        CalculationMode::ContributionBased => run_contribution_based(inputs),
    };
    debug!(
        ?mode,
        required_monthly = results.required_monthly_savings,
        total_months = ?results.time_to_goal.total_months,
        "calculation finished"
    );
    results
}

/// Splits a combined monthly amount into `(savings, investment)`.
///
/// The investment share is at least half of `total`, so `total - investment`
/// is exact and the two parts always add back to `total` bit for bit.
pub fn split_contribution(total: f64) -> (f64, f64) {
    let investment = total * INVESTMENT_SHARE;
    let savings = total - investment;
    (savings, investment)
}

pub fn run_goal_based(inputs: &FinancialInputs) -> CalculationResults {
    let target = inputs.target_fi_number;
    let (fv_savings, fv_investments) = horizon_values(inputs);
    let required = required_contribution(inputs, target - (fv_savings + fv_investments));

    fixed_horizon_result(inputs, required, fv_savings, fv_investments, target)
        .with_target_at_completion(target)
}

pub fn run_time_based(inputs: &FinancialInputs) -> CalculationResults {
    let base = inputs.expense_baseline();
    let target = inflation_adjust(base, inputs.inflation_rate, inputs.time_horizon as f64);
    let (fv_savings, fv_investments) = horizon_values(inputs);
    let required = required_contribution(inputs, target - (fv_savings + fv_investments));

    let mut results = fixed_horizon_result(inputs, required, fv_savings, fv_investments, target)
        .with_target_at_completion(target);
    results.calculated_fi_number = Some(target);
    results.base_fi_number = Some(base);
    results
}

pub fn run_contribution_based(inputs: &FinancialInputs) -> CalculationResults {
    let baseline = inputs.contribution_target_baseline();
    let savings = Pool::new(
        inputs.current_savings,
        inputs.savings_interest_rate,
        inputs.monthly_savings,
    );
    let investments = Pool::new(
        inputs.current_investments,
        inputs.annual_return,
        inputs.monthly_investment,
    );
    let monthly_inflation = monthly_equivalent_rate(inputs.inflation_rate);

    let project = |months: u32| MonthProjection {
        total_assets: savings.value_after(months) + investments.value_after(months),
        target: inflation_adjust(baseline, monthly_inflation, months as f64),
    };

    let months = if project(0).target_met() {
        Some(0)
    } else if let Some(lump) = single_lump_sum(&savings, &investments) {
        // closed-form estimate, settled on the stepped pools
        months_for_lump_sum(
            lump.balance,
            1.0 + lump.monthly_rate,
            baseline,
            1.0 + monthly_inflation,
        )
        .and_then(|estimate| settle_month(estimate, project))
    } else {
        let search = solve_months_to_target(project);
        for probe in &search.probes {
            debug!(
                iteration = probe.iteration,
                lower = probe.lower_bound,
                upper = probe.upper_bound,
                candidate = probe.candidate_months,
                met = probe.met,
                "month search probe"
            );
        }
        search.months
    };

    let (time_to_goal, reported_month) = match months {
        Some(m) => (TimeToGoal::from_months(m), m),
        None => (TimeToGoal::UNREACHED, MAX_SEARCH_MONTHS),
    };
    let at_completion = project(reported_month);

    let total = inputs.total_monthly_contribution();
    let (suggested_savings, suggested_investment) = split_contribution(total);

    CalculationResults {
        required_monthly_savings: total,
        suggested_monthly_savings: suggested_savings,
        suggested_monthly_investment: suggested_investment,
        inflation_adjusted_target: at_completion.target,
        time_to_goal,
        future_value_savings: savings.value_after(reported_month),
        future_value_investments: investments.value_after(reported_month),
        calculated_fi_number: (inputs.target_fi_number <= 0.0).then_some(baseline),
        base_fi_number: Some(baseline),
        target_at_completion: Some(at_completion.target),
    }
}

/// Existing pools compounded annually at their own rates to the horizon.
fn horizon_values(inputs: &FinancialInputs) -> (f64, f64) {
    let years = inputs.time_horizon as f64;
    (
        future_value(inputs.current_savings, inputs.savings_interest_rate, years),
        future_value(inputs.current_investments, inputs.annual_return, years),
    )
}

/// Annuity factor of one unit of combined contribution split between the two
/// pools over the full horizon. Written as `a + 0.7 (b - a)` rather than
/// `0.3 a + 0.7 b` so that equal pool rates give back exactly `a`.
fn weighted_annuity_factor(inputs: &FinancialInputs) -> f64 {
    let months = inputs.horizon_months();
    let savings_factor = annuity_factor(monthly_rate(inputs.savings_interest_rate), months);
    let investment_factor = annuity_factor(monthly_rate(inputs.annual_return), months);
    savings_factor + INVESTMENT_SHARE * (investment_factor - savings_factor)
}

fn required_contribution(inputs: &FinancialInputs, amount_needed: f64) -> f64 {
    if amount_needed <= 0.0 {
        return 0.0;
    }
    amount_needed / weighted_annuity_factor(inputs)
}

fn fixed_horizon_result(
    inputs: &FinancialInputs,
    required: f64,
    fv_savings: f64,
    fv_investments: f64,
    target: f64,
) -> CalculationResults {
    let (suggested_savings, suggested_investment) = split_contribution(required);
    let time_to_goal = if required > 0.0 {
        TimeToGoal::from_months(inputs.horizon_months())
    } else {
        TimeToGoal::IMMEDIATE
    };

    CalculationResults {
        required_monthly_savings: required,
        suggested_monthly_savings: suggested_savings,
        suggested_monthly_investment: suggested_investment,
        inflation_adjusted_target: target,
        time_to_goal,
        future_value_savings: fv_savings,
        future_value_investments: fv_investments,
        calculated_fi_number: None,
        base_fi_number: None,
        target_at_completion: None,
    }
}

impl CalculationResults {
    fn with_target_at_completion(mut self, target: f64) -> Self {
        self.target_at_completion = Some(target);
        self
    }
}

/// The pool carrying all assets when nothing else moves: no deposits into
/// either pool and at most one pool holding a balance.
fn single_lump_sum(savings: &Pool, investments: &Pool) -> Option<Pool> {
    if savings.monthly_contribution != 0.0 || investments.monthly_contribution != 0.0 {
        return None;
    }
    match (savings.balance == 0.0, investments.balance == 0.0) {
        (true, _) => Some(*investments),
        (false, true) => Some(*savings),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> FinancialInputs {
        FinancialInputs {
            current_income: 120_000_000.0,
            monthly_expenses: 10_000_000.0,
            current_savings: 500_000_000.0,
            current_investments: 0.0,
            target_fi_number: 10_000_000_000.0,
            time_horizon: 15,
            annual_return: 0.07,
            inflation_rate: 0.03,
            savings_interest_rate: 0.05,
            monthly_savings: 0.0,
            monthly_investment: 0.0,
        }
    }

    fn zero_growth_inputs() -> FinancialInputs {
        FinancialInputs {
            time_horizon: 10,
            ..FinancialInputs::default()
        }
    }

    #[test]
    fn split_sums_back_exactly() {
        for total in [0.0, 1.0, 0.1, 29_664_726.486_759_335, 1e-9, 7.77e12] {
            let (savings, investment) = split_contribution(total);
            assert_eq!(savings + investment, total);
            assert_approx_tol(savings, total * SAVINGS_SHARE, total * 1e-12);
        }
    }

    #[test]
    fn goal_based_reference_household() {
        let results = run_goal_based(&sample_inputs());

        assert_approx_tol(results.future_value_savings, 1_039_464_089.7, 1.0);
        assert_eq!(results.future_value_investments, 0.0);
        let amount_needed = 10_000_000_000.0 - results.projected_total();
        assert_approx_tol(amount_needed, 8_960_535_910.3, 1.0);

        assert!(results.required_monthly_savings.is_finite());
        assert!(results.required_monthly_savings > 0.0);
        assert_approx_tol(results.required_monthly_savings, 29_664_726.49, 0.5);
        assert_eq!(
            results.suggested_monthly_savings + results.suggested_monthly_investment,
            results.required_monthly_savings
        );
        assert_eq!(results.time_to_goal, TimeToGoal::from_months(180));
        assert_eq!(results.time_to_goal.years, Some(15));
        assert_eq!(results.time_to_goal.months, Some(0));
        assert_eq!(results.inflation_adjusted_target, 10_000_000_000.0);
        assert_eq!(results.target_at_completion, Some(10_000_000_000.0));
        assert_eq!(results.base_fi_number, None);
    }

    #[test]
    fn goal_based_with_no_assets_and_no_growth_divides_evenly() {
        let mut inputs = zero_growth_inputs();
        inputs.target_fi_number = 1_000_000.0;
        inputs.time_horizon = 7;

        let results = run_goal_based(&inputs);
        assert_eq!(results.required_monthly_savings, 1_000_000.0 / (7.0 * 12.0));
    }

    #[test]
    fn goal_based_already_met_needs_nothing() {
        let mut inputs = sample_inputs();
        inputs.target_fi_number = 900_000_000.0;

        let results = run_goal_based(&inputs);
        assert_eq!(results.required_monthly_savings, 0.0);
        assert_eq!(results.suggested_monthly_savings, 0.0);
        assert_eq!(results.suggested_monthly_investment, 0.0);
        assert_eq!(results.time_to_goal, TimeToGoal::IMMEDIATE);
    }

    #[test]
    fn time_based_baseline_is_twenty_five_years_of_expenses() {
        let mut inputs = sample_inputs();
        let results = run_time_based(&inputs);
        assert_eq!(results.base_fi_number, Some(3_000_000_000.0));

        inputs.inflation_rate = 0.12;
        inputs.current_savings = 0.0;
        inputs.time_horizon = 3;
        inputs.target_fi_number = 1.0;
        let results = run_time_based(&inputs);
        assert_eq!(results.base_fi_number, Some(3_000_000_000.0));
    }

    #[test]
    fn time_based_inflates_baseline_to_horizon() {
        let inputs = sample_inputs();
        let results = run_time_based(&inputs);

        let expected = 3_000_000_000.0 * 1.03_f64.powf(15.0);
        assert_approx_tol(results.inflation_adjusted_target, expected, 1e-3);
        assert_eq!(results.calculated_fi_number, Some(results.inflation_adjusted_target));
        assert_eq!(results.target_at_completion, Some(results.inflation_adjusted_target));
        assert!(results.required_monthly_savings > 0.0);
        assert_eq!(
            results.suggested_monthly_savings + results.suggested_monthly_investment,
            results.required_monthly_savings
        );
    }

    #[test]
    fn time_based_with_enough_assets_needs_nothing() {
        let mut inputs = sample_inputs();
        inputs.current_investments = 10_000_000_000.0;

        let results = run_time_based(&inputs);
        assert_eq!(results.required_monthly_savings, 0.0);
        assert_eq!(results.time_to_goal.total_months, Some(0));
    }

    #[test]
    fn contribution_based_already_funded_is_immediate() {
        let mut inputs = zero_growth_inputs();
        inputs.monthly_expenses = 1_000.0;
        inputs.current_savings = 200_000.0;
        inputs.current_investments = 200_000.0;

        let results = run_contribution_based(&inputs);
        assert_eq!(results.time_to_goal, TimeToGoal::IMMEDIATE);
        assert_eq!(results.required_monthly_savings, 0.0);
        assert_eq!(results.base_fi_number, Some(300_000.0));
        assert_eq!(results.calculated_fi_number, Some(300_000.0));
        assert_eq!(results.projected_total(), 400_000.0);
    }

    #[test]
    fn contribution_based_linear_saving_hits_target_exactly() {
        let mut inputs = zero_growth_inputs();
        inputs.target_fi_number = 120_000.0;
        inputs.monthly_savings = 1_000.0;

        let results = run_contribution_based(&inputs);
        assert_eq!(results.time_to_goal, TimeToGoal::from_months(120));
        assert_eq!(results.time_to_goal.years, Some(10));
        assert_eq!(results.future_value_savings, 120_000.0);
        assert_eq!(results.required_monthly_savings, 1_000.0);
        assert_eq!(results.calculated_fi_number, None);
        assert_eq!(results.target_at_completion, Some(120_000.0));
    }

    #[test]
    fn contribution_based_lump_sum_uses_monthly_compounding() {
        let mut inputs = zero_growth_inputs();
        inputs.current_investments = 100_000.0;
        inputs.annual_return = 0.06;
        inputs.target_fi_number = 200_000.0;

        let results = run_contribution_based(&inputs);
        assert_eq!(results.time_to_goal.total_months, Some(139));
        assert_eq!(results.time_to_goal.years, Some(11));
        assert_eq!(results.time_to_goal.months, Some(7));
        assert_approx_tol(results.future_value_investments, 200_024.22, 0.01);
    }

    #[test]
    fn contribution_based_target_inflates_with_monthly_equivalent_rate() {
        let mut inputs = zero_growth_inputs();
        inputs.current_investments = 100_000.0;
        inputs.annual_return = 0.06;
        inputs.inflation_rate = 0.03;
        inputs.target_fi_number = 200_000.0;

        let results = run_contribution_based(&inputs);
        assert_eq!(results.time_to_goal.total_months, Some(275));
        let target = results.target_at_completion.expect("target expected");
        assert_approx_tol(target, 200_000.0 * 1.03_f64.powf(275.0 / 12.0), 1e-6);
        assert!(results.projected_total() >= target);
    }

    #[test]
    fn contribution_based_unreached_reports_ceiling_values() {
        let mut inputs = zero_growth_inputs();
        inputs.target_fi_number = 1_000_000_000.0;
        inputs.monthly_savings = 10.0;

        let results = run_contribution_based(&inputs);
        assert_eq!(results.time_to_goal, TimeToGoal::UNREACHED);
        assert!(!results.time_to_goal.is_reached());
        assert_eq!(results.future_value_savings, 12_000.0);
        assert_eq!(results.target_at_completion, Some(1_000_000_000.0));
    }

    #[test]
    fn contribution_based_without_contributions_or_growth_is_unreached() {
        let mut inputs = zero_growth_inputs();
        inputs.current_savings = 10.0;
        inputs.target_fi_number = 20.0;

        let results = run_contribution_based(&inputs);
        assert_eq!(results.time_to_goal.total_months, None);
        assert_eq!(results.future_value_savings, 10.0);
    }

    #[test]
    fn contribution_based_answer_is_minimal_with_two_pools() {
        let mut inputs = sample_inputs();
        inputs.current_savings = 5_000_000.0;
        inputs.current_investments = 20_000_000.0;
        inputs.monthly_savings = 1_000_000.0;
        inputs.monthly_investment = 3_000_000.0;
        inputs.target_fi_number = 0.0;

        let results = run_contribution_based(&inputs);
        let months = results.time_to_goal.total_months.expect("must be reached");
        assert!(months > 0);

        let savings = Pool::new(5_000_000.0, 0.05, 1_000_000.0);
        let investments = Pool::new(20_000_000.0, 0.07, 3_000_000.0);
        let monthly_inflation = monthly_equivalent_rate(0.03);
        let met = |m: u32| {
            savings.value_after(m) + investments.value_after(m)
                >= inflation_adjust(3_000_000_000.0, monthly_inflation, m as f64)
        };
        assert!(met(months));
        assert!(!met(months - 1));
    }

    #[test]
    fn contribution_based_finds_goal_before_inflation_overtakes_cash() {
        // Cash at 0% against 3% inflation: met from month 142, lost again
        // long before the 1200-month ceiling.
        let mut inputs = zero_growth_inputs();
        inputs.target_fi_number = 1_000_000.0;
        inputs.inflation_rate = 0.03;
        inputs.monthly_savings = 10_000.0;

        let results = run_contribution_based(&inputs);
        assert_eq!(results.time_to_goal, TimeToGoal::from_months(142));
        assert_eq!(results.future_value_savings, 1_420_000.0);
        let target = results.target_at_completion.expect("target expected");
        assert!(results.projected_total() >= target);

        let monthly_inflation = monthly_equivalent_rate(0.03);
        let before = inflation_adjust(1_000_000.0, monthly_inflation, 141.0);
        assert!(1_410_000.0 < before);
    }

    #[test]
    fn calculate_dispatches_on_mode() {
        let inputs = sample_inputs();
        assert_eq!(
            calculate(&inputs, CalculationMode::GoalBased),
            run_goal_based(&inputs)
        );
        assert_eq!(
            calculate(&inputs, CalculationMode::TimeBased),
            run_time_based(&inputs)
        );
        assert_eq!(
            calculate(&inputs, CalculationMode::ContributionBased),
            run_contribution_based(&inputs)
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_modes_are_idempotent(
            savings in 0u32..50_000_000,
            investments in 0u32..50_000_000,
            expenses in 1u32..500_000,
            target in 0u32..900_000_000,
            horizon in 1u32..40,
            return_bp in -300i32..1_500,
            savings_bp in 0i32..600,
            inflation_bp in 0i32..800,
            monthly_savings in 0u32..200_000,
            monthly_investment in 0u32..200_000
        ) {
            let inputs = FinancialInputs {
                current_income: 0.0,
                monthly_expenses: expenses as f64,
                current_savings: savings as f64,
                current_investments: investments as f64,
                target_fi_number: target as f64,
                time_horizon: horizon,
                annual_return: return_bp as f64 / 10_000.0,
                inflation_rate: inflation_bp as f64 / 10_000.0,
                savings_interest_rate: savings_bp as f64 / 10_000.0,
                monthly_savings: monthly_savings as f64,
                monthly_investment: monthly_investment as f64,
            };
            for mode in [
                CalculationMode::GoalBased,
                CalculationMode::TimeBased,
                CalculationMode::ContributionBased,
            ] {
                let first = calculate(&inputs, mode);
                let second = calculate(&inputs, mode);
                prop_assert_eq!(&first, &second);
                prop_assert_eq!(
                    first.suggested_monthly_savings + first.suggested_monthly_investment,
                    first.required_monthly_savings
                );
                prop_assert!(first.required_monthly_savings >= 0.0);
                prop_assert!(first.required_monthly_savings.is_finite());
            }
        }

        #[test]
        fn prop_zero_rate_goal_contribution_is_even_split_of_target(
            target in 1u32..2_000_000_000,
            horizon in 1u32..60
        ) {
            let inputs = FinancialInputs {
                target_fi_number: target as f64,
                time_horizon: horizon,
                ..FinancialInputs::default()
            };
            let results = run_goal_based(&inputs);
            prop_assert!(results.required_monthly_savings == target as f64 / (horizon * 12) as f64);
        }
    }
}
