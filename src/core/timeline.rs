use super::compounding::{Pool, annual_inflation_factor};
use super::engine::calculate;
use super::types::{
    CalculationMode, CalculationResults, FinancialInputs, MAX_SEARCH_MONTHS, TimelinePoint,
    TimelineSeries,
};

/// Year-by-year chart series for a calculation.
///
/// When `results` is `None` the strategy for `mode` is run first. The pools
/// are advanced month by month with the contributions the strategy settled
/// on; nothing here searches or solves.
pub fn generate_timeline(
    inputs: &FinancialInputs,
    mode: CalculationMode,
    results: Option<&CalculationResults>,
) -> TimelineSeries {
    let computed;
    let results = match results {
        Some(results) => results,
        None => {
            computed = calculate(inputs, mode);
            &computed
        }
    };

    let (monthly_savings, monthly_investment) = match mode {
        CalculationMode::GoalBased | CalculationMode::TimeBased => (
            results.suggested_monthly_savings,
            results.suggested_monthly_investment,
        ),
        CalculationMode::ContributionBased => (inputs.monthly_savings, inputs.monthly_investment),
    };

    let mut savings = Pool::new(
        inputs.current_savings,
        inputs.savings_interest_rate,
        monthly_savings,
    );
    let mut investments = Pool::new(
        inputs.current_investments,
        inputs.annual_return,
        monthly_investment,
    );

    let years = projection_years(inputs, mode, results);
    let mut points = Vec::with_capacity(years as usize + 1);
    for year in 0..=years {
        if year > 0 {
            for _ in 0..12 {
                savings.step_month();
                investments.step_month();
            }
        }
        points.push(TimelinePoint {
            year,
            total_assets: (savings.balance + investments.balance).round(),
            target: target_for_year(inputs, mode, results, year),
        });
    }

    TimelineSeries { points }
}

/// Number of whole years to chart. Contribution-based charts run to the
/// completion year (or the search ceiling when unreached) but never stop
/// short of the requested horizon.
pub fn projection_years(
    inputs: &FinancialInputs,
    mode: CalculationMode,
    results: &CalculationResults,
) -> u32 {
    match mode {
        CalculationMode::GoalBased | CalculationMode::TimeBased => inputs.time_horizon,
        CalculationMode::ContributionBased => {
            let months = results
                .time_to_goal
                .total_months
                .unwrap_or(MAX_SEARCH_MONTHS);
            months.div_ceil(12).max(inputs.time_horizon)
        }
    }
}

fn target_for_year(
    inputs: &FinancialInputs,
    mode: CalculationMode,
    results: &CalculationResults,
    year: u32,
) -> f64 {
    match mode {
        // already a nominal figure at the horizon
        CalculationMode::GoalBased => inputs.target_fi_number,
        CalculationMode::TimeBased => {
            let base = results
                .base_fi_number
                .unwrap_or_else(|| inputs.expense_baseline());
            base * annual_inflation_factor(inputs.inflation_rate, year)
        }
        CalculationMode::ContributionBased => {
            let base = results
                .base_fi_number
                .unwrap_or_else(|| inputs.contribution_target_baseline());
            base * annual_inflation_factor(inputs.inflation_rate, year)
        }
    }
}
