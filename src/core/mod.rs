mod compounding;
mod engine;
mod solver;
mod timeline;
mod types;

pub use compounding::{
    Pool, annual_inflation_factor, annuity_factor, annuity_future_value, future_value,
    inflation_adjust, monthly_equivalent_rate, monthly_rate,
};
pub use engine::{
    INVESTMENT_SHARE, SAVINGS_SHARE, calculate, run_contribution_based, run_goal_based,
    run_time_based, split_contribution,
};
pub use solver::{
    MonthProjection, MonthSearchProbe, MonthSearchResult, months_for_lump_sum, settle_month,
    solve_months_to_target,
};
pub use timeline::{generate_timeline, projection_years};
pub use types::{
    CalculationMode, CalculationResults, FinancialInputs, MAX_SEARCH_MONTHS, TimeToGoal,
    TimelinePoint, TimelineSeries,
};
