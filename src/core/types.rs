use serde::{Deserialize, Serialize};

/// Hard ceiling for any month search: 100 years.
pub const MAX_SEARCH_MONTHS: u32 = 1200;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculationMode {
    /// Contribution needed to reach a user target within the horizon.
    GoalBased,
    /// Contribution needed to reach the inflated 25x-expenses target within the horizon.
    TimeBased,
    /// Months needed to reach the target under a fixed contribution.
    ContributionBased,
}

/// Household snapshot supplied by the caller. Rates are decimal fractions
/// (`0.07` for 7%), money amounts are in a single currency unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialInputs {
    pub current_income: f64,
    pub monthly_expenses: f64,
    pub current_savings: f64,
    pub current_investments: f64,
    #[serde(rename = "targetFINumber")]
    pub target_fi_number: f64,
    pub time_horizon: u32,
    pub annual_return: f64,
    pub inflation_rate: f64,
    pub savings_interest_rate: f64,
    pub monthly_savings: f64,
    pub monthly_investment: f64,
}

impl FinancialInputs {
    /// The "25x annual expenses" target in today's money.
    pub fn expense_baseline(&self) -> f64 {
        self.monthly_expenses * 12.0 * 25.0
    }

    /// Target for contribution-based projections: the user's number when
    /// given, otherwise the 25x-expenses baseline.
    pub fn contribution_target_baseline(&self) -> f64 {
        if self.target_fi_number > 0.0 {
            self.target_fi_number
        } else {
            self.expense_baseline()
        }
    }

    pub fn horizon_months(&self) -> u32 {
        self.time_horizon.saturating_mul(12)
    }

    pub fn total_monthly_contribution(&self) -> f64 {
        self.monthly_savings + self.monthly_investment
    }
}

/// Elapsed time until the target is met. All fields are `None` when the
/// target is not reached within [`MAX_SEARCH_MONTHS`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeToGoal {
    pub total_months: Option<u32>,
    pub years: Option<u32>,
    pub months: Option<u32>,
}

impl TimeToGoal {
    pub const IMMEDIATE: TimeToGoal = TimeToGoal {
        total_months: Some(0),
        years: Some(0),
        months: Some(0),
    };

    pub const UNREACHED: TimeToGoal = TimeToGoal {
        total_months: None,
        years: None,
        months: None,
    };

    pub fn from_months(total_months: u32) -> Self {
        Self {
            total_months: Some(total_months),
            years: Some(total_months / 12),
            months: Some(total_months % 12),
        }
    }

    pub fn is_reached(&self) -> bool {
        self.total_months.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResults {
    pub required_monthly_savings: f64,
    pub suggested_monthly_savings: f64,
    pub suggested_monthly_investment: f64,
    pub inflation_adjusted_target: f64,
    pub time_to_goal: TimeToGoal,
    pub future_value_savings: f64,
    pub future_value_investments: f64,
    #[serde(rename = "calculatedFINumber", skip_serializing_if = "Option::is_none")]
    pub calculated_fi_number: Option<f64>,
    #[serde(rename = "baseFINumber", skip_serializing_if = "Option::is_none")]
    pub base_fi_number: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_at_completion: Option<f64>,
}

impl CalculationResults {
    pub fn projected_total(&self) -> f64 {
        self.future_value_savings + self.future_value_investments
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub year: u32,
    pub total_assets: f64,
    pub target: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimelineSeries {
    pub points: Vec<TimelinePoint>,
}

impl TimelineSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First sample whose assets meet the target line.
    pub fn first_crossing(&self) -> Option<&TimelinePoint> {
        self.points.iter().find(|p| p.total_assets >= p.target)
    }
}
