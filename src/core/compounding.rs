//! Compounding arithmetic shared by the mode strategies and the timeline.
//!
//! Asset pools compound monthly at `annual_rate / 12`. Inflation is handled
//! by two separate conventions, see [`annual_inflation_factor`] and
//! [`monthly_equivalent_rate`].

/// `principal * (1 + rate)^periods`. The rate is per period, so the same
/// function serves yearly and monthly compounding.
pub fn future_value(principal: f64, rate: f64, periods: f64) -> f64 {
    if principal == 0.0 {
        return 0.0;
    }
    principal * (1.0 + rate).powf(periods)
}

/// Grows an amount of today's money to its nominal value after `years`.
pub fn inflation_adjust(amount: f64, rate: f64, years: f64) -> f64 {
    amount * (1.0 + rate).powf(years)
}

/// Future value of a level end-of-month contribution stream.
pub fn annuity_future_value(monthly_contribution: f64, monthly_rate: f64, months: u32) -> f64 {
    monthly_contribution * annuity_factor(monthly_rate, months)
}

/// `((1 + r)^n - 1) / r`, which degrades to `n` at `r == 0`.
pub fn annuity_factor(monthly_rate: f64, months: u32) -> f64 {
    if monthly_rate == 0.0 {
        return months as f64;
    }
    ((1.0 + monthly_rate).powf(months as f64) - 1.0) / monthly_rate
}

/// Simple monthly rate used for every asset pool: `annual / 12`, not the
/// geometric equivalent.
pub fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 12.0
}

/// Inflation factor for whole display years of the timeline chart.
///
/// Kept apart from [`monthly_equivalent_rate`]: the chart re-inflates year by
/// year with the annual rate, while the month search inflates per month. The
/// two conventions produce different numbers and both are part of the output.
pub fn annual_inflation_factor(annual_rate: f64, years: u32) -> f64 {
    (1.0 + annual_rate).powi(years as i32)
}

/// Monthly rate whose twelfth power equals `1 + annual_rate`. Used only when
/// probing the target month by month.
pub fn monthly_equivalent_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

/// A balance that compounds monthly and receives a fixed deposit at the end
/// of every month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pool {
    pub balance: f64,
    pub monthly_rate: f64,
    pub monthly_contribution: f64,
}

impl Pool {
    pub fn new(balance: f64, annual_rate: f64, monthly_contribution: f64) -> Self {
        Self {
            balance,
            monthly_rate: monthly_rate(annual_rate),
            monthly_contribution,
        }
    }

    pub fn step_month(&mut self) {
        self.balance = self.balance * (1.0 + self.monthly_rate) + self.monthly_contribution;
    }

    /// Balance after `months` of [`Pool::step_month`], without mutating the
    /// pool. Bit-identical to the balances the yearly chart walks through.
    pub fn value_after(&self, months: u32) -> f64 {
        let mut pool = *self;
        for _ in 0..months {
            pool.step_month();
        }
        pool.balance
    }
}
