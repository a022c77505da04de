use super::types::MAX_SEARCH_MONTHS;

/// Projected state at a given elapsed month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthProjection {
    pub total_assets: f64,
    pub target: f64,
}

impl MonthProjection {
    /// The one comparison every search path uses. Met means `>=`, never `>`.
    pub fn target_met(&self) -> bool {
        self.total_assets >= self.target
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthSearchProbe {
    pub iteration: u32,
    pub lower_bound: u32,
    pub upper_bound: u32,
    pub candidate_months: u32,
    pub total_assets: f64,
    pub target: f64,
    pub met: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthSearchResult {
    /// Smallest month in `0..=MAX_SEARCH_MONTHS` meeting the target, `None`
    /// when even the ceiling falls short.
    pub months: Option<u32>,
    pub probes: Vec<MonthSearchProbe>,
}

/// Binary search for the first month at which `project(month)` meets its
/// target. `hi` only ever moves onto a met month, so the converged month is
/// checked once more when the search never left the ceiling.
///
/// The answer is the true minimum when the gap between assets and target is
/// non-decreasing. When the target outruns the assets late in the window the
/// met months form a band, and the search lands on its first month as long
/// as the band covers the probed midpoints.
pub fn solve_months_to_target<F>(mut project: F) -> MonthSearchResult
where
    F: FnMut(u32) -> MonthProjection,
{
    let mut probes = Vec::with_capacity(12);
    let mut lo = 0;
    let mut hi = MAX_SEARCH_MONTHS;
    let mut hi_met = false;
    let mut it = 0;

    while lo < hi {
        it += 1;
        let mid = lo + (hi - lo) / 2;
        let projection = project(mid);
        let met = projection.target_met();
        probes.push(MonthSearchProbe {
            iteration: it,
            lower_bound: lo,
            upper_bound: hi,
            candidate_months: mid,
            total_assets: projection.total_assets,
            target: projection.target,
            met,
        });

        if met {
            hi = mid;
            hi_met = true;
        } else {
            lo = mid + 1;
        }
    }

    if !hi_met {
        let projection = project(hi);
        hi_met = projection.target_met();
        probes.push(MonthSearchProbe {
            iteration: it + 1,
            lower_bound: lo,
            upper_bound: hi,
            candidate_months: hi,
            total_assets: projection.total_assets,
            target: projection.target,
            met: hi_met,
        });
    }

    MonthSearchResult {
        months: hi_met.then_some(hi),
        probes,
    }
}

/// Moves an estimated month onto the first month `project` reports as met,
/// walking up to the ceiling and back down. `None` when nothing from the
/// estimate to the ceiling is met.
pub fn settle_month<F>(estimate: u32, mut project: F) -> Option<u32>
where
    F: FnMut(u32) -> MonthProjection,
{
    let mut months = estimate.min(MAX_SEARCH_MONTHS);
    while months < MAX_SEARCH_MONTHS && !project(months).target_met() {
        months += 1;
    }
    while months > 0 && project(months - 1).target_met() {
        months -= 1;
    }

    project(months).target_met().then_some(months)
}

/// Closed-form month count for a single lump sum with no further deposits,
/// growing by `asset_growth` per month against a target growing by
/// `target_growth` per month (both as `1 + rate` factors).
///
/// Solves `principal * g^n >= target * h^n` and takes the ceiling of `n`.
/// The estimate is settled on the shared `>=` comparison so that it agrees
/// with [`solve_months_to_target`] on the same projection.
pub fn months_for_lump_sum(
    principal: f64,
    asset_growth: f64,
    target: f64,
    target_growth: f64,
) -> Option<u32> {
    let project = |months: u32| MonthProjection {
        total_assets: principal * asset_growth.powf(months as f64),
        target: target * target_growth.powf(months as f64),
    };

    if project(0).target_met() {
        return Some(0);
    }
    if principal <= 0.0 || asset_growth <= target_growth {
        return None;
    }

    let exact = (target / principal).ln() / (asset_growth / target_growth).ln();
    if !exact.is_finite() || exact > MAX_SEARCH_MONTHS as f64 + 1.0 {
        return None;
    }

    settle_month(exact.ceil().max(1.0) as u32, project)
}
