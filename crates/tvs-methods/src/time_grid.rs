//! Rebalancing dates and their Euler sub-grid.

use tvs_core::{errors::Result, Error, Real, Time};

const DAYS_PER_YEAR: Real = 365.0;
const MONTH_DAYS: [Real; 12] = [
    31.0, 28.0, 31.0, 30.0, 31.0, 30.0, 31.0, 31.0, 30.0, 31.0, 30.0, 31.0,
];

/// Observation (rebalancing) dates `0 = t_0 < t_1 < … < t_N`, each interval
/// split into `fine_steps` equal Euler steps.
///
/// Fine step `k` belongs to interval `k / fine_steps` and starts at
/// `fine_time(k)`; the fine grid has `N × fine_steps` steps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    dates: Vec<Time>,
    fine_steps: usize,
    fine_times: Vec<Time>,
}

impl TimeGrid {
    /// Build a grid from observation dates. `0` is prepended when the first
    /// date is positive.
    ///
    /// # Errors
    /// `Error::InvalidArgument` for `fine_steps == 0`, no positive date,
    /// or dates that are negative or not strictly increasing.
    pub fn new(dates: &[Time], fine_steps: usize) -> Result<Self> {
        if fine_steps == 0 {
            return Err(Error::InvalidArgument(
                "fine step count must be positive".into(),
            ));
        }
        let mut all = Vec::with_capacity(dates.len() + 1);
        if dates.first().map_or(true, |&t| t > 0.0) {
            all.push(0.0);
        }
        all.extend_from_slice(dates);
        if all.len() < 2 {
            return Err(Error::InvalidArgument(
                "time grid needs at least one positive date".into(),
            ));
        }
        if all[0] != 0.0 || !all.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::InvalidArgument(
                "observation dates must be non-negative and strictly increasing".into(),
            ));
        }

        let mut fine_times = Vec::with_capacity((all.len() - 1) * fine_steps + 1);
        for w in all.windows(2) {
            let dt = (w[1] - w[0]) / fine_steps as Real;
            fine_times.extend((0..fine_steps).map(|k| w[0] + k as Real * dt));
        }
        fine_times.push(all[all.len() - 1]);

        Ok(Self {
            dates: all,
            fine_steps,
            fine_times,
        })
    }

    /// Month-end dates (ACT/365, non-leap calendar months) over `maturity`
    /// years.
    ///
    /// # Errors
    /// `Error::InvalidArgument` unless `maturity` is a positive whole
    /// number of years.
    pub fn monthly(maturity: Time, fine_steps: usize) -> Result<Self> {
        let years = maturity.round();
        if !(years >= 1.0 && (maturity - years).abs() <= 1e-12) {
            return Err(Error::InvalidArgument(format!(
                "monthly grid needs a whole number of years, got maturity {maturity}"
            )));
        }
        let years = years as usize;
        let mut days = 0.0;
        let dates: Vec<Time> = (0..years)
            .flat_map(|_| MONTH_DAYS.iter())
            .map(|&d| {
                days += d;
                days / DAYS_PER_YEAR
            })
            .collect();
        Self::new(&dates, fine_steps)
    }

    /// `⌊365 · maturity⌋` equally spaced dates from `1/365` to `maturity`.
    pub fn daily(maturity: Time, fine_steps: usize) -> Result<Self> {
        let n = (maturity * DAYS_PER_YEAR) as usize;
        if n == 0 {
            return Err(Error::InvalidArgument(format!(
                "maturity {maturity} is shorter than one day"
            )));
        }
        let first = 1.0 / DAYS_PER_YEAR;
        let dates: Vec<Time> = if n == 1 {
            vec![maturity]
        } else {
            let h = (maturity - first) / (n - 1) as Real;
            (0..n).map(|i| first + i as Real * h).collect()
        };
        Self::new(&dates, fine_steps)
    }

    /// Observation dates including `t_0 = 0`.
    pub fn dates(&self) -> &[Time] {
        &self.dates
    }

    /// Rebalancing dates, i.e. the start of each interval.
    pub fn rebalancing_dates(&self) -> &[Time] {
        &self.dates[..self.dates.len() - 1]
    }

    /// Number of rebalancing intervals `N`.
    pub fn intervals(&self) -> usize {
        self.dates.len() - 1
    }

    /// Euler steps per interval.
    pub fn fine_steps(&self) -> usize {
        self.fine_steps
    }

    /// Total number of Euler steps, `N × fine_steps`.
    pub fn n_fine_steps(&self) -> usize {
        self.fine_times.len() - 1
    }

    /// Fine grid points, `n_fine_steps() + 1` of them.
    pub fn fine_times(&self) -> &[Time] {
        &self.fine_times
    }

    /// Start time of fine step `k`.
    pub fn fine_time(&self, k: usize) -> Time {
        self.fine_times[k]
    }

    /// Length of fine step `k`.
    pub fn fine_dt(&self, k: usize) -> Time {
        self.fine_times[k + 1] - self.fine_times[k]
    }

    /// Interval containing fine step `k`.
    pub fn interval_of(&self, k: usize) -> usize {
        k / self.fine_steps
    }

    /// Interval starting at rebalancing date `t` (to within `1e-9`), if any.
    pub fn interval_starting_at(&self, t: Time) -> Option<usize> {
        self.rebalancing_dates()
            .iter()
            .position(|&d| (d - t).abs() <= 1e-9)
    }

    /// Final date.
    pub fn maturity(&self) -> Time {
        self.dates[self.dates.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn fine_grid_layout() {
        let g = TimeGrid::new(&[0.5, 1.0], 4).unwrap();
        assert_eq!(g.dates(), &[0.0, 0.5, 1.0]);
        assert_eq!(g.rebalancing_dates(), &[0.0, 0.5]);
        assert_eq!(g.intervals(), 2);
        assert_eq!(g.n_fine_steps(), 8);
        assert_abs_diff_eq!(g.fine_time(5), 0.625, epsilon = 1e-15);
        assert_abs_diff_eq!(g.fine_dt(7), 0.125, epsilon = 1e-15);
        assert_eq!(g.interval_of(3), 0);
        assert_eq!(g.interval_of(4), 1);
        assert_eq!(g.fine_time(4), 0.5);
        assert_eq!(g.maturity(), 1.0);
    }

    #[test]
    fn explicit_zero_is_kept_once() {
        let g = TimeGrid::new(&[0.0, 1.0], 1).unwrap();
        assert_eq!(g.dates(), &[0.0, 1.0]);
    }

    #[test]
    fn monthly_grid() {
        let g = TimeGrid::monthly(2.0, 3).unwrap();
        assert_eq!(g.intervals(), 24);
        assert_abs_diff_eq!(g.dates()[1], 31.0 / 365.0, epsilon = 1e-15);
        assert_abs_diff_eq!(g.dates()[2], 59.0 / 365.0, epsilon = 1e-15);
        assert_abs_diff_eq!(g.maturity(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn monthly_grid_rejects_partial_years() {
        for maturity in [0.5, 1.5, 0.0, -1.0, Real::NAN] {
            assert!(
                matches!(TimeGrid::monthly(maturity, 1), Err(Error::InvalidArgument(_))),
                "maturity {maturity} accepted"
            );
        }
    }

    #[test]
    fn rebalancing_date_lookup() {
        let g = TimeGrid::monthly(2.0, 2).unwrap();
        let one_year = g.dates()[12];
        assert_abs_diff_eq!(one_year, 1.0, epsilon = 1e-12);
        assert_eq!(g.interval_starting_at(one_year), Some(12));
        assert_eq!(g.interval_starting_at(1.0), Some(12));
        assert_eq!(g.interval_starting_at(0.0), Some(0));
        assert_eq!(g.interval_starting_at(g.maturity()), None);
        assert_eq!(g.interval_starting_at(0.3), None);
    }

    proptest! {
        #[test]
        fn fine_steps_tile_each_interval(
            gaps in prop::collection::vec(0.01f64..0.5, 1..12),
            fine_steps in 1usize..6,
        ) {
            let dates: Vec<Time> = gaps
                .iter()
                .scan(0.0, |t, g| { *t += g; Some(*t) })
                .collect();
            let g = TimeGrid::new(&dates, fine_steps).unwrap();
            prop_assert_eq!(g.n_fine_steps(), dates.len() * fine_steps);
            let total: Real = (0..g.n_fine_steps()).map(|k| g.fine_dt(k)).sum();
            prop_assert!((total - g.maturity()).abs() < 1e-12);
            for k in 0..g.n_fine_steps() {
                let j = g.interval_of(k);
                prop_assert!(g.fine_dt(k) > 0.0);
                prop_assert!(g.fine_time(k) >= g.dates()[j] - 1e-15);
                prop_assert!(g.fine_time(k) < g.dates()[j + 1]);
            }
        }
    }

    #[test]
    fn daily_grid() {
        let g = TimeGrid::daily(1.0, 2).unwrap();
        assert_eq!(g.intervals(), 365);
        assert_abs_diff_eq!(g.dates()[1], 1.0 / 365.0, epsilon = 1e-15);
        assert_abs_diff_eq!(g.maturity(), 1.0, epsilon = 1e-12);
        assert!(TimeGrid::daily(0.001, 2).is_err());
    }

    #[test]
    fn invalid_grids() {
        assert!(matches!(TimeGrid::new(&[1.0], 0), Err(Error::InvalidArgument(_))));
        assert!(TimeGrid::new(&[], 1).is_err());
        assert!(TimeGrid::new(&[0.0], 1).is_err());
        assert!(TimeGrid::new(&[1.0, 0.5], 1).is_err());
        assert!(TimeGrid::new(&[-1.0, 0.5], 1).is_err());
    }
}
