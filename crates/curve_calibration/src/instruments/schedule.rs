//! Payment frequencies and accrual schedules in year fractions.

use curve_core::types::Tenor;

/// Payment frequency for fixed-income legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Frequency {
    /// Annual payments (1 per year)
    #[default]
    Annual,
    /// Semi-annual payments (2 per year)
    SemiAnnual,
    /// Quarterly payments (4 per year)
    Quarterly,
    /// Monthly payments (12 per year)
    Monthly,
}

impl Frequency {
    /// Get the number of payments per year.
    pub fn payments_per_year(&self) -> usize {
        match self {
            Frequency::Annual => 1,
            Frequency::SemiAnnual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
        }
    }

    /// Get the period length in years.
    pub fn period_years(&self) -> f64 {
        1.0 / self.payments_per_year() as f64
    }

    /// Frequency matching an index tenor; overnight indices pay annually.
    pub fn of_tenor(tenor: Tenor) -> Self {
        match tenor {
            Tenor::Overnight | Tenor::TwelveMonth => Frequency::Annual,
            Tenor::OneMonth => Frequency::Monthly,
            Tenor::ThreeMonth => Frequency::Quarterly,
            Tenor::SixMonth => Frequency::SemiAnnual,
        }
    }
}

/// One accrual period of a leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccrualPeriod {
    /// Start time in years
    pub start: f64,
    /// End (and payment) time in years
    pub end: f64,
    /// Accrual fraction, `end - start`
    pub accrual: f64,
}

impl AccrualPeriod {
    /// Period from `start` to `end`.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            accrual: end - start,
        }
    }
}

/// Regular periods from `start` to `end`.
///
/// The number of periods is the rounded ratio of the span to the frequency
/// (at least one), so a residual stub is absorbed into the last period. The
/// final period always ends exactly at `end`. Returns an empty schedule if
/// `end <= start`.
pub fn schedule(start: f64, end: f64, frequency: Frequency) -> Vec<AccrualPeriod> {
    if !(end > start) {
        return Vec::new();
    }
    let step = frequency.period_years();
    let count = (((end - start) / step).round() as usize).max(1);
    (0..count)
        .map(|i| {
            let s = start + i as f64 * step;
            let e = if i + 1 == count {
                end
            } else {
                start + (i + 1) as f64 * step
            };
            AccrualPeriod::new(s, e)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frequency_periods() {
        assert_eq!(Frequency::Annual.payments_per_year(), 1);
        assert_eq!(Frequency::Monthly.payments_per_year(), 12);
        assert_relative_eq!(Frequency::Quarterly.period_years(), 0.25);
        assert_relative_eq!(Frequency::SemiAnnual.period_years(), 0.5);
        assert_eq!(Frequency::default(), Frequency::Annual);
    }

    #[test]
    fn test_frequency_of_tenor() {
        assert_eq!(Frequency::of_tenor(Tenor::ThreeMonth), Frequency::Quarterly);
        assert_eq!(Frequency::of_tenor(Tenor::SixMonth), Frequency::SemiAnnual);
        assert_eq!(Frequency::of_tenor(Tenor::Overnight), Frequency::Annual);
    }

    #[test]
    fn test_regular_schedule() {
        let periods = schedule(0.5, 2.5, Frequency::SemiAnnual);
        assert_eq!(periods.len(), 4);
        assert_relative_eq!(periods[0].start, 0.5);
        assert_relative_eq!(periods[3].end, 2.5);
        for p in &periods {
            assert_relative_eq!(p.accrual, 0.5, epsilon = 1e-15);
        }
        for w in periods.windows(2) {
            assert_eq!(w[0].end, w[1].start);
        }
    }

    #[test]
    fn test_short_and_stub_schedules() {
        let single = schedule(0.0, 0.25, Frequency::Annual);
        assert_eq!(single.len(), 1);
        assert_relative_eq!(single[0].accrual, 0.25);

        let stub = schedule(0.0, 2.1, Frequency::Annual);
        assert_eq!(stub.len(), 2);
        assert_relative_eq!(stub[1].accrual, 1.1, epsilon = 1e-12);

        assert!(schedule(1.0, 1.0, Frequency::Annual).is_empty());
    }
}
