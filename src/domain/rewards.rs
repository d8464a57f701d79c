//! Per-level reward schedule.

use rust_decimal::Decimal;

/// Reward paid per member at each generation level, level 1 first.
///
/// Levels beyond the schedule earn nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSchedule {
    rates: Vec<Decimal>,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self::new(vec![Decimal::from(100), Decimal::from(50), Decimal::from(25)])
    }
}

impl RewardSchedule {
    pub fn new(rates: Vec<Decimal>) -> Self {
        Self { rates }
    }

    /// Number of paying levels.
    pub fn depth(&self) -> usize {
        self.rates.len()
    }

    pub fn rates(&self) -> &[Decimal] {
        &self.rates
    }

    /// Rate for a 1-indexed level; zero outside the schedule.
    pub fn rate_for(&self, level: usize) -> Decimal {
        level
            .checked_sub(1)
            .and_then(|idx| self.rates.get(idx))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Income earned by `count` members at `level`.
    pub fn income_for(&self, level: usize, count: usize) -> Decimal {
        self.rate_for(level) * Decimal::from(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 100)]
    #[case(2, 50)]
    #[case(3, 25)]
    #[case(4, 0)]
    #[case(0, 0)]
    fn given_default_schedule_when_rate_for_then_matches_table(
        #[case] level: usize,
        #[case] expected: i64,
    ) {
        let schedule = RewardSchedule::default();
        assert_eq!(schedule.rate_for(level), Decimal::from(expected));
    }

    #[test]
    fn given_three_members_at_level_two_when_income_for_then_150() {
        let schedule = RewardSchedule::default();
        assert_eq!(schedule.income_for(2, 3), Decimal::from(150));
        assert_eq!(schedule.depth(), 3);
    }
}
