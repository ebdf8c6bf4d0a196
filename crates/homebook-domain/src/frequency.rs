//! Recurrence cadences and next-occurrence date math.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::common::shift_month;

/// Enumerates the cadences a recurring schedule may use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Calculates the occurrence that follows `from`.
    ///
    /// Month-based cadences preserve the day-of-month, clamped to the
    /// target month's length, so Jan 31 advances to Feb 28 (or Feb 29 in
    /// a leap year). Pure and total: every input date has a successor.
    pub fn next_date(self, from: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => from + Duration::days(1),
            Frequency::Weekly => from + Duration::days(7),
            Frequency::Biweekly => from + Duration::days(14),
            Frequency::Monthly => shift_month(from, 1),
            Frequency::Quarterly => shift_month(from, 3),
            Frequency::Yearly => shift_month(from, 12),
        }
    }

    /// Number of occurrences per year, used for annual impact figures.
    pub fn per_year(self) -> u32 {
        match self {
            Frequency::Daily => 365,
            Frequency::Weekly => 52,
            Frequency::Biweekly => 26,
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Yearly => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Biweekly => "Every 2 weeks",
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
            Frequency::Yearly => "Yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn linear_cadences_add_fixed_days() {
        let start = date(2024, 3, 1);
        assert_eq!(Frequency::Daily.next_date(start), date(2024, 3, 2));
        assert_eq!(Frequency::Weekly.next_date(start), date(2024, 3, 8));
        assert_eq!(Frequency::Biweekly.next_date(start), date(2024, 3, 15));
    }

    #[test]
    fn monthly_clamps_january_31() {
        assert_eq!(
            Frequency::Monthly.next_date(date(2023, 1, 31)),
            date(2023, 2, 28)
        );
        assert_eq!(
            Frequency::Monthly.next_date(date(2024, 1, 31)),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn quarterly_and_yearly_shift_whole_months() {
        assert_eq!(
            Frequency::Quarterly.next_date(date(2024, 11, 30)),
            date(2025, 2, 28)
        );
        assert_eq!(
            Frequency::Yearly.next_date(date(2024, 2, 29)),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn repeated_application_never_decreases() {
        for frequency in [
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Biweekly,
            Frequency::Monthly,
            Frequency::Quarterly,
            Frequency::Yearly,
        ] {
            let mut current = date(2023, 12, 31);
            for _ in 0..48 {
                let next = frequency.next_date(current);
                assert!(next > current, "{frequency} produced {next} <= {current}");
                current = next;
            }
        }
    }

    #[test]
    fn serializes_in_upper_snake_case() {
        let json = serde_json::to_string(&Frequency::Biweekly).unwrap();
        assert_eq!(json, "\"BIWEEKLY\"");
        let parsed: Frequency = serde_json::from_str("\"QUARTERLY\"").unwrap();
        assert_eq!(parsed, Frequency::Quarterly);
    }
}
