//! Business-day date helpers.
//!
//! Phase starts always land on business days: a phase begins on the first
//! Monday-to-Friday day after its latest dependency's end. Durations are
//! inclusive day spans from that anchored start (see the recalc engine).

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Returns true for Monday through Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first business day strictly after `date`.
pub fn next_business_day_after(date: NaiveDate) -> NaiveDate {
    let mut next = date + Days::new(1);
    while !is_business_day(next) {
        next = next + Days::new(1);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekdays_are_business_days() {
        // 2024-01-15 is a Monday
        for offset in 0..5 {
            assert!(is_business_day(date(2024, 1, 15 + offset)));
        }
        assert!(!is_business_day(date(2024, 1, 20))); // Saturday
        assert!(!is_business_day(date(2024, 1, 21))); // Sunday
    }

    #[test]
    fn midweek_day_advances_by_one() {
        assert_eq!(next_business_day_after(date(2024, 1, 16)), date(2024, 1, 17));
    }

    #[test]
    fn friday_advances_to_monday() {
        assert_eq!(next_business_day_after(date(2024, 1, 19)), date(2024, 1, 22));
    }

    #[test]
    fn saturday_advances_to_monday() {
        assert_eq!(next_business_day_after(date(2024, 1, 20)), date(2024, 1, 22));
    }

    proptest! {
        #[test]
        fn result_is_always_a_later_business_day(days_from_epoch in 0u64..40_000) {
            let base = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + Days::new(days_from_epoch);
            let next = next_business_day_after(base);

            prop_assert!(next > base);
            prop_assert!(is_business_day(next));
            // Never skips more than a weekend
            prop_assert!((next - base).num_days() <= 3);
        }
    }
}
