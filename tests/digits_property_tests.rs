//! Property-based tests for check digits and the due-date factor
//!
//! This module uses the proptest crate to verify the arithmetic behind the
//! bank layouts across a wide range of account numbers and dates. The check
//! digits end up printed on real charges, so the invariants here must hold
//! for ALL inputs the widths admit, not just the published examples.

use boleto::digits::{
    bradesco_nosso_numero_digit, due_date_factor, factor_epoch, factor_rollover,
    general_barcode_digit, sicoob_nosso_numero_digit,
};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

// PROPERTY TEST STRATEGIES

/// Strategy to generate calendar dates well before and after the factor
/// window
fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1990i32..=2060, 1u32..=12, 1u32..=28)
        .prop_map(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

// PROPERTY TESTS
proptest! {
    /// Property: leading zeroes never change the Sicoob check digit
    ///
    /// Fields are zero-padded to their layout widths before the weighted
    /// sum, so the digit of "670" must equal the digit of "0000670".
    #[test]
    fn prop_sicoob_digit_ignores_leading_zeroes(
        agency in 1u32..=9999,
        covenant in 1u32..=99999,
        nosso in 1u32..=9_999_999,
    ) {
        let plain = sicoob_nosso_numero_digit(
            &agency.to_string(),
            &covenant.to_string(),
            &nosso.to_string(),
        )
        .unwrap();
        let padded = sicoob_nosso_numero_digit(
            &format!("{agency:04}"),
            &format!("{covenant:08}"),
            &format!("{nosso:07}"),
        )
        .unwrap();
        prop_assert_eq!(plain, padded);
    }

    /// Property: the Sicoob digit is a single digit
    ///
    /// Remainders 0 and 1 collapse to 0 and everything else maps below 10,
    /// so the digit always fits its one printed position.
    #[test]
    fn prop_sicoob_digit_stays_in_range(
        agency in 1u32..=9999,
        covenant in 1u32..=9_999_999,
        nosso in 1u32..=9_999_999,
    ) {
        let digit = sicoob_nosso_numero_digit(
            &agency.to_string(),
            &covenant.to_string(),
            &nosso.to_string(),
        )
        .unwrap();
        prop_assert!(digit <= 9);
    }

    /// Property: the Bradesco digit is a digit or the literal 'P'
    #[test]
    fn prop_bradesco_digit_is_a_digit_or_p(
        carteira in 1u32..=99,
        nosso in 1u64..=99_999_999_999u64,
    ) {
        let digit =
            bradesco_nosso_numero_digit(&format!("{carteira:02}"), &nosso.to_string()).unwrap();
        prop_assert!(digit == 'P' || digit.is_ascii_digit());
    }

    /// Property: the general barcode digit is never 0
    ///
    /// Results 0, 10 and 11 all collapse to 1 so a barcode can never carry
    /// a zero check digit, whatever its other 43 positions hold.
    #[test]
    fn prop_general_digit_stays_between_one_and_nine(body in "[0-9]{43}") {
        let digit = general_barcode_digit(&body).unwrap();
        prop_assert!((1..=9).contains(&digit));
    }

    /// Property: the factor is four positions for every date
    ///
    /// Dates before the epoch print the "0000" sentinel, dates after the
    /// rollover restart at 1000; nothing ever needs a fifth position.
    #[test]
    fn prop_factor_is_always_four_digits(date in date_strategy()) {
        let factor = due_date_factor(date);
        prop_assert_eq!(factor.len(), 4);
        prop_assert!(factor.chars().all(|c| c.is_ascii_digit()));
    }

    /// Property: the factor advances by exactly one per day until the
    /// rollover
    #[test]
    fn prop_factor_advances_daily_until_the_rollover(offset in 0i64..9999) {
        let date = factor_epoch() + Duration::days(offset);
        let next = date + Duration::days(1);
        prop_assert!(next <= factor_rollover());

        let today: i64 = due_date_factor(date).parse().unwrap();
        let tomorrow: i64 = due_date_factor(next).parse().unwrap();
        prop_assert_eq!(tomorrow, today + 1);
    }
}

// ADDITIONAL PROPTEST EXAMPLES WITH EXPLICIT CONFIGURATION

/// Property test with custom configuration for more extensive testing
///
/// The restarted window runs for decades of due dates, so this invariant
/// gets more cases than the default.
#[cfg(test)]
mod extensive_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        /// Property: factors after the 2025 rollover stay between 1000 and
        /// 9999 forever, wrapping every 9000 days
        #[test]
        fn prop_restarted_factors_stay_in_range(offset in 0i64..=20_000) {
            let date = factor_rollover() + Duration::days(1 + offset);
            let factor: i64 = due_date_factor(date).parse().unwrap();
            prop_assert!((1000..=9999).contains(&factor));
        }
    }
}
