//! Property tests for artifact naming.
//!
//! 1. Converted-name derivation is idempotent and case-insensitive on the token
//! 2. Every canonical source name classifies back to its period
//! 3. Source and converted names classify to the same period

use cotahist_core::naming::{classify, is_source_archive, to_converted_name, Period};
use proptest::prelude::*;

fn arb_period() -> impl Strategy<Value = Period> {
    prop_oneof![
        (1986..2100i32).prop_map(|year| Period::Annual { year }),
        (1986..2100i32, 1..=12u32).prop_map(|(year, month)| Period::Monthly { year, month }),
        (1986..2100i32, 1..=12u32, 1..=31u32)
            .prop_map(|(year, month, day)| Period::Daily { year, month, day }),
    ]
}

/// `ZIP` with each letter independently upper or lower case.
fn arb_zip_token() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<bool>(), 3).prop_map(|upper| {
        "zip"
            .chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect()
    })
}

proptest! {
    #[test]
    fn converted_name_is_idempotent(stem in "[A-Ya-y0-9_.]{0,24}", token in arb_zip_token()) {
        let name = format!("{stem}.{token}");
        let once = to_converted_name(&name);
        prop_assert_eq!(to_converted_name(&once), once);
    }

    #[test]
    fn token_case_does_not_matter(stem in "[A-H0-9_]{1,16}", token in arb_zip_token()) {
        let name = format!("{stem}.{token}");
        prop_assert!(is_source_archive(&name));
        prop_assert_eq!(to_converted_name(&name), format!("{stem}.parquet"));
    }

    #[test]
    fn source_names_classify_to_their_period(period in arb_period()) {
        let name = period.source_name();
        let artifact = classify(&name);
        prop_assert!(artifact.is_some());
        prop_assert_eq!(artifact.unwrap().period, period);
    }

    #[test]
    fn converted_names_keep_their_period(period in arb_period()) {
        let converted = to_converted_name(&period.source_name());
        prop_assert!(!is_source_archive(&converted));
        prop_assert_eq!(classify(&converted).map(|a| a.period), Some(period));
    }

    #[test]
    fn lowercase_names_classify_the_same(period in arb_period()) {
        let lower = period.source_name().to_ascii_lowercase();
        prop_assert_eq!(classify(&lower).map(|a| a.period), Some(period));
    }
}
