use fuels::types::U256;

/// Fractional digits of the smallest on-chain unit.
pub const WEI_DECIMALS: usize = 18;

/// Human-readable form of an integer wei amount, e.g. `100000000000000000`
/// -> `"0.1"`. Pure integer arithmetic end to end; the amount is never
/// routed through a float.
pub fn format_wei(amount: U256) -> String {
    format_units(amount, WEI_DECIMALS)
}

pub fn format_units(amount: U256, decimals: usize) -> String {
    let divisor = U256::exp10(decimals);
    let whole = amount / divisor;
    let frac = amount % divisor;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals);
    let frac = frac.trim_end_matches('0');
    format!("{whole}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::{
        WEI_DECIMALS,
        format_units,
        format_wei,
    };
    use fuels::types::U256;
    use proptest::prelude::*;

    #[test]
    fn format_wei__tenth_of_a_unit() {
        let amount = U256::from(100_000_000_000_000_000u128);

        assert_eq!(format_wei(amount), "0.1");
    }

    #[test]
    fn format_wei__whole_units_have_no_fraction() {
        let amount = U256::from(2_000_000_000_000_000_000u128);

        assert_eq!(format_wei(amount), "2");
    }

    #[test]
    fn format_wei__zero() {
        assert_eq!(format_wei(U256::zero()), "0");
    }

    #[test]
    fn format_wei__single_wei_keeps_all_digits() {
        assert_eq!(format_wei(U256::one()), "0.000000000000000001");
    }

    #[test]
    fn format_wei__mixed_amount_trims_trailing_zeros() {
        let amount = U256::from(1_234_500_000_000_000_000u128);

        assert_eq!(format_wei(amount), "1.2345");
    }

    #[test]
    fn format_wei__amount_beyond_u64_stays_exact() {
        // 2^64 wei; would be lossy as f64, exact here.
        let amount = U256::from(u64::MAX) + U256::one();

        assert_eq!(format_wei(amount), "18.446744073709551616");
    }

    #[test]
    fn format_units__respects_decimals_argument() {
        assert_eq!(format_units(U256::from(1_500u64), 3), "1.5");
        assert_eq!(format_units(U256::from(1_500u64), 0), "1500");
    }

    proptest! {
        #[test]
        fn format_wei__roundtrips_through_string_math(raw in any::<u128>()) {
            let amount = U256::from(raw);

            let rendered = format_wei(amount);

            // Rebuild the integer from the decimal string without floats.
            let (whole, frac) = match rendered.split_once('.') {
                Some((w, f)) => (w.to_string(), f.to_string()),
                None => (rendered.clone(), String::new()),
            };
            prop_assert!(frac.len() <= WEI_DECIMALS);
            let width = WEI_DECIMALS;
            let padded = format!("{frac:0<width$}");
            let rebuilt = U256::from_dec_str(&whole).unwrap()
                * U256::exp10(WEI_DECIMALS)
                + U256::from_dec_str(if padded.is_empty() { "0" } else { &padded }).unwrap();
            prop_assert_eq!(rebuilt, amount);
        }
    }
}
