use serde::Serialize;

use super::types::RateInputs;

pub fn monthly_rate(annual_pct: f64) -> f64 {
    (1.0 + annual_pct / 100.0).powf(1.0 / 12.0) - 1.0
}

// Multiplicative so drag compounds on the same base as the return.
pub fn net_monthly_rate(gross_monthly: f64, drag_monthly: f64) -> f64 {
    (1.0 + gross_monthly) / (1.0 + drag_monthly) - 1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetRates {
    pub gross_monthly: f64,
    pub drag_monthly: f64,
    pub net_nominal_monthly: f64,
    pub devaluation_monthly: f64,
}

impl NetRates {
    pub fn from_inputs(inputs: &RateInputs) -> Self {
        let gross_monthly = monthly_rate(inputs.nominal_return_pct);
        let drag_monthly = monthly_rate(inputs.fee_tax_drag_pct);
        Self {
            gross_monthly,
            drag_monthly,
            net_nominal_monthly: net_monthly_rate(gross_monthly, drag_monthly),
            devaluation_monthly: monthly_rate(inputs.devaluation_pct),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-12;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn zero_annual_rate_is_zero_monthly() {
        assert_eq!(monthly_rate(0.0), 0.0);
    }

    #[test]
    fn twelve_monthly_steps_reproduce_the_annual_rate() {
        let r = monthly_rate(19.85);
        assert_approx((1.0 + r).powi(12), 1.1985);
    }

    #[test]
    fn drag_combines_multiplicatively() {
        let inputs = RateInputs {
            nominal_return_pct: 12.0,
            devaluation_pct: 0.0,
            fee_tax_drag_pct: 2.0,
            step_up_pct: 0.0,
        };
        let rates = NetRates::from_inputs(&inputs);
        let expected = (1.12f64 / 1.02).powf(1.0 / 12.0) - 1.0;
        assert_approx(rates.net_nominal_monthly, expected);
        // (g - d) / (1 + d), strictly below plain subtraction
        assert!(rates.net_nominal_monthly < rates.gross_monthly - rates.drag_monthly);
    }

    #[test]
    fn no_drag_leaves_gross_rate_untouched() {
        let inputs = RateInputs {
            nominal_return_pct: 19.85,
            devaluation_pct: 8.0,
            fee_tax_drag_pct: 0.0,
            step_up_pct: 0.0,
        };
        let rates = NetRates::from_inputs(&inputs);
        assert_eq!(rates.net_nominal_monthly, rates.gross_monthly);
        assert_approx(rates.devaluation_monthly, monthly_rate(8.0));
    }

    proptest! {
        #[test]
        fn prop_monthly_rate_is_monotonic(low_bp in 0u32..20_000, step_bp in 1u32..5_000) {
            let low = f64::from(low_bp) / 100.0;
            let high = f64::from(low_bp + step_bp) / 100.0;
            prop_assert!(monthly_rate(low) >= 0.0);
            prop_assert!(monthly_rate(high) > monthly_rate(low));
        }
    }
}
