use super::types::CrossCheck;

pub const TEN_YEARS_MONTHS: u32 = 120;
pub const TWENTY_YEARS_MONTHS: u32 = 240;

pub fn fv_annuity_due(monthly: f64, rate: f64, n: u32) -> f64 {
    if rate == 0.0 {
        return monthly * f64::from(n);
    }
    let growth = (1.0 + rate).powi(n as i32);
    monthly * ((growth - 1.0) / rate) * (1.0 + rate)
}

pub fn cross_check(base_monthly_contribution: f64, net_monthly_rate: f64) -> CrossCheck {
    CrossCheck {
        monthly_rate: net_monthly_rate,
        ten_year: fv_annuity_due(base_monthly_contribution, net_monthly_rate, TEN_YEARS_MONTHS),
        twenty_year: fv_annuity_due(
            base_monthly_contribution,
            net_monthly_rate,
            TWENTY_YEARS_MONTHS,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::monthly_rate;

    #[test]
    fn zero_rate_is_linear() {
        assert_eq!(fv_annuity_due(2_500.0, 0.0, 48), 120_000.0);
    }

    #[test]
    fn single_period_grows_once() {
        let fv = fv_annuity_due(1_000.0, 0.01, 1);
        assert!((fv - 1_010.0).abs() < 1e-9, "got {fv}");
    }

    #[test]
    fn reference_plan_lands_near_three_and_a_half_and_twenty_four_crore() {
        let check = cross_check(100_000.0, monthly_rate(19.85));
        assert!(
            (33_500_000.0..34_500_000.0).contains(&check.ten_year),
            "10y value {}",
            check.ten_year
        );
        assert!(
            (240_000_000.0..246_000_000.0).contains(&check.twenty_year),
            "20y value {}",
            check.twenty_year
        );
    }
}
