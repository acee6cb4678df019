use chrono::{Datelike, NaiveDate};

use super::error::{ConfigError, ConfigResult};
use super::types::{MonthRecord, ScheduleConfig};

/// Builds the month-indexed cashflow table. Balances are left at zero for the
/// simulator to fill in.
///
/// The step-up factor starts at 1.0 and is bumped once every time the anchor
/// month comes round again, never on the very first record. Extra lumps come
/// straight from the pattern and are never stepped up.
pub fn build_schedule(step_up_pct: f64, config: &ScheduleConfig) -> ConfigResult<Vec<MonthRecord>> {
    let start_offset = config.start_month_offset();
    let anchor = config.anchor_month0();
    let step_multiplier = 1.0 + step_up_pct / 100.0;

    let out_of_range = ConfigError::DateOutOfRange {
        start: config.start_date,
        months: config.duration_months,
    };
    if config.duration_months > 0
        && month_start(config.start_date, config.duration_months - 1).is_none()
    {
        return Err(out_of_range);
    }

    let mut records = Vec::with_capacity(config.duration_months as usize);
    let mut step_up_factor = 1.0;
    for month_index in 0..config.duration_months {
        let month_of_year = (start_offset + month_index) % 12;
        if month_index != 0 && month_of_year == anchor {
            step_up_factor *= step_multiplier;
        }

        let (base_contribution, extra_lump) = if config.pattern.enabled {
            let entry = config.pattern.get(month_of_year);
            (entry.contribution, entry.extra_lump)
        } else {
            (config.base_monthly_contribution, 0.0)
        };

        records.push(MonthRecord {
            month_index,
            date: month_start(config.start_date, month_index).ok_or_else(|| out_of_range.clone())?,
            month_of_year,
            step_up_factor,
            contribution: base_contribution * step_up_factor,
            extra_lump,
            nominal_balance: 0.0,
            real_balance: 0.0,
        });
    }
    Ok(records)
}

fn month_start(start: NaiveDate, offset: u32) -> Option<NaiveDate> {
    let total = i64::from(start.year()) * 12 + i64::from(start.month0()) + i64::from(offset);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AnnuityTiming, MonthOverride, MonthlyPattern};
    use chrono::Month;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn flat_config(months: u32, base: f64) -> ScheduleConfig {
        ScheduleConfig {
            duration_months: months,
            start_date: date(2025, 1, 1),
            anchor_month: Month::January,
            base_monthly_contribution: base,
            pattern: MonthlyPattern::level(base),
            lump_sum: 0.0,
            timing: AnnuityTiming::Due,
        }
    }

    #[test]
    fn zero_step_up_keeps_contributions_flat() {
        let records = build_schedule(0.0, &flat_config(36, 100_000.0)).expect("schedule");
        assert_eq!(records.len(), 36);
        for record in &records {
            assert_eq!(record.contribution, 100_000.0);
            assert_eq!(record.step_up_factor, 1.0);
            assert_eq!(record.extra_lump, 0.0);
        }
    }

    #[test]
    fn step_up_skips_first_anchor_and_applies_from_month_twelve() {
        let records = build_schedule(10.0, &flat_config(24, 1_000.0)).expect("schedule");
        for record in &records[..12] {
            assert_eq!(record.contribution, 1_000.0);
        }
        for record in &records[12..] {
            assert_approx(record.contribution, 1_100.0);
        }
    }

    #[test]
    fn step_up_triggers_on_anchor_month_mid_year() {
        let mut config = flat_config(30, 1_000.0);
        config.start_date = date(2025, 3, 1);
        config.anchor_month = Month::July;

        let records = build_schedule(10.0, &config).expect("schedule");
        // March..June at 1.0, bumps in July 2025, July 2026 and July 2027
        assert_eq!(records[3].step_up_factor, 1.0);
        assert_approx(records[4].step_up_factor, 1.1);
        assert_approx(records[15].step_up_factor, 1.1);
        assert_approx(records[16].step_up_factor, 1.21);
        assert_approx(records[27].contribution, 1_210.0);
        assert_approx(records[28].step_up_factor, 1.331);
        assert_approx(records[29].contribution, 1_331.0);
    }

    #[test]
    fn pattern_is_indexed_by_calendar_month_and_repeats() {
        let mut config = flat_config(26, 0.0);
        config.start_date = date(2025, 11, 1);
        config.pattern.enabled = true;
        for (i, entry) in config.pattern.months.iter_mut().enumerate() {
            *entry = MonthOverride {
                contribution: 100.0 * (i as f64 + 1.0),
                extra_lump: if i == 11 { 5_000.0 } else { 0.0 },
            };
        }

        let records = build_schedule(0.0, &config).expect("schedule");
        assert_eq!(records[0].month_of_year, 10);
        assert_eq!(records[0].contribution, 1_100.0);
        assert_eq!(records[1].extra_lump, 5_000.0);
        assert_eq!(records[2].month_of_year, 0);
        assert_eq!(records[2].contribution, 100.0);
        for i in 0..14 {
            assert_eq!(records[i].contribution, records[i + 12].contribution);
            assert_eq!(records[i].extra_lump, records[i + 12].extra_lump);
        }
    }

    #[test]
    fn extra_lumps_are_not_stepped_up() {
        let mut config = flat_config(24, 0.0);
        config.pattern.enabled = true;
        config.pattern.months[0] = MonthOverride {
            contribution: 1_000.0,
            extra_lump: 50_000.0,
        };

        let records = build_schedule(25.0, &config).expect("schedule");
        assert_eq!(records[12].extra_lump, 50_000.0);
        assert_approx(records[12].contribution, 1_250.0);
    }

    #[test]
    fn dates_advance_by_calendar_month_from_first_of_month() {
        let mut config = flat_config(3, 1.0);
        config.start_date = date(2025, 11, 20);
        let records = build_schedule(0.0, &config).expect("schedule");
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2025, 11, 1), date(2025, 12, 1), date(2026, 1, 1)]);
    }

    #[test]
    fn month_start_out_of_range_is_reported() {
        let mut config = flat_config(24, 1.0);
        config.start_date = NaiveDate::MAX;
        let err = build_schedule(0.0, &config).expect_err("overflowing schedule");
        assert!(matches!(err, ConfigError::DateOutOfRange { months: 24, .. }));
    }

    #[test]
    fn huge_duration_is_rejected_before_allocating() {
        let config = flat_config(u32::MAX, 1.0);
        let err = build_schedule(0.0, &config).expect_err("unrepresentable horizon");
        assert!(matches!(err, ConfigError::DateOutOfRange { months: u32::MAX, .. }));
    }
}
