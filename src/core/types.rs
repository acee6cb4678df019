use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::rates::NetRates;

/// Annual percentages driving a projection. `19.85` means 19.85% a year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateInputs {
    pub nominal_return_pct: f64,
    pub devaluation_pct: f64,
    pub fee_tax_drag_pct: f64,
    pub step_up_pct: f64,
}

impl RateInputs {
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("nominal return", self.nominal_return_pct),
            ("devaluation", self.devaluation_pct),
            ("fee/tax drag", self.fee_tax_drag_pct),
            ("step-up", self.step_up_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRate { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnuityTiming {
    #[default]
    Due,
    Ordinary,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonthOverride {
    pub contribution: f64,
    pub extra_lump: f64,
}

/// Repeating 12-month contribution pattern, indexed January = 0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MonthlyPattern {
    pub enabled: bool,
    pub months: [MonthOverride; 12],
}

impl MonthlyPattern {
    pub fn level(base_monthly_contribution: f64) -> Self {
        Self {
            enabled: false,
            months: [MonthOverride {
                contribution: base_monthly_contribution,
                extra_lump: 0.0,
            }; 12],
        }
    }

    pub fn get(&self, month_of_year: u32) -> MonthOverride {
        self.months[(month_of_year % 12) as usize]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub duration_months: u32,
    pub start_date: NaiveDate,
    pub anchor_month: Month,
    pub base_monthly_contribution: f64,
    pub pattern: MonthlyPattern,
    pub lump_sum: f64,
    pub timing: AnnuityTiming,
}

impl ScheduleConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.duration_months == 0 {
            return Err(ConfigError::InvalidDuration {
                months: self.duration_months,
            });
        }
        check_amount("base monthly contribution", self.base_monthly_contribution)?;
        check_amount("lump sum", self.lump_sum)?;
        if self.pattern.enabled {
            for entry in &self.pattern.months {
                check_amount("pattern contribution", entry.contribution)?;
                check_amount("pattern extra lump", entry.extra_lump)?;
            }
        }
        Ok(())
    }

    pub fn start_month_offset(&self) -> u32 {
        self.start_date.month0()
    }

    pub fn anchor_month0(&self) -> u32 {
        self.anchor_month.number_from_month() - 1
    }
}

fn check_amount(field: &'static str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidAmount { field, value });
    }
    Ok(())
}

/// Accepts an English month name ("January", "jan") or a number 1-12.
pub fn parse_month(raw: &str) -> ConfigResult<Month> {
    let trimmed = raw.trim();
    if let Ok(number) = trimmed.parse::<u8>() {
        return Month::try_from(number).map_err(|_| ConfigError::UnknownMonth(raw.to_string()));
    }
    trimmed
        .parse::<Month>()
        .map_err(|_| ConfigError::UnknownMonth(raw.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    pub month_index: u32,
    pub date: NaiveDate,
    pub month_of_year: u32,
    pub step_up_factor: f64,
    pub contribution: f64,
    pub extra_lump: f64,
    pub nominal_balance: f64,
    pub real_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub final_nominal: f64,
    pub final_real: f64,
    pub total_contributions: f64,
    pub nominal_gain: f64,
    pub real_gain: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossCheck {
    pub monthly_rate: f64,
    pub ten_year: f64,
    pub twenty_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub rates: NetRates,
    pub summary: ProjectionSummary,
    pub cross_check: CrossCheck,
    pub records: Vec<MonthRecord>,
}
