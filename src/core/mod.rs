mod crosscheck;
mod engine;
mod error;
mod money;
mod rates;
mod schedule;
mod types;

pub use crosscheck::{TEN_YEARS_MONTHS, TWENTY_YEARS_MONTHS, cross_check, fv_annuity_due};
pub use engine::{compute, discount_real, simulate};
pub use error::{ConfigError, ConfigResult};
pub use money::{format_pkr, to_crore};
pub use rates::{NetRates, monthly_rate, net_monthly_rate};
pub use schedule::build_schedule;
pub use types::{
    AnnuityTiming, CrossCheck, MonthOverride, MonthRecord, MonthlyPattern, Projection,
    ProjectionSummary, RateInputs, ScheduleConfig, parse_month,
};
