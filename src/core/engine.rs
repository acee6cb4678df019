use super::crosscheck::cross_check;
use super::error::ConfigResult;
use super::rates::NetRates;
use super::schedule::build_schedule;
use super::types::{
    AnnuityTiming, MonthRecord, Projection, ProjectionSummary, RateInputs, ScheduleConfig,
};

pub fn compute(rates: &RateInputs, config: &ScheduleConfig) -> ConfigResult<Projection> {
    rates.validate()?;
    config.validate()?;

    let net = NetRates::from_inputs(rates);
    let mut records = build_schedule(rates.step_up_pct, config)?;

    let nominal = simulate(
        &records,
        config.lump_sum,
        net.net_nominal_monthly,
        config.timing,
    );
    let real = discount_real(&nominal, net.devaluation_monthly);
    for ((record, nominal_balance), real_balance) in records.iter_mut().zip(nominal).zip(real) {
        record.nominal_balance = nominal_balance;
        record.real_balance = real_balance;
    }

    let summary = summarize(&records, config.lump_sum, net.devaluation_monthly);
    let cross_check = cross_check(config.base_monthly_contribution, net.net_nominal_monthly);

    tracing::debug!(
        months = config.duration_months,
        net_monthly = net.net_nominal_monthly,
        final_nominal = summary.final_nominal,
        final_real = summary.final_real,
        "projection computed"
    );

    Ok(Projection {
        rates: net,
        summary,
        cross_check,
        records,
    })
}

/// Compounds the schedule month by month and returns the post-step nominal
/// balance for every record. The lump sum joins the balance at record 0 before
/// that month's contribution and growth.
pub fn simulate(
    schedule: &[MonthRecord],
    lump_sum: f64,
    monthly_rate: f64,
    timing: AnnuityTiming,
) -> Vec<f64> {
    let growth = 1.0 + monthly_rate;
    schedule
        .iter()
        .enumerate()
        .scan(0.0, |balance, (i, record)| {
            if i == 0 {
                *balance += lump_sum;
            }
            let inflow = record.contribution + record.extra_lump;
            *balance = match timing {
                AnnuityTiming::Due => (*balance + inflow) * growth,
                AnnuityTiming::Ordinary => *balance * growth + inflow,
            };
            Some(*balance)
        })
        .collect()
}

pub fn discount_real(nominal: &[f64], devaluation_monthly: f64) -> Vec<f64> {
    nominal
        .iter()
        .enumerate()
        .map(|(i, value)| value / (1.0 + devaluation_monthly).powi(i as i32 + 1))
        .collect()
}

fn summarize(records: &[MonthRecord], lump_sum: f64, devaluation_monthly: f64) -> ProjectionSummary {
    let (final_nominal, final_real) = records
        .last()
        .map(|r| (r.nominal_balance, r.real_balance))
        .unwrap_or((0.0, 0.0));
    let total_contributions = records
        .iter()
        .map(|r| r.contribution + r.extra_lump)
        .sum::<f64>()
        + lump_sum;
    let deflator = (1.0 + devaluation_monthly).powi(records.len() as i32);

    ProjectionSummary {
        final_nominal,
        final_real,
        total_contributions,
        nominal_gain: final_nominal - total_contributions,
        real_gain: final_real - total_contributions / deflator,
    }
}
