//! Patient admission influx.
//!
//! The simulation reads `patient.influx` as a `days x intervals` matrix of
//! admission counts. It is usually derived from two distributions: the share
//! of the yearly admissions that arrive on each day, and the share of a day's
//! admissions that arrive in each interval of the day.

use crate::error::ValidationError;

fn check_shares(name: &str, shares: &[f64]) -> Result<(), ValidationError> {
    match shares.iter().position(|s| !(0.0..=1.0).contains(s)) {
        Some(i) => Err(ValidationError::CustomValidationFailed {
            path: format!("{name}[{i}]"),
            message: format!("= {} must be in [0, 1]", shares[i]),
        }),
        None => Ok(()),
    }
}

/// Expands the day and interval distributions into an admission matrix.
///
/// Each day first receives `round(day_share * patients)` admissions, which are
/// then spread as `round(day_total * interval_share)` over the intervals. Ties
/// round to even.
///
/// # Errors
///
/// Returns `CustomValidationFailed` naming the offending share when a share
/// lies outside `[0, 1]`.
///
/// # Examples
///
/// ```
/// use hospital_scenario::influx;
///
/// let matrix = influx::expand(&[0.5, 0.25], &[0.5, 0.5], 100).unwrap();
/// assert_eq!(matrix, vec![vec![25, 25], vec![12, 12]]);
/// ```
#[allow(clippy::cast_possible_truncation)]
pub fn expand(
    day_shares: &[f64],
    interval_shares: &[f64],
    patients: u32,
) -> Result<Vec<Vec<i64>>, ValidationError> {
    check_shares("day_shares", day_shares)?;
    check_shares("interval_shares", interval_shares)?;

    let patients = f64::from(patients);
    let matrix = day_shares
        .iter()
        .map(|day| {
            let day_total = (day * patients).round_ties_even();
            interval_shares
                .iter()
                // Bounded by `patients`, which fits in i64.
                .map(|interval| (day_total * interval).round_ties_even() as i64)
                .collect()
        })
        .collect();
    Ok(matrix)
}
